//! Conversion between [`Definition`]s and the textual graph description language of graphviz.
//!
//! Writing is done by [`Definition::dot_representation`], reading by [`reconstruct`] (see the
//! module level documentation there for the recognized shapes). Both sides agree on a
//! [`DotConfig`], so that a definition that was written can be read back.
use std::fmt::Display;

use itertools::Itertools;

use crate::{Definition, Show};

pub mod reconstruct;
pub use reconstruct::{reconstruct, scan, GraphScan, Reconstruction};

/// Settings shared by the writer and the reconstructor.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct DotConfig {
    sentinels: Vec<String>,
    final_marker: String,
}

impl Default for DotConfig {
    fn default() -> Self {
        Self {
            sentinels: vec!["null".to_string()],
            final_marker: "double".to_string(),
        }
    }
}

impl DotConfig {
    /// Adds a further name that is recognized as the start pseudostate. The first configured
    /// sentinel (`null` by default) is the one that is written.
    pub fn with_sentinel<S: Into<String>>(mut self, sentinel: S) -> Self {
        self.sentinels.push(sentinel.into());
        self
    }

    /// Sets the token whose presence in a `shape` attribute marks a node as accepting,
    /// `double` by default (matching `doublecircle`, `doubleoctagon`, ...).
    pub fn with_final_marker<S: Into<String>>(mut self, marker: S) -> Self {
        self.final_marker = marker.into();
        self
    }

    /// Returns true if `name` is one of the start pseudostates.
    pub fn is_sentinel(&self, name: &str) -> bool {
        self.sentinels.iter().any(|s| s == name)
    }

    /// The sentinel used when writing.
    pub fn sentinel(&self) -> &str {
        self.sentinels.first().map(String::as_str).unwrap_or("null")
    }

    /// Returns true if the given shape marks accepting nodes.
    pub fn is_final_shape(&self, shape: &str) -> bool {
        shape.contains(self.final_marker.as_str())
    }
}

fn quoted(name: &str) -> String {
    format!("\"{name}\"")
}

/// Enum that abstracts attributes in the DOT format.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum DotStateAttribute {
    /// The label of a node
    Label(String),
    /// The shape of a node
    Shape(String),
}

impl Display for DotStateAttribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DotStateAttribute::Label(s) => write!(f, "label=\"{s}\""),
            DotStateAttribute::Shape(s) => write!(f, "shape=\"{s}\""),
        }
    }
}

/// Attributes of an edge in the DOT format.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum DotTransitionAttribute {
    /// Comma separated list of the symbols on the edge.
    Label(String),
}

impl Display for DotTransitionAttribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DotTransitionAttribute::Label(lbl) => write!(f, "label=\"{lbl}\""),
        }
    }
}

impl Definition {
    /// Compute the graphviz representation using the default [`DotConfig`], for more
    /// information on the DOT format, see the
    /// [graphviz documentation](https://graphviz.org/doc/info/lang.html).
    pub fn dot_representation(&self) -> String {
        self.dot_representation_with(&DotConfig::default())
    }

    /// Compute the graphviz representation. Symbols that lead from the same source to the
    /// same target are merged into one edge with a comma separated label, epsilon transitions
    /// are written as edges without a label.
    pub fn dot_representation_with(&self, config: &DotConfig) -> String {
        let sentinel = config.sentinel();
        let header = [
            format!("digraph {} {{", self.kind().as_str().to_uppercase()),
            "rankdir=LR".to_string(),
            format!("{} [label=\"\", shape=none]", quoted(sentinel)),
            format!("{} -> {}", quoted(sentinel), quoted(self.initial.as_str())),
        ];

        let states = self.states.iter().map(|q| {
            let shape = if self.is_final(q) {
                "doublecircle"
            } else {
                "circle"
            };
            format!(
                "{} [{}]",
                quoted(q.as_str()),
                [
                    DotStateAttribute::Shape(shape.into()),
                    DotStateAttribute::Label(q.show()),
                ]
                .iter()
                .join(", ")
            )
        });

        let (epsilon, labeled): (Vec<_>, Vec<_>) = self
            .transitions
            .triples()
            .partition(|(_, symbol, _)| symbol.is_epsilon());

        let labeled = labeled
            .into_iter()
            .map(|(p, a, q)| ((p, q), a))
            .into_group_map()
            .into_iter()
            .sorted()
            .map(|((p, q), symbols)| {
                format!(
                    "{} -> {} [{}]",
                    quoted(p.as_str()),
                    quoted(q.as_str()),
                    DotTransitionAttribute::Label(symbols.into_iter().sorted().join(","))
                )
            });
        let epsilon = epsilon
            .into_iter()
            .map(|(p, _, q)| format!("{} -> {}", quoted(p.as_str()), quoted(q.as_str())));

        header
            .into_iter()
            .chain(states)
            .chain(labeled)
            .chain(epsilon)
            .chain(std::iter::once("}".to_string()))
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{records::FlatDefinition, Kind};

    fn parity() -> Definition {
        FlatDefinition {
            kind: Kind::Deterministic,
            alphabet: crate::records::split_list("0,1"),
            states: crate::records::split_list("q0,q1"),
            initial: "q0".into(),
            final_states: crate::records::split_list("q1"),
            records: ["q0,0,q0", "q0,1,q1", "q1,0,q1", "q1,1,q0"]
                .map(String::from)
                .to_vec(),
        }
        .build()
        .unwrap()
    }

    #[test_log::test]
    fn write_dot() {
        let dot = parity().dot_representation();
        assert!(dot.starts_with("digraph DFA {"));
        assert!(dot.contains("\"null\" -> \"q0\""));
        assert!(dot.contains("\"q1\" [shape=\"doublecircle\", label=\"q1\"]"));
        assert!(dot.contains("\"q0\" -> \"q1\" [label=\"1\"]"));
        assert!(dot.ends_with('}'));
    }

    #[test_log::test]
    fn write_then_reconstruct() {
        let original = parity();
        let config = DotConfig::default();
        let recovered =
            Definition::from_dot_with(&original.dot_representation_with(&config), &config)
                .unwrap();
        assert_eq!(recovered, original);
    }

    #[test]
    fn config() {
        let config = DotConfig::default()
            .with_sentinel("start")
            .with_final_marker("octagon");
        assert!(config.is_sentinel("null"));
        assert!(config.is_sentinel("start"));
        assert_eq!(config.sentinel(), "null");
        assert!(config.is_final_shape("doubleoctagon"));
        assert!(!config.is_final_shape("doublecircle"));
    }
}
