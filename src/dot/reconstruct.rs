//! Recovers automaton definitions from graph text as produced by graphviz based renderers.
//!
//! The text is not parsed against a grammar. Instead every line is matched against the few
//! shapes that carry automaton structure, all other lines are skipped:
//! - `node [shape=doublecircle]; q1 q2` declares the listed nodes, they are accepting if the
//!   shape contains the final marker of the [`DotConfig`],
//! - `q1 [shape=doublecircle, label="q1"]` does the same for a single node,
//! - `null -> q0` (with `null` being a configured sentinel) designates the initial state,
//! - `q0 -> q1 [label="a,b"]` adds one transition per symbol in the label, an edge without a
//!   label carries the epsilon symbol. Edges into a sentinel are skipped, so a sentinel never
//!   becomes a state.
//!
//! Nested subgraphs, attribute lists that span several lines and escaped characters inside
//! quoted strings are not supported.
use itertools::Itertools;
use tracing::{debug, trace, warn};

use crate::{
    assemble::Assembler,
    error::DefinitionError,
    math::{IndexMap, IndexSet, OrderedMap, OrderedSet},
    Definition, Kind, State, Symbol, TransitionKey, Transitions,
};

use super::DotConfig;

type Attributes = Vec<(String, String)>;

#[derive(Debug, Clone, Eq, PartialEq)]
enum Statement {
    Edge {
        source: String,
        target: String,
        attributes: Attributes,
    },
    Nodes {
        names: Vec<String>,
        attributes: Attributes,
    },
    Skip(&'static str),
}

fn unquote(token: &str) -> &str {
    let token = token.trim();
    if token.len() >= 2 && token.starts_with('"') && token.ends_with('"') {
        &token[1..token.len() - 1]
    } else {
        token
    }
}

fn is_identifier(token: &str) -> bool {
    let token = token.trim();
    if token.len() >= 2 && token.starts_with('"') && token.ends_with('"') {
        return !token[1..token.len() - 1].contains('"');
    }
    !token.is_empty()
        && token
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '.')
}

/// Splits `line` into the part before a bracketed attribute list, the contents of the list
/// and the part after it. Brackets inside quotes are not considered. Returns `None` if a list
/// is opened but never closed.
fn split_attribute_list(line: &str) -> Option<(&str, Option<&str>, &str)> {
    let mut in_quotes = false;
    let mut open = None;
    for (i, c) in line.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            '[' if !in_quotes && open.is_none() => open = Some(i),
            ']' if !in_quotes => {
                if let Some(start) = open {
                    return Some((&line[..start], Some(&line[start + 1..i]), &line[i + 1..]));
                }
            }
            _ => {}
        }
    }
    match open {
        Some(_) => None,
        None => Some((line, None, "")),
    }
}

/// Tokenizes the inside of an attribute list into `key=value` pairs. Pairs may be separated
/// by commas, semicolons or whitespace, values may be quoted.
fn parse_attributes(list: &str) -> Attributes {
    let mut tokens = vec![];
    let mut current = String::new();
    let mut in_quotes = false;
    let mut quoted = false;
    let flush = |current: &mut String, quoted: &mut bool, tokens: &mut Vec<String>| {
        if !current.is_empty() || *quoted {
            tokens.push(std::mem::take(current));
        }
        *quoted = false;
    };

    for c in list.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                quoted = true;
            }
            _ if in_quotes => current.push(c),
            '=' => {
                flush(&mut current, &mut quoted, &mut tokens);
                tokens.push("=".to_string());
            }
            ',' | ';' => flush(&mut current, &mut quoted, &mut tokens),
            w if w.is_whitespace() => flush(&mut current, &mut quoted, &mut tokens),
            _ => current.push(c),
        }
    }
    flush(&mut current, &mut quoted, &mut tokens);

    let mut attributes = vec![];
    let mut i = 0;
    while i < tokens.len() {
        if tokens.get(i + 1).map(String::as_str) == Some("=") {
            if let Some(value) = tokens.get(i + 2) {
                attributes.push((tokens[i].to_ascii_lowercase(), value.clone()));
            }
            i += 3;
        } else {
            i += 1;
        }
    }
    attributes
}

fn parse_line(line: &str) -> Statement {
    let line = line.trim();
    if line.starts_with("//") || line.starts_with('#') {
        return Statement::Skip("comment");
    }
    let line = line.trim_end_matches(';').trim();
    if line.is_empty() {
        return Statement::Skip("empty line");
    }

    let Some((head, list, rest)) = split_attribute_list(line) else {
        return Statement::Skip("unterminated attribute list");
    };
    let attributes = list.map(parse_attributes).unwrap_or_default();

    if let Some((source, target)) = head.split_once("->") {
        if target.contains("->") {
            return Statement::Skip("chained edge");
        }
        if !is_identifier(source) || !is_identifier(target) {
            return Statement::Skip("edge between unsupported node names");
        }
        return Statement::Edge {
            source: unquote(source).to_string(),
            target: unquote(target).to_string(),
            attributes,
        };
    }

    let head = head.trim();
    match head {
        "node" => Statement::Nodes {
            names: rest
                .split(|c: char| c == ';' || c == ',' || c.is_whitespace())
                .filter(|name| is_identifier(name))
                .map(|name| unquote(name).to_string())
                .collect(),
            attributes,
        },
        "graph" | "edge" => Statement::Skip("default attribute statement"),
        _ if head.contains(&['{', '}', '='][..]) => Statement::Skip("graph level statement"),
        _ if is_identifier(head) => Statement::Nodes {
            names: vec![unquote(head).to_string()],
            attributes,
        },
        _ => Statement::Skip("unrecognized statement"),
    }
}

fn label_symbols(label: Option<&str>) -> Vec<Symbol> {
    let symbols = label
        .into_iter()
        .flat_map(|label| label.split(','))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(Symbol::from)
        .collect_vec();
    if symbols.is_empty() {
        vec![Symbol::epsilon()]
    } else {
        symbols
    }
}

/// Everything collected while scanning graph text, before the transitions are finalized.
///
/// States, symbols and final states are kept in order of first appearance, and for every
/// `(source, symbol)` pair all targets are kept in the order they were encountered,
/// including repetitions.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct GraphScan {
    states: IndexSet<State>,
    alphabet: IndexSet<Symbol>,
    initial: Option<State>,
    final_states: IndexSet<State>,
    edges: IndexMap<TransitionKey, Vec<State>>,
}

impl GraphScan {
    /// The designated initial state, if a start edge was found.
    pub fn initial(&self) -> Option<&State> {
        self.initial.as_ref()
    }

    /// All discovered states.
    pub fn states(&self) -> &IndexSet<State> {
        &self.states
    }

    /// All discovered symbols, epsilon excluded.
    pub fn alphabet(&self) -> &IndexSet<Symbol> {
        &self.alphabet
    }

    /// The states that were marked as accepting.
    pub fn final_states(&self) -> &IndexSet<State> {
        &self.final_states
    }

    /// The raw targets collected for `key`.
    pub fn targets(&self, key: &TransitionKey) -> Option<&[State]> {
        self.edges.get(key).map(Vec::as_slice)
    }

    /// Classifies the scanned graph: it is nondeterministic if and only if some
    /// `(source, symbol)` pair has more than one distinct target.
    pub fn inferred_kind(&self) -> Kind {
        match self
            .edges
            .values()
            .any(|targets| targets.iter().unique().count() > 1)
        {
            true => Kind::Nondeterministic,
            false => Kind::Deterministic,
        }
    }

    /// Finalizes the scan using the [inferred kind](GraphScan::inferred_kind).
    pub fn finalize(self) -> Result<Reconstruction, DefinitionError> {
        let kind = self.inferred_kind();
        debug!("graph text classified as {kind}");
        self.finalize_as(kind)
    }

    /// Turns the collected targets into transitions of the given kind. For the deterministic
    /// kind, every pair has to have exactly one distinct target.
    pub(crate) fn finalize_as(self, kind: Kind) -> Result<Reconstruction, DefinitionError> {
        let initial = self.initial.ok_or(DefinitionError::MissingInitialState)?;

        let transitions = match kind {
            Kind::Deterministic => {
                let mut table = OrderedMap::new();
                for (key, targets) in self.edges {
                    let mut distinct = targets.into_iter().unique().collect_vec();
                    match distinct.pop() {
                        Some(target) if distinct.is_empty() => {
                            table.insert(key, target);
                        }
                        last => {
                            distinct.extend(last);
                            let (state, symbol) = key.into_parts();
                            return Err(DefinitionError::InconsistentDeterminism {
                                state,
                                symbol,
                                targets: distinct,
                            });
                        }
                    }
                }
                Transitions::Deterministic(table)
            }
            Kind::Nondeterministic => Transitions::Nondeterministic(
                self.edges
                    .into_iter()
                    .map(|(key, targets)| (key, targets.into_iter().collect::<OrderedSet<_>>()))
                    .collect(),
            ),
        };

        Ok(Reconstruction {
            states: self.states,
            alphabet: self.alphabet,
            initial,
            final_states: self.final_states,
            transitions,
        })
    }
}

/// The finalized result of reconstructing graph text, ready to be assembled.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Reconstruction {
    /// Discovered states.
    pub states: IndexSet<State>,
    /// Discovered symbols.
    pub alphabet: IndexSet<Symbol>,
    /// The designated initial state.
    pub initial: State,
    /// States marked as accepting.
    pub final_states: IndexSet<State>,
    /// Finalized transitions, their variant is the classification of the graph.
    pub transitions: Transitions,
}

impl Reconstruction {
    /// The kind the graph was classified as.
    pub fn kind(&self) -> Kind {
        self.transitions.kind()
    }

    /// Hands the reconstruction to the [`Assembler`].
    pub fn into_definition(self) -> Result<Definition, DefinitionError> {
        Assembler::new(self.transitions)
            .with_alphabet(self.alphabet)
            .with_states(self.states)
            .with_initial(self.initial)
            .with_final_states(self.final_states)
            .assemble()
    }
}

/// Scans `text` line by line and collects states, symbols, the initial state, final states
/// and edges. The only error that can occur here is a second start edge pointing to a
/// different state than the first one.
pub fn scan(text: &str, config: &DotConfig) -> Result<GraphScan, DefinitionError> {
    let mut graph = GraphScan::default();

    for (index, line) in text.lines().enumerate() {
        match parse_line(line) {
            Statement::Edge { source, target, .. } if config.is_sentinel(&target) => {
                warn!(
                    "line {}: skipping edge from {source} into start pseudostate {target}",
                    index + 1
                );
            }
            Statement::Edge { source, target, .. } if config.is_sentinel(&source) => {
                let target = State::from(target);
                if let Some(first) = &graph.initial {
                    if first != &target {
                        return Err(DefinitionError::ConflictingInitialState {
                            first: first.clone(),
                            second: target,
                            line: index + 1,
                        });
                    }
                }
                trace!("line {}: start edge to {target}", index + 1);
                graph.states.insert(target.clone());
                graph.initial = Some(target);
            }
            Statement::Edge {
                source,
                target,
                attributes,
            } => {
                let source = State::from(source);
                let target = State::from(target);
                let label = attributes
                    .iter()
                    .find(|(key, _)| key == "label")
                    .map(|(_, value)| value.as_str());
                trace!("line {}: edge {source} -> {target} on {label:?}", index + 1);

                graph.states.insert(source.clone());
                graph.states.insert(target.clone());
                for symbol in label_symbols(label) {
                    if !symbol.is_epsilon() {
                        graph.alphabet.insert(symbol.clone());
                    }
                    graph
                        .edges
                        .entry(TransitionKey::new(source.clone(), symbol))
                        .or_default()
                        .push(target.clone());
                }
            }
            Statement::Nodes { names, attributes } => {
                let accepting = attributes
                    .iter()
                    .any(|(key, value)| key == "shape" && config.is_final_shape(value));
                for name in names.into_iter().filter(|name| !config.is_sentinel(name)) {
                    trace!("line {}: node {name}, accepting: {accepting}", index + 1);
                    let state = State::from(name);
                    if accepting {
                        graph.final_states.insert(state.clone());
                    }
                    graph.states.insert(state);
                }
            }
            Statement::Skip(reason @ ("chained edge" | "unterminated attribute list")) => {
                warn!("line {}: skipping unsupported {reason}", index + 1);
            }
            Statement::Skip(reason) => trace!("line {}: skipping {reason}", index + 1),
        }
    }

    debug!(
        "scanned {} states, {} symbols and {} labeled pairs",
        graph.states.len(),
        graph.alphabet.len(),
        graph.edges.len()
    );
    Ok(graph)
}

/// Scans, finalizes and assembles `text` in one go.
pub fn reconstruct(text: &str, config: &DotConfig) -> Result<Definition, DefinitionError> {
    scan(text, config)?.finalize()?.into_definition()
}

impl Definition {
    /// Reconstructs a definition from graph text using the default [`DotConfig`], see
    /// [`reconstruct`].
    pub fn from_dot(text: &str) -> Result<Self, DefinitionError> {
        reconstruct(text, &DotConfig::default())
    }

    /// Reconstructs a definition from graph text, see [`reconstruct`].
    pub fn from_dot_with(text: &str, config: &DotConfig) -> Result<Self, DefinitionError> {
        reconstruct(text, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PARITY: &str = r#"digraph finite_state_machine {
        rankdir=LR;
        size="8,5"
        node [shape = doublecircle]; q1;
        node [shape = circle];
        null [shape = point];
        null -> q0;
        q0 -> q0 [label = "0"];
        q0 -> q1 [label = "1"];
        q1 -> q1 [label = "0"];
        q1 -> q0 [label = "1"];
    }"#;

    #[test]
    fn parse_statements() {
        assert_eq!(
            parse_line(r#"  q0 -> q1 [label = "a,b", color=red];"#),
            Statement::Edge {
                source: "q0".into(),
                target: "q1".into(),
                attributes: vec![
                    ("label".into(), "a,b".into()),
                    ("color".into(), "red".into())
                ],
            }
        );
        assert_eq!(
            parse_line("node [shape = doublecircle]; LR_0 LR_3;"),
            Statement::Nodes {
                names: vec!["LR_0".into(), "LR_3".into()],
                attributes: vec![("shape".into(), "doublecircle".into())],
            }
        );
        assert_eq!(
            parse_line(r#"start [label="" height=0 shape=none width=0]"#),
            Statement::Nodes {
                names: vec!["start".into()],
                attributes: vec![
                    ("label".into(), "".into()),
                    ("height".into(), "0".into()),
                    ("shape".into(), "none".into()),
                    ("width".into(), "0".into())
                ],
            }
        );
        assert!(matches!(parse_line("rankdir=LR;"), Statement::Skip(_)));
        assert!(matches!(parse_line("digraph G {"), Statement::Skip(_)));
        assert!(matches!(parse_line("a -> b -> c"), Statement::Skip("chained edge")));
        assert!(matches!(
            parse_line("a -> b [label=\"x\""),
            Statement::Skip("unterminated attribute list")
        ));
    }

    #[test_log::test]
    fn scan_parity() {
        let graph = scan(PARITY, &DotConfig::default()).unwrap();
        assert_eq!(graph.initial(), Some(&State::from("q0")));
        assert_eq!(graph.final_states().len(), 1);
        assert!(graph.final_states().contains(&State::from("q1")));
        assert!(!graph.states().contains(&State::from("null")));
        assert_eq!(graph.alphabet().len(), 2);
        assert_eq!(graph.inferred_kind(), Kind::Deterministic);
    }

    #[test_log::test]
    fn unlabeled_edges_are_epsilon() {
        let text = "null -> a\na -> b\nb -> a [label=\"x\"]\nb [shape=doublecircle]";
        let graph = scan(text, &DotConfig::default()).unwrap();
        let eps = TransitionKey::new("a".into(), Symbol::epsilon());
        assert_eq!(graph.targets(&eps), Some(&[State::from("b")][..]));
        assert!(!graph.alphabet().contains(&Symbol::epsilon()));

        let def = graph.finalize().unwrap().into_definition().unwrap();
        assert_eq!(def.successors(&"a".into(), &Symbol::epsilon()).count(), 1);
        assert!(def.is_final(&"b".into()));
    }

    #[test_log::test]
    fn repeated_identical_edges_stay_deterministic() {
        let text = "null -> a\na -> b [label=x]\na -> b [label=x]";
        let graph = scan(text, &DotConfig::default()).unwrap();
        assert_eq!(graph.targets(&("a", "x").into()).map(<[State]>::len), Some(2));
        assert_eq!(graph.inferred_kind(), Kind::Deterministic);
        let reconstruction = graph.finalize().unwrap();
        assert_eq!(reconstruction.kind(), Kind::Deterministic);
    }

    #[test_log::test]
    fn guard_against_inconsistent_classification() {
        let text = "null -> a\na -> b [label=x]\na -> c [label=x]\na -> b [label=x]";
        let graph = scan(text, &DotConfig::default()).unwrap();
        assert_eq!(graph.inferred_kind(), Kind::Nondeterministic);
        let err = graph.finalize_as(Kind::Deterministic).unwrap_err();
        assert_eq!(
            err,
            DefinitionError::InconsistentDeterminism {
                state: "a".into(),
                symbol: "x".into(),
                targets: vec!["b".into(), "c".into()],
            }
        );
        assert!(err.is_internal());
    }

    #[test]
    fn conflicting_start_edges() {
        let err = scan("null -> a\nnull -> a\nnull -> b", &DotConfig::default()).unwrap_err();
        assert_eq!(
            err,
            DefinitionError::ConflictingInitialState {
                first: "a".into(),
                second: "b".into(),
                line: 3
            }
        );
    }

    #[test_log::test]
    fn edges_into_the_sentinel_are_skipped() {
        let def =
            Definition::from_dot("null -> a\na -> null [label=x]\na -> a [label=y]").unwrap();
        assert_eq!(def.size(), 1);
        assert!(!def.states().contains(&State::from("null")));
        assert_eq!(def.transitions().len(), 1);
        assert!(!def.alphabet().contains(&Symbol::from("x")));
    }

    #[test]
    fn quoted_names_with_separator_are_rejected() {
        let text = "null -> \"a,b\"\n\"a,b\" -> \"a,b\" [label=x]";
        let err = Definition::from_dot(text).unwrap_err();
        assert!(matches!(
            err,
            DefinitionError::MalformedRecord { ref record, .. } if record == "state `a,b`"
        ));
    }

    #[test]
    fn configured_sentinels() {
        let text = "digraph {\n\"\" -> s\ns -> s [label=\"a\"]\n}";
        assert_eq!(
            reconstruct(text, &DotConfig::default()),
            Err(DefinitionError::MissingInitialState)
        );
        let def = reconstruct(text, &DotConfig::default().with_sentinel("")).unwrap();
        assert_eq!(def.initial().as_str(), "s");
        assert_eq!(def.size(), 1);
    }
}
