use std::{borrow::Borrow, fmt::Display, str::FromStr};

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{
    math::{OrderedMap, OrderedSet},
    Show,
};

mod key;
pub use key::{TransitionKey, KEY_SEPARATOR};

macro_rules! name_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Default, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a new value from anything that can be turned into a `String`.
            pub fn new<S: Into<String>>(name: S) -> Self {
                Self(name.into())
            }

            /// Returns the underlying name.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consumes `self` and returns the underlying name.
            pub fn into_string(self) -> String {
                self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl Show for $name {
            fn show(&self) -> String {
                self.0.clone()
            }
            fn show_collection<'a, I>(iter: I) -> String
            where
                Self: 'a,
                I: IntoIterator<Item = &'a Self>,
                I::IntoIter: DoubleEndedIterator,
            {
                format!("{{{}}}", iter.into_iter().map(|x| x.show()).join(", "))
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

name_type!(
    /// Names a control point of an automaton.
    State
);

name_type!(
    /// A letter of the alphabet. The empty symbol plays the role of an unlabeled
    /// (epsilon) transition and is never required to be part of an alphabet.
    Symbol
);

impl Symbol {
    /// The symbol carried by unlabeled edges.
    pub fn epsilon() -> Self {
        Self(String::new())
    }

    /// Returns true if `self` is the epsilon symbol.
    pub fn is_epsilon(&self) -> bool {
        self.0.is_empty()
    }
}

/// Whether an automaton maps every `(state, symbol)` pair to at most one state or to a set of states.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub enum Kind {
    /// Every pair has at most one target.
    #[serde(rename = "dfa", alias = "deterministic")]
    Deterministic,
    /// Every pair has a (non-empty) set of targets.
    #[serde(rename = "nfa", alias = "nondeterministic")]
    Nondeterministic,
}

impl Kind {
    /// Short name as used in persisted records and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Deterministic => "dfa",
            Kind::Nondeterministic => "nfa",
        }
    }
}

impl Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Kind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dfa" | "deterministic" => Ok(Kind::Deterministic),
            "nfa" | "nondeterministic" => Ok(Kind::Nondeterministic),
            other => Err(format!("unknown automaton type `{other}`, expected `dfa` or `nfa`")),
        }
    }
}

/// The transition data of a definition. The variant is the authoritative record of
/// which [`Kind`] the automaton has.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Transitions {
    /// Each pair maps to exactly one state.
    Deterministic(OrderedMap<TransitionKey, State>),
    /// Each pair maps to a set of states.
    Nondeterministic(OrderedMap<TransitionKey, OrderedSet<State>>),
}

/// Borrowed view on the target(s) stored for one [`TransitionKey`].
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Targets<'a> {
    /// The single target of a deterministic transition.
    Single(&'a State),
    /// The target set of a nondeterministic transition.
    Many(&'a OrderedSet<State>),
}

impl<'a> Targets<'a> {
    /// Iterates over all target states.
    pub fn iter(&self) -> impl Iterator<Item = &'a State> + 'a {
        match *self {
            Targets::Single(q) => itertools::Either::Left(std::iter::once(q)),
            Targets::Many(qs) => itertools::Either::Right(qs.iter()),
        }
    }

    /// Number of target states.
    pub fn len(&self) -> usize {
        match self {
            Targets::Single(_) => 1,
            Targets::Many(qs) => qs.len(),
        }
    }

    /// Returns true if there is no target at all.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Transitions {
    /// Creates an empty table of the given kind.
    pub fn empty(kind: Kind) -> Self {
        match kind {
            Kind::Deterministic => Transitions::Deterministic(OrderedMap::new()),
            Kind::Nondeterministic => Transitions::Nondeterministic(OrderedMap::new()),
        }
    }

    /// The kind that is implied by the variant.
    pub fn kind(&self) -> Kind {
        match self {
            Transitions::Deterministic(_) => Kind::Deterministic,
            Transitions::Nondeterministic(_) => Kind::Nondeterministic,
        }
    }

    /// Number of `(state, symbol)` pairs that have an entry.
    pub fn len(&self) -> usize {
        match self {
            Transitions::Deterministic(map) => map.len(),
            Transitions::Nondeterministic(map) => map.len(),
        }
    }

    /// Returns true if no pair has an entry.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Looks up the target(s) for the given key.
    pub fn get(&self, key: &TransitionKey) -> Option<Targets<'_>> {
        match self {
            Transitions::Deterministic(map) => map.get(key).map(Targets::Single),
            Transitions::Nondeterministic(map) => map.get(key).map(Targets::Many),
        }
    }

    /// Iterates over all entries, ordered by key.
    pub fn iter(&self) -> impl Iterator<Item = (&TransitionKey, Targets<'_>)> + '_ {
        match self {
            Transitions::Deterministic(map) => {
                itertools::Either::Left(map.iter().map(|(k, q)| (k, Targets::Single(q))))
            }
            Transitions::Nondeterministic(map) => {
                itertools::Either::Right(map.iter().map(|(k, qs)| (k, Targets::Many(qs))))
            }
        }
    }

    /// Iterates over all `(source, symbol, target)` triples, ordered by key and then by target.
    pub fn triples(&self) -> impl Iterator<Item = (&State, &Symbol, &State)> + '_ {
        self.iter().flat_map(|(key, targets)| {
            targets
                .iter()
                .map(move |target| (key.state(), key.symbol(), target))
        })
    }

    /// All states that occur as source or target of some transition.
    pub fn states(&self) -> OrderedSet<&State> {
        self.triples().flat_map(|(p, _, q)| [p, q]).collect()
    }

    /// All symbols that occur on some transition, including epsilon.
    pub fn symbols(&self) -> OrderedSet<&Symbol> {
        self.iter().map(|(key, _)| key.symbol()).collect()
    }
}

/// A fully validated, immutable description of a finite automaton.
///
/// Values of this type can only be obtained through [`crate::assemble::Assembler`] (which is
/// what every builder, the graph reconstructor and the codec end up calling), so holding a
/// `Definition` means that
/// - the initial state is a state,
/// - every final state is a state,
/// - every source and target of a transition is a state and every symbol on a transition is
///   either in the alphabet or the epsilon symbol,
/// - a nondeterministic transition never has an empty target set.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Definition {
    pub(crate) alphabet: OrderedSet<Symbol>,
    pub(crate) states: OrderedSet<State>,
    pub(crate) initial: State,
    pub(crate) final_states: OrderedSet<State>,
    pub(crate) transitions: Transitions,
}

impl Definition {
    /// Whether `self` is deterministic or nondeterministic.
    pub fn kind(&self) -> Kind {
        self.transitions.kind()
    }

    /// Returns true if `self` is of deterministic kind.
    pub fn is_deterministic(&self) -> bool {
        self.kind() == Kind::Deterministic
    }

    /// The alphabet, in the natural order of symbols.
    pub fn alphabet(&self) -> &OrderedSet<Symbol> {
        &self.alphabet
    }

    /// The state set, in the natural order of states.
    pub fn states(&self) -> &OrderedSet<State> {
        &self.states
    }

    /// The designated initial state.
    pub fn initial(&self) -> &State {
        &self.initial
    }

    /// The accepting states.
    pub fn final_states(&self) -> &OrderedSet<State> {
        &self.final_states
    }

    /// Returns true if `state` is accepting.
    pub fn is_final(&self, state: &State) -> bool {
        self.final_states.contains(state)
    }

    /// The transition table/relation.
    pub fn transitions(&self) -> &Transitions {
        &self.transitions
    }

    /// Number of states.
    pub fn size(&self) -> usize {
        self.states.len()
    }

    /// Iterates over the successors of `state` on `symbol`. The iterator is empty if there is
    /// no such transition.
    pub fn successors<'a>(
        &'a self,
        state: &State,
        symbol: &Symbol,
    ) -> impl Iterator<Item = &'a State> + 'a {
        self.transitions
            .get(&TransitionKey::new(state.clone(), symbol.clone()))
            .into_iter()
            .flat_map(|targets| targets.iter())
    }

    /// Produces a human readable table with one row per state and one column per symbol.
    /// Initial states are marked with `->`, final states with `*`.
    pub fn transition_table(&self) -> String {
        let has_epsilon = self.transitions.symbols().iter().any(|s| s.is_epsilon());
        let columns = self
            .alphabet
            .iter()
            .cloned()
            .chain(has_epsilon.then(Symbol::epsilon))
            .collect_vec();

        let mut builder = tabled::builder::Builder::default();
        builder.push_record(std::iter::once("State".to_string()).chain(columns.iter().map(
            |sym| {
                if sym.is_epsilon() {
                    "ε".to_string()
                } else {
                    sym.show()
                }
            },
        )));
        for state in &self.states {
            let marker = match (state == &self.initial, self.is_final(state)) {
                (true, true) => "->*",
                (true, false) => "->",
                (false, true) => "*",
                (false, false) => "",
            };
            let mut row = vec![format!("{marker}{}", state.show())];
            for sym in &columns {
                let targets = self.successors(state, sym).collect_vec();
                row.push(match targets.len() {
                    0 => "-".to_string(),
                    1 if self.is_deterministic() => targets[0].show(),
                    _ => State::show_collection(targets),
                });
            }
            builder.push_record(row);
        }

        builder
            .build()
            .with(tabled::settings::Style::rounded())
            .to_string()
    }
}
