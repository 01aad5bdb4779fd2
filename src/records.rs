use std::str::FromStr;

use itertools::Itertools;
use tracing::{debug, trace};

use crate::{
    assemble::Assembler,
    error::DefinitionError,
    math::{OrderedMap, OrderedSet},
    validate::{require_state, require_symbol},
    Definition, Kind, State, Symbol, TransitionKey, Transitions,
};

/// Splits a comma-separated declaration like `"q0, q1,q2"` into its trimmed, non-empty parts.
pub fn split_list<T: From<String>>(input: &str) -> Vec<T> {
    input
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| T::from(part.to_string()))
        .collect()
}

/// One flat transition record of the form `state,symbol,target[,target...]`.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct TransitionRecord {
    raw: String,
    state: State,
    symbol: Symbol,
    targets: Vec<State>,
}

impl TransitionRecord {
    /// The source state.
    pub fn state(&self) -> &State {
        &self.state
    }

    /// The symbol.
    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    /// The target states in the order they were listed.
    pub fn targets(&self) -> &[State] {
        &self.targets
    }

    /// The record as it was given.
    pub fn raw(&self) -> &str {
        &self.raw
    }
}

impl FromStr for TransitionRecord {
    type Err = DefinitionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields = s.split(',').map(str::trim).collect_vec();
        if fields.len() < 3 {
            return Err(DefinitionError::MalformedRecord {
                record: format!("`{s}`"),
                reason: "expected `state,symbol,next_state[,next_state...]`".to_string(),
            });
        }
        Ok(Self {
            raw: s.to_string(),
            state: fields[0].into(),
            symbol: fields[1].into(),
            targets: fields[2..].iter().map(|&q| State::from(q)).collect(),
        })
    }
}

fn describe(index: usize, raw: &str) -> String {
    format!("record {} `{raw}`", index + 1)
}

/// Builds the transition table (deterministic `kind`) or relation (nondeterministic `kind`)
/// described by `records`, checking every record against the previously validated
/// `alphabet` and `states`.
///
/// Records are processed in order and the first violation aborts the build:
/// - a record with fewer than three fields, or for the deterministic kind not exactly three,
///   is a [`DefinitionError::MalformedRecord`],
/// - an unknown source state, symbol or target yields [`DefinitionError::UnknownState`] or
///   [`DefinitionError::UnknownSymbol`],
/// - a deterministic pair that was already assigned yields
///   [`DefinitionError::DuplicateTransition`].
///
/// For the nondeterministic kind, repeated pairs accumulate the union of all their targets.
pub fn build_transitions<I, R>(
    kind: Kind,
    records: I,
    alphabet: &OrderedSet<Symbol>,
    states: &OrderedSet<State>,
) -> Result<Transitions, DefinitionError>
where
    I: IntoIterator<Item = R>,
    R: AsRef<str>,
{
    let mut deterministic = OrderedMap::new();
    let mut nondeterministic: OrderedMap<TransitionKey, OrderedSet<State>> = OrderedMap::new();

    for (index, raw) in records.into_iter().enumerate() {
        let raw = raw.as_ref();
        let record: TransitionRecord =
            raw.parse()
                .map_err(|_| DefinitionError::MalformedRecord {
                    record: describe(index, raw),
                    reason: match kind {
                        Kind::Deterministic => "expected `state,symbol,next_state`",
                        Kind::Nondeterministic => {
                            "expected `state,symbol,next_state1,next_state2,...`"
                        }
                    }
                    .to_string(),
                })?;
        trace!("processing {}", describe(index, raw));

        if kind == Kind::Deterministic && record.targets.len() != 1 {
            return Err(DefinitionError::MalformedRecord {
                record: describe(index, raw),
                reason: "expected `state,symbol,next_state`".to_string(),
            });
        }

        require_state(&record.state, states, || describe(index, raw))?;
        require_symbol(&record.symbol, alphabet, || describe(index, raw))?;
        for target in &record.targets {
            require_state(target, states, || describe(index, raw))?;
        }

        let key = TransitionKey::new(record.state, record.symbol);
        match kind {
            Kind::Deterministic => {
                if deterministic.contains_key(&key) {
                    let (state, symbol) = key.into_parts();
                    return Err(DefinitionError::DuplicateTransition {
                        state,
                        symbol,
                        context: describe(index, raw),
                    });
                }
                if let Some(target) = record.targets.into_iter().next() {
                    deterministic.insert(key, target);
                }
            }
            Kind::Nondeterministic => {
                let entry = nondeterministic.entry(key).or_default();
                if !entry.is_empty() {
                    debug!("merging targets of repeated pair in {}", describe(index, raw));
                }
                entry.extend(record.targets);
            }
        }
    }

    Ok(match kind {
        Kind::Deterministic => Transitions::Deterministic(deterministic),
        Kind::Nondeterministic => Transitions::Nondeterministic(nondeterministic),
    })
}

/// Everything needed to define an automaton from flat declarations, mirroring what a user
/// types on the command line: a kind, the alphabet, the states, the initial state, the final
/// states and a list of transition records.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct FlatDefinition {
    /// Deterministic or nondeterministic.
    pub kind: Kind,
    /// Declared symbols.
    pub alphabet: Vec<Symbol>,
    /// Declared states.
    pub states: Vec<State>,
    /// The initial state, must be declared.
    pub initial: State,
    /// The final states, must be declared.
    pub final_states: Vec<State>,
    /// Transition records, see [`build_transitions`].
    pub records: Vec<String>,
}

impl FlatDefinition {
    /// Validates the declarations, builds the transitions and assembles the [`Definition`].
    /// The initial state is checked first, then the final states, then the records.
    pub fn build(self) -> Result<Definition, DefinitionError> {
        let alphabet: OrderedSet<Symbol> = self.alphabet.into_iter().collect();
        let states: OrderedSet<State> = self.states.into_iter().collect();

        require_state(&self.initial, &states, || "initial state".to_string())?;
        for q in &self.final_states {
            require_state(q, &states, || "final state".to_string())?;
        }

        let transitions = build_transitions(self.kind, &self.records, &alphabet, &states)?;
        debug!(
            "built {} {} transition entries from {} records",
            transitions.len(),
            self.kind,
            self.records.len()
        );

        Assembler::new(transitions)
            .with_alphabet(alphabet)
            .with_states(states)
            .with_initial(self.initial)
            .with_final_states(self.final_states)
            .assemble()
    }
}
