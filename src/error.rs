use itertools::Itertools;
use thiserror::Error;

use crate::{State, Symbol};

/// Abstracts the types of errors that can occur while building a [`crate::Definition`].
///
/// All of them are fatal to the build in progress, no partially built definition is ever
/// handed out.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum DefinitionError {
    /// A transition record does not have the expected shape.
    #[error("malformed record {record}: {reason}")]
    MalformedRecord {
        /// Where the record came from and what it looked like.
        record: String,
        /// What is wrong with it.
        reason: String,
    },
    /// A persisted transition key cannot be split into state and symbol.
    #[error("malformed transition key `{0}`, expected `state,symbol`")]
    MalformedKey(String),
    /// A referenced state is not a member of the state set.
    #[error("{context}: state `{state}` is not among the defined states")]
    UnknownState {
        /// The offending state.
        state: State,
        /// Where the state was referenced.
        context: String,
    },
    /// A referenced symbol is not a member of the alphabet.
    #[error("{context}: symbol `{symbol}` is not part of the alphabet")]
    UnknownSymbol {
        /// The offending symbol.
        symbol: Symbol,
        /// Where the symbol was referenced.
        context: String,
    },
    /// A deterministic `(state, symbol)` pair is defined more than once.
    #[error("duplicate deterministic transition for ({state}, {symbol}), {context}")]
    DuplicateTransition {
        /// Source state of the pair.
        state: State,
        /// Symbol of the pair.
        symbol: Symbol,
        /// Where the second definition was found.
        context: String,
    },
    /// A pair of an automaton classified as deterministic has several distinct targets.
    #[error("deterministic transition from {state} on `{symbol}` leads to multiple states: {}", .targets.iter().join(", "))]
    InconsistentDeterminism {
        /// Source state of the pair.
        state: State,
        /// Symbol of the pair.
        symbol: Symbol,
        /// The distinct targets found for the pair.
        targets: Vec<State>,
    },
    /// The graph text contains no start edge.
    #[error("no initial state designated, expected a start edge")]
    MissingInitialState,
    /// The graph text designates two different initial states.
    #[error("line {line}: initial state `{second}` conflicts with previously designated `{first}`")]
    ConflictingInitialState {
        /// The state designated first.
        first: State,
        /// The state designated later.
        second: State,
        /// 1-based line of the second designation.
        line: usize,
    },
    /// A nondeterministic transition ended up without targets.
    #[error("internal error: transition ({state}, {symbol}) has an empty target set")]
    EmptyTargetSet {
        /// Source state of the pair.
        state: State,
        /// Symbol of the pair.
        symbol: Symbol,
    },
}

impl DefinitionError {
    /// Returns true for errors that indicate a defect in a builder rather than bad input.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            DefinitionError::InconsistentDeterminism { .. } | DefinitionError::EmptyTargetSet { .. }
        )
    }
}
