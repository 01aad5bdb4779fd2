use bit_set::BitSet;
use tracing::trace;

use crate::{State, Symbol};

use super::{Dfa, EngineError, Nfa};

#[derive(Debug, Clone)]
enum Position<'a> {
    Deterministic { dfa: &'a Dfa, current: Option<usize> },
    Nondeterministic { nfa: &'a Nfa, current: BitSet },
}

/// Runs an automaton one symbol at a time. A cursor starts in the initial state (or the
/// epsilon closure of it) and can be advanced with [`Cursor::push`]. Once a deterministic run
/// reaches a missing transition, or a nondeterministic run runs out of states, the cursor is
/// stuck and stays rejecting.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    position: Position<'a>,
}

impl<'a> Cursor<'a> {
    pub(super) fn deterministic(dfa: &'a Dfa) -> Self {
        Self {
            position: Position::Deterministic {
                dfa,
                current: Some(dfa.initial),
            },
        }
    }

    pub(super) fn nondeterministic(nfa: &'a Nfa) -> Self {
        Self {
            position: Position::Nondeterministic {
                nfa,
                current: nfa.initial_set(),
            },
        }
    }

    /// The states the run is currently in, sorted by name. Empty if the cursor is stuck.
    pub fn current(&self) -> Vec<&'a State> {
        let mut states = match &self.position {
            Position::Deterministic { dfa, current } => {
                current.iter().filter_map(|&q| dfa.name(q)).collect::<Vec<_>>()
            }
            Position::Nondeterministic { nfa, current } => {
                current.iter().filter_map(|q| nfa.name(q)).collect()
            }
        };
        states.sort();
        states
    }

    /// Returns true if the word read so far is accepted.
    pub fn is_accepting(&self) -> bool {
        match &self.position {
            Position::Deterministic { dfa, current } => current.is_some_and(|q| dfa.is_accepting(q)),
            Position::Nondeterministic { nfa, current } => nfa.contains_accepting(current),
        }
    }

    /// Returns true if no continuation of the word read so far can be accepted because the
    /// run has died.
    pub fn is_stuck(&self) -> bool {
        match &self.position {
            Position::Deterministic { current, .. } => current.is_none(),
            Position::Nondeterministic { current, .. } => current.is_empty(),
        }
    }

    /// Reads one symbol. Symbols outside of the alphabet (including epsilon) are reported and
    /// leave the cursor unchanged.
    pub fn push(&mut self, symbol: &Symbol) -> Result<(), EngineError> {
        let unknown = || EngineError::UnknownSymbol(symbol.clone());
        match &mut self.position {
            Position::Deterministic { dfa, current } => {
                let a = dfa.symbol_id(symbol).ok_or_else(unknown)?;
                *current = current.and_then(|q| dfa.successor(q, a));
            }
            Position::Nondeterministic { nfa, current } => {
                let a = nfa.symbol_id(symbol).ok_or_else(unknown)?;
                *current = nfa.step(current, a);
            }
        }
        trace!("read {symbol}, now in {:?}", self.current());
        Ok(())
    }

    /// Reads all symbols of `word`, stopping at the first unknown one.
    pub fn feed<'w, W>(&mut self, word: W) -> Result<(), EngineError>
    where
        W: IntoIterator<Item = &'w Symbol>,
    {
        word.into_iter().try_for_each(|symbol| self.push(symbol))
    }
}
