//! The contract through which definitions are turned into executable automata, together with
//! a reference implementation.
//!
//! A [`Definition`] only describes an automaton. An [`Engine`] instantiates it into something
//! [`Executable`], which can decide membership of words, be converted into an equivalent
//! deterministic automaton, be reduced to its canonical (minimal) form and be driven symbol
//! by symbol through a [`Cursor`].
use thiserror::Error;

use crate::{Definition, State, Symbol};

mod cursor;
mod dfa;
mod minimize;
mod nfa;

pub use cursor::Cursor;
pub use dfa::Dfa;
pub use nfa::Nfa;

/// Errors signalled by the reference engine.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum EngineError {
    /// A deterministic automaton cannot have unlabeled transitions.
    #[error("deterministic automaton has an epsilon transition leaving `{0}`")]
    EpsilonInDeterministic(State),
    /// A symbol outside the alphabet was given to a cursor.
    #[error("symbol `{0}` is not part of the alphabet")]
    UnknownSymbol(Symbol),
}

/// Instantiates definitions into executable automata.
pub trait Engine {
    /// What a definition is turned into.
    type Automaton: Executable;
    /// Signals that a definition cannot be instantiated.
    type Error: std::error::Error;

    /// Creates an executable automaton from `definition`.
    fn instantiate(&self, definition: &Definition) -> Result<Self::Automaton, Self::Error>;
}

/// The queries supported by an instantiated automaton.
pub trait Executable {
    /// Returns true if the automaton accepts the given word. Words containing symbols outside
    /// of the alphabet are rejected.
    fn accepts<'a, W>(&self, word: W) -> bool
    where
        W: IntoIterator<Item = &'a Symbol>;

    /// Produces an equivalent deterministic automaton.
    fn to_deterministic(&self) -> Dfa;

    /// Produces the equivalent deterministic automaton with the least number of states. Only
    /// states that are reachable from the initial state and from which an accepting state can
    /// be reached are kept, so the result may be partial.
    fn canonicalize(&self) -> Dfa;

    /// Returns a handle for running the automaton incrementally, positioned at the initial
    /// state.
    fn cursor(&self) -> Cursor<'_>;
}

/// The result of instantiating a [`Definition`] with the [`ReferenceEngine`], its variant
/// follows the kind of the definition.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Instance {
    /// Instantiated from a deterministic definition.
    Dfa(Dfa),
    /// Instantiated from a nondeterministic definition.
    Nfa(Nfa),
}

impl Executable for Instance {
    fn accepts<'a, W>(&self, word: W) -> bool
    where
        W: IntoIterator<Item = &'a Symbol>,
    {
        match self {
            Instance::Dfa(dfa) => dfa.accepts(word),
            Instance::Nfa(nfa) => nfa.accepts(word),
        }
    }

    fn to_deterministic(&self) -> Dfa {
        match self {
            Instance::Dfa(dfa) => dfa.to_deterministic(),
            Instance::Nfa(nfa) => nfa.to_deterministic(),
        }
    }

    fn canonicalize(&self) -> Dfa {
        match self {
            Instance::Dfa(dfa) => dfa.canonicalize(),
            Instance::Nfa(nfa) => nfa.canonicalize(),
        }
    }

    fn cursor(&self) -> Cursor<'_> {
        match self {
            Instance::Dfa(dfa) => dfa.cursor(),
            Instance::Nfa(nfa) => nfa.cursor(),
        }
    }
}

/// The engine that ships with this crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReferenceEngine;

impl Engine for ReferenceEngine {
    type Automaton = Instance;
    type Error = EngineError;

    fn instantiate(&self, definition: &Definition) -> Result<Instance, EngineError> {
        if definition.is_deterministic() {
            Dfa::from_definition(definition).map(Instance::Dfa)
        } else {
            Ok(Instance::Nfa(Nfa::from_definition(definition)))
        }
    }
}

impl Definition {
    /// Instantiates `self` with the [`ReferenceEngine`].
    pub fn instantiate(&self) -> Result<Instance, EngineError> {
        ReferenceEngine.instantiate(self)
    }
}

/// Name of a state that stands for a set of states, `{a|b}` for `a` and `b`. The names are
/// joined with `|` so that the result can be used in a [`TransitionKey`](crate::TransitionKey).
fn set_name<'a, I: IntoIterator<Item = &'a State>>(states: I) -> State {
    let mut names = states.into_iter().map(State::as_str).collect::<Vec<_>>();
    names.sort_unstable();
    State::new(format!("{{{}}}", names.join("|")))
}
