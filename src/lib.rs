//! Library for reconstructing, validating and persisting definitions of finite automata.
//!
//! A [`Definition`] is the complete, validated description of a deterministic or
//! nondeterministic finite automaton: an alphabet, a set of states, an initial state, a set of
//! final states and a transition table (or relation). There is exactly one way of producing a
//! definition, which is the [`assemble::Assembler`]. It checks every structural invariant
//! before handing out a value, so that holding a `Definition` is proof of its consistency.
//!
//! The assembler is fed by three front ends
//! - [`records`] builds transitions from flat `state,symbol,target(s)` records, as they would be
//!   given on a command line,
//! - [`dot`] recovers a definition from graph text (as produced by graphviz based tools) and
//!   infers whether the automaton is deterministic from the shape of the graph,
//! - [`codec`] reads the persisted JSON form and writes it back.
//!
//! Validated definitions can be handed to an [`engine::Engine`] to obtain something that can
//! actually decide membership of words. The crate ships with a reference engine behind the
//! `engine` feature (enabled by default).
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

/// The prelude is supposed to make using this package easier. Including everything, i.e.
/// `use fsa::prelude::*;` should be enough to use the package.
pub mod prelude {
    pub use super::{
        assemble::Assembler,
        codec::{self, CodecError, DefinitionRecord, TargetRecord},
        dot::{DotConfig, GraphScan, Reconstruction},
        error::DefinitionError,
        math,
        records::{build_transitions, split_list, FlatDefinition, TransitionRecord},
        Definition, Kind, Show, State, Symbol, Targets, TransitionKey, Transitions,
    };

    #[cfg(feature = "engine")]
    pub use super::engine::{
        Cursor, Dfa, Engine, EngineError, Executable, Instance, Nfa, ReferenceEngine,
    };
}

/// This module contains some definitions of mathematical objects which are used throughout the crate and
/// do not really fit to the top level.
pub mod math;

/// Names, keys and the validated [`Definition`] itself.
pub mod definition;
pub use definition::{Definition, Kind, State, Symbol, Targets, TransitionKey, Transitions};

/// Errors that are raised while building definitions.
pub mod error;

/// Membership checks shared by all builders.
pub mod validate;

/// Builds transitions from flat records.
pub mod records;

/// The single place where [`Definition`]s are created.
pub mod assemble;

pub mod dot;

/// Reading and writing the persisted JSON form of a definition.
pub mod codec;

#[cfg(feature = "engine")]
pub mod engine;

/// Helper trait which can be used to display states, transitions and such.
pub trait Show {
    /// Returns a human readable representation of `self`, for a state that is simply its name
    /// and for a transition key `(q0, a)` it should be `(q0, a)`. This is mainly used for
    /// tables, labels and debugging purposes.
    fn show(&self) -> String;
    /// Show a collection of the thing, for a collection of states this should be {q0, q1, q2, ...}.
    /// By default the elements are shown one after another, separated by commas.
    fn show_collection<'a, I>(iter: I) -> String
    where
        Self: 'a,
        I: IntoIterator<Item = &'a Self>,
        I::IntoIter: DoubleEndedIterator,
    {
        itertools::Itertools::join(&mut iter.into_iter().map(|x| x.show()), ", ")
    }
}

impl Show for String {
    fn show(&self) -> String {
        self.clone()
    }
}

impl<S: Show> Show for Vec<S> {
    fn show(&self) -> String {
        S::show_collection(self.iter())
    }
}

impl<S: Show, T: Show> Show for (S, T) {
    fn show(&self) -> String {
        format!("({}, {})", self.0.show(), self.1.show())
    }
}

impl<S: Show> Show for &S {
    fn show(&self) -> String {
        S::show(*self)
    }
}
