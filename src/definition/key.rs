use std::{fmt::Display, str::FromStr};

use crate::{error::DefinitionError, Show};

use super::{State, Symbol};

/// Separator between state and symbol in the textual form of a [`TransitionKey`].
pub const KEY_SEPARATOR: char = ',';

/// A `(state, symbol)` pair indexing transition data.
///
/// The textual form is `state,symbol`, which is also how keys are persisted. Parsing splits
/// at the first separator; the symbol part may be empty (epsilon) but may not contain a
/// further separator, and the state part may not be empty.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct TransitionKey {
    state: State,
    symbol: Symbol,
}

impl TransitionKey {
    /// Creates a key from its two components.
    pub fn new(state: State, symbol: Symbol) -> Self {
        Self { state, symbol }
    }

    /// The source state.
    pub fn state(&self) -> &State {
        &self.state
    }

    /// The symbol.
    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    /// Decomposes `self` into its components.
    pub fn into_parts(self) -> (State, Symbol) {
        (self.state, self.symbol)
    }
}

impl Display for TransitionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{KEY_SEPARATOR}{}", self.state, self.symbol)
    }
}

impl Show for TransitionKey {
    fn show(&self) -> String {
        format!("({}, {})", self.state.show(), self.symbol.show())
    }
}

impl FromStr for TransitionKey {
    type Err = DefinitionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(KEY_SEPARATOR) {
            Some((state, symbol)) if !state.is_empty() && !symbol.contains(KEY_SEPARATOR) => {
                Ok(Self::new(state.into(), symbol.into()))
            }
            _ => Err(DefinitionError::MalformedKey(s.to_string())),
        }
    }
}

impl<P: Into<State>, S: Into<Symbol>> From<(P, S)> for TransitionKey {
    fn from((state, symbol): (P, S)) -> Self {
        Self::new(state.into(), symbol.into())
    }
}
