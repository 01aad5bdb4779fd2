use std::hash::{BuildHasher, Hash};

use crate::{error::DefinitionError, State, Symbol};

/// Anything that can answer whether it contains a given item. This lets the membership
/// predicates below work on whatever collection a caller happens to hold.
pub trait Membership<T> {
    /// Returns true if `item` is contained in `self`.
    fn has(&self, item: &T) -> bool;
}

impl<T: Ord> Membership<T> for std::collections::BTreeSet<T> {
    fn has(&self, item: &T) -> bool {
        self.contains(item)
    }
}

impl<T: Hash + Eq, B: BuildHasher> Membership<T> for std::collections::HashSet<T, B> {
    fn has(&self, item: &T) -> bool {
        self.contains(item)
    }
}

impl<T: Hash + Eq, B: BuildHasher> Membership<T> for indexmap::IndexSet<T, B> {
    fn has(&self, item: &T) -> bool {
        self.contains(item)
    }
}

impl<T: PartialEq> Membership<T> for [T] {
    fn has(&self, item: &T) -> bool {
        self.contains(item)
    }
}

impl<T: PartialEq> Membership<T> for Vec<T> {
    fn has(&self, item: &T) -> bool {
        self.as_slice().has(item)
    }
}

/// Returns true if `state` is one of `states`.
pub fn state_exists<M: Membership<State> + ?Sized>(state: &State, states: &M) -> bool {
    states.has(state)
}

/// Returns true if `symbol` is part of `alphabet`.
pub fn symbol_exists<M: Membership<Symbol> + ?Sized>(symbol: &Symbol, alphabet: &M) -> bool {
    alphabet.has(symbol)
}

/// Returns true if every element of `xs` is contained in `set`.
pub fn all_in<'a, T, I, M>(xs: I, set: &M) -> bool
where
    T: 'a,
    I: IntoIterator<Item = &'a T>,
    M: Membership<T> + ?Sized,
{
    xs.into_iter().all(|x| set.has(x))
}

/// Like [`state_exists`], but produces [`DefinitionError::UnknownState`] naming `context` if
/// the state is missing.
pub fn require_state<M, C>(state: &State, states: &M, context: C) -> Result<(), DefinitionError>
where
    M: Membership<State> + ?Sized,
    C: FnOnce() -> String,
{
    if state_exists(state, states) {
        Ok(())
    } else {
        Err(DefinitionError::UnknownState {
            state: state.clone(),
            context: context(),
        })
    }
}

/// Like [`symbol_exists`], but produces [`DefinitionError::UnknownSymbol`] naming `context`
/// if the symbol is missing.
pub fn require_symbol<M, C>(
    symbol: &Symbol,
    alphabet: &M,
    context: C,
) -> Result<(), DefinitionError>
where
    M: Membership<Symbol> + ?Sized,
    C: FnOnce() -> String,
{
    if symbol_exists(symbol, alphabet) {
        Ok(())
    } else {
        Err(DefinitionError::UnknownSymbol {
            symbol: symbol.clone(),
            context: context(),
        })
    }
}
