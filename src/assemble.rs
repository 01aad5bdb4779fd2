use tracing::{debug, trace};

use crate::{
    error::DefinitionError,
    math::OrderedSet,
    validate::{require_state, require_symbol},
    definition::KEY_SEPARATOR,
    Definition, State, Symbol, Transitions,
};

/// Names end up in composite `state,symbol` keys when a definition is persisted, so a state
/// must be non-empty and neither a state nor a symbol may contain the separator.
fn require_key_compatible(
    kind: &str,
    name: &str,
    allow_empty: bool,
) -> Result<(), DefinitionError> {
    let reason = if name.contains(KEY_SEPARATOR) {
        format!("{kind} names must not contain `{KEY_SEPARATOR}`")
    } else if name.is_empty() && !allow_empty {
        format!("{kind} names must not be empty")
    } else {
        return Ok(());
    };
    Err(DefinitionError::MalformedRecord {
        record: format!("{kind} `{name}`"),
        reason,
    })
}

/// Helper struct for the construction of a [`Definition`] from the raw output of one of the
/// builders. Declared sets are given through the `with_*` methods, each call adds to what was
/// declared before, and everything is checked at once by [`Assembler::assemble`].
///
/// # Example
///
/// ```
/// use fsa::prelude::*;
///
/// let table = [(("q0", "a"), "q1"), (("q1", "a"), "q0")]
///     .into_iter()
///     .map(|(key, target)| (TransitionKey::from(key), State::from(target)))
///     .collect();
/// let definition = Assembler::new(Transitions::Deterministic(table))
///     .with_alphabet(["a"])
///     .with_states(["q0", "q1"])
///     .with_initial("q0")
///     .with_final_states(["q1"])
///     .assemble()
///     .unwrap();
/// assert!(definition.is_deterministic());
/// ```
#[derive(Debug, Clone)]
pub struct Assembler {
    alphabet: OrderedSet<Symbol>,
    states: OrderedSet<State>,
    initial: Option<State>,
    final_states: OrderedSet<State>,
    transitions: Transitions,
}

impl Assembler {
    /// Starts assembling a definition around the given transitions, whose variant determines
    /// the kind of the result.
    pub fn new(transitions: Transitions) -> Self {
        Self {
            alphabet: OrderedSet::new(),
            states: OrderedSet::new(),
            initial: None,
            final_states: OrderedSet::new(),
            transitions,
        }
    }

    /// Adds symbols to the alphabet.
    pub fn with_alphabet<I, S>(mut self, symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Symbol>,
    {
        self.alphabet.extend(symbols.into_iter().map(Into::into));
        self
    }

    /// Adds states to the state set.
    pub fn with_states<I, S>(mut self, states: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<State>,
    {
        self.states.extend(states.into_iter().map(Into::into));
        self
    }

    /// Sets the initial state.
    pub fn with_initial<S: Into<State>>(mut self, initial: S) -> Self {
        self.initial = Some(initial.into());
        self
    }

    /// Adds accepting states.
    pub fn with_final_states<I, S>(mut self, states: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<State>,
    {
        self.final_states
            .extend(states.into_iter().map(Into::into));
        self
    }

    /// Checks all invariants of a [`Definition`] and produces it. The first violation is
    /// returned and the partially assembled data is dropped.
    ///
    /// The checks run in this order: an initial state was given and is a state, every final
    /// state is a state, every state name is non-empty and no state or symbol contains the key
    /// separator (see [`KEY_SEPARATOR`]), and for every transition the source is a state, the
    /// symbol is in the alphabet (epsilon is always allowed) and every target is a state. A
    /// nondeterministic transition with an empty target set is reported as
    /// [`DefinitionError::EmptyTargetSet`], which can only be caused by a faulty builder.
    pub fn assemble(self) -> Result<Definition, DefinitionError> {
        let Self {
            alphabet,
            states,
            initial,
            final_states,
            transitions,
        } = self;

        let initial = initial.ok_or(DefinitionError::MissingInitialState)?;
        require_state(&initial, &states, || "initial state".to_string())?;
        for q in &final_states {
            require_state(q, &states, || "final state".to_string())?;
        }
        for q in &states {
            require_key_compatible("state", q.as_str(), false)?;
        }
        for a in &alphabet {
            require_key_compatible("symbol", a.as_str(), true)?;
        }

        for (key, targets) in transitions.iter() {
            trace!("validating transitions of {key}");
            let context = || format!("transition ({}, {})", key.state(), key.symbol());
            require_state(key.state(), &states, context)?;
            if !key.symbol().is_epsilon() {
                require_symbol(key.symbol(), &alphabet, context)?;
            }
            if targets.is_empty() {
                return Err(DefinitionError::EmptyTargetSet {
                    state: key.state().clone(),
                    symbol: key.symbol().clone(),
                });
            }
            for target in targets.iter() {
                require_state(target, &states, context)?;
            }
        }

        debug!(
            "assembled {} with {} states, {} symbols and {} transition entries",
            transitions.kind(),
            states.len(),
            alphabet.len(),
            transitions.len()
        );
        Ok(Definition {
            alphabet,
            states,
            initial,
            final_states,
            transitions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{math::OrderedMap, Kind, TransitionKey};

    fn relation(entries: &[(&str, &str, &[&str])]) -> Transitions {
        Transitions::Nondeterministic(
            entries
                .iter()
                .map(|(p, a, qs)| {
                    (
                        TransitionKey::from((*p, *a)),
                        qs.iter().map(|&q| State::from(q)).collect(),
                    )
                })
                .collect(),
        )
    }

    #[test_log::test]
    fn assemble_nondeterministic() {
        let def = Assembler::new(relation(&[("a", "0", &["a", "b"][..]), ("b", "", &["a"][..])]))
            .with_alphabet(["0"])
            .with_states(["a", "b"])
            .with_initial("a")
            .with_final_states(["b"])
            .assemble()
            .unwrap();
        assert_eq!(def.kind(), Kind::Nondeterministic);
        assert_eq!(def.successors(&"a".into(), &"0".into()).count(), 2);
    }

    #[test]
    fn declared_sets_are_unions() {
        let def = Assembler::new(Transitions::empty(Kind::Deterministic))
            .with_states(["a"])
            .with_states(["b"])
            .with_alphabet(["x"])
            .with_alphabet(["y", "x"])
            .with_initial("b")
            .assemble()
            .unwrap();
        assert_eq!(def.states().len(), 2);
        assert_eq!(def.alphabet().len(), 2);
        assert!(def.final_states().is_empty());
    }

    #[test]
    fn incomplete_declarations_are_caught() {
        let err = Assembler::new(relation(&[("a", "0", &["c"][..])]))
            .with_alphabet(["0"])
            .with_states(["a", "b"])
            .with_initial("a")
            .assemble()
            .unwrap_err();
        assert_eq!(
            err,
            DefinitionError::UnknownState {
                state: "c".into(),
                context: "transition (a, 0)".to_string()
            }
        );

        let err = Assembler::new(relation(&[("a", "1", &["a"][..])]))
            .with_alphabet(["0"])
            .with_states(["a"])
            .with_initial("a")
            .assemble()
            .unwrap_err();
        assert!(matches!(err, DefinitionError::UnknownSymbol { .. }));

        let err = Assembler::new(Transitions::empty(Kind::Nondeterministic))
            .with_states(["a"])
            .with_initial("a")
            .with_final_states(["z"])
            .assemble()
            .unwrap_err();
        assert!(
            matches!(err, DefinitionError::UnknownState { ref context, .. } if context == "final state")
        );
    }

    #[test]
    fn names_must_fit_into_keys() {
        let err = Assembler::new(relation(&[("a,b", "0", &["a,b"][..])]))
            .with_alphabet(["0"])
            .with_states(["a,b"])
            .with_initial("a,b")
            .assemble()
            .unwrap_err();
        assert_eq!(
            err,
            DefinitionError::MalformedRecord {
                record: "state `a,b`".to_string(),
                reason: "state names must not contain `,`".to_string(),
            }
        );

        let err = Assembler::new(Transitions::empty(Kind::Deterministic))
            .with_alphabet(["x,y"])
            .with_states(["a"])
            .with_initial("a")
            .assemble()
            .unwrap_err();
        assert!(matches!(
            err,
            DefinitionError::MalformedRecord { ref record, .. } if record == "symbol `x,y`"
        ));

        let err = Assembler::new(Transitions::empty(Kind::Deterministic))
            .with_states(["", "a"])
            .with_initial("a")
            .assemble()
            .unwrap_err();
        assert!(matches!(
            err,
            DefinitionError::MalformedRecord { ref record, .. } if record == "state ``"
        ));
    }

    #[test]
    fn missing_initial_and_empty_targets() {
        let err = Assembler::new(Transitions::empty(Kind::Deterministic))
            .with_states(["a"])
            .assemble()
            .unwrap_err();
        assert_eq!(err, DefinitionError::MissingInitialState);

        let mut broken = OrderedMap::new();
        broken.insert(TransitionKey::from(("a", "0")), OrderedSet::new());
        let err = Assembler::new(Transitions::Nondeterministic(broken))
            .with_alphabet(["0"])
            .with_states(["a"])
            .with_initial("a")
            .assemble()
            .unwrap_err();
        assert!(err.is_internal());
    }
}
