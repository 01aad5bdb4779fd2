use std::collections::VecDeque;

use bit_set::BitSet;
use tracing::trace;

use crate::{
    assemble::Assembler,
    error::DefinitionError,
    math::{Bijection, Map, OrderedMap},
    Definition, State, Symbol, TransitionKey, Transitions,
};

use super::{minimize, Cursor, EngineError, Executable};

/// A deterministic finite automaton over indexed states and symbols. The transition function
/// may be partial, a missing transition rejects.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Dfa {
    pub(super) states: Bijection<State, usize>,
    pub(super) symbols: Bijection<Symbol, usize>,
    pub(super) initial: usize,
    pub(super) accepting: BitSet,
    pub(super) edges: Map<(usize, usize), usize>,
}

pub(super) fn index<T: Ord + Clone>(items: impl IntoIterator<Item = T>) -> Bijection<T, usize> {
    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| (item, i))
        .collect()
}

impl Dfa {
    /// Builds the automaton described by a deterministic definition.
    pub fn from_definition(definition: &Definition) -> Result<Self, EngineError> {
        let states = index(definition.states().iter().cloned());
        let symbols = index(definition.alphabet().iter().cloned());
        let id = |q: &State| states.get_by_left(q).copied();

        let mut edges = Map::default();
        for (p, a, q) in definition.transitions().triples() {
            if a.is_epsilon() {
                return Err(EngineError::EpsilonInDeterministic(p.clone()));
            }
            if let (Some(p), Some(&a), Some(q)) = (id(p), symbols.get_by_left(a), id(q)) {
                edges.insert((p, a), q);
            }
        }

        let accepting = definition.final_states().iter().filter_map(id).collect();
        let initial = id(definition.initial()).unwrap_or_default();
        Ok(Self {
            states,
            symbols,
            initial,
            accepting,
            edges,
        })
    }

    /// Number of states.
    pub fn size(&self) -> usize {
        self.states.len()
    }

    /// The name of the initial state.
    pub fn initial_state(&self) -> Option<&State> {
        self.name(self.initial)
    }

    pub(super) fn name(&self, q: usize) -> Option<&State> {
        self.states.get_by_right(&q)
    }

    pub(super) fn symbol_id(&self, symbol: &Symbol) -> Option<usize> {
        self.symbols.get_by_left(symbol).copied()
    }

    pub(super) fn successor(&self, q: usize, a: usize) -> Option<usize> {
        self.edges.get(&(q, a)).copied()
    }

    pub(super) fn is_accepting(&self, q: usize) -> bool {
        self.accepting.contains(q)
    }

    /// Indices of all states that can be reached from the initial state, in breadth first
    /// order (so the initial state comes first).
    pub(super) fn reachable(&self) -> Vec<usize> {
        let mut seen = BitSet::with_capacity(self.size());
        let mut order = vec![];
        let mut queue = VecDeque::from([self.initial]);
        seen.insert(self.initial);
        while let Some(q) = queue.pop_front() {
            order.push(q);
            for a in 0..self.symbols.len() {
                if let Some(p) = self.successor(q, a) {
                    if seen.insert(p) {
                        queue.push_back(p);
                    }
                }
            }
        }
        order
    }

    /// Runs `word` from the initial state and returns the reached state, if the run does not
    /// get stuck.
    fn run<'a, W: IntoIterator<Item = &'a Symbol>>(&self, word: W) -> Option<usize> {
        word.into_iter().try_fold(self.initial, |q, symbol| {
            let a = self.symbol_id(symbol)?;
            let next = self.successor(q, a);
            trace!("{:?} --{symbol}--> {:?}", self.name(q), next.and_then(|p| self.name(p)));
            next
        })
    }

    /// Converts `self` back into a [`Definition`].
    pub fn to_definition(&self) -> Result<Definition, DefinitionError> {
        let mut table = OrderedMap::new();
        for (&(p, a), &q) in &self.edges {
            if let (Some(p), Some(a), Some(q)) =
                (self.name(p), self.symbols.get_by_right(&a), self.name(q))
            {
                table.insert(TransitionKey::new(p.clone(), a.clone()), q.clone());
            }
        }
        let mut assembler = Assembler::new(Transitions::Deterministic(table))
            .with_alphabet(self.symbols.left_values().cloned())
            .with_states(self.states.left_values().cloned())
            .with_final_states(self.accepting.iter().filter_map(|q| self.name(q)).cloned());
        if let Some(initial) = self.initial_state() {
            assembler = assembler.with_initial(initial.clone());
        }
        assembler.assemble()
    }
}

impl Executable for Dfa {
    fn accepts<'a, W>(&self, word: W) -> bool
    where
        W: IntoIterator<Item = &'a Symbol>,
    {
        self.run(word).is_some_and(|q| self.is_accepting(q))
    }

    fn to_deterministic(&self) -> Dfa {
        self.clone()
    }

    fn canonicalize(&self) -> Dfa {
        minimize::moore_partition_refinement(self)
    }

    fn cursor(&self) -> Cursor<'_> {
        Cursor::deterministic(self)
    }
}
