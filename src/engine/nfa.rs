use std::collections::VecDeque;

use bit_set::BitSet;
use tracing::{debug, trace};

use crate::{
    math::{Bijection, Map},
    Definition, State, Symbol,
};

use super::{dfa::index, set_name, Cursor, Dfa, Executable};

/// A nondeterministic finite automaton with epsilon transitions. Sets of states are
/// represented as [`BitSet`]s over the state indices.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Nfa {
    states: Bijection<State, usize>,
    symbols: Bijection<Symbol, usize>,
    initial: usize,
    accepting: BitSet,
    /// `None` stands for epsilon.
    edges: Map<(usize, Option<usize>), BitSet>,
}

impl Nfa {
    /// Builds the automaton described by `definition`, which may be of either kind.
    pub fn from_definition(definition: &Definition) -> Self {
        let states = index(definition.states().iter().cloned());
        let symbols = index(definition.alphabet().iter().cloned());
        let id = |q: &State| states.get_by_left(q).copied();

        let mut edges: Map<_, BitSet> = Map::default();
        for (p, a, q) in definition.transitions().triples() {
            let label = match a.is_epsilon() {
                true => None,
                false => match symbols.get_by_left(a) {
                    Some(&a) => Some(a),
                    None => continue,
                },
            };
            if let (Some(p), Some(q)) = (id(p), id(q)) {
                edges.entry((p, label)).or_default().insert(q);
            }
        }

        let accepting = definition.final_states().iter().filter_map(id).collect();
        let initial = id(definition.initial()).unwrap_or_default();
        Self {
            states,
            symbols,
            initial,
            accepting,
            edges,
        }
    }

    /// Number of states.
    pub fn size(&self) -> usize {
        self.states.len()
    }

    pub(super) fn name(&self, q: usize) -> Option<&State> {
        self.states.get_by_right(&q)
    }

    pub(super) fn symbol_id(&self, symbol: &Symbol) -> Option<usize> {
        self.symbols.get_by_left(symbol).copied()
    }

    /// Extends `set` by everything reachable through epsilon transitions.
    pub(super) fn closure(&self, mut set: BitSet) -> BitSet {
        let mut stack = set.iter().collect::<Vec<_>>();
        while let Some(q) = stack.pop() {
            if let Some(targets) = self.edges.get(&(q, None)) {
                for p in targets {
                    if set.insert(p) {
                        stack.push(p);
                    }
                }
            }
        }
        set
    }

    /// The epsilon closure of the initial state.
    pub(super) fn initial_set(&self) -> BitSet {
        self.closure(BitSet::from_iter([self.initial]))
    }

    /// Successors of `set` on the symbol with index `a`, closed under epsilon transitions.
    pub(super) fn step(&self, set: &BitSet, a: usize) -> BitSet {
        let mut next = BitSet::with_capacity(self.size());
        for q in set {
            if let Some(targets) = self.edges.get(&(q, Some(a))) {
                next.union_with(targets);
            }
        }
        self.closure(next)
    }

    pub(super) fn contains_accepting(&self, set: &BitSet) -> bool {
        !set.is_disjoint(&self.accepting)
    }

    fn subset_name(&self, set: &BitSet) -> State {
        set_name(set.iter().filter_map(|q| self.name(q)))
    }
}

impl Executable for Nfa {
    fn accepts<'a, W>(&self, word: W) -> bool
    where
        W: IntoIterator<Item = &'a Symbol>,
    {
        let mut current = self.initial_set();
        for symbol in word {
            let Some(a) = self.symbol_id(symbol) else {
                return false;
            };
            current = self.step(&current, a);
            if current.is_empty() {
                return false;
            }
        }
        self.contains_accepting(&current)
    }

    /// Subset construction. Only subsets reachable from the closure of the initial state are
    /// explored and the empty subset is never created, so the result may be partial.
    fn to_deterministic(&self) -> Dfa {
        let start = self.initial_set();
        let mut ids: Map<BitSet, usize> = Map::default();
        let mut subsets = vec![start.clone()];
        ids.insert(start.clone(), 0);
        let mut queue = VecDeque::from([start]);
        let mut edges = Map::default();

        while let Some(set) = queue.pop_front() {
            let source = ids[&set];
            for a in 0..self.symbols.len() {
                let next = self.step(&set, a);
                if next.is_empty() {
                    continue;
                }
                let target = match ids.get(&next) {
                    Some(&id) => id,
                    None => {
                        let id = subsets.len();
                        trace!("discovered subset {}", self.subset_name(&next));
                        ids.insert(next.clone(), id);
                        subsets.push(next.clone());
                        queue.push_back(next);
                        id
                    }
                };
                edges.insert((source, a), target);
            }
        }
        debug!(
            "subset construction produced {} states from {}",
            subsets.len(),
            self.size()
        );

        Dfa {
            states: subsets
                .iter()
                .enumerate()
                .map(|(i, set)| (self.subset_name(set), i))
                .collect(),
            symbols: self.symbols.clone(),
            initial: 0,
            accepting: subsets
                .iter()
                .enumerate()
                .filter(|(_, set)| self.contains_accepting(set))
                .map(|(i, _)| i)
                .collect(),
            edges,
        }
    }

    fn canonicalize(&self) -> Dfa {
        self.to_deterministic().canonicalize()
    }

    fn cursor(&self) -> Cursor<'_> {
        Cursor::nondeterministic(self)
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{second_to_last_one, word};
    use super::*;

    #[test_log::test]
    fn epsilon_closure() {
        let def = Definition::from_dot(
            "null -> a\na -> b\nb -> c\nc -> a [label=x]\na -> a [label=x]\na -> c [label=x]\nc [shape=doublecircle]",
        )
        .unwrap();
        assert!(!def.is_deterministic());
        let nfa = Nfa::from_definition(&def);
        assert_eq!(nfa.initial_set().len(), 3);
        assert!(nfa.accepts(&word("")));
        assert!(nfa.accepts(&word("xx")));
        assert!(!nfa.accepts(&word("y")));
    }

    #[test_log::test]
    fn subset_names() {
        let dfa = Nfa::from_definition(&second_to_last_one()).to_deterministic();
        assert_eq!(dfa.initial_state().map(State::as_str), Some("{a}"));
        let names = dfa.states.left_values().map(State::as_str).collect::<Vec<_>>();
        assert!(names.contains(&"{a|b|c}"));
        assert!(names.contains(&"{a|c}"));
    }
}
