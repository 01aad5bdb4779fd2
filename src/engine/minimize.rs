use std::collections::VecDeque;

use bit_set::BitSet;
use itertools::Itertools;
use tracing::{debug, trace};

use crate::{
    math::{Bijection, Map},
    State,
};

use super::{set_name, Dfa};

/// Computes the minimal deterministic automaton that is equivalent to `dfa`.
///
/// Only states reachable from the initial state take part. Missing transitions are routed to
/// an implicit sink, and the partition `{accepting, rejecting}` is refined by comparing the
/// classes of successors until it is stable. The class containing the sink is exactly the set
/// of states from which no accepting state is reachable, it is removed again so the result is
/// partial. If the language is empty, only the initial state is kept. Classes are numbered in
/// breadth first order from the initial class, a class with a single member keeps that
/// member's name, otherwise it is named like `{q1|q2}`.
pub(super) fn moore_partition_refinement(dfa: &Dfa) -> Dfa {
    let reachable = dfa.reachable();
    let local: Map<usize, usize> = reachable
        .iter()
        .enumerate()
        .map(|(i, &q)| (q, i))
        .collect();
    let sink = reachable.len();
    let symbols = dfa.symbols.len();

    let successor = |i: usize, a: usize| -> usize {
        reachable
            .get(i)
            .and_then(|&q| dfa.successor(q, a))
            .and_then(|p| local.get(&p).copied())
            .unwrap_or(sink)
    };

    let mut class = (0..=sink)
        .map(|i| match reachable.get(i) {
            Some(&q) if dfa.is_accepting(q) => 1,
            _ => 0,
        })
        .collect_vec();
    let mut count = class.iter().unique().count();

    loop {
        let mut signatures: Map<(usize, Vec<usize>), usize> = Map::default();
        let refined = (0..=sink)
            .map(|i| {
                let signature = (class[i], (0..symbols).map(|a| class[successor(i, a)]).collect());
                let next = signatures.len();
                *signatures.entry(signature).or_insert(next)
            })
            .collect_vec();
        trace!("refined {count} classes into {}", signatures.len());
        class = refined;
        if signatures.len() == count {
            break;
        }
        count = signatures.len();
    }

    let dead = class[sink];
    let members = (0..sink).map(|i| (class[i], reachable[i])).into_group_map();
    let name_of = |c: usize| -> State {
        match members.get(&c).map(Vec::as_slice) {
            Some([q]) => dfa.name(*q).cloned().unwrap_or_default(),
            Some(qs) => set_name(qs.iter().filter_map(|&q| dfa.name(q))),
            None => State::default(),
        }
    };

    let initial_class = class[0];
    if initial_class == dead {
        debug!("language is empty, canonical automaton has a single rejecting state");
        return Dfa {
            states: Bijection::from_iter([(dfa.initial_state().cloned().unwrap_or_default(), 0)]),
            symbols: dfa.symbols.clone(),
            initial: 0,
            accepting: BitSet::new(),
            edges: Map::default(),
        };
    }

    // renumber the live classes in breadth first order
    let mut ids: Map<usize, usize> = Map::from_iter([(initial_class, 0)]);
    let mut order = vec![initial_class];
    let mut representative: Map<usize, usize> = Map::default();
    for i in 0..sink {
        representative.entry(class[i]).or_insert(i);
    }
    let mut queue = VecDeque::from([initial_class]);
    let mut edges = Map::default();
    while let Some(c) = queue.pop_front() {
        let Some(&i) = representative.get(&c) else {
            continue;
        };
        for a in 0..symbols {
            let target = class[successor(i, a)];
            if target == dead {
                continue;
            }
            let id = *ids.entry(target).or_insert_with(|| {
                order.push(target);
                queue.push_back(target);
                order.len() - 1
            });
            edges.insert((ids[&c], a), id);
        }
    }

    let accepting = order
        .iter()
        .enumerate()
        .filter(|(_, c)| {
            representative
                .get(c)
                .is_some_and(|&i| dfa.is_accepting(reachable[i]))
        })
        .map(|(id, _)| id)
        .collect();

    debug!(
        "minimized automaton from {} to {} states",
        dfa.size(),
        order.len()
    );
    Dfa {
        states: order
            .iter()
            .enumerate()
            .map(|(id, &c)| (name_of(c), id))
            .collect(),
        symbols: dfa.symbols.clone(),
        initial: 0,
        accepting,
        edges,
    }
}

#[cfg(test)]
mod tests {
    use super::super::{
        tests::{even_ones, word},
        Executable,
    };
    use super::*;
    use crate::Definition;

    #[test_log::test]
    fn merges_equivalent_states() {
        let def = Definition::from_dot(
            "null -> a\na -> b [label=\"0,1\"]\nb -> c [label=\"0,1\"]\nc -> b [label=\"0,1\"]\nb [shape=doublecircle]\nd -> a [label=0]",
        )
        .unwrap();
        let dfa = Dfa::from_definition(&def).unwrap();
        assert_eq!(dfa.size(), 4);
        let min = dfa.canonicalize();
        assert_eq!(min.size(), 2);
        assert_eq!(min.initial_state().map(State::as_str), Some("{a|c}"));
        assert!(min.accepts(&word("101")));
        assert!(!min.accepts(&word("11")));
    }

    #[test_log::test]
    fn removes_dead_states() {
        let def = Definition::from_dot(
            "null -> a\na -> b [label=x]\na -> t [label=y]\nt -> t [label=\"x,y\"]\nb [shape=doublecircle]",
        )
        .unwrap();
        let min = Dfa::from_definition(&def).unwrap().canonicalize();
        assert_eq!(min.size(), 2);
        assert!(min.accepts(&word("x")));
        assert!(!min.accepts(&word("yx")));
    }

    #[test]
    fn empty_language() {
        let def = Definition::from_dot("null -> a\na -> b [label=x]").unwrap();
        let min = Dfa::from_definition(&def).unwrap().canonicalize();
        assert_eq!(min.size(), 1);
        assert_eq!(min.initial_state().map(State::as_str), Some("a"));
        assert!(!min.accepts(&word("x")));
    }

    #[test]
    fn minimal_stays_minimal() {
        let dfa = Dfa::from_definition(&even_ones()).unwrap();
        let min = dfa.canonicalize();
        assert_eq!(min, dfa.canonicalize().canonicalize());
        assert_eq!(min.size(), 2);
    }
}
