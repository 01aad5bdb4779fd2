use fsa::prelude::*;

const PARITY: &str = r#"digraph finite_state_machine {
    rankdir=LR;
    node [shape = doublecircle]; q1;
    node [shape = circle]; q0;
    null [shape = point];
    null -> q0;
    q0 -> q0 [label = "0"];
    q0 -> q1 [label = "1"];
    q1 -> q1 [label = "0"];
    q1 -> q0 [label = "1"];
}"#;

fn parity_with_branch() -> String {
    PARITY
        .replace("; q0;", "; q0 q2;")
        .replace("}", "    q0 -> q2 [label = \"1\"];\n}")
}

fn flat(kind: Kind, states: &str, records: &[&str]) -> FlatDefinition {
    FlatDefinition {
        kind,
        alphabet: split_list("0,1"),
        states: split_list(states),
        initial: "q0".into(),
        final_states: split_list("q1"),
        records: records.iter().map(|r| r.to_string()).collect(),
    }
}

#[test_log::test]
fn deterministic_graph() {
    let def = Definition::from_dot(PARITY).unwrap();
    assert_eq!(def.kind(), Kind::Deterministic);
    assert_eq!(def.initial().as_str(), "q0");
    assert_eq!(
        def.final_states().iter().map(State::as_str).collect::<Vec<_>>(),
        vec!["q1"]
    );
    assert_eq!(def.transitions().len(), 4);
    for (p, a, q) in [("q0", "0", "q0"), ("q0", "1", "q1"), ("q1", "0", "q1"), ("q1", "1", "q0")] {
        assert_eq!(
            def.transitions().get(&(p, a).into()),
            Some(Targets::Single(&State::from(q)))
        );
    }
}

#[test_log::test]
fn branching_graph_is_nondeterministic() {
    let def = Definition::from_dot(&parity_with_branch()).unwrap();
    assert_eq!(def.kind(), Kind::Nondeterministic);
    assert_eq!(def.size(), 3);
    let targets = def
        .successors(&"q0".into(), &"1".into())
        .map(State::as_str)
        .collect::<Vec<_>>();
    assert_eq!(targets, vec!["q1", "q2"]);
    assert_eq!(def.successors(&"q1".into(), &"0".into()).count(), 1);
}

#[test_log::test]
fn flat_records_with_undeclared_state() {
    let err = flat(Kind::Deterministic, "q0,q1", &["q0,0,q2"])
        .build()
        .unwrap_err();
    assert!(matches!(
        err,
        DefinitionError::UnknownState { ref state, .. } if state.as_str() == "q2"
    ));
    assert!(err.to_string().contains("q2"));
}

#[test_log::test]
fn graph_without_start_edge() {
    let text = PARITY.replace("null -> q0;", "");
    assert_eq!(
        Definition::from_dot(&text),
        Err(DefinitionError::MissingInitialState)
    );
}

#[test_log::test]
fn front_ends_agree() {
    let from_records = flat(
        Kind::Deterministic,
        "q0,q1",
        &["q0,0,q0", "q0,1,q1", "q1,0,q1", "q1,1,q0"],
    )
    .build()
    .unwrap();
    let from_graph = Definition::from_dot(PARITY).unwrap();
    assert_eq!(from_records, from_graph);

    let from_json = codec::from_json(&codec::to_json(&from_graph).unwrap()).unwrap();
    assert_eq!(from_json, from_graph);

    let rewritten = Definition::from_dot(&from_graph.dot_representation()).unwrap();
    assert_eq!(rewritten, from_graph);
}

#[test_log::test]
fn record_order_does_not_matter() {
    let records = ["q0,0,q0", "q0,1,q0,q1", "q1,0,q1"];
    let forward = flat(Kind::Nondeterministic, "q0,q1", &records)
        .build()
        .unwrap();
    let mut reversed = records;
    reversed.reverse();
    let backward = flat(Kind::Nondeterministic, "q1,q0", &reversed)
        .build()
        .unwrap();
    assert_eq!(forward, backward);
}

#[cfg(feature = "engine")]
#[test_log::test]
fn determinize_reconstructed_graph() {
    let def = Definition::from_dot(&parity_with_branch()).unwrap();
    let nfa = def.instantiate().unwrap();
    let word = |w: &str| w.chars().map(|c| Symbol::new(c.to_string())).collect::<Vec<_>>();
    assert!(nfa.accepts(&word("1")));
    assert!(nfa.accepts(&word("10")));
    assert!(!nfa.accepts(&word("11")));
    assert!(!nfa.accepts(&word("0")));

    let dfa = nfa.to_deterministic();
    let back = dfa.to_definition().unwrap();
    assert!(back.is_deterministic());
    for w in ["", "1", "10", "11", "101", "0110"] {
        assert_eq!(dfa.accepts(&word(w)), nfa.accepts(&word(w)), "{w}");
    }

    let min = nfa.canonicalize();
    assert!(min.size() <= dfa.size());
    assert!(min.accepts(&word("10")));
    assert!(!min.accepts(&word("101")));
}
