use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, trace};

use crate::{
    assemble::Assembler,
    error::DefinitionError,
    math::{OrderedMap, OrderedSet},
    Definition, Kind, State, TransitionKey, Transitions,
};

/// The target(s) stored under one key of a persisted record.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TargetRecord {
    /// Deterministic transitions persist their target as a plain string.
    Single(String),
    /// Nondeterministic transitions persist a list of targets.
    Many(Vec<String>),
}

/// The flat, persisted shape of a [`Definition`]. Transition keys are composite
/// `state,symbol` strings.
///
/// ```json
/// {
///     "type": "dfa",
///     "alphabet": ["0", "1"],
///     "states": ["q0", "q1"],
///     "initial": "q0",
///     "final": ["q1"],
///     "transitions": { "q0,0": "q0", "q0,1": "q1", "q1,0": "q1", "q1,1": "q0" }
/// }
/// ```
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct DefinitionRecord {
    /// Deterministic or nondeterministic, persisted as `dfa`/`nfa`.
    #[serde(rename = "type", alias = "kind")]
    pub kind: Kind,
    /// All symbols.
    pub alphabet: Vec<String>,
    /// All states.
    pub states: Vec<String>,
    /// The initial state.
    pub initial: String,
    /// The accepting states.
    #[serde(rename = "final")]
    pub final_states: Vec<String>,
    /// Targets by composite key, in the order they appear in the document. Repeated keys are
    /// kept so that [`decode`] can reject them.
    #[serde(with = "entries")]
    pub transitions: Vec<(String, TargetRecord)>,
}

/// (De)serializes the transition entries as a JSON object without collapsing repeated keys.
mod entries {
    use std::fmt;

    use serde::{
        de::{MapAccess, Visitor},
        ser::SerializeMap,
        Deserializer, Serializer,
    };

    use super::TargetRecord;

    pub(super) fn serialize<S: Serializer>(
        entries: &[(String, TargetRecord)],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(entries.len()))?;
        for (key, target) in entries {
            map.serialize_entry(key, target)?;
        }
        map.end()
    }

    struct EntriesVisitor;

    impl<'de> Visitor<'de> for EntriesVisitor {
        type Value = Vec<(String, TargetRecord)>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            write!(f, "a map from `state,symbol` keys to target states")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
            let mut entries = Vec::with_capacity(access.size_hint().unwrap_or_default());
            while let Some(entry) = access.next_entry()? {
                entries.push(entry);
            }
            Ok(entries)
        }
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<(String, TargetRecord)>, D::Error> {
        deserializer.deserialize_map(EntriesVisitor)
    }
}

/// Errors that can occur when reading or writing persisted definitions.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Reading or writing the file failed.
    #[error("could not access definition file: {0}")]
    Io(#[from] std::io::Error),
    /// The contents are not valid JSON or do not have the expected layout.
    #[error("invalid definition JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// The record was read but does not describe a valid definition.
    #[error(transparent)]
    Definition(#[from] DefinitionError),
}

/// Produces the persisted record of `definition`. All lists are sorted.
pub fn encode(definition: &Definition) -> DefinitionRecord {
    let transitions = match definition.transitions() {
        Transitions::Deterministic(table) => table
            .iter()
            .map(|(key, q)| (key.to_string(), TargetRecord::Single(q.to_string())))
            .collect(),
        Transitions::Nondeterministic(relation) => relation
            .iter()
            .map(|(key, qs)| {
                (
                    key.to_string(),
                    TargetRecord::Many(qs.iter().map(State::to_string).collect()),
                )
            })
            .collect(),
    };

    DefinitionRecord {
        kind: definition.kind(),
        alphabet: definition.alphabet().iter().map(|a| a.to_string()).collect(),
        states: definition.states().iter().map(|q| q.to_string()).collect(),
        initial: definition.initial().to_string(),
        final_states: definition
            .final_states()
            .iter()
            .map(|q| q.to_string())
            .collect(),
        transitions,
    }
}

/// Reconstructs the [`Definition`] described by `record`. Keys are split at their first
/// separator (see [`TransitionKey`]) and may appear only once, a deterministic record has to
/// map every key to a single state and a nondeterministic record to a non-empty list of
/// states. Everything else is checked by the [`Assembler`] against the declared alphabet and
/// states.
pub fn decode(record: DefinitionRecord) -> Result<Definition, DefinitionError> {
    let DefinitionRecord {
        kind,
        alphabet,
        states,
        initial,
        final_states,
        transitions,
    } = record;

    let shape_error = |key: &str, reason: &str| DefinitionError::MalformedRecord {
        record: format!("transition `{key}`"),
        reason: reason.to_string(),
    };
    let duplicate = |key: TransitionKey, raw: &str| {
        let (state, symbol) = key.into_parts();
        DefinitionError::DuplicateTransition {
            state,
            symbol,
            context: format!("transition `{raw}`"),
        }
    };

    let transitions = match kind {
        Kind::Deterministic => {
            let mut table = OrderedMap::new();
            for (raw, target) in transitions {
                let key: TransitionKey = raw.parse()?;
                if table.contains_key(&key) {
                    return Err(duplicate(key, &raw));
                }
                match target {
                    TargetRecord::Single(q) => {
                        table.insert(key, State::from(q));
                    }
                    TargetRecord::Many(_) => {
                        return Err(shape_error(
                            &raw,
                            "deterministic transitions must have a single target state",
                        ))
                    }
                }
            }
            Transitions::Deterministic(table)
        }
        Kind::Nondeterministic => {
            let mut relation = OrderedMap::new();
            for (raw, target) in transitions {
                let key: TransitionKey = raw.parse()?;
                if relation.contains_key(&key) {
                    return Err(duplicate(key, &raw));
                }
                match target {
                    TargetRecord::Many(qs) if !qs.is_empty() => {
                        let targets = qs.into_iter().map(State::from).collect::<OrderedSet<_>>();
                        relation.insert(key, targets);
                    }
                    TargetRecord::Many(_) => {
                        return Err(shape_error(
                            &raw,
                            "nondeterministic transitions must list at least one target state",
                        ))
                    }
                    TargetRecord::Single(_) => {
                        return Err(shape_error(
                            &raw,
                            "nondeterministic transitions must list their target states",
                        ))
                    }
                }
            }
            Transitions::Nondeterministic(relation)
        }
    };
    trace!("decoded {} transition entries", transitions.len());

    Assembler::new(transitions)
        .with_alphabet(alphabet)
        .with_states(states)
        .with_initial(initial)
        .with_final_states(final_states)
        .assemble()
}

/// Serializes `definition` into pretty printed JSON.
pub fn to_json(definition: &Definition) -> Result<String, CodecError> {
    Ok(serde_json::to_string_pretty(&encode(definition))?)
}

/// Parses and decodes JSON produced by [`to_json`].
pub fn from_json(json: &str) -> Result<Definition, CodecError> {
    let record: DefinitionRecord = serde_json::from_str(json)?;
    Ok(decode(record)?)
}

/// Writes `definition` as JSON to the file at `path`.
pub fn save<P: AsRef<Path>>(definition: &Definition, path: P) -> Result<(), CodecError> {
    let path = path.as_ref();
    std::fs::write(path, to_json(definition)?)?;
    debug!("saved {} to {}", definition.kind(), path.display());
    Ok(())
}

/// Reads a definition from the JSON file at `path`.
pub fn load<P: AsRef<Path>>(path: P) -> Result<Definition, CodecError> {
    let path = path.as_ref();
    let definition = from_json(&std::fs::read_to_string(path)?)?;
    debug!("loaded {} from {}", definition.kind(), path.display());
    Ok(definition)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{split_list, FlatDefinition};

    fn second_to_last_one() -> Definition {
        FlatDefinition {
            kind: Kind::Nondeterministic,
            alphabet: split_list("0,1"),
            states: split_list("a,b,c"),
            initial: "a".into(),
            final_states: split_list("c"),
            records: ["a,0,a", "a,1,a,b", "b,0,c", "b,1,c"]
                .map(String::from)
                .to_vec(),
        }
        .build()
        .unwrap()
    }

    #[test_log::test]
    fn encode_layout() {
        let json = to_json(&second_to_last_one()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["type"], "nfa");
        assert_eq!(value["final"], serde_json::json!(["c"]));
        assert_eq!(value["transitions"]["a,1"], serde_json::json!(["a", "b"]));
    }

    #[test_log::test]
    fn decode_plain_layout() {
        let json = r#"{
            "type": "dfa",
            "alphabet": ["0", "1"],
            "states": ["q0", "q1"],
            "initial": "q0",
            "final": ["q1"],
            "transitions": { "q0,0": "q0", "q0,1": "q1", "q1,0": "q1", "q1,1": "q0" }
        }"#;
        let def = from_json(json).unwrap();
        assert_eq!(def.kind(), Kind::Deterministic);
        assert_eq!(def.transitions().len(), 4);
        assert_eq!(
            def.successors(&"q1".into(), &"1".into()).next(),
            Some(&State::from("q0"))
        );
    }

    #[test_log::test]
    fn roundtrip() {
        let def = second_to_last_one();
        assert_eq!(decode(encode(&def)).unwrap(), def);
    }

    #[test]
    fn decode_rejects_bad_records() {
        let mut record = encode(&second_to_last_one());
        record
            .transitions
            .push(("c0".to_string(), TargetRecord::Many(vec!["a".into()])));
        assert_eq!(
            decode(record).unwrap_err(),
            DefinitionError::MalformedKey("c0".to_string())
        );

        let mut record = encode(&second_to_last_one());
        record
            .transitions
            .push(("c,0".to_string(), TargetRecord::Single("a".into())));
        assert!(matches!(
            decode(record),
            Err(DefinitionError::MalformedRecord { .. })
        ));

        let mut record = encode(&second_to_last_one());
        record
            .transitions
            .push(("c,0".to_string(), TargetRecord::Many(vec!["z".into()])));
        assert!(matches!(
            decode(record),
            Err(DefinitionError::UnknownState { ref state, .. }) if state.as_str() == "z"
        ));
    }

    #[test_log::test]
    fn repeated_keys_are_rejected() {
        let json = r#"{
            "type": "dfa",
            "alphabet": ["0"],
            "states": ["q0", "q1"],
            "initial": "q0",
            "final": [],
            "transitions": { "q0,0": "q0", "q0,0": "q1" }
        }"#;
        assert!(matches!(
            from_json(json),
            Err(CodecError::Definition(DefinitionError::DuplicateTransition {
                ref state,
                ref symbol,
                ..
            })) if state.as_str() == "q0" && symbol.as_str() == "0"
        ));

        let json = json
            .replace("\"dfa\"", "\"nfa\"")
            .replace("\"q0\", \"q0,0\": \"q1\"", "[\"q0\"], \"q0,0\": [\"q1\"]");
        assert!(matches!(
            from_json(&json),
            Err(CodecError::Definition(DefinitionError::DuplicateTransition { .. }))
        ));
    }

    #[test]
    fn json_errors() {
        assert!(matches!(from_json("{"), Err(CodecError::Json(_))));
        assert!(matches!(
            load("/this/path/does/not/exist.json"),
            Err(CodecError::Io(_))
        ));
    }

    #[test_log::test]
    fn save_and_load() {
        let def = second_to_last_one();
        let file = tempfile::NamedTempFile::new().unwrap();
        save(&def, file.path()).unwrap();
        assert_eq!(load(file.path()).unwrap(), def);
    }
}
