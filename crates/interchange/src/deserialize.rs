//! Deserialization of oracle interchange JSON into typed structs.
//!
//! Each entry point takes a `&serde_json::Value` and checks the top-level
//! shape before handing the document to serde, so that a missing field is
//! reported by name rather than as a generic serde message.

use crate::types::*;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;

/// Errors during interchange JSON deserialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterchangeError {
    /// The document is missing a required top-level field.
    MissingField { context: String, field: String },
    /// The document is structurally present but malformed.
    Json { context: String, message: String },
    /// A transition label is neither `Execute` nor `Input`.
    InvalidLabel { index: usize, message: String },
    /// A state name contains the reserved synthetic-state delimiter.
    ReservedStateName { name: String },
}

impl fmt::Display for InterchangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InterchangeError::MissingField { context, field } => {
                write!(f, "{} missing required field: '{}'", context, field)
            }
            InterchangeError::Json { context, message } => {
                write!(f, "invalid {}: {}", context, message)
            }
            InterchangeError::InvalidLabel { index, message } => {
                write!(f, "transition {}: invalid label: {}", index, message)
            }
            InterchangeError::ReservedStateName { name } => {
                write!(f, "state name '{}' contains the reserved character '§'", name)
            }
        }
    }
}

impl std::error::Error for InterchangeError {}

/// Parse a machine graph (`{initial, subscriptions, transitions}`).
pub fn machine_graph_from_json(doc: &Value) -> Result<MachineGraph, InterchangeError> {
    const CONTEXT: &str = "machine graph";
    require(doc, CONTEXT, &["initial", "transitions"])?;
    check_labels(doc)?;
    let mut doc = doc.clone();
    if let Some(obj) = doc.as_object_mut() {
        obj.entry("subscriptions")
            .or_insert_with(|| Value::Array(vec![]));
    }
    parse(&doc, CONTEXT)
}

/// Parse a projection document as emitted by the oracle.
///
/// `branches`, `specialEventTypes` and `projToMachineStates` default to
/// empty when absent; `projection` is required. Projection state names may
/// not contain the synthetic-state delimiter.
pub fn projection_info_from_json(doc: &Value) -> Result<ProjectionInfo, InterchangeError> {
    const CONTEXT: &str = "projection info";
    require(doc, CONTEXT, &["projection"])?;
    let projection = doc.get("projection").unwrap_or(&Value::Null);
    require(projection, "projection", &["initial", "transitions"])?;
    check_labels(projection)?;

    let mut doc = doc.clone();
    if let Some(obj) = doc.as_object_mut() {
        for field in ["branches", "projToMachineStates"] {
            obj.entry(field)
                .or_insert_with(|| Value::Object(Default::default()));
        }
        obj.entry("specialEventTypes")
            .or_insert_with(|| Value::Array(vec![]));
    }
    let info: ProjectionInfo = parse(&doc, CONTEXT)?;

    if let Some(name) = info
        .projection
        .states()
        .into_iter()
        .find(|s| s.as_str().contains('§'))
    {
        return Err(InterchangeError::ReservedStateName {
            name: name.to_string(),
        });
    }
    Ok(info)
}

/// Parse a role -> event types subscription map.
pub fn subscriptions_from_json(doc: &Value) -> Result<Subscriptions, InterchangeError> {
    if !doc.is_object() {
        return Err(InterchangeError::Json {
            context: "subscriptions".to_string(),
            message: "expected an object keyed by role".to_string(),
        });
    }
    parse(doc, "subscriptions")
}

/// Parse an oracle verdict envelope carrying data of type `T`.
pub fn oracle_result_from_json<T: DeserializeOwned>(
    doc: &Value,
) -> Result<OracleResult<T>, InterchangeError> {
    const CONTEXT: &str = "oracle result";
    require(doc, CONTEXT, &["type"])?;
    match doc.get("type").and_then(|t| t.as_str()) {
        Some("OK") => require(doc, CONTEXT, &["data"])?,
        Some("ERROR") => require(doc, CONTEXT, &["errors"])?,
        Some(other) => {
            return Err(InterchangeError::Json {
                context: CONTEXT.to_string(),
                message: format!("unknown verdict type '{}'", other),
            })
        }
        None => {
            return Err(InterchangeError::Json {
                context: CONTEXT.to_string(),
                message: "'type' must be a string".to_string(),
            })
        }
    }
    parse(doc, CONTEXT)
}

// ── Parsing helpers ─────────────────────────────────────────────────

fn require(doc: &Value, context: &str, fields: &[&str]) -> Result<(), InterchangeError> {
    let obj = doc.as_object().ok_or_else(|| InterchangeError::Json {
        context: context.to_string(),
        message: "expected a JSON object".to_string(),
    })?;
    for field in fields {
        if !obj.contains_key(*field) {
            return Err(InterchangeError::MissingField {
                context: context.to_string(),
                field: field.to_string(),
            });
        }
    }
    Ok(())
}

fn check_labels(graph: &Value) -> Result<(), InterchangeError> {
    let Some(transitions) = graph.get("transitions").and_then(|t| t.as_array()) else {
        return Ok(());
    };
    for (index, t) in transitions.iter().enumerate() {
        let label = t.get("label").ok_or_else(|| InterchangeError::InvalidLabel {
            index,
            message: "missing 'label'".to_string(),
        })?;
        match label.get("tag").and_then(|tag| tag.as_str()) {
            Some("Execute") | Some("Input") => {}
            Some(other) => {
                return Err(InterchangeError::InvalidLabel {
                    index,
                    message: format!("unknown tag '{}'", other),
                })
            }
            None => {
                return Err(InterchangeError::InvalidLabel {
                    index,
                    message: "missing 'tag'".to_string(),
                })
            }
        }
    }
    Ok(())
}

fn parse<T: DeserializeOwned>(doc: &Value, context: &str) -> Result<T, InterchangeError> {
    T::deserialize(doc).map_err(|e| InterchangeError::Json {
        context: context.to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn door_projection() -> Value {
        json!({
            "projection": {
                "initial": "(0||0)",
                "transitions": [
                    {"source": "(0||0)", "target": "(0||0)",
                     "label": {"tag": "Execute", "cmd": "close", "logType": ["closingTime"]}},
                    {"source": "(0||0)", "target": "(1||1)",
                     "label": {"tag": "Input", "eventType": "partReq"}}
                ]
            },
            "branches": {"partReq": ["partOK"]},
            "specialEventTypes": ["partReq", "closingTime"],
            "projToMachineStates": {"(0||0)": ["s0"], "(1||1)": ["s1"]}
        })
    }

    #[test]
    fn test_projection_info_parses() {
        let info = projection_info_from_json(&door_projection()).unwrap();
        assert_eq!(info.projection.initial, "(0||0)");
        assert_eq!(info.projection.transitions.len(), 2);
        assert_eq!(info.branches[&EventType::from("partReq")].len(), 1);
        assert!(info.special_event_types.contains("closingTime"));
        assert_eq!(info.original_state(&"(1||1)".into()).unwrap(), "s1");
    }

    #[test]
    fn test_projection_info_defaults_optional_maps() {
        let info = projection_info_from_json(&json!({
            "projection": {"initial": "a", "transitions": []}
        }))
        .unwrap();
        assert!(info.branches.is_empty());
        assert!(info.special_event_types.is_empty());
        assert!(info.proj_to_machine_states.is_empty());
    }

    #[test]
    fn test_projection_missing_field() {
        let err = projection_info_from_json(&json!({"branches": {}})).unwrap_err();
        match err {
            InterchangeError::MissingField { field, .. } => assert_eq!(field, "projection"),
            other => panic!("expected MissingField, got {:?}", other),
        }

        let err = projection_info_from_json(&json!({"projection": {"initial": "a"}})).unwrap_err();
        match err {
            InterchangeError::MissingField { field, .. } => assert_eq!(field, "transitions"),
            other => panic!("expected MissingField, got {:?}", other),
        }
    }

    #[test]
    fn test_projection_rejects_reserved_state_names() {
        let doc = json!({
            "projection": {
                "initial": "§s0§a",
                "transitions": []
            }
        });
        match projection_info_from_json(&doc).unwrap_err() {
            InterchangeError::ReservedStateName { name } => assert_eq!(name, "§s0§a"),
            other => panic!("expected ReservedStateName, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_label_tag() {
        let doc = json!({
            "initial": "s0",
            "transitions": [
                {"source": "s0", "target": "s1", "label": {"tag": "Output", "eventType": "a"}}
            ]
        });
        match machine_graph_from_json(&doc).unwrap_err() {
            InterchangeError::InvalidLabel { index, message } => {
                assert_eq!(index, 0);
                assert!(message.contains("Output"));
            }
            other => panic!("expected InvalidLabel, got {:?}", other),
        }
    }

    #[test]
    fn test_machine_graph_without_subscriptions() {
        let graph = machine_graph_from_json(&json!({
            "initial": "s0",
            "transitions": [
                {"source": "s0", "target": "s1", "label": {"tag": "Input", "eventType": "a"}}
            ]
        }))
        .unwrap();
        assert!(graph.subscriptions.is_empty());
        assert_eq!(graph.transitions[0].label, MachineLabel::input("a"));
    }

    #[test]
    fn test_subscriptions_parse() {
        let subs = subscriptions_from_json(&json!({
            "T": ["partReq", "partOK"],
            "D": ["closingTime"]
        }))
        .unwrap();
        assert_eq!(subs[&Role::from("T")].len(), 2);
        assert!(subscriptions_from_json(&json!(["T"])).is_err());
    }

    #[test]
    fn test_oracle_result_envelope() {
        let ok: OracleResult<Subscriptions> =
            oracle_result_from_json(&json!({"type": "OK", "data": {"D": ["car"]}})).unwrap();
        assert!(matches!(ok, OracleResult::Ok { .. }));

        let err: OracleResult<Subscriptions> = oracle_result_from_json(&json!({
            "type": "ERROR",
            "errors": ["guard event type car appears in transitions from multiple states"]
        }))
        .unwrap();
        assert_eq!(err.into_result().unwrap_err().len(), 1);

        let bad = oracle_result_from_json::<Subscriptions>(&json!({"type": "MAYBE"}));
        match bad.unwrap_err() {
            InterchangeError::Json { message, .. } => assert!(message.contains("MAYBE")),
            other => panic!("expected Json, got {:?}", other),
        }

        let missing = oracle_result_from_json::<Subscriptions>(&json!({"type": "OK"}));
        assert!(matches!(
            missing.unwrap_err(),
            InterchangeError::MissingField { .. }
        ));
    }
}
