//! Integration tests for the analysis export and graph summary.

use serde_json::{json, Value};
use swarm_analyze::{export_machine, summarize};
use swarm_core::{EventDef, EventEnvelope, MachineBuilder, MachineEvent, ReactionError};
use swarm_interchange::MachineLabel;

fn keep(state: &Value, _events: &[EventEnvelope]) -> Result<Value, ReactionError> {
    Ok(state.clone())
}

/// The door machine of the warehouse protocol.
fn door() -> (swarm_core::MachineProtocol<Value>, swarm_core::StateId) {
    let mut b = MachineBuilder::<Value>::new(
        "warehouse",
        "D",
        ["partReq", "partOK", "closingTime"].map(EventDef::without_payload),
    );
    let s0 = b.state("s0");
    let s1 = b.state("s1");
    let s2 = b.state("s2");
    b.command(s0, "close", ["closingTime"], |_, _| {
        Ok(vec![MachineEvent::new("closingTime")])
    })
    .react(s0, ["partReq"], s1, keep)
    .react(s1, ["partOK"], s0, keep)
    .react(s0, ["closingTime"], s2, keep);
    (b.build().unwrap(), s0)
}

// ──────────────────────────────────────────────
// Export
// ──────────────────────────────────────────────

#[test]
fn test_export_commands_first_then_reactions() {
    let (door, s0) = door();
    let graph = export_machine(&door, s0).unwrap();

    assert_eq!(graph.initial, "s0");
    assert!(graph.transitions[0].label.is_execute());
    assert!(graph.transitions[1..].iter().all(|t| !t.label.is_execute()));
    assert_eq!(
        serde_json::to_value(&graph.transitions).unwrap(),
        json!([
            {"source": "s0", "target": "s0",
             "label": {"tag": "Execute", "cmd": "close", "logType": ["closingTime"]}},
            {"source": "s0", "target": "s1",
             "label": {"tag": "Input", "eventType": "partReq"}},
            {"source": "s0", "target": "s2",
             "label": {"tag": "Input", "eventType": "closingTime"}},
            {"source": "s1", "target": "s0",
             "label": {"tag": "Input", "eventType": "partOK"}}
        ])
    );
}

#[test]
fn test_subscriptions_are_deduplicated_in_first_seen_order() {
    let mut b = MachineBuilder::<Value>::new(
        "p",
        "R",
        ["x", "y", "z"].map(EventDef::without_payload),
    );
    let a = b.state("A");
    let c = b.state("C");
    b.react(a, ["y", "x"], c, keep)
        .react(c, ["x"], a, keep)
        .react(c, ["z", "y"], a, keep);
    let p = b.build().unwrap();

    let graph = export_machine(&p, a).unwrap();
    let subs: Vec<&str> = graph.subscriptions.iter().map(|s| s.as_str()).collect();
    assert_eq!(subs, vec!["y", "x", "z"]);
    assert_eq!(
        graph
            .transitions
            .iter()
            .filter(|t| matches!(t.label, MachineLabel::Input { .. }))
            .count(),
        5
    );
}

#[test]
fn test_export_is_deterministic() {
    let (door, s0) = door();
    let first = serde_json::to_string(&export_machine(&door, s0).unwrap()).unwrap();
    let second = serde_json::to_string(&export_machine(&door, s0).unwrap()).unwrap();
    assert_eq!(first, second);
}

// ──────────────────────────────────────────────
// Summary
// ──────────────────────────────────────────────

#[test]
fn test_summary_of_exported_door() {
    let (door, s0) = door();
    let summary = summarize(&export_machine(&door, s0).unwrap());

    assert_eq!(summary.initial_state, "s0");
    assert_eq!(summary.state_count(), 3);
    assert_eq!(summary.command_edges, 1);
    assert_eq!(summary.input_edges, 3);
    assert!(!summary.has_dead_states());
    assert!(summary.synthetic_states.is_empty());
}

#[test]
fn test_summary_serializes() {
    let (door, _) = door();
    let s1 = door.state_by_name("s1").unwrap();
    let summary = summarize(&export_machine(&door, s1).unwrap());
    let json = serde_json::to_value(&summary).unwrap();
    assert_eq!(json["initial_state"], json!("s1"));
    assert_eq!(json["reachable_states"], json!(["s0", "s1", "s2"]));
}
