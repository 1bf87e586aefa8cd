//! Analysis export: the flat transition graph of a machine.
//!
//! Commands become `Execute` self-loops on their owning state. A reaction
//! with trigger chain `e1, .., ek` from `A` to `B` becomes `k` `Input`
//! edges threading through synthetic states:
//!
//! ```text
//! A --e1--> §A§e1 --e2--> §A§e1§e2 ... --ek--> B
//! ```
//!
//! Commands come first (definition order), then reaction edges (grouped
//! by owning state, definition order).

use std::collections::BTreeSet;
use std::fmt;
use swarm_core::{MachineProtocol, StateId, SYNTHETIC_DELIMITER};
use swarm_interchange::{EventType, MachineGraph, MachineLabel, StateName, Transition};

/// Errors during analysis export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    /// The initial state was not created by the exported protocol.
    UnknownInitial { initial: String, machine: String },
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisError::UnknownInitial { initial, machine } => write!(
                f,
                "initial state {} not found in machine '{}'",
                initial, machine
            ),
        }
    }
}

impl std::error::Error for AnalysisError {}

/// Name of the synthetic state reached from `owner` after consuming
/// `consumed`, e.g. `§S0§a§b`.
pub fn synthetic_state_name(owner: &StateName, consumed: &[EventType]) -> StateName {
    let mut name = String::new();
    name.push(SYNTHETIC_DELIMITER);
    name.push_str(owner.as_str());
    for event_type in consumed {
        name.push(SYNTHETIC_DELIMITER);
        name.push_str(event_type.as_str());
    }
    StateName::from(name)
}

/// Whether `name` denotes a synthetic chain state.
pub fn is_synthetic(name: &StateName) -> bool {
    name.as_str().starts_with(SYNTHETIC_DELIMITER)
}

/// Export `protocol` with `initial` as its initial state.
pub fn export_machine<P>(
    protocol: &MachineProtocol<P>,
    initial: StateId,
) -> Result<MachineGraph, AnalysisError> {
    let initial_name = protocol
        .state_name(initial)
        .ok_or_else(|| AnalysisError::UnknownInitial {
            initial: initial.to_string(),
            machine: protocol.machine_name().to_string(),
        })?
        .clone();

    let mut transitions = Vec::new();

    for command in protocol.commands() {
        // Owners are validated at build time.
        let Some(owner) = protocol.state_name(command.owner) else {
            continue;
        };
        transitions.push(Transition {
            source: owner.clone(),
            target: owner.clone(),
            label: MachineLabel::Execute {
                cmd: command.name.clone(),
                log_type: command.events.clone(),
            },
        });
    }

    let mut seen = BTreeSet::new();
    let mut subscriptions = Vec::new();

    for reaction in protocol.reactions().iter() {
        let (Some(owner), Some(target)) = (
            protocol.state_name(reaction.owner),
            protocol.state_name(reaction.target),
        ) else {
            continue;
        };

        let last = reaction.triggers.len() - 1;
        for (index, trigger) in reaction.triggers.iter().enumerate() {
            let source = if index == 0 {
                owner.clone()
            } else {
                synthetic_state_name(owner, &reaction.triggers[..index])
            };
            let next = if index == last {
                target.clone()
            } else {
                synthetic_state_name(owner, &reaction.triggers[..=index])
            };
            transitions.push(Transition {
                source,
                target: next,
                label: MachineLabel::Input {
                    event_type: trigger.clone(),
                },
            });

            if seen.insert(trigger.clone()) {
                subscriptions.push(trigger.clone());
            }
        }
    }

    Ok(MachineGraph {
        initial: initial_name,
        subscriptions,
        transitions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use swarm_core::{EventDef, EventEnvelope, MachineBuilder, ReactionError};

    fn keep(state: &Value, _events: &[EventEnvelope]) -> Result<Value, ReactionError> {
        Ok(state.clone())
    }

    #[test]
    fn test_synthetic_names() {
        let name = synthetic_state_name(&"S0".into(), &["a".into(), "b".into()]);
        assert_eq!(name, "§S0§a§b");
        assert!(is_synthetic(&name));
        assert!(!is_synthetic(&"S0".into()));
    }

    #[test]
    fn test_chain_threads_through_synthetic_states() {
        let mut b = MachineBuilder::<Value>::new(
            "proto",
            "R",
            ["a", "b", "c"].map(EventDef::without_payload),
        );
        let s0 = b.state("S0");
        let s1 = b.state("S1");
        b.react(s0, ["a", "b", "c"], s1, keep);
        let p = b.build().unwrap();

        let graph = export_machine(&p, s0).unwrap();
        let json = serde_json::to_value(&graph).unwrap();
        assert_eq!(
            json,
            json!({
                "initial": "S0",
                "subscriptions": ["a", "b", "c"],
                "transitions": [
                    {"source": "S0", "target": "§S0§a",
                     "label": {"tag": "Input", "eventType": "a"}},
                    {"source": "§S0§a", "target": "§S0§a§b",
                     "label": {"tag": "Input", "eventType": "b"}},
                    {"source": "§S0§a§b", "target": "S1",
                     "label": {"tag": "Input", "eventType": "c"}}
                ]
            })
        );
    }

    #[test]
    fn test_foreign_initial_is_rejected() {
        let mut other = MachineBuilder::<Value>::new("proto", "X", Vec::<EventDef>::new());
        let foreign = other.state("S0");
        let mut b = MachineBuilder::<Value>::new("proto", "R", Vec::<EventDef>::new());
        b.state("S0");
        let p = b.build().unwrap();

        match export_machine(&p, foreign).unwrap_err() {
            AnalysisError::UnknownInitial { machine, .. } => assert_eq!(machine, "R"),
        }
    }
}
