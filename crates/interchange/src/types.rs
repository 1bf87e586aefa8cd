//! Typed structs representing the interchange JSON exchanged with the
//! verification oracle.
//!
//! Field names follow the oracle's camelCase wire format (`logType`,
//! `eventType`, `specialEventTypes`, `projToMachineStates`), so these
//! types round-trip through `serde_json` without any glue code.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

// ── Names ───────────────────────────────────────────────────────────

macro_rules! name_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(name: impl Into<String>) -> Self {
                Self(name.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&$name> for $name {
            fn from(s: &$name) -> Self {
                s.clone()
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

name_type!(
    /// The `type` discriminator of a machine event.
    EventType
);
name_type!(
    /// A state name in a machine, projection, or swarm protocol graph.
    StateName
);
name_type!(
    /// A command name.
    CommandName
);
name_type!(
    /// A role (protocol participant) name.
    Role
);
name_type!(
    /// Log-assigned unique event identifier. Doubles as the causal
    /// pointer value carried by branch-tracked events.
    EventId
);

// ── Labels ──────────────────────────────────────────────────────────

/// Label of a swarm protocol transition: which role runs which command,
/// and which event types it logs.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwarmLabel {
    pub cmd: CommandName,
    pub log_type: Vec<EventType>,
    pub role: Role,
}

impl fmt::Display for SwarmLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}<{}>", self.cmd, self.role, join_types(&self.log_type))
    }
}

/// Label of a machine (or projection) transition.
///
/// `Execute` edges are command self-loops; `Input` edges consume one event.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "tag")]
pub enum MachineLabel {
    #[serde(rename_all = "camelCase")]
    Execute {
        cmd: CommandName,
        log_type: Vec<EventType>,
    },
    #[serde(rename_all = "camelCase")]
    Input { event_type: EventType },
}

impl MachineLabel {
    pub fn execute(cmd: impl Into<CommandName>, log_type: Vec<EventType>) -> Self {
        MachineLabel::Execute {
            cmd: cmd.into(),
            log_type,
        }
    }

    pub fn input(event_type: impl Into<EventType>) -> Self {
        MachineLabel::Input {
            event_type: event_type.into(),
        }
    }

    pub fn is_execute(&self) -> bool {
        matches!(self, MachineLabel::Execute { .. })
    }
}

impl fmt::Display for MachineLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MachineLabel::Execute { cmd, log_type } => {
                write!(f, "{}/{}", cmd, join_types(log_type))
            }
            MachineLabel::Input { event_type } => write!(f, "{}?", event_type),
        }
    }
}

fn join_types(types: &[EventType]) -> String {
    types
        .iter()
        .map(EventType::as_str)
        .collect::<Vec<_>>()
        .join(",")
}

// ── Graphs ──────────────────────────────────────────────────────────

/// A labelled transition between two named states.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Transition<L> {
    pub source: StateName,
    pub target: StateName,
    pub label: L,
}

/// A protocol automaton: an initial state plus a transition list.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProtocolGraph<L> {
    pub initial: StateName,
    pub transitions: Vec<Transition<L>>,
}

impl<L> ProtocolGraph<L> {
    /// All state names mentioned by the graph, initial state included.
    pub fn states(&self) -> BTreeSet<&StateName> {
        let mut states = BTreeSet::new();
        states.insert(&self.initial);
        for t in &self.transitions {
            states.insert(&t.source);
            states.insert(&t.target);
        }
        states
    }
}

/// A global swarm protocol, as consumed by the verification oracle.
pub type SwarmProtocolType = ProtocolGraph<SwarmLabel>;

/// A role-local machine or projection automaton.
pub type MachineType = ProtocolGraph<MachineLabel>;

/// The protocols forming a composition, in the order the oracle indexes them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InterfacingProtocols(pub Vec<SwarmProtocolType>);

/// Flat transition graph exported from an in-memory machine definition.
///
/// This is the only view of a machine the verification oracle ever sees:
/// states, command self-loops, and input edges (threading through
/// synthetic chain states), plus the event types the machine reacts to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineGraph {
    pub initial: StateName,
    pub subscriptions: Vec<EventType>,
    pub transitions: Vec<Transition<MachineLabel>>,
}

impl MachineGraph {
    /// The graph without its subscription list.
    pub fn to_machine_type(&self) -> MachineType {
        MachineType {
            initial: self.initial.clone(),
            transitions: self.transitions.clone(),
        }
    }
}

// ── Subscriptions and projections ───────────────────────────────────

/// Role -> set of event types that role must receive.
pub type Subscriptions = BTreeMap<Role, BTreeSet<EventType>>;

/// Special (branching or joining) event type -> event types whose causal
/// pointer it resets.
pub type BranchMap = BTreeMap<EventType, Vec<EventType>>;

/// Event types that branch or join causal paths.
pub type SpecialEventTypes = BTreeSet<EventType>;

/// Projection state -> original machine states it corresponds to.
pub type ProjToMachineStates = BTreeMap<StateName, Vec<StateName>>;

/// Projection of a (composed) protocol onto one role, with the metadata
/// needed to adapt an existing machine to it and to branch-track it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionInfo {
    pub projection: MachineType,
    pub branches: BranchMap,
    pub special_event_types: SpecialEventTypes,
    pub proj_to_machine_states: ProjToMachineStates,
}

impl ProjectionInfo {
    /// The original machine state a projection state corresponds to.
    ///
    /// By convention the first listed original state is used.
    pub fn original_state(&self, projection_state: &StateName) -> Option<&StateName> {
        self.proj_to_machine_states
            .get(projection_state)
            .and_then(|states| states.first())
    }
}

// ── Oracle verdicts ─────────────────────────────────────────────────

/// Data-carrying verdict from the verification oracle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum OracleResult<T> {
    #[serde(rename = "OK")]
    Ok { data: T },
    #[serde(rename = "ERROR")]
    Error { errors: Vec<String> },
}

impl<T> OracleResult<T> {
    pub fn into_result(self) -> Result<T, Vec<String>> {
        match self {
            OracleResult::Ok { data } => Ok(data),
            OracleResult::Error { errors } => Err(errors),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_machine_label_wire_format() {
        let exec = MachineLabel::execute("close", vec![EventType::from("closingTime")]);
        assert_eq!(
            serde_json::to_value(&exec).unwrap(),
            json!({"tag": "Execute", "cmd": "close", "logType": ["closingTime"]})
        );

        let input: MachineLabel =
            serde_json::from_value(json!({"tag": "Input", "eventType": "partReq"})).unwrap();
        assert_eq!(input, MachineLabel::input("partReq"));
        assert_eq!(input.to_string(), "partReq?");
        assert_eq!(exec.to_string(), "close/closingTime");
    }

    #[test]
    fn test_swarm_label_display() {
        let label = SwarmLabel {
            cmd: "request".into(),
            log_type: vec!["partReq".into()],
            role: "T".into(),
        };
        assert_eq!(label.to_string(), "request@T<partReq>");
    }

    #[test]
    fn test_graph_states_include_initial() {
        let graph = MachineType {
            initial: "lonely".into(),
            transitions: vec![],
        };
        let states: Vec<&str> = graph.states().into_iter().map(|s| s.as_str()).collect();
        assert_eq!(states, vec!["lonely"]);
    }

    #[test]
    fn test_original_state_takes_first_entry() {
        let info = ProjectionInfo {
            projection: MachineType {
                initial: "0".into(),
                transitions: vec![],
            },
            branches: BranchMap::new(),
            special_event_types: SpecialEventTypes::new(),
            proj_to_machine_states: BTreeMap::from([(
                StateName::from("0"),
                vec![StateName::from("s0"), StateName::from("s2")],
            )]),
        };
        assert_eq!(info.original_state(&"0".into()).unwrap(), "s0");
        assert!(info.original_state(&"1".into()).is_none());
    }

    #[test]
    fn test_oracle_result_wire_format() {
        let ok: OracleResult<Vec<String>> =
            serde_json::from_value(json!({"type": "OK", "data": ["a"]})).unwrap();
        assert_eq!(ok.into_result().unwrap(), vec!["a".to_string()]);

        let err: OracleResult<Vec<String>> =
            serde_json::from_value(json!({"type": "ERROR", "errors": ["bad", "worse"]})).unwrap();
        assert_eq!(err.into_result().unwrap_err().len(), 2);
    }
}
