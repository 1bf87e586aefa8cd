//! swarm-interchange: Shared wire and interchange JSON types.
//!
//! Provides the vocabulary every other crate in the workspace speaks:
//! interned-by-value name types (event types, states, commands, roles,
//! event ids), machine and swarm protocol graphs, the projection
//! information returned by the verification oracle, and the event
//! envelope delivered by the event log.
//!
//! Each consumer depends on this crate for the JSON shapes, then
//! converts them to its own domain representation (the runtime's
//! `StateId`-indexed protocols, the analyzer's summaries, and so on).

pub mod deserialize;
pub mod event;
pub mod types;

pub use deserialize::{
    machine_graph_from_json, oracle_result_from_json, projection_info_from_json,
    subscriptions_from_json, InterchangeError,
};
pub use event::{EventEnvelope, EventMeta, MachineEvent, CAUSAL_POINTER_FIELD};
pub use types::*;
