//! swarm-core: the event, state and reaction model of a swarm protocol
//! machine.
//!
//! A machine is authored with [`MachineBuilder`] and frozen into an
//! immutable [`MachineProtocol`]. States are [`StateId`] handles into the
//! protocol's state table; reactions are keyed per state by their first
//! trigger event type; business logic lives behind the
//! [`ReactionHandler`] and [`CommandGenerator`] traits.
//!
//! # Public API
//!
//! - [`MachineBuilder`] -- define states, commands and reactions
//! - [`MachineProtocol`] -- the validated, shareable definition
//! - [`EventDef`] -- event type with optional payload schema
//! - [`DefinitionError`] / [`DefinitionErrors`] -- build-time problems

pub mod builder;
pub mod error;
pub mod event;
pub mod handler;
pub mod protocol;
pub mod reaction;
pub mod state;

// ── Convenience re-exports ───────────────────────────────────────────

pub use builder::MachineBuilder;
pub use error::{DefinitionError, DefinitionErrors, SYNTHETIC_DELIMITER};
pub use event::{EventDef, PayloadSchema};
pub use handler::{
    CommandGenerator, GenerateError, PassThrough, ReactionError, ReactionHandler,
};
pub use protocol::MachineProtocol;
pub use reaction::{CommandDef, Reaction, ReactionMap};
pub use state::{ProtocolId, StateDef, StateId};

pub use swarm_interchange::{EventEnvelope, EventMeta, MachineEvent};
