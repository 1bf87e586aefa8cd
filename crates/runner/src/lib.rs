//! swarm-runner: executes one participant's machine against an event log.
//!
//! [`RunnerInternals`] is the synchronous state: event intake, reaction
//! chains, the command lock and optional branch tracking. [`MachineRunner`]
//! drives it from an [`EventLog`](swarm_log::EventLog) subscription and
//! publishes command events.

mod config;
mod error;
mod internals;
mod runner;
mod telemetry;
mod tracker;

pub use config::{ConfigError, RunnerConfig};
pub use error::{CommandError, RunnerError};
pub use internals::{
    CommandLock, Position, PushOutcome, ReactionFailure, RunnerInternals, StateSnapshot,
};
pub use runner::MachineRunner;
pub use telemetry::init_tracing;
pub use tracker::BranchTracker;
