//! Business logic attached to reactions and commands.
//!
//! Both traits have blanket impls for closures, so handlers are usually
//! written inline at the builder call.

use serde_json::Value;
use swarm_interchange::{EventEnvelope, MachineEvent};
use thiserror::Error;

/// A reaction handler refused or failed to compute the next payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ReactionError(pub String);

impl ReactionError {
    pub fn new(message: impl Into<String>) -> Self {
        ReactionError(message.into())
    }
}

/// A command generator could not produce its events.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct GenerateError(pub String);

impl GenerateError {
    pub fn new(message: impl Into<String>) -> Self {
        GenerateError(message.into())
    }
}

/// Computes the payload of the target state from the current payload and
/// the events that completed the reaction's trigger chain, in order.
pub trait ReactionHandler<P>: Send + Sync {
    fn react(&self, state: &P, events: &[EventEnvelope]) -> Result<P, ReactionError>;
}

impl<P, F> ReactionHandler<P> for F
where
    F: Fn(&P, &[EventEnvelope]) -> Result<P, ReactionError> + Send + Sync,
{
    fn react(&self, state: &P, events: &[EventEnvelope]) -> Result<P, ReactionError> {
        self(state, events)
    }
}

/// Produces the events a command emits, from the current payload and the
/// command's arguments.
pub trait CommandGenerator<P>: Send + Sync {
    fn generate(&self, state: &P, args: &Value) -> Result<Vec<MachineEvent>, GenerateError>;
}

impl<P, F> CommandGenerator<P> for F
where
    F: Fn(&P, &Value) -> Result<Vec<MachineEvent>, GenerateError> + Send + Sync,
{
    fn generate(&self, state: &P, args: &Value) -> Result<Vec<MachineEvent>, GenerateError> {
        self(state, args)
    }
}

/// Handler that moves the current payload unchanged into the target state.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThrough;

impl<P: Clone> ReactionHandler<P> for PassThrough {
    fn react(&self, state: &P, _events: &[EventEnvelope]) -> Result<P, ReactionError> {
        Ok(state.clone())
    }
}
