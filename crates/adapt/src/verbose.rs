//! Logging wrappers installed by verbose adaptation.
//!
//! They delegate to the wrapped handler or generator and report what
//! happened through `tracing`; results are passed through unchanged.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use swarm_core::{
    CommandGenerator, EventEnvelope, GenerateError, MachineEvent, ReactionError, ReactionHandler,
};
use swarm_interchange::{CommandName, StateName};

pub(crate) struct LoggedReaction<P> {
    pub inner: Arc<dyn ReactionHandler<P>>,
    pub machine: String,
    pub target: StateName,
    /// Commands enabled in `target`.
    pub commands: Vec<CommandName>,
}

impl<P: fmt::Debug> ReactionHandler<P> for LoggedReaction<P> {
    fn react(&self, state: &P, events: &[EventEnvelope]) -> Result<P, ReactionError> {
        let result = self.inner.react(state, events);
        let trigger = events.last().map(|e| e.event_type().as_str()).unwrap_or("");
        let event_id = events.last().map(|e| e.event_id().as_str()).unwrap_or("");
        match &result {
            Ok(payload) => tracing::info!(
                machine = %self.machine,
                trigger,
                event_id,
                state = %self.target,
                payload = ?payload,
                commands = ?self.commands,
                "reacted"
            ),
            Err(error) => tracing::info!(
                machine = %self.machine,
                trigger,
                event_id,
                %error,
                "reaction failed"
            ),
        }
        result
    }
}

pub(crate) struct LoggedCommand<P> {
    pub inner: Arc<dyn CommandGenerator<P>>,
    pub machine: String,
    pub command: CommandName,
}

impl<P> CommandGenerator<P> for LoggedCommand<P> {
    fn generate(&self, state: &P, args: &Value) -> Result<Vec<MachineEvent>, GenerateError> {
        let result = self.inner.generate(state, args);
        if let Ok(events) = &result {
            let emitted: Vec<&str> = events.iter().map(|e| e.event_type.as_str()).collect();
            tracing::info!(
                machine = %self.machine,
                command = %self.command,
                events = ?emitted,
                "command emitted"
            );
        }
        result
    }
}
