use crate::config::ConfigError;
use crate::internals::ReactionFailure;
use swarm_core::GenerateError;
use swarm_log::LogError;

/// Errors surfaced while constructing or driving a runner.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RunnerError {
    /// The initial state does not belong to the runner's protocol.
    #[error("initial state is not a state of machine '{machine}'")]
    UnknownInitial { machine: String },

    /// A reaction handler failed; the runner accepts no further events.
    #[error("{0}")]
    Failed(ReactionFailure),

    #[error(transparent)]
    Log(#[from] LogError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors returned by [`MachineRunner::execute`](crate::MachineRunner::execute).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CommandError {
    /// Another command is in flight; its events have not been reacted to yet.
    #[error("command '{command}' rejected: a command is already in flight")]
    Locked { command: String },

    #[error("command '{command}' is not enabled in state '{state}'")]
    NotEnabled { command: String, state: String },

    #[error("command '{command}' rejected: the runner has failed")]
    Failed { command: String },

    #[error("command '{command}' failed to generate events: {source}")]
    Generate {
        command: String,
        source: GenerateError,
    },

    /// Nothing to publish; the runner stays unlocked.
    #[error("command '{command}' generated no events")]
    NoEvents { command: String },

    #[error("command '{command}' emitted '{event_type}', which it does not declare")]
    UndeclaredEvent { command: String, event_type: String },

    #[error("command '{command}' emitted an invalid '{event_type}': {}", .errors.join("; "))]
    InvalidEvent {
        command: String,
        event_type: String,
        errors: Vec<String>,
    },

    #[error("publishing events of command '{command}' failed: {source}")]
    Publish { command: String, source: LogError },
}
