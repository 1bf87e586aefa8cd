use std::fmt;
use swarm_analyze::AnalysisError;
use swarm_core::DefinitionError;

/// A reason a machine could not be adapted to a projection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdaptError {
    /// A projection command label emits more than one event type.
    MultiEventCommand {
        command: String,
        event_types: Vec<String>,
    },
    /// A projection state offers a command the corresponding old state
    /// does not define (or there is no corresponding old state).
    CommandNotImplemented {
        state: String,
        old_state: Option<String>,
        command: String,
    },
    /// The projection's initial state is not among its materialised states.
    UnresolvableInitial { initial: String },
    /// The given old initial state does not belong to the old machine.
    UnknownOldInitial { machine: String },
    /// The adapted machine failed to build.
    Definition(DefinitionError),
    /// The oracle returned an error verdict.
    Oracle(String),
    /// Exporting the old machine failed.
    Analysis(AnalysisError),
}

impl fmt::Display for AdaptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdaptError::MultiEventCommand {
                command,
                event_types,
            } => write!(
                f,
                "command '{}' emits {} event types [{}]; only single-event commands can be adapted",
                command,
                event_types.len(),
                event_types.join(", ")
            ),
            AdaptError::CommandNotImplemented {
                state,
                old_state: Some(old),
                command,
            } => write!(
                f,
                "command '{}' of projection state '{}' is not implemented by state '{}'",
                command, state, old
            ),
            AdaptError::CommandNotImplemented {
                state,
                old_state: None,
                command,
            } => write!(
                f,
                "command '{}' of projection state '{}' has no corresponding machine state",
                command, state
            ),
            AdaptError::UnresolvableInitial { initial } => {
                write!(f, "projection initial state '{}' could not be resolved", initial)
            }
            AdaptError::UnknownOldInitial { machine } => {
                write!(f, "initial state is not a state of machine '{}'", machine)
            }
            AdaptError::Definition(e) => write!(f, "adapted machine is invalid: {}", e),
            AdaptError::Oracle(msg) => write!(f, "oracle error: {}", msg),
            AdaptError::Analysis(e) => write!(f, "export failed: {}", e),
        }
    }
}

impl std::error::Error for AdaptError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AdaptError::Definition(e) => Some(e),
            AdaptError::Analysis(e) => Some(e),
            _ => None,
        }
    }
}

impl From<DefinitionError> for AdaptError {
    fn from(e: DefinitionError) -> Self {
        AdaptError::Definition(e)
    }
}

impl From<AnalysisError> for AdaptError {
    fn from(e: AnalysisError) -> Self {
        AdaptError::Analysis(e)
    }
}

/// Every problem found during one adaptation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdaptErrors(pub Vec<AdaptError>);

impl AdaptErrors {
    pub fn messages(&self) -> Vec<String> {
        self.0.iter().map(|e| e.to_string()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AdaptError> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for AdaptErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.messages().join("; "))
    }
}

impl std::error::Error for AdaptErrors {}

impl From<AdaptError> for AdaptErrors {
    fn from(e: AdaptError) -> Self {
        AdaptErrors(vec![e])
    }
}
