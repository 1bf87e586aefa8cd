use std::fmt;

/// Character reserved for synthetic state names in the analysis export.
pub const SYNTHETIC_DELIMITER: char = '§';

/// A problem found while assembling a machine protocol.
///
/// Definition errors are collected by [`MachineBuilder`](crate::MachineBuilder)
/// and reported together; no protocol is constructed when any is present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefinitionError {
    DuplicateState {
        name: String,
    },
    /// A state or event type name contains [`SYNTHETIC_DELIMITER`].
    ReservedCharacter {
        kind: &'static str,
        name: String,
    },
    /// A state id from another protocol, or one never handed out.
    UnknownState {
        context: String,
    },
    UnknownEventType {
        context: String,
        event_type: String,
    },
    EmptyTrigger {
        state: String,
    },
    /// Two reactions of one state start with the same event type.
    AmbiguousReaction {
        state: String,
        event_type: String,
    },
    DuplicateCommand {
        state: String,
        name: String,
    },
    DuplicateEvent {
        event_type: String,
    },
    InvalidSchema {
        event_type: String,
        message: String,
    },
}

impl fmt::Display for DefinitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefinitionError::DuplicateState { name } => {
                write!(f, "state '{}' is already defined", name)
            }
            DefinitionError::ReservedCharacter { kind, name } => write!(
                f,
                "{} name '{}' must not contain '{}'",
                kind, name, SYNTHETIC_DELIMITER
            ),
            DefinitionError::UnknownState { context } => {
                write!(f, "{}: state does not belong to this protocol", context)
            }
            DefinitionError::UnknownEventType {
                context,
                event_type,
            } => write!(
                f,
                "{}: event type '{}' is not registered with the protocol",
                context, event_type
            ),
            DefinitionError::EmptyTrigger { state } => {
                write!(f, "reaction of state '{}' has no trigger events", state)
            }
            DefinitionError::AmbiguousReaction { state, event_type } => write!(
                f,
                "state '{}' already has a reaction starting with '{}'",
                state, event_type
            ),
            DefinitionError::DuplicateCommand { state, name } => {
                write!(f, "state '{}' already has a command '{}'", state, name)
            }
            DefinitionError::DuplicateEvent { event_type } => {
                write!(f, "event type '{}' is registered twice", event_type)
            }
            DefinitionError::InvalidSchema {
                event_type,
                message,
            } => write!(
                f,
                "payload schema of event type '{}' does not compile: {}",
                event_type, message
            ),
        }
    }
}

impl std::error::Error for DefinitionError {}

/// All definition errors found in one build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinitionErrors(pub Vec<DefinitionError>);

impl DefinitionErrors {
    pub fn messages(&self) -> Vec<String> {
        self.0.iter().map(|e| e.to_string()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DefinitionError> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> Vec<DefinitionError> {
        self.0
    }
}

impl fmt::Display for DefinitionErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.messages().join("; "))
    }
}

impl std::error::Error for DefinitionErrors {}
