/// All errors that can be returned by an `EventLog` implementation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LogError {
    /// The log has been shut down and accepts no further publications or
    /// subscriptions.
    #[error("event log is closed")]
    Closed,

    /// An event could not be encoded for the backend.
    #[error("event of type '{event_type}' could not be encoded: {message}")]
    Encoding { event_type: String, message: String },

    /// A backend-specific error (connection, persistence, etc.).
    #[error("event log backend error: {0}")]
    Backend(String),
}
