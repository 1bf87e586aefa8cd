use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::LogError;
use crate::tags::{SubscriptionFilter, Tags};
use swarm_interchange::{EventEnvelope, EventMeta, MachineEvent};

/// The event log a swarm runtime reads from and appends to.
///
/// ## Ordering
///
/// Every subscriber observes matching events in one total order, the
/// order in which they were appended. A new subscription first receives
/// the matching history, then live events, without gaps or duplicates.
///
/// ## Identity
///
/// `publish` assigns each event a unique [`EventMeta::event_id`]. Event ids
/// are the values carried by causal pointers, so they must never be reused.
///
/// ## Thread Safety
///
/// Implementations must be `Send + Sync + 'static` to be shared across
/// runner tasks.
#[async_trait]
pub trait EventLog: Send + Sync + 'static {
    /// Append `events`, in order, tagged with `tags`.
    ///
    /// Returns the metadata assigned to each event, in the same order.
    async fn publish(
        &self,
        tags: &Tags,
        events: Vec<MachineEvent>,
    ) -> Result<Vec<EventMeta>, LogError>;

    /// Subscribe to matching events, history first.
    async fn subscribe(&self, filter: SubscriptionFilter) -> Result<EventSubscription, LogError>;

    /// All matching events appended so far.
    async fn history(&self, filter: &SubscriptionFilter) -> Result<Vec<EventEnvelope>, LogError>;
}

/// A stream of envelopes delivered by an [`EventLog`].
///
/// Dropping the subscription unsubscribes.
#[derive(Debug)]
pub struct EventSubscription {
    receiver: mpsc::UnboundedReceiver<EventEnvelope>,
}

impl EventSubscription {
    /// A connected sender/subscription pair, for log implementations.
    pub fn channel() -> (mpsc::UnboundedSender<EventEnvelope>, Self) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (sender, Self { receiver })
    }

    /// The next envelope; `None` once the log has closed the subscription.
    pub async fn next(&mut self) -> Option<EventEnvelope> {
        self.receiver.recv().await
    }
}
