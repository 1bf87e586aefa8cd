//! In-memory reference implementation of [`EventLog`].
//!
//! One process-local, totally ordered log. Event ids are
//! `"<source>-<offset>"`, offsets count from zero. Cloning the log yields
//! another handle to the same events.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

use crate::error::LogError;
use crate::tags::{SubscriptionFilter, Tags};
use crate::traits::{EventLog, EventSubscription};
use swarm_interchange::{EventEnvelope, EventId, EventMeta, MachineEvent};

#[derive(Clone)]
pub struct InMemoryLog {
    source: Arc<str>,
    inner: Arc<Mutex<Inner>>,
}

#[derive(Default)]
struct Inner {
    events: Vec<EventEnvelope>,
    subscribers: Vec<Subscriber>,
    closed: bool,
}

struct Subscriber {
    filter: SubscriptionFilter,
    sender: mpsc::UnboundedSender<EventEnvelope>,
}

impl InMemoryLog {
    pub fn new(source: impl Into<String>) -> Self {
        let source: String = source.into();
        Self {
            source: Arc::from(source),
            inner: Arc::new(Mutex::new(Inner::default())),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Number of live subscriptions; dropped ones are pruned first.
    pub async fn subscriber_count(&self) -> usize {
        let mut inner = self.inner.lock().await;
        inner.subscribers.retain(|s| !s.sender.is_closed());
        inner.subscribers.len()
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.events.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.events.is_empty()
    }

    /// Shut the log down: end every subscription and refuse further use.
    pub async fn close(&self) {
        let mut inner = self.inner.lock().await;
        inner.closed = true;
        inner.subscribers.clear();
    }

    /// Append an envelope exactly as given, bypassing id assignment.
    ///
    /// Used to inject events from other sources, e.g. a replayed or forged
    /// log entry in tests.
    pub async fn inject(&self, envelope: EventEnvelope) -> Result<(), LogError> {
        let mut inner = self.inner.lock().await;
        if inner.closed {
            return Err(LogError::Closed);
        }
        inner.deliver(envelope);
        Ok(())
    }

    fn timestamp() -> String {
        time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_else(|_| "unknown".to_string())
    }
}

impl Inner {
    fn deliver(&mut self, envelope: EventEnvelope) {
        self.subscribers.retain(|s| {
            if !s.filter.matches(&envelope.meta.tags, &envelope.payload.event_type) {
                return !s.sender.is_closed();
            }
            s.sender.send(envelope.clone()).is_ok()
        });
        self.events.push(envelope);
    }
}

impl std::fmt::Debug for InMemoryLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryLog")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl EventLog for InMemoryLog {
    async fn publish(
        &self,
        tags: &Tags,
        events: Vec<MachineEvent>,
    ) -> Result<Vec<EventMeta>, LogError> {
        let mut inner = self.inner.lock().await;
        if inner.closed {
            return Err(LogError::Closed);
        }

        let timestamp = Self::timestamp();
        let mut metas = Vec::with_capacity(events.len());
        for payload in events {
            let offset = inner.events.len() as u64;
            let meta = EventMeta {
                event_id: EventId::new(format!("{}-{}", self.source, offset)),
                offset,
                timestamp: timestamp.clone(),
                tags: tags.to_vec(),
            };
            tracing::trace!(
                event_id = %meta.event_id,
                event_type = %payload.event_type,
                "event published"
            );
            metas.push(meta.clone());
            inner.deliver(EventEnvelope { payload, meta });
        }
        Ok(metas)
    }

    async fn subscribe(&self, filter: SubscriptionFilter) -> Result<EventSubscription, LogError> {
        let mut inner = self.inner.lock().await;
        if inner.closed {
            return Err(LogError::Closed);
        }

        let (sender, subscription) = EventSubscription::channel();
        for envelope in inner
            .events
            .iter()
            .filter(|e| filter.matches(&e.meta.tags, &e.payload.event_type))
        {
            // The receiver is still in hand, so this cannot fail.
            let _ = sender.send(envelope.clone());
        }
        inner.subscribers.push(Subscriber { filter, sender });
        Ok(subscription)
    }

    async fn history(&self, filter: &SubscriptionFilter) -> Result<Vec<EventEnvelope>, LogError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .events
            .iter()
            .filter(|e| filter.matches(&e.meta.tags, &e.payload.event_type))
            .cloned()
            .collect())
    }
}
