//! Events as they travel through the log.
//!
//! A [`MachineEvent`] is a JSON object with a `type` discriminator, any
//! number of payload fields, and an optional causal pointer (`lbj`).
//! The log wraps each published event in an [`EventEnvelope`] carrying
//! its [`EventMeta`].

use crate::types::{EventId, EventType};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Wire name of the causal-pointer field ("last branch/join").
pub const CAUSAL_POINTER_FIELD: &str = "lbj";

/// A single event payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineEvent {
    #[serde(rename = "type")]
    pub event_type: EventType,
    /// Event id of the last branching/joining event this one descends from.
    /// Absent and `null` both mean "no pointer".
    #[serde(rename = "lbj", default, skip_serializing_if = "Option::is_none")]
    pub causal_pointer: Option<EventId>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl MachineEvent {
    /// An event with no payload fields.
    pub fn new(event_type: impl Into<EventType>) -> Self {
        Self {
            event_type: event_type.into(),
            causal_pointer: None,
            fields: Map::new(),
        }
    }

    /// An event with the given payload fields.
    ///
    /// `type` and `lbj` keys in `fields` are dropped: they are owned by the
    /// event itself.
    pub fn with_fields(event_type: impl Into<EventType>, mut fields: Map<String, Value>) -> Self {
        fields.remove("type");
        fields.remove(CAUSAL_POINTER_FIELD);
        Self {
            event_type: event_type.into(),
            causal_pointer: None,
            fields,
        }
    }

    pub fn with_causal_pointer(mut self, pointer: Option<EventId>) -> Self {
        self.causal_pointer = pointer;
        self
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// The payload fields as a JSON object, without `type` or `lbj`.
    pub fn fields_value(&self) -> Value {
        Value::Object(self.fields.clone())
    }
}

/// Log-assigned metadata of a published event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventMeta {
    pub event_id: EventId,
    pub offset: u64,
    /// RFC 3339 publication time.
    pub timestamp: String,
    pub tags: Vec<String>,
}

/// A published event together with its metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub payload: MachineEvent,
    pub meta: EventMeta,
}

impl EventEnvelope {
    pub fn event_type(&self) -> &EventType {
        &self.payload.event_type
    }

    pub fn event_id(&self) -> &EventId {
        &self.meta.event_id
    }

    pub fn causal_pointer(&self) -> Option<&EventId> {
        self.payload.causal_pointer.as_ref()
    }
}
