//! Event type definitions.
//!
//! An [`EventDef`] names an event type and optionally carries a JSON Schema
//! for its payload fields. Schemas are compiled once, when the definition is
//! created; validation afterwards only runs the compiled validator.

use crate::error::{DefinitionError, SYNTHETIC_DELIMITER};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use swarm_interchange::{EventType, MachineEvent};

/// A compiled payload schema.
pub struct PayloadSchema {
    source: Value,
    validator: jsonschema::Validator,
}

impl PayloadSchema {
    pub fn source(&self) -> &Value {
        &self.source
    }

    /// Validation messages for `fields`; empty when valid.
    pub fn errors(&self, fields: &Value) -> Vec<String> {
        self.validator
            .iter_errors(fields)
            .map(|e| e.to_string())
            .collect()
    }

    pub fn is_valid(&self, fields: &Value) -> bool {
        self.validator.is_valid(fields)
    }
}

impl fmt::Debug for PayloadSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PayloadSchema")
            .field("source", &self.source)
            .finish()
    }
}

/// An event type registered with a machine protocol.
#[derive(Debug, Clone)]
pub struct EventDef {
    event_type: EventType,
    schema: Option<Arc<PayloadSchema>>,
}

impl EventDef {
    /// An event type whose payload is not checked.
    pub fn without_payload(event_type: impl Into<EventType>) -> Self {
        Self {
            event_type: event_type.into(),
            schema: None,
        }
    }

    /// An event type whose payload fields must satisfy `schema`.
    ///
    /// The schema applies to the fields object, which never contains `type`
    /// or the causal pointer.
    pub fn with_schema(
        event_type: impl Into<EventType>,
        schema: Value,
    ) -> Result<Self, DefinitionError> {
        let event_type = event_type.into();
        let validator =
            jsonschema::validator_for(&schema).map_err(|e| DefinitionError::InvalidSchema {
                event_type: event_type.to_string(),
                message: e.to_string(),
            })?;
        Ok(Self {
            event_type,
            schema: Some(Arc::new(PayloadSchema {
                source: schema,
                validator,
            })),
        })
    }

    pub fn event_type(&self) -> &EventType {
        &self.event_type
    }

    pub fn schema(&self) -> Option<&PayloadSchema> {
        self.schema.as_deref()
    }

    /// Build an event of this type with the given fields.
    pub fn make(&self, fields: Map<String, Value>) -> MachineEvent {
        MachineEvent::with_fields(self.event_type.clone(), fields)
    }

    /// Build an event of this type with no fields.
    pub fn make_empty(&self) -> MachineEvent {
        MachineEvent::new(self.event_type.clone())
    }

    /// Whether `event` has this type and, when a schema is declared,
    /// payload fields that satisfy it.
    pub fn accepts(&self, event: &MachineEvent) -> bool {
        if event.event_type != self.event_type {
            return false;
        }
        match &self.schema {
            Some(schema) => schema.is_valid(&event.fields_value()),
            None => true,
        }
    }

    /// Like [`accepts`](Self::accepts), with the reasons on rejection.
    pub fn check(&self, event: &MachineEvent) -> Result<(), Vec<String>> {
        if event.event_type != self.event_type {
            return Err(vec![format!(
                "expected event type '{}', got '{}'",
                self.event_type, event.event_type
            )]);
        }
        let Some(schema) = &self.schema else {
            return Ok(());
        };
        let errors = schema.errors(&event.fields_value());
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    pub(crate) fn name_error(&self) -> Option<DefinitionError> {
        self.event_type
            .as_str()
            .contains(SYNTHETIC_DELIMITER)
            .then(|| DefinitionError::ReservedCharacter {
                kind: "event type",
                name: self.event_type.to_string(),
            })
    }
}
