//! Authoring surface for machine protocols.
//!
//! The builder records states, commands and reactions, checking each as it
//! is added. Problems are accumulated rather than returned one by one;
//! [`MachineBuilder::build`] reports all of them at once and only produces
//! a protocol when there are none.

use crate::error::{DefinitionError, DefinitionErrors, SYNTHETIC_DELIMITER};
use crate::event::EventDef;
use crate::handler::{CommandGenerator, GenerateError, ReactionError, ReactionHandler};
use crate::protocol::MachineProtocol;
use crate::reaction::{CommandDef, Reaction, ReactionMap};
use crate::state::{ProtocolId, StateDef, StateId};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use swarm_interchange::{CommandName, EventEnvelope, EventType, MachineEvent, StateName};

pub struct MachineBuilder<P> {
    id: ProtocolId,
    swarm_name: String,
    machine_name: String,
    events: BTreeMap<EventType, EventDef>,
    states: Vec<StateDef>,
    commands: Vec<CommandDef<P>>,
    reactions: ReactionMap<P>,
    errors: Vec<DefinitionError>,
}

impl<P> MachineBuilder<P> {
    /// Start a machine for role `machine_name` of protocol `swarm_name`,
    /// able to use exactly the given event types.
    pub fn new(
        swarm_name: impl Into<String>,
        machine_name: impl Into<String>,
        events: impl IntoIterator<Item = EventDef>,
    ) -> Self {
        let mut builder = Self {
            id: ProtocolId::fresh(),
            swarm_name: swarm_name.into(),
            machine_name: machine_name.into(),
            events: BTreeMap::new(),
            states: Vec::new(),
            commands: Vec::new(),
            reactions: ReactionMap::default(),
            errors: Vec::new(),
        };
        for def in events {
            if let Some(err) = def.name_error() {
                builder.errors.push(err);
            }
            if builder.events.contains_key(def.event_type()) {
                builder.errors.push(DefinitionError::DuplicateEvent {
                    event_type: def.event_type().to_string(),
                });
                continue;
            }
            builder.events.insert(def.event_type().clone(), def);
        }
        builder
    }

    /// Define a state. Names must be unique and free of the synthetic
    /// delimiter; violations are reported by [`build`](Self::build).
    pub fn state(&mut self, name: impl Into<StateName>) -> StateId {
        let name = name.into();
        if name.as_str().contains(SYNTHETIC_DELIMITER) {
            self.errors.push(DefinitionError::ReservedCharacter {
                kind: "state",
                name: name.to_string(),
            });
        }
        if self.states.iter().any(|s| s.name == name) {
            self.errors.push(DefinitionError::DuplicateState {
                name: name.to_string(),
            });
        }
        self.states.push(StateDef { name });
        StateId::new(self.id, self.states.len() - 1)
    }

    /// Add a command to `owner` that emits events of the given types.
    pub fn command<F>(
        &mut self,
        owner: StateId,
        name: impl Into<CommandName>,
        events: impl IntoIterator<Item = impl Into<EventType>>,
        generator: F,
    ) -> &mut Self
    where
        F: Fn(&P, &Value) -> Result<Vec<MachineEvent>, GenerateError> + Send + Sync + 'static,
    {
        let events = events.into_iter().map(Into::into).collect();
        self.command_shared(owner, name, events, Arc::new(generator))
    }

    /// Add a command with an already shared generator.
    pub fn command_shared(
        &mut self,
        owner: StateId,
        name: impl Into<CommandName>,
        events: Vec<EventType>,
        generator: Arc<dyn CommandGenerator<P>>,
    ) -> &mut Self {
        let name = name.into();
        let context = format!("command '{}'", name);
        let before = self.errors.len();

        self.check_state(owner, &context);
        for event_type in &events {
            self.check_event_type(event_type, &context);
        }
        if self.commands.iter().any(|c| c.owner == owner && c.name == name) {
            self.errors.push(DefinitionError::DuplicateCommand {
                state: self.state_label(owner),
                name: name.to_string(),
            });
        }

        if self.errors.len() == before {
            self.commands.push(CommandDef {
                owner,
                name,
                events,
                generator,
            });
        }
        self
    }

    /// Add a reaction of `owner` to the ordered trigger chain, moving to
    /// `target` with the payload computed by `handler`.
    pub fn react<F>(
        &mut self,
        owner: StateId,
        triggers: impl IntoIterator<Item = impl Into<EventType>>,
        target: StateId,
        handler: F,
    ) -> &mut Self
    where
        F: Fn(&P, &[EventEnvelope]) -> Result<P, ReactionError> + Send + Sync + 'static,
    {
        let triggers = triggers.into_iter().map(Into::into).collect();
        self.react_shared(owner, triggers, target, Arc::new(handler))
    }

    /// Add a reaction with an already shared handler.
    pub fn react_shared(
        &mut self,
        owner: StateId,
        triggers: Vec<EventType>,
        target: StateId,
        handler: Arc<dyn ReactionHandler<P>>,
    ) -> &mut Self {
        let context = format!(
            "reaction to [{}]",
            triggers
                .iter()
                .map(EventType::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        );
        let before = self.errors.len();

        let owner_known = self.check_state(owner, &context);
        self.check_state(target, &context);
        for event_type in &triggers {
            self.check_event_type(event_type, &context);
        }
        match triggers.first() {
            None => self.errors.push(DefinitionError::EmptyTrigger {
                state: self.state_label(owner),
            }),
            Some(first) if owner_known && self.reactions.get(owner, first).is_some() => {
                self.errors.push(DefinitionError::AmbiguousReaction {
                    state: self.state_label(owner),
                    event_type: first.to_string(),
                })
            }
            Some(_) => {}
        }

        if self.errors.len() == before {
            self.reactions.insert(Reaction {
                owner,
                triggers,
                target,
                handler,
            });
        }
        self
    }

    /// Finish the definition.
    pub fn build(self) -> Result<MachineProtocol<P>, DefinitionErrors> {
        if !self.errors.is_empty() {
            return Err(DefinitionErrors(self.errors));
        }
        tracing::debug!(
            swarm = %self.swarm_name,
            machine = %self.machine_name,
            states = self.states.len(),
            commands = self.commands.len(),
            reactions = self.reactions.len(),
            "machine protocol built"
        );
        Ok(MachineProtocol {
            id: self.id,
            swarm_name: self.swarm_name,
            machine_name: self.machine_name,
            events: self.events,
            states: self.states,
            commands: self.commands,
            reactions: self.reactions,
        })
    }

    // ── Checks ──────────────────────────────────────────────────────

    fn check_state(&mut self, state: StateId, context: &str) -> bool {
        let known = state.protocol() == self.id && state.index() < self.states.len();
        if !known {
            self.errors.push(DefinitionError::UnknownState {
                context: context.to_string(),
            });
        }
        known
    }

    fn check_event_type(&mut self, event_type: &EventType, context: &str) {
        if !self.events.contains_key(event_type) {
            self.errors.push(DefinitionError::UnknownEventType {
                context: context.to_string(),
                event_type: event_type.to_string(),
            });
        }
    }

    fn state_label(&self, state: StateId) -> String {
        if state.protocol() == self.id {
            if let Some(def) = self.states.get(state.index()) {
                return def.name.to_string();
            }
        }
        state.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn events() -> Vec<EventDef> {
        vec![
            EventDef::without_payload("a"),
            EventDef::without_payload("b"),
            EventDef::without_payload("c"),
        ]
    }

    fn keep(state: &Value, _events: &[EventEnvelope]) -> Result<Value, ReactionError> {
        Ok(state.clone())
    }

    #[test]
    fn test_build_simple_machine() {
        let mut b = MachineBuilder::<Value>::new("proto", "R", events());
        let s0 = b.state("S0");
        let s1 = b.state("S1");
        b.command(s0, "go", ["a"], |_, _| Ok(vec![MachineEvent::new("a")]))
            .react(s0, ["a", "b"], s1, keep);
        let p = b.build().unwrap();

        assert_eq!(p.machine_name(), "R");
        assert_eq!(p.state_by_name("S1"), Some(s1));
        assert_eq!(p.commands_of(s0).count(), 1);
        assert_eq!(p.reaction(s0, &"a".into()).unwrap().target, s1);
        assert!(p.reaction(s0, &"b".into()).is_none());
        assert_eq!(p.reactions().longest_chain(s0), 2);
        assert_eq!(
            p.command(s0, "go")
                .unwrap()
                .generator
                .generate(&json!({}), &json!(null))
                .unwrap()[0]
                .event_type,
            "a"
        );
    }

    #[test]
    fn test_errors_are_collected() {
        let mut b = MachineBuilder::<Value>::new("proto", "R", events());
        let s0 = b.state("S0");
        b.state("S0");
        b.state("bad§name");
        let s1 = b.state("S1");
        b.react(s0, ["a"], s1, keep)
            .react(s0, ["a", "c"], s1, keep)
            .react(s0, ["zzz"], s1, keep)
            .react(s0, Vec::<EventType>::new(), s1, keep);

        let errors = b.build().unwrap_err();
        let kinds: Vec<_> = errors
            .iter()
            .map(|e| match e {
                DefinitionError::DuplicateState { .. } => "dup",
                DefinitionError::ReservedCharacter { .. } => "reserved",
                DefinitionError::AmbiguousReaction { .. } => "ambiguous",
                DefinitionError::UnknownEventType { .. } => "unknown-event",
                DefinitionError::EmptyTrigger { .. } => "empty",
                other => panic!("unexpected error {:?}", other),
            })
            .collect();
        assert_eq!(
            kinds,
            vec!["dup", "reserved", "ambiguous", "unknown-event", "empty"]
        );
        assert_eq!(errors.messages().len(), 5);
    }

    #[test]
    fn test_foreign_state_is_rejected() {
        let mut other = MachineBuilder::<Value>::new("proto", "X", events());
        let foreign = other.state("S0");

        let mut b = MachineBuilder::<Value>::new("proto", "R", events());
        let s0 = b.state("S0");
        b.react(s0, ["a"], foreign, keep);
        b.command(foreign, "go", ["a"], |_, _| Ok(vec![]));

        let errors = b.build().unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors
            .iter()
            .all(|e| matches!(e, DefinitionError::UnknownState { .. })));
    }

    #[test]
    fn test_duplicate_command_and_event() {
        let mut evs = events();
        evs.push(EventDef::without_payload("a"));
        let mut b = MachineBuilder::<Value>::new("proto", "R", evs);
        let s0 = b.state("S0");
        b.command(s0, "go", ["a"], |_, _| Ok(vec![]))
            .command(s0, "go", ["b"], |_, _| Ok(vec![]));
        let errors = b.build().unwrap_err();
        match &errors.0[..] {
            [DefinitionError::DuplicateEvent { event_type }, DefinitionError::DuplicateCommand { name, .. }] =>
            {
                assert_eq!(event_type, "a");
                assert_eq!(name, "go");
            }
            other => panic!("expected DuplicateEvent + DuplicateCommand, got {:?}", other),
        }
    }
}
