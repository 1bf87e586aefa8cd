use crate::event::EventDef;
use crate::reaction::{CommandDef, Reaction, ReactionMap};
use crate::state::{ProtocolId, StateDef, StateId};
use std::collections::BTreeMap;
use std::fmt;
use swarm_interchange::{EventType, StateName};

/// An immutable, validated machine definition.
///
/// Produced by [`MachineBuilder::build`](crate::MachineBuilder::build) and
/// shared between runners through an `Arc`.
pub struct MachineProtocol<P> {
    pub(crate) id: ProtocolId,
    pub(crate) swarm_name: String,
    pub(crate) machine_name: String,
    pub(crate) events: BTreeMap<EventType, EventDef>,
    pub(crate) states: Vec<StateDef>,
    pub(crate) commands: Vec<CommandDef<P>>,
    pub(crate) reactions: ReactionMap<P>,
}

impl<P> MachineProtocol<P> {
    pub fn id(&self) -> ProtocolId {
        self.id
    }

    pub fn swarm_name(&self) -> &str {
        &self.swarm_name
    }

    pub fn machine_name(&self) -> &str {
        &self.machine_name
    }

    /// Whether `state` was handed out by this protocol.
    pub fn owns(&self, state: StateId) -> bool {
        state.protocol() == self.id && state.index() < self.states.len()
    }

    pub fn state(&self, state: StateId) -> Option<&StateDef> {
        if state.protocol() != self.id {
            return None;
        }
        self.states.get(state.index())
    }

    pub fn state_name(&self, state: StateId) -> Option<&StateName> {
        self.state(state).map(|s| &s.name)
    }

    pub fn state_by_name(&self, name: &str) -> Option<StateId> {
        self.states
            .iter()
            .position(|s| s.name.as_str() == name)
            .map(|index| StateId::new(self.id, index))
    }

    /// All states in definition order.
    pub fn states(&self) -> impl Iterator<Item = (StateId, &StateDef)> {
        let id = self.id;
        self.states
            .iter()
            .enumerate()
            .map(move |(index, def)| (StateId::new(id, index), def))
    }

    /// All commands in definition order.
    pub fn commands(&self) -> &[CommandDef<P>] {
        &self.commands
    }

    /// Commands owned by `state`, in definition order.
    pub fn commands_of(&self, state: StateId) -> impl Iterator<Item = &CommandDef<P>> {
        self.commands.iter().filter(move |c| c.owner == state)
    }

    pub fn command(&self, state: StateId, name: &str) -> Option<&CommandDef<P>> {
        self.commands_of(state).find(|c| c.name.as_str() == name)
    }

    pub fn reactions(&self) -> &ReactionMap<P> {
        &self.reactions
    }

    pub fn reaction(&self, state: StateId, first: &EventType) -> Option<&Reaction<P>> {
        self.reactions.get(state, first)
    }

    pub fn event_def(&self, event_type: &EventType) -> Option<&EventDef> {
        self.events.get(event_type)
    }

    pub fn registered_events(&self) -> impl Iterator<Item = &EventDef> {
        self.events.values()
    }
}

impl<P> fmt::Debug for MachineProtocol<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MachineProtocol")
            .field("swarm_name", &self.swarm_name)
            .field("machine_name", &self.machine_name)
            .field("events", &self.events.keys().collect::<Vec<_>>())
            .field("states", &self.states)
            .field("commands", &self.commands)
            .field("reactions", &self.reactions)
            .finish()
    }
}
