use crate::handler::{CommandGenerator, ReactionHandler};
use crate::state::StateId;
use std::fmt;
use std::sync::Arc;
use swarm_interchange::{CommandName, EventType};

/// A transition taken once the owning state has seen every trigger event,
/// in order.
pub struct Reaction<P> {
    pub owner: StateId,
    pub triggers: Vec<EventType>,
    pub target: StateId,
    pub handler: Arc<dyn ReactionHandler<P>>,
}

impl<P> Reaction<P> {
    pub fn first_trigger(&self) -> &EventType {
        // Non-empty: empty trigger lists are rejected at build time.
        &self.triggers[0]
    }

    pub fn len(&self) -> usize {
        self.triggers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triggers.is_empty()
    }
}

impl<P> Clone for Reaction<P> {
    fn clone(&self) -> Self {
        Self {
            owner: self.owner,
            triggers: self.triggers.clone(),
            target: self.target,
            handler: Arc::clone(&self.handler),
        }
    }
}

impl<P> fmt::Debug for Reaction<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reaction")
            .field("owner", &self.owner)
            .field("triggers", &self.triggers)
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

/// A command available while its owning state is current.
pub struct CommandDef<P> {
    pub owner: StateId,
    pub name: CommandName,
    pub events: Vec<EventType>,
    pub generator: Arc<dyn CommandGenerator<P>>,
}

impl<P> Clone for CommandDef<P> {
    fn clone(&self) -> Self {
        Self {
            owner: self.owner,
            name: self.name.clone(),
            events: self.events.clone(),
            generator: Arc::clone(&self.generator),
        }
    }
}

impl<P> fmt::Debug for CommandDef<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDef")
            .field("owner", &self.owner)
            .field("name", &self.name)
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}

/// Reactions grouped by owning state.
///
/// States appear in the order their first reaction was added, and each
/// state's reactions keep definition order. Within a state, reactions are
/// looked up by first trigger event type.
pub struct ReactionMap<P> {
    entries: Vec<(StateId, Vec<Reaction<P>>)>,
}

impl<P> Default for ReactionMap<P> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<P> Clone for ReactionMap<P> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
        }
    }
}

impl<P> fmt::Debug for ReactionMap<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<P> ReactionMap<P> {
    pub(crate) fn insert(&mut self, reaction: Reaction<P>) {
        match self.entries.iter_mut().find(|(s, _)| *s == reaction.owner) {
            Some((_, list)) => list.push(reaction),
            None => self.entries.push((reaction.owner, vec![reaction])),
        }
    }

    /// Reactions owned by `state`, in definition order.
    pub fn of_state(&self, state: StateId) -> &[Reaction<P>] {
        self.entries
            .iter()
            .find(|(s, _)| *s == state)
            .map(|(_, list)| list.as_slice())
            .unwrap_or(&[])
    }

    /// The reaction of `state` whose chain starts with `first`.
    pub fn get(&self, state: StateId, first: &EventType) -> Option<&Reaction<P>> {
        self.of_state(state)
            .iter()
            .find(|r| r.first_trigger() == first)
    }

    /// Every reaction, grouped by state.
    pub fn iter(&self) -> impl Iterator<Item = &Reaction<P>> {
        self.entries.iter().flat_map(|(_, list)| list.iter())
    }

    /// Longest trigger chain owned by `state`; 0 when it has no reactions.
    pub fn longest_chain(&self, state: StateId) -> usize {
        self.of_state(state)
            .iter()
            .map(Reaction::len)
            .max()
            .unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.entries.iter().map(|(_, list)| list.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
