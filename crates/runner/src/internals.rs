//! The synchronous core of a runner: event intake and reaction chains.
//!
//! `push_event` is a pure state transition on [`RunnerInternals`]; the
//! async driver, [`MachineRunner`](crate::MachineRunner), only feeds it
//! envelopes and publishes command events.
//!
//! A reaction with a chain of `k` trigger types is matched one event at a
//! time. While `0 < matched < k` the runner sits in a pending position
//! owned by its current state; only the completing event runs the handler.

use std::collections::BTreeMap;
use std::fmt;
use std::mem;
use std::sync::Arc;

use serde::Serialize;
use swarm_core::{CommandDef, MachineProtocol, ReactionError, StateId};
use swarm_interchange::{
    BranchMap, CommandName, EventEnvelope, EventId, EventType, MachineEvent, SpecialEventTypes,
    StateName,
};

use crate::error::RunnerError;
use crate::tracker::BranchTracker;

// ──────────────────────────────────────────────
// Outcomes
// ──────────────────────────────────────────────

/// Where the runner is: in a defined state, or part-way through a
/// reaction chain of one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Position {
    Settled(StateId),
    Pending {
        owner: StateId,
        matched: Vec<EventType>,
    },
}

/// A reaction handler failed. The runner stays in `current` for good.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReactionFailure {
    pub error: ReactionError,
    pub current: StateId,
    pub next: StateId,
    pub current_name: StateName,
    pub next_name: StateName,
}

impl fmt::Display for ReactionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "reaction from '{}' to '{}' failed: {}",
            self.current_name, self.next_name, self.error
        )
    }
}

/// Result of feeding one envelope to the runner.
#[derive(Debug, Clone, PartialEq)]
pub enum PushOutcome {
    /// The event does not fit; nothing changed.
    Discard(EventEnvelope),
    /// The event extended a pending reaction chain.
    Push,
    /// The event completed a chain; these events triggered the transition.
    React(Vec<EventEnvelope>),
    Failure(ReactionFailure),
}

/// Token of the command currently in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandLock(u64);

/// Observable state of a runner.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateSnapshot<P> {
    #[serde(skip)]
    pub state: StateId,
    pub name: StateName,
    pub payload: P,
    #[serde(skip)]
    pub position: Position,
    /// Commands enabled right now, in definition order.
    pub commands: Vec<CommandName>,
    /// Branch-tracking pointers, when tracking is on.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub causal_pointers: Option<BTreeMap<EventType, Option<EventId>>>,
}

// ──────────────────────────────────────────────
// Internals
// ──────────────────────────────────────────────

pub struct RunnerInternals<P> {
    protocol: Arc<MachineProtocol<P>>,
    initial: (StateId, P),
    state: StateId,
    payload: P,
    queue: Vec<EventEnvelope>,
    command_lock: Option<CommandLock>,
    next_lock: u64,
    failure: Option<ReactionFailure>,
    branch_tracker: Option<BranchTracker>,
}

impl<P: Clone> RunnerInternals<P> {
    /// A plain runner starting in `initial` with `payload`.
    pub fn new(
        protocol: Arc<MachineProtocol<P>>,
        initial: StateId,
        payload: P,
    ) -> Result<Self, RunnerError> {
        if !protocol.owns(initial) {
            return Err(RunnerError::UnknownInitial {
                machine: protocol.machine_name().to_string(),
            });
        }
        Ok(Self {
            protocol,
            initial: (initial, payload.clone()),
            state: initial,
            payload,
            queue: Vec::new(),
            command_lock: None,
            next_lock: 0,
            failure: None,
            branch_tracker: None,
        })
    }

    /// A branch-tracking runner. Pointers are kept for every event type the
    /// protocol registers.
    pub fn with_branch_tracking(
        protocol: Arc<MachineProtocol<P>>,
        initial: StateId,
        payload: P,
        special: SpecialEventTypes,
        branches: BranchMap,
    ) -> Result<Self, RunnerError> {
        let tracker = BranchTracker::new(
            protocol
                .registered_events()
                .map(|def| def.event_type().clone()),
            special,
            branches,
        );
        let mut internals = Self::new(protocol, initial, payload)?;
        internals.branch_tracker = Some(tracker);
        Ok(internals)
    }

    /// Feed one envelope, in delivery order.
    pub fn push_event(&mut self, envelope: EventEnvelope) -> PushOutcome {
        if self.failure.is_some() {
            return self.discard(envelope, "runner has failed");
        }

        let protocol = Arc::clone(&self.protocol);
        let first = match self.queue.first() {
            Some(head) => head.event_type(),
            None => envelope.event_type(),
        };
        let Some(reaction) = protocol.reaction(self.state, first) else {
            return self.discard(envelope, "no reaction");
        };

        if let Some(tracker) = &self.branch_tracker {
            if !tracker.admits(&envelope) {
                return self.discard(envelope, "causal pointer mismatch");
            }
        }

        let Some(expected) = reaction.triggers.get(self.queue.len()) else {
            return self.discard(envelope, "chain already complete");
        };
        if envelope.event_type() != expected {
            return self.discard(envelope, "out of order");
        }
        if let Some(def) = protocol.event_def(expected) {
            if !def.accepts(&envelope.payload) {
                return self.discard(envelope, "payload rejected by schema");
            }
        }

        self.queue.push(envelope);
        if self.queue.len() < reaction.triggers.len() {
            tracing::trace!(
                machine = %protocol.machine_name(),
                matched = self.queue.len(),
                of = reaction.triggers.len(),
                "reaction chain extended"
            );
            return PushOutcome::Push;
        }

        let events = mem::take(&mut self.queue);
        match reaction.handler.react(&self.payload, &events) {
            Ok(payload) => {
                if let (Some(tracker), Some(last)) = (&mut self.branch_tracker, events.last()) {
                    tracker.record(last);
                }
                self.state = reaction.target;
                self.payload = payload;
                self.command_lock = None;
                PushOutcome::React(events)
            }
            Err(error) => {
                let failure = ReactionFailure {
                    error,
                    current: self.state,
                    next: reaction.target,
                    current_name: self.name_of(self.state),
                    next_name: self.name_of(reaction.target),
                };
                self.failure = Some(failure.clone());
                PushOutcome::Failure(failure)
            }
        }
    }

    pub fn protocol(&self) -> &Arc<MachineProtocol<P>> {
        &self.protocol
    }

    pub fn state(&self) -> StateId {
        self.state
    }

    pub fn state_name(&self) -> StateName {
        self.name_of(self.state)
    }

    pub fn payload(&self) -> &P {
        &self.payload
    }

    pub fn position(&self) -> Position {
        if self.queue.is_empty() {
            Position::Settled(self.state)
        } else {
            Position::Pending {
                owner: self.state,
                matched: self
                    .queue
                    .iter()
                    .map(|e| e.event_type().clone())
                    .collect(),
            }
        }
    }

    pub fn failure(&self) -> Option<&ReactionFailure> {
        self.failure.as_ref()
    }

    pub fn branch_tracker(&self) -> Option<&BranchTracker> {
        self.branch_tracker.as_ref()
    }

    /// Commands of the current state, unless a chain is part-matched or
    /// the runner has failed.
    pub fn enabled_commands(&self) -> Vec<&CommandDef<P>> {
        if !self.queue.is_empty() || self.failure.is_some() {
            return Vec::new();
        }
        self.protocol.commands_of(self.state).collect()
    }

    pub fn enabled_command(&self, name: &str) -> Option<&CommandDef<P>> {
        self.enabled_commands()
            .into_iter()
            .find(|c| c.name.as_str() == name)
    }

    pub fn is_locked(&self) -> bool {
        self.command_lock.is_some()
    }

    /// Mark a command as in flight until the next reaction.
    pub fn lock_command(&mut self) -> CommandLock {
        self.next_lock += 1;
        let lock = CommandLock(self.next_lock);
        self.command_lock = Some(lock);
        lock
    }

    /// Drop `lock` if it is still the one held.
    pub fn release(&mut self, lock: CommandLock) {
        if self.command_lock == Some(lock) {
            self.command_lock = None;
        }
    }

    /// Set causal pointers on events about to be published. No-op without
    /// branch tracking.
    pub fn stamp(&self, events: &mut [MachineEvent]) {
        if let Some(tracker) = &self.branch_tracker {
            for event in events {
                tracker.stamp(event);
            }
        }
    }

    /// Back to the initial state and payload, with an empty queue, no lock,
    /// no failure and fresh causal pointers.
    pub fn reset(&mut self) {
        self.state = self.initial.0;
        self.payload = self.initial.1.clone();
        self.queue.clear();
        self.command_lock = None;
        self.failure = None;
        if let Some(tracker) = &mut self.branch_tracker {
            tracker.reset();
        }
    }

    pub fn snapshot(&self) -> StateSnapshot<P> {
        StateSnapshot {
            state: self.state,
            name: self.state_name(),
            payload: self.payload.clone(),
            position: self.position(),
            commands: self
                .enabled_commands()
                .into_iter()
                .map(|c| c.name.clone())
                .collect(),
            causal_pointers: self.branch_tracker.as_ref().map(|t| t.pointers().clone()),
        }
    }

    fn name_of(&self, state: StateId) -> StateName {
        self.protocol
            .state_name(state)
            .cloned()
            .unwrap_or_else(|| StateName::new(state.to_string()))
    }

    fn discard(&self, envelope: EventEnvelope, reason: &'static str) -> PushOutcome {
        tracing::trace!(
            machine = %self.protocol.machine_name(),
            state = %self.name_of(self.state),
            event_type = %envelope.event_type(),
            event_id = %envelope.event_id(),
            reason,
            "event discarded"
        );
        PushOutcome::Discard(envelope)
    }
}

impl<P> fmt::Debug for RunnerInternals<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunnerInternals")
            .field("machine", &self.protocol.machine_name())
            .field("state", &self.state)
            .field("queued", &self.queue.len())
            .field("locked", &self.command_lock.is_some())
            .field("failed", &self.failure.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use swarm_core::{EventDef, MachineBuilder};
    use swarm_interchange::EventMeta;

    fn envelope(event_type: &str, id: &str) -> EventEnvelope {
        EventEnvelope {
            payload: MachineEvent::new(event_type),
            meta: EventMeta {
                event_id: id.into(),
                offset: 0,
                timestamp: String::new(),
                tags: vec![],
            },
        }
    }

    /// S0 --[a, b, c]--> S1, S0 --[d]--> S2 (handler fails).
    fn protocol() -> (Arc<MachineProtocol<Value>>, StateId, StateId) {
        let mut b = MachineBuilder::<Value>::new(
            "p",
            "R",
            ["a", "b", "c", "d"].map(EventDef::without_payload),
        );
        let s0 = b.state("S0");
        let s1 = b.state("S1");
        let s2 = b.state("S2");
        b.command(s0, "go", ["a"], |_, _| Ok(vec![MachineEvent::new("a")]))
            .react(s0, ["a", "b", "c"], s1, |_, events| {
                Ok(json!({ "seen": events.len() }))
            })
            .react(s0, ["d"], s2, |_, _| Err(ReactionError::new("boom")));
        (Arc::new(b.build().unwrap()), s0, s1)
    }

    #[test]
    fn test_chain_pushes_then_reacts() {
        let (p, s0, s1) = protocol();
        let mut r = RunnerInternals::new(p, s0, json!({})).unwrap();

        assert_eq!(r.push_event(envelope("a", "1")), PushOutcome::Push);
        assert_eq!(
            r.position(),
            Position::Pending {
                owner: s0,
                matched: vec!["a".into()]
            }
        );
        assert!(r.enabled_commands().is_empty());
        assert_eq!(r.push_event(envelope("b", "2")), PushOutcome::Push);
        match r.push_event(envelope("c", "3")) {
            PushOutcome::React(events) => assert_eq!(events.len(), 3),
            other => panic!("expected React, got {:?}", other),
        }
        assert_eq!(r.state(), s1);
        assert_eq!(r.payload(), &json!({"seen": 3}));
        assert_eq!(r.position(), Position::Settled(s1));
    }

    #[test]
    fn test_mismatch_mid_chain_keeps_queue() {
        let (p, s0, _) = protocol();
        let mut r = RunnerInternals::new(p, s0, json!({})).unwrap();
        r.push_event(envelope("a", "1"));
        assert!(matches!(
            r.push_event(envelope("c", "2")),
            PushOutcome::Discard(_)
        ));
        assert_eq!(
            r.position(),
            Position::Pending {
                owner: s0,
                matched: vec!["a".into()]
            }
        );
    }

    #[test]
    fn test_out_of_order_chain_does_not_react() {
        let mut b = MachineBuilder::<Value>::new("p", "R", ["a", "b"].map(EventDef::without_payload));
        let s0 = b.state("S0");
        let s1 = b.state("S1");
        b.react(s0, ["a", "b"], s1, |_, _| Ok(json!("done")));
        let mut r = RunnerInternals::new(Arc::new(b.build().unwrap()), s0, json!(null)).unwrap();

        assert!(matches!(
            r.push_event(envelope("b", "1")),
            PushOutcome::Discard(_)
        ));
        assert_eq!(r.position(), Position::Settled(s0));
        // `a` still starts the chain; only a later `b` would complete it.
        assert_eq!(r.push_event(envelope("a", "2")), PushOutcome::Push);
        assert_eq!(r.state(), s0);
        assert_eq!(r.payload(), &json!(null));
        assert_eq!(
            r.position(),
            Position::Pending {
                owner: s0,
                matched: vec!["a".into()]
            }
        );
    }

    #[test]
    fn test_failure_is_permanent() {
        let (p, s0, _) = protocol();
        let mut r = RunnerInternals::new(p, s0, json!({})).unwrap();
        match r.push_event(envelope("d", "1")) {
            PushOutcome::Failure(f) => {
                assert_eq!(f.current, s0);
                assert_eq!(f.next_name, "S2");
                assert_eq!(f.error, ReactionError::new("boom"));
            }
            other => panic!("expected Failure, got {:?}", other),
        }
        assert_eq!(r.state(), s0);
        assert!(matches!(
            r.push_event(envelope("a", "2")),
            PushOutcome::Discard(_)
        ));
        assert!(r.enabled_commands().is_empty());

        r.reset();
        assert!(r.failure().is_none());
        assert_eq!(r.push_event(envelope("a", "3")), PushOutcome::Push);
    }

    #[test]
    fn test_lock_cleared_by_reaction_and_release() {
        let (p, s0, _) = protocol();
        let mut r = RunnerInternals::new(p, s0, json!({})).unwrap();
        let lock = r.lock_command();
        assert!(r.is_locked());
        r.release(lock);
        assert!(!r.is_locked());

        r.lock_command();
        for (t, id) in [("a", "1"), ("b", "2"), ("c", "3")] {
            r.push_event(envelope(t, id));
        }
        assert!(!r.is_locked());
    }

    #[test]
    fn test_stale_lock_release_is_ignored() {
        let (p, s0, _) = protocol();
        let mut r = RunnerInternals::new(p, s0, json!({})).unwrap();
        let old = r.lock_command();
        r.release(old);
        let _current = r.lock_command();
        r.release(old);
        assert!(r.is_locked());
    }

    #[test]
    fn test_foreign_initial_state_is_rejected() {
        let (p, _, _) = protocol();
        let (_, foreign, _) = protocol();
        assert!(matches!(
            RunnerInternals::new(p, foreign, json!({})),
            Err(RunnerError::UnknownInitial { .. })
        ));
    }

    #[test]
    fn test_snapshot_lists_enabled_commands() {
        let (p, s0, _) = protocol();
        let r = RunnerInternals::new(p, s0, json!({"x": 1})).unwrap();
        let snap = r.snapshot();
        assert_eq!(snap.name, "S0");
        assert_eq!(snap.commands, vec![CommandName::from("go")]);
        assert!(snap.causal_pointers.is_none());
        assert_eq!(
            serde_json::to_value(&snap).unwrap(),
            json!({"name": "S0", "payload": {"x": 1}, "commands": ["go"]})
        );
    }
}
