//! Causal branch tracking.
//!
//! Each event type has a pointer to the id of the last branching or joining
//! event that governs it. An incoming event is only admitted when its own
//! causal pointer (`lbj`) equals the tracker's pointer for its type, which
//! rejects events published on a causal branch this participant did not
//! follow.

use serde::Serialize;
use std::collections::BTreeMap;
use swarm_interchange::{BranchMap, EventEnvelope, EventId, EventType, MachineEvent, SpecialEventTypes};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BranchTracker {
    pointers: BTreeMap<EventType, Option<EventId>>,
    special: SpecialEventTypes,
    branches: BranchMap,
}

impl BranchTracker {
    /// A tracker for `event_types`, every pointer initially `None`.
    pub fn new(
        event_types: impl IntoIterator<Item = EventType>,
        special: SpecialEventTypes,
        branches: BranchMap,
    ) -> Self {
        Self {
            pointers: event_types.into_iter().map(|t| (t, None)).collect(),
            special,
            branches,
        }
    }

    /// The pointer currently expected on events of `event_type`.
    pub fn pointer(&self, event_type: &EventType) -> Option<&EventId> {
        self.pointers.get(event_type).and_then(Option::as_ref)
    }

    pub fn pointers(&self) -> &BTreeMap<EventType, Option<EventId>> {
        &self.pointers
    }

    pub fn is_special(&self, event_type: &EventType) -> bool {
        self.special.contains(event_type)
    }

    /// Whether the event's causal pointer matches the tracked one.
    /// Absent on both sides counts as a match.
    pub fn admits(&self, envelope: &EventEnvelope) -> bool {
        envelope.causal_pointer() == self.pointer(envelope.event_type())
    }

    /// Record `envelope` as the event that completed a reaction. A special
    /// event moves the pointer of every type in its branch entry to its id.
    pub fn record(&mut self, envelope: &EventEnvelope) {
        let event_type = envelope.event_type();
        if !self.is_special(event_type) {
            return;
        }
        let Some(governed) = self.branches.get(event_type) else {
            return;
        };
        for t in governed {
            self.pointers
                .insert(t.clone(), Some(envelope.event_id().clone()));
        }
    }

    /// Set the causal pointer of an event about to be published.
    pub fn stamp(&self, event: &mut MachineEvent) {
        event.causal_pointer = self.pointer(&event.event_type).cloned();
    }

    /// Forget every pointer.
    pub fn reset(&mut self) {
        for pointer in self.pointers.values_mut() {
            *pointer = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swarm_interchange::EventMeta;

    fn envelope(event_type: &str, id: &str, lbj: Option<&str>) -> EventEnvelope {
        EventEnvelope {
            payload: MachineEvent::new(event_type).with_causal_pointer(lbj.map(EventId::from)),
            meta: EventMeta {
                event_id: id.into(),
                offset: 0,
                timestamp: String::new(),
                tags: vec![],
            },
        }
    }

    fn tracker() -> BranchTracker {
        BranchTracker::new(
            ["partReq", "partOK", "closingTime"].map(EventType::from),
            ["partReq", "closingTime"].map(EventType::from).into(),
            BranchMap::from([
                ("partReq".into(), vec!["partOK".into()]),
                ("closingTime".into(), vec!["partReq".into(), "closingTime".into()]),
            ]),
        )
    }

    #[test]
    fn test_initial_pointers_admit_unpointed_events() {
        let t = tracker();
        assert!(t.admits(&envelope("partReq", "e0", None)));
        assert!(!t.admits(&envelope("partReq", "e0", Some("x"))));
    }

    #[test]
    fn test_record_special_event_moves_governed_pointers() {
        let mut t = tracker();
        t.record(&envelope("partReq", "e7", None));
        assert_eq!(t.pointer(&"partOK".into()).unwrap(), "e7");
        assert!(t.admits(&envelope("partOK", "e8", Some("e7"))));
        assert!(!t.admits(&envelope("partOK", "e8", None)));
        assert!(!t.admits(&envelope("partOK", "e8", Some("e6"))));
    }

    #[test]
    fn test_ordinary_event_does_not_move_pointers() {
        let mut t = tracker();
        assert!(!t.is_special(&"partOK".into()));
        t.record(&envelope("partOK", "e3", None));
        assert!(t.pointers().values().all(Option::is_none));
    }

    #[test]
    fn test_stamp_and_reset() {
        let mut t = tracker();
        t.record(&envelope("closingTime", "c1", None));
        let mut event = MachineEvent::new("partReq");
        t.stamp(&mut event);
        assert_eq!(event.causal_pointer.as_ref().unwrap(), "c1");

        t.reset();
        t.stamp(&mut event);
        assert!(event.causal_pointer.is_none());
    }
}
