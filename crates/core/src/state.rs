use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use swarm_interchange::StateName;

static NEXT_PROTOCOL: AtomicU64 = AtomicU64::new(1);

/// Identity of one machine protocol definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProtocolId(u64);

impl ProtocolId {
    pub(crate) fn fresh() -> Self {
        ProtocolId(NEXT_PROTOCOL.fetch_add(1, Ordering::Relaxed))
    }
}

/// Handle of a state within the protocol that created it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StateId {
    protocol: ProtocolId,
    index: usize,
}

impl StateId {
    pub(crate) fn new(protocol: ProtocolId, index: usize) -> Self {
        Self { protocol, index }
    }

    pub fn protocol(&self) -> ProtocolId {
        self.protocol
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}.{}", self.protocol.0, self.index)
    }
}

/// A named state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateDef {
    pub name: StateName,
}
