//! swarm-log: the event log a swarm runtime consumes and appends to.
//!
//! Defines the [`EventLog`] trait, the [`InMemoryLog`] reference
//! implementation, and a [`conformance`] suite any backend can run.

pub mod conformance;
mod error;
mod memory;
mod tags;
mod traits;

pub use error::LogError;
pub use memory::InMemoryLog;
pub use tags::{SubscriptionFilter, Tags};
pub use traits::{EventLog, EventSubscription};
