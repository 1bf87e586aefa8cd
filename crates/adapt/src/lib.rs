//! swarm-adapt: adapting a machine to its projection onto a composition.
//!
//! [`adapt_machine`] rebuilds a [`MachineProtocol`](swarm_core::MachineProtocol)
//! along a [`ProjectionInfo`](swarm_interchange::ProjectionInfo), reusing
//! the original's command generators and reaction handlers.
//! [`adapt_with_oracle`] runs the whole pipeline against a
//! [`ProjectionOracle`].

mod adapt;
mod error;
pub mod index;
mod oracle;
mod verbose;

pub use adapt::{adapt_machine, AdaptOptions};
pub use error::{AdaptError, AdaptErrors};
pub use index::{ProjectionIndex, ProjectionState};
pub use oracle::{adapt_with_oracle, AdaptedMachine, Composition, ProjectionOracle, ProjectionRequest};
