//! swarm-analyze: analysis views of a machine protocol.
//!
//! [`export_machine`] flattens a [`MachineProtocol`](swarm_core::MachineProtocol)
//! into the [`MachineGraph`](swarm_interchange::MachineGraph) exchanged with
//! the verification oracle. [`summarize`] derives a serializable structural
//! summary (state space, reachability) of such a graph.

pub mod export;
pub mod summary;

pub use export::{export_machine, is_synthetic, synthetic_state_name, AnalysisError};
pub use summary::{summarize, GraphSummary};
