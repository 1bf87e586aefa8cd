//! The projection pipeline: export, ask the oracle, adapt.

use std::fmt;

use serde::Serialize;
use swarm_analyze::export_machine;
use swarm_core::{MachineProtocol, StateId};
use swarm_interchange::{
    InterfacingProtocols, MachineGraph, OracleResult, ProjectionInfo, Role, Subscriptions,
};

use crate::adapt::{adapt_machine, AdaptOptions};
use crate::error::{AdaptError, AdaptErrors};

/// Everything the oracle needs to project a role's machine onto a
/// composition of protocols.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectionRequest {
    pub role: Role,
    pub protocols: InterfacingProtocols,
    /// Index of the protocol, within `protocols`, the machine was written for.
    pub k: usize,
    pub subscriptions: Subscriptions,
    /// The exported original machine.
    pub machine: MachineGraph,
    pub minimize: bool,
}

/// The verification oracle, as far as adaptation is concerned.
pub trait ProjectionOracle {
    fn projection_info(&self, request: &ProjectionRequest) -> OracleResult<ProjectionInfo>;
}

impl<F> ProjectionOracle for F
where
    F: Fn(&ProjectionRequest) -> OracleResult<ProjectionInfo>,
{
    fn projection_info(&self, request: &ProjectionRequest) -> OracleResult<ProjectionInfo> {
        self(request)
    }
}

/// An adapted machine together with the projection it was built from.
///
/// The projection's branch table and special event types are what a
/// branch-tracking runner for this machine needs.
pub struct AdaptedMachine<P> {
    pub protocol: MachineProtocol<P>,
    pub initial: StateId,
    pub projection_info: ProjectionInfo,
}

impl<P> fmt::Debug for AdaptedMachine<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdaptedMachine")
            .field("protocol", &self.protocol)
            .field("initial", &self.initial)
            .field("projection_info", &self.projection_info)
            .finish()
    }
}

/// Parameters of [`adapt_with_oracle`] besides the machine itself.
#[derive(Debug, Clone)]
pub struct Composition {
    pub role: Role,
    pub protocols: InterfacingProtocols,
    pub k: usize,
    pub subscriptions: Subscriptions,
    pub minimize: bool,
}

/// Export `old`, have `oracle` project it onto `composition`, and adapt
/// `old` to the result.
pub fn adapt_with_oracle<P, O>(
    oracle: &O,
    composition: Composition,
    old: &MachineProtocol<P>,
    old_initial: StateId,
    options: &AdaptOptions,
) -> Result<AdaptedMachine<P>, AdaptErrors>
where
    P: Clone + fmt::Debug + Send + Sync + 'static,
    O: ProjectionOracle + ?Sized,
{
    let machine = export_machine(old, old_initial).map_err(AdaptError::from)?;
    let request = ProjectionRequest {
        role: composition.role,
        protocols: composition.protocols,
        k: composition.k,
        subscriptions: composition.subscriptions,
        machine,
        minimize: composition.minimize,
    };

    let projection_info = match oracle.projection_info(&request) {
        OracleResult::Ok { data } => data,
        OracleResult::Error { errors } => {
            tracing::warn!(role = %request.role, errors = errors.len(), "oracle rejected projection");
            if errors.is_empty() {
                return Err(AdaptError::Oracle("projection rejected without a reason".into()).into());
            }
            return Err(AdaptErrors(errors.into_iter().map(AdaptError::Oracle).collect()));
        }
    };

    let (protocol, initial) = adapt_machine(&projection_info, old, old_initial, options)?;
    Ok(AdaptedMachine {
        protocol,
        initial,
        projection_info,
    })
}
