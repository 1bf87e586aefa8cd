//! Rebuilding a machine along a projection.
//!
//! The projection (computed by the verification oracle) fixes the states
//! and edges of the adapted machine. Behaviour is transplanted from the
//! original machine: each projection state corresponds to at most one
//! original state, whose command generators are reused by name and whose
//! single-event reaction handlers are reused by event type. Reactions with
//! no counterpart move the payload unchanged.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use swarm_core::{
    CommandGenerator, MachineBuilder, MachineProtocol, PassThrough, ReactionHandler, StateId,
};
use swarm_interchange::{ProjectionInfo, StateName};

use crate::error::{AdaptError, AdaptErrors};
use crate::index::{ProjectionIndex, ProjectionState};
use crate::verbose::{LoggedCommand, LoggedReaction};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdaptOptions {
    /// Name of the adapted machine; the original's name when `None`.
    pub machine_name: Option<String>,
    /// Log every reaction and command of the adapted machine at `info`.
    pub verbose: bool,
}

/// Build the machine described by `info` from the behaviour of `old`.
///
/// Returns the new protocol and its initial state. All problems are
/// collected; no machine is returned when there is any.
pub fn adapt_machine<P>(
    info: &ProjectionInfo,
    old: &MachineProtocol<P>,
    old_initial: StateId,
    options: &AdaptOptions,
) -> Result<(MachineProtocol<P>, StateId), AdaptErrors>
where
    P: Clone + fmt::Debug + Send + Sync + 'static,
{
    if !old.owns(old_initial) {
        return Err(AdaptError::UnknownOldInitial {
            machine: old.machine_name().to_string(),
        }
        .into());
    }

    let machine_name = options
        .machine_name
        .clone()
        .unwrap_or_else(|| old.machine_name().to_string());
    let index = ProjectionIndex::new(info);
    let mut errors = Vec::new();

    let mut builder = MachineBuilder::<P>::new(
        old.swarm_name(),
        machine_name.as_str(),
        old.registered_events().cloned(),
    );
    let ids: BTreeMap<StateName, StateId> = index
        .states()
        .iter()
        .map(|s| (s.name.clone(), builder.state(s.name.clone())))
        .collect();

    for state in index.states() {
        let id = ids[&state.name];
        let original = state
            .original
            .as_ref()
            .and_then(|name| old.state_by_name(name.as_str()));

        add_commands(&mut builder, &mut errors, old, state, id, original, &machine_name, options);

        for (event_type, target) in &state.reactions {
            let handler: Arc<dyn ReactionHandler<P>> = original
                .and_then(|s| old.reaction(s, event_type))
                .filter(|r| r.len() == 1)
                .map(|r| Arc::clone(&r.handler))
                .unwrap_or_else(|| Arc::new(PassThrough));
            let handler: Arc<dyn ReactionHandler<P>> = if options.verbose {
                Arc::new(LoggedReaction {
                    inner: handler,
                    machine: machine_name.clone(),
                    target: target.clone(),
                    commands: index.commands_of(target),
                })
            } else {
                handler
            };
            builder.react_shared(id, vec![event_type.clone()], ids[target], handler);
        }
    }

    let initial = ids.get(index.initial()).copied();
    if initial.is_none() {
        errors.push(AdaptError::UnresolvableInitial {
            initial: index.initial().to_string(),
        });
    }

    match (builder.build(), initial) {
        (Ok(protocol), Some(initial)) if errors.is_empty() => {
            tracing::debug!(
                machine = %machine_name,
                states = index.states().len(),
                initial = %index.initial(),
                "machine adapted"
            );
            Ok((protocol, initial))
        }
        (built, _) => {
            if let Err(definition) = built {
                errors.extend(definition.into_inner().into_iter().map(AdaptError::Definition));
            }
            Err(AdaptErrors(errors))
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn add_commands<P>(
    builder: &mut MachineBuilder<P>,
    errors: &mut Vec<AdaptError>,
    old: &MachineProtocol<P>,
    state: &ProjectionState,
    id: StateId,
    original: Option<StateId>,
    machine_name: &str,
    options: &AdaptOptions,
) where
    P: Send + Sync + 'static,
{
    for (name, event_types) in &state.commands {
        if event_types.len() != 1 {
            errors.push(AdaptError::MultiEventCommand {
                command: name.to_string(),
                event_types: event_types.iter().map(ToString::to_string).collect(),
            });
            continue;
        }
        let Some(def) = original.and_then(|s| old.command(s, name.as_str())) else {
            errors.push(AdaptError::CommandNotImplemented {
                state: state.name.to_string(),
                old_state: state.original.as_ref().map(ToString::to_string),
                command: name.to_string(),
            });
            continue;
        };
        let generator: Arc<dyn CommandGenerator<P>> = if options.verbose {
            Arc::new(LoggedCommand {
                inner: Arc::clone(&def.generator),
                machine: machine_name.to_string(),
                command: name.clone(),
            })
        } else {
            Arc::clone(&def.generator)
        };
        builder.command_shared(id, name.clone(), event_types.clone(), generator);
    }
}
