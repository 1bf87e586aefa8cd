//! The async driving loop of one runtime instance.
//!
//! A [`MachineRunner`] owns its [`RunnerInternals`] and a subscription to
//! the event log. [`MachineRunner::next`] feeds delivered envelopes to the
//! internals until one completes a reaction; [`MachineRunner::execute`]
//! runs a command of the current state and publishes its events.
//!
//! Commands are locked: after `execute` publishes, further commands are
//! rejected until a reaction moves the runner on (normally the reaction to
//! the command's own events, delivered back through the subscription).
//!
//! A runner is caught up once it has consumed every event the log held
//! when it subscribed; states yielded before that are history replay.

use std::sync::Arc;

use serde_json::Value;
use swarm_core::{MachineProtocol, StateId};
use swarm_interchange::{EventMeta, ProjectionInfo};
use swarm_log::{EventLog, EventSubscription, SubscriptionFilter, Tags};

use crate::config::RunnerConfig;
use crate::error::{CommandError, RunnerError};
use crate::internals::{PushOutcome, RunnerInternals, StateSnapshot};

pub struct MachineRunner<P, L> {
    internals: RunnerInternals<P>,
    log: L,
    tags: Tags,
    filter: SubscriptionFilter,
    subscription: Option<EventSubscription>,
    /// Envelopes of the subscription backlog not yet consumed.
    backlog: usize,
    label: String,
    verbose: bool,
}

impl<P, L> MachineRunner<P, L>
where
    P: Clone + Send + Sync + 'static,
    L: EventLog,
{
    /// Subscribe to every event tagged with `tags` and start consuming.
    pub async fn start(
        log: L,
        tags: Tags,
        internals: RunnerInternals<P>,
    ) -> Result<Self, RunnerError> {
        let filter = SubscriptionFilter::tagged(tags.clone());
        Self::start_filtered(log, tags, filter, internals).await
    }

    /// Start with an explicit subscription filter; commands still publish
    /// with `tags`.
    pub async fn start_filtered(
        log: L,
        tags: Tags,
        filter: SubscriptionFilter,
        internals: RunnerInternals<P>,
    ) -> Result<Self, RunnerError> {
        let subscription = log.subscribe(filter.clone()).await?;
        let backlog = log.history(&filter).await?.len();
        let label = internals.protocol().machine_name().to_string();
        tracing::debug!(
            machine = %label,
            tags = %tags,
            state = %internals.state_name(),
            branch_tracking = internals.branch_tracker().is_some(),
            backlog,
            "runner started"
        );
        Ok(Self {
            internals,
            log,
            tags,
            filter,
            subscription: Some(subscription),
            backlog,
            label,
            verbose: false,
        })
    }

    /// Build and start a runner as described by `config`.
    ///
    /// With `branch_tracking` on, the special event types and branch table
    /// come from `projection`; without one, every pointer stays `None` and
    /// only unpointed events are admitted.
    pub async fn from_config(
        log: L,
        config: &RunnerConfig,
        protocol: Arc<MachineProtocol<P>>,
        initial: StateId,
        payload: P,
        projection: Option<&ProjectionInfo>,
    ) -> Result<Self, RunnerError> {
        let internals = if config.branch_tracking {
            let (special, branches) = projection
                .map(|info| (info.special_event_types.clone(), info.branches.clone()))
                .unwrap_or_default();
            RunnerInternals::with_branch_tracking(protocol, initial, payload, special, branches)?
        } else {
            RunnerInternals::new(protocol, initial, payload)?
        };

        let tags = Tags::new(config.tags.iter().cloned());
        let mut filter = SubscriptionFilter::tagged(tags.clone());
        filter.event_types = config.subscription.clone();

        let mut runner = Self::start_filtered(log, tags, filter, internals).await?;
        if !config.machine_name.is_empty() {
            runner.label = config.machine_name.clone();
        }
        runner.verbose = config.verbose;
        Ok(runner)
    }

    /// Wait for the next state change.
    ///
    /// Returns `None` once the subscription has ended (log closed or runner
    /// disposed), and after a reaction failure has been reported.
    pub async fn next(&mut self) -> Option<Result<StateSnapshot<P>, RunnerError>> {
        loop {
            if self.internals.failure().is_some() {
                return None;
            }
            let envelope = self.subscription.as_mut()?.next().await?;
            self.consume_backlog();
            match self.internals.push_event(envelope) {
                PushOutcome::Discard(_) | PushOutcome::Push => continue,
                PushOutcome::React(events) => {
                    let snapshot = self.internals.snapshot();
                    let triggers: Vec<&str> =
                        events.iter().map(|e| e.event_type().as_str()).collect();
                    if self.verbose {
                        tracing::info!(
                            machine = %self.label,
                            state = %snapshot.name,
                            triggers = ?triggers,
                            commands = ?snapshot.commands,
                            "state changed"
                        );
                    } else {
                        tracing::debug!(
                            machine = %self.label,
                            state = %snapshot.name,
                            triggers = ?triggers,
                            "state changed"
                        );
                    }
                    return Some(Ok(snapshot));
                }
                PushOutcome::Failure(failure) => {
                    tracing::warn!(
                        machine = %self.label,
                        error = %failure,
                        "reaction failed, runner stopped"
                    );
                    return Some(Err(RunnerError::Failed(failure)));
                }
            }
        }
    }

    /// Run command `name` of the current state with `args` and publish the
    /// events it generates.
    pub async fn execute(&mut self, name: &str, args: &Value) -> Result<Vec<EventMeta>, CommandError> {
        if self.internals.failure().is_some() {
            return Err(CommandError::Failed {
                command: name.to_string(),
            });
        }
        if self.internals.is_locked() {
            return Err(CommandError::Locked {
                command: name.to_string(),
            });
        }
        let Some(command) = self.internals.enabled_command(name) else {
            return Err(CommandError::NotEnabled {
                command: name.to_string(),
                state: self.internals.state_name().to_string(),
            });
        };
        let declared = command.events.clone();
        let generator = Arc::clone(&command.generator);

        let mut events = generator
            .generate(self.internals.payload(), args)
            .map_err(|source| CommandError::Generate {
                command: name.to_string(),
                source,
            })?;
        if events.is_empty() {
            return Err(CommandError::NoEvents {
                command: name.to_string(),
            });
        }

        let protocol = Arc::clone(self.internals.protocol());
        for event in &events {
            if !declared.contains(&event.event_type) {
                return Err(CommandError::UndeclaredEvent {
                    command: name.to_string(),
                    event_type: event.event_type.to_string(),
                });
            }
            if let Some(def) = protocol.event_def(&event.event_type) {
                if let Err(errors) = def.check(event) {
                    return Err(CommandError::InvalidEvent {
                        command: name.to_string(),
                        event_type: event.event_type.to_string(),
                        errors,
                    });
                }
            }
        }

        self.internals.stamp(&mut events);
        let lock = self.internals.lock_command();
        match self.log.publish(&self.tags, events).await {
            Ok(metas) => {
                tracing::debug!(
                    machine = %self.label,
                    command = name,
                    events = metas.len(),
                    "command published"
                );
                Ok(metas)
            }
            Err(source) => {
                self.internals.release(lock);
                tracing::warn!(machine = %self.label, command = name, error = %source, "publish failed");
                Err(CommandError::Publish {
                    command: name.to_string(),
                    source,
                })
            }
        }
    }

    /// The current state, payload and enabled commands.
    pub fn snapshot(&self) -> StateSnapshot<P> {
        self.internals.snapshot()
    }

    pub fn internals(&self) -> &RunnerInternals<P> {
        &self.internals
    }

    pub fn is_locked(&self) -> bool {
        self.internals.is_locked()
    }

    /// Whether the history present at subscription time has been consumed.
    pub fn is_caught_up(&self) -> bool {
        self.backlog == 0
    }

    fn consume_backlog(&mut self) {
        if self.backlog == 0 {
            return;
        }
        self.backlog -= 1;
        if self.backlog == 0 {
            tracing::debug!(
                machine = %self.label,
                state = %self.internals.state_name(),
                "caught up with history"
            );
        }
    }

    /// Reset to the initial state and replay the log from the start.
    pub async fn restart(&mut self) -> Result<(), RunnerError> {
        self.subscription = None;
        self.internals.reset();
        self.subscription = Some(self.log.subscribe(self.filter.clone()).await?);
        self.backlog = self.log.history(&self.filter).await?.len();
        tracing::debug!(machine = %self.label, backlog = self.backlog, "runner restarted");
        Ok(())
    }

    /// Stop consuming. Pending and future `next` calls return `None`.
    pub fn dispose(&mut self) {
        self.backlog = 0;
        if self.subscription.take().is_some() {
            tracing::debug!(machine = %self.label, "runner disposed");
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.subscription.is_none()
    }
}
