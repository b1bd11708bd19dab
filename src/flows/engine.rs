use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::{FlowAction, ServiceFlow};
use crate::core::events::{AdditionalData, InboundEvent};
use crate::errors::IntakeError;

/// Slack drops interactions that are not acknowledged within this window.
pub const ACK_DEADLINE: Duration = Duration::from_secs(3);

/// What `dispatch` did with an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// No registered flow claims the event. Not an error.
    NotHandled,
    Handled {
        flow: &'static str,
        action: FlowAction,
        /// Result of the immediate hook.
        acknowledged: bool,
        /// Whether the slow hook was handed off.
        launched: bool,
    },
}

impl DispatchOutcome {
    #[must_use]
    pub fn is_handled(&self) -> bool {
        matches!(self, Self::Handled { .. })
    }
}

/// Slow-phase work for one dispatched event.
pub struct SlowResponseJob {
    pub correlation_id: String,
    pub flow: Arc<dyn ServiceFlow>,
    pub action: FlowAction,
    pub event: InboundEvent,
    pub additional: Option<AdditionalData>,
}

/// Hands slow hooks to an independent unit of execution.
///
/// `launch` returns once the job is handed off, never once it has finished.
#[async_trait]
pub trait SlowResponseLauncher: Send + Sync {
    async fn launch(&self, job: SlowResponseJob) -> Result<(), IntakeError>;
}

/// Runs a slow hook to completion and logs the outcome.
pub async fn run_slow_response(job: SlowResponseJob) -> bool {
    let started = Instant::now();
    let ok = job
        .flow
        .handle_action_slow_response(job.action, &job.event, job.additional.as_ref())
        .await;

    if ok {
        info!(
            correlation_id = %job.correlation_id,
            flow = job.flow.name(),
            action = %job.action,
            elapsed_ms = started.elapsed().as_millis(),
            "Slow response completed"
        );
    } else {
        warn!(
            correlation_id = %job.correlation_id,
            flow = job.flow.name(),
            action = %job.action,
            elapsed_ms = started.elapsed().as_millis(),
            "Slow response failed"
        );
    }
    ok
}

/// In-process launcher backed by `tokio::spawn`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SpawnLauncher;

#[async_trait]
impl SlowResponseLauncher for SpawnLauncher {
    async fn launch(&self, job: SlowResponseJob) -> Result<(), IntakeError> {
        tokio::spawn(run_slow_response(job));
        Ok(())
    }
}

/// Spawns the slow hook and waits up to `wait` for it inside the request.
///
/// For work that must finish while the triggering request is still alive,
/// such as `views.open` before its trigger id expires. Past the bound the hook
/// keeps running in the background.
#[derive(Debug, Clone, Copy)]
pub struct BoundedSpawnLauncher {
    wait: Duration,
}

impl BoundedSpawnLauncher {
    #[must_use]
    pub fn new(wait: Duration) -> Self {
        Self { wait }
    }
}

#[async_trait]
impl SlowResponseLauncher for BoundedSpawnLauncher {
    async fn launch(&self, job: SlowResponseJob) -> Result<(), IntakeError> {
        let correlation_id = job.correlation_id.clone();
        let handle = tokio::spawn(run_slow_response(job));

        match tokio::time::timeout(self.wait, handle).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => {
                error!(correlation_id = %correlation_id, "Slow response task panicked: {}", e);
            }
            Err(_) => {
                warn!(
                    correlation_id = %correlation_id,
                    wait_ms = self.wait.as_millis(),
                    "Slow response still running after bounded wait"
                );
            }
        }
        Ok(())
    }
}

/// Sends chosen actions to their own launcher and everything else to a
/// default one.
pub struct ActionRouter {
    default: Arc<dyn SlowResponseLauncher>,
    routes: Vec<(FlowAction, Arc<dyn SlowResponseLauncher>)>,
}

impl ActionRouter {
    #[must_use]
    pub fn new(default: Arc<dyn SlowResponseLauncher>) -> Self {
        Self {
            default,
            routes: Vec::new(),
        }
    }

    #[must_use]
    pub fn route(mut self, action: FlowAction, launcher: Arc<dyn SlowResponseLauncher>) -> Self {
        self.routes.push((action, launcher));
        self
    }

    fn launcher_for(&self, action: FlowAction) -> &Arc<dyn SlowResponseLauncher> {
        self.routes
            .iter()
            .find(|(routed, _)| *routed == action)
            .map_or(&self.default, |(_, launcher)| launcher)
    }
}

#[async_trait]
impl SlowResponseLauncher for ActionRouter {
    async fn launch(&self, job: SlowResponseJob) -> Result<(), IntakeError> {
        self.launcher_for(job.action).launch(job).await
    }
}

/// Holds the registered flows and dispatches events by first match.
pub struct FlowEngine {
    flows: Vec<Arc<dyn ServiceFlow>>,
    launcher: Arc<dyn SlowResponseLauncher>,
}

impl FlowEngine {
    #[must_use]
    pub fn new(launcher: Arc<dyn SlowResponseLauncher>) -> Self {
        Self {
            flows: Vec::new(),
            launcher,
        }
    }

    #[must_use]
    pub fn with_flow(mut self, flow: Arc<dyn ServiceFlow>) -> Self {
        self.flows.push(flow);
        self
    }

    /// Look up a registered flow by name.
    #[must_use]
    pub fn flow(&self, name: &str) -> Option<Arc<dyn ServiceFlow>> {
        self.flows.iter().find(|f| f.name() == name).cloned()
    }

    /// First flow whose classification is also one of its declared actions.
    #[must_use]
    pub fn classify(
        &self,
        event: &InboundEvent,
        additional: Option<&AdditionalData>,
    ) -> Option<(Arc<dyn ServiceFlow>, FlowAction)> {
        self.flows.iter().find_map(|flow| {
            flow.flow_actions(event, additional)
                .filter(|action| flow.declared_actions().contains(action))
                .map(|action| (Arc::clone(flow), action))
        })
    }

    /// Classify `event`, acknowledge it, and launch the slow phase.
    ///
    /// Returns as soon as the immediate hook has answered and the slow hook
    /// has been handed to the launcher. The slow hook only runs when the
    /// immediate hook acknowledged the event.
    #[tracing::instrument(level = "info", skip_all, fields(event = event.kind()))]
    pub async fn dispatch(
        &self,
        event: InboundEvent,
        additional: Option<AdditionalData>,
    ) -> DispatchOutcome {
        let Some((flow, action)) = self.classify(&event, additional.as_ref()) else {
            debug!("No flow claims event");
            return DispatchOutcome::NotHandled;
        };

        let started = Instant::now();
        let acknowledged =
            flow.handle_action_immediate_response(action, &event, additional.as_ref());
        let elapsed = started.elapsed();
        if elapsed > ACK_DEADLINE {
            warn!(
                flow = flow.name(),
                action = %action,
                elapsed_ms = elapsed.as_millis(),
                "Immediate response exceeded the ack deadline"
            );
        }

        let name = flow.name();
        if !acknowledged {
            warn!(flow = name, action = %action, "Immediate response declined; skipping slow phase");
            return DispatchOutcome::Handled {
                flow: name,
                action,
                acknowledged,
                launched: false,
            };
        }

        let correlation_id = Uuid::new_v4().to_string();
        info!(correlation_id = %correlation_id, flow = name, action = %action, "Launching slow response");

        let job = SlowResponseJob {
            correlation_id: correlation_id.clone(),
            flow,
            action,
            event,
            additional,
        };
        let launched = match self.launcher.launch(job).await {
            Ok(()) => true,
            Err(e) => {
                error!(correlation_id = %correlation_id, "Failed to launch slow response: {}", e);
                false
            }
        };

        DispatchOutcome::Handled {
            flow: name,
            action,
            acknowledged,
            launched,
        }
    }
}
