//! Process-wide wiring, built once at start and passed explicitly to the
//! engine and its flows.

use std::sync::Arc;
use std::time::Duration;

use crate::api::sqs::QueueLauncher;
use crate::core::config::{AppConfig, ConversationRestriction};
use crate::errors::IntakeError;
use crate::flows::collaborators::{FlowOrchestrator, Messenger, RequestFactory, RequestModal};
use crate::flows::{
    ActionRouter, BoundedSpawnLauncher, FlowAction, FlowEngine, IntakeFlow, SlowResponseLauncher,
};
use crate::slack::modal_builder::SUBMIT_CALLBACK_ID;
use crate::slack::{SlackClient, SlackRequestModal};
use crate::tracker::{JiraClient, JiraFlowOrchestrator, JiraRequestFactory};

/// The slice of configuration the intake flow reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntakeSettings {
    pub primary_channel: Option<String>,
    pub restriction: ConversationRestriction,
    pub submit_command: String,
    pub shortcut_callback_id: String,
}

impl Default for IntakeSettings {
    fn default() -> Self {
        Self {
            primary_channel: None,
            restriction: ConversationRestriction::None,
            submit_command: "/submit".to_string(),
            shortcut_callback_id: SUBMIT_CALLBACK_ID.to_string(),
        }
    }
}

impl IntakeSettings {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            primary_channel: config.slack_primary_channel.clone(),
            restriction: config.slack_conversation_restriction,
            submit_command: config.slack_submit_command.clone(),
            ..Self::default()
        }
    }
}

/// Collaborators shared by every dispatch.
#[derive(Clone)]
pub struct IntakeContext {
    pub settings: IntakeSettings,
    pub modal: Arc<dyn RequestModal>,
    pub messenger: Arc<dyn Messenger>,
    pub requests: Arc<dyn RequestFactory>,
    pub orchestrator: Arc<dyn FlowOrchestrator>,
}

impl IntakeContext {
    /// Wire the Slack and Jira adapters from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the Slack HTTP connector cannot be created.
    pub fn from_config(config: &AppConfig) -> Result<Self, IntakeError> {
        let slack = Arc::new(SlackClient::new(config.slack_bot_token.clone())?);
        let jira = Arc::new(JiraClient::new(config.jira.clone()));
        let messenger: Arc<dyn Messenger> = slack.clone();

        Ok(Self {
            settings: IntakeSettings::from_config(config),
            modal: Arc::new(SlackRequestModal::new(
                slack,
                config.submit_modal_config.clone(),
            )),
            messenger: messenger.clone(),
            requests: Arc::new(JiraRequestFactory::new(jira.clone(), messenger.clone())),
            orchestrator: Arc::new(JiraFlowOrchestrator::new(jira, messenger)),
        })
    }
}

/// How long the API Lambda waits for `views.open` before acknowledging.
pub const MODAL_OPEN_WAIT: Duration = Duration::from_millis(2000);

/// Build the dispatch engine with every flow this deployment serves.
///
/// # Errors
///
/// Returns an error if the collaborators cannot be wired.
pub fn build_engine(
    config: &AppConfig,
    launcher: Arc<dyn SlowResponseLauncher>,
) -> Result<FlowEngine, IntakeError> {
    let context = IntakeContext::from_config(config)?;
    Ok(FlowEngine::new(launcher).with_flow(Arc::new(IntakeFlow::new(context))))
}

/// Launcher for the API Lambda.
///
/// Opening the modal runs in-process with a bounded wait, since the trigger id
/// expires within seconds. Everything else goes to the worker through SQS;
/// the API Lambda is frozen once it responds, so nothing else may run after
/// the ack.
///
/// # Errors
///
/// Returns `ConfigurationError` when `PROCESSING_QUEUE_URL` is not set.
pub fn api_launcher(config: &AppConfig) -> Result<Arc<dyn SlowResponseLauncher>, IntakeError> {
    let queue_url = config.processing_queue_url.clone().ok_or_else(|| {
        IntakeError::ConfigurationError(
            "PROCESSING_QUEUE_URL is required by the API Lambda".to_string(),
        )
    })?;

    Ok(Arc::new(
        ActionRouter::new(Arc::new(QueueLauncher::new(queue_url))).route(
            FlowAction::OpenModal,
            Arc::new(BoundedSpawnLauncher::new(MODAL_OPEN_WAIT)),
        ),
    ))
}
