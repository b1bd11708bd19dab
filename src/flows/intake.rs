//! The intake flow: open the request modal, turn a submission into a ticket
//! bound to a Slack thread, and keep that thread in sync with the ticket.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{error, info, warn};

use super::channels::identify_channel_assignments;
use super::collaborators::ServiceRequest;
use super::{FlowAction, ServiceFlow};
use crate::core::context::IntakeContext;
use crate::core::events::{AdditionalData, InboundEvent, ViewSubmission};
use crate::core::models::{ModalParams, RequestParams, ThreadBinding, ThreadId};
use crate::errors::IntakeError;
use crate::slack::modal_builder::{MAX_TITLE_LEN, SUBMIT_CALLBACK_ID};

const INTAKE_ACTIONS: &[FlowAction] = &[
    FlowAction::OpenModal,
    FlowAction::ModalSubmitted,
    FlowAction::TicketChanged,
];

// Slack markup for user, channel and special mentions.
static MENTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<[@#!][^>]*>").expect("static regex compile"));

/// Title to pre-fill: explicit default text first, then whatever text the
/// trigger carried, with mention markup removed. Cut to `MAX_TITLE_LEN`
/// characters so the pre-filled modal can be submitted as is.
#[must_use]
pub fn default_title(event: &InboundEvent, additional: Option<&AdditionalData>) -> String {
    let raw = additional
        .and_then(AdditionalData::default_text)
        .filter(|t| !t.trim().is_empty())
        .or_else(|| event.text())
        .unwrap_or("");

    let stripped = MENTION_RE.replace_all(raw, " ");
    let collapsed = stripped.split_whitespace().collect::<Vec<_>>().join(" ");
    match collapsed.char_indices().nth(MAX_TITLE_LEN) {
        Some((cut, _)) => collapsed[..cut].trim_end().to_string(),
        None => collapsed,
    }
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
}

/// Build the captured intent from a submitted intake modal.
///
/// # Errors
///
/// Returns `MissingContext` when the title field is absent or blank.
pub fn request_params_from_submission(
    submission: &ViewSubmission,
) -> Result<RequestParams, IntakeError> {
    let values = &submission.values;
    let title = non_empty(values.title.as_ref())
        .ok_or_else(|| IntakeError::MissingContext("modal submission has no title".to_string()))?;

    Ok(RequestParams {
        slack_user_id: submission.user_id.clone(),
        title,
        description: non_empty(values.description.as_ref()),
        priority: non_empty(values.priority.as_ref()),
        category: non_empty(values.category.as_ref()),
    })
}

fn placeholder_text(params: &RequestParams) -> String {
    format!(
        ":hourglass_flowing_sand: <@{}> submitted *{}*. Creating a ticket…",
        params.slack_user_id, params.title
    )
}

pub struct IntakeFlow {
    ctx: IntakeContext,
}

impl IntakeFlow {
    pub const NAME: &'static str = "intake";

    #[must_use]
    pub fn new(ctx: IntakeContext) -> Self {
        Self { ctx }
    }

    /// Open the intake modal for the user who triggered `event`.
    ///
    /// # Errors
    ///
    /// - `ConfigurationError` when no primary channel is configured.
    /// - `MissingContext` when the event has no trigger id or user.
    /// - any error from the modal collaborator.
    pub async fn begin_request_creation(
        &self,
        event: &InboundEvent,
        additional: Option<&AdditionalData>,
    ) -> Result<ModalParams, IntakeError> {
        let title = default_title(event, additional);

        let Some(primary) = self.ctx.settings.primary_channel.as_deref() else {
            return Err(IntakeError::ConfigurationError(
                "SLACK_PRIMARY_CHANNEL is not set".to_string(),
            ));
        };
        let trigger_id = event
            .trigger_id()
            .ok_or_else(|| IntakeError::MissingContext("event has no trigger_id".to_string()))?;
        let slack_user_id = event
            .user_id()
            .ok_or_else(|| IntakeError::MissingContext("event has no user".to_string()))?;

        let params = ModalParams {
            slack_user_id: slack_user_id.to_string(),
            title,
            channel_id: event.channel_id().unwrap_or(primary).to_string(),
        };

        self.ctx.modal.show(trigger_id, &params).await?;
        info!(user = %params.slack_user_id, channel_id = %params.channel_id, "Opened intake modal");
        Ok(params)
    }

    /// Turn a modal submission into a ticket bound to a new thread.
    ///
    /// Posts the thread root, binds a request to it and creates the ticket.
    /// A root message left behind by a failed `create` is not removed; the
    /// error says where it is.
    ///
    /// # Errors
    ///
    /// - `MissingContext` when the submission carries no originating channel
    ///   or no title. Nothing is posted in that case.
    /// - the messenger's error when the root message cannot be posted.
    /// - `PartialCreation` when the root was posted but `create` failed.
    pub async fn finish_request_creation(
        &self,
        event: &InboundEvent,
    ) -> Result<Box<dyn ServiceRequest>, IntakeError> {
        let InboundEvent::ViewSubmission(submission) = event else {
            return Err(IntakeError::MissingContext(format!(
                "expected a view submission, got {}",
                event.kind()
            )));
        };

        let starting_channel = submission
            .private_metadata
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or_else(|| {
                IntakeError::MissingContext("modal has no originating channel".to_string())
            })?;
        let params = request_params_from_submission(submission)?;

        let assignments = identify_channel_assignments(
            starting_channel,
            self.ctx.settings.primary_channel.as_deref(),
            self.ctx.settings.restriction,
        );

        let root = self
            .ctx
            .messenger
            .post_message(&assignments.conversation_channel_id, &placeholder_text(&params))
            .await?;

        let thread_id = ThreadId::new(root.channel_id, root.ts);
        let mut request = self.ctx.requests.bind(ThreadBinding {
            thread_id: thread_id.clone(),
            notification_channel_id: assignments.notification_channel_id,
            slack_user_id: params.slack_user_id.clone(),
        });

        if let Err(e) = request.create(&params).await {
            return Err(IntakeError::PartialCreation {
                channel_id: thread_id.channel_id,
                thread_ts: thread_id.ts,
                ticket_key: request.ticket_key().map(ToString::to_string),
                source: Box::new(e),
            });
        }

        info!(
            thread = %thread_id,
            ticket = request.ticket_key().unwrap_or("-"),
            "Request created"
        );
        Ok(request)
    }

    /// Refresh the Slack thread of the request a tracker event refers to.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be rebuilt or the thread update
    /// fails.
    pub async fn refresh_request(
        &self,
        event: &InboundEvent,
        additional: Option<&AdditionalData>,
    ) -> Result<(), IntakeError> {
        let request = self
            .ctx
            .orchestrator
            .build_request_from_external_event(additional, event)
            .await?;
        request.update_slack_thread().await
    }
}

fn log_failure(action: FlowAction, e: &IntakeError) {
    match e {
        IntakeError::ConfigurationError(_) | IntakeError::MissingContext(_) => {
            warn!(action = %action, "Intake aborted before any side effect: {}", e);
        }
        _ => error!(action = %action, external = e.is_external(), "Intake failed: {}", e),
    }
}

#[async_trait]
impl ServiceFlow for IntakeFlow {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn declared_actions(&self) -> &'static [FlowAction] {
        INTAKE_ACTIONS
    }

    fn flow_actions(
        &self,
        event: &InboundEvent,
        _additional: Option<&AdditionalData>,
    ) -> Option<FlowAction> {
        let settings = &self.ctx.settings;
        match event {
            InboundEvent::SlashCommand(c) if c.command == settings.submit_command => {
                Some(FlowAction::OpenModal)
            }
            InboundEvent::Shortcut(s) if s.callback_id == settings.shortcut_callback_id => {
                Some(FlowAction::OpenModal)
            }
            InboundEvent::ViewSubmission(v) if v.callback_id == SUBMIT_CALLBACK_ID => {
                Some(FlowAction::ModalSubmitted)
            }
            InboundEvent::TicketChanged(_) => Some(FlowAction::TicketChanged),
            _ => None,
        }
    }

    fn handle_action_immediate_response(
        &self,
        _action: FlowAction,
        _event: &InboundEvent,
        _additional: Option<&AdditionalData>,
    ) -> bool {
        true
    }

    async fn handle_action_slow_response(
        &self,
        action: FlowAction,
        event: &InboundEvent,
        additional: Option<&AdditionalData>,
    ) -> bool {
        let result = match action {
            FlowAction::OpenModal => self.begin_request_creation(event, additional).await.map(drop),
            FlowAction::ModalSubmitted => self.finish_request_creation(event).await.map(drop),
            FlowAction::TicketChanged => self.refresh_request(event, additional).await,
        };

        match result {
            Ok(()) => true,
            Err(e) => {
                log_failure(action, &e);
                false
            }
        }
    }
}
