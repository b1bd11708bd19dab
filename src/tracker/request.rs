use std::fmt::Write as _;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use super::jira::{JiraClient, issue_payload};
use super::webhook::binding_labels;
use crate::core::events::TicketSnapshot;
use crate::core::models::{RequestParams, ThreadBinding};
use crate::errors::IntakeError;
use crate::flows::collaborators::{Messenger, RequestFactory, ServiceRequest};

/// Text of the thread root once a ticket exists.
///
/// A deleted ticket keeps its key and summary but loses its link and facts.
#[must_use]
pub fn render_thread_root(binding: &ThreadBinding, ticket: &TicketSnapshot, url: &str) -> String {
    if ticket.deleted {
        let mut text = format!(
            ":wastebasket: ~{} {}~\nThis ticket was deleted in Jira.",
            ticket.key, ticket.summary
        );
        if !binding.slack_user_id.is_empty() {
            let _ = write!(text, "\nRequested by <@{}>", binding.slack_user_id);
        }
        return text;
    }

    let mut text = format!(":ticket: *<{url}|{}>* {}", ticket.key, ticket.summary);

    let mut facts = Vec::new();
    if let Some(status) = &ticket.status {
        facts.push(format!("Status: *{status}*"));
    }
    if let Some(priority) = &ticket.priority {
        facts.push(format!("Priority: {priority}"));
    }
    if !ticket.components.is_empty() {
        facts.push(format!("Category: {}", ticket.components.join(", ")));
    }
    if let Some(assignee) = &ticket.assignee {
        facts.push(format!("Assignee: {assignee}"));
    }
    if !facts.is_empty() {
        let _ = write!(text, "\n{}", facts.join(" · "));
    }

    if !binding.slack_user_id.is_empty() {
        let _ = write!(text, "\nRequested by <@{}>", binding.slack_user_id);
    }
    text
}

/// Notification posted outside the conversation channel for a new request.
#[must_use]
pub fn render_notification(binding: &ThreadBinding, ticket: &TicketSnapshot, url: &str) -> String {
    format!(
        ":new: <{url}|{}> {} (discussion in <#{}>)",
        ticket.key, ticket.summary, binding.thread_id.channel_id
    )
}

/// A request backed by a Jira issue and a Slack thread.
pub struct JiraServiceRequest {
    binding: ThreadBinding,
    ticket: Option<TicketSnapshot>,
    jira: Arc<JiraClient>,
    messenger: Arc<dyn Messenger>,
}

impl JiraServiceRequest {
    #[must_use]
    pub fn new(binding: ThreadBinding, jira: Arc<JiraClient>, messenger: Arc<dyn Messenger>) -> Self {
        Self {
            binding,
            ticket: None,
            jira,
            messenger,
        }
    }

    /// A request whose ticket already exists.
    #[must_use]
    pub fn with_ticket(
        binding: ThreadBinding,
        ticket: TicketSnapshot,
        jira: Arc<JiraClient>,
        messenger: Arc<dyn Messenger>,
    ) -> Self {
        Self {
            ticket: Some(ticket),
            ..Self::new(binding, jira, messenger)
        }
    }

    #[must_use]
    pub fn ticket(&self) -> Option<&TicketSnapshot> {
        self.ticket.as_ref()
    }
}

#[async_trait]
impl ServiceRequest for JiraServiceRequest {
    fn binding(&self) -> &ThreadBinding {
        &self.binding
    }

    fn ticket_key(&self) -> Option<&str> {
        self.ticket.as_ref().map(|t| t.key.as_str())
    }

    async fn create(&mut self, params: &RequestParams) -> Result<(), IntakeError> {
        if let Some(key) = self.ticket_key() {
            return Err(IntakeError::GeneralError(format!(
                "request already has ticket {key}"
            )));
        }

        let labels = binding_labels(&self.binding);
        let jira_config = self.jira.config();
        let payload = issue_payload(
            &jira_config.project_key,
            &jira_config.issue_type,
            params,
            &labels,
        );
        let created = self.jira.create_issue(&payload).await?;
        info!(key = %created.key, thread = %self.binding.thread_id, "Ticket created");

        self.ticket = Some(TicketSnapshot {
            key: created.key,
            summary: params.title.clone(),
            status: None,
            priority: params.priority.clone(),
            assignee: None,
            components: params.category.iter().cloned().collect(),
            labels,
            deleted: false,
        });

        self.update_slack_thread().await?;

        let thread_channel = &self.binding.thread_id.channel_id;
        if self.binding.notification_channel_id != *thread_channel
            && let Some(ticket) = &self.ticket
        {
            let url = self.jira.browse_url(&ticket.key);
            let text = render_notification(&self.binding, ticket, &url);
            if let Err(e) = self
                .messenger
                .post_message(&self.binding.notification_channel_id, &text)
                .await
            {
                // The ticket and thread are in place; a missed notice is not fatal.
                warn!(channel_id = %self.binding.notification_channel_id, "Failed to post notification: {}", e);
            }
        }

        Ok(())
    }

    async fn update_slack_thread(&self) -> Result<(), IntakeError> {
        let ticket = self.ticket.as_ref().ok_or_else(|| {
            IntakeError::MissingContext("request has no ticket to render".to_string())
        })?;
        let url = self.jira.browse_url(&ticket.key);
        let text = render_thread_root(&self.binding, ticket, &url);

        let thread = &self.binding.thread_id;
        self.messenger
            .update_message(&thread.channel_id, &thread.ts, &text)
            .await
    }
}

pub struct JiraRequestFactory {
    jira: Arc<JiraClient>,
    messenger: Arc<dyn Messenger>,
}

impl JiraRequestFactory {
    #[must_use]
    pub fn new(jira: Arc<JiraClient>, messenger: Arc<dyn Messenger>) -> Self {
        Self { jira, messenger }
    }
}

impl RequestFactory for JiraRequestFactory {
    fn bind(&self, binding: ThreadBinding) -> Box<dyn ServiceRequest> {
        Box::new(JiraServiceRequest::new(
            binding,
            Arc::clone(&self.jira),
            Arc::clone(&self.messenger),
        ))
    }
}
