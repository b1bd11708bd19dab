//! Jira webhook decoding and the label scheme that ties a ticket back to its
//! Slack thread.
//!
//! The ticket is the only place the binding is stored: the thread, the
//! notification channel and the requester each get a label.

use serde::Deserialize;
use serde_json::Value;

use crate::core::events::{TicketChange, TicketSnapshot};
use crate::core::models::{ThreadBinding, ThreadId};
use crate::errors::IntakeError;

pub const THREAD_LABEL_PREFIX: &str = "slack-thread:";
pub const NOTIFY_LABEL_PREFIX: &str = "slack-notify:";
pub const USER_LABEL_PREFIX: &str = "slack-user:";

pub const ISSUE_DELETED_EVENT: &str = "jira:issue_deleted";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawWebhook {
    #[serde(default)]
    webhook_event: String,
    issue: RawIssue,
}

#[derive(Debug, Deserialize)]
struct RawIssue {
    key: String,
    #[serde(default)]
    fields: RawFields,
}

#[derive(Debug, Default, Deserialize)]
struct RawFields {
    #[serde(default)]
    summary: String,
    status: Option<Named>,
    priority: Option<Named>,
    assignee: Option<RawUser>,
    #[serde(default)]
    components: Vec<Named>,
    #[serde(default)]
    labels: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct Named {
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawUser {
    display_name: Option<String>,
}

/// Decode a Jira issue webhook into a typed change event.
///
/// # Errors
///
/// Returns `ParseError` if the payload has no `issue` or the issue has no key.
pub fn decode_ticket_webhook(raw: &Value) -> Result<TicketChange, IntakeError> {
    let hook = RawWebhook::deserialize(raw)
        .map_err(|e| IntakeError::ParseError(format!("Invalid Jira webhook: {e}")))?;
    let fields = hook.issue.fields;
    let deleted = hook.webhook_event == ISSUE_DELETED_EVENT;

    Ok(TicketChange {
        webhook_event: hook.webhook_event,
        issue: TicketSnapshot {
            key: hook.issue.key,
            summary: fields.summary,
            status: fields.status.map(|s| s.name),
            priority: fields.priority.map(|p| p.name),
            assignee: fields.assignee.and_then(|a| a.display_name),
            components: fields.components.into_iter().map(|c| c.name).collect(),
            labels: fields.labels,
            deleted,
        },
    })
}

/// Labels recording where a request lives in Slack.
#[must_use]
pub fn binding_labels(binding: &ThreadBinding) -> Vec<String> {
    let mut labels = vec![
        format!("{THREAD_LABEL_PREFIX}{}", binding.thread_id),
        format!("{NOTIFY_LABEL_PREFIX}{}", binding.notification_channel_id),
    ];
    if !binding.slack_user_id.is_empty() {
        labels.push(format!("{USER_LABEL_PREFIX}{}", binding.slack_user_id));
    }
    labels
}

fn label_value<'a>(labels: &'a [String], prefix: &str) -> Option<&'a str> {
    labels
        .iter()
        .find_map(|l| l.strip_prefix(prefix))
        .filter(|v| !v.is_empty())
}

/// Recover a thread binding from ticket labels.
///
/// The notification channel defaults to the thread's channel and the
/// requester to unknown when their labels are absent.
///
/// # Errors
///
/// Returns `MissingContext` when no thread label is present, which is the case
/// for tickets that were not raised through Slack.
pub fn binding_from_labels(labels: &[String]) -> Result<ThreadBinding, IntakeError> {
    let thread_id: ThreadId = label_value(labels, THREAD_LABEL_PREFIX)
        .ok_or_else(|| IntakeError::MissingContext("ticket has no Slack thread label".to_string()))?
        .parse()?;

    let notification_channel_id = label_value(labels, NOTIFY_LABEL_PREFIX)
        .map_or_else(|| thread_id.channel_id.clone(), ToString::to_string);
    let slack_user_id = label_value(labels, USER_LABEL_PREFIX)
        .unwrap_or_default()
        .to_string();

    Ok(ThreadBinding {
        thread_id,
        notification_channel_id,
        slack_user_id,
    })
}
