//! Typed inbound events.
//!
//! Slack and Jira payloads are decoded into these structures at the HTTP
//! boundary (see `api::parsing`). The dispatcher only moves them around; the
//! concrete flow is the one that reads their fields.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A `/command` invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlashCommand {
    pub command: String,
    pub text: String,
    pub trigger_id: String,
    pub user_id: String,
    pub channel_id: String,
    pub response_url: String,
}

/// A global or message shortcut.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shortcut {
    pub callback_id: String,
    pub trigger_id: Option<String>,
    pub user_id: String,
    pub channel_id: Option<String>,
    /// Text of the message the shortcut was invoked on, if any.
    pub message_text: Option<String>,
}

/// Values captured by the intake modal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModalValues {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewSubmission {
    pub callback_id: String,
    pub user_id: String,
    pub private_metadata: Option<String>,
    pub values: ModalValues,
}

/// Point-in-time view of a ticket as reported by the tracker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketSnapshot {
    pub key: String,
    pub summary: String,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub assignee: Option<String>,
    pub components: Vec<String>,
    pub labels: Vec<String>,
    /// The ticket no longer exists in the tracker.
    #[serde(default)]
    pub deleted: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketChange {
    pub webhook_event: String,
    pub issue: TicketSnapshot,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InboundEvent {
    SlashCommand(SlashCommand),
    Shortcut(Shortcut),
    ViewSubmission(ViewSubmission),
    TicketChanged(TicketChange),
}

impl InboundEvent {
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SlashCommand(_) => "slash_command",
            Self::Shortcut(_) => "shortcut",
            Self::ViewSubmission(_) => "view_submission",
            Self::TicketChanged(_) => "ticket_changed",
        }
    }

    #[must_use]
    pub fn trigger_id(&self) -> Option<&str> {
        let id = match self {
            Self::SlashCommand(c) => Some(c.trigger_id.as_str()),
            Self::Shortcut(s) => s.trigger_id.as_deref(),
            Self::ViewSubmission(_) | Self::TicketChanged(_) => None,
        };
        id.filter(|id| !id.is_empty())
    }

    #[must_use]
    pub fn user_id(&self) -> Option<&str> {
        let id = match self {
            Self::SlashCommand(c) => Some(c.user_id.as_str()),
            Self::Shortcut(s) => Some(s.user_id.as_str()),
            Self::ViewSubmission(v) => Some(v.user_id.as_str()),
            Self::TicketChanged(_) => None,
        };
        id.filter(|id| !id.is_empty())
    }

    /// The channel the event originated in.
    #[must_use]
    pub fn channel_id(&self) -> Option<&str> {
        let id = match self {
            Self::SlashCommand(c) => Some(c.channel_id.as_str()),
            Self::Shortcut(s) => s.channel_id.as_deref(),
            Self::ViewSubmission(_) | Self::TicketChanged(_) => None,
        };
        id.filter(|id| !id.is_empty())
    }

    /// Free text carried by the trigger.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::SlashCommand(c) => Some(c.text.as_str()),
            Self::Shortcut(s) => s.message_text.as_deref(),
            Self::ViewSubmission(_) | Self::TicketChanged(_) => None,
        }
    }
}

/// Out-of-band context carried alongside an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum AdditionalData {
    DefaultText(String),
    TicketWebhook(Value),
}

impl AdditionalData {
    #[must_use]
    pub fn default_text(&self) -> Option<&str> {
        match self {
            Self::DefaultText(text) => Some(text),
            Self::TicketWebhook(_) => None,
        }
    }

    #[must_use]
    pub fn ticket_webhook(&self) -> Option<&Value> {
        match self {
            Self::TicketWebhook(raw) => Some(raw),
            Self::DefaultText(_) => None,
        }
    }
}
