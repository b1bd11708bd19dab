use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::events::{AdditionalData, InboundEvent};
use crate::errors::IntakeError;
use crate::flows::FlowAction;

/// Intent captured from a modal submission, before any ticket exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestParams {
    pub slack_user_id: String,
    pub title: String,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub category: Option<String>,
}

/// Values used to pre-fill the intake modal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModalParams {
    pub slack_user_id: String,
    pub title: String,
    pub channel_id: String,
}

/// Identity of a Slack thread: the channel plus the root message's `ts`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ThreadId {
    pub channel_id: String,
    pub ts: String,
}

impl ThreadId {
    #[must_use]
    pub fn new(channel_id: impl Into<String>, ts: impl Into<String>) -> Self {
        Self {
            channel_id: channel_id.into(),
            ts: ts.into(),
        }
    }
}

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.channel_id, self.ts)
    }
}

impl FromStr for ThreadId {
    type Err = IntakeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((channel, ts)) if !channel.is_empty() && !ts.is_empty() => {
                Ok(Self::new(channel, ts))
            }
            _ => Err(IntakeError::ParseError(format!("invalid thread id '{s}'"))),
        }
    }
}

/// Everything a request needs to know about where it lives in Slack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadBinding {
    pub thread_id: ThreadId,
    pub notification_channel_id: String,
    pub slack_user_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostedMessage {
    pub channel_id: String,
    pub ts: String,
}

/// Slow-phase work handed from the API Lambda to the worker over SQS.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingTask {
    pub correlation_id: String,
    pub flow: String,
    pub action: FlowAction,
    pub event: InboundEvent,
    pub additional: Option<AdditionalData>,
}
