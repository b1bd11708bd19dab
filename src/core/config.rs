use std::env;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::IntakeError;

/// Where conversations about a new request are allowed to happen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationRestriction {
    /// Every request is discussed in the primary channel.
    Primary,
    /// Requests are discussed where they were raised.
    #[default]
    None,
}

impl FromStr for ConversationRestriction {
    type Err = IntakeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "primary" | "primary_only" => Ok(Self::Primary),
            "" | "none" | "anywhere" => Ok(Self::None),
            other => Err(IntakeError::ConfigurationError(format!(
                "SLACK_CONVERSATION_RESTRICTION: unknown policy '{other}'"
            ))),
        }
    }
}

/// A selectable option in the intake modal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModalOption {
    pub text: String,
    pub value: String,
}

impl ModalOption {
    fn same(s: &str) -> Self {
        Self {
            text: s.to_string(),
            value: s.to_string(),
        }
    }
}

/// Layout knobs for the intake modal, read from `SUBMIT_MODAL_CONFIG`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubmitModalConfig {
    pub title: String,
    pub submit_label: String,
    pub priorities: Vec<ModalOption>,
    pub categories: Vec<ModalOption>,
    pub initial_priority: Option<String>,
}

impl Default for SubmitModalConfig {
    fn default() -> Self {
        Self {
            title: "Submit a request".to_string(),
            submit_label: "Submit".to_string(),
            priorities: ["P1", "P2", "P3", "P4"]
                .iter()
                .map(|p| ModalOption::same(p))
                .collect(),
            categories: ["hardware", "software", "access", "other"]
                .iter()
                .map(|c| ModalOption::same(c))
                .collect(),
            initial_priority: Some("P3".to_string()),
        }
    }
}

impl SubmitModalConfig {
    /// # Errors
    ///
    /// Returns an error if `raw` is not valid JSON for this shape.
    pub fn from_json(raw: &str) -> Result<Self, IntakeError> {
        serde_json::from_str(raw).map_err(|e| {
            IntakeError::ConfigurationError(format!("SUBMIT_MODAL_CONFIG: {e}"))
        })
    }
}

#[derive(Debug, Clone)]
pub struct JiraConfig {
    pub host: String,
    pub username: String,
    pub api_token: String,
    pub project_key: String,
    pub issue_type: String,
    pub webhook_secret: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub slack_signing_secret: String,
    pub slack_bot_token: String,
    pub slack_primary_channel: Option<String>,
    pub slack_conversation_restriction: ConversationRestriction,
    pub slack_submit_command: String,
    pub submit_modal_config: SubmitModalConfig,
    pub processing_queue_url: Option<String>,
    pub jira: JiraConfig,
}

fn required(key: &str) -> Result<String, IntakeError> {
    env::var(key).map_err(|e| IntakeError::ConfigurationError(format!("{key}: {e}")))
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl AppConfig {
    /// # Errors
    ///
    /// Returns an error when a required variable is missing or an optional one
    /// cannot be parsed.
    pub fn from_env() -> Result<Self, IntakeError> {
        let slack_conversation_restriction = optional("SLACK_CONVERSATION_RESTRICTION")
            .map(|raw| raw.parse())
            .transpose()?
            .unwrap_or_default();

        let submit_modal_config = optional("SUBMIT_MODAL_CONFIG")
            .map(|raw| SubmitModalConfig::from_json(&raw))
            .transpose()?
            .unwrap_or_default();

        Ok(Self {
            slack_signing_secret: required("SLACK_SIGNING_SECRET")?,
            slack_bot_token: required("SLACK_BOT_TOKEN")?,
            slack_primary_channel: optional("SLACK_PRIMARY_CHANNEL"),
            slack_conversation_restriction,
            slack_submit_command: optional("SLACK_SUBMIT_COMMAND")
                .unwrap_or_else(|| "/submit".to_string()),
            submit_modal_config,
            processing_queue_url: optional("PROCESSING_QUEUE_URL"),
            jira: JiraConfig {
                host: required("JIRA_HOST")?,
                username: required("JIRA_USERNAME")?,
                api_token: required("JIRA_API_TOKEN")?,
                project_key: required("JIRA_PROJECT_KEY")?,
                issue_type: optional("JIRA_ISSUE_TYPE").unwrap_or_else(|| "Task".to_string()),
                webhook_secret: optional("JIRA_WEBHOOK_SECRET"),
            },
        })
    }
}
