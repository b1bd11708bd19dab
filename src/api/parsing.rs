//! Decoding of raw request bodies into typed [`InboundEvent`]s.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

use crate::core::events::{
    AdditionalData, InboundEvent, ModalValues, Shortcut, ViewSubmission,
};
use crate::errors::IntakeError;
use crate::slack::command_parser::{parse_form_data, parse_form_pairs};
use crate::tracker::webhook::decode_ticket_webhook;

pub fn is_interactive_body(body: &str) -> bool {
    body.starts_with("payload=") || body.contains("&payload=")
}

/// # Errors
///
/// Returns `ParseError` if the form body has no decodable `payload` JSON.
pub fn parse_interactive_payload(form_body: &str) -> Result<Value, IntakeError> {
    let mut pairs = parse_form_pairs(form_body)
        .map_err(|e| IntakeError::ParseError(format!("Failed to decode payload: {e}")))?;
    let raw = pairs
        .remove("payload")
        .ok_or_else(|| IntakeError::ParseError("Missing payload field".to_string()))?;

    serde_json::from_str(&raw)
        .map_err(|e| IntakeError::ParseError(format!("Invalid JSON payload: {e}")))
}

pub fn get_header_value<'a>(headers: &'a Value, name: &str) -> Option<&'a str> {
    if let Some(v) = headers.get(name).and_then(|s| s.as_str()) {
        return Some(v);
    }
    headers.as_object().and_then(|map| {
        map.iter().find_map(|(k, v)| {
            if k.eq_ignore_ascii_case(name) {
                v.as_str()
            } else {
                None
            }
        })
    })
}

// ============================================================================
// Slack interactive payloads
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum RawInteraction {
    Shortcut(RawShortcut),
    MessageAction(RawShortcut),
    ViewSubmission(RawViewSubmission),
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct RawId {
    id: String,
}

#[derive(Debug, Deserialize)]
struct RawMessage {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct RawShortcut {
    #[serde(default)]
    callback_id: String,
    trigger_id: Option<String>,
    user: RawId,
    channel: Option<RawId>,
    message: Option<RawMessage>,
}

#[derive(Debug, Deserialize)]
struct RawViewSubmission {
    user: RawId,
    view: RawView,
}

#[derive(Debug, Deserialize)]
struct RawView {
    #[serde(default)]
    callback_id: String,
    #[serde(default)]
    private_metadata: String,
    #[serde(default)]
    state: RawState,
}

#[derive(Debug, Default, Deserialize)]
struct RawState {
    #[serde(default)]
    values: HashMap<String, HashMap<String, RawInput>>,
}

#[derive(Debug, Deserialize)]
struct RawInput {
    value: Option<String>,
    selected_option: Option<RawSelected>,
}

#[derive(Debug, Deserialize)]
struct RawSelected {
    value: String,
}

impl RawState {
    fn input(&self, block_id: &str, action_id: &str) -> Option<&RawInput> {
        self.values.get(block_id)?.get(action_id)
    }

    fn text(&self, block_id: &str, action_id: &str) -> Option<String> {
        self.input(block_id, action_id)?.value.clone()
    }

    fn selected(&self, block_id: &str, action_id: &str) -> Option<String> {
        self.input(block_id, action_id)?
            .selected_option
            .as_ref()
            .map(|o| o.value.clone())
    }

    fn modal_values(&self) -> ModalValues {
        ModalValues {
            title: self.text("title_input", "title"),
            description: self.text("description_input", "description"),
            priority: self.selected("priority_input", "priority"),
            category: self.selected("category_input", "category"),
        }
    }
}

fn shortcut(raw: RawShortcut) -> InboundEvent {
    InboundEvent::Shortcut(Shortcut {
        callback_id: raw.callback_id,
        trigger_id: raw.trigger_id,
        user_id: raw.user.id,
        channel_id: raw.channel.map(|c| c.id),
        message_text: raw.message.map(|m| m.text),
    })
}

/// Decode a Slack interactive payload.
///
/// Returns `Ok(None)` for interaction types no flow consumes (for example
/// `block_actions`).
///
/// # Errors
///
/// Returns `ParseError` when a known interaction type is missing required
/// fields.
pub fn decode_interactive(payload: &Value) -> Result<Option<InboundEvent>, IntakeError> {
    let raw = RawInteraction::deserialize(payload)
        .map_err(|e| IntakeError::ParseError(format!("Invalid interactive payload: {e}")))?;

    Ok(match raw {
        RawInteraction::Shortcut(s) | RawInteraction::MessageAction(s) => Some(shortcut(s)),
        RawInteraction::ViewSubmission(v) => {
            let metadata = v.view.private_metadata.trim();
            Some(InboundEvent::ViewSubmission(ViewSubmission {
                callback_id: v.view.callback_id,
                user_id: v.user.id,
                private_metadata: (!metadata.is_empty()).then(|| metadata.to_string()),
                values: v.view.state.modal_values(),
            }))
        }
        RawInteraction::Other => None,
    })
}

// ============================================================================
// Slash commands and Jira webhooks
// ============================================================================

/// # Errors
///
/// Returns `ParseError` if the form body cannot be decoded.
pub fn decode_slash_command(body: &str) -> Result<InboundEvent, IntakeError> {
    parse_form_data(body)
        .map(InboundEvent::SlashCommand)
        .map_err(|e| IntakeError::ParseError(format!("Failed to parse form data: {e}")))
}

/// Decode a Jira webhook body. The raw JSON rides along as additional data.
///
/// # Errors
///
/// Returns `ParseError` if the body is not JSON or not an issue event.
pub fn decode_ticket_webhook_body(
    body: &str,
) -> Result<(InboundEvent, AdditionalData), IntakeError> {
    let raw: Value = serde_json::from_str(body)
        .map_err(|e| IntakeError::ParseError(format!("Invalid JSON webhook: {e}")))?;
    let change = decode_ticket_webhook(&raw)?;

    Ok((
        InboundEvent::TicketChanged(change),
        AdditionalData::TicketWebhook(raw),
    ))
}
