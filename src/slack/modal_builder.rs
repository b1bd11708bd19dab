use serde_json::{Map, Value, json};

use crate::core::config::{ModalOption, SubmitModalConfig};
use crate::core::models::ModalParams;

/// `callback_id` of the intake modal, and the default shortcut callback.
pub const SUBMIT_CALLBACK_ID: &str = "submit_request";

/// Jira rejects summaries longer than this.
pub const MAX_TITLE_LEN: usize = 255;

// Slack caps modal titles and button labels at 24 characters.
const MAX_HEADER_LEN: usize = 24;

fn plain_text(text: &str) -> Value {
    json!({ "type": "plain_text", "text": text })
}

fn header_text(text: &str) -> Value {
    plain_text(&text.chars().take(MAX_HEADER_LEN).collect::<String>())
}

fn option(o: &ModalOption) -> Value {
    json!({ "text": plain_text(&o.text), "value": o.value })
}

fn static_select(action_id: &str, options: &[ModalOption], initial: Option<&str>) -> Value {
    let mut element = json!({
        "type": "static_select",
        "action_id": action_id,
        "options": options.iter().map(option).collect::<Vec<_>>(),
    });

    if let Some(selected) = initial.and_then(|v| options.iter().find(|o| o.value == v)) {
        element["initial_option"] = option(selected);
    }

    element
}

/// Build the Block Kit modal that collects a new request.
///
/// The originating channel travels in `private_metadata` so the submission
/// knows where the request was raised.
#[must_use]
pub fn build_request_modal(params: &ModalParams, config: &SubmitModalConfig) -> Value {
    let mut blocks = vec![
        json!({
            "type": "input",
            "block_id": "title_input",
            "label": plain_text("Title"),
            "element": {
                "type": "plain_text_input",
                "action_id": "title",
                "initial_value": params.title,
                "max_length": MAX_TITLE_LEN
            }
        }),
        json!({
            "type": "input",
            "block_id": "description_input",
            "optional": true,
            "label": plain_text("Description"),
            "element": { "type": "plain_text_input", "action_id": "description", "multiline": true }
        }),
    ];

    if !config.priorities.is_empty() {
        blocks.push(json!({
            "type": "input",
            "block_id": "priority_input",
            "label": plain_text("Priority"),
            "element": static_select("priority", &config.priorities, config.initial_priority.as_deref())
        }));
    }

    if !config.categories.is_empty() {
        blocks.push(json!({
            "type": "input",
            "block_id": "category_input",
            "optional": true,
            "label": plain_text("Category"),
            "element": static_select("category", &config.categories, None)
        }));
    }

    json!({
        "type": "modal",
        "callback_id": SUBMIT_CALLBACK_ID,
        "private_metadata": params.channel_id,
        "title": header_text(&config.title),
        "submit": header_text(&config.submit_label),
        "close": plain_text("Cancel"),
        "blocks": blocks
    })
}

/// Minimal validation for intake `view_submission` payloads.
/// Returns a map of `block_id -> error` suitable for Slack's interactive response.
///
/// # Errors
///
/// Returns a map of field errors when validation fails; otherwise returns `Ok(())`.
pub fn validate_view_submission(view: &Value) -> Result<(), Map<String, Value>> {
    let mut errors = Map::new();

    let title = view
        .pointer("/state/values/title_input/title/value")
        .and_then(Value::as_str)
        .unwrap_or("");

    if title.trim().is_empty() {
        errors.insert(
            "title_input".to_string(),
            Value::String("Please give the request a title.".to_string()),
        );
    } else if title.chars().count() > MAX_TITLE_LEN {
        errors.insert(
            "title_input".to_string(),
            Value::String(format!("Titles are limited to {MAX_TITLE_LEN} characters.")),
        );
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}
