//! Response builders shared by the API handlers.

use serde_json::{Value, json};

/// Returns a 200 OK response with an empty body. Slack treats this as an ack
/// and, for view submissions, closes the modal.
#[must_use]
pub fn ok_empty() -> Value {
    json!({ "statusCode": 200, "body": "" })
}

/// Returns a 200 OK response with an ephemeral Slack message.
#[must_use]
pub fn ok_ephemeral(text: &str) -> Value {
    json!({
        "statusCode": 200,
        "body": json!({ "response_type": "ephemeral", "text": text }).to_string()
    })
}

/// Returns a 200 OK response with modal validation errors.
#[must_use]
pub fn ok_modal_errors(errors: &Value) -> Value {
    json!({
        "statusCode": 200,
        "body": json!({ "response_action": "errors", "errors": errors }).to_string()
    })
}

/// Returns an error response with the given status code and message.
#[must_use]
pub fn err_response(status_code: u16, message: &str) -> Value {
    json!({
        "statusCode": status_code,
        "body": json!({ "error": message }).to_string()
    })
}
