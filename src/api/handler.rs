//! API Lambda handler - thin router in front of the flow engine.
//!
//! This module handles:
//! - Request validation (headers, body, Slack signature)
//! - Jira webhooks (required shared-secret token instead of a Slack signature)
//! - Decoding interactive payloads and slash commands into typed events
//! - Dispatching to the engine and turning its outcome into Slack's ack

use lambda_runtime::{Error, LambdaEvent};
use serde_json::{Value, json};
use tracing::{error, info, warn};

use super::{helpers, parsing, signature};
use crate::core::config::AppConfig;
use crate::core::context::{api_launcher, build_engine};
use crate::core::events::{AdditionalData, InboundEvent};
use crate::errors::IntakeError;
use crate::flows::{DispatchOutcome, FlowEngine};
use crate::slack::modal_builder::{SUBMIT_CALLBACK_ID, validate_view_submission};

/// Long-lived state shared by every invocation of the API Lambda.
pub struct ApiState {
    pub config: AppConfig,
    pub engine: FlowEngine,
}

impl ApiState {
    /// # Errors
    ///
    /// Returns an error if configuration is incomplete or the engine cannot be
    /// wired.
    pub fn from_env() -> Result<Self, IntakeError> {
        let config = AppConfig::from_env()?;
        let engine = build_engine(&config, api_launcher(&config)?)?;
        Ok(Self { config, engine })
    }
}

/// Lambda handler for the API entrypoint.
///
/// # Errors
///
/// Never fails on bad input: malformed or unsigned requests get a 4xx payload;
/// everything else is acknowledged with a 200.
#[tracing::instrument(level = "info", skip_all)]
pub async fn function_handler(state: &ApiState, event: LambdaEvent<Value>) -> Result<Value, Error> {
    let payload = &event.payload;

    let Some(headers) = payload.get("headers") else {
        error!("Request missing headers");
        return Ok(helpers::err_response(400, "Missing headers"));
    };

    let body = match extract_body(payload) {
        Ok(b) => b,
        Err(response) => return Ok(response),
    };

    let path = payload
        .get("rawPath")
        .and_then(Value::as_str)
        .or_else(|| payload.get("path").and_then(Value::as_str))
        .unwrap_or("");

    if path.ends_with("/jira/webhook") {
        return Ok(handle_jira_webhook(state, payload, body).await);
    }

    if let Err(response) = verify_signature(body, headers, &state.config) {
        return Ok(response);
    }

    if parsing::is_interactive_body(body) {
        return Ok(handle_interactive(state, body).await);
    }

    match parsing::decode_slash_command(body) {
        Ok(event) => Ok(ack(dispatch(state, event, None).await)),
        Err(e) => {
            error!("Failed to parse slash command: {}", e);
            Ok(helpers::err_response(400, &format!("Parse Error: {e}")))
        }
    }
}

async fn dispatch(
    state: &ApiState,
    event: InboundEvent,
    additional: Option<AdditionalData>,
) -> DispatchOutcome {
    let outcome = state.engine.dispatch(event, additional).await;
    info!(?outcome, "Dispatch finished");
    outcome
}

/// Slack only needs a 200. A failed hand-off is the one case worth telling
/// the user about, since nothing else will happen.
fn ack(outcome: DispatchOutcome) -> Value {
    match outcome {
        DispatchOutcome::Handled {
            acknowledged: true,
            launched: false,
            ..
        } => helpers::ok_ephemeral("Sorry, I couldn't start that request. Please try again."),
        _ => helpers::ok_empty(),
    }
}

async fn handle_interactive(state: &ApiState, body: &str) -> Value {
    let payload = match parsing::parse_interactive_payload(body) {
        Ok(v) => v,
        Err(e) => {
            error!("Interactive payload parse error: {}", e);
            return helpers::err_response(400, &format!("Parse Error: {e}"));
        }
    };

    if payload.get("type").and_then(Value::as_str) == Some("view_submission")
        && payload.pointer("/view/callback_id").and_then(Value::as_str) == Some(SUBMIT_CALLBACK_ID)
        && let Some(view) = payload.get("view")
        && let Err(errors) = validate_view_submission(view)
    {
        return helpers::ok_modal_errors(&Value::Object(errors));
    }

    match parsing::decode_interactive(&payload) {
        Ok(Some(event)) => {
            // View submissions must not get an ephemeral body back.
            let is_submission = matches!(event, InboundEvent::ViewSubmission(_));
            let outcome = dispatch(state, event, None).await;
            if is_submission {
                helpers::ok_empty()
            } else {
                ack(outcome)
            }
        }
        Ok(None) => {
            let kind = payload.get("type").and_then(Value::as_str).unwrap_or("");
            info!("Unhandled interactive type: {}", kind);
            helpers::ok_empty()
        }
        Err(e) => {
            error!("Interactive payload decode error: {}", e);
            helpers::err_response(400, &format!("Parse Error: {e}"))
        }
    }
}

async fn handle_jira_webhook(state: &ApiState, payload: &Value, body: &str) -> Value {
    let Some(secret) = state.config.jira.webhook_secret.as_deref() else {
        error!("Jira webhook rejected: JIRA_WEBHOOK_SECRET is not configured");
        return helpers::err_response(401, "Webhook secret not configured");
    };

    let token = payload
        .pointer("/queryStringParameters/token")
        .and_then(Value::as_str)
        .unwrap_or("");
    if !signature::verify_shared_token(token, secret) {
        warn!("Jira webhook rejected: bad token");
        return helpers::err_response(401, "Invalid webhook token");
    }

    match parsing::decode_ticket_webhook_body(body) {
        Ok((event, additional)) => {
            let outcome = dispatch(state, event, Some(additional)).await;
            json!({
                "statusCode": 200,
                "body": json!({ "handled": outcome.is_handled() }).to_string()
            })
        }
        Err(e) => {
            error!("Jira webhook decode error: {}", e);
            helpers::err_response(400, &format!("Parse Error: {e}"))
        }
    }
}

// ============================================================================
// Request Validation Helpers
// ============================================================================

fn extract_body(payload: &Value) -> Result<&str, Value> {
    let Some(body) = payload.get("body") else {
        error!("Request missing body");
        return Err(helpers::err_response(400, "Missing body"));
    };

    let Some(body_str) = body.as_str() else {
        error!("Request body is not a string");
        return Err(helpers::err_response(400, "Invalid body format"));
    };

    Ok(body_str)
}

fn verify_signature(body: &str, headers: &Value, config: &AppConfig) -> Result<(), Value> {
    let Some(sig) = parsing::get_header_value(headers, "X-Slack-Signature") else {
        error!("Missing X-Slack-Signature header");
        return Err(helpers::err_response(
            401,
            "Missing X-Slack-Signature header",
        ));
    };

    let Some(timestamp) = parsing::get_header_value(headers, "X-Slack-Request-Timestamp") else {
        error!("Missing X-Slack-Request-Timestamp header");
        return Err(helpers::err_response(
            401,
            "Missing X-Slack-Request-Timestamp header",
        ));
    };

    if !signature::verify_slack_signature(body, timestamp, sig, &config.slack_signing_secret) {
        error!("Slack signature verification failed");
        return Err(helpers::err_response(401, "Invalid Slack signature"));
    }

    Ok(())
}
