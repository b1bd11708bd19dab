mod common;

use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use common::{Failures, SIGNING_SECRET, app_config, intake_flow, settings};
use intake::api::signature::compute_signature;
use intake::api::{ApiState, handler};
use intake::errors::IntakeError;
use intake::flows::{FlowAction, FlowEngine, SlowResponseJob, SlowResponseLauncher};
use lambda_runtime::{Context, LambdaEvent};
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use serde_json::{Value, json};

const WEBHOOK_SECRET: &str = "jira-shared-token";

/// Records the actions handed off instead of running them.
#[derive(Default)]
struct RecordingLauncher {
    actions: Mutex<Vec<FlowAction>>,
    fail: bool,
}

#[async_trait]
impl SlowResponseLauncher for RecordingLauncher {
    async fn launch(&self, job: SlowResponseJob) -> Result<(), IntakeError> {
        if self.fail {
            return Err(IntakeError::AwsError("queue unavailable".into()));
        }
        self.actions.lock().unwrap().push(job.action);
        Ok(())
    }
}

fn state(webhook_secret: Option<&str>, launcher: Arc<RecordingLauncher>) -> ApiState {
    let (flow, _) = intake_flow(settings(Some("C1")), Failures::default());
    ApiState {
        config: app_config(webhook_secret),
        engine: FlowEngine::new(launcher).with_flow(Arc::new(flow)),
    }
}

fn now() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
        .to_string()
}

fn signed_request(body: &str) -> Value {
    let ts = now();
    let sig = compute_signature(&ts, body, SIGNING_SECRET);
    json!({
        "rawPath": "/slack/events",
        "headers": {
            "x-slack-signature": sig,
            "x-slack-request-timestamp": ts,
            "content-type": "application/x-www-form-urlencoded"
        },
        "body": body
    })
}

fn interactive_body(payload: &Value) -> String {
    format!(
        "payload={}",
        utf8_percent_encode(&payload.to_string(), NON_ALPHANUMERIC)
    )
}

fn submission_payload(title: &str) -> Value {
    json!({
        "type": "view_submission",
        "user": { "id": "U1" },
        "view": {
            "callback_id": "submit_request",
            "private_metadata": "C2",
            "state": { "values": {
                "title_input": { "title": { "type": "plain_text_input", "value": title } }
            } }
        }
    })
}

fn jira_request(token: Option<&str>) -> Value {
    let body = json!({
        "webhookEvent": "jira:issue_updated",
        "issue": { "key": "HELP-3", "fields": { "summary": "VPN", "labels": [] } }
    })
    .to_string();
    let mut request = json!({
        "rawPath": "/jira/webhook",
        "headers": { "content-type": "application/json" },
        "body": body
    });
    if let Some(token) = token {
        request["queryStringParameters"] = json!({ "token": token });
    }
    request
}

async fn call(state: &ApiState, payload: Value) -> Value {
    handler(state, LambdaEvent::new(payload, Context::default()))
        .await
        .unwrap()
}

#[tokio::test]
async fn unsigned_requests_are_rejected() {
    let launcher = Arc::new(RecordingLauncher::default());
    let state = state(Some(WEBHOOK_SECRET), launcher.clone());

    let unsigned = json!({ "headers": {}, "body": "command=%2Fsubmit" });
    assert_eq!(call(&state, unsigned).await["statusCode"], 401);

    let mut forged = signed_request("command=%2Fsubmit&trigger_id=T1&user_id=U1");
    forged["body"] = json!("command=%2Fsubmit&trigger_id=T2&user_id=U9");
    assert_eq!(call(&state, forged).await["statusCode"], 401);

    assert!(launcher.actions.lock().unwrap().is_empty());
}

#[tokio::test]
async fn missing_body_is_a_bad_request() {
    let state = state(None, Arc::new(RecordingLauncher::default()));
    let response = call(&state, json!({ "headers": {} })).await;
    assert_eq!(response["statusCode"], 400);
}

#[tokio::test]
async fn slash_command_is_acked_and_handed_off() {
    let launcher = Arc::new(RecordingLauncher::default());
    let state = state(None, launcher.clone());

    let request = signed_request("command=%2Fsubmit&text=vpn+down&trigger_id=T1&user_id=U1&channel_id=C5");
    let response = call(&state, request).await;

    assert_eq!(response, json!({ "statusCode": 200, "body": "" }));
    assert_eq!(*launcher.actions.lock().unwrap(), vec![FlowAction::OpenModal]);
}

#[tokio::test]
async fn failed_hand_off_tells_the_user() {
    let launcher = Arc::new(RecordingLauncher {
        fail: true,
        ..RecordingLauncher::default()
    });
    let state = state(None, launcher);

    let request = signed_request("command=%2Fsubmit&trigger_id=T1&user_id=U1&channel_id=C5");
    let response = call(&state, request).await;

    assert_eq!(response["statusCode"], 200);
    let body: Value = serde_json::from_str(response["body"].as_str().unwrap()).unwrap();
    assert_eq!(body["response_type"], "ephemeral");
}

#[tokio::test]
async fn blank_title_returns_modal_errors_without_launching() {
    let launcher = Arc::new(RecordingLauncher::default());
    let state = state(None, launcher.clone());

    let request = signed_request(&interactive_body(&submission_payload("   ")));
    let response = call(&state, request).await;

    assert_eq!(response["statusCode"], 200);
    let body: Value = serde_json::from_str(response["body"].as_str().unwrap()).unwrap();
    assert_eq!(body["response_action"], "errors");
    assert!(body["errors"]["title_input"].is_string());
    assert!(launcher.actions.lock().unwrap().is_empty());
}

#[tokio::test]
async fn valid_submission_closes_modal_and_launches_once() {
    let launcher = Arc::new(RecordingLauncher::default());
    let state = state(None, launcher.clone());

    let request = signed_request(&interactive_body(&submission_payload("Printer broken")));
    let response = call(&state, request).await;

    assert_eq!(response, json!({ "statusCode": 200, "body": "" }));
    assert_eq!(*launcher.actions.lock().unwrap(), vec![FlowAction::ModalSubmitted]);
}

#[tokio::test]
async fn unconsumed_interaction_is_acked() {
    let launcher = Arc::new(RecordingLauncher::default());
    let state = state(None, launcher.clone());

    let payload = json!({ "type": "block_actions", "actions": [] });
    let response = call(&state, signed_request(&interactive_body(&payload))).await;

    assert_eq!(response, json!({ "statusCode": 200, "body": "" }));
    assert!(launcher.actions.lock().unwrap().is_empty());
}

#[tokio::test]
async fn jira_webhook_is_refused_without_a_configured_secret() {
    let launcher = Arc::new(RecordingLauncher::default());
    let state = state(None, launcher.clone());

    let response = call(&state, jira_request(Some("anything"))).await;
    assert_eq!(response["statusCode"], 401);

    let response = call(&state, jira_request(None)).await;
    assert_eq!(response["statusCode"], 401);
    assert!(launcher.actions.lock().unwrap().is_empty());
}

#[tokio::test]
async fn jira_webhook_needs_the_shared_token() {
    let launcher = Arc::new(RecordingLauncher::default());
    let state = state(Some(WEBHOOK_SECRET), launcher.clone());

    let response = call(&state, jira_request(Some("jira-shared-tokem"))).await;
    assert_eq!(response["statusCode"], 401);
    let response = call(&state, jira_request(None)).await;
    assert_eq!(response["statusCode"], 401);
    assert!(launcher.actions.lock().unwrap().is_empty());

    let response = call(&state, jira_request(Some(WEBHOOK_SECRET))).await;
    assert_eq!(response["statusCode"], 200);
    assert_eq!(response["body"], r#"{"handled":true}"#);
    assert_eq!(*launcher.actions.lock().unwrap(), vec![FlowAction::TicketChanged]);
}
