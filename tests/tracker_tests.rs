mod common;

use std::sync::Arc;

use intake::core::config::JiraConfig;
use intake::core::events::{AdditionalData, InboundEvent, SlashCommand, TicketSnapshot};
use intake::core::models::{RequestParams, ThreadBinding, ThreadId};
use intake::errors::IntakeError;
use intake::flows::collaborators::{FlowOrchestrator, RequestFactory};
use intake::tracker::jira::issue_payload;
use intake::tracker::request::{render_notification, render_thread_root};
use intake::tracker::webhook::{binding_from_labels, binding_labels, decode_ticket_webhook};
use intake::tracker::{JiraClient, JiraFlowOrchestrator, JiraRequestFactory};
use serde_json::json;

fn jira() -> Arc<JiraClient> {
    Arc::new(JiraClient::new(JiraConfig {
        host: "acme.atlassian.net".into(),
        username: "bot@acme.test".into(),
        api_token: "token".into(),
        project_key: "HELP".into(),
        issue_type: "Task".into(),
        webhook_secret: None,
    }))
}

fn binding() -> ThreadBinding {
    ThreadBinding {
        thread_id: ThreadId::new("C2", "1700000000.000100"),
        notification_channel_id: "C1".into(),
        slack_user_id: "U1".into(),
    }
}

fn webhook() -> serde_json::Value {
    json!({
        "webhookEvent": "jira:issue_updated",
        "issue": {
            "id": "10001",
            "key": "HELP-42",
            "fields": {
                "summary": "Printer broken",
                "status": { "name": "In Progress" },
                "priority": { "name": "P2" },
                "assignee": { "displayName": "Dana Ops" },
                "components": [{ "name": "hardware" }],
                "labels": [
                    "slack-thread:C2:1700000000.000100",
                    "slack-notify:C1",
                    "slack-user:U1",
                    "triaged"
                ]
            }
        }
    })
}

#[test]
fn binding_survives_the_label_scheme() {
    let labels = binding_labels(&binding());
    assert_eq!(
        labels,
        vec![
            "slack-thread:C2:1700000000.000100",
            "slack-notify:C1",
            "slack-user:U1",
        ]
    );
    assert_eq!(binding_from_labels(&labels).unwrap(), binding());
}

#[test]
fn binding_defaults_when_only_thread_label_present() {
    let labels = vec!["slack-thread:C7:1.2".to_string()];
    let binding = binding_from_labels(&labels).unwrap();
    assert_eq!(binding.notification_channel_id, "C7");
    assert_eq!(binding.slack_user_id, "");

    let err = binding_from_labels(&["triaged".to_string()]).unwrap_err();
    assert!(matches!(err, IntakeError::MissingContext(_)));

    let err = binding_from_labels(&["slack-thread:no-ts".to_string()]).unwrap_err();
    assert!(matches!(err, IntakeError::ParseError(_)));
}

#[test]
fn decodes_issue_webhook() {
    let change = decode_ticket_webhook(&webhook()).unwrap();
    assert_eq!(change.webhook_event, "jira:issue_updated");
    assert_eq!(change.issue.key, "HELP-42");
    assert_eq!(change.issue.status.as_deref(), Some("In Progress"));
    assert_eq!(change.issue.assignee.as_deref(), Some("Dana Ops"));
    assert_eq!(change.issue.components, vec!["hardware"]);
    assert_eq!(change.issue.labels.len(), 4);

    assert!(decode_ticket_webhook(&json!({ "webhookEvent": "x" })).is_err());
}

#[test]
fn category_becomes_single_component() {
    let params = RequestParams {
        slack_user_id: "U1".into(),
        title: "Printer broken".into(),
        description: None,
        priority: Some("P2".into()),
        category: Some("hardware".into()),
    };
    let payload = issue_payload("HELP", "Task", &params, &binding_labels(&binding()));
    let fields = &payload["fields"];

    assert_eq!(fields["project"]["key"], "HELP");
    assert_eq!(fields["summary"], "Printer broken");
    assert_eq!(fields["priority"], json!({ "name": "P2" }));
    assert_eq!(fields["components"], json!([{ "name": "hardware" }]));
    assert!(fields.get("description").is_none());
    assert_eq!(fields["labels"][0], "slack-thread:C2:1700000000.000100");
}

#[test]
fn renders_thread_root_and_notification() {
    let ticket = TicketSnapshot {
        key: "HELP-42".into(),
        summary: "Printer broken".into(),
        status: Some("Done".into()),
        components: vec!["hardware".into()],
        ..Default::default()
    };
    let url = "https://acme.atlassian.net/browse/HELP-42";

    let root = render_thread_root(&binding(), &ticket, url);
    assert!(root.starts_with(":ticket: *<https://acme.atlassian.net/browse/HELP-42|HELP-42>*"));
    assert!(root.contains("Status: *Done*"));
    assert!(root.contains("Category: hardware"));
    assert!(root.ends_with("Requested by <@U1>"));

    let notice = render_notification(&binding(), &ticket, url);
    assert!(notice.contains("<#C2>"));
}

#[tokio::test]
async fn orchestrator_refreshes_thread_from_webhook() {
    let (messenger, log) = common::messenger();
    let orchestrator = JiraFlowOrchestrator::new(jira(), messenger);

    let event = InboundEvent::SlashCommand(SlashCommand::default());
    let extra = AdditionalData::TicketWebhook(webhook());
    let request = orchestrator
        .build_request_from_external_event(Some(&extra), &event)
        .await
        .unwrap();

    assert_eq!(request.ticket_key(), Some("HELP-42"));
    assert_eq!(request.binding(), &binding());

    request.update_slack_thread().await.unwrap();
    let calls = log.lock().unwrap();
    assert_eq!(calls.updates.len(), 1);
    let (channel, ts, text) = &calls.updates[0];
    assert_eq!(channel, "C2");
    assert_eq!(ts, "1700000000.000100");
    assert!(text.contains("https://acme.atlassian.net/browse/HELP-42"));
}

#[tokio::test]
async fn orchestrator_without_ticket_is_missing_context() {
    let (messenger, _) = common::messenger();
    let orchestrator = JiraFlowOrchestrator::new(jira(), messenger);

    let result = orchestrator
        .build_request_from_external_event(None, &InboundEvent::SlashCommand(SlashCommand::default()))
        .await;

    assert!(matches!(result, Err(IntakeError::MissingContext(_))));
}

#[tokio::test]
async fn fresh_request_has_nothing_to_render() {
    let (messenger, log) = common::messenger();
    let request = JiraRequestFactory::new(jira(), messenger).bind(binding());

    assert_eq!(request.ticket_key(), None);
    let result = request.update_slack_thread().await;
    assert!(matches!(result, Err(IntakeError::MissingContext(_))));
    assert_eq!(log.lock().unwrap().external_call_count(), 0);
}

#[tokio::test]
async fn deleted_ticket_marks_thread_without_link() {
    let mut raw = webhook();
    raw["webhookEvent"] = json!("jira:issue_deleted");
    let change = decode_ticket_webhook(&raw).unwrap();
    assert!(change.issue.deleted);
    assert!(!decode_ticket_webhook(&webhook()).unwrap().issue.deleted);

    let (messenger, log) = common::messenger();
    let orchestrator = JiraFlowOrchestrator::new(jira(), messenger);
    let request = orchestrator
        .build_request_from_external_event(None, &InboundEvent::TicketChanged(change))
        .await
        .unwrap();
    request.update_slack_thread().await.unwrap();

    let calls = log.lock().unwrap();
    let (channel, _, text) = &calls.updates[0];
    assert_eq!(channel, "C2");
    assert!(text.contains("deleted in Jira"));
    assert!(text.contains("HELP-42"));
    assert!(!text.contains("/browse/"));
    assert!(!text.contains("Status:"));
}
