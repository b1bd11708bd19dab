#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use intake::core::config::{AppConfig, ConversationRestriction, JiraConfig, SubmitModalConfig};
use intake::core::context::{IntakeContext, IntakeSettings};
use intake::core::events::{AdditionalData, InboundEvent};
use intake::core::models::{ModalParams, PostedMessage, RequestParams, ThreadBinding, ThreadId};
use intake::errors::IntakeError;
use intake::flows::IntakeFlow;
use intake::flows::collaborators::{
    FlowOrchestrator, Messenger, RequestFactory, RequestModal, ServiceRequest,
};

/// Every external call the fakes saw, in order per kind.
#[derive(Debug, Default)]
pub struct Calls {
    pub modal_shows: Vec<(String, ModalParams)>,
    pub posts: Vec<(String, String)>,
    pub updates: Vec<(String, String, String)>,
    pub bindings: Vec<ThreadBinding>,
    pub creates: Vec<(ThreadBinding, RequestParams)>,
    pub refreshes: Vec<ThreadBinding>,
}

impl Calls {
    pub fn external_call_count(&self) -> usize {
        self.modal_shows.len()
            + self.posts.len()
            + self.updates.len()
            + self.bindings.len()
            + self.creates.len()
            + self.refreshes.len()
    }
}

pub type Log = Arc<Mutex<Calls>>;

#[derive(Debug, Default, Clone, Copy)]
pub struct Failures {
    pub modal: bool,
    pub post: bool,
    pub create: bool,
    pub rebuild: bool,
}

pub struct FakeModal {
    log: Log,
    fail: bool,
}

#[async_trait]
impl RequestModal for FakeModal {
    async fn show(&self, trigger_id: &str, params: &ModalParams) -> Result<(), IntakeError> {
        self.log
            .lock()
            .unwrap()
            .modal_shows
            .push((trigger_id.to_string(), params.clone()));
        if self.fail {
            return Err(IntakeError::ApiError("views.open error: expired_trigger_id".into()));
        }
        Ok(())
    }
}

pub struct FakeMessenger {
    log: Log,
    fail: bool,
    counter: AtomicUsize,
}

impl FakeMessenger {
    fn next_ts(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        format!("1700000000.{n:06}")
    }
}

#[async_trait]
impl Messenger for FakeMessenger {
    async fn post_message(
        &self,
        channel_id: &str,
        text: &str,
    ) -> Result<PostedMessage, IntakeError> {
        self.log
            .lock()
            .unwrap()
            .posts
            .push((channel_id.to_string(), text.to_string()));
        if self.fail {
            return Err(IntakeError::ApiError("chat.postMessage error: not_in_channel".into()));
        }
        Ok(PostedMessage {
            channel_id: channel_id.to_string(),
            ts: self.next_ts(),
        })
    }

    async fn update_message(
        &self,
        channel_id: &str,
        ts: &str,
        text: &str,
    ) -> Result<(), IntakeError> {
        self.log.lock().unwrap().updates.push((
            channel_id.to_string(),
            ts.to_string(),
            text.to_string(),
        ));
        Ok(())
    }
}

pub struct FakeRequest {
    binding: ThreadBinding,
    key: Option<String>,
    log: Log,
    fail_create: bool,
}

#[async_trait]
impl ServiceRequest for FakeRequest {
    fn binding(&self) -> &ThreadBinding {
        &self.binding
    }

    fn ticket_key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    async fn create(&mut self, params: &RequestParams) -> Result<(), IntakeError> {
        self.log
            .lock()
            .unwrap()
            .creates
            .push((self.binding.clone(), params.clone()));
        if self.fail_create {
            return Err(IntakeError::TrackerError("create issue HTTP 400".into()));
        }
        self.key = Some("HELP-1".to_string());
        Ok(())
    }

    async fn update_slack_thread(&self) -> Result<(), IntakeError> {
        self.log.lock().unwrap().refreshes.push(self.binding.clone());
        Ok(())
    }
}

pub struct FakeFactory {
    log: Log,
    fail_create: bool,
}

impl RequestFactory for FakeFactory {
    fn bind(&self, binding: ThreadBinding) -> Box<dyn ServiceRequest> {
        self.log.lock().unwrap().bindings.push(binding.clone());
        Box::new(FakeRequest {
            binding,
            key: None,
            log: Arc::clone(&self.log),
            fail_create: self.fail_create,
        })
    }
}

pub struct FakeOrchestrator {
    log: Log,
    fail: bool,
}

#[async_trait]
impl FlowOrchestrator for FakeOrchestrator {
    async fn build_request_from_external_event(
        &self,
        _additional: Option<&AdditionalData>,
        event: &InboundEvent,
    ) -> Result<Box<dyn ServiceRequest>, IntakeError> {
        let InboundEvent::TicketChanged(change) = event else {
            return Err(IntakeError::MissingContext("not a ticket event".into()));
        };
        if self.fail {
            return Err(IntakeError::MissingContext("ticket has no Slack thread label".into()));
        }
        Ok(Box::new(FakeRequest {
            binding: ThreadBinding {
                thread_id: ThreadId::new("C2", "1700000000.000001"),
                notification_channel_id: "C1".into(),
                slack_user_id: "U1".into(),
            },
            key: Some(change.issue.key.clone()),
            log: Arc::clone(&self.log),
            fail_create: false,
        }))
    }
}

pub fn settings(primary: Option<&str>) -> IntakeSettings {
    IntakeSettings {
        primary_channel: primary.map(ToString::to_string),
        ..IntakeSettings::default()
    }
}

/// An intake flow wired to recording fakes.
pub fn intake_flow(settings: IntakeSettings, failures: Failures) -> (IntakeFlow, Log) {
    let log: Log = Arc::default();
    let ctx = IntakeContext {
        settings,
        modal: Arc::new(FakeModal {
            log: Arc::clone(&log),
            fail: failures.modal,
        }),
        messenger: Arc::new(FakeMessenger {
            log: Arc::clone(&log),
            fail: failures.post,
            counter: AtomicUsize::new(0),
        }),
        requests: Arc::new(FakeFactory {
            log: Arc::clone(&log),
            fail_create: failures.create,
        }),
        orchestrator: Arc::new(FakeOrchestrator {
            log: Arc::clone(&log),
            fail: failures.rebuild,
        }),
    };
    (IntakeFlow::new(ctx), log)
}

/// A recording messenger for tests that need only Slack.
pub fn messenger() -> (Arc<FakeMessenger>, Log) {
    let log: Log = Arc::default();
    let messenger = Arc::new(FakeMessenger {
        log: Arc::clone(&log),
        fail: false,
        counter: AtomicUsize::new(0),
    });
    (messenger, log)
}

pub const SIGNING_SECRET: &str = "8f742231b10e8888abcd99yyyzzz85a5";

/// Configuration for handler tests. Nothing here reaches the network.
pub fn app_config(webhook_secret: Option<&str>) -> AppConfig {
    AppConfig {
        slack_signing_secret: SIGNING_SECRET.to_string(),
        slack_bot_token: "xoxb-test".to_string(),
        slack_primary_channel: Some("C1".to_string()),
        slack_conversation_restriction: ConversationRestriction::None,
        slack_submit_command: "/submit".to_string(),
        submit_modal_config: SubmitModalConfig::default(),
        processing_queue_url: Some("https://sqs.us-east-1.amazonaws.com/1/intake".to_string()),
        jira: JiraConfig {
            host: "https://example.atlassian.net".to_string(),
            username: "bot@example.com".to_string(),
            api_token: "token".to_string(),
            project_key: "HELP".to_string(),
            issue_type: "Task".to_string(),
            webhook_secret: webhook_secret.map(ToString::to_string),
        },
    }
}
