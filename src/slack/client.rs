//! Slack API client module
//!
//! Encapsulates the Slack Web API calls the intake flow needs, with retry
//! logic and error handling.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use slack_morphism::hyper_tokio::{SlackClientHyperConnector, SlackHyperClient};
use slack_morphism::prelude::{SlackApiChatPostMessageRequest, SlackApiChatUpdateRequest};
use slack_morphism::{SlackApiToken, SlackApiTokenValue, SlackChannelId, SlackMessageContent, SlackTs};
use tokio_retry::strategy::jitter;
use tokio_retry::{Retry, strategy::ExponentialBackoff};

use crate::core::models::PostedMessage;
use crate::errors::IntakeError;
use crate::flows::collaborators::Messenger;

const VIEWS_OPEN_URL: &str = "https://slack.com/api/views.open";

/// Slack API client with retry logic and error handling
pub struct SlackClient {
    client: SlackHyperClient,
    token: SlackApiToken,
    http: Client,
}

impl SlackClient {
    /// # Errors
    ///
    /// Returns an error if the Slack HTTPS connector cannot be built.
    pub fn new(token: String) -> Result<Self, IntakeError> {
        let connector = SlackClientHyperConnector::new().map_err(|e| {
            IntakeError::ApiError(format!("Failed to create Slack HTTP connector: {e}"))
        })?;
        let http = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| Client::new());

        Ok(Self {
            client: SlackHyperClient::new(connector),
            token: SlackApiToken::new(SlackApiTokenValue::new(token)),
            http,
        })
    }

    async fn with_retry<F, Fut, T>(&self, operation: F) -> Result<T, IntakeError>
    where
        F: FnMut() -> Fut + Send,
        Fut: std::future::Future<Output = Result<T, IntakeError>> + Send,
        T: Send,
    {
        let strategy = ExponentialBackoff::from_millis(100).map(jitter).take(3);

        Retry::spawn(strategy, operation).await
    }

    /// # Errors
    ///
    /// Returns an error if the Slack API call fails after retries.
    pub async fn post(&self, channel_id: &str, text: &str) -> Result<PostedMessage, IntakeError> {
        self.with_retry(|| async {
            let session = self.client.open_session(&self.token);

            let post_req = SlackApiChatPostMessageRequest::new(
                SlackChannelId(channel_id.to_string()),
                SlackMessageContent::new().with_text(text.to_string()),
            );

            let resp = session.chat_post_message(&post_req).await?;

            Ok(PostedMessage {
                channel_id: resp.channel.0,
                ts: resp.ts.0,
            })
        })
        .await
    }

    /// # Errors
    ///
    /// Returns an error if the Slack API call fails.
    pub async fn update(&self, channel_id: &str, ts: &str, text: &str) -> Result<(), IntakeError> {
        self.with_retry(|| async {
            let session = self.client.open_session(&self.token);

            let update_req = SlackApiChatUpdateRequest::new(
                SlackChannelId(channel_id.to_string()),
                SlackMessageContent::new().with_text(text.to_string()),
                SlackTs(ts.to_string()),
            );

            session.chat_update(&update_req).await?;

            Ok(())
        })
        .await
    }

    /// Opens a Block Kit modal using Slack's `views.open` API.
    ///
    /// Trigger ids expire after a few seconds, so this is not retried.
    ///
    /// # Errors
    ///
    /// Returns an error if the Slack API request or response parsing fails.
    pub async fn open_modal(&self, trigger_id: &str, view: &Value) -> Result<(), IntakeError> {
        let payload = json!({
            "trigger_id": trigger_id,
            "view": view
        });

        let resp = self
            .http
            .post(VIEWS_OPEN_URL)
            .bearer_auth(&self.token.token_value.0)
            .json(&payload)
            .send()
            .await
            .map_err(|e| IntakeError::HttpError(format!("Failed to open modal: {e}")))?;

        if !resp.status().is_success() {
            return Err(IntakeError::ApiError(format!(
                "views.open HTTP {}",
                resp.status()
            )));
        }

        let json: Value = resp.json().await?;
        if json.get("ok").and_then(Value::as_bool).unwrap_or(false) {
            Ok(())
        } else {
            Err(IntakeError::ApiError(format!(
                "views.open error: {}",
                json.get("error")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown")
            )))
        }
    }
}

#[async_trait]
impl Messenger for SlackClient {
    async fn post_message(
        &self,
        channel_id: &str,
        text: &str,
    ) -> Result<PostedMessage, IntakeError> {
        self.post(channel_id, text).await
    }

    async fn update_message(
        &self,
        channel_id: &str,
        ts: &str,
        text: &str,
    ) -> Result<(), IntakeError> {
        self.update(channel_id, ts, text).await
    }
}
