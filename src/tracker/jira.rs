//! Minimal Jira REST client: issue creation and browse links.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio_retry::RetryIf;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::debug;

use crate::core::config::JiraConfig;
use crate::core::models::RequestParams;
use crate::errors::IntakeError;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreatedIssue {
    pub id: String,
    pub key: String,
}

/// Build the `POST /rest/api/2/issue` body for a new request.
///
/// The category becomes the single component; optional fields are left out
/// rather than sent empty.
#[must_use]
pub fn issue_payload(
    project_key: &str,
    issue_type: &str,
    params: &RequestParams,
    labels: &[String],
) -> Value {
    let mut fields = json!({
        "project": { "key": project_key },
        "issuetype": { "name": issue_type },
        "summary": params.title,
        "labels": labels,
    });

    if let Some(description) = &params.description {
        fields["description"] = Value::String(description.clone());
    }
    if let Some(priority) = &params.priority {
        fields["priority"] = json!({ "name": priority });
    }
    if let Some(category) = &params.category {
        fields["components"] = json!([{ "name": category }]);
    }

    json!({ "fields": fields })
}

pub struct JiraClient {
    config: JiraConfig,
    http: Client,
}

impl JiraClient {
    #[must_use]
    pub fn new(config: JiraConfig) -> Self {
        Self::with_timeout(config, Duration::from_secs(30))
    }

    #[must_use]
    pub fn with_timeout(config: JiraConfig, timeout: Duration) -> Self {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { config, http }
    }

    #[must_use]
    pub fn config(&self) -> &JiraConfig {
        &self.config
    }

    fn base_url(&self) -> String {
        let host = self.config.host.trim_end_matches('/');
        if host.starts_with("http://") || host.starts_with("https://") {
            host.to_string()
        } else {
            format!("https://{host}")
        }
    }

    /// Link to the ticket in the Jira UI.
    #[must_use]
    pub fn browse_url(&self, key: &str) -> String {
        format!("{}/browse/{key}", self.base_url())
    }

    /// Create an issue from a prepared payload.
    ///
    /// Only failures to connect are retried. Once the request may have reached
    /// Jira, including a timeout waiting for the answer, the error is returned
    /// so the issue is never created twice.
    ///
    /// # Errors
    ///
    /// Returns `HttpError` on transport failure and `TrackerError` when Jira
    /// rejects the issue.
    pub async fn create_issue(&self, payload: &Value) -> Result<CreatedIssue, IntakeError> {
        let url = format!("{}/rest/api/2/issue", self.base_url());
        let strategy = ExponentialBackoff::from_millis(200).map(jitter).take(3);

        let resp = RetryIf::spawn(
            strategy,
            || {
                self.http
                    .post(&url)
                    .basic_auth(&self.config.username, Some(&self.config.api_token))
                    .json(payload)
                    .send()
            },
            |e: &reqwest::Error| e.is_connect(),
        )
        .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(IntakeError::TrackerError(format!(
                "create issue HTTP {status}: {body}"
            )));
        }

        let created: CreatedIssue = resp
            .json()
            .await
            .map_err(|e| IntakeError::TrackerError(format!("create issue response: {e}")))?;
        debug!(key = %created.key, "Created Jira issue");
        Ok(created)
    }
}
