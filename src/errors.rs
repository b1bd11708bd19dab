use slack_morphism::errors::SlackClientError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IntakeError {
    #[error("Failed to parse inbound event: {0}")]
    ParseError(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Missing context: {0}")]
    MissingContext(String),

    #[error("Failed to access Slack API: {0}")]
    ApiError(String),

    #[error("Failed to access ticket tracker: {0}")]
    TrackerError(String),

    #[error("Failed to send HTTP request: {0}")]
    HttpError(String),

    #[error("Failed to interact with AWS services: {0}")]
    AwsError(String),

    /// The thread root was posted but the request did not finish. `ticket_key`
    /// is set when the ticket exists and only the thread binding failed.
    #[error("Request only partially created in {channel_id} (thread {thread_ts}): {source}")]
    PartialCreation {
        channel_id: String,
        thread_ts: String,
        ticket_key: Option<String>,
        #[source]
        source: Box<IntakeError>,
    },

    #[error("{0}")]
    GeneralError(String),
}

impl IntakeError {
    /// Whether this failure is an outside-system fault, as opposed to bad
    /// configuration or a payload missing its context.
    #[must_use]
    pub fn is_external(&self) -> bool {
        matches!(
            self,
            IntakeError::ApiError(_)
                | IntakeError::TrackerError(_)
                | IntakeError::HttpError(_)
                | IntakeError::AwsError(_)
                | IntakeError::PartialCreation { .. }
        )
    }
}

impl From<SlackClientError> for IntakeError {
    fn from(error: SlackClientError) -> Self {
        IntakeError::ApiError(error.to_string())
    }
}

impl From<reqwest::Error> for IntakeError {
    fn from(error: reqwest::Error) -> Self {
        IntakeError::HttpError(error.to_string())
    }
}

impl From<anyhow::Error> for IntakeError {
    fn from(error: anyhow::Error) -> Self {
        IntakeError::GeneralError(error.to_string())
    }
}

impl From<serde_json::Error> for IntakeError {
    fn from(error: serde_json::Error) -> Self {
        IntakeError::ParseError(error.to_string())
    }
}

impl<E> From<aws_sdk_sqs::error::SdkError<E>> for IntakeError
where
    E: std::fmt::Display,
{
    fn from(error: aws_sdk_sqs::error::SdkError<E>) -> Self {
        IntakeError::AwsError(error.to_string())
    }
}
