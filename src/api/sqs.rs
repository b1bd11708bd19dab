use async_trait::async_trait;
use aws_sdk_sqs::Client as SqsClient;
use tracing::info;

use crate::core::models::ProcessingTask;
use crate::errors::IntakeError;
use crate::flows::{SlowResponseJob, SlowResponseLauncher};

/// # Errors
///
/// Returns an error if serialization fails or the message cannot be sent to SQS.
pub async fn send_to_sqs(task: &ProcessingTask, queue_url: &str) -> Result<(), IntakeError> {
    let shared_config = aws_config::from_env().load().await;
    let client = SqsClient::new(&shared_config);
    let message_body = serde_json::to_string(task)
        .map_err(|e| IntakeError::ParseError(format!("Failed to serialize task: {e}")))?;

    client
        .send_message()
        .queue_url(queue_url)
        .message_body(message_body)
        .send()
        .await
        .map_err(|e| IntakeError::AwsError(format!("Failed to send message to SQS: {e}")))?;
    Ok(())
}

/// Hands slow responses to the worker Lambda through SQS.
#[derive(Debug, Clone)]
pub struct QueueLauncher {
    queue_url: String,
}

impl QueueLauncher {
    #[must_use]
    pub fn new(queue_url: String) -> Self {
        Self { queue_url }
    }
}

#[must_use]
pub fn task_for_job(job: SlowResponseJob) -> ProcessingTask {
    ProcessingTask {
        correlation_id: job.correlation_id,
        flow: job.flow.name().to_string(),
        action: job.action,
        event: job.event,
        additional: job.additional,
    }
}

#[async_trait]
impl SlowResponseLauncher for QueueLauncher {
    async fn launch(&self, job: SlowResponseJob) -> Result<(), IntakeError> {
        let task = task_for_job(job);
        send_to_sqs(&task, &self.queue_url).await?;
        info!(correlation_id = %task.correlation_id, "Queued slow response");
        Ok(())
    }
}
