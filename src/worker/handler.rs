use std::sync::Arc;

use futures::future::join_all;
use lambda_runtime::{Error, LambdaEvent};
use serde_json::Value;
use tracing::{error, info, warn};

use crate::core::config::AppConfig;
use crate::core::context::build_engine;
use crate::core::models::ProcessingTask;
use crate::errors::IntakeError;
use crate::flows::{FlowEngine, SpawnLauncher};
use crate::flows::engine::{SlowResponseJob, run_slow_response};

/// Long-lived state shared by every invocation of the worker Lambda.
pub struct WorkerState {
    pub engine: FlowEngine,
}

impl WorkerState {
    /// The worker runs slow hooks itself and never dispatches, so its engine
    /// keeps the in-process launcher.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is incomplete or the engine cannot be
    /// wired.
    pub fn from_env() -> Result<Self, IntakeError> {
        let config = AppConfig::from_env()?;
        Ok(Self {
            engine: build_engine(&config, Arc::new(SpawnLauncher))?,
        })
    }
}

/// Pull every `ProcessingTask` out of an SQS event. Records that do not decode
/// are logged and skipped.
#[must_use]
pub fn tasks_from_sqs_event(payload: &Value) -> Vec<ProcessingTask> {
    let Some(records) = payload.get("Records").and_then(Value::as_array) else {
        warn!("SQS event has no Records");
        return Vec::new();
    };

    records
        .iter()
        .filter_map(|record| {
            let body = record.get("body").and_then(Value::as_str)?;
            serde_json::from_str::<ProcessingTask>(body)
                .map_err(|e| error!("Failed to parse SQS message body into ProcessingTask: {}", e))
                .ok()
        })
        .collect()
}

/// Run one queued slow response. Returns the flow's verdict.
pub async fn process_task(engine: &FlowEngine, task: ProcessingTask) -> bool {
    let Some(flow) = engine.flow(&task.flow) else {
        error!(correlation_id = %task.correlation_id, flow = %task.flow, "Unknown flow");
        return false;
    };

    run_slow_response(SlowResponseJob {
        correlation_id: task.correlation_id,
        flow,
        action: task.action,
        event: task.event,
        additional: task.additional,
    })
    .await
}

/// Lambda handler for the Worker entrypoint.
///
/// Tasks in a batch run concurrently. Slow responses are not retried: a failed
/// task is logged and the batch still succeeds, so SQS does not redeliver it.
///
/// # Errors
///
/// Currently never fails; the `Result` is what `lambda_runtime` expects.
pub async fn function_handler(state: &WorkerState, event: LambdaEvent<Value>) -> Result<(), Error> {
    let tasks = tasks_from_sqs_event(&event.payload);
    info!(count = tasks.len(), "Worker Lambda received tasks");

    let results = join_all(tasks.into_iter().map(|task| process_task(&state.engine, task))).await;
    let failed = results.iter().filter(|ok| !**ok).count();
    if failed > 0 {
        warn!(failed, total = results.len(), "Some slow responses failed");
    }

    Ok(())
}
