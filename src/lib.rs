/// Intake - a Slack front door for service requests backed by Jira tickets.
///
/// This crate implements a two-Lambda architecture:
/// 1. An API Lambda that verifies Slack requests and Jira webhooks, classifies
///    them into flow actions and acknowledges within Slack's deadline
/// 2. A Worker Lambda that runs the slow half of each queued action (posting
///    thread roots, creating tickets, refreshing threads)
///
/// The API Lambda opens modals itself, waiting a bounded time inside the
/// request, and queues every other slow half on SQS.
///
/// # Architecture
///
/// The system uses:
/// - AWS Lambda for serverless execution
/// - SQS for task queuing between Lambdas
/// - slack-morphism for Slack API interactions
/// - reqwest for the Jira REST API
/// - Tokio for async runtime
///
/// # Example
///
/// ```no_run
/// use intake::core::config::AppConfig;
/// use intake::core::context::{api_launcher, build_engine};
/// use intake::core::events::{InboundEvent, SlashCommand};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     intake::setup_logging();
///
///     let config = AppConfig::from_env()?;
///     let engine = build_engine(&config, api_launcher(&config)?)?;
///
///     let outcome = engine
///         .dispatch(
///             InboundEvent::SlashCommand(SlashCommand {
///                 command: "/submit".into(),
///                 text: "Printer on floor 3 is jammed".into(),
///                 trigger_id: "123.456".into(),
///                 user_id: "U123".into(),
///                 channel_id: "C123".into(),
///                 response_url: String::new(),
///             }),
///             None,
///         )
///         .await;
///     println!("handled: {}", outcome.is_handled());
///     Ok(())
/// }
/// ```
// Module declarations
pub mod api;
pub mod core;
pub mod errors;
pub mod flows;
pub mod slack;
pub mod tracker;
pub mod worker;

pub use errors::IntakeError;

/// Configure structured logging with JSON format for AWS Lambda environments.
///
/// This function sets up tracing-subscriber with a JSON formatter suitable for
/// `CloudWatch` Logs integration. Calling it more than once is harmless.
///
/// # Example
///
/// ```
/// intake::setup_logging();
/// ```
pub fn setup_logging() {
    use tracing_subscriber::prelude::*;
    let fmt_layer = tracing_subscriber::fmt::layer().json().with_target(true);

    let _ = tracing_subscriber::registry().with(fmt_layer).try_init();
}
