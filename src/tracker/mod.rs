//! Jira-backed requests.

pub mod jira;
pub mod orchestrator;
pub mod request;
pub mod webhook;

pub use jira::JiraClient;
pub use orchestrator::JiraFlowOrchestrator;
pub use request::{JiraRequestFactory, JiraServiceRequest};
