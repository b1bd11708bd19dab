use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::jira::JiraClient;
use super::request::JiraServiceRequest;
use super::webhook::{binding_from_labels, decode_ticket_webhook};
use crate::core::events::{AdditionalData, InboundEvent};
use crate::errors::IntakeError;
use crate::flows::collaborators::{FlowOrchestrator, Messenger, ServiceRequest};

/// Rebuilds requests from Jira webhooks using the labels written at creation.
pub struct JiraFlowOrchestrator {
    jira: Arc<JiraClient>,
    messenger: Arc<dyn Messenger>,
}

impl JiraFlowOrchestrator {
    #[must_use]
    pub fn new(jira: Arc<JiraClient>, messenger: Arc<dyn Messenger>) -> Self {
        Self { jira, messenger }
    }
}

#[async_trait]
impl FlowOrchestrator for JiraFlowOrchestrator {
    async fn build_request_from_external_event(
        &self,
        additional: Option<&AdditionalData>,
        event: &InboundEvent,
    ) -> Result<Box<dyn ServiceRequest>, IntakeError> {
        let ticket = match (event, additional.and_then(AdditionalData::ticket_webhook)) {
            (InboundEvent::TicketChanged(change), _) => change.issue.clone(),
            (_, Some(raw)) => decode_ticket_webhook(raw)?.issue,
            _ => {
                return Err(IntakeError::MissingContext(format!(
                    "{} carries no ticket",
                    event.kind()
                )));
            }
        };

        let binding = binding_from_labels(&ticket.labels)?;
        debug!(key = %ticket.key, thread = %binding.thread_id, "Rebuilt request from ticket");

        Ok(Box::new(JiraServiceRequest::with_ticket(
            binding,
            ticket,
            Arc::clone(&self.jira),
            Arc::clone(&self.messenger),
        )))
    }
}
