//! Seams between the flows and the outside world.
//!
//! Slack and Jira implementations live in `slack` and `tracker`; tests swap in
//! recording fakes.

use async_trait::async_trait;

use crate::core::events::{AdditionalData, InboundEvent};
use crate::core::models::{ModalParams, PostedMessage, RequestParams, ThreadBinding};
use crate::errors::IntakeError;

/// Shows the intake modal.
#[async_trait]
pub trait RequestModal: Send + Sync {
    async fn show(&self, trigger_id: &str, params: &ModalParams) -> Result<(), IntakeError>;
}

/// Posts and edits chat messages.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Post `text` to a channel. The returned `ts` identifies the message and
    /// can serve as a thread root.
    async fn post_message(&self, channel_id: &str, text: &str)
    -> Result<PostedMessage, IntakeError>;

    async fn update_message(&self, channel_id: &str, ts: &str, text: &str)
    -> Result<(), IntakeError>;
}

/// One logical request: a thread in Slack bound to a ticket.
#[async_trait]
pub trait ServiceRequest: Send + Sync {
    fn binding(&self) -> &ThreadBinding;

    /// Key of the backing ticket, once one exists.
    fn ticket_key(&self) -> Option<&str>;

    /// Create the backing ticket and bind it to the thread.
    async fn create(&mut self, params: &RequestParams) -> Result<(), IntakeError>;

    /// Re-render the thread root from the current ticket state.
    async fn update_slack_thread(&self) -> Result<(), IntakeError>;
}

/// Builds a fresh, unbound-to-ticket request for a thread.
pub trait RequestFactory: Send + Sync {
    fn bind(&self, binding: ThreadBinding) -> Box<dyn ServiceRequest>;
}

/// Rebuilds an existing request from a tracker event.
#[async_trait]
pub trait FlowOrchestrator: Send + Sync {
    async fn build_request_from_external_event(
        &self,
        additional: Option<&AdditionalData>,
        event: &InboundEvent,
    ) -> Result<Box<dyn ServiceRequest>, IntakeError>;
}
