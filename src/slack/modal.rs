use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::client::SlackClient;
use super::modal_builder::build_request_modal;
use crate::core::config::SubmitModalConfig;
use crate::core::models::ModalParams;
use crate::errors::IntakeError;
use crate::flows::collaborators::RequestModal;

/// Shows the intake modal through `views.open`.
pub struct SlackRequestModal {
    client: Arc<SlackClient>,
    config: SubmitModalConfig,
}

impl SlackRequestModal {
    #[must_use]
    pub fn new(client: Arc<SlackClient>, config: SubmitModalConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl RequestModal for SlackRequestModal {
    async fn show(&self, trigger_id: &str, params: &ModalParams) -> Result<(), IntakeError> {
        let view = build_request_modal(params, &self.config);
        debug!(trigger_id, channel_id = %params.channel_id, "Opening intake modal");
        self.client.open_modal(trigger_id, &view).await
    }
}
