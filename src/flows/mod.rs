//! Flow dispatch.
//!
//! A flow groups the handlers for a closed set of [`FlowAction`]s. The
//! [`engine::FlowEngine`] classifies each inbound event, runs the flow's
//! immediate hook inside the Slack ack window and hands the slow hook to a
//! launcher so the caller never waits on it.

pub mod channels;
pub mod collaborators;
pub mod engine;
pub mod intake;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::events::{AdditionalData, InboundEvent};

pub use engine::{
    ActionRouter, BoundedSpawnLauncher, DispatchOutcome, FlowEngine, SlowResponseJob,
    SlowResponseLauncher, SpawnLauncher,
};
pub use intake::IntakeFlow;

/// A recognised trigger kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowAction {
    OpenModal,
    ModalSubmitted,
    TicketChanged,
}

impl FlowAction {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OpenModal => "open_modal",
            Self::ModalSubmitted => "modal_submitted",
            Self::TicketChanged => "ticket_changed",
        }
    }
}

impl fmt::Display for FlowAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A concrete flow: the actions it claims and how it answers them.
#[async_trait]
pub trait ServiceFlow: Send + Sync {
    /// Stable name, used to find the flow again on the worker side.
    fn name(&self) -> &'static str;

    /// Exhaustive set of actions this flow understands.
    fn declared_actions(&self) -> &'static [FlowAction];

    /// Classify an event. Must be pure.
    fn flow_actions(
        &self,
        event: &InboundEvent,
        additional: Option<&AdditionalData>,
    ) -> Option<FlowAction>;

    /// Runs inside the ack window. Must not perform I/O.
    fn handle_action_immediate_response(
        &self,
        action: FlowAction,
        event: &InboundEvent,
        additional: Option<&AdditionalData>,
    ) -> bool;

    /// Runs after the ack. Failures are logged and reported as `false`,
    /// never propagated.
    async fn handle_action_slow_response(
        &self,
        action: FlowAction,
        event: &InboundEvent,
        additional: Option<&AdditionalData>,
    ) -> bool;
}
