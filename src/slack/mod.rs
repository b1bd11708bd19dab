//! All Slack-specific functionality

pub mod client;
pub mod command_parser;
pub mod modal;
pub mod modal_builder;

// Re-export main types for convenience
pub use client::SlackClient;
pub use modal::SlackRequestModal;
