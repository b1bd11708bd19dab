//! API Lambda handler and request decoding

pub mod handler;
pub mod helpers;
pub mod parsing;
pub mod signature;
pub mod sqs;

// Re-export the main handler for convenience
pub use handler::{ApiState, function_handler as handler};
