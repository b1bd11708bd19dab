//! Worker Lambda handler and task processing

pub mod handler;

// Re-export the main handler for convenience
pub use handler::{WorkerState, function_handler as handler};
