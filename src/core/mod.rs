//! Configuration, event and request models, and the runtime context.

pub mod config;
pub mod context;
pub mod events;
pub mod models;
