//! Infrastructure layer - External service integrations
//!
//! This layer contains:
//! - The alloy-backed chain client
//! - Tokio runtime bridge for async operations

pub mod ethereum;
pub mod runtime;

pub use ethereum::AlloyChainClient;
pub use runtime::{RuntimeBridge, RuntimeCommand, RuntimeEvent};
