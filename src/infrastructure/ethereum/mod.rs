//! Ethereum infrastructure - Alloy chain client

mod provider;

pub use provider::{AlloyChainClient, DEFAULT_TIMEOUT};
