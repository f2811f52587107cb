//! Error taxonomy for session operations and chain queries

use super::address::AddressError;

/// Input rejected before any session mutation took place
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("malformed address: {0}")]
    MalformedAddress(#[from] AddressError),

    #[error("unknown network id {0}")]
    UnknownNetwork(u64),

    #[error("network id {0} is already registered")]
    DuplicateNetworkId(u64),

    #[error("invalid network config: {0}")]
    InvalidNetworkConfig(String),

    #[error("wallet not connected")]
    NotConnected,
}

/// A chain query that did not produce a value.
///
/// Callers render this as "unavailable", never as a zero amount.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("endpoint unreachable: {0}")]
    Unreachable(String),

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("wallet not connected")]
    NotConnected,
}
