//! Chain client trait - the read-only blockchain capability
//!
//! The session controller never talks to a node directly. Everything it
//! needs from a chain goes through this trait, so the alloy-backed client
//! can be swapped for a stub in tests.

use alloy_primitives::U256;

use super::address::{AddressError, ChecksumAddress};
use super::error::FetchError;

#[async_trait::async_trait]
pub trait ChainClient: Send + Sync + 'static {
    /// Validate and canonicalize an address
    fn parse_address(&self, raw: &str) -> Result<ChecksumAddress, AddressError> {
        ChecksumAddress::parse(raw)
    }

    /// Whether `raw` is an acceptable address for this chain family
    fn is_valid_address(&self, raw: &str) -> bool {
        self.parse_address(raw).is_ok()
    }

    /// Native balance in the smallest unit
    async fn get_balance(&self, address: &ChecksumAddress, rpc_url: &str)
        -> Result<U256, FetchError>;

    /// Current gas price in wei
    async fn get_gas_price(&self, rpc_url: &str) -> Result<u128, FetchError>;

    /// Latest block number
    async fn get_block_number(&self, rpc_url: &str) -> Result<u64, FetchError>;
}
