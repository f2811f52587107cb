//! Domain layer - wallet session logic with no I/O
//!
//! This layer contains:
//! - EIP-55 address parsing and canonicalization
//! - The network registry
//! - Unit scaling for balances and gas prices
//! - The session/network controller and its fetch tickets

pub mod address;
pub mod chain;
pub mod error;
pub mod network;
pub mod session;
pub mod units;

pub use address::{AddressError, ChecksumAddress};
pub use chain::ChainClient;
pub use error::{FetchError, ValidationError};
pub use network::{NetworkConfig, NetworkRegistry, PRIMARY_NETWORK_ID};
pub use session::{FetchTicket, SessionController, SessionState};
pub use units::{format_units, Amount};
