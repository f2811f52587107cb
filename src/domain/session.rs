//! Session/network controller
//!
//! Owns the one [`SessionState`] of a user session together with the
//! [`NetworkRegistry`]. All mutations are single field-group assignments
//! performed after validation, so a rejected call leaves the state exactly
//! as it was.
//!
//! Chain queries never read the controller after they start: callers take
//! a [`FetchTicket`] (a snapshot of address, network and epoch) and run the
//! query on that. A result whose epoch is no longer current belongs to a
//! session that has since been disconnected or moved, and is dropped.

use std::sync::Arc;

use serde::{Serialize, Serializer};

use super::address::ChecksumAddress;
use super::chain::ChainClient;
use super::error::{FetchError, ValidationError};
use super::network::{NetworkConfig, NetworkRegistry, PRIMARY_NETWORK_ID};
use super::units::Amount;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Connection {
    address: ChecksumAddress,
    network_id: u64,
}

/// Connection state of a session.
///
/// Either fully connected (address and network both set) or fully
/// disconnected; there is no in-between value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    connection: Option<Connection>,
}

impl SessionState {
    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    pub fn address(&self) -> Option<&ChecksumAddress> {
        self.connection.as_ref().map(|c| &c.address)
    }

    pub fn active_network_id(&self) -> Option<u64> {
        self.connection.as_ref().map(|c| c.network_id)
    }
}

impl Serialize for SessionState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        let mut s = serializer.serialize_struct("SessionState", 3)?;
        s.serialize_field("connected", &self.is_connected())?;
        s.serialize_field("address", &self.address())?;
        s.serialize_field("active_network_id", &self.active_network_id())?;
        s.end()
    }
}

/// Snapshot of the inputs a chain query needs
#[derive(Debug, Clone)]
pub struct FetchTicket {
    pub epoch: u64,
    pub address: ChecksumAddress,
    pub network: NetworkConfig,
}

impl FetchTicket {
    /// Native balance, scaled by the network's currency
    pub async fn balance(&self, client: &dyn ChainClient) -> Result<Amount, FetchError> {
        let raw = client
            .get_balance(&self.address, &self.network.rpc_url)
            .await?;
        Ok(Amount::native(raw, self.network.currency_symbol.clone()))
    }

    /// Gas price in gwei
    pub async fn gas_price(&self, client: &dyn ChainClient) -> Result<Amount, FetchError> {
        let wei = client.get_gas_price(&self.network.rpc_url).await?;
        Ok(Amount::gwei(wei))
    }

    pub async fn block_height(&self, client: &dyn ChainClient) -> Result<u64, FetchError> {
        client.get_block_number(&self.network.rpc_url).await
    }
}

/// Session/network controller
pub struct SessionController {
    state: SessionState,
    registry: NetworkRegistry,
    client: Arc<dyn ChainClient>,
    epoch: u64,
}

impl SessionController {
    /// Controller over the well-known networks
    pub fn new(client: Arc<dyn ChainClient>) -> Self {
        Self::with_registry(client, NetworkRegistry::seeded())
    }

    pub fn with_registry(client: Arc<dyn ChainClient>, registry: NetworkRegistry) -> Self {
        Self {
            state: SessionState::default(),
            registry,
            client,
            epoch: 0,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn registry(&self) -> &NetworkRegistry {
        &self.registry
    }

    pub fn client(&self) -> Arc<dyn ChainClient> {
        Arc::clone(&self.client)
    }

    /// Counter bumped on every change to address or network
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Whether a result fetched under `epoch` still describes this session
    pub fn is_current(&self, epoch: u64) -> bool {
        epoch == self.epoch
    }

    pub fn active_network(&self) -> Option<&NetworkConfig> {
        self.state
            .active_network_id()
            .and_then(|id| self.registry.get(id))
    }

    /// Connect (or re-connect) with a user-supplied address.
    ///
    /// A fresh session lands on the primary network; a re-connect keeps the
    /// network already selected.
    pub fn connect(&mut self, raw_address: &str) -> Result<SessionState, ValidationError> {
        let address = match self.client.parse_address(raw_address) {
            Ok(address) => address,
            Err(err) => {
                tracing::warn!(input = raw_address.trim(), error = %err, "rejected address");
                return Err(ValidationError::MalformedAddress(err));
            }
        };

        let network_id = match self.state.active_network_id() {
            Some(id) => id,
            None if self.registry.contains(PRIMARY_NETWORK_ID) => PRIMARY_NETWORK_ID,
            None => {
                // Registry supplied without the primary network
                match self.registry.iter().next() {
                    Some(first) => first.id,
                    None => return Err(ValidationError::UnknownNetwork(PRIMARY_NETWORK_ID)),
                }
            }
        };

        tracing::info!(address = %address, network_id, "connected");
        self.state.connection = Some(Connection {
            address,
            network_id,
        });
        self.epoch += 1;
        Ok(self.state.clone())
    }

    /// Forget the address and network. Always succeeds.
    pub fn disconnect(&mut self) -> SessionState {
        if self.state.connection.take().is_some() {
            self.epoch += 1;
            tracing::info!("disconnected");
        }
        self.state.clone()
    }

    /// Point the connected session at another registered network
    pub fn switch_network(&mut self, network_id: u64) -> Result<SessionState, ValidationError> {
        if !self.registry.contains(network_id) {
            tracing::warn!(network_id, "unknown network");
            return Err(ValidationError::UnknownNetwork(network_id));
        }
        let Some(connection) = self.state.connection.as_mut() else {
            return Err(ValidationError::NotConnected);
        };
        connection.network_id = network_id;
        self.epoch += 1;
        tracing::info!(network_id, "switched network");
        Ok(self.state.clone())
    }

    /// Register a user-defined network. Existing ids are never replaced.
    pub fn add_custom_network(&mut self, config: NetworkConfig) -> Result<(), ValidationError> {
        let id = config.id;
        match self.registry.insert(config) {
            Ok(()) => {
                tracing::info!(network_id = id, "added custom network");
                Ok(())
            }
            Err(err) => {
                tracing::warn!(network_id = id, error = %err, "custom network rejected");
                Err(err)
            }
        }
    }

    /// Snapshot of the current address/network for a chain query
    pub fn ticket(&self) -> Result<FetchTicket, FetchError> {
        let connection = self
            .state
            .connection
            .as_ref()
            .ok_or(FetchError::NotConnected)?;
        let network = self
            .registry
            .get(connection.network_id)
            .cloned()
            .ok_or(FetchError::NotConnected)?;
        Ok(FetchTicket {
            epoch: self.epoch,
            address: connection.address.clone(),
            network,
        })
    }

    pub async fn query_balance(&self) -> Result<Amount, FetchError> {
        let ticket = self.ticket()?;
        ticket.balance(self.client.as_ref()).await
    }

    pub async fn query_gas_price(&self) -> Result<Amount, FetchError> {
        let ticket = self.ticket()?;
        ticket.gas_price(self.client.as_ref()).await
    }

    pub async fn query_block_height(&self) -> Result<u64, FetchError> {
        let ticket = self.ticket()?;
        ticket.block_height(self.client.as_ref()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::address::AddressError;
    use alloy_primitives::U256;

    struct NullClient;

    #[async_trait::async_trait]
    impl ChainClient for NullClient {
        async fn get_balance(
            &self,
            _address: &ChecksumAddress,
            _rpc_url: &str,
        ) -> Result<U256, FetchError> {
            Ok(U256::ZERO)
        }

        async fn get_gas_price(&self, _rpc_url: &str) -> Result<u128, FetchError> {
            Ok(0)
        }

        async fn get_block_number(&self, _rpc_url: &str) -> Result<u64, FetchError> {
            Ok(0)
        }
    }

    const ADDR: &str = "0x742d35cc6634c0532925a3b8d4c9db96c4b4d8b6";
    const CANONICAL: &str = "0x742d35Cc6634C0532925A3B8D4C9dB96C4B4d8B6";

    fn controller() -> SessionController {
        SessionController::new(Arc::new(NullClient))
    }

    #[test]
    fn test_initial_state_is_disconnected() {
        let ctl = controller();
        assert!(!ctl.state().is_connected());
        assert_eq!(ctl.state().address(), None);
        assert_eq!(ctl.state().active_network_id(), None);
        assert_eq!(ctl.ticket().unwrap_err(), FetchError::NotConnected);
    }

    #[test]
    fn test_connect_lands_on_primary() {
        let mut ctl = controller();
        let state = ctl.connect(ADDR).unwrap();
        assert!(state.is_connected());
        assert_eq!(state.address().unwrap().as_str(), CANONICAL);
        assert_eq!(state.active_network_id(), Some(PRIMARY_NETWORK_ID));
        assert_eq!(ctl.active_network().unwrap().name, "Ethereum Mainnet");
    }

    #[test]
    fn test_failed_connect_leaves_state() {
        let mut ctl = controller();
        ctl.connect(ADDR).unwrap();
        ctl.switch_network(137).unwrap();
        let before = ctl.state().clone();
        let epoch = ctl.epoch();

        for bad in ["", "0x1234", "742d35cc6634c0532925a3b8d4c9db96c4b4d8b6", "0xZZ2d35cc6634c0532925a3b8d4c9db96c4b4d8b6"] {
            assert!(matches!(
                ctl.connect(bad),
                Err(ValidationError::MalformedAddress(_))
            ));
        }
        assert_eq!(ctl.state(), &before);
        assert_eq!(ctl.epoch(), epoch);
    }

    #[test]
    fn test_reconnect_keeps_network() {
        let mut ctl = controller();
        ctl.connect(ADDR).unwrap();
        ctl.switch_network(137).unwrap();
        let state = ctl
            .connect("0xfb6916095ca1df60bb79ce92ce3ea74c37c5d359")
            .unwrap();
        assert_eq!(
            state.address().unwrap().as_str(),
            "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359"
        );
        assert_eq!(state.active_network_id(), Some(137));
    }

    #[test]
    fn test_switch_network() {
        let mut ctl = controller();
        assert_eq!(ctl.switch_network(999), Err(ValidationError::UnknownNetwork(999)));
        assert_eq!(ctl.switch_network(137), Err(ValidationError::NotConnected));
        assert!(!ctl.state().is_connected());

        ctl.connect(ADDR).unwrap();
        let state = ctl.switch_network(137).unwrap();
        assert_eq!(state.active_network_id(), Some(137));
        assert_eq!(state.address().unwrap().as_str(), CANONICAL);

        assert_eq!(ctl.switch_network(999), Err(ValidationError::UnknownNetwork(999)));
        assert_eq!(ctl.state().active_network_id(), Some(137));
    }

    #[test]
    fn test_disconnect_is_idempotent() {
        let mut ctl = controller();
        ctl.connect(ADDR).unwrap();
        let connected_epoch = ctl.epoch();
        let once = ctl.disconnect();
        let after_first = ctl.epoch();
        let twice = ctl.disconnect();
        assert_eq!(once, SessionState::default());
        assert_eq!(once, twice);
        assert!(after_first > connected_epoch);
        assert_eq!(ctl.epoch(), after_first);

        let mut fresh = controller();
        fresh.disconnect();
        assert_eq!(fresh.epoch(), 0);
    }

    #[test]
    fn test_epoch_tracks_session_changes() {
        let mut ctl = controller();
        let e0 = ctl.epoch();
        ctl.connect(ADDR).unwrap();
        let ticket = ctl.ticket().unwrap();
        assert!(ctl.is_current(ticket.epoch));
        assert!(ticket.epoch > e0);

        ctl.add_custom_network(NetworkConfig::new(1337, "Local", "http://localhost:8545", ""))
            .unwrap();
        assert!(ctl.is_current(ticket.epoch));

        ctl.switch_network(1337).unwrap();
        assert!(!ctl.is_current(ticket.epoch));

        let after_switch = ctl.ticket().unwrap();
        assert_eq!(after_switch.network.id, 1337);
        ctl.disconnect();
        assert!(!ctl.is_current(after_switch.epoch));
    }

    #[test]
    fn test_state_serializes_flat() {
        let mut ctl = controller();
        let json = serde_json::to_value(ctl.state()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"connected": false, "address": null, "active_network_id": null})
        );

        ctl.connect(ADDR).unwrap();
        let json = serde_json::to_value(ctl.state()).unwrap();
        assert_eq!(json["connected"], true);
        assert_eq!(json["address"], CANONICAL);
        assert_eq!(json["active_network_id"], 1);
    }

    #[test]
    fn test_registry_without_primary() {
        let mut registry = NetworkRegistry::empty();
        registry
            .insert(NetworkConfig::new(1337, "Local", "http://localhost:8545", ""))
            .unwrap();
        let mut ctl = SessionController::with_registry(Arc::new(NullClient), registry);
        let state = ctl.connect(ADDR).unwrap();
        assert_eq!(state.active_network_id(), Some(1337));

        let mut empty = SessionController::with_registry(Arc::new(NullClient), NetworkRegistry::empty());
        assert_eq!(
            empty.connect(ADDR),
            Err(ValidationError::UnknownNetwork(PRIMARY_NETWORK_ID))
        );
        assert!(!empty.state().is_connected());
    }

    #[test]
    fn test_bad_checksum_is_malformed() {
        let mut ctl = controller();
        assert_eq!(
            ctl.connect("0x742d35Cc6634C0532925a3b8D4C9db96C4b4d8b6"),
            Err(ValidationError::MalformedAddress(AddressError::BadChecksum))
        );
    }
}
