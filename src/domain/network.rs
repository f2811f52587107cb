//! Network registry - known chains keyed by chain id

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::address::ChecksumAddress;
use super::error::ValidationError;

/// Chain id every fresh connection lands on
pub const PRIMARY_NETWORK_ID: u64 = 1;

/// A chain the session can point at
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub id: u64,
    pub name: String,
    pub rpc_url: String,
    #[serde(default)]
    pub explorer_url: String,
    #[serde(default = "default_symbol")]
    pub currency_symbol: String,
}

fn default_symbol() -> String {
    "ETH".to_string()
}

impl NetworkConfig {
    pub fn new(
        id: u64,
        name: impl Into<String>,
        rpc_url: impl Into<String>,
        explorer_url: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            rpc_url: rpc_url.into(),
            explorer_url: explorer_url.into(),
            currency_symbol: default_symbol(),
        }
    }

    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.currency_symbol = symbol.into();
        self
    }

    /// Explorer page for an address, if this network has an explorer
    pub fn explorer_address_url(&self, address: &ChecksumAddress) -> Option<String> {
        let base = self.explorer_url.trim().trim_end_matches('/');
        if base.is_empty() {
            return None;
        }
        Some(format!("{}/address/{}", base, address))
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.id == 0 {
            return Err(ValidationError::InvalidNetworkConfig(
                "chain id must be positive".into(),
            ));
        }
        if self.name.trim().is_empty() {
            return Err(ValidationError::InvalidNetworkConfig("name is empty".into()));
        }
        if self.rpc_url.trim().is_empty() {
            return Err(ValidationError::InvalidNetworkConfig("rpc url is empty".into()));
        }
        Ok(())
    }
}

/// Append-only registry of networks, ordered by chain id
#[derive(Debug, Clone, Default)]
pub struct NetworkRegistry {
    networks: BTreeMap<u64, NetworkConfig>,
}

impl NetworkRegistry {
    /// Empty registry (tests and embedders supply their own seed)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registry holding the well-known networks
    pub fn seeded() -> Self {
        let seeds = [
            NetworkConfig::new(
                1,
                "Ethereum Mainnet",
                "https://eth.llamarpc.com",
                "https://etherscan.io",
            ),
            NetworkConfig::new(
                5,
                "Goerli Testnet",
                "https://rpc.ankr.com/eth_goerli",
                "https://goerli.etherscan.io",
            ),
            NetworkConfig::new(
                11155111,
                "Sepolia Testnet",
                "https://rpc.sepolia.org",
                "https://sepolia.etherscan.io",
            ),
            NetworkConfig::new(
                137,
                "Polygon",
                "https://polygon-rpc.com",
                "https://polygonscan.com",
            )
            .with_symbol("MATIC"),
            NetworkConfig::new(
                80001,
                "Mumbai Testnet",
                "https://rpc-mumbai.maticvigil.com",
                "https://mumbai.polygonscan.com",
            )
            .with_symbol("MATIC"),
        ];

        Self {
            networks: seeds.into_iter().map(|n| (n.id, n)).collect(),
        }
    }

    /// Register a new network. Existing ids are never overwritten.
    pub fn insert(&mut self, config: NetworkConfig) -> Result<(), ValidationError> {
        config.validate()?;
        if self.networks.contains_key(&config.id) {
            return Err(ValidationError::DuplicateNetworkId(config.id));
        }
        self.networks.insert(config.id, config);
        Ok(())
    }

    pub fn get(&self, id: u64) -> Option<&NetworkConfig> {
        self.networks.get(&id)
    }

    pub fn contains(&self, id: u64) -> bool {
        self.networks.contains_key(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &NetworkConfig> {
        self.networks.values()
    }

    /// Position of a network in iteration order
    pub fn position(&self, id: u64) -> Option<usize> {
        self.networks.keys().position(|k| *k == id)
    }

    pub fn len(&self) -> usize {
        self.networks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.networks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_registry() {
        let registry = NetworkRegistry::seeded();
        assert_eq!(registry.len(), 5);
        assert!(registry.contains(PRIMARY_NETWORK_ID));
        assert!(registry.contains(137));
        assert_eq!(registry.get(137).unwrap().currency_symbol, "MATIC");
        let ids: Vec<u64> = registry.iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![1, 5, 137, 80001, 11155111]);
        assert_eq!(registry.position(137), Some(2));
    }

    #[test]
    fn test_insert_rejects_duplicates() {
        let mut registry = NetworkRegistry::seeded();
        let local = NetworkConfig::new(1337, "Local", "http://localhost:8545", "");
        registry.insert(local.clone()).unwrap();
        assert_eq!(registry.len(), 6);

        let other = NetworkConfig::new(1337, "Elsewhere", "http://evil:8545", "");
        assert_eq!(
            registry.insert(other),
            Err(ValidationError::DuplicateNetworkId(1337))
        );
        assert_eq!(registry.get(1337), Some(&local));

        // Seeded entries are protected too
        let hijack = NetworkConfig::new(1, "Mainnet?", "http://evil:8545", "");
        assert_eq!(
            registry.insert(hijack),
            Err(ValidationError::DuplicateNetworkId(1))
        );
    }

    #[test]
    fn test_insert_validates() {
        let mut registry = NetworkRegistry::empty();
        assert!(matches!(
            registry.insert(NetworkConfig::new(0, "Zero", "http://x", "")),
            Err(ValidationError::InvalidNetworkConfig(_))
        ));
        assert!(matches!(
            registry.insert(NetworkConfig::new(9, " ", "http://x", "")),
            Err(ValidationError::InvalidNetworkConfig(_))
        ));
        assert!(matches!(
            registry.insert(NetworkConfig::new(9, "Nine", "", "")),
            Err(ValidationError::InvalidNetworkConfig(_))
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_explorer_address_url() {
        let addr = ChecksumAddress::parse("0xfb6916095ca1df60bb79ce92ce3ea74c37c5d359").unwrap();
        let mainnet = NetworkConfig::new(1, "Mainnet", "http://x", "https://etherscan.io/");
        assert_eq!(
            mainnet.explorer_address_url(&addr).as_deref(),
            Some("https://etherscan.io/address/0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359")
        );
        let local = NetworkConfig::new(1337, "Local", "http://localhost:8545", "");
        assert_eq!(local.explorer_address_url(&addr), None);
    }
}
