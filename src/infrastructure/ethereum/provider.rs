//! Alloy implementation of the chain client
//!
//! One HTTP provider is built per RPC endpoint and reused for later
//! queries against the same URL. Every request is bounded by a timeout so a
//! dead endpoint surfaces as `Unreachable` instead of hanging the worker.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use alloy::network::Ethereum;
use alloy::primitives::U256;
use alloy::providers::{
    fillers::{BlobGasFiller, ChainIdFiller, FillProvider, GasFiller, JoinFill, NonceFiller},
    Identity, Provider, ProviderBuilder, RootProvider,
};
use alloy::transports::{RpcError, TransportError};

use crate::domain::{ChainClient, ChecksumAddress, FetchError};

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

type HttpFillProvider = FillProvider<
    JoinFill<
        Identity,
        JoinFill<GasFiller, JoinFill<BlobGasFiller, JoinFill<NonceFiller, ChainIdFiller>>>,
    >,
    RootProvider,
    Ethereum,
>;

/// Chain client backed by alloy HTTP providers
pub struct AlloyChainClient {
    providers: Mutex<HashMap<String, Arc<HttpFillProvider>>>,
    timeout: Duration,
}

impl AlloyChainClient {
    pub fn new(timeout: Duration) -> Self {
        Self {
            providers: Mutex::new(HashMap::new()),
            timeout,
        }
    }

    fn provider(&self, rpc_url: &str) -> Result<Arc<HttpFillProvider>, FetchError> {
        let mut providers = self
            .providers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(provider) = providers.get(rpc_url) {
            return Ok(Arc::clone(provider));
        }

        let url = match rpc_url.trim().parse() {
            Ok(url) => url,
            Err(_) => {
                return Err(FetchError::Unreachable(format!("invalid RPC URL: {rpc_url}")));
            }
        };
        let provider = Arc::new(ProviderBuilder::new().connect_http(url));
        providers.insert(rpc_url.to_string(), Arc::clone(&provider));
        tracing::debug!(rpc_url, "created http provider");
        Ok(provider)
    }

    async fn bounded<T, F>(&self, rpc_url: &str, method: &str, fut: F) -> Result<T, FetchError>
    where
        F: Future<Output = Result<T, TransportError>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => {
                let err = classify(err);
                tracing::warn!(rpc_url, method, error = %err, "rpc request failed");
                Err(err)
            }
            Err(_) => {
                tracing::warn!(rpc_url, method, timeout = ?self.timeout, "rpc request timed out");
                Err(FetchError::Unreachable(format!(
                    "no response within {}s",
                    self.timeout.as_secs()
                )))
            }
        }
    }
}

impl Default for AlloyChainClient {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

/// Map alloy transport errors onto the fetch error taxonomy
fn classify(err: TransportError) -> FetchError {
    match err {
        RpcError::Transport(kind) => FetchError::Unreachable(kind.to_string()),
        other => FetchError::MalformedResponse(other.to_string()),
    }
}

#[async_trait::async_trait]
impl ChainClient for AlloyChainClient {
    async fn get_balance(
        &self,
        address: &ChecksumAddress,
        rpc_url: &str,
    ) -> Result<U256, FetchError> {
        let provider = self.provider(rpc_url)?;
        let addr = address.to_alloy();
        self.bounded(rpc_url, "eth_getBalance", async move {
            provider.get_balance(addr).await
        })
        .await
    }

    async fn get_gas_price(&self, rpc_url: &str) -> Result<u128, FetchError> {
        let provider = self.provider(rpc_url)?;
        self.bounded(rpc_url, "eth_gasPrice", async move {
            provider.get_gas_price().await
        })
        .await
    }

    async fn get_block_number(&self, rpc_url: &str) -> Result<u64, FetchError> {
        let provider = self.provider(rpc_url)?;
        self.bounded(rpc_url, "eth_blockNumber", async move {
            provider.get_block_number().await
        })
        .await
    }
}
