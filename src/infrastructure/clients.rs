//! Read client factory
//!
//! Hands out HTTP JSON-RPC clients bound to each network's endpoint.
//! Clients are cheap stateless handles and are memoized per identity.
//! The factory holds the registry snapshot it was built with, so a
//! reloaded configuration produces a fresh factory rather than stale
//! descriptors leaking through the cache.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use ethers::providers::{Http, Provider};

use crate::domain::network::{NetworkId, NetworkRegistry};
use crate::shared::error::WalletError;

pub type ReadClient = Provider<Http>;

pub struct ChainClientFactory {
    registry: Arc<NetworkRegistry>,
    clients: Mutex<HashMap<NetworkId, Arc<ReadClient>>>,
}

impl ChainClientFactory {
    pub fn new(registry: Arc<NetworkRegistry>) -> Self {
        Self {
            registry,
            clients: Mutex::new(HashMap::new()),
        }
    }

    pub fn registry(&self) -> &NetworkRegistry {
        &self.registry
    }

    /// Read client bound to the network's RPC endpoint.
    ///
    /// Errors surface only when the returned client is used; the factory
    /// itself fails only on a malformed endpoint URL.
    pub fn client(&self, network: NetworkId) -> Result<Arc<ReadClient>, WalletError> {
        let mut clients = self
            .clients
            .lock()
            .map_err(|_| WalletError::internal("client cache poisoned"))?;
        if let Some(client) = clients.get(&network) {
            return Ok(client.clone());
        }
        let rpc_url = &self.registry.descriptor(network).rpc_url;
        let provider = Provider::<Http>::try_from(rpc_url.as_str()).map_err(|e| {
            WalletError::rpc_unavailable(format!("invalid RPC endpoint {rpc_url}: {e}"))
        })?;
        let client = Arc::new(provider);
        clients.insert(network, client.clone());
        Ok(client)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clients_are_memoized_per_network() {
        let factory = ChainClientFactory::new(Arc::new(NetworkRegistry::with_rpc_host("127.0.0.1")));
        let first = factory.client(NetworkId::Testnet).unwrap();
        let second = factory.client(NetworkId::Testnet).unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        let other = factory.client(NetworkId::Turbo).unwrap();
        assert!(!Arc::ptr_eq(&first, &other));
    }

    #[test]
    fn test_fresh_registry_yields_fresh_clients() {
        let old = ChainClientFactory::new(Arc::new(NetworkRegistry::with_rpc_host("127.0.0.1")));
        let _ = old.client(NetworkId::Testnet).unwrap();

        let reloaded = ChainClientFactory::new(Arc::new(NetworkRegistry::with_rpc_host("10.0.0.1")));
        assert_eq!(
            reloaded.registry().descriptor(NetworkId::Testnet).rpc_url,
            "http://10.0.0.1:8546"
        );
    }
}
