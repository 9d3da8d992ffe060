//! Balance/stat synchronization
//!
//! Polls the active network's read client on a fixed period for block
//! height, gas price, and contract-read statistics. Every quantity is
//! fetched independently; a failure degrades that quantity to its safe
//! default and never blocks the others. The cycle restarts when the
//! session's network changes and stops cleanly on teardown.

use std::sync::Arc;
use std::time::Duration;

use ethers::abi::parse_abi;
use ethers::contract::Contract;
use ethers::core::types::U256;
use ethers::providers::Middleware;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::core::session::WalletSession;
use crate::domain::network::{ContractRole, NetworkId, FALLBACK_NETWORK};
use crate::infrastructure::clients::{ChainClientFactory, ReadClient};
use crate::shared::constants::{STAT_POLL_INTERVAL_SECS, TOTAL_SUPPLY_SIGNATURE};
use crate::shared::error::WalletError;

/// One cycle's worth of displayed chain statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkStats {
    pub network: Option<NetworkId>,
    pub block_number: u64,
    pub gas_price_wei: U256,
    /// `None` means the NFT contract is not deployed on this network
    pub nft_supply: Option<u64>,
}

pub struct StatSynchronizer {
    clients: Arc<ChainClientFactory>,
}

/// Handle to a running poll loop; dropping it does not stop the loop,
/// call [`SyncHandle::stop`] to tear down deterministically.
pub struct SyncHandle {
    stats: watch::Receiver<NetworkStats>,
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SyncHandle {
    pub fn stats(&self) -> watch::Receiver<NetworkStats> {
        self.stats.clone()
    }

    /// Cancel the loop and wait for it to finish, guaranteeing no
    /// further publishes after return
    pub async fn stop(self) {
        let _ = self.stop.send(true);
        let _ = self.task.await;
    }
}

impl StatSynchronizer {
    pub fn new(clients: Arc<ChainClientFactory>) -> Self {
        Self { clients }
    }

    /// Fetch one cycle of stats for the network.
    ///
    /// Block height and gas price are requested together; the NFT supply
    /// read is gated on the contract being deployed and is never
    /// attempted against the zero sentinel.
    pub async fn fetch_stats(&self, network: NetworkId) -> NetworkStats {
        let mut stats = NetworkStats {
            network: Some(network),
            ..Default::default()
        };
        let client = match self.clients.client(network) {
            Ok(client) => client,
            Err(e) => {
                log::warn!("stat cycle skipped, no client for {network}: {e}");
                return stats;
            }
        };

        let (block_number, gas_price) =
            tokio::join!(client.get_block_number(), client.get_gas_price());
        match block_number {
            Ok(number) => stats.block_number = number.as_u64(),
            Err(e) => log::warn!("block height fetch failed on {network}: {e}"),
        }
        match gas_price {
            Ok(price) => stats.gas_price_wei = price,
            Err(e) => log::warn!("gas price fetch failed on {network}: {e}"),
        }

        if self
            .clients
            .registry()
            .has_deployed_contract(network, ContractRole::Nft)
        {
            match self.read_nft_supply(&client, network).await {
                Ok(supply) => stats.nft_supply = Some(supply),
                Err(e) => {
                    log::warn!("NFT supply read failed on {network}: {e}");
                    stats.nft_supply = Some(0);
                }
            }
        }

        stats
    }

    async fn read_nft_supply(
        &self,
        client: &Arc<ReadClient>,
        network: NetworkId,
    ) -> Result<u64, WalletError> {
        let address = self
            .clients
            .registry()
            .contract_address(network, ContractRole::Nft);
        let abi = parse_abi(&[TOTAL_SUPPLY_SIGNATURE])
            .map_err(|e| WalletError::internal(format!("bad totalSupply ABI: {e}")))?;
        let contract = Contract::new(address, abi, client.clone());
        let supply: U256 = contract
            .method("totalSupply", ())
            .map_err(|e| WalletError::internal(format!("totalSupply call setup: {e}")))?
            .call()
            .await
            .map_err(|e| WalletError::rpc_unavailable(e.to_string()))?;
        Ok(supply.as_u64())
    }

    /// Run the refresh cycle on the standard period
    pub fn spawn_default(self, session_rx: watch::Receiver<WalletSession>) -> SyncHandle {
        self.spawn(session_rx, Duration::from_secs(STAT_POLL_INTERVAL_SECS))
    }

    /// Run the recurring refresh cycle until stopped.
    ///
    /// The active network is re-read from the session at each cycle; a
    /// session change mid-sleep restarts the cycle immediately, and a
    /// fetch that raced a network change is discarded instead of
    /// published.
    pub fn spawn(
        self,
        mut session_rx: watch::Receiver<WalletSession>,
        period: Duration,
    ) -> SyncHandle {
        let (stats_tx, stats_rx) = watch::channel(NetworkStats::default());
        let (stop_tx, mut stop_rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            loop {
                if *stop_rx.borrow() {
                    break;
                }
                let network = session_rx.borrow().network.unwrap_or(FALLBACK_NETWORK);

                let fetched = tokio::select! {
                    stats = self.fetch_stats(network) => Some(stats),
                    _ = stop_rx.changed() => None,
                };
                let Some(stats) = fetched else { break };

                let current = session_rx.borrow().network.unwrap_or(FALLBACK_NETWORK);
                if current == network {
                    stats_tx.send_replace(stats);
                } else {
                    log::debug!("discarding stats for {network}, session moved to {current}");
                    continue;
                }

                tokio::select! {
                    _ = tokio::time::sleep(period) => {}
                    _ = stop_rx.changed() => break,
                    changed = session_rx.changed() => {
                        if changed.is_err() {
                            // session tracker gone; keep polling the last network
                            tokio::time::sleep(period).await;
                        }
                    }
                }
            }
            log::debug!("stat poll loop stopped");
        });

        SyncHandle {
            stats: stats_rx,
            stop: stop_tx,
            task,
        }
    }
}
