//! Wallet session tracking
//!
//! Owns the connected account and detected network for the lifetime of
//! the process. All mutation funnels through one `watch` channel, so
//! observers always see a consistent snapshot and there is a single
//! writer. Reads that race a network or account change are keyed to a
//! generation counter and discarded when they lose the race.

use std::sync::Arc;

use ethers::core::types::{Address, U256};
use ethers::providers::Middleware;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::domain::network::{NetworkId, FALLBACK_NETWORK};
use crate::infrastructure::clients::ChainClientFactory;
use crate::infrastructure::provider::{parse_chain_id_hex, ProviderEvent, WalletProvider};
use crate::shared::error::WalletError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Snapshot of the wallet session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletSession {
    pub state: SessionState,
    pub account: Option<String>,
    pub network: Option<NetworkId>,
    /// Last-known-good native balance in wei; kept on read failures
    pub balance_wei: U256,
    /// Bumped on every account or network change; stale reads check it
    pub generation: u64,
}

impl Default for WalletSession {
    fn default() -> Self {
        Self {
            state: SessionState::Disconnected,
            account: None,
            network: None,
            balance_wei: U256::zero(),
            generation: 0,
        }
    }
}

/// Process-wide tracker for the wallet session state machine
#[derive(Clone)]
pub struct SessionTracker {
    provider: Option<Arc<dyn WalletProvider>>,
    clients: Arc<ChainClientFactory>,
    tx: watch::Sender<WalletSession>,
}

impl SessionTracker {
    pub fn new(
        provider: Option<Arc<dyn WalletProvider>>,
        clients: Arc<ChainClientFactory>,
    ) -> Self {
        let (tx, _) = watch::channel(WalletSession::default());
        Self {
            provider,
            clients,
            tx,
        }
    }

    /// Observe session changes
    pub fn subscribe(&self) -> watch::Receiver<WalletSession> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> WalletSession {
        self.tx.borrow().clone()
    }

    /// Explicit connect request.
    ///
    /// Moves Disconnected -> Connecting -> Connected; falls back to
    /// Disconnected when the provider is absent or the user rejects the
    /// prompt. On success the current network is detected and a balance
    /// read is issued for the active account.
    pub async fn connect(&self) -> Result<WalletSession, WalletError> {
        let provider = self
            .provider
            .clone()
            .ok_or(WalletError::ProviderUnavailable)?;

        self.tx.send_modify(|s| s.state = SessionState::Connecting);

        let accounts = match provider.request_accounts().await {
            Ok(accounts) => accounts,
            Err(failure) => {
                self.tx
                    .send_modify(|s| s.state = SessionState::Disconnected);
                if failure.is_user_rejection() {
                    return Err(WalletError::UserRejected);
                }
                return Err(WalletError::rpc_unavailable(failure.user_message()));
            }
        };
        let Some(account) = accounts.first().cloned() else {
            self.tx
                .send_modify(|s| s.state = SessionState::Disconnected);
            return Err(WalletError::UserRejected);
        };

        log::info!("wallet connected: {account}");
        self.tx.send_modify(|s| {
            s.state = SessionState::Connected;
            s.account = Some(account);
            s.generation += 1;
        });

        self.detect_network(&provider).await;
        self.refresh_balance().await;
        Ok(self.snapshot())
    }

    /// Passive detection: resolve the current network (and any already
    /// exposed account) without prompting, so read-only views work.
    pub async fn detect(&self) -> Option<NetworkId> {
        let provider = self.provider.clone()?;
        let network = self.detect_network(&provider).await;

        if let Ok(accounts) = provider.accounts().await {
            if let Some(account) = accounts.first().cloned() {
                self.tx.send_modify(|s| {
                    s.state = SessionState::Connected;
                    s.account = Some(account);
                    s.generation += 1;
                });
                self.refresh_balance().await;
            }
        }
        network
    }

    /// Apply a provider push notification.
    ///
    /// Balance refreshes run as separate tasks; a notification arriving
    /// while one is in flight simply bumps the generation, and the stale
    /// result is dropped at publish time.
    pub fn handle_event(&self, event: ProviderEvent) {
        match event {
            ProviderEvent::ChainChanged(chain_id_hex) => {
                let chain_id = parse_chain_id_hex(&chain_id_hex).unwrap_or(0);
                let network = self.clients.registry().lookup_by_chain_id(chain_id);
                log::info!("provider switched to chain {chain_id_hex} ({network})");
                self.tx.send_modify(|s| {
                    if s.network != Some(network) {
                        s.network = Some(network);
                        s.generation += 1;
                    }
                });
                self.spawn_balance_refresh();
            }
            ProviderEvent::AccountsChanged(accounts) => match accounts.first().cloned() {
                Some(account) => {
                    self.tx.send_modify(|s| {
                        if s.account.as_deref() != Some(account.as_str()) {
                            s.state = SessionState::Connected;
                            s.account = Some(account);
                            s.generation += 1;
                        }
                    });
                    self.spawn_balance_refresh();
                }
                None => {
                    log::info!("provider reports no accounts; session disconnected");
                    self.tx.send_modify(|s| {
                        s.state = SessionState::Disconnected;
                        s.account = None;
                        s.generation += 1;
                    });
                }
            },
        }
    }

    /// Record a locally requested network switch before the provider
    /// pushes the corresponding chain-changed notification
    pub fn set_network(&self, network: NetworkId) {
        self.tx.send_modify(|s| {
            if s.network != Some(network) {
                s.network = Some(network);
                s.generation += 1;
            }
        });
    }

    /// Drain provider notifications until the stream ends.
    ///
    /// Returns `None` when there is no provider or its single event
    /// subscription was already taken.
    pub fn spawn_event_loop(&self) -> Option<JoinHandle<()>> {
        let mut events = self.provider.as_ref()?.subscribe()?;
        let tracker = self.clone();
        Some(tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                tracker.handle_event(event);
            }
            log::debug!("provider event stream closed");
        }))
    }

    /// Re-read the active account's balance on the active network.
    ///
    /// Failures keep the last-known value; a result that raced a
    /// network or account change is discarded.
    pub async fn refresh_balance(&self) {
        let (account, network, generation) = {
            let session = self.tx.borrow();
            match (&session.account, session.network) {
                (Some(account), Some(network)) => {
                    (account.clone(), network, session.generation)
                }
                _ => return,
            }
        };
        let address: Address = match account.parse() {
            Ok(address) => address,
            Err(_) => {
                log::warn!("provider returned unparseable account {account}");
                return;
            }
        };
        let client = match self.clients.client(network) {
            Ok(client) => client,
            Err(e) => {
                log::warn!("no read client for {network}: {e}");
                return;
            }
        };
        match client.get_balance(address, None).await {
            Ok(balance) => {
                self.publish_balance(generation, balance);
            }
            Err(e) => {
                log::warn!("balance fetch failed on {network}, keeping last known: {e}");
            }
        }
    }

    fn spawn_balance_refresh(&self) {
        let tracker = self.clone();
        tokio::spawn(async move {
            tracker.refresh_balance().await;
        });
    }

    /// Publish a fetched balance unless the session moved on while the
    /// fetch was in flight. Returns whether the value was stored.
    pub(crate) fn publish_balance(&self, generation: u64, balance: U256) -> bool {
        let mut stored = false;
        self.tx.send_if_modified(|s| {
            if s.generation != generation {
                log::debug!("discarding stale balance for generation {generation}");
                return false;
            }
            s.balance_wei = balance;
            stored = true;
            true
        });
        stored
    }

    /// Network to use for reads right now, falling back to the
    /// documented default when none has been detected
    pub fn active_network(&self) -> NetworkId {
        self.tx.borrow().network.unwrap_or(FALLBACK_NETWORK)
    }

    async fn detect_network(&self, provider: &Arc<dyn WalletProvider>) -> Option<NetworkId> {
        match provider.chain_id().await {
            Ok(chain_id_hex) => {
                let chain_id = parse_chain_id_hex(&chain_id_hex).unwrap_or(0);
                let network = self.clients.registry().lookup_by_chain_id(chain_id);
                self.tx.send_modify(|s| {
                    if s.network != Some(network) {
                        s.network = Some(network);
                        s.generation += 1;
                    }
                });
                Some(network)
            }
            Err(failure) => {
                log::warn!("chain id query failed: {failure}");
                None
            }
        }
    }
}
