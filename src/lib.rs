//! NanoPy Wallet Core
//!
//! Chain-state coordination for the NanoPy network family.
//! Tracks the injected wallet session, keeps per-network read clients,
//! synchronizes displayed chain statistics, builds and submits bridge
//! and oracle transactions, and selects a healthy oracle node.
//!
//! ## Architecture
//!
//! - **Core**: session tracking, stat sync, transaction submission, oracle selection
//! - **Domain**: network registry, transaction and oracle entities
//! - **Infrastructure**: wallet provider boundary and read client factory
//! - **Shared**: common constants and error handling
//!
//! ## Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use nanopy_wallet_core::{ChainClientFactory, NetworkRegistry, SessionTracker};
//!
//! let registry = Arc::new(NetworkRegistry::new());
//! let clients = Arc::new(ChainClientFactory::new(registry));
//! let session = SessionTracker::new(None, clients);
//! let mut updates = session.subscribe();
//! ```

pub mod core;
pub mod domain;
pub mod infrastructure;
pub mod shared;

pub use crate::core::oracle::OracleSelector;
pub use crate::core::session::{SessionState, SessionTracker, WalletSession};
pub use crate::core::sync::{NetworkStats, StatSynchronizer, SyncHandle};
pub use crate::core::transactions::TransactionSubmitter;
pub use crate::domain::network::{ContractRole, NetworkId, NetworkRegistry, RegistryConfig};
pub use crate::domain::oracle::{OracleAnswer, OracleEndpointState, OracleNode, OracleStatus};
pub use crate::domain::transaction::{OperationKind, PendingTransaction, TxStatus};
pub use crate::infrastructure::clients::ChainClientFactory;
pub use crate::infrastructure::provider::{
    AddChainParams, ProviderEvent, ProviderFailure, WalletProvider, WalletTxRequest,
};
pub use crate::shared::error::WalletError;
