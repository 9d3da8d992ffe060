//! Pending transaction entity

use chrono::{DateTime, Utc};
use ethers::core::types::H256;
use serde::{Deserialize, Serialize};

/// The value-bearing operations this core can submit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationKind {
    Deposit,
    Withdraw,
    OracleSubmit,
}

/// Lifecycle of a submitted transaction.
///
/// `UnknownTimeout` means no receipt was observed within the watch
/// window; it is not a failure of the transaction itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxStatus {
    Submitted,
    Confirmed,
    Failed,
    UnknownTimeout,
}

/// A transaction handed to the wallet provider for broadcast
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingTransaction {
    pub kind: OperationKind,
    pub hash: H256,
    pub status: TxStatus,
    pub submitted_at: DateTime<Utc>,
}

impl PendingTransaction {
    pub fn new(kind: OperationKind, hash: H256) -> Self {
        Self {
            kind,
            hash,
            status: TxStatus::Submitted,
            submitted_at: Utc::now(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self.status, TxStatus::Submitted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_pending_transaction_is_submitted() {
        let pending = PendingTransaction::new(OperationKind::Deposit, H256::zero());
        assert_eq!(pending.status, TxStatus::Submitted);
        assert!(!pending.is_terminal());
    }

    #[test]
    fn test_terminal_statuses() {
        let mut pending = PendingTransaction::new(OperationKind::Withdraw, H256::zero());
        for status in [TxStatus::Confirmed, TxStatus::Failed, TxStatus::UnknownTimeout] {
            pending.status = status;
            assert!(pending.is_terminal());
        }
    }
}
