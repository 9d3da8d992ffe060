//! Wallet provider boundary
//!
//! Abstracts the injected browser wallet (account requests, chain id
//! queries, network switching, raw transaction sends, and push
//! notifications). Every error crossing this boundary is decoded once
//! into a [`ProviderFailure`]; call sites never inspect raw payloads.

use async_trait::async_trait;
use ethers::core::types::{Bytes, H256, U256};
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::mpsc;

use crate::domain::network::NetworkDescriptor;
use crate::shared::constants::{CODE_UNRECOGNIZED_CHAIN, CODE_USER_REJECTED};

/// Push notification from the wallet provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProviderEvent {
    /// New chain id, hex-encoded as pushed by the wallet
    ChainChanged(String),
    AccountsChanged(Vec<String>),
}

/// A provider-side failure, decoded once at the boundary.
///
/// Carries the structured revert reason and nested data message when the
/// provider supplied them, plus the top-level message as a fallback.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderFailure {
    pub code: Option<i64>,
    pub reason: Option<String>,
    pub data_message: Option<String>,
    pub message: Option<String>,
}

impl ProviderFailure {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            message: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Default::default()
        }
    }

    /// Decode a raw provider error payload.
    ///
    /// Recognized shapes, in priority order: a structured `reason`, a
    /// nested `data.message`, a nested `data.data` string, and the
    /// top-level `message`.
    pub fn from_json(value: &serde_json::Value) -> Self {
        let as_string = |v: &serde_json::Value| v.as_str().map(str::to_string);
        let data = &value["data"];
        Self {
            code: value["code"].as_i64(),
            reason: as_string(&value["reason"]),
            data_message: as_string(&data["message"]).or_else(|| as_string(&data["data"])),
            message: as_string(&value["message"]),
        }
    }

    /// Best-effort human-readable message
    pub fn user_message(&self) -> String {
        self.reason
            .clone()
            .or_else(|| self.data_message.clone())
            .or_else(|| self.message.clone())
            .unwrap_or_else(|| "Unknown error".to_string())
    }

    /// True iff the payload carried a structured revert indication
    pub fn is_revert(&self) -> bool {
        self.reason.is_some() || self.data_message.is_some()
    }

    pub fn is_user_rejection(&self) -> bool {
        self.code == Some(CODE_USER_REJECTED)
    }

    pub fn is_unrecognized_chain(&self) -> bool {
        self.code == Some(CODE_UNRECOGNIZED_CHAIN)
    }
}

impl fmt::Display for ProviderFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.user_message())
    }
}

impl std::error::Error for ProviderFailure {}

/// Transaction parameters handed to the wallet's send call
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WalletTxRequest {
    pub from: String,
    pub to: String,
    pub value: Option<U256>,
    pub data: Option<Bytes>,
    pub gas: Option<U256>,
    pub gas_price: Option<U256>,
}

/// Parameters for registering a network with the wallet provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddChainParams {
    pub chain_id_hex: String,
    pub chain_name: String,
    pub currency_name: String,
    pub currency_symbol: String,
    pub currency_decimals: u8,
    pub rpc_urls: Vec<String>,
}

impl From<&NetworkDescriptor> for AddChainParams {
    fn from(descriptor: &NetworkDescriptor) -> Self {
        Self {
            chain_id_hex: descriptor.chain_id_hex.clone(),
            chain_name: descriptor.display_name.clone(),
            currency_name: descriptor.currency_name.clone(),
            currency_symbol: descriptor.currency_symbol.clone(),
            currency_decimals: descriptor.currency_decimals,
            rpc_urls: vec![descriptor.rpc_url.clone()],
        }
    }
}

/// The wallet provider surface the core consumes.
///
/// At most one event subscription is active per session; `subscribe`
/// returns `None` once the receiver has been handed out.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Prompt the user for accounts (connect flow)
    async fn request_accounts(&self) -> Result<Vec<String>, ProviderFailure>;

    /// Accounts already exposed without prompting
    async fn accounts(&self) -> Result<Vec<String>, ProviderFailure>;

    /// Current chain id, hex-encoded
    async fn chain_id(&self) -> Result<String, ProviderFailure>;

    async fn switch_chain(&self, chain_id_hex: &str) -> Result<(), ProviderFailure>;

    async fn add_chain(&self, params: AddChainParams) -> Result<(), ProviderFailure>;

    async fn estimate_gas(&self, tx: &WalletTxRequest) -> Result<U256, ProviderFailure>;

    /// Single legacy gas price (the chain has no priority-fee market)
    async fn gas_price(&self) -> Result<U256, ProviderFailure>;

    async fn send_transaction(&self, tx: &WalletTxRequest) -> Result<H256, ProviderFailure>;

    fn subscribe(&self) -> Option<mpsc::UnboundedReceiver<ProviderEvent>>;
}

/// Parse a hex chain id (`0x`-prefixed or bare) into a numeric id
pub fn parse_chain_id_hex(value: &str) -> Option<u64> {
    let stripped = value.trim().trim_start_matches("0x");
    u64::from_str_radix(stripped, 16).ok()
}

#[cfg(test)]
pub(crate) mod mock {
    //! Scriptable in-memory wallet provider for tests

    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct MockProvider {
        pub accounts: Vec<String>,
        pub chain_id_hex: Mutex<String>,
        pub reject_accounts: bool,
        pub fail_estimate: bool,
        pub estimate: u64,
        pub fail_gas_price: bool,
        pub gas_price: u64,
        pub switch_failure_code: Option<i64>,
        pub fail_add_chain: bool,
        pub send_failure: Option<ProviderFailure>,
        pub sent: Mutex<Vec<WalletTxRequest>>,
        pub events: Mutex<Option<mpsc::UnboundedReceiver<ProviderEvent>>>,
        pub switched_to: Mutex<Vec<String>>,
        pub added_chains: Mutex<Vec<AddChainParams>>,
    }

    impl MockProvider {
        pub fn connected(account: &str, chain_id_hex: &str) -> Self {
            Self {
                accounts: vec![account.to_string()],
                chain_id_hex: Mutex::new(chain_id_hex.to_string()),
                estimate: 100_000,
                gas_price: 2_000_000_000,
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl WalletProvider for MockProvider {
        async fn request_accounts(&self) -> Result<Vec<String>, ProviderFailure> {
            if self.reject_accounts {
                return Err(ProviderFailure::new(
                    CODE_USER_REJECTED,
                    "User rejected the request.",
                ));
            }
            Ok(self.accounts.clone())
        }

        async fn accounts(&self) -> Result<Vec<String>, ProviderFailure> {
            Ok(self.accounts.clone())
        }

        async fn chain_id(&self) -> Result<String, ProviderFailure> {
            Ok(self.chain_id_hex.lock().unwrap().clone())
        }

        async fn switch_chain(&self, chain_id_hex: &str) -> Result<(), ProviderFailure> {
            if let Some(code) = self.switch_failure_code {
                return Err(ProviderFailure::new(code, "switch failed"));
            }
            *self.chain_id_hex.lock().unwrap() = chain_id_hex.to_string();
            self.switched_to
                .lock()
                .unwrap()
                .push(chain_id_hex.to_string());
            Ok(())
        }

        async fn add_chain(&self, params: AddChainParams) -> Result<(), ProviderFailure> {
            if self.fail_add_chain {
                return Err(ProviderFailure::message("add chain failed"));
            }
            *self.chain_id_hex.lock().unwrap() = params.chain_id_hex.clone();
            self.added_chains.lock().unwrap().push(params);
            Ok(())
        }

        async fn estimate_gas(&self, _tx: &WalletTxRequest) -> Result<U256, ProviderFailure> {
            if self.fail_estimate {
                return Err(ProviderFailure::message("execution reverted"));
            }
            Ok(U256::from(self.estimate))
        }

        async fn gas_price(&self) -> Result<U256, ProviderFailure> {
            if self.fail_gas_price {
                return Err(ProviderFailure::message("gas price unavailable"));
            }
            Ok(U256::from(self.gas_price))
        }

        async fn send_transaction(&self, tx: &WalletTxRequest) -> Result<H256, ProviderFailure> {
            if let Some(failure) = &self.send_failure {
                return Err(failure.clone());
            }
            self.sent.lock().unwrap().push(tx.clone());
            Ok(H256::from_low_u64_be(self.sent.lock().unwrap().len() as u64))
        }

        fn subscribe(&self) -> Option<mpsc::UnboundedReceiver<ProviderEvent>> {
            self.events.lock().unwrap().take()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_user_message_priority_order() {
        let failure = ProviderFailure {
            code: None,
            reason: Some("execution reverted: stale key".to_string()),
            data_message: Some("nested".to_string()),
            message: Some("top".to_string()),
        };
        assert_eq!(failure.user_message(), "execution reverted: stale key");

        let failure = ProviderFailure {
            reason: None,
            ..failure
        };
        assert_eq!(failure.user_message(), "nested");

        let failure = ProviderFailure {
            data_message: None,
            ..failure
        };
        assert_eq!(failure.user_message(), "top");

        assert_eq!(ProviderFailure::default().user_message(), "Unknown error");
    }

    #[test]
    fn test_from_json_structured_reason() {
        let failure = ProviderFailure::from_json(&json!({
            "code": -32000,
            "reason": "insufficient balance",
            "message": "execution error",
        }));
        assert_eq!(failure.code, Some(-32000));
        assert_eq!(failure.user_message(), "insufficient balance");
        assert!(failure.is_revert());
    }

    #[test]
    fn test_from_json_nested_data_shapes() {
        let with_message = ProviderFailure::from_json(&json!({
            "message": "top",
            "data": { "message": "revert: paused" },
        }));
        assert_eq!(with_message.user_message(), "revert: paused");

        let with_data_string = ProviderFailure::from_json(&json!({
            "message": "top",
            "data": { "data": "0x08c379a0" },
        }));
        assert_eq!(with_data_string.user_message(), "0x08c379a0");
    }

    #[test]
    fn test_error_code_classification() {
        assert!(ProviderFailure::new(4001, "no").is_user_rejection());
        assert!(ProviderFailure::new(4902, "unknown chain").is_unrecognized_chain());
        assert!(!ProviderFailure::new(-32603, "internal").is_user_rejection());
    }

    #[test]
    fn test_parse_chain_id_hex() {
        assert_eq!(parse_chain_id_hex("0x12fd1"), Some(77777));
        assert_eq!(parse_chain_id_hex("1e5a"), Some(7770));
        assert_eq!(parse_chain_id_hex("0xbdf86"), Some(777702));
        assert_eq!(parse_chain_id_hex("not-hex"), None);
    }
}
