//! Transaction construction and submission
//!
//! Builds the raw call data for the three value-bearing operations
//! (bridge deposit, withdrawal initiation, oracle data submission),
//! handles gas parameters with documented fallbacks, and pushes the
//! transaction through the wallet provider. The target chain only
//! supports legacy gas pricing, so a single gas price is attached and
//! priority fees are never used.

use std::sync::Arc;
use std::time::Duration;

use ethers::abi::Token;
use ethers::core::types::{Bytes, U256};
use ethers::core::utils::keccak256;
use ethers::providers::Middleware;
use tokio::time::Instant;

use crate::core::session::SessionTracker;
use crate::domain::network::{ContractRole, NetworkId, NetworkRegistry};
use crate::domain::transaction::{OperationKind, PendingTransaction, TxStatus};
use crate::infrastructure::clients::ReadClient;
use crate::infrastructure::provider::{AddChainParams, WalletProvider, WalletTxRequest};
use crate::shared::constants::{
    CONFIDENCE_SCALE, DEPOSIT_SELECTOR, FALLBACK_GAS_LIMIT, FALLBACK_GAS_PRICE,
    GAS_MARGIN_DENOMINATOR, GAS_MARGIN_NUMERATOR, INITIATE_WITHDRAWAL_SELECTOR,
    ORACLE_KEY_PREFIX, ORACLE_KEY_PROMPT_CHARS, RECEIPT_POLL_INTERVAL_SECS,
    RECEIPT_WATCH_TIMEOUT_SECS, SUBMIT_DATA_SIGNATURE,
};
use crate::shared::error::WalletError;

/// Call data for the zero-argument bridge `deposit()` entry point
pub fn encode_deposit() -> Bytes {
    Bytes::from(DEPOSIT_SELECTOR.to_vec())
}

/// Call data for `initiateWithdrawal(uint256)`: the selector followed by
/// the amount as a 32-byte big-endian word
pub fn encode_withdrawal(amount: U256) -> Bytes {
    let mut data = Vec::with_capacity(36);
    data.extend_from_slice(&INITIATE_WITHDRAWAL_SELECTOR);
    let mut word = [0u8; 32];
    amount.to_big_endian(&mut word);
    data.extend_from_slice(&word);
    Bytes::from(data)
}

/// Storage key derived from a query prompt: `ai:` plus the first 32
/// characters with anything non-alphanumeric replaced by `_`
pub fn oracle_key(prompt: &str) -> String {
    let slug: String = prompt
        .chars()
        .take(ORACLE_KEY_PROMPT_CHARS)
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("{ORACLE_KEY_PREFIX}{slug}")
}

/// ABI-encoded call to `submitDataString(string,int256,uint256)`
pub fn encode_oracle_submission(key: &str, value: i128, confidence: u64) -> Bytes {
    let selector = &keccak256(SUBMIT_DATA_SIGNATURE.as_bytes())[..4];
    let arguments = ethers::abi::encode(&[
        Token::String(key.to_string()),
        Token::Int(int256_word(value)),
        Token::Uint(U256::from(confidence)),
    ]);
    let mut data = selector.to_vec();
    data.extend_from_slice(&arguments);
    Bytes::from(data)
}

/// Add the 20% safety margin to a successful gas estimate
pub fn apply_gas_margin(estimate: U256) -> U256 {
    estimate * U256::from(GAS_MARGIN_NUMERATOR) / U256::from(GAS_MARGIN_DENOMINATOR)
}

/// Two's-complement int256 representation of a signed value
fn int256_word(value: i128) -> U256 {
    if value >= 0 {
        U256::from(value as u128)
    } else {
        // wrap around the 256-bit space
        U256::MAX - U256::from(value.unsigned_abs()) + U256::one()
    }
}

/// Builds and submits value-bearing transactions through the wallet
pub struct TransactionSubmitter {
    provider: Arc<dyn WalletProvider>,
    registry: Arc<NetworkRegistry>,
    session: SessionTracker,
}

impl TransactionSubmitter {
    pub fn new(
        provider: Arc<dyn WalletProvider>,
        registry: Arc<NetworkRegistry>,
        session: SessionTracker,
    ) -> Self {
        Self {
            provider,
            registry,
            session,
        }
    }

    /// Bridge deposit (L1 -> L2): sends value with the deposit selector
    /// to the paired L1's bridge contract
    pub async fn deposit(&self, amount_wei: U256) -> Result<PendingTransaction, WalletError> {
        let account = self.connected_account()?;
        let pair = self.registry.paired_layer(self.session.active_network());
        if !self.registry.bridge_available(pair.l1) {
            return Err(WalletError::validation(
                "bridge contracts are not deployed for this network pair",
            ));
        }
        self.ensure_network(pair.l1).await?;

        let request = WalletTxRequest {
            from: account,
            to: format!(
                "{:?}",
                self.registry.contract_address(pair.l1, ContractRole::Bridge)
            ),
            value: Some(amount_wei),
            data: Some(encode_deposit()),
            ..Default::default()
        };
        self.submit(OperationKind::Deposit, request).await
    }

    /// Withdrawal initiation (L2 -> L1): zero value, amount carried in
    /// the call data, targets the paired L2's bridge contract. The
    /// withdrawal finalizes on L1 after the challenge period.
    pub async fn initiate_withdrawal(
        &self,
        amount_wei: U256,
    ) -> Result<PendingTransaction, WalletError> {
        let account = self.connected_account()?;
        let pair = self.registry.paired_layer(self.session.active_network());
        if !self.registry.bridge_available(pair.l2) {
            return Err(WalletError::validation(
                "bridge contracts are not deployed for this network pair",
            ));
        }
        self.ensure_network(pair.l2).await?;

        let request = WalletTxRequest {
            from: account,
            to: format!(
                "{:?}",
                self.registry.contract_address(pair.l2, ContractRole::Bridge)
            ),
            value: Some(U256::zero()),
            data: Some(encode_withdrawal(amount_wei)),
            ..Default::default()
        };
        self.submit(OperationKind::Withdraw, request).await
    }

    /// Commit an oracle answer on-chain.
    ///
    /// The key derives from the prompt; value and confidence are both
    /// the reported whole-percent confidence scaled by ten.
    pub async fn submit_oracle_data(
        &self,
        prompt: &str,
        confidence_pct: u64,
    ) -> Result<PendingTransaction, WalletError> {
        let account = self.connected_account()?;
        let network = self.session.active_network();
        if !self
            .registry
            .has_deployed_contract(network, ContractRole::Oracle)
        {
            return Err(WalletError::validation(format!(
                "oracle contract is not deployed on {network}"
            )));
        }

        let key = oracle_key(prompt);
        let scaled = confidence_pct * CONFIDENCE_SCALE;
        let data = encode_oracle_submission(&key, scaled as i128, scaled);

        let request = WalletTxRequest {
            from: account,
            to: format!(
                "{:?}",
                self.registry.contract_address(network, ContractRole::Oracle)
            ),
            data: Some(data),
            ..Default::default()
        };
        self.submit(OperationKind::OracleSubmit, request).await
    }

    /// Make the wallet's active network match `required`.
    ///
    /// Asks the provider to switch; when the provider does not know the
    /// chain (code 4902) it is registered first. Both failing is a
    /// terminal `UnknownNetwork` for this attempt.
    pub async fn ensure_network(&self, required: NetworkId) -> Result<(), WalletError> {
        let active = self.session.snapshot().network;
        if active == Some(required) {
            return Ok(());
        }
        let descriptor = self.registry.descriptor(required);
        log::info!(
            "switching wallet from {} to {required}",
            active.map_or_else(|| "undetected".to_string(), |n| n.to_string())
        );
        match self.provider.switch_chain(&descriptor.chain_id_hex).await {
            Ok(()) => {}
            Err(failure) if failure.is_user_rejection() => return Err(WalletError::UserRejected),
            Err(failure) if failure.is_unrecognized_chain() => {
                self.provider
                    .add_chain(AddChainParams::from(descriptor))
                    .await
                    .map_err(|add_failure| {
                        if add_failure.is_user_rejection() {
                            WalletError::UserRejected
                        } else {
                            WalletError::UnknownNetwork(required.to_string())
                        }
                    })?;
            }
            Err(failure) => {
                log::warn!("network switch failed: {failure}");
                return Err(WalletError::wrong_network(
                    required.to_string(),
                    active.map_or_else(|| "undetected".to_string(), |n| n.to_string()),
                ));
            }
        }
        // reflect locally; the provider also pushes a chain-changed event
        self.session.set_network(required);
        Ok(())
    }

    /// Receipt watch with the standard timeout
    pub async fn watch_receipt_default(
        &self,
        client: &Arc<ReadClient>,
        pending: &mut PendingTransaction,
    ) -> TxStatus {
        self.watch_receipt(
            client,
            pending,
            Duration::from_secs(RECEIPT_WATCH_TIMEOUT_SECS),
        )
        .await
    }

    /// Best-effort receipt watch; never treats the absence of a receipt
    /// as a transaction failure
    pub async fn watch_receipt(
        &self,
        client: &Arc<ReadClient>,
        pending: &mut PendingTransaction,
        timeout: Duration,
    ) -> TxStatus {
        let deadline = Instant::now() + timeout;
        let status = loop {
            match client.get_transaction_receipt(pending.hash).await {
                Ok(Some(receipt)) => {
                    if receipt.status == Some(1u64.into()) {
                        break TxStatus::Confirmed;
                    }
                    break TxStatus::Failed;
                }
                Ok(None) => {}
                Err(e) => log::debug!("receipt poll failed for {:?}: {e}", pending.hash),
            }
            if Instant::now() >= deadline {
                break TxStatus::UnknownTimeout;
            }
            tokio::time::sleep(Duration::from_secs(RECEIPT_POLL_INTERVAL_SECS)).await;
        };
        pending.status = status;
        status
    }

    fn connected_account(&self) -> Result<String, WalletError> {
        self.session
            .snapshot()
            .account
            .ok_or_else(|| WalletError::validation("wallet is not connected"))
    }

    async fn submit(
        &self,
        kind: OperationKind,
        mut request: WalletTxRequest,
    ) -> Result<PendingTransaction, WalletError> {
        request.gas = Some(match self.provider.estimate_gas(&request).await {
            Ok(estimate) => apply_gas_margin(estimate),
            Err(failure) => {
                log::warn!(
                    "gas estimation failed ({}), using fallback limit",
                    failure.user_message()
                );
                U256::from(FALLBACK_GAS_LIMIT)
            }
        });
        request.gas_price = Some(match self.provider.gas_price().await {
            Ok(price) => price,
            Err(failure) => {
                log::warn!(
                    "gas price fetch failed ({}), using fallback price",
                    failure.user_message()
                );
                U256::from(FALLBACK_GAS_PRICE)
            }
        });

        match self.provider.send_transaction(&request).await {
            Ok(hash) => {
                log::info!("submitted {kind:?} transaction {hash:?}");
                Ok(PendingTransaction::new(kind, hash))
            }
            Err(failure) if failure.is_user_rejection() => Err(WalletError::UserRejected),
            Err(failure) if failure.is_revert() => {
                Err(WalletError::transaction_reverted(failure.user_message()))
            }
            Err(failure) => Err(WalletError::transaction_rejected(failure.user_message())),
        }
    }
}
