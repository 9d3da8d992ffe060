//! Constants for the wallet core
//!
//! This module contains all constants used throughout the wallet core.

// Gas handling
pub const FALLBACK_GAS_LIMIT: u64 = 500_000;
pub const FALLBACK_GAS_PRICE: u64 = 1_000_000_000; // 1 Gwei, legacy price
pub const GAS_MARGIN_NUMERATOR: u64 = 12; // +20% safety margin on estimates
pub const GAS_MARGIN_DENOMINATOR: u64 = 10;

// Stat polling
pub const STAT_POLL_INTERVAL_SECS: u64 = 10;

// Receipt watching
pub const RECEIPT_POLL_INTERVAL_SECS: u64 = 2;
pub const RECEIPT_WATCH_TIMEOUT_SECS: u64 = 60;

// Oracle node network
pub const ORACLE_PROBE_TIMEOUT_SECS: u64 = 3;
pub const ORACLE_KEY_PREFIX: &str = "ai:";
pub const ORACLE_KEY_PROMPT_CHARS: usize = 32;
pub const DEFAULT_MAX_TOKENS: u32 = 150;
pub const DEFAULT_CONFIDENCE_PCT: u64 = 85;
pub const CONFIDENCE_SCALE: u64 = 10; // on-chain value/confidence are percent * 10

// Contract function selectors (first 4 bytes of keccak256 of the canonical signature)
pub const DEPOSIT_SELECTOR: [u8; 4] = [0xd0, 0xe3, 0x0d, 0xb0]; // deposit()
pub const INITIATE_WITHDRAWAL_SELECTOR: [u8; 4] = [0xc0, 0xd9, 0xba, 0xe8]; // initiateWithdrawal(uint256)
pub const SUBMIT_DATA_SIGNATURE: &str = "submitDataString(string,int256,uint256)";
pub const TOTAL_SUPPLY_SIGNATURE: &str = "function totalSupply() external view returns (uint256)";

// EIP-1193 provider error codes
pub const CODE_USER_REJECTED: i64 = 4001;
pub const CODE_UNRECOGNIZED_CHAIN: i64 = 4902;

// Environment variable names for configuration overrides
pub const ENV_RPC_HOST: &str = "NANOPY_RPC_HOST";
pub const ENV_CONTRACT_PREFIX: &str = "NANOPY";
