//! Network identities and the static network registry
//!
//! The registry is the single source of truth for the supported NanoPy
//! networks: chain ids, RPC endpoints, currency metadata, the L1/L2
//! pairing used by the bridge, and per-network contract deployments.
//! All lookup functions are pure and never fail.

use std::collections::HashMap;
use std::env;
use std::fmt;

use ethers::core::types::Address;
use serde::{Deserialize, Serialize};

use crate::shared::constants::{ENV_CONTRACT_PREFIX, ENV_RPC_HOST};
use crate::shared::error::WalletError;

/// Default RPC host; every network is served from a different port on it
pub const DEFAULT_RPC_HOST: &str = "51.68.125.99";

/// Network resolved when a chain id is not recognized.
///
/// The contracts users can actually reach today live on the testnet pair,
/// so unknown and undetected networks resolve there everywhere.
pub const FALLBACK_NETWORK: NetworkId = NetworkId::Testnet;

/// Supported networks: mainnet/testnet pairs of the L1 and the Turbo L2
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum NetworkId {
    Mainnet,
    Testnet,
    Turbo,
    TurboTestnet,
}

impl NetworkId {
    pub const ALL: [NetworkId; 4] = [
        NetworkId::Mainnet,
        NetworkId::Testnet,
        NetworkId::Turbo,
        NetworkId::TurboTestnet,
    ];

    pub fn chain_id(&self) -> u64 {
        match self {
            NetworkId::Mainnet => 7770,
            NetworkId::Testnet => 77777,
            NetworkId::Turbo => 77702,
            NetworkId::TurboTestnet => 777702,
        }
    }

    pub fn chain_id_hex(&self) -> &'static str {
        match self {
            NetworkId::Mainnet => "0x1e5a",
            NetworkId::Testnet => "0x12fd1",
            NetworkId::Turbo => "0x12f86",
            NetworkId::TurboTestnet => "0xbdf86",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            NetworkId::Mainnet => "NanoPy Mainnet",
            NetworkId::Testnet => "Pyralis Testnet",
            NetworkId::Turbo => "NanoPy Turbo",
            NetworkId::TurboTestnet => "Turbo Testnet",
        }
    }

    pub fn short_name(&self) -> &'static str {
        match self {
            NetworkId::Mainnet => "L1",
            NetworkId::Testnet => "L1 Test",
            NetworkId::Turbo => "L2",
            NetworkId::TurboTestnet => "L2 Test",
        }
    }

    pub fn is_l2(&self) -> bool {
        matches!(self, NetworkId::Turbo | NetworkId::TurboTestnet)
    }

    /// The layer-1 this network settles to; present iff this is an L2
    pub fn l1_network(&self) -> Option<NetworkId> {
        match self {
            NetworkId::Turbo => Some(NetworkId::Mainnet),
            NetworkId::TurboTestnet => Some(NetworkId::Testnet),
            _ => None,
        }
    }

    fn rpc_port(&self) -> u16 {
        match self {
            NetworkId::Mainnet => 8545,
            NetworkId::Testnet => 8546,
            NetworkId::Turbo => 8547,
            NetworkId::TurboTestnet => 8548,
        }
    }

    fn env_key(&self) -> &'static str {
        match self {
            NetworkId::Mainnet => "MAINNET",
            NetworkId::Testnet => "TESTNET",
            NetworkId::Turbo => "TURBO",
            NetworkId::TurboTestnet => "TURBO_TESTNET",
        }
    }
}

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Logical roles of the deployed contracts
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ContractRole {
    Dex,
    StableToken,
    Nft,
    Bridge,
    Oracle,
}

impl ContractRole {
    pub const ALL: [ContractRole; 5] = [
        ContractRole::Dex,
        ContractRole::StableToken,
        ContractRole::Nft,
        ContractRole::Bridge,
        ContractRole::Oracle,
    ];

    fn env_key(&self) -> &'static str {
        match self {
            ContractRole::Dex => "DEX",
            ContractRole::StableToken => "USDN",
            ContractRole::Nft => "NFT",
            ContractRole::Bridge => "BRIDGE",
            ContractRole::Oracle => "ORACLE",
        }
    }
}

/// Static configuration record for one network
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkDescriptor {
    pub id: NetworkId,
    pub chain_id: u64,
    pub chain_id_hex: String,
    pub display_name: String,
    pub short_name: String,
    pub currency_name: String,
    pub currency_symbol: String,
    pub currency_decimals: u8,
    pub rpc_url: String,
    pub is_l2: bool,
    pub l1_network: Option<NetworkId>,
    pub contracts: HashMap<ContractRole, Address>,
}

/// The L1/L2 pair a bridge operation moves value between
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerPair {
    pub l1: NetworkId,
    pub l2: NetworkId,
}

/// Registry construction parameters, supplied once at process start
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    pub rpc_host: String,
    pub contract_overrides: Vec<(NetworkId, ContractRole, Address)>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            rpc_host: DEFAULT_RPC_HOST.to_string(),
            contract_overrides: Vec::new(),
        }
    }
}

/// Static table of known networks with pure lookup functions
#[derive(Debug, Clone)]
pub struct NetworkRegistry {
    descriptors: HashMap<NetworkId, NetworkDescriptor>,
}

impl Default for NetworkRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl NetworkRegistry {
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    pub fn with_rpc_host(host: &str) -> Self {
        Self::with_config(RegistryConfig {
            rpc_host: host.to_string(),
            ..Default::default()
        })
    }

    pub fn with_config(config: RegistryConfig) -> Self {
        let mut descriptors = HashMap::new();
        for id in NetworkId::ALL {
            descriptors.insert(id, build_descriptor(id, &config.rpc_host));
        }
        for (id, role, address) in config.contract_overrides {
            if let Some(descriptor) = descriptors.get_mut(&id) {
                descriptor.contracts.insert(role, address);
            }
        }
        Self { descriptors }
    }

    /// Build the registry from `NANOPY_*` environment variables.
    ///
    /// `NANOPY_RPC_HOST` overrides the RPC host; contract addresses are
    /// overridden per network and role, e.g. `NANOPY_TESTNET_ORACLE`.
    pub fn from_env() -> Result<Self, WalletError> {
        let rpc_host = env::var(ENV_RPC_HOST).unwrap_or_else(|_| DEFAULT_RPC_HOST.to_string());
        let mut contract_overrides = Vec::new();
        for id in NetworkId::ALL {
            for role in ContractRole::ALL {
                let var = format!(
                    "{}_{}_{}",
                    ENV_CONTRACT_PREFIX,
                    id.env_key(),
                    role.env_key()
                );
                if let Ok(value) = env::var(&var) {
                    let address: Address = value.parse().map_err(|_| {
                        WalletError::validation(format!("Invalid address in {var}: {value}"))
                    })?;
                    contract_overrides.push((id, role, address));
                }
            }
        }
        Ok(Self::with_config(RegistryConfig {
            rpc_host,
            contract_overrides,
        }))
    }

    /// Resolve a chain id to a network identity.
    ///
    /// Unrecognized ids resolve to [`FALLBACK_NETWORK`]; this never fails.
    pub fn lookup_by_chain_id(&self, chain_id: u64) -> NetworkId {
        NetworkId::ALL
            .into_iter()
            .find(|id| id.chain_id() == chain_id)
            .unwrap_or(FALLBACK_NETWORK)
    }

    /// Descriptor for a network; total over the closed identity set
    pub fn descriptor(&self, id: NetworkId) -> &NetworkDescriptor {
        // every NetworkId is inserted at construction
        &self.descriptors[&id]
    }

    /// The L1/L2 pair for bridging from the given network.
    ///
    /// An L2 pairs with the L1 named by its descriptor; an L1 pairs with
    /// its Turbo counterpart by the mainnet/testnet convention.
    pub fn paired_layer(&self, id: NetworkId) -> LayerPair {
        if let Some(l1) = id.l1_network() {
            LayerPair { l1, l2: id }
        } else {
            let l2 = match id {
                NetworkId::Mainnet => NetworkId::Turbo,
                _ => NetworkId::TurboTestnet,
            };
            LayerPair { l1: id, l2 }
        }
    }

    /// True iff the role's address on this network is not the zero sentinel
    pub fn has_deployed_contract(&self, id: NetworkId, role: ContractRole) -> bool {
        self.contract_address(id, role) != Address::zero()
    }

    /// Deployed address for a role; the zero address means "not deployed"
    pub fn contract_address(&self, id: NetworkId, role: ContractRole) -> Address {
        self.descriptor(id)
            .contracts
            .get(&role)
            .copied()
            .unwrap_or_else(Address::zero)
    }

    /// True iff both sides of the network's layer pair carry a bridge contract
    pub fn bridge_available(&self, id: NetworkId) -> bool {
        let pair = self.paired_layer(id);
        self.has_deployed_contract(pair.l1, ContractRole::Bridge)
            && self.has_deployed_contract(pair.l2, ContractRole::Bridge)
    }

    /// Networks currently surfaced to users (the testnet pair)
    pub fn active_networks(&self) -> Vec<NetworkId> {
        vec![NetworkId::Testnet, NetworkId::TurboTestnet]
    }
}

fn build_descriptor(id: NetworkId, rpc_host: &str) -> NetworkDescriptor {
    NetworkDescriptor {
        id,
        chain_id: id.chain_id(),
        chain_id_hex: id.chain_id_hex().to_string(),
        display_name: id.display_name().to_string(),
        short_name: id.short_name().to_string(),
        currency_name: "NanoPy".to_string(),
        currency_symbol: "NPY".to_string(),
        currency_decimals: 18,
        rpc_url: format!("http://{}:{}", rpc_host, id.rpc_port()),
        is_l2: id.is_l2(),
        l1_network: id.l1_network(),
        contracts: default_contracts(id),
    }
}

fn default_contracts(id: NetworkId) -> HashMap<ContractRole, Address> {
    let mut contracts: HashMap<ContractRole, Address> = ContractRole::ALL
        .into_iter()
        .map(|role| (role, Address::zero()))
        .collect();
    match id {
        NetworkId::Mainnet => {
            contracts.insert(
                ContractRole::Dex,
                static_addr("0xede9d1fc39fa3a1474c2c5b7844299ce0edea76f"),
            );
            contracts.insert(
                ContractRole::StableToken,
                static_addr("0xa77fdeca1f624a57ccd07b0e3a9bcbcdd75f9f89"),
            );
            contracts.insert(
                ContractRole::Nft,
                static_addr("0x1e68c7e965761ca06038fd157c640d5675db228d"),
            );
        }
        NetworkId::Testnet => {
            contracts.insert(
                ContractRole::Oracle,
                static_addr("0x33d07a295784af1048321fa509eb16e4bb0a1b7f"),
            );
        }
        _ => {}
    }
    contracts
}

fn static_addr(s: &str) -> Address {
    s.parse().expect("built-in contract address is valid")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_chain_id_known() {
        let registry = NetworkRegistry::new();
        assert_eq!(registry.lookup_by_chain_id(7770), NetworkId::Mainnet);
        assert_eq!(registry.lookup_by_chain_id(77777), NetworkId::Testnet);
        assert_eq!(registry.lookup_by_chain_id(77702), NetworkId::Turbo);
        assert_eq!(registry.lookup_by_chain_id(777702), NetworkId::TurboTestnet);
    }

    #[test]
    fn test_lookup_by_chain_id_fallback() {
        let registry = NetworkRegistry::new();
        assert_eq!(registry.lookup_by_chain_id(0), FALLBACK_NETWORK);
        assert_eq!(registry.lookup_by_chain_id(1), FALLBACK_NETWORK);
        assert_eq!(registry.lookup_by_chain_id(u64::MAX), FALLBACK_NETWORK);
    }

    #[test]
    fn test_descriptor_total_over_all_networks() {
        let registry = NetworkRegistry::new();
        for id in NetworkId::ALL {
            let descriptor = registry.descriptor(id);
            assert_eq!(descriptor.chain_id, id.chain_id());
            assert_eq!(descriptor.currency_symbol, "NPY");
            assert_eq!(descriptor.currency_decimals, 18);
            assert_eq!(descriptor.is_l2, descriptor.l1_network.is_some());
        }
    }

    #[test]
    fn test_l2_descriptors_reference_valid_l1() {
        let registry = NetworkRegistry::new();
        for id in NetworkId::ALL {
            if let Some(l1) = registry.descriptor(id).l1_network {
                assert!(!registry.descriptor(l1).is_l2);
            }
        }
    }

    #[test]
    fn test_paired_layer_round_trip() {
        let registry = NetworkRegistry::new();
        for id in NetworkId::ALL.into_iter().filter(|id| id.is_l2()) {
            let pair = registry.paired_layer(id);
            assert_eq!(pair.l2, id);
            let back = registry.paired_layer(pair.l1);
            assert_eq!(back.l2, id);
            assert_eq!(back.l1, pair.l1);
        }
    }

    #[test]
    fn test_paired_layer_from_l1() {
        let registry = NetworkRegistry::new();
        assert_eq!(
            registry.paired_layer(NetworkId::Mainnet),
            LayerPair {
                l1: NetworkId::Mainnet,
                l2: NetworkId::Turbo
            }
        );
        assert_eq!(
            registry.paired_layer(NetworkId::Testnet),
            LayerPair {
                l1: NetworkId::Testnet,
                l2: NetworkId::TurboTestnet
            }
        );
    }

    #[test]
    fn test_has_deployed_contract_matches_zero_sentinel() {
        let registry = NetworkRegistry::new();
        for id in NetworkId::ALL {
            for role in ContractRole::ALL {
                let address = registry.contract_address(id, role);
                assert_eq!(
                    registry.has_deployed_contract(id, role),
                    address != Address::zero()
                );
            }
        }
        assert!(registry.has_deployed_contract(NetworkId::Mainnet, ContractRole::Nft));
        assert!(registry.has_deployed_contract(NetworkId::Testnet, ContractRole::Oracle));
        assert!(!registry.has_deployed_contract(NetworkId::Testnet, ContractRole::Nft));
        assert!(!registry.has_deployed_contract(NetworkId::Turbo, ContractRole::Bridge));
    }

    #[test]
    fn test_bridge_available_requires_both_sides() {
        let registry = NetworkRegistry::new();
        // no bridge contracts in the default table
        assert!(!registry.bridge_available(NetworkId::Testnet));

        let bridge: Address = "0x00000000000000000000000000000000000000aa"
            .parse()
            .unwrap();
        let one_side = NetworkRegistry::with_config(RegistryConfig {
            contract_overrides: vec![(NetworkId::Testnet, ContractRole::Bridge, bridge)],
            ..Default::default()
        });
        assert!(!one_side.bridge_available(NetworkId::Testnet));

        let both_sides = NetworkRegistry::with_config(RegistryConfig {
            contract_overrides: vec![
                (NetworkId::Testnet, ContractRole::Bridge, bridge),
                (NetworkId::TurboTestnet, ContractRole::Bridge, bridge),
            ],
            ..Default::default()
        });
        assert!(both_sides.bridge_available(NetworkId::Testnet));
        assert!(both_sides.bridge_available(NetworkId::TurboTestnet));
    }

    #[test]
    fn test_rpc_host_override() {
        let registry = NetworkRegistry::with_rpc_host("127.0.0.1");
        assert_eq!(
            registry.descriptor(NetworkId::Mainnet).rpc_url,
            "http://127.0.0.1:8545"
        );
        assert_eq!(
            registry.descriptor(NetworkId::TurboTestnet).rpc_url,
            "http://127.0.0.1:8548"
        );
    }

    #[test]
    fn test_active_networks() {
        let registry = NetworkRegistry::new();
        assert_eq!(
            registry.active_networks(),
            vec![NetworkId::Testnet, NetworkId::TurboTestnet]
        );
    }
}
