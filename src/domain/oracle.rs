//! Oracle node network entities

use serde::{Deserialize, Serialize};

/// An off-chain oracle service node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleNode {
    pub base_url: String,
    pub name: String,
    pub model: String,
}

impl OracleNode {
    pub fn new(
        base_url: impl Into<String>,
        name: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            name: name.into(),
            model: model.into(),
        }
    }
}

/// The configured node list, in probe order
pub fn default_nodes() -> Vec<OracleNode> {
    vec![OracleNode::new(
        "http://51.68.125.99:8082",
        "Node 1 (EU)",
        "Qwen 2.5",
    )]
}

/// Aggregate oracle network status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OracleStatus {
    Checking,
    Online,
    Offline,
}

/// Derived endpoint selection state, recomputed by each health-check scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OracleEndpointState {
    pub selected: Option<OracleNode>,
    pub status: OracleStatus,
}

impl Default for OracleEndpointState {
    fn default() -> Self {
        Self {
            selected: None,
            status: OracleStatus::Checking,
        }
    }
}

/// A model advertised by the oracle node network
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub id: String,
    pub name: String,
    pub size: String,
}

/// Models the node network serves
pub fn available_models() -> Vec<ModelInfo> {
    vec![
        ModelInfo {
            id: "Qwen/Qwen2.5-0.5B-Instruct".to_string(),
            name: "Qwen 2.5 (0.5B) - Fast".to_string(),
            size: "0.5B".to_string(),
        },
        ModelInfo {
            id: "Qwen/Qwen2.5-1.5B-Instruct".to_string(),
            name: "Qwen 2.5 (1.5B) - Quality".to_string(),
            size: "1.5B".to_string(),
        },
        ModelInfo {
            id: "microsoft/phi-2".to_string(),
            name: "Phi-2 (2.7B) - Smart".to_string(),
            size: "2.7B".to_string(),
        },
        ModelInfo {
            id: "meta-llama/Llama-3.2-1B-Instruct".to_string(),
            name: "Llama 3.2 (1B)".to_string(),
            size: "1B".to_string(),
        },
    ]
}

/// A completed oracle query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OracleAnswer {
    pub text: String,
    /// Whole-percent confidence reported by the node
    pub confidence_pct: u64,
    pub elapsed_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state_is_checking() {
        let state = OracleEndpointState::default();
        assert_eq!(state.status, OracleStatus::Checking);
        assert!(state.selected.is_none());
    }

    #[test]
    fn test_default_node_list_order() {
        let nodes = default_nodes();
        assert!(!nodes.is_empty());
        assert_eq!(nodes[0].name, "Node 1 (EU)");
    }
}
