//! Oracle endpoint selection and querying
//!
//! Probes the configured node list in order and pins the first node
//! whose health endpoint answers. Queries go to the pinned node only;
//! a query failure surfaces to the caller instead of retrying another
//! node, and the next health scan handles re-selection.

use std::time::{Duration, Instant};

use serde::Serialize;
use serde_json::Value;
use tokio::sync::watch;

use crate::domain::oracle::{default_nodes, OracleAnswer, OracleEndpointState, OracleNode, OracleStatus};
use crate::shared::constants::{DEFAULT_CONFIDENCE_PCT, DEFAULT_MAX_TOKENS, ORACLE_PROBE_TIMEOUT_SECS};
use crate::shared::error::WalletError;

#[derive(Debug, Serialize)]
struct QueryBody<'a> {
    prompt: &'a str,
    model: &'a str,
    max_tokens: u32,
}

pub struct OracleSelector {
    nodes: Vec<OracleNode>,
    http: reqwest::Client,
    state: watch::Sender<OracleEndpointState>,
}

impl Default for OracleSelector {
    fn default() -> Self {
        Self::new(default_nodes())
    }
}

impl OracleSelector {
    pub fn new(nodes: Vec<OracleNode>) -> Self {
        let (state, _) = watch::channel(OracleEndpointState::default());
        Self {
            nodes,
            http: reqwest::Client::new(),
            state,
        }
    }

    /// Observe selection changes
    pub fn subscribe(&self) -> watch::Receiver<OracleEndpointState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> OracleEndpointState {
        self.state.borrow().clone()
    }

    /// Scan the node list in order and pin the first healthy node.
    ///
    /// The state reads `Checking` for the duration of the scan; it ends
    /// `Online` with a selection or `Offline` with none. Each probe is
    /// bounded by its own timeout, so a scan over N nodes finishes in at
    /// most N probe timeouts.
    pub async fn check_nodes(&self) -> OracleEndpointState {
        self.state.send_replace(OracleEndpointState {
            selected: None,
            status: OracleStatus::Checking,
        });

        for node in &self.nodes {
            if self.probe(node).await {
                log::info!("oracle node selected: {} ({})", node.name, node.base_url);
                let state = OracleEndpointState {
                    selected: Some(node.clone()),
                    status: OracleStatus::Online,
                };
                self.state.send_replace(state.clone());
                return state;
            }
            log::debug!("oracle node unhealthy: {}", node.base_url);
        }

        log::warn!("no oracle node answered the health probe");
        let state = OracleEndpointState {
            selected: None,
            status: OracleStatus::Offline,
        };
        self.state.send_replace(state.clone());
        state
    }

    async fn probe(&self, node: &OracleNode) -> bool {
        let url = format!("{}/api/health", node.base_url);
        match self
            .http
            .get(&url)
            .timeout(Duration::from_secs(ORACLE_PROBE_TIMEOUT_SECS))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    /// Send a prompt to the pinned node.
    ///
    /// `model` and `max_tokens` fall back to the node's advertised model
    /// and the default budget. Any transport or decode failure maps to a
    /// single unavailability error; there is no cross-node retry.
    pub async fn query(
        &self,
        prompt: &str,
        model: Option<&str>,
        max_tokens: Option<u32>,
    ) -> Result<OracleAnswer, WalletError> {
        let node = self
            .state
            .borrow()
            .selected
            .clone()
            .ok_or_else(|| WalletError::oracle_unavailable("no oracle node selected"))?;

        let body = QueryBody {
            prompt,
            model: model.unwrap_or(&node.model),
            max_tokens: max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        };
        let url = format!("{}/api/oracle/query", node.base_url);

        let started = Instant::now();
        let response = self.http.post(&url).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(WalletError::oracle_unavailable(format!(
                "oracle query returned {}",
                response.status()
            )));
        }
        let payload: Value = response.json().await?;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        Ok(decode_answer(&payload, elapsed_ms))
    }
}

/// Pull the answer text and confidence out of a query response.
///
/// The nodes answer with either `response` or `value` for the text and a
/// fractional `confidence`; an absent confidence reads as the default.
fn decode_answer(payload: &Value, elapsed_ms: u64) -> OracleAnswer {
    let text = payload["response"]
        .as_str()
        .or_else(|| payload["value"].as_str())
        .unwrap_or_default()
        .to_string();
    let confidence_pct = payload["confidence"]
        .as_f64()
        .map(|c| (c * 100.0).round() as u64)
        .unwrap_or(DEFAULT_CONFIDENCE_PCT);
    OracleAnswer {
        text,
        confidence_pct,
        elapsed_ms,
    }
}
