//! Ledger RPC client
//!
//! Read-only JSON-RPC access to the chain: list recent signatures touching
//! an address and fetch full transaction details. Stateless, no caching,
//! no retries; every failure is surfaced to the caller as a soft signal.

use crate::config::RpcConfig;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Errors from the ledger RPC endpoint
///
/// None of these are fatal; the watcher maps them to skip-and-retry or
/// skip-permanently depending on the call site.
#[derive(Error, Debug)]
pub enum RpcError {
    /// Request failed in transit or the body was not valid JSON
    #[error("RPC transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Endpoint answered with a non-success HTTP status
    #[error("RPC returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// Endpoint answered with a JSON-RPC error object
    #[error("RPC error {code}: {message}")]
    Node { code: i64, message: String },
}

/// JSON-RPC response envelope
#[derive(Debug, Deserialize)]
pub struct RpcResponse<T> {
    pub result: Option<T>,
    pub error: Option<RpcErrorObject>,
}

/// JSON-RPC error object
#[derive(Debug, Deserialize)]
pub struct RpcErrorObject {
    pub code: i64,
    pub message: String,
}

/// One entry from getSignaturesForAddress
#[derive(Debug, Clone, Deserialize)]
pub struct SignatureInfo {
    pub signature: String,
    #[serde(rename = "blockTime")]
    pub block_time: Option<i64>,
}

/// Full transaction detail from getTransaction
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionRecord {
    #[serde(default)]
    pub slot: u64,
    #[serde(rename = "blockTime")]
    pub block_time: Option<i64>,
    #[serde(default)]
    pub transaction: TransactionEnvelope,
    pub meta: Option<TransactionMeta>,
}

/// Signed transaction body
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionEnvelope {
    #[serde(default)]
    pub message: TransactionMessage,
    #[serde(default)]
    pub signatures: Vec<String>,
}

/// Transaction message: accounts touched and instructions executed
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionMessage {
    #[serde(default, rename = "accountKeys")]
    pub account_keys: Vec<String>,
    #[serde(default)]
    pub instructions: Vec<InstructionRecord>,
}

/// Execution metadata: fee and per-account balances
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionMeta {
    #[serde(default)]
    pub fee: u64,
    #[serde(default, rename = "preBalances")]
    pub pre_balances: Vec<u64>,
    #[serde(default, rename = "postBalances")]
    pub post_balances: Vec<u64>,
}

/// One instruction in either encoding the node may return
///
/// The catch-all keeps unknown instruction shapes from failing the whole
/// record; recipient resolution just skips them.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum InstructionRecord {
    Parsed(ParsedInstruction),
    Raw(RawInstruction),
    Opaque(serde_json::Value),
}

/// High-level instruction decoded by the node
#[derive(Debug, Clone, Deserialize)]
pub struct ParsedInstruction {
    pub parsed: ParsedPayload,
    #[serde(default)]
    pub program: Option<String>,
}

/// Decoded payload of a parsed instruction
#[derive(Debug, Clone, Deserialize)]
pub struct ParsedPayload {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub info: ParsedTransferInfo,
}

/// Source and destination of a decoded transfer
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ParsedTransferInfo {
    pub source: Option<String>,
    pub destination: Option<String>,
}

/// Raw compiled instruction referencing accounts by index
#[derive(Debug, Clone, Deserialize)]
pub struct RawInstruction {
    #[serde(rename = "programIdIndex")]
    pub program_id_index: usize,
    pub accounts: Vec<usize>,
    #[serde(default)]
    pub data: String,
}

/// Read-only queries against the transaction ledger
#[async_trait]
pub trait LedgerQuery: Send + Sync {
    /// List recent transaction signatures touching an address, newest first
    async fn recent_signatures(&self, address: &str) -> Result<Vec<SignatureInfo>, RpcError>;

    /// Fetch full details for one signature; Ok(None) when the ledger does
    /// not know the transaction
    async fn transaction_details(
        &self,
        signature: &str,
    ) -> Result<Option<TransactionRecord>, RpcError>;
}

/// JSON-RPC client for a single ledger endpoint
pub struct RpcClient {
    client: Client,
    url: String,
    signature_limit: u32,
    commitment: String,
}

impl RpcClient {
    pub fn new(config: &RpcConfig) -> Result<Self, RpcError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self {
            client,
            url: config.url.clone(),
            signature_limit: config.signature_limit,
            commitment: config.commitment.clone(),
        })
    }

    /// POST one JSON-RPC call and parse the response envelope
    async fn call<T: for<'de> Deserialize<'de>>(
        &self,
        payload: serde_json::Value,
    ) -> Result<RpcResponse<T>, RpcError> {
        let response = self.client.post(&self.url).json(&payload).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(RpcError::Status { status, body });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl LedgerQuery for RpcClient {
    async fn recent_signatures(&self, address: &str) -> Result<Vec<SignatureInfo>, RpcError> {
        let payload = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "getSignaturesForAddress",
            "params": [address, {"limit": self.signature_limit}],
        });

        let parsed: RpcResponse<Vec<SignatureInfo>> = self.call(payload).await?;
        if let Some(err) = parsed.error {
            return Err(RpcError::Node {
                code: err.code,
                message: err.message,
            });
        }

        let signatures = parsed.result.unwrap_or_default();
        debug!(address, count = signatures.len(), "Fetched signatures");
        Ok(signatures)
    }

    async fn transaction_details(
        &self,
        signature: &str,
    ) -> Result<Option<TransactionRecord>, RpcError> {
        let payload = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "getTransaction",
            "params": [signature, {
                "encoding": "json",
                "commitment": self.commitment,
                "maxSupportedTransactionVersion": 0,
            }],
        });

        let parsed: RpcResponse<TransactionRecord> = self.call(payload).await?;
        if let Some(err) = parsed.error {
            return Err(RpcError::Node {
                code: err.code,
                message: err.message,
            });
        }

        Ok(parsed.result)
    }
}
