// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) DUSK NETWORK. All rights reserved.

//! Ethereum JSON-RPC backend.
//!
//! Transactions go through `eth_sendTransaction`, so signing is done by
//! whichever wallet the node fronts for the sending account.

use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use async_trait::async_trait;
use log::{debug, warn};
use primitive_types::{H160, H256, U256};
use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::time::{self, Instant};

use crate::{
    abi,
    chain::{ChainError, ChainReader, Receipt, TransactionRequest, TransactionSender},
    error::{Error, Result},
};

/// EIP-1193 "user rejected request".
const USER_REJECTED: i64 = 4001;
/// Geth's code for reverted execution.
const EXECUTION_REVERTED: i64 = 3;

/// Timing for an [`RpcClient`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RpcOptions {
    /// Per-request HTTP timeout.
    pub request_timeout: Duration,
    /// Delay between receipt queries.
    pub receipt_poll_interval: Duration,
    /// How long to wait for a receipt before giving up.
    pub receipt_timeout: Duration,
}

impl Default for RpcOptions {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            receipt_poll_interval: Duration::from_secs(1),
            receipt_timeout: Duration::from_secs(120),
        }
    }
}

/// JSON-RPC client for an Ethereum node.
#[derive(Debug, Clone)]
pub struct RpcClient {
    url: Url,
    http: Client,
    options: RpcOptions,
    next_id: Arc<AtomicU64>,
}

#[derive(Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawReceipt {
    transaction_hash: H256,
    block_number: U256,
    #[serde(default)]
    status: Option<U256>,
    #[serde(default)]
    gas_used: Option<U256>,
}

/// Why a request failed, before it is mapped onto [`ChainError`].
#[derive(Debug)]
enum RpcFailure {
    Transport(String),
    Rpc(RpcErrorObject),
    Malformed(String),
}

impl RpcFailure {
    fn revert_reason(&self) -> Option<String> {
        let Self::Rpc(error) = self else {
            return None;
        };
        let reverted = error.code == EXECUTION_REVERTED
            || error.message.to_ascii_lowercase().contains("revert");
        if !reverted {
            return None;
        }

        let decoded = error
            .data
            .as_ref()
            .and_then(revert_data)
            .and_then(|data| abi::decode_revert_reason(&data));
        Some(decoded.unwrap_or_else(|| error.message.clone()))
    }

    fn into_read_error(self) -> ChainError {
        if let Some(reason) = self.revert_reason() {
            return ChainError::ExecutionReverted { reason };
        }
        match self {
            Self::Transport(message) => ChainError::NetworkUnavailable(message),
            Self::Rpc(error) => ChainError::ReadFailure(error.message),
            Self::Malformed(message) => ChainError::ReadFailure(message),
        }
    }

    fn into_submit_error(self) -> ChainError {
        if let Some(reason) = self.revert_reason() {
            return ChainError::ExecutionReverted { reason };
        }
        match self {
            Self::Rpc(error) if error.code == USER_REJECTED => ChainError::SubmissionRejected(
                format!("user rejected the request ({})", error.message),
            ),
            Self::Rpc(error) if is_refusal(&error.message) => {
                ChainError::SubmissionRejected(error.message)
            }
            Self::Rpc(error) => ChainError::NetworkUnavailable(error.message),
            Self::Transport(message) | Self::Malformed(message) => {
                ChainError::NetworkUnavailable(message)
            }
        }
    }
}

fn is_refusal(message: &str) -> bool {
    let message = message.to_ascii_lowercase();
    message.contains("denied") || message.contains("rejected")
}

/// Revert data is either a bare hex string or nested under `data`.
fn revert_data(value: &Value) -> Option<Vec<u8>> {
    match value {
        Value::String(text) => decode_hex(text).ok(),
        Value::Object(map) => map.get("data").and_then(revert_data),
        _ => None,
    }
}

fn decode_hex(text: &str) -> std::result::Result<Vec<u8>, String> {
    let digits = text.strip_prefix("0x").unwrap_or(text);
    hex::decode(digits).map_err(|err| format!("invalid hex '{text}': {err}"))
}

fn quantity(value: U256) -> String {
    format!("0x{value:x}")
}

fn parse_quantity(value: &Value) -> std::result::Result<u64, String> {
    let text = value
        .as_str()
        .ok_or_else(|| format!("expected a hex quantity, got {value}"))?;
    u64::from_str_radix(text.strip_prefix("0x").unwrap_or(text), 16)
        .map_err(|err| format!("invalid quantity '{text}': {err}"))
}

impl RpcClient {
    /// Connects to the node at `url`.
    pub fn new(url: &str, options: RpcOptions) -> Result<Self> {
        let url = Url::parse(url).map_err(|_| Error::InvalidEndpoint(url.to_string()))?;
        let http = Client::builder()
            .timeout(options.request_timeout)
            .build()
            .map_err(|err| Error::InvalidEndpoint(err.to_string()))?;

        Ok(Self {
            url,
            http,
            options,
            next_id: Arc::new(AtomicU64::new(1)),
        })
    }

    /// Node endpoint.
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Accounts the node can sign for.
    pub async fn accounts(&self) -> std::result::Result<Vec<H160>, ChainError> {
        let result = self
            .request("eth_accounts", json!([]))
            .await
            .map_err(RpcFailure::into_read_error)?;
        serde_json::from_value(result).map_err(|err| ChainError::ReadFailure(err.to_string()))
    }

    /// Receipt for `hash`, or `None` while it is still pending.
    pub async fn receipt(&self, hash: H256) -> std::result::Result<Option<Receipt>, ChainError> {
        let result = self
            .request("eth_getTransactionReceipt", json!([hash]))
            .await
            .map_err(RpcFailure::into_read_error)?;
        if result.is_null() {
            return Ok(None);
        }

        let raw: RawReceipt = serde_json::from_value(result)
            .map_err(|err| ChainError::ReadFailure(format!("malformed receipt: {err}")))?;
        Ok(Some(Receipt {
            transaction_hash: raw.transaction_hash,
            block_number: raw.block_number.low_u64(),
            // pre-Byzantium receipts carry no status
            success: raw.status.map_or(true, |status| !status.is_zero()),
            gas_used: raw.gas_used,
        }))
    }

    async fn request(&self, method: &str, params: Value) -> std::result::Result<Value, RpcFailure> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        debug!("rpc {method} #{id}");

        let response = self
            .http
            .post(self.url.clone())
            .json(&body)
            .send()
            .await
            .map_err(|err| RpcFailure::Transport(format!("HTTP error: {err}")))?;
        let status = response.status();
        let content = response
            .text()
            .await
            .map_err(|err| RpcFailure::Transport(format!("failed to read response: {err}")))?;

        let parsed: RpcResponse = serde_json::from_str(&content).map_err(|err| {
            if status.is_success() {
                RpcFailure::Malformed(format!("invalid JSON-RPC response: {err}"))
            } else {
                RpcFailure::Transport(format!("HTTP {status}"))
            }
        })?;

        if let Some(error) = parsed.error {
            return Err(RpcFailure::Rpc(error));
        }
        Ok(parsed.result.unwrap_or(Value::Null))
    }
}

#[async_trait]
impl ChainReader for RpcClient {
    async fn call(&self, to: H160, data: Vec<u8>) -> std::result::Result<Vec<u8>, ChainError> {
        let params = json!([
            { "to": to, "data": format!("0x{}", hex::encode(&data)) },
            "latest",
        ]);
        let result = self
            .request("eth_call", params)
            .await
            .map_err(RpcFailure::into_read_error)?;

        let Some(text) = result.as_str() else {
            return Err(ChainError::ReadFailure(format!("unexpected eth_call result {result}")));
        };
        decode_hex(text).map_err(ChainError::ReadFailure)
    }

    async fn block_number(&self) -> std::result::Result<u64, ChainError> {
        let result = self
            .request("eth_blockNumber", json!([]))
            .await
            .map_err(RpcFailure::into_read_error)?;
        parse_quantity(&result).map_err(ChainError::ReadFailure)
    }
}

#[async_trait]
impl TransactionSender for RpcClient {
    async fn send_transaction(
        &self,
        request: TransactionRequest,
    ) -> std::result::Result<H256, ChainError> {
        let mut tx = json!({
            "from": request.from,
            "to": request.to,
            "data": format!("0x{}", hex::encode(&request.data)),
        });
        if let Some(value) = request.value {
            tx["value"] = Value::String(quantity(value));
        }
        if let Some(gas) = request.gas {
            tx["gas"] = Value::String(quantity(gas));
        }

        let result = self
            .request("eth_sendTransaction", json!([tx]))
            .await
            .map_err(RpcFailure::into_submit_error)?;
        serde_json::from_value(result)
            .map_err(|err| ChainError::SubmissionRejected(format!("malformed hash: {err}")))
    }

    async fn wait_for_receipt(&self, hash: H256) -> std::result::Result<Receipt, ChainError> {
        let deadline = Instant::now() + self.options.receipt_timeout;
        loop {
            match self.receipt(hash).await {
                Ok(Some(receipt)) => return Ok(receipt),
                Ok(None) => {}
                Err(err) if err.is_transient() => warn!("receipt query for {hash:?} failed: {err}"),
                Err(err) => return Err(err),
            }

            if Instant::now() >= deadline {
                return Err(ChainError::NetworkUnavailable(format!(
                    "no receipt for {hash:?} after {:?}",
                    self.options.receipt_timeout
                )));
            }
            time::sleep(self.options.receipt_poll_interval).await;
        }
    }
}
