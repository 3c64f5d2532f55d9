// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) DUSK NETWORK. All rights reserved.

use async_trait::async_trait;
use primitive_types::{H160, H256, U256};
use thiserror::Error;

/// Failures reported by a chain backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    /// A view call or head query failed; retried on the next poll.
    #[error("read failed: {0}")]
    ReadFailure(String),

    /// The wallet declined to sign.
    #[error("transaction rejected: {0}")]
    SubmissionRejected(String),

    /// The chain refused to execute the call.
    #[error("execution reverted: {reason}")]
    ExecutionReverted {
        /// Human-readable revert cause.
        reason: String,
    },

    /// The node could not be reached.
    #[error("network unavailable: {0}")]
    NetworkUnavailable(String),
}

impl ChainError {
    /// Whether retrying the same request may succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::ReadFailure(_) | Self::NetworkUnavailable(_))
    }
}

/// A state-mutating call ready to be signed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRequest {
    /// Sending account.
    pub from: H160,
    /// Contract address.
    pub to: H160,
    /// Selector plus encoded arguments.
    pub data: Vec<u8>,
    /// Attached value.
    pub value: Option<U256>,
    /// Gas limit override.
    pub gas: Option<U256>,
}

/// Outcome of a mined transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    /// Hash of the transaction.
    pub transaction_hash: H256,
    /// Block the transaction was included in.
    pub block_number: u64,
    /// `false` when execution reverted.
    pub success: bool,
    /// Gas consumed, when reported.
    pub gas_used: Option<U256>,
}

/// Read access to contract state.
#[async_trait]
pub trait ChainReader: Send + Sync {
    /// Executes a view call against the latest block.
    async fn call(&self, to: H160, data: Vec<u8>) -> Result<Vec<u8>, ChainError>;

    /// Height of the latest block.
    async fn block_number(&self) -> Result<u64, ChainError>;
}

/// Transaction submission and confirmation.
///
/// Signing happens behind this trait; callers only see the two suspension
/// points of a transaction's life.
#[async_trait]
pub trait TransactionSender: Send + Sync {
    /// Hands the request to the wallet and resolves once it is signed and
    /// broadcast.
    async fn send_transaction(&self, request: TransactionRequest) -> Result<H256, ChainError>;

    /// Resolves once the transaction is included in a block.
    async fn wait_for_receipt(&self, hash: H256) -> Result<Receipt, ChainError>;
}
