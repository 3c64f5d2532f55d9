// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) DUSK NETWORK. All rights reserved.

//! In-memory chain running the counter contract.
//!
//! [`MockChain`] executes `count`, `incrementCount` and `setCount` against a
//! single stored value. Every mined transaction produces one block. Knobs
//! let tests hold reads or mining open and inject failures.

use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard, PoisonError},
};

use async_trait::async_trait;
use log::debug;
use primitive_types::{H160, H256, U256};
use tokio::sync::watch;

use crate::{
    abi::{self, Token},
    binding::ContractBinding,
    chain::{ChainError, ChainReader, Receipt, TransactionRequest, TransactionSender},
    schema::{ContractSchema, FunctionSchema},
};

const MOCK_GAS_USED: u64 = 26_000;

/// Simulated chain hosting one counter contract.
#[derive(Debug)]
pub struct MockChain {
    address: H160,
    schema: ContractSchema,
    state: Mutex<MockState>,
    reads_paused: watch::Sender<bool>,
    mining_paused: watch::Sender<bool>,
}

#[derive(Debug, Default)]
struct MockState {
    count: U256,
    block: u64,
    nonce: u64,
    failing_reads: usize,
    calls: usize,
    reject_next: bool,
    revert_next: bool,
    pending: HashMap<H256, TransactionRequest>,
    receipts: HashMap<H256, Receipt>,
    sent: Vec<TransactionRequest>,
}

impl MockChain {
    /// Deploys the counter at the binding's address with `initial` count.
    #[must_use]
    pub fn new(binding: &ContractBinding, initial: U256) -> Self {
        let (address, schema) = binding.get_binding();
        Self {
            address,
            schema: schema.clone(),
            state: Mutex::new(MockState {
                count: initial,
                ..MockState::default()
            }),
            reads_paused: watch::channel(false).0,
            mining_paused: watch::channel(false).0,
        }
    }

    /// Current stored count.
    #[must_use]
    pub fn count(&self) -> U256 {
        self.lock().count
    }

    /// Overwrites the stored count without a transaction.
    pub fn set_count(&self, count: U256) {
        self.lock().count = count;
    }

    /// Current block height.
    #[must_use]
    pub fn height(&self) -> u64 {
        self.lock().block
    }

    /// Makes the next `n` read operations fail with a network error.
    pub fn fail_reads(&self, n: usize) {
        self.lock().failing_reads = n;
    }

    /// Makes the wallet decline the next submission.
    pub fn reject_next_submission(&self) {
        self.lock().reject_next = true;
    }

    /// Makes the next mined transaction revert.
    pub fn revert_next(&self) {
        self.lock().revert_next = true;
    }

    /// Holds reads until [`MockChain::resume_reads`].
    pub fn pause_reads(&self) {
        self.reads_paused.send_replace(true);
    }

    /// Releases held reads.
    pub fn resume_reads(&self) {
        self.reads_paused.send_replace(false);
    }

    /// Holds transactions in the mempool until [`MockChain::resume_mining`].
    pub fn pause_mining(&self) {
        self.mining_paused.send_replace(true);
    }

    /// Mines held transactions.
    pub fn resume_mining(&self) {
        self.mining_paused.send_replace(false);
    }

    /// Number of `call`s served, failed ones included.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.lock().calls
    }

    /// Every request accepted so far, in order.
    #[must_use]
    pub fn sent_transactions(&self) -> Vec<TransactionRequest> {
        self.lock().sent.clone()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn function(&self, data: &[u8]) -> Result<&FunctionSchema, String> {
        let selector: [u8; 4] = data
            .get(..4)
            .and_then(|bytes| bytes.try_into().ok())
            .ok_or_else(|| "call data shorter than a selector".to_string())?;
        self.schema
            .get_function_by_selector(selector)
            .ok_or_else(|| format!("unknown selector 0x{}", hex::encode(selector)))
    }

    fn take_failing_read(&self) -> Result<(), ChainError> {
        let mut state = self.lock();
        if state.failing_reads > 0 {
            state.failing_reads -= 1;
            return Err(ChainError::NetworkUnavailable("simulated outage".to_string()));
        }
        Ok(())
    }

    /// Runs a mined transaction against the stored count.
    fn execute(&self, state: &mut MockState, request: &TransactionRequest) -> Result<(), String> {
        let function = self.function(&request.data)?;
        let args = abi::decode_input(function, &request.data).map_err(|err| err.to_string())?;

        match (function.name.as_str(), args.as_slice()) {
            ("incrementCount", []) => {
                state.count = state
                    .count
                    .checked_add(U256::one())
                    .ok_or_else(|| "panic code 0x11".to_string())?;
            }
            ("setCount", [Token::Uint(value)]) => state.count = *value,
            (name, _) => return Err(format!("'{name}' is not executable")),
        }
        Ok(())
    }
}

async fn wait_until_released(paused: &watch::Sender<bool>) {
    let mut released = paused.subscribe();
    // the sender is borrowed for the whole wait, so this cannot fail
    let _ = released.wait_for(|paused| !*paused).await;
}

#[async_trait]
impl ChainReader for MockChain {
    async fn call(&self, to: H160, data: Vec<u8>) -> Result<Vec<u8>, ChainError> {
        wait_until_released(&self.reads_paused).await;
        self.lock().calls += 1;
        self.take_failing_read()?;

        if to != self.address {
            return Err(ChainError::ReadFailure(format!(
                "no contract at {}",
                abi::format_address(&to)
            )));
        }

        let function = self
            .function(&data)
            .map_err(|reason| ChainError::ExecutionReverted { reason })?;
        match function.name.as_str() {
            "count" => abi::encode_output(function, &[Token::Uint(self.count())])
                .map_err(|err| ChainError::ReadFailure(err.to_string())),
            name => Err(ChainError::ExecutionReverted {
                reason: format!("'{name}' is not a view method"),
            }),
        }
    }

    async fn block_number(&self) -> Result<u64, ChainError> {
        wait_until_released(&self.reads_paused).await;
        self.take_failing_read()?;
        Ok(self.height())
    }
}

#[async_trait]
impl TransactionSender for MockChain {
    async fn send_transaction(&self, request: TransactionRequest) -> Result<H256, ChainError> {
        if let Err(reason) = self.function(&request.data) {
            return Err(ChainError::ExecutionReverted { reason });
        }

        let mut state = self.lock();
        if std::mem::take(&mut state.reject_next) {
            return Err(ChainError::SubmissionRejected(
                "user denied transaction signature".to_string(),
            ));
        }

        state.nonce += 1;
        let hash = H256::from_low_u64_be(state.nonce);
        state.sent.push(request.clone());
        state.pending.insert(hash, request);
        debug!("mock chain accepted {hash:?}");
        Ok(hash)
    }

    async fn wait_for_receipt(&self, hash: H256) -> Result<Receipt, ChainError> {
        wait_until_released(&self.mining_paused).await;

        let mut state = self.lock();
        if let Some(receipt) = state.receipts.get(&hash) {
            return Ok(receipt.clone());
        }
        let request = state
            .pending
            .remove(&hash)
            .ok_or_else(|| ChainError::ReadFailure(format!("unknown transaction {hash:?}")))?;

        let success = if std::mem::take(&mut state.revert_next) {
            false
        } else {
            self.execute(&mut state, &request).is_ok()
        };
        state.block += 1;

        let receipt = Receipt {
            transaction_hash: hash,
            block_number: state.block,
            success,
            gas_used: Some(U256::from(MOCK_GAS_USED)),
        };
        state.receipts.insert(hash, receipt.clone());
        Ok(receipt)
    }
}
