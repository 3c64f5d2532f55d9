// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) DUSK NETWORK. All rights reserved.

//! Transaction submission hook.
//!
//! A [`WriteHook`] is bound to one state-mutating method. Each call to
//! [`WriteHook::send`] walks its [`TxState`] through
//!
//! ```text
//! Idle -> PendingSignature -> Mining -> Success
//!               |               |
//!               +---------------+----> Exception
//! ```
//!
//! At most one transaction is in flight per hook: `send` during
//! PendingSignature or Mining is a no-op that returns [`Dispatch::Busy`].

use std::{fmt, future::Future, sync::Arc};

use log::{debug, info, warn};
use primitive_types::{H160, H256, U256};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::{
    abi::{self, Token},
    binding::ContractBinding,
    chain::{ChainError, Receipt, TransactionRequest, TransactionSender},
    error::{Error, Result},
    invalidation::Invalidation,
    schema::FunctionSchema,
    session::Session,
};

/// Lifecycle stage of the hook's latest transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TxStatus {
    /// Nothing sent yet.
    #[default]
    Idle,
    /// Waiting for the wallet to sign.
    PendingSignature,
    /// Broadcast, waiting for block inclusion.
    Mining,
    /// Mined and executed.
    Success,
    /// Rejected, reverted or lost.
    Exception,
}

impl TxStatus {
    /// Whether a transaction is between submission and confirmation.
    #[must_use]
    pub fn is_in_flight(self) -> bool {
        matches!(self, Self::PendingSignature | Self::Mining)
    }

    /// Whether the latest transaction has finished.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Exception)
    }
}

impl fmt::Display for TxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::PendingSignature => "pending signature",
            Self::Mining => "mining",
            Self::Success => "success",
            Self::Exception => "exception",
        })
    }
}

/// Observable state of a [`WriteHook`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TxState {
    /// Lifecycle stage.
    pub status: TxStatus,
    /// Hash, once signed.
    pub hash: Option<H256>,
    /// Receipt, once mined.
    pub receipt: Option<Receipt>,
    /// Cause, when status is [`TxStatus::Exception`].
    pub error: Option<String>,
}

impl TxState {
    fn begin(&mut self) -> bool {
        if self.status.is_in_flight() {
            return false;
        }
        *self = Self {
            status: TxStatus::PendingSignature,
            ..Self::default()
        };
        true
    }

    fn signed(&mut self, hash: H256) -> bool {
        if self.status != TxStatus::PendingSignature {
            return false;
        }
        self.status = TxStatus::Mining;
        self.hash = Some(hash);
        true
    }

    fn mined(&mut self, receipt: Receipt) -> bool {
        if self.status != TxStatus::Mining {
            return false;
        }
        if receipt.success {
            self.status = TxStatus::Success;
        } else {
            self.status = TxStatus::Exception;
            self.error = Some(
                ChainError::ExecutionReverted {
                    reason: "transaction reverted on-chain".to_string(),
                }
                .to_string(),
            );
        }
        self.receipt = Some(receipt);
        true
    }

    fn failed(&mut self, err: &ChainError) -> bool {
        if !self.status.is_in_flight() {
            return false;
        }
        self.status = TxStatus::Exception;
        self.error = Some(err.to_string());
        true
    }
}

/// Per-call transaction overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TxOverrides {
    /// Value to attach; only allowed on payable methods.
    pub value: Option<U256>,
    /// Gas limit, forwarded as-is.
    pub gas: Option<U256>,
}

/// What [`WriteHook::send`] did with the call.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// A new transaction was handed to the wallet.
    Submitted,
    /// A transaction is already in flight; nothing was sent.
    Busy,
}

/// Submits one named state-mutating method and tracks its lifecycle.
pub struct WriteHook {
    function: FunctionSchema,
    contract: H160,
    sender: Arc<dyn TransactionSender>,
    session: Session,
    invalidation: Invalidation,
    state: Arc<watch::Sender<TxState>>,
    cancel: CancellationToken,
}

impl WriteHook {
    /// Creates a hook for `method` on the bound contract.
    pub fn new(
        binding: &ContractBinding,
        sender: Arc<dyn TransactionSender>,
        session: &Session,
        invalidation: &Invalidation,
        method: &str,
    ) -> Result<Self> {
        let function = binding.function(method)?;
        if function.state_mutability.is_read_only() {
            return Err(Error::NotATransaction(method.to_string()));
        }
        // reject interfaces the codec cannot encode up front
        function.input_types()?;

        let (state, _) = watch::channel(TxState::default());
        Ok(Self {
            function: function.clone(),
            contract: binding.address(),
            sender,
            session: session.clone(),
            invalidation: invalidation.clone(),
            state: Arc::new(state),
            cancel: CancellationToken::new(),
        })
    }

    /// Submits the method with `args`.
    ///
    /// Returns an error, leaving the state untouched, when the call cannot
    /// be built: no connected wallet, arguments that do not match the
    /// interface, or value attached to a non-payable method. Everything that
    /// goes wrong later is reported through [`WriteHook::state`].
    ///
    /// Must be called from within a tokio runtime.
    pub fn send(&self, args: &[Token], overrides: TxOverrides) -> Result<Dispatch> {
        let from = self.session.account().ok_or(Error::WalletNotConnected)?;
        let attaches_value = overrides.value.is_some_and(|value| !value.is_zero());
        if attaches_value && !self.function.state_mutability.is_payable() {
            return Err(Error::NotPayable(self.function.name.clone()));
        }
        let data = abi::encode_call(&self.function, args)?;

        if !self.state.send_if_modified(TxState::begin) {
            debug!("'{}' already in flight, ignoring send", self.function.name);
            return Ok(Dispatch::Busy);
        }

        let request = TransactionRequest {
            from,
            to: self.contract,
            data,
            value: overrides.value,
            gas: overrides.gas,
        };
        let submission = Submission {
            method: self.function.name.clone(),
            sender: Arc::clone(&self.sender),
            invalidation: self.invalidation.clone(),
            state: Arc::clone(&self.state),
            cancel: self.cancel.clone(),
        };
        tokio::spawn(submission.run(request));

        Ok(Dispatch::Submitted)
    }

    /// Snapshot of the transaction state.
    #[must_use]
    pub fn state(&self) -> TxState {
        self.state.borrow().clone()
    }

    /// Receiver that wakes on every transition.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<TxState> {
        self.state.subscribe()
    }

    /// Name of the submitted method.
    #[must_use]
    pub fn method(&self) -> &str {
        &self.function.name
    }

    /// Stops tracking any in-flight transaction and resets to idle.
    pub fn unmount(self) {
        drop(self);
    }
}

impl fmt::Debug for WriteHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriteHook")
            .field("method", &self.function.name)
            .field("contract", &self.contract)
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

impl Drop for WriteHook {
    fn drop(&mut self) {
        self.cancel.cancel();
        self.state.send_replace(TxState::default());
    }
}

struct Submission {
    method: String,
    sender: Arc<dyn TransactionSender>,
    invalidation: Invalidation,
    state: Arc<watch::Sender<TxState>>,
    cancel: CancellationToken,
}

impl Submission {
    async fn run(self, request: TransactionRequest) {
        let hash = match self.guarded(self.sender.send_transaction(request)).await {
            None => return,
            Some(Ok(hash)) => hash,
            Some(Err(err)) => {
                warn!("'{}' was not submitted: {err}", self.method);
                self.state.send_if_modified(|state| state.failed(&err));
                return;
            }
        };
        debug!("'{}' signed as {hash:?}", self.method);
        self.state.send_if_modified(|state| state.signed(hash));

        match self.guarded(self.sender.wait_for_receipt(hash)).await {
            None => {}
            Some(Ok(receipt)) => {
                let success = receipt.success;
                self.state.send_if_modified(|state| state.mined(receipt));
                if success {
                    info!("'{}' confirmed", self.method);
                    self.invalidation.invalidate();
                } else {
                    warn!("'{}' reverted", self.method);
                }
            }
            Some(Err(err)) => {
                warn!("'{}' failed while mining: {err}", self.method);
                self.state.send_if_modified(|state| state.failed(&err));
            }
        }
    }

    /// `None` once the hook has been unmounted.
    async fn guarded<F: Future>(&self, step: F) -> Option<F::Output> {
        let output = tokio::select! {
            biased;
            () = self.cancel.cancelled() => return None,
            output = step => output,
        };
        (!self.cancel.is_cancelled()).then_some(output)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::mock::MockChain;

    struct Fixture {
        chain: Arc<MockChain>,
        session: Session,
        invalidation: Invalidation,
        binding: ContractBinding,
    }

    impl Fixture {
        fn new(initial: u64) -> Self {
            let binding =
                ContractBinding::simple_contract(H160::repeat_byte(0x42)).expect("binding");
            Self {
                chain: Arc::new(MockChain::new(&binding, U256::from(initial))),
                session: Session::connected(H160::repeat_byte(0x01)),
                invalidation: Invalidation::new(),
                binding,
            }
        }

        fn hook(&self, method: &str) -> WriteHook {
            WriteHook::new(
                &self.binding,
                self.chain.clone(),
                &self.session,
                &self.invalidation,
                method,
            )
            .expect("write hook")
        }
    }

    async fn settle(hook: &WriteHook) -> TxState {
        hook.subscribe()
            .wait_for(|state| state.status.is_terminal())
            .await
            .expect("hook alive")
            .clone()
    }

    #[test]
    fn state_machine_refuses_out_of_order_events() {
        let mut state = TxState::default();
        assert!(!state.signed(H256::zero()));
        assert!(!state.failed(&ChainError::NetworkUnavailable("down".into())));

        assert!(state.begin());
        assert!(!state.begin());
        assert!(state.signed(H256::zero()));
        assert_eq!(state.status, TxStatus::Mining);
        assert!(!state.begin());
    }

    #[test]
    fn begin_from_terminal_clears_previous_outcome() {
        let mut state = TxState {
            status: TxStatus::Exception,
            hash: Some(H256::repeat_byte(1)),
            receipt: None,
            error: Some("boom".into()),
        };
        assert!(state.begin());
        assert_eq!(
            state,
            TxState {
                status: TxStatus::PendingSignature,
                ..TxState::default()
            }
        );
    }

    #[tokio::test]
    async fn send_moves_idle_to_pending_signature() {
        let fixture = Fixture::new(0);
        let hook = fixture.hook("incrementCount");
        assert_eq!(hook.state().status, TxStatus::Idle);

        assert_eq!(
            hook.send(&[], TxOverrides::default()).expect("send"),
            Dispatch::Submitted
        );
        assert_eq!(hook.state().status, TxStatus::PendingSignature);

        let done = settle(&hook).await;
        assert_eq!(done.status, TxStatus::Success);
        assert!(done.receipt.is_some_and(|receipt| receipt.success));
        assert_eq!(fixture.chain.count(), U256::one());
    }

    #[tokio::test]
    async fn send_while_mining_is_a_no_op() {
        let fixture = Fixture::new(0);
        fixture.chain.pause_mining();
        let hook = fixture.hook("incrementCount");

        let _ = hook.send(&[], TxOverrides::default()).expect("send");
        let mining = hook
            .subscribe()
            .wait_for(|state| state.status == TxStatus::Mining)
            .await
            .expect("hook alive")
            .clone();

        assert_eq!(
            hook.send(&[], TxOverrides::default()).expect("send"),
            Dispatch::Busy
        );
        assert_eq!(hook.state(), mining);
        assert_eq!(fixture.chain.sent_transactions().len(), 1);

        fixture.chain.resume_mining();
        assert_eq!(settle(&hook).await.status, TxStatus::Success);
        assert_eq!(fixture.chain.count(), U256::one());
    }

    #[tokio::test]
    async fn send_from_terminal_starts_over() {
        let fixture = Fixture::new(0);
        let hook = fixture.hook("incrementCount");

        let _ = hook.send(&[], TxOverrides::default()).expect("send");
        settle(&hook).await;

        assert_eq!(
            hook.send(&[], TxOverrides::default()).expect("send"),
            Dispatch::Submitted
        );
        let state = hook.state();
        assert_eq!(state.status, TxStatus::PendingSignature);
        assert!(state.receipt.is_none());

        settle(&hook).await;
        assert_eq!(fixture.chain.count(), U256::from(2));
    }

    #[tokio::test]
    async fn rejected_signature_surfaces_as_exception() {
        let fixture = Fixture::new(4);
        fixture.chain.reject_next_submission();
        let hook = fixture.hook("incrementCount");

        let _ = hook.send(&[], TxOverrides::default()).expect("send");
        let done = settle(&hook).await;

        assert_eq!(done.status, TxStatus::Exception);
        assert!(done.error.expect("error").contains("rejected"));
        assert_eq!(fixture.chain.count(), U256::from(4));
        assert_eq!(fixture.invalidation.generation(), 0);
    }

    #[tokio::test]
    async fn reverted_receipt_surfaces_as_exception() {
        let fixture = Fixture::new(4);
        fixture.chain.revert_next();
        let hook = fixture.hook("setCount");

        let _ = hook
            .send(&[Token::Uint(U256::from(10))], TxOverrides::default())
            .expect("send");
        let done = settle(&hook).await;

        assert_eq!(done.status, TxStatus::Exception);
        assert!(done.receipt.is_some_and(|receipt| !receipt.success));
        assert!(done.error.expect("error").contains("reverted"));
        assert_eq!(fixture.chain.count(), U256::from(4));
    }

    #[tokio::test]
    async fn success_raises_invalidation() {
        let fixture = Fixture::new(0);
        let hook = fixture.hook("setCount");
        let mut invalidations = fixture.invalidation.subscribe();

        let _ = hook
            .send(&[Token::Uint(U256::from(77))], TxOverrides::default())
            .expect("send");
        settle(&hook).await;

        assert!(invalidations.has_changed().expect("signal alive"));
        assert_eq!(fixture.chain.count(), U256::from(77));
    }

    #[tokio::test]
    async fn caller_errors_leave_state_untouched() {
        let fixture = Fixture::new(0);
        let hook = fixture.hook("setCount");

        assert!(matches!(
            hook.send(&[], TxOverrides::default()),
            Err(Error::Abi(_))
        ));
        assert!(matches!(
            hook.send(
                &[Token::Uint(U256::one())],
                TxOverrides {
                    value: Some(U256::one()),
                    gas: None,
                }
            ),
            Err(Error::NotPayable(_))
        ));

        fixture.session.disconnect();
        assert!(matches!(
            hook.send(&[Token::Uint(U256::one())], TxOverrides::default()),
            Err(Error::WalletNotConnected)
        ));

        assert_eq!(hook.state(), TxState::default());
        assert!(fixture.chain.sent_transactions().is_empty());
    }

    #[tokio::test]
    async fn view_methods_cannot_be_sent() {
        let fixture = Fixture::new(0);
        let err = WriteHook::new(
            &fixture.binding,
            fixture.chain.clone(),
            &fixture.session,
            &fixture.invalidation,
            "count",
        )
        .expect_err("view method");
        assert!(matches!(err, Error::NotATransaction(_)));
    }

    #[tokio::test]
    async fn unmount_while_mining_resets_and_stops_tracking() {
        let fixture = Fixture::new(0);
        fixture.chain.pause_mining();
        let hook = fixture.hook("incrementCount");
        let rx = hook.subscribe();

        let _ = hook.send(&[], TxOverrides::default()).expect("send");
        tokio::task::yield_now().await;
        hook.unmount();

        fixture.chain.resume_mining();
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(*rx.borrow(), TxState::default());
        assert_eq!(fixture.invalidation.generation(), 0);
    }
}
