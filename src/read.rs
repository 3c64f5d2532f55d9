// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) DUSK NETWORK. All rights reserved.

//! Polling read hook.
//!
//! A [`ReadHook`] owns a background task that reads one zero-argument view
//! method:
//! - once on mount,
//! - on every poll tick where the chain head moved (or the cache is not
//!   fresh),
//! - immediately whenever the shared [`Invalidation`] signal is raised.
//!
//! The decoded value is published as a [`ReadState`]; "not loaded yet" is
//! its own variant and never collapses into a zero.

use std::{marker::PhantomData, sync::Arc, time::Duration};

use log::{debug, warn};
use primitive_types::H160;
use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

use crate::{
    abi::{self, Detokenize},
    binding::ContractBinding,
    chain::{ChainError, ChainReader},
    error::{Error, Result},
    invalidation::Invalidation,
    schema::FunctionSchema,
};

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(4);

/// Cached result of a view method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadState<T> {
    /// No read has succeeded yet.
    NotLoaded,
    /// Value read at `block`.
    Loaded {
        /// Decoded value.
        value: T,
        /// Chain height the value was read at.
        block: u64,
    },
    /// The latest refresh failed; `last` is the previous value, if any.
    Stale {
        /// Last successfully read value.
        last: Option<T>,
        /// Cause of the failed refresh.
        error: String,
    },
}

impl<T> ReadState<T> {
    /// Latest known value, fresh or stale.
    #[must_use]
    pub fn value(&self) -> Option<&T> {
        match self {
            Self::NotLoaded => None,
            Self::Loaded { value, .. } => Some(value),
            Self::Stale { last, .. } => last.as_ref(),
        }
    }

    /// Whether the latest refresh succeeded.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded { .. })
    }

    /// Whether the latest refresh failed.
    #[must_use]
    pub fn is_stale(&self) -> bool {
        matches!(self, Self::Stale { .. })
    }
}

/// Tuning for a [`ReadHook`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadOptions {
    /// Delay between chain head checks.
    pub poll_interval: Duration,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Keeps the latest value of a view method.
///
/// Dropping (or [`ReadHook::unmount`]ing) the hook stops its task; nothing
/// is published after that.
#[derive(Debug)]
pub struct ReadHook<T> {
    method: String,
    state: watch::Receiver<ReadState<T>>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl<T> ReadHook<T>
where
    T: Detokenize + Clone + Send + Sync + 'static,
{
    /// Starts polling `method` on the bound contract.
    ///
    /// Must be called from within a tokio runtime.
    pub fn mount(
        binding: &ContractBinding,
        reader: Arc<dyn ChainReader>,
        invalidation: &Invalidation,
        method: &str,
        options: ReadOptions,
    ) -> Result<Self> {
        let function = binding.function(method)?;
        if !function.state_mutability.is_read_only() {
            return Err(Error::NotAView(method.to_string()));
        }
        if !function.inputs.is_empty() {
            return Err(Error::ReadArguments(method.to_string()));
        }
        let call_data = abi::encode_call(function, &[])?;

        let (state_tx, state) = watch::channel(ReadState::NotLoaded);
        let cancel = CancellationToken::new();

        let poller = Poller {
            function: function.clone(),
            address: binding.address(),
            call_data,
            reader,
            state: state_tx,
            invalidations: invalidation.subscribe(),
            _signal: invalidation.clone(),
            cancel: cancel.clone(),
            poll_interval: options.poll_interval,
            last_block: None,
            _value: PhantomData,
        };
        debug!("mounting read hook for '{method}'");
        let task = tokio::spawn(poller.run());

        Ok(Self {
            method: method.to_string(),
            state,
            cancel,
            task,
        })
    }

    /// Snapshot of the cached state.
    #[must_use]
    pub fn state(&self) -> ReadState<T> {
        self.state.borrow().clone()
    }

    /// Latest known value, if any.
    #[must_use]
    pub fn value(&self) -> Option<T> {
        self.state.borrow().value().cloned()
    }

    /// Receiver that wakes on every state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ReadState<T>> {
        self.state.clone()
    }
}

impl<T> ReadHook<T> {
    /// Name of the polled method.
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Stops polling.
    pub fn unmount(self) {
        drop(self);
    }
}

impl<T> Drop for ReadHook<T> {
    fn drop(&mut self) {
        debug!("unmounting read hook for '{}'", self.method);
        self.cancel.cancel();
        self.task.abort();
    }
}

struct Poller<T> {
    function: FunctionSchema,
    address: H160,
    call_data: Vec<u8>,
    reader: Arc<dyn ChainReader>,
    state: watch::Sender<ReadState<T>>,
    invalidations: watch::Receiver<u64>,
    _signal: Invalidation,
    cancel: CancellationToken,
    poll_interval: Duration,
    last_block: Option<u64>,
    _value: PhantomData<fn() -> T>,
}

impl<T> Poller<T>
where
    T: Detokenize + Clone + Send + Sync + 'static,
{
    async fn run(mut self) {
        if !self.refresh(true).await {
            return;
        }

        let mut ticks = time::interval_at(Instant::now() + self.poll_interval, self.poll_interval);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let forced = tokio::select! {
                biased;
                () = self.cancel.cancelled() => return,
                // `_signal` keeps the sender alive, so this never errors
                _ = self.invalidations.changed() => true,
                _ = ticks.tick() => false,
            };

            if !self.refresh(forced).await {
                return;
            }
        }
    }

    /// Returns `false` once the hook has been unmounted.
    async fn refresh(&mut self, forced: bool) -> bool {
        let outcome = tokio::select! {
            biased;
            () = self.cancel.cancelled() => return false,
            outcome = self.fetch(forced) => outcome,
        };
        if self.cancel.is_cancelled() {
            return false;
        }

        match outcome {
            Ok(None) => {}
            Ok(Some((value, block))) => {
                self.last_block = Some(block);
                self.state.send_replace(ReadState::Loaded { value, block });
            }
            Err(err) => {
                warn!("reading '{}' failed: {err}", self.function.name);
                self.state.send_modify(|state| {
                    let last = state.value().cloned();
                    *state = ReadState::Stale {
                        last,
                        error: err.to_string(),
                    };
                });
            }
        }
        true
    }

    /// `Ok(None)` means the head has not moved since the last fresh read.
    async fn fetch(&self, forced: bool) -> std::result::Result<Option<(T, u64)>, ChainError> {
        let block = self.reader.block_number().await?;
        let fresh = self.state.borrow().is_loaded();
        if !forced && fresh && self.last_block == Some(block) {
            return Ok(None);
        }

        let data = self.reader.call(self.address, self.call_data.clone()).await?;
        let value = abi::decode_output(&self.function, &data)
            .and_then(T::from_tokens)
            .map_err(|err| ChainError::ReadFailure(err.to_string()))?;

        debug!("read '{}' at block {block}", self.function.name);
        Ok(Some((value, block)))
    }
}
