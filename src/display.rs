// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) DUSK NETWORK. All rights reserved.

use std::{fmt, sync::Arc};

use primitive_types::U256;
use tokio::sync::watch;

use crate::{
    abi::Token,
    binding::ContractBinding,
    chain::{ChainReader, TransactionSender},
    error::{Error, Result},
    invalidation::Invalidation,
    read::{ReadHook, ReadOptions, ReadState},
    session::Session,
    write::{Dispatch, TxOverrides, TxState, WriteHook},
};

/// View method holding the counter.
pub const COUNT_METHOD: &str = "count";
/// Method adding one to the counter.
pub const INCREMENT_METHOD: &str = "incrementCount";
/// Method overwriting the counter.
pub const SET_COUNT_METHOD: &str = "setCount";

/// What the counter view shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CountView {
    /// Nothing read yet; rendered as a display zero.
    Placeholder,
    /// Freshly read on-chain value.
    Loaded(U256),
    /// Latest refresh failed; shows the last value when there is one.
    Stale {
        /// Last successfully read value.
        last: Option<U256>,
        /// Cause of the failed refresh.
        error: String,
    },
}

impl CountView {
    /// Builds the view from the read hook's state.
    #[must_use]
    pub fn from_state(state: &ReadState<U256>) -> Self {
        match state {
            ReadState::NotLoaded => Self::Placeholder,
            ReadState::Loaded { value, .. } => Self::Loaded(*value),
            ReadState::Stale { last, error } => Self::Stale {
                last: *last,
                error: error.clone(),
            },
        }
    }

    /// Whether the shown number is a stand-in rather than chain data.
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        matches!(self, Self::Placeholder | Self::Stale { last: None, .. })
    }

    /// The on-chain value, when one has been read.
    #[must_use]
    pub fn value(&self) -> Option<U256> {
        match self {
            Self::Placeholder => None,
            Self::Loaded(value) => Some(*value),
            Self::Stale { last, .. } => *last,
        }
    }
}

impl fmt::Display for CountView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value() {
            Some(value) => write!(f, "{value}"),
            None => f.write_str("0"),
        }
    }
}

/// Parses counter input typed by the user.
///
/// Accepts a plain positive decimal integer that fits in `uint256`.
pub fn parse_count_input(input: &str) -> Result<U256> {
    let invalid = |reason| Error::InvalidInput {
        input: input.to_string(),
        reason,
    };

    let digits = input.trim();
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid("expected a whole number"));
    }
    let value = U256::from_dec_str(digits).map_err(|_| invalid("does not fit in uint256"))?;
    if value.is_zero() {
        return Err(invalid("must be greater than zero"));
    }
    Ok(value)
}

/// The counter view: one read hook on `count` and a write hook each for
/// `incrementCount` and `setCount`, sharing one invalidation signal.
#[derive(Debug)]
pub struct CounterDisplay {
    count: ReadHook<U256>,
    increment: WriteHook,
    set_count: WriteHook,
}

impl CounterDisplay {
    /// Mounts the view against `chain`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn mount<C>(
        binding: &ContractBinding,
        chain: Arc<C>,
        session: &Session,
        options: ReadOptions,
    ) -> Result<Self>
    where
        C: ChainReader + TransactionSender + 'static,
    {
        let invalidation = Invalidation::new();
        let reader: Arc<dyn ChainReader> = chain.clone();
        let sender: Arc<dyn TransactionSender> = chain;

        Ok(Self {
            count: ReadHook::mount(binding, reader, &invalidation, COUNT_METHOD, options)?,
            increment: WriteHook::new(
                binding,
                Arc::clone(&sender),
                session,
                &invalidation,
                INCREMENT_METHOD,
            )?,
            set_count: WriteHook::new(binding, sender, session, &invalidation, SET_COUNT_METHOD)?,
        })
    }

    /// Current view of the counter.
    #[must_use]
    pub fn view(&self) -> CountView {
        CountView::from_state(&self.count.state())
    }

    /// Receiver that wakes whenever the counter is re-read.
    #[must_use]
    pub fn subscribe_count(&self) -> watch::Receiver<ReadState<U256>> {
        self.count.subscribe()
    }

    /// Handles the increment button.
    pub fn increment(&self) -> Result<Dispatch> {
        self.increment.send(&[], TxOverrides::default())
    }

    /// Handles the set form. Input that does not parse is rejected without
    /// sending anything.
    pub fn submit_set_count(&self, input: &str) -> Result<Dispatch> {
        let value = parse_count_input(input)?;
        self.set_count.send(&[Token::Uint(value)], TxOverrides::default())
    }

    /// State of the latest increment.
    #[must_use]
    pub fn increment_state(&self) -> TxState {
        self.increment.state()
    }

    /// State of the latest set.
    #[must_use]
    pub fn set_count_state(&self) -> TxState {
        self.set_count.state()
    }

    /// Increment write hook.
    #[must_use]
    pub fn increment_hook(&self) -> &WriteHook {
        &self.increment
    }

    /// Set write hook.
    #[must_use]
    pub fn set_count_hook(&self) -> &WriteHook {
        &self.set_count
    }

    /// Tears the view down; no hook publishes after this returns.
    pub fn unmount(self) {
        drop(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_and_on_chain_zero_differ() {
        let placeholder = CountView::from_state(&ReadState::NotLoaded);
        let zero = CountView::from_state(&ReadState::Loaded {
            value: U256::zero(),
            block: 1,
        });

        assert_eq!(placeholder.to_string(), "0");
        assert_eq!(zero.to_string(), "0");
        assert_ne!(placeholder, zero);
        assert!(placeholder.is_placeholder());
        assert!(!zero.is_placeholder());
        assert_eq!(zero.value(), Some(U256::zero()));
    }

    #[test]
    fn renders_values_beyond_native_integers() {
        let value = U256::MAX;
        let view = CountView::Loaded(value);
        assert_eq!(
            view.to_string(),
            "115792089237316195423570985008687907853269984665640564039457584007913129639935"
        );

        let above_u128 = U256::from(u128::MAX) + U256::one();
        assert_eq!(
            CountView::Loaded(above_u128).to_string(),
            "340282366920938463463374607431768211456"
        );
    }

    #[test]
    fn stale_view_keeps_last_value() {
        let view = CountView::from_state(&ReadState::Stale {
            last: Some(U256::from(8)),
            error: "network unavailable".into(),
        });
        assert_eq!(view.to_string(), "8");
        assert!(!view.is_placeholder());
    }

    #[test]
    fn parses_positive_integers() {
        assert_eq!(parse_count_input("7").expect("parse"), U256::from(7));
        assert_eq!(parse_count_input(" 42 ").expect("parse"), U256::from(42));
    }

    #[test]
    fn rejects_bad_input() {
        for input in ["abc", "", "-3", "1.5", "+2", "0", "0x10"] {
            assert!(
                matches!(parse_count_input(input), Err(Error::InvalidInput { .. })),
                "accepted {input:?}"
            );
        }

        let too_big = format!("{}0", U256::MAX);
        assert!(parse_count_input(&too_big).is_err());
    }
}
