// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) DUSK NETWORK. All rights reserved.

//! Keeps a front-end in sync with an on-chain counter contract.
//!
//! The crate is built from a handful of small pieces:
//! - [`ContractBinding`]: the contract address and interface, built once and
//!   shared by every hook.
//! - [`ReadHook`]: polls a zero-argument view method and caches its decoded
//!   value as an explicit [`ReadState`].
//! - [`WriteHook`]: submits a named state-mutating call and tracks its
//!   [`TxState`] lifecycle.
//! - [`CounterDisplay`]: wires one read hook and two write hooks into the
//!   counter view.
//!
//! Chain access goes through the [`ChainReader`] and [`TransactionSender`]
//! traits, implemented by [`MockChain`] and, with the `rpc` feature, by
//! [`RpcClient`].

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unused_must_use)]
#![deny(unused_extern_crates)]
#![warn(missing_debug_implementations, unreachable_pub, rustdoc::all)]

/// Contract call encoding and return value decoding.
pub mod abi;
/// Process-wide contract address and interface.
pub mod binding;
/// Chain backend traits and their error taxonomy.
pub mod chain;
/// Counter view component.
pub mod display;
/// Crate error types.
pub mod error;
/// Shared invalidation signal between write and read hooks.
pub mod invalidation;
/// In-memory chain running the counter contract.
pub mod mock;
/// Polling read hook.
pub mod read;
/// Ethereum JSON-RPC backend.
#[cfg(feature = "rpc")]
pub mod rpc;
/// Contract interface descriptor.
pub mod schema;
/// Connected wallet account.
pub mod session;
/// Transaction submission hook and its state machine.
pub mod write;

pub use abi::{Detokenize, ParamType, Token};
pub use binding::ContractBinding;
pub use chain::{ChainError, ChainReader, Receipt, TransactionRequest, TransactionSender};
pub use display::{parse_count_input, CountView, CounterDisplay};
pub use error::{Error, Result};
pub use invalidation::Invalidation;
pub use mock::MockChain;
pub use read::{ReadHook, ReadOptions, ReadState};
#[cfg(feature = "rpc")]
pub use rpc::{RpcClient, RpcOptions};
pub use schema::{ContractSchema, FunctionSchema, StateMutability};
pub use session::Session;
pub use write::{Dispatch, TxOverrides, TxState, TxStatus, WriteHook};

pub use primitive_types::{H160 as Address, H256 as TxHash, U256};
