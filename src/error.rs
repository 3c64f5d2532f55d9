// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) DUSK NETWORK. All rights reserved.

use thiserror::Error;

use crate::{abi::AbiError, chain::ChainError};

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned synchronously to the caller of a hook.
///
/// Failures that happen after a transaction is handed to the chain backend
/// are not returned here; they are recorded in the hook's state instead.
#[derive(Debug, Error)]
pub enum Error {
    /// The contract interface has no function with this name.
    #[error("unknown contract method '{0}'")]
    UnknownMethod(String),

    /// A read hook was mounted on a state-mutating method.
    #[error("'{0}' is not a view method")]
    NotAView(String),

    /// A read hook was mounted on a method that takes arguments.
    #[error("'{0}' takes arguments and cannot be polled")]
    ReadArguments(String),

    /// A write hook was created for a view method.
    #[error("'{0}' is a view method and cannot be sent as a transaction")]
    NotATransaction(String),

    /// Value was attached to a non-payable method.
    #[error("'{0}' is not payable")]
    NotPayable(String),

    /// No wallet account is connected.
    #[error("wallet not connected")]
    WalletNotConnected,

    /// User input rejected before submission.
    #[error("invalid input '{input}': {reason}")]
    InvalidInput {
        /// Raw input text.
        input: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// Malformed contract address.
    #[error("invalid contract address '{0}'")]
    InvalidAddress(String),

    /// Malformed node endpoint.
    #[error("invalid endpoint '{0}'")]
    InvalidEndpoint(String),

    /// Argument encoding failed.
    #[error("ABI error: {0}")]
    Abi(#[from] AbiError),

    /// Chain backend failure.
    #[error(transparent)]
    Chain(#[from] ChainError),

    /// Contract interface JSON could not be parsed.
    #[error("invalid contract interface: {0}")]
    Schema(#[from] serde_json::Error),
}
