// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) DUSK NETWORK. All rights reserved.

use std::sync::Arc;

use primitive_types::H160;

use crate::{
    abi,
    error::{Error, Result},
    schema::{ContractSchema, FunctionSchema},
};

/// ABI of the counter contract the front-end talks to.
pub const SIMPLE_CONTRACT_ABI: &str = include_str!("../abi/SimpleContract.json");

/// Name under which [`SIMPLE_CONTRACT_ABI`] is registered.
pub const SIMPLE_CONTRACT_NAME: &str = "SimpleContract";

/// Address and interface of the contract every hook talks to.
///
/// Built once at start-up and cloned into each hook; clones share the parsed
/// interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractBinding {
    address: H160,
    schema: Arc<ContractSchema>,
}

impl ContractBinding {
    /// Binds `schema` to `address`.
    #[must_use]
    pub fn new(address: H160, schema: ContractSchema) -> Self {
        Self {
            address,
            schema: Arc::new(schema),
        }
    }

    /// Binds the bundled counter contract interface to `address`.
    pub fn simple_contract(address: H160) -> Result<Self> {
        let schema = ContractSchema::from_abi_json(SIMPLE_CONTRACT_NAME, SIMPLE_CONTRACT_ABI)?;
        Ok(Self::new(address, schema))
    }

    /// Like [`ContractBinding::simple_contract`], parsing the address from hex.
    pub fn simple_contract_at(address: &str) -> Result<Self> {
        let parsed =
            abi::parse_address(address).map_err(|_| Error::InvalidAddress(address.to_string()))?;
        Self::simple_contract(parsed)
    }

    /// The `(address, interface)` pair.
    #[must_use]
    pub fn get_binding(&self) -> (H160, &ContractSchema) {
        (self.address, &self.schema)
    }

    /// Contract address.
    #[must_use]
    pub fn address(&self) -> H160 {
        self.address
    }

    /// Contract interface.
    #[must_use]
    pub fn schema(&self) -> &ContractSchema {
        &self.schema
    }

    /// Looks up `method` in the interface.
    pub fn function(&self, method: &str) -> Result<&FunctionSchema> {
        self.schema
            .get_function(method)
            .ok_or_else(|| Error::UnknownMethod(method.to_string()))
    }
}
