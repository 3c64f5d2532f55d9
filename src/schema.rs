// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) DUSK NETWORK. All rights reserved.

//! Schema types for contract interfaces.
//!
//! A [`ContractSchema`] is read from the Solidity ABI JSON emitted by the
//! compiler. Only `function` entries are kept; constructors, events and
//! errors are skipped.

use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};

use crate::abi::{AbiError, ParamType};

/// How a function interacts with contract state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateMutability {
    /// Reads neither state nor environment.
    Pure,
    /// Reads state without modifying it.
    View,
    /// Modifies state, rejects attached value.
    Nonpayable,
    /// Modifies state, accepts attached value.
    Payable,
}

impl StateMutability {
    /// Whether calling the function needs no transaction.
    #[must_use]
    pub fn is_read_only(self) -> bool {
        matches!(self, Self::Pure | Self::View)
    }

    /// Whether the function accepts attached value.
    #[must_use]
    pub fn is_payable(self) -> bool {
        matches!(self, Self::Payable)
    }
}

/// Schema for a single function parameter or return value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamSchema {
    /// Parameter name (empty for unnamed return values).
    #[serde(default)]
    pub name: String,
    /// Canonical ABI type, e.g. `uint256`.
    #[serde(rename = "type")]
    pub kind: String,
}

/// Schema for a contract function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionSchema {
    /// Function name.
    pub name: String,
    /// Positional inputs.
    pub inputs: Vec<ParamSchema>,
    /// Positional outputs.
    pub outputs: Vec<ParamSchema>,
    /// State mutability.
    pub state_mutability: StateMutability,
}

impl FunctionSchema {
    /// Canonical signature, e.g. `setCount(uint256)`.
    #[must_use]
    pub fn signature(&self) -> String {
        let inputs = self
            .inputs
            .iter()
            .map(|param| param.kind.as_str())
            .collect::<Vec<_>>()
            .join(",");
        format!("{}({inputs})", self.name)
    }

    /// First four bytes of the Keccak-256 hash of the signature.
    #[must_use]
    pub fn selector(&self) -> [u8; 4] {
        let digest = Keccak256::digest(self.signature().as_bytes());
        [digest[0], digest[1], digest[2], digest[3]]
    }

    /// Parsed input types.
    pub fn input_types(&self) -> Result<Vec<ParamType>, AbiError> {
        self.inputs.iter().map(|p| p.kind.parse()).collect()
    }

    /// Parsed output types.
    pub fn output_types(&self) -> Result<Vec<ParamType>, AbiError> {
        self.outputs.iter().map(|p| p.kind.parse()).collect()
    }
}

/// Complete schema for a contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContractSchema {
    /// Contract name.
    pub name: String,
    /// List of contract functions.
    pub functions: Vec<FunctionSchema>,
}

impl ContractSchema {
    /// Parses Solidity ABI JSON into a schema named `name`.
    pub fn from_abi_json(name: impl Into<String>, json: &str) -> serde_json::Result<Self> {
        let entries: Vec<AbiEntry> = serde_json::from_str(json)?;
        let functions = entries
            .into_iter()
            .filter_map(AbiEntry::into_function)
            .collect();

        Ok(Self {
            name: name.into(),
            functions,
        })
    }

    /// Returns an iterator over all functions.
    pub fn iter_functions(&self) -> impl Iterator<Item = &FunctionSchema> {
        self.functions.iter()
    }

    /// Find a function by name.
    #[must_use]
    pub fn get_function(&self, name: &str) -> Option<&FunctionSchema> {
        self.functions.iter().find(|f| f.name == name)
    }

    /// Find a function by its 4-byte selector.
    #[must_use]
    pub fn get_function_by_selector(&self, selector: [u8; 4]) -> Option<&FunctionSchema> {
        self.functions.iter().find(|f| f.selector() == selector)
    }
}

/// Raw ABI JSON entry. Older compilers emit `constant`/`payable` instead of
/// `stateMutability`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AbiEntry {
    #[serde(rename = "type", default = "default_entry_kind")]
    kind: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    inputs: Vec<ParamSchema>,
    #[serde(default)]
    outputs: Vec<ParamSchema>,
    #[serde(default)]
    state_mutability: Option<StateMutability>,
    #[serde(default)]
    constant: Option<bool>,
    #[serde(default)]
    payable: Option<bool>,
}

fn default_entry_kind() -> String {
    "function".to_string()
}

impl AbiEntry {
    fn into_function(self) -> Option<FunctionSchema> {
        if self.kind != "function" {
            return None;
        }

        let state_mutability = self.state_mutability.unwrap_or(match (self.constant, self.payable) {
            (Some(true), _) => StateMutability::View,
            (_, Some(true)) => StateMutability::Payable,
            _ => StateMutability::Nonpayable,
        });

        Some(FunctionSchema {
            name: self.name?,
            inputs: self.inputs,
            outputs: self.outputs,
            state_mutability,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ERC20_FRAGMENT: &str = r#"[
        {"type":"constructor","inputs":[{"name":"supply","type":"uint256"}]},
        {"type":"event","name":"Transfer","inputs":[],"anonymous":false},
        {"type":"function","name":"transfer","stateMutability":"nonpayable",
         "inputs":[{"name":"to","type":"address"},{"name":"amount","type":"uint256"}],
         "outputs":[{"name":"","type":"bool"}]},
        {"name":"balanceOf","constant":true,
         "inputs":[{"name":"owner","type":"address"}],
         "outputs":[{"name":"","type":"uint256"}]}
    ]"#;

    #[test]
    fn keeps_only_functions() {
        let schema = ContractSchema::from_abi_json("Token", ERC20_FRAGMENT).expect("parse abi");
        let names: Vec<_> = schema.iter_functions().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["transfer", "balanceOf"]);
    }

    #[test]
    fn legacy_constant_flag_maps_to_view() {
        let schema = ContractSchema::from_abi_json("Token", ERC20_FRAGMENT).expect("parse abi");
        let balance_of = schema.get_function("balanceOf").expect("balanceOf");
        assert_eq!(balance_of.state_mutability, StateMutability::View);
        assert!(balance_of.state_mutability.is_read_only());
    }

    #[test]
    fn selectors_match_known_values() {
        let schema = ContractSchema::from_abi_json("Token", ERC20_FRAGMENT).expect("parse abi");
        let transfer = schema.get_function("transfer").expect("transfer");
        assert_eq!(transfer.signature(), "transfer(address,uint256)");
        assert_eq!(transfer.selector(), [0xa9, 0x05, 0x9c, 0xbb]);

        let balance_of = schema.get_function("balanceOf").expect("balanceOf");
        assert_eq!(balance_of.selector(), [0x70, 0xa0, 0x82, 0x31]);
        assert_eq!(
            schema.get_function_by_selector([0x70, 0xa0, 0x82, 0x31]),
            Some(balance_of)
        );
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(ContractSchema::from_abi_json("Broken", "{ not json").is_err());
    }
}
