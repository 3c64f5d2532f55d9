// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) DUSK NETWORK. All rights reserved.

//! Static ABI encoding for the parameter types the counter contracts use.
//!
//! Every supported type occupies a single 32-byte word, so call data is the
//! selector followed by one word per argument and return data is one word
//! per output.

use std::{fmt, str::FromStr};

use primitive_types::{H160, U256};
use thiserror::Error;

use crate::schema::FunctionSchema;

const WORD: usize = 32;
const ERROR_STRING_SELECTOR: [u8; 4] = [0x08, 0xc3, 0x79, 0xa0];
const PANIC_SELECTOR: [u8; 4] = [0x4e, 0x48, 0x7b, 0x71];

/// Errors raised while encoding arguments or decoding return data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AbiError {
    /// ABI type the codec does not handle.
    #[error("unsupported ABI type '{0}'")]
    UnsupportedType(String),

    /// Wrong number of arguments for a function.
    #[error("'{function}' takes {expected} argument(s), got {found}")]
    ArgumentCount {
        /// Function name.
        function: String,
        /// Declared parameter count.
        expected: usize,
        /// Supplied argument count.
        found: usize,
    },

    /// Argument kind does not match the declared parameter type.
    #[error("expected {expected}, got {found}")]
    TypeMismatch {
        /// Declared type.
        expected: String,
        /// Supplied token kind.
        found: String,
    },

    /// Integer does not fit the declared bit width.
    #[error("value does not fit in {0}")]
    OutOfRange(String),

    /// Return data shorter than the declared outputs.
    #[error("return data too short: need {expected} bytes, got {found}")]
    ShortOutput {
        /// Bytes needed.
        expected: usize,
        /// Bytes received.
        found: usize,
    },

    /// A word that is not a valid encoding of its type.
    #[error("invalid {0} word in return data")]
    InvalidWord(String),

    /// Text that cannot be parsed as a value of the given type.
    #[error("cannot parse '{input}' as {kind}")]
    InvalidLiteral {
        /// Offending text.
        input: String,
        /// Target type.
        kind: String,
    },
}

/// Parameter type of a function input or output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    /// Unsigned integer of the given bit width.
    Uint(usize),
    /// Boolean.
    Bool,
    /// 20-byte account address.
    Address,
}

impl FromStr for ParamType {
    type Err = AbiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bool" => Ok(Self::Bool),
            "address" => Ok(Self::Address),
            "uint" => Ok(Self::Uint(256)),
            _ => {
                let bits = s
                    .strip_prefix("uint")
                    .and_then(|bits| bits.parse::<usize>().ok())
                    .filter(|bits| *bits > 0 && *bits <= 256 && bits % 8 == 0)
                    .ok_or_else(|| AbiError::UnsupportedType(s.to_string()))?;
                Ok(Self::Uint(bits))
            }
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uint(bits) => write!(f, "uint{bits}"),
            Self::Bool => f.write_str("bool"),
            Self::Address => f.write_str("address"),
        }
    }
}

/// A decoded or to-be-encoded ABI value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Unsigned integer.
    Uint(U256),
    /// Boolean.
    Bool(bool),
    /// Account address.
    Address(H160),
}

impl Token {
    /// Parses user-supplied text as a value of `kind`.
    ///
    /// Integers accept decimal or `0x`-prefixed hex.
    pub fn parse(kind: ParamType, input: &str) -> Result<Self, AbiError> {
        let input = input.trim();
        let invalid = || AbiError::InvalidLiteral {
            input: input.to_string(),
            kind: kind.to_string(),
        };

        match kind {
            ParamType::Uint(bits) => {
                let value = match input.strip_prefix("0x") {
                    Some("") => return Err(invalid()),
                    Some(hex) => U256::from_str_radix(hex, 16).map_err(|_| invalid())?,
                    None if input.is_empty() => return Err(invalid()),
                    None => U256::from_dec_str(input).map_err(|_| invalid())?,
                };
                check_width(value, bits)?;
                Ok(Self::Uint(value))
            }
            ParamType::Bool => match input {
                "true" => Ok(Self::Bool(true)),
                "false" => Ok(Self::Bool(false)),
                _ => Err(invalid()),
            },
            ParamType::Address => parse_address(input).map(Self::Address),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Uint(_) => "uint",
            Self::Bool(_) => "bool",
            Self::Address(_) => "address",
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uint(value) => write!(f, "{value}"),
            Self::Bool(value) => write!(f, "{value}"),
            Self::Address(address) => f.write_str(&format_address(address)),
        }
    }
}

/// Parses a 20-byte hex address, with or without `0x`.
pub fn parse_address(input: &str) -> Result<H160, AbiError> {
    let invalid = || AbiError::InvalidLiteral {
        input: input.to_string(),
        kind: "address".to_string(),
    };

    let trimmed = input.trim();
    let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    let bytes = hex::decode(digits).map_err(|_| invalid())?;
    if bytes.len() != 20 {
        return Err(invalid());
    }
    Ok(H160::from_slice(&bytes))
}

/// Formats an address as full lowercase `0x` hex.
#[must_use]
pub fn format_address(address: &H160) -> String {
    format!("0x{}", hex::encode(address.as_bytes()))
}

/// Encodes selector plus arguments for `function`.
pub fn encode_call(function: &FunctionSchema, args: &[Token]) -> Result<Vec<u8>, AbiError> {
    let types = function.input_types()?;
    if types.len() != args.len() {
        return Err(AbiError::ArgumentCount {
            function: function.name.clone(),
            expected: types.len(),
            found: args.len(),
        });
    }

    let mut data = Vec::with_capacity(4 + WORD * args.len());
    data.extend_from_slice(&function.selector());
    for (kind, token) in types.iter().zip(args) {
        data.extend_from_slice(&encode_word(*kind, token)?);
    }
    Ok(data)
}

/// Encodes return values of `function`, as a contract would.
pub fn encode_output(function: &FunctionSchema, values: &[Token]) -> Result<Vec<u8>, AbiError> {
    let types = function.output_types()?;
    if types.len() != values.len() {
        return Err(AbiError::ArgumentCount {
            function: function.name.clone(),
            expected: types.len(),
            found: values.len(),
        });
    }

    let mut data = Vec::with_capacity(WORD * values.len());
    for (kind, token) in types.iter().zip(values) {
        data.extend_from_slice(&encode_word(*kind, token)?);
    }
    Ok(data)
}

/// Decodes the arguments that follow the selector in `data`.
pub fn decode_input(function: &FunctionSchema, data: &[u8]) -> Result<Vec<Token>, AbiError> {
    let body = data.get(4..).unwrap_or_default();
    decode_words(&function.input_types()?, body)
}

/// Decodes the return data of `function`.
pub fn decode_output(function: &FunctionSchema, data: &[u8]) -> Result<Vec<Token>, AbiError> {
    decode_words(&function.output_types()?, data)
}

/// Extracts a human-readable reason from revert data.
///
/// Understands `Error(string)` and `Panic(uint256)` payloads.
#[must_use]
pub fn decode_revert_reason(data: &[u8]) -> Option<String> {
    if data.len() < 4 {
        return None;
    }
    let (selector, body) = data.split_at(4);

    if selector == PANIC_SELECTOR {
        let code = U256::from_big_endian(body.get(..WORD)?);
        return Some(format!("panic code 0x{code:x}"));
    }
    if selector != ERROR_STRING_SELECTOR {
        return None;
    }

    let offset = word_to_usize(body.get(..WORD)?)?;
    let len = word_to_usize(body.get(offset..offset.checked_add(WORD)?)?)?;
    let start = offset + WORD;
    let text = body.get(start..start.checked_add(len)?)?;
    String::from_utf8(text.to_vec()).ok()
}

/// Converts decoded return tokens into a typed value.
pub trait Detokenize: Sized {
    /// Builds `Self` from the decoded outputs of a call.
    fn from_tokens(tokens: Vec<Token>) -> Result<Self, AbiError>;
}

impl Detokenize for U256 {
    fn from_tokens(tokens: Vec<Token>) -> Result<Self, AbiError> {
        match single(tokens, "uint256")? {
            Token::Uint(value) => Ok(value),
            other => Err(mismatch("uint256", &other)),
        }
    }
}

impl Detokenize for bool {
    fn from_tokens(tokens: Vec<Token>) -> Result<Self, AbiError> {
        match single(tokens, "bool")? {
            Token::Bool(value) => Ok(value),
            other => Err(mismatch("bool", &other)),
        }
    }
}

impl Detokenize for H160 {
    fn from_tokens(tokens: Vec<Token>) -> Result<Self, AbiError> {
        match single(tokens, "address")? {
            Token::Address(value) => Ok(value),
            other => Err(mismatch("address", &other)),
        }
    }
}

impl Detokenize for Vec<Token> {
    fn from_tokens(tokens: Vec<Token>) -> Result<Self, AbiError> {
        Ok(tokens)
    }
}

fn single(tokens: Vec<Token>, expected: &str) -> Result<Token, AbiError> {
    let found = tokens.len();
    let mut tokens = tokens.into_iter();
    match (tokens.next(), tokens.next()) {
        (Some(token), None) => Ok(token),
        _ => Err(AbiError::TypeMismatch {
            expected: expected.to_string(),
            found: format!("{found} values"),
        }),
    }
}

fn mismatch(expected: &str, token: &Token) -> AbiError {
    AbiError::TypeMismatch {
        expected: expected.to_string(),
        found: token.kind().to_string(),
    }
}

fn check_width(value: U256, bits: usize) -> Result<(), AbiError> {
    if value.bits() > bits {
        return Err(AbiError::OutOfRange(format!("uint{bits}")));
    }
    Ok(())
}

fn encode_word(kind: ParamType, token: &Token) -> Result<[u8; WORD], AbiError> {
    let mut word = [0u8; WORD];
    match (kind, token) {
        (ParamType::Uint(bits), Token::Uint(value)) => {
            check_width(*value, bits)?;
            // limbs are little-endian u64s
            for (i, limb) in value.0.iter().rev().enumerate() {
                word[i * 8..(i + 1) * 8].copy_from_slice(&limb.to_be_bytes());
            }
        }
        (ParamType::Bool, Token::Bool(value)) => word[WORD - 1] = u8::from(*value),
        (ParamType::Address, Token::Address(address)) => {
            word[12..].copy_from_slice(address.as_bytes());
        }
        (kind, token) => return Err(mismatch(&kind.to_string(), token)),
    }
    Ok(word)
}

fn decode_words(types: &[ParamType], data: &[u8]) -> Result<Vec<Token>, AbiError> {
    let expected = types.len() * WORD;
    if data.len() < expected {
        return Err(AbiError::ShortOutput {
            expected,
            found: data.len(),
        });
    }

    types
        .iter()
        .zip(data.chunks_exact(WORD))
        .map(|(kind, word)| decode_word(*kind, word))
        .collect()
}

fn decode_word(kind: ParamType, word: &[u8]) -> Result<Token, AbiError> {
    let invalid = || AbiError::InvalidWord(kind.to_string());
    match kind {
        ParamType::Uint(bits) => {
            let value = U256::from_big_endian(word);
            check_width(value, bits).map_err(|_| invalid())?;
            Ok(Token::Uint(value))
        }
        ParamType::Bool => {
            if word[..WORD - 1].iter().any(|b| *b != 0) {
                return Err(invalid());
            }
            match word[WORD - 1] {
                0 => Ok(Token::Bool(false)),
                1 => Ok(Token::Bool(true)),
                _ => Err(invalid()),
            }
        }
        ParamType::Address => {
            if word[..12].iter().any(|b| *b != 0) {
                return Err(invalid());
            }
            Ok(Token::Address(H160::from_slice(&word[12..])))
        }
    }
}

fn word_to_usize(word: &[u8]) -> Option<usize> {
    let value = U256::from_big_endian(word);
    if value > U256::from(u32::MAX) {
        return None;
    }
    usize::try_from(value.low_u64()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ParamSchema, StateMutability};

    fn function(name: &str, inputs: &[&str], outputs: &[&str]) -> FunctionSchema {
        let params = |kinds: &[&str]| {
            kinds
                .iter()
                .map(|kind| ParamSchema {
                    name: String::new(),
                    kind: (*kind).to_string(),
                })
                .collect()
        };
        FunctionSchema {
            name: name.to_string(),
            inputs: params(inputs),
            outputs: params(outputs),
            state_mutability: StateMutability::Nonpayable,
        }
    }

    #[test]
    fn parses_param_types() {
        assert_eq!("uint".parse::<ParamType>(), Ok(ParamType::Uint(256)));
        assert_eq!("uint8".parse::<ParamType>(), Ok(ParamType::Uint(8)));
        assert_eq!("address".parse::<ParamType>(), Ok(ParamType::Address));
        assert!(matches!(
            "uint7".parse::<ParamType>(),
            Err(AbiError::UnsupportedType(_))
        ));
        assert!("string".parse::<ParamType>().is_err());
    }

    #[test]
    fn encodes_transfer_call() {
        let transfer = function("transfer", &["address", "uint256"], &["bool"]);
        let to = parse_address("0x00000000000000000000000000000000000000ff").expect("address");
        let data = encode_call(&transfer, &[Token::Address(to), Token::Uint(U256::from(1000))])
            .expect("encode");

        assert_eq!(data.len(), 4 + 64);
        assert_eq!(&data[..4], &[0xa9, 0x05, 0x9c, 0xbb]);
        assert_eq!(data[4 + 31], 0xff);
        assert_eq!(&data[4 + 62..], &[0x03, 0xe8]);
        assert_eq!(
            decode_input(&transfer, &data).expect("decode"),
            vec![Token::Address(to), Token::Uint(U256::from(1000))]
        );
    }

    #[test]
    fn rejects_wrong_arity_and_types() {
        let set = function("setCount", &["uint256"], &[]);
        assert!(matches!(
            encode_call(&set, &[]),
            Err(AbiError::ArgumentCount {
                expected: 1,
                found: 0,
                ..
            })
        ));
        assert!(matches!(
            encode_call(&set, &[Token::Bool(true)]),
            Err(AbiError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn enforces_bit_width() {
        let small = function("setSmall", &["uint8"], &[]);
        assert!(encode_call(&small, &[Token::Uint(U256::from(255))]).is_ok());
        assert_eq!(
            encode_call(&small, &[Token::Uint(U256::from(256))]),
            Err(AbiError::OutOfRange("uint8".to_string()))
        );
    }

    #[test]
    fn decodes_full_width_uint() {
        let count = function("count", &[], &["uint256"]);
        let tokens = decode_output(&count, &[0xff; 32]).expect("decode");
        assert_eq!(U256::from_tokens(tokens).expect("uint"), U256::MAX);
    }

    #[test]
    fn short_output_is_an_error() {
        let count = function("count", &[], &["uint256"]);
        assert_eq!(
            decode_output(&count, &[0u8; 31]),
            Err(AbiError::ShortOutput {
                expected: 32,
                found: 31
            })
        );
    }

    #[test]
    fn rejects_dirty_bool_word() {
        let flag = function("flag", &[], &["bool"]);
        let mut word = [0u8; 32];
        word[31] = 2;
        assert!(matches!(
            decode_output(&flag, &word),
            Err(AbiError::InvalidWord(_))
        ));
    }

    #[test]
    fn parses_literals() {
        let uint = ParamType::Uint(256);
        assert_eq!(Token::parse(uint, "0x10"), Ok(Token::Uint(U256::from(16))));
        assert_eq!(Token::parse(ParamType::Bool, "true"), Ok(Token::Bool(true)));
        assert!(Token::parse(uint, "-1").is_err());
        assert!(Token::parse(uint, "0x").is_err());
        assert!(Token::parse(uint, "").is_err());
        assert!(Token::parse(ParamType::Address, "0x1234").is_err());

        let address = format!("0x{}", "00".repeat(19) + "ff");
        assert_eq!(parse_address(&address), Ok(H160::from_low_u64_be(0xff)));
        let doubled = format!("0x0x{}", "00".repeat(19) + "ff");
        assert!(parse_address(&doubled).is_err());
    }

    #[test]
    fn decodes_error_string_revert() {
        let mut data = ERROR_STRING_SELECTOR.to_vec();
        let mut offset = [0u8; 32];
        offset[31] = 0x20;
        let mut len = [0u8; 32];
        len[31] = 4;
        let mut text = [0u8; 32];
        text[..4].copy_from_slice(b"nope");
        data.extend_from_slice(&offset);
        data.extend_from_slice(&len);
        data.extend_from_slice(&text);

        assert_eq!(decode_revert_reason(&data).as_deref(), Some("nope"));
    }

    #[test]
    fn decodes_panic_revert() {
        let mut data = PANIC_SELECTOR.to_vec();
        let mut code = [0u8; 32];
        code[31] = 0x11;
        data.extend_from_slice(&code);

        assert_eq!(decode_revert_reason(&data).as_deref(), Some("panic code 0x11"));
        assert_eq!(decode_revert_reason(&[0xde, 0xad]), None);
    }
}
