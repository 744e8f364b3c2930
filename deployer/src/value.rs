// deployer/src/value.rs
//! Constructor argument values as supplied by the caller, and their encoding
//! into ABI tokens once every name and pending computation has been resolved.

use crate::error::DeployError;
use crate::shape::ParamShape;
use crate::transaction::Overrides;
use ethers::{
    abi::{ParamType, Token},
    types::{Address, I256, U256},
};
use futures_util::future::{BoxFuture, FutureExt};
use std::fmt;
use std::future::Future;

/// A value that has not been computed yet, e.g. an outstanding lookup.
pub type PendingValue = BoxFuture<'static, Result<ArgValue, DeployError>>;

pub enum ArgValue {
    /// Already ABI-typed.
    Token(Token),
    /// An address, an ENS name, a number literal or plain string data,
    /// depending on the parameter it lands in.
    Text(String),
    /// Positional sequence (argument list, tuple or array).
    List(Vec<ArgValue>),
    /// Keyed by parameter / component name.
    Fields(Vec<(String, ArgValue)>),
    Pending(PendingValue),
    /// Only meaningful as the trailing deploy argument.
    Overrides(Box<Overrides>),
}

impl ArgValue {
    pub fn pending<F>(fut: F) -> Self
    where
        F: Future<Output = Result<ArgValue, DeployError>> + Send + 'static,
    {
        ArgValue::Pending(fut.boxed())
    }

    pub fn fields<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, ArgValue)>,
    {
        ArgValue::Fields(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Awaits pending values (which may themselves yield pending values)
    /// until a settled value remains.
    pub async fn settle(self) -> Result<ArgValue, DeployError> {
        let mut value = self;
        while let ArgValue::Pending(fut) = value {
            value = fut.await?;
        }
        Ok(value)
    }
}

impl fmt::Debug for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgValue::Token(token) => f.debug_tuple("Token").field(token).finish(),
            ArgValue::Text(text) => f.debug_tuple("Text").field(text).finish(),
            ArgValue::List(items) => f.debug_tuple("List").field(items).finish(),
            ArgValue::Fields(entries) => f.debug_tuple("Fields").field(entries).finish(),
            ArgValue::Pending(_) => f.write_str("Pending(..)"),
            ArgValue::Overrides(overrides) => f.debug_tuple("Overrides").field(overrides).finish(),
        }
    }
}

impl From<Token> for ArgValue {
    fn from(token: Token) -> Self {
        ArgValue::Token(token)
    }
}
impl From<&str> for ArgValue {
    fn from(text: &str) -> Self {
        ArgValue::Text(text.to_string())
    }
}
impl From<String> for ArgValue {
    fn from(text: String) -> Self {
        ArgValue::Text(text)
    }
}
impl From<U256> for ArgValue {
    fn from(value: U256) -> Self {
        ArgValue::Token(Token::Uint(value))
    }
}
impl From<u64> for ArgValue {
    fn from(value: u64) -> Self {
        ArgValue::Token(Token::Uint(U256::from(value)))
    }
}
impl From<bool> for ArgValue {
    fn from(value: bool) -> Self {
        ArgValue::Token(Token::Bool(value))
    }
}
impl From<Address> for ArgValue {
    fn from(address: Address) -> Self {
        ArgValue::Token(Token::Address(address))
    }
}
impl From<Vec<ArgValue>> for ArgValue {
    fn from(items: Vec<ArgValue>) -> Self {
        ArgValue::List(items)
    }
}
impl From<Overrides> for ArgValue {
    fn from(overrides: Overrides) -> Self {
        ArgValue::Overrides(Box::new(overrides))
    }
}

/// Encodes a resolved value against its shape.
pub fn tokenize(value: ArgValue, shape: &ParamShape) -> Result<Token, DeployError> {
    match value {
        ArgValue::Token(token) => {
            let expected = shape.to_param_type();
            if token.type_check(&expected) {
                Ok(token)
            } else {
                Err(DeployError::invalid_argument(
                    format!("token does not match parameter type {}", expected),
                    "value",
                    token,
                ))
            }
        }
        ArgValue::Text(text) => tokenize_text(text, shape),
        ArgValue::List(items) => match shape {
            ParamShape::Array(child) => items
                .into_iter()
                .map(|item| tokenize(item, child))
                .collect::<Result<Vec<_>, _>>()
                .map(Token::Array),
            ParamShape::FixedArray(child, len) => {
                if items.len() != *len {
                    return Err(DeployError::invalid_argument(
                        format!("expected {} array elements", len),
                        "value",
                        items.len(),
                    ));
                }
                items
                    .into_iter()
                    .map(|item| tokenize(item, child))
                    .collect::<Result<Vec<_>, _>>()
                    .map(Token::FixedArray)
            }
            ParamShape::Tuple(fields) => {
                if items.len() != fields.len() {
                    return Err(DeployError::invalid_argument(
                        format!("expected {} tuple components", fields.len()),
                        "value",
                        items.len(),
                    ));
                }
                items
                    .into_iter()
                    .zip(fields)
                    .map(|(item, field)| tokenize(item, &field.shape))
                    .collect::<Result<Vec<_>, _>>()
                    .map(Token::Tuple)
            }
            ParamShape::Address | ParamShape::Scalar(_) => Err(DeployError::invalid_argument(
                "sequence given for a scalar parameter",
                "value",
                items,
            )),
        },
        ArgValue::Fields(mut entries) => match shape {
            ParamShape::Tuple(fields) => fields
                .iter()
                .map(|field| {
                    let idx = entries
                        .iter()
                        .position(|(name, _)| *name == field.name)
                        .ok_or_else(|| DeployError::invalid_argument("missing tuple component", "name", &field.name))?;
                    tokenize(entries.swap_remove(idx).1, &field.shape)
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Token::Tuple),
            _ => Err(DeployError::invalid_argument("keyed value given for a non-tuple parameter", "value", entries)),
        },
        ArgValue::Pending(_) => Err(DeployError::invalid_argument("value was not resolved before encoding", "value", "Pending")),
        ArgValue::Overrides(overrides) => Err(DeployError::invalid_argument(
            "overrides are only accepted as the trailing deploy argument",
            "value",
            overrides,
        )),
    }
}

fn tokenize_text(text: String, shape: &ParamShape) -> Result<Token, DeployError> {
    let kind = match shape {
        ParamShape::Address => {
            return text
                .parse::<Address>()
                .map(Token::Address)
                .map_err(|_| DeployError::invalid_argument("invalid address", "value", text));
        }
        ParamShape::Scalar(kind) => kind,
        _ => return Err(DeployError::invalid_argument("string given for a composite parameter", "value", text)),
    };

    let invalid = |what: &str, text: &str| DeployError::invalid_argument(format!("invalid {} literal", what), "value", text);

    match kind {
        ParamType::String => Ok(Token::String(text)),
        ParamType::Uint(_) => {
            let parsed = match text.strip_prefix("0x") {
                Some(hex_digits) => U256::from_str_radix(hex_digits, 16).ok(),
                None => U256::from_dec_str(&text).ok(),
            };
            parsed.map(Token::Uint).ok_or_else(|| invalid("uint", &text))
        }
        ParamType::Int(_) => I256::from_dec_str(&text)
            .map(|v| Token::Int(v.into_raw()))
            .map_err(|_| invalid("int", &text)),
        ParamType::Bool => match text.as_str() {
            "true" => Ok(Token::Bool(true)),
            "false" => Ok(Token::Bool(false)),
            _ => Err(invalid("bool", &text)),
        },
        ParamType::Bytes => hex::decode(text.trim_start_matches("0x"))
            .map(Token::Bytes)
            .map_err(|_| invalid("bytes", &text)),
        ParamType::FixedBytes(len) => match hex::decode(text.trim_start_matches("0x")) {
            Ok(bytes) if bytes.len() == *len => Ok(Token::FixedBytes(bytes)),
            _ => Err(invalid("fixed bytes", &text)),
        },
        other => Err(DeployError::invalid_argument(
            format!("cannot encode a string as {}", other),
            "value",
            text,
        )),
    }
}
