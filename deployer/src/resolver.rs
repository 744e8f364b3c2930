// deployer/src/resolver.rs
//! Walks constructor argument shapes and swaps ENS names for checksummed
//! addresses. Sibling arguments are resolved concurrently and joined per level.

use crate::error::DeployError;
use crate::shape::{NamedShape, ParamShape};
use crate::value::ArgValue;
use async_trait::async_trait;
use ethers::{
    abi::Token,
    middleware::SignerMiddleware,
    providers::{JsonRpcClient, Middleware, MiddlewareError, Provider, ProviderError},
    signers::Signer,
    types::Address,
    utils::to_checksum,
};
use futures_util::future::{try_join_all, BoxFuture, FutureExt};
use std::error::Error as StdError;
use std::sync::Arc;
use tracing::debug;

/// Name-to-address lookup against a signer or provider.
#[async_trait]
pub trait NameResolver: Send + Sync {
    /// `Ok(None)` when the name has no resolver or no address configured.
    async fn lookup_address(&self, name: &str) -> Result<Option<Address>, DeployError>;
}

async fn lookup_via_middleware<M: Middleware>(client: &M, name: &str) -> Result<Option<Address>, DeployError>
where
    <M as Middleware>::Error: StdError + Send + Sync + 'static,
{
    match client.resolve_name(name).await {
        Ok(address) if address.is_zero() => Ok(None),
        Ok(address) => Ok(Some(address)),
        Err(e) => match e.as_provider_error() {
            Some(ProviderError::EnsError(_)) | Some(ProviderError::EnsNotOwned(_)) => Ok(None),
            _ => Err(DeployError::transport("ENS lookup failed", e)),
        },
    }
}

#[async_trait]
impl<P: JsonRpcClient + 'static> NameResolver for Provider<P> {
    async fn lookup_address(&self, name: &str) -> Result<Option<Address>, DeployError> {
        lookup_via_middleware(self, name).await
    }
}

#[async_trait]
impl<M, S> NameResolver for SignerMiddleware<M, S>
where
    M: Middleware + 'static,
    S: Signer + 'static,
{
    async fn lookup_address(&self, name: &str) -> Result<Option<Address>, DeployError> {
        lookup_via_middleware(self, name).await
    }
}

#[async_trait]
impl<T: NameResolver + ?Sized> NameResolver for Arc<T> {
    async fn lookup_address(&self, name: &str) -> Result<Option<Address>, DeployError> {
        self.as_ref().lookup_address(name).await
    }
}

/// Returns the EIP-55 form of `candidate` if it is a syntactically valid address:
/// 40 hex digits with an optional `0x`. All-lower and all-upper input is accepted
/// as is; mixed case must already match the checksum.
pub fn normalize_address(candidate: &str) -> Option<String> {
    let digits = candidate.strip_prefix("0x").unwrap_or(candidate);
    if digits.len() != 40 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }

    let raw = hex::decode(digits).ok()?;
    let checksummed = to_checksum(&Address::from_slice(&raw), None);

    let has_lower = digits.bytes().any(|b| b.is_ascii_lowercase());
    let has_upper = digits.bytes().any(|b| b.is_ascii_uppercase());
    if has_lower && has_upper && checksummed[2..] != *digits {
        return None;
    }
    Some(checksummed)
}

/// Resolves a single address-typed value to a checksummed address string.
pub async fn resolve_name<R>(resolver: Option<&R>, name_or_pending: ArgValue) -> Result<String, DeployError>
where
    R: NameResolver + ?Sized,
{
    let name = match name_or_pending.settle().await? {
        ArgValue::Text(text) | ArgValue::Token(Token::String(text)) => text,
        ArgValue::Token(Token::Address(address)) => to_checksum(&address, None),
        other => return Err(DeployError::invalid_argument("invalid address or ENS name", "name", other)),
    };

    if let Some(address) = normalize_address(&name) {
        return Ok(address);
    }

    let Some(resolver) = resolver else {
        return Err(DeployError::unsupported_operation(
            "a provider or signer is needed to resolve ENS names",
            "resolveName",
        ));
    };

    match resolver.lookup_address(&name).await? {
        Some(address) => {
            debug!(%name, %address, "Resolved ENS name");
            Ok(to_checksum(&address, None))
        }
        None => Err(DeployError::invalid_argument(
            "resolver or addr is not configured for ENS name",
            "name",
            name,
        )),
    }
}

/// Resolves an argument list against its shapes. `value` may be positional
/// (`List`) or keyed by parameter name (`Fields`); the result is positional and
/// follows the order of `shapes`.
pub fn resolve_addresses<'a, R>(
    resolver: Option<&'a R>,
    value: ArgValue,
    shapes: &'a [NamedShape],
) -> BoxFuture<'a, Result<Vec<ArgValue>, DeployError>>
where
    R: NameResolver + ?Sized,
{
    async move {
        let slots: Vec<Option<ArgValue>> = match value.settle().await? {
            ArgValue::List(items) => {
                if items.len() > shapes.len() {
                    return Err(DeployError::invalid_argument(
                        format!("expected at most {} values", shapes.len()),
                        "value",
                        items,
                    ));
                }
                let mut items = items.into_iter();
                shapes.iter().map(|_| items.next()).collect()
            }
            ArgValue::Fields(mut entries) => shapes
                .iter()
                .map(|param| {
                    entries
                        .iter()
                        .position(|(name, _)| *name == param.name)
                        .map(|idx| entries.swap_remove(idx).1)
                })
                .collect(),
            other => {
                return Err(DeployError::invalid_argument(
                    "expected a positional list or keyed fields",
                    "value",
                    other,
                ))
            }
        };

        let jobs = shapes.iter().zip(slots).enumerate().map(|(index, (param, slot))| async move {
            let value = slot.ok_or_else(|| {
                DeployError::invalid_argument(
                    format!("missing value for parameter {:?}", param.name),
                    "index",
                    index,
                )
            })?;
            resolve_param(resolver, value, &param.shape).await
        });

        try_join_all(jobs).await
    }
    .boxed()
}

/// Resolves one value against one shape. Only address-typed leaves are rewritten.
pub fn resolve_param<'a, R>(
    resolver: Option<&'a R>,
    value: ArgValue,
    shape: &'a ParamShape,
) -> BoxFuture<'a, Result<ArgValue, DeployError>>
where
    R: NameResolver + ?Sized,
{
    async move {
        match shape {
            ParamShape::Address => resolve_name(resolver, value).await.map(ArgValue::Text),
            ParamShape::Tuple(fields) => resolve_addresses(resolver, value, fields).await.map(ArgValue::List),
            ParamShape::Array(child) | ParamShape::FixedArray(child, _) => {
                let items = match value.settle().await? {
                    ArgValue::List(items) => items,
                    other => return Err(DeployError::invalid_argument("invalid value for array", "value", other)),
                };
                try_join_all(items.into_iter().map(|item| resolve_param(resolver, item, child)))
                    .await
                    .map(ArgValue::List)
            }
            ParamShape::Scalar(_) => value.settle().await,
        }
    }
    .boxed()
}
