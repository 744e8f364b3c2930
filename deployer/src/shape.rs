// deployer/src/shape.rs
//! Constructor parameter shapes.
//!
//! `ethers::abi::ParamType` drops the names of tuple components, so shapes are
//! parsed straight from the JSON ABI to keep them. Keyed (by field name) argument
//! matching depends on those names.

use crate::error::DeployError;
use ethers::abi::{param_type::Reader, ParamType};
use serde::Deserialize;

/// One entry of a JSON ABI `inputs` list.
#[derive(Debug, Clone, Deserialize)]
pub struct AbiParam {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub components: Vec<AbiParam>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParamShape {
    /// Resolved through ENS when given a name.
    Address,
    /// Any other elementary type; passed through untouched by the resolver.
    Scalar(ParamType),
    Tuple(Vec<NamedShape>),
    FixedArray(Box<ParamShape>, usize),
    Array(Box<ParamShape>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct NamedShape {
    pub name: String,
    pub shape: ParamShape,
}

impl NamedShape {
    pub fn new(name: impl Into<String>, shape: ParamShape) -> Self {
        Self { name: name.into(), shape }
    }

    pub fn from_abi_param(param: &AbiParam) -> Result<Self, DeployError> {
        Ok(Self {
            name: param.name.clone(),
            shape: ParamShape::parse(&param.kind, &param.components)?,
        })
    }
}

impl ParamShape {
    /// Parses an ABI type string such as `address`, `uint256[3]` or `tuple[]`.
    /// `components` is only consulted for tuple types.
    pub fn parse(kind: &str, components: &[AbiParam]) -> Result<Self, DeployError> {
        let kind = kind.trim();

        if let Some(without_close) = kind.strip_suffix(']') {
            let open = without_close
                .rfind('[')
                .ok_or_else(|| DeployError::invalid_argument("unbalanced array type", "type", kind))?;
            let child = Box::new(Self::parse(&without_close[..open], components)?);
            let size = &without_close[open + 1..];
            if size.is_empty() {
                return Ok(ParamShape::Array(child));
            }
            let len = size
                .parse::<usize>()
                .map_err(|_| DeployError::invalid_argument("invalid fixed array length", "type", kind))?;
            return Ok(ParamShape::FixedArray(child, len));
        }

        match kind {
            "tuple" => {
                let fields = components
                    .iter()
                    .map(NamedShape::from_abi_param)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(ParamShape::Tuple(fields))
            }
            "address" => Ok(ParamShape::Address),
            other => Reader::read(other)
                .map(ParamShape::Scalar)
                .map_err(|e| DeployError::invalid_argument(format!("unsupported ABI type: {}", e), "type", other)),
        }
    }

    pub fn to_param_type(&self) -> ParamType {
        match self {
            ParamShape::Address => ParamType::Address,
            ParamShape::Scalar(kind) => kind.clone(),
            ParamShape::Tuple(fields) => {
                ParamType::Tuple(fields.iter().map(|f| f.shape.to_param_type()).collect())
            }
            ParamShape::FixedArray(child, len) => ParamType::FixedArray(Box::new(child.to_param_type()), *len),
            ParamShape::Array(child) => ParamType::Array(Box::new(child.to_param_type())),
        }
    }
}

fn constructor_entry(abi: &serde_json::Value) -> Result<Option<&serde_json::Value>, DeployError> {
    let entries = abi
        .as_array()
        .ok_or_else(|| DeployError::invalid_argument("ABI must be a JSON array", "abi", abi.to_string()))?;

    Ok(entries
        .iter()
        .find(|entry| entry.get("type").and_then(|t| t.as_str()) == Some("constructor")))
}

/// Extracts the constructor inputs from a JSON ABI array. A contract without
/// an explicit constructor takes no arguments.
pub fn constructor_inputs(abi: &serde_json::Value) -> Result<Vec<NamedShape>, DeployError> {
    let Some(constructor) = constructor_entry(abi)? else {
        return Ok(Vec::new());
    };

    let inputs: Vec<AbiParam> = match constructor.get("inputs") {
        Some(inputs) => serde_json::from_value(inputs.clone())
            .map_err(|e| DeployError::invalid_argument(format!("malformed constructor inputs: {}", e), "abi", inputs.to_string()))?,
        None => Vec::new(),
    };

    inputs.iter().map(NamedShape::from_abi_param).collect()
}

/// Whether the constructor accepts ether. Reads `stateMutability`, falling back
/// to the legacy `payable` flag. A missing constructor is not payable.
pub fn constructor_is_payable(abi: &serde_json::Value) -> Result<bool, DeployError> {
    let Some(constructor) = constructor_entry(abi)? else {
        return Ok(false);
    };

    Ok(match constructor.get("stateMutability").and_then(|m| m.as_str()) {
        Some(mutability) => mutability == "payable",
        None => constructor.get("payable").and_then(|p| p.as_bool()).unwrap_or(false),
    })
}
