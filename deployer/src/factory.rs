// deployer/src/factory.rs
//! Compiled contract artifacts and the deployment target built from them.

use crate::error::DeployError;
use crate::shape::{constructor_inputs, constructor_is_payable, NamedShape};
use crate::transaction::Overrides;
use ethers::{
    abi::{Abi, Token},
    contract::Contract,
    providers::Middleware,
    types::{transaction::eip2718::TypedTransaction, Address, Bytes, TransactionRequest, U256},
    utils::get_contract_address,
};
use eyre::{Result, WrapErr};
use serde::{Deserialize, Deserializer};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing::debug;

/// A Hardhat or Foundry style build artifact. Only the ABI and the creation
/// bytecode are read.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractArtifact {
    #[serde(default)]
    pub contract_name: Option<String>,
    pub abi: serde_json::Value,
    #[serde(deserialize_with = "deserialize_bytecode")]
    pub bytecode: Bytes,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum BytecodeField {
    Hex(String),
    Object { object: String },
}

fn deserialize_bytecode<'de, D>(deserializer: D) -> Result<Bytes, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = match BytecodeField::deserialize(deserializer)? {
        BytecodeField::Hex(raw) => raw,
        BytecodeField::Object { object } => object,
    };
    decode_hex_bytecode(&raw).map_err(serde::de::Error::custom)
}

/// Decodes hex bytecode, tolerating surrounding whitespace and a `0x` prefix.
pub fn decode_hex_bytecode(raw: &str) -> std::result::Result<Bytes, hex::FromHexError> {
    let cleaned = raw.trim().trim_start_matches("0x");
    hex::decode(cleaned).map(Bytes::from)
}

impl ContractArtifact {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path_ref = path.as_ref();
        debug!("Loading contract artifact: {:?}", path_ref);

        let raw = fs::read_to_string(path_ref)
            .wrap_err_with(|| format!("Failed to read artifact file: {:?}", path_ref))?;
        serde_json::from_str(&raw).wrap_err_with(|| format!("Failed to parse artifact file: {:?}", path_ref))
    }

    /// Looks for `<name>.json` in the usual build layouts under `dir`.
    pub fn find(dir: impl AsRef<Path>, name: &str) -> Result<Self> {
        let dir = dir.as_ref();
        let candidates: Vec<PathBuf> = vec![
            dir.join(format!("{name}.json")),
            dir.join("contracts").join(format!("{name}.sol")).join(format!("{name}.json")),
            dir.join(format!("{name}.sol")).join(format!("{name}.json")),
        ];

        let found = candidates
            .iter()
            .find(|p| p.is_file())
            .ok_or_else(|| eyre::eyre!("No artifact for {} under {:?} (tried {:?})", name, dir, candidates))?;
        Self::load(found)
    }
}

/// The deployment target: constructor signature, creation bytecode and the
/// signing context deployments are sent through.
#[derive(Debug)]
pub struct InitCodeFactory<M> {
    abi: Abi,
    bytecode: Bytes,
    inputs: Vec<NamedShape>,
    payable: bool,
    client: Arc<M>,
    confirmations: usize,
}

impl<M: Middleware> InitCodeFactory<M> {
    pub fn new(abi_json: &serde_json::Value, bytecode: Bytes, client: Arc<M>) -> std::result::Result<Self, DeployError> {
        let abi: Abi = serde_json::from_value(abi_json.clone())
            .map_err(|e| DeployError::invalid_argument(format!("malformed ABI: {}", e), "abi", abi_json.to_string()))?;
        let inputs = constructor_inputs(abi_json)?;
        let payable = constructor_is_payable(abi_json)?;
        Ok(Self { abi, bytecode, inputs, payable, client, confirmations: 1 })
    }

    pub fn from_artifact(artifact: &ContractArtifact, client: Arc<M>) -> std::result::Result<Self, DeployError> {
        Self::new(&artifact.abi, artifact.bytecode.clone(), client)
    }

    /// Number of confirmations to wait for after broadcasting (default 1).
    pub fn confirmations(mut self, confirmations: usize) -> Self {
        self.confirmations = confirmations;
        self
    }

    pub fn required_confirmations(&self) -> usize {
        self.confirmations
    }

    pub fn constructor_inputs(&self) -> &[NamedShape] {
        &self.inputs
    }

    pub fn client(&self) -> Arc<M> {
        self.client.clone()
    }

    /// Builds the unsigned deployment transaction: creation bytecode followed
    /// by the ABI-encoded constructor arguments. `to` stays empty.
    /// Ether can only be attached when the constructor is payable.
    pub fn deploy_transaction(
        &self,
        tokens: Vec<Token>,
        overrides: &Overrides,
    ) -> std::result::Result<TypedTransaction, DeployError> {
        if !self.payable && overrides.value.map_or(false, |v| !v.is_zero()) {
            return Err(DeployError::unsupported_operation(
                "non-payable constructor cannot override value",
                "overrides.value",
            ));
        }

        let data: Bytes = match (self.abi.constructor(), tokens.is_empty()) {
            (None, false) => {
                return Err(DeployError::invalid_argument(
                    "constructor is not defined in the ABI",
                    "args",
                    tokens,
                ))
            }
            (None, true) => self.bytecode.clone(),
            (Some(constructor), _) => constructor
                .encode_input(self.bytecode.to_vec(), &tokens)
                .map_err(|e| {
                    DeployError::invalid_argument(format!("failed to encode constructor arguments: {}", e), "args", &tokens)
                })?
                .into(),
        };

        let mut tx: TypedTransaction = TransactionRequest::new().data(data).into();
        overrides.apply(&mut tx);
        Ok(tx)
    }

    /// Standard CREATE address of a contract deployed by `sender` at `nonce`.
    pub fn contract_address(sender: Address, nonce: U256) -> Address {
        get_contract_address(sender, nonce)
    }

    /// A contract handle at `address` using this factory's ABI and client.
    pub fn attach(&self, address: Address) -> Contract<M> {
        Contract::new(address, self.abi.clone(), self.client.clone())
    }
}
