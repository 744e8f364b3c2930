// tests/initcode_node_test.rs
#![cfg(feature = "local_node")] // Needs a running dev node (anvil / hardhat) at HTTP_RPC_URL
#![allow(clippy::all)]

use ethers::{
    abi::Token,
    providers::Middleware,
    types::{transaction::eip2718::TypedTransaction, Bytes, TransactionRequest, U256},
};
use eyre::{Result, WrapErr};
use initcode_deployer::{
    config::load_config,
    deploy, deploy_init_code,
    poc::{connect, PocClient},
    ArgValue, InitCodeFactory, Overrides, INIT_CODE_DROPPER,
};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, Level};

// --- Constants ---
// Returns the 10 bytes after itself as runtime code.
const INIT_CODE: &str = "600a600c600039600a6000f3";
// Returns 42 as a 32-byte word.
const RUNTIME_CODE: &str = "602a60005260206000f3";

// --- Test Setup ---
async fn setup() -> Result<Arc<PocClient>> {
    let _ = tracing_subscriber::fmt().with_max_level(Level::INFO).with_test_writer().try_init();

    let config = load_config()?;
    connect(&config).await.wrap_err("Failed to connect. Is anvil running?")
}

fn creation_code() -> Bytes {
    Bytes::from(hex::decode(format!("{INIT_CODE}{RUNTIME_CODE}")).unwrap())
}

fn runtime_code() -> Bytes {
    Bytes::from(hex::decode(RUNTIME_CODE).unwrap())
}

// --- Tests ---

#[tokio::test]
#[ignore]
async fn standard_deploy_stores_runtime_code() -> Result<()> {
    let client = setup().await?;
    let factory = InitCodeFactory::new(&json!([]), creation_code(), client.clone())?;

    let deployment = deploy(&factory, vec![]).await?;
    let code = client.get_code(deployment.address(), None).await?;
    assert_eq!(code, runtime_code());
    assert_eq!(deployment.deploy_transaction().contract_address, Some(deployment.address()));
    Ok(())
}

#[tokio::test]
#[ignore]
async fn init_code_deploy_stores_creation_code() -> Result<()> {
    let client = setup().await?;
    let abi = json!([
        { "type": "constructor", "stateMutability": "payable", "inputs": [{ "name": "seed", "type": "uint256" }] }
    ]);
    let factory = InitCodeFactory::new(&abi, creation_code(), client.clone())?;

    let overrides = Overrides::default().value(5u64);
    let deployment = deploy_init_code(&factory, vec![ArgValue::from(7u64), overrides.into()]).await?;
    let address = deployment.address();
    info!(%address, "Init code stored");

    // creation code followed by the encoded constructor argument, dropper gone
    let mut expected = creation_code().to_vec();
    expected.extend(ethers::abi::encode(&[Token::Uint(U256::from(7))]));
    let code = client.get_code(address, None).await?;
    assert_eq!(code.to_vec(), expected);
    assert!(!hex::encode(&code).starts_with(&INIT_CODE_DROPPER[2..]));

    assert_eq!(deployment.deploy_transaction().contract_address, Some(address));
    assert_eq!(client.get_balance(address, None).await?, U256::from(5));

    // running the stored code still yields the runtime code
    let call: TypedTransaction = TransactionRequest::new().to(address).into();
    let returned = client.call(&call, None).await?;
    assert_eq!(returned, runtime_code());
    Ok(())
}

#[tokio::test]
#[ignore]
async fn consecutive_deploys_follow_the_sender_nonce() -> Result<()> {
    let client = setup().await?;
    let factory = InitCodeFactory::new(&json!([]), creation_code(), client.clone())?;
    let sender = client.address();

    for _ in 0..2 {
        let nonce = client.get_transaction_count(sender, None).await?;
        let deployment = deploy_init_code(&factory, vec![]).await?;
        assert_eq!(deployment.address(), ethers::utils::get_contract_address(sender, nonce));
    }
    Ok(())
}
// END OF FILE: tests/initcode_node_test.rs
