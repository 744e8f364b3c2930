// deployer/src/poc.rs
//! End-to-end demonstration against a local dev node:
//!
//! 1. `AnyCode` redeploys `Simple`'s runtime code at a salt-derived address.
//! 2. `SimpleWithCons`' init code (constructor args included) is stored on chain
//!    with [`deploy_init_code`], then `AnyCode` delegatecalls it to build the real
//!    contract at its own salt-derived address, forwarding attached ether.

use crate::bindings::{AnyCode, Simple, SimpleWithCons};
use crate::config::Config;
use crate::deploy::{deploy, deploy_init_code};
use crate::factory::{ContractArtifact, InitCodeFactory};
use crate::transaction::TX_SUCCESS_STATUS;
use crate::value::ArgValue;
use ethers::{
    contract::ContractCall,
    prelude::{Http, LocalWallet, Middleware, Provider, Signer, SignerMiddleware},
    types::{Address, TransactionReceipt, U256},
    utils::{format_ether, parse_ether},
};
use eyre::{eyre, Result, WrapErr};
use std::{sync::Arc, time::Duration};
use tracing::{info, instrument};

pub type PocClient = SignerMiddleware<Provider<Http>, LocalWallet>;

pub const FINAL_CODE_VALUE: u64 = 123;
pub const INITIAL_VALUE: u64 = 456;
pub const PREFIX: &str = "new_simpleWC says: ";
pub const ETHER_TO_SEND: &str = "1";
const CONSOLE_MESSAGE: &str = "Here I am!";

#[derive(Debug, Clone)]
pub struct PocReport {
    pub any_code: Address,
    pub init_code_holder: Address,
    pub from_final_code: Address,
    pub from_init_code: Address,
    pub final_code_value: U256,
    pub init_code_value: U256,
    pub init_code_balance: U256,
}

#[instrument(skip_all, name = "poc_connect")]
pub async fn connect(config: &Config) -> Result<Arc<PocClient>> {
    let provider = Provider::<Http>::try_from(config.http_rpc_url.as_str())
        .wrap_err("Failed to create HTTP provider")?
        .interval(Duration::from_millis(config.poll_interval_ms));

    let chain_id = match config.chain_id {
        Some(id) => id,
        None => provider.get_chainid().await.wrap_err("Failed to query chain id")?.as_u64(),
    };
    let wallet = config
        .private_key
        .parse::<LocalWallet>()
        .wrap_err("Invalid PRIVATE_KEY")?
        .with_chain_id(chain_id);

    info!("Connected (Chain ID: {}, Wallet: {:?})", chain_id, wallet.address());
    Ok(Arc::new(SignerMiddleware::new(provider, wallet)))
}

fn load_factory(config: &Config, name: &str, client: Arc<PocClient>) -> Result<InitCodeFactory<PocClient>> {
    let artifact = ContractArtifact::find(&config.artifacts_dir, name)?;
    let factory = InitCodeFactory::from_artifact(&artifact, client)
        .wrap_err_with(|| format!("Artifact for {} is unusable", name))?;
    Ok(factory.confirmations(config.confirmations))
}

async fn confirm(call: ContractCall<PocClient, ()>, what: &str) -> Result<TransactionReceipt> {
    let pending = call.send().await.wrap_err_with(|| format!("{} send failed", what))?;
    let receipt = pending
        .await
        .wrap_err_with(|| format!("{} confirmation failed", what))?
        .ok_or_else(|| eyre!("{} tx not mined", what))?;
    if receipt.status != Some(TX_SUCCESS_STATUS) {
        eyre::bail!("{} transaction reverted. Receipt: {:?}", what, receipt);
    }
    Ok(receipt)
}

#[instrument(skip_all, fields(salt = %config.salt))]
pub async fn run_poc(client: Arc<PocClient>, config: &Config) -> Result<PocReport> {
    let salt = config.salt;

    let any_code_factory = load_factory(config, "AnyCode", client.clone())?;
    let any_code_addr = deploy(&any_code_factory, vec![]).await.wrap_err("AnyCode deployment failed")?.address();
    let any_code = AnyCode::new(any_code_addr, client.clone());

    let simple_factory = load_factory(config, "Simple", client.clone())?;
    let simple_addr = deploy(&simple_factory, vec![]).await.wrap_err("Simple deployment failed")?.address();

    // predicted addresses (independent of the contracts to deploy)
    let from_final_code = any_code.get_addr_from_salt(salt, false).call().await?;
    let from_init_code = any_code.get_addr_from_salt(salt, true).call().await?;
    info!(%from_final_code, %from_init_code, "Predicted AnyCode addresses");

    // --- Final code path: no constructor support, initialize explicitly ---
    let simple_final_code = client.get_code(simple_addr, None).await.wrap_err("eth_getCode failed for Simple")?;
    confirm(any_code.deploy_from_final_code(simple_final_code, salt), "deployFromFinalCode").await?;

    let addr = any_code.last_address().call().await?;
    if addr != from_final_code {
        eyre::bail!("deployFromFinalCode landed at {:?}, predicted {:?}", addr, from_final_code);
    }
    let new_simple = Simple::new(addr, client.clone());
    info!("new_simple   deployed @ {:?}", new_simple.address());

    confirm(new_simple.set_value(U256::from(FINAL_CODE_VALUE)), "setValue").await?;
    let final_code_value = new_simple.value().call().await?;
    if final_code_value != U256::from(FINAL_CODE_VALUE) {
        eyre::bail!("Simple.value() returned {}, expected {}", final_code_value, FINAL_CODE_VALUE);
    }

    // --- Init code path: constructor runs inside AnyCode's delegatecall ---
    let simple_wc_factory = load_factory(config, "SimpleWithCons", client.clone())?;
    let wei_to_send = parse_ether(ETHER_TO_SEND)?;
    let icode = deploy_init_code(&simple_wc_factory, vec![ArgValue::from(INITIAL_VALUE), ArgValue::from(PREFIX)])
        .await
        .wrap_err("SimpleWithCons init code deployment failed")?;
    info!("simpleWC_icode stored  @ {:?}", icode.address());

    confirm(
        any_code.deploy_from_init_code(icode.address(), salt).value(wei_to_send),
        "deployFromInitCode",
    )
    .await?;

    let addr = any_code.last_address().call().await?;
    if addr != from_init_code {
        eyre::bail!("deployFromInitCode landed at {:?}, predicted {:?}", addr, from_init_code);
    }
    let new_simple_wc = SimpleWithCons::new(addr, client.clone());
    info!("new_simpleWC deployed @ {:?}", new_simple_wc.address());
    confirm(new_simple_wc.console_log(CONSOLE_MESSAGE.to_string()), "consoleLog").await?;

    let init_code_value = new_simple_wc.value().call().await?;
    if init_code_value != U256::from(INITIAL_VALUE) {
        eyre::bail!("SimpleWithCons.value() returned {}, expected {}", init_code_value, INITIAL_VALUE);
    }
    let init_code_balance = client.get_balance(addr, None).await?;
    if init_code_balance != wei_to_send {
        eyre::bail!(
            "SimpleWithCons balance is {} ETH, expected {} ETH",
            format_ether(init_code_balance),
            format_ether(wei_to_send)
        );
    }

    info!("✅ Both deployment paths verified.");
    Ok(PocReport {
        any_code: any_code_addr,
        init_code_holder: icode.address(),
        from_final_code,
        from_init_code,
        final_code_value,
        init_code_value,
        init_code_balance,
    })
}
// END OF FILE: deployer/src/poc.rs
