// deployer/src/config.rs

use dotenv::dotenv;
use ethers::types::U256;
use eyre::{Result, WrapErr};
use std::env;
use tracing::info;

// anvil / hardhat account #0
const DEFAULT_PRIVATE_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
const DEFAULT_HTTP_RPC_URL: &str = "http://127.0.0.1:8545";

#[derive(Debug, Clone)]
pub struct Config {
    // Network & Keys
    pub http_rpc_url: String,
    pub private_key: String,
    pub chain_id: Option<u64>,

    // Contracts
    pub artifacts_dir: String,
    pub salt: U256,

    // Provider behaviour
    pub poll_interval_ms: u64,
    pub confirmations: usize,
}

pub fn load_config() -> Result<Config> {
    dotenv().ok();

    let string_env = |var_name: &str, default: &str| -> String {
        env::var(var_name).ok().filter(|s| !s.is_empty()).unwrap_or_else(|| default.to_string())
    };
    let parse_u64_env = |var_name: &str, default: u64| -> Result<u64> {
        match env::var(var_name) {
            Ok(val_str) if !val_str.is_empty() => val_str
                .parse::<u64>()
                .wrap_err_with(|| format!("{} must be an unsigned integer", var_name)),
            _ => Ok(default),
        }
    };
    let parse_optional_u64 = |var_name: &str| -> Result<Option<u64>> {
        match env::var(var_name) {
            Ok(val_str) if !val_str.is_empty() => Ok(Some(val_str.parse::<u64>()?)),
            _ => Ok(None),
        }
    };

    // --- Load vars ---
    let http_rpc_url = string_env("HTTP_RPC_URL", DEFAULT_HTTP_RPC_URL);
    let private_key = string_env("PRIVATE_KEY", DEFAULT_PRIVATE_KEY);
    let chain_id = parse_optional_u64("CHAIN_ID")?;
    let artifacts_dir = string_env("ARTIFACTS_DIR", "./artifacts");
    let salt = match env::var("SALT") {
        Ok(s) if !s.is_empty() => U256::from_dec_str(&s).wrap_err("SALT must be a decimal uint256")?,
        _ => U256::zero(),
    };
    let poll_interval_ms = parse_u64_env("POLL_INTERVAL_MS", 10)?;
    let confirmations = parse_u64_env("CONFIRMATIONS", 1)? as usize;

    let config = Config {
        http_rpc_url,
        private_key,
        chain_id,
        artifacts_dir,
        salt,
        poll_interval_ms,
        confirmations,
    };

    info!(rpc = %config.http_rpc_url, artifacts = %config.artifacts_dir, salt = %config.salt, "✅ Configuration loaded");
    Ok(config)
}
// END OF FILE: deployer/src/config.rs
