// deployer/src/main.rs

use eyre::Result;
use initcode_deployer::{
    config::load_config,
    poc::{connect, run_poc},
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = run().await {
        error!("❌ Init code PoC failed: {:?}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let config = load_config()?;
    let client = connect(&config).await?;

    let report = run_poc(client, &config).await?;

    info!("--- PoC Summary ---");
    info!("AnyCode                 @ {:?}", report.any_code);
    info!("SimpleWithCons initcode @ {:?}", report.init_code_holder);
    info!("From final code         @ {:?} (value = {})", report.from_final_code, report.final_code_value);
    info!(
        "From init code          @ {:?} (value = {}, balance = {} wei)",
        report.from_init_code, report.init_code_value, report.init_code_balance
    );
    Ok(())
}
// END OF FILE: deployer/src/main.rs
