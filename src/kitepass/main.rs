mod client;
mod config;
mod error;
mod flow;
#[path = "../shared/logging.rs"]
mod logging;

use anyhow::Result;
use client::KiteClient;
use config::Config;
use tracing::info;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Hydrate the environment from .env before reading configuration
    config::load_dotenv()?;
    let config = Config::from_env()?;

    // Initialize CLI logging
    let _ = logging::init_cli_logging(env!("CARGO_CRATE_NAME"), config.verbose);
    info!(
        api_key = %config.masked_api_key(),
        api_base = %config.api_base,
        agent = %config.agent_name,
        "initializing KitePass client"
    );

    // Initialize the KitePass client
    let client = KiteClient::new(&config)?;

    // Run the demo flow against stdout
    let mut stdout = std::io::stdout().lock();
    let outcome = flow::run(&config, &client, &mut stdout).await?;
    info!(?outcome, "done");
    Ok(())
}
