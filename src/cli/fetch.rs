//! Fetch command - resolves one request and prints the payload

use anyhow::Context;
use clap::Args;
use tracing::debug;

use crate::config::AppConfig;
use crate::domain::{FetchRequest, Provider};
use crate::infrastructure::logging::init_logging;

#[derive(Args, Debug)]
pub struct FetchArgs {
    /// Provider name (weather, geolocation)
    pub provider: Provider,

    /// Request parameter as key=value, repeatable
    #[arg(short, long = "param", value_parser = parse_param)]
    pub params: Vec<(String, String)>,
}

/// Run a single fetch
pub async fn run(args: FetchArgs) -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;
    init_logging(&config.logging).context("Failed to initialize logging")?;

    let fetcher = crate::create_fetcher(&config)?;
    let request = FetchRequest::with_parameters(args.provider, args.params);
    debug!(provider = %request.provider(), "Running one-off fetch");

    let payload = fetcher.fetch(&request).await?;
    println!("{}", serde_json::to_string_pretty(&payload)?);

    Ok(())
}

fn parse_param(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{}'", raw))
}
