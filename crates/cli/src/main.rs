//! CLI entry point for the `chord-node` binary.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::CliConfig;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = CliConfig::parse();
    let config = cli.resolve()?;
    setup_tracing(config.log_level.as_deref().unwrap_or("info"));

    if let Some(result) = cli.command.run(config).await? {
        println!("{}", serde_json::to_string_pretty(&result)?);
    }
    Ok(())
}

/// `RUST_LOG` wins over the configured level.
fn setup_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
