// Entrypoint for the CLI application.
// - Builds the configuration once, creates the API client from it and
//   hands the client to the UI loop.

use anyhow::Context;
use clap::Parser;
use pixelstrip_cli::{api::ApiClient, config::Config, logging, ui::main_menu};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "pixelstrip", version, about = "Remove, enhance and recolor image backgrounds")]
struct Cli {
    /// JSON config file (defaults to the user config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Backend origin, overrides config and environment
    #[arg(long)]
    base_url: Option<String>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose)?;

    let mut config = match &cli.config {
        Some(path) => {
            let mut config = Config::load(path)?;
            config.apply_env(|key| std::env::var(key).ok())?;
            config
        }
        None => Config::discover()?,
    };
    if let Some(url) = cli.base_url {
        config.base_url = url;
    }
    config.validate()?;

    let api = ApiClient::new(config).context("Failed to build HTTP client")?;
    main_menu(api).await?;
    Ok(())
}
