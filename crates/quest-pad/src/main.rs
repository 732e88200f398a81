mod app;
mod cli;

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use quest_pad_config::AppConfig;
use quest_pad_core::SystemClock;

use crate::app::App;
use crate::cli::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(AppConfig::config_path);
    let config = AppConfig::load_or_create(&config_path);

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .or_else(|_| tracing_subscriber::EnvFilter::try_new(&config.log_filter))
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("Using config {}", config_path.display());

    let data_dir = cli
        .data_dir
        .clone()
        .unwrap_or_else(|| config.resolve_data_dir());
    let app = App::open(config, &data_dir, Arc::new(SystemClock))?;

    let mut stdout = std::io::stdout().lock();
    app.run(cli.command, &mut stdout)
}
