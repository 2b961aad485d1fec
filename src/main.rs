//! Campus Concierge CLI entry point.

use anyhow::Result;
use clap::Parser;
use concierge::cli::{commands, Cli, Commands};
use concierge::config::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("concierge={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Load configuration
    let settings = match &cli.config {
        Some(path) => Settings::load_from(Some(&Settings::expand_path(path)))?,
        None => Settings::load()?,
    };

    std::fs::create_dir_all(settings.data_dir())?;

    match &cli.command {
        Commands::Serve { host, port } => {
            commands::run_serve(host.clone(), *port, settings).await?;
        }

        Commands::Ask { query, model } => {
            commands::run_ask(query, model.clone(), settings).await?;
        }

        Commands::Seed => {
            commands::run_seed(settings)?;
        }

        Commands::List { table } => {
            commands::run_list(*table, settings).await?;
        }

        Commands::Config { action } => {
            commands::run_config(action, cli.config.as_deref(), settings)?;
        }
    }

    Ok(())
}
