//! Volley CLI.
//!
//! # Commands
//! ```text
//! volley serve   --config <volley.yaml> [--bind <addr>]
//! volley run     --config <volley.yaml> --id <n> [--region <code>] [--target <n>] [--concurrency <n>] [--json]
//! volley regions
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use volley_core::RegionClass;
use volley_observability::{init_tracing, LogConfig};

mod cmd_run;
mod config;

use config::VolleyConfig;

#[derive(Parser)]
#[command(
    name = "volley",
    about = "Bulk request dispatch with rotating credentials",
    long_about = "
Volley fans one request out to an upstream endpoint until a target number of
successes is reached, rotating through a pool of bearer credentials.

ENVIRONMENT VARIABLES:
  VOLLEY_CONFIG   Path to the YAML config file
  VOLLEY_BIND     Listen address for `serve` (overrides the config file)
  RUST_LOG        Log filter (overrides the config file)
",
    version
)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve GET /dispatch over HTTP
    Serve {
        /// Path to the YAML config file
        #[arg(short, long, env = "VOLLEY_CONFIG")]
        config: PathBuf,
        /// Listen address, e.g. 0.0.0.0:9000
        #[arg(long, env = "VOLLEY_BIND")]
        bind: Option<String>,
    },

    /// Run a single batch and print the report
    Run {
        /// Path to the YAML config file
        #[arg(short, long, env = "VOLLEY_CONFIG")]
        config: PathBuf,
        /// Target identifier
        #[arg(long)]
        id: u64,
        /// Region code (default from config)
        #[arg(long)]
        region: Option<String>,
        /// Successes to reach (default from config)
        #[arg(long)]
        target: Option<u64>,
        /// Concurrent workers (default from config)
        #[arg(long)]
        concurrency: Option<u64>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List region codes and the route each one uses
    Regions,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { config, bind } => {
            let config = VolleyConfig::load(&config)?;
            setup_logging(config.logging.clone(), cli.verbose)?;
            let bind = bind.unwrap_or_else(|| config.bind.clone());
            let coordinator = Arc::new(config.build_coordinator()?);

            volley_http::serve(&bind, coordinator, shutdown_signal())
                .await
                .context("server failed")
        }

        Commands::Run {
            config,
            id,
            region,
            target,
            concurrency,
            json,
        } => {
            let config = VolleyConfig::load(&config)?;
            setup_logging(config.logging.clone(), cli.verbose)?;
            let coordinator = config.build_coordinator()?;
            let args = cmd_run::RunArgs {
                id,
                region,
                target,
                concurrency,
                json,
            };
            cmd_run::run(&coordinator, args).await
        }

        Commands::Regions => {
            cmd_regions();
            Ok(())
        }
    }
}

fn setup_logging(logging: LogConfig, verbose: bool) -> Result<()> {
    let logging = if verbose {
        logging.with_level("debug")
    } else {
        logging
    };
    init_tracing(&logging).context("failed to install tracing subscriber")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

fn cmd_regions() {
    println!("{:<10} {}", "ROUTE", "REGION CODES");
    for class in RegionClass::ALL {
        let codes = match class {
            RegionClass::Global => "any other code".to_string(),
            _ => class.codes().join(", "),
        };
        println!("{:<10} {}", class.to_string(), codes);
    }
}
