// src/main.rs

//! The main entry point for the Switchyard worker.
//!
//! The worker speaks newline-delimited JSON with its host on stdin/stdout, so
//! all logging goes to stderr.

use anyhow::Result;
use std::env;
use std::path::Path;
use switchyard::config::Config;
use switchyard::core::metrics;
use switchyard::demo::DemoApp;
use switchyard::server;
use tracing::{debug, error, info};
use tracing_subscriber::{filter::EnvFilter, prelude::*};

const DEFAULT_CONFIG_PATH: &str = "switchyard.toml";

#[tokio::main]
async fn main() -> Result<()> {
    const VERSION: &str = env!("CARGO_PKG_VERSION");

    let args: Vec<String> = env::args().collect();

    if args.contains(&"--version".to_string()) {
        println!("Switchyard version {VERSION}");
        return Ok(());
    }

    // An explicit --config must exist; the default path is optional.
    let explicit_path = args
        .iter()
        .position(|arg| arg == "--config")
        .map(|i| args.get(i + 1));
    let config = match explicit_path {
        Some(Some(path)) => load_or_exit(path),
        Some(None) => {
            eprintln!("--config flag requires a value");
            std::process::exit(1);
        }
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => load_or_exit(DEFAULT_CONFIG_PATH),
        None => Config::default(),
    };

    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| config.log_level.clone());
    tracing_subscriber::registry()
        .with(EnvFilter::new(log_level))
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_ansi(false)
                .with_writer(std::io::stderr),
        )
        .init();

    info!("Starting Switchyard {VERSION}");

    if let Err(e) = server::run(config, DemoApp).await {
        error!("Worker runtime error: {}", e);
        return Err(e);
    }

    debug!("Final metrics:\n{}", metrics::gather_metrics());
    Ok(())
}

fn load_or_exit(path: &str) -> Config {
    match Config::from_file(path) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Failed to load configuration from \"{path}\": {e:#}");
            std::process::exit(1);
        }
    }
}
