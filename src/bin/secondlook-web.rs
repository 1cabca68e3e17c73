// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! SecondLook API server
//!
//! Standalone server for the mobile web client.

use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn};

use secondlook::config::AppConfig;
use secondlook::openai::OpenAiClient;
use secondlook::Result;

#[derive(Parser, Debug)]
#[command(name = "secondlook-web")]
#[command(author = "Jonathan D. A. Jewell <hyperpolymath>")]
#[command(version = "1.0.0")]
#[command(about = "SecondLook API Server")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Host to bind to
    #[arg(short = 'H', long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Model to use instead of the configured one
    #[arg(short, long)]
    model: Option<String>,

    /// Skip the model API check on startup
    #[arg(long)]
    skip_health_check: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let filter = if args.verbose { "debug,tower_http=debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    info!("SecondLook API Server v1.0.0");

    // Load config
    let mut config = AppConfig::load(&args.config)?;

    // Apply CLI overrides
    if let Some(host) = args.host {
        config.web.host = host;
    }
    if let Some(port) = args.port {
        config.web.port = port;
    }
    if let Some(model) = args.model {
        config.ai_engine.model = model;
    }

    info!("Model: {} via {}", config.ai_engine.model, config.ai_engine.url);
    match config.api_key() {
        None => warn!("Set {} to enable analysis", config.ai_engine.api_key_env),
        Some(_) if args.skip_health_check => warn!("Skipping model API health check"),
        Some(api_key) => {
            let client = OpenAiClient::new(&config.ai_engine, api_key)?;
            match client.health_check().await {
                Ok(()) => info!("Model API reachable"),
                Err(e) => warn!("Model API check failed: {}. Requests may answer 502", e),
            }
        }
    }

    secondlook::web::start_server(config).await
}
