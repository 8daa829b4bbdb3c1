//! gh-projects-mcp entry point.
//!
//! This binary is the composition root for the entire system. Responsibilities:
//!
//! 1. **Parse configuration**: flags with environment fallbacks, validated
//!    into a [`config::Config`].
//! 2. **Wire observability**: `tracing-subscriber` writing to stderr, plus an
//!    OpenTelemetry OTLP exporter when an endpoint is configured.
//! 3. **Construct infrastructure**: one [`github::GithubClient`] shared by all
//!    services.
//! 4. **Serve**: run the MCP tool server over stdio until the host hangs up.

mod config;
mod observability;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use github::GithubClient;
use server::ProjectsServer;
use tracing::{error, info};

use crate::config::{Cli, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::try_from(Cli::parse())?;
    let telemetry = observability::init(&config.observability)?;

    let result = run(config).await;
    if let Err(error) = &result {
        error!(error = %error, "server stopped");
    }
    telemetry.shutdown();
    result
}

async fn run(config: Config) -> anyhow::Result<()> {
    let client = GithubClient::new(&config.github).context("failed to build GitHub client")?;
    let client = Arc::new(client);
    info!(
        version = env!("CARGO_PKG_VERSION"),
        api_url = %config.github.api_url,
        "starting gh-projects-mcp"
    );

    let tools = ProjectsServer::new(client.clone(), client);
    server::run_stdio(tools).await
}
