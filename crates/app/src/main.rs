//! City Portal session client - Main Entry Point
//!
//! Loads configuration, wires the session context over the reqwest client
//! and a per-origin session file, then runs one subcommand.

mod cli;
mod commands;

use std::sync::Arc;

use anyhow::{Context, Result};
use cityportal_application::SessionContext;
use cityportal_infrastructure::{
    ClientConfig, FileKeyValueStore, ReqwestHttpClient, init_tracing,
};
use clap::Parser;
use tracing::debug;

use crate::cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = ClientConfig::load(cli.config.as_deref()).context("loading configuration")?;
    let context = connect(&config).await?;

    let mut stdout = std::io::stdout().lock();
    commands::run(&context, cli.command, &mut stdout).await
}

async fn connect(config: &ClientConfig) -> Result<SessionContext> {
    let scope = config.scope()?;
    let client = ReqwestHttpClient::from_config(config).context("creating HTTP client")?;
    let storage = FileKeyValueStore::for_origin(&config.storage_dir(), &scope.origin());
    debug!(origin = %scope.origin(), file = %storage.path().display(), "using session file");

    Ok(SessionContext::start(scope, Arc::new(client), Arc::new(storage)).await)
}
