//! relayhook: console input agent for a relay.
//!
//! Connects to the relay, forwards what the user types and prints what the
//! relay delivers. Ctrl+C closes the connection and exits.

mod agent;
mod cli;
mod console;

use crate::cli::Cli;
use crate::console::TerminalConsole;
use anyhow::Context;
use clap::Parser;
use relayhook_runtime::config::load_config;
use relayhook_runtime::{ConnectionLoop, HookDispatcher, Producer};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

fn init_tracing_stderr(default_level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .or_else(|_| tracing_subscriber::EnvFilter::try_new(default_level))
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // The log level comes from the config file, so loading it is reported
    // through a warn-only subscriber.
    let startup = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(tracing::Level::WARN)
        .finish();
    let mut config = tracing::subscriber::with_default(startup, || load_config(cli.config.as_deref()));
    cli.apply(&mut config);
    init_tracing_stderr(&config.log_level);

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to create Tokio runtime")?;

    let result = rt.block_on(async {
        let registry = agent::build_registry(&config)?;
        let dispatcher = HookDispatcher::new(config.name.clone(), Arc::new(registry));
        let producer = Producer::console(TerminalConsole::stdio());

        let conn = ConnectionLoop::connect(&config, dispatcher, producer)
            .await
            .with_context(|| format!("Could not connect to relay at {}", config.relay_addr()))?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    let _ = shutdown_tx.send(true);
                }
                Err(e) => warn!(error = %e, "Failed to listen for Ctrl+C"),
            }
            // Keep the sender alive so the loop never mistakes a dropped
            // signal source for shutdown.
            std::future::pending::<()>().await;
        });

        let summary = conn.run(shutdown_rx).await?;
        info!(
            inbound = summary.inbound,
            outbound = summary.outbound,
            failures = summary.handler_failures,
            "Disconnected"
        );
        anyhow::Ok(())
    });

    // Stdin reads run on a blocking thread that would otherwise hold the
    // runtime open until the next line is typed.
    rt.shutdown_background();
    result
}
