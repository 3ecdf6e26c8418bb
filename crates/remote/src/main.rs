// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! objsync-remote: WebSocket remote store for objsync clients.

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use objsync_remote::{server, ServerState};

/// objsync-remote: reference remote store
#[derive(Parser, Debug)]
#[command(name = "objsync-remote")]
#[command(about = "WebSocket remote store for objsync clients")]
struct Args {
    /// Address to bind the server to
    #[arg(short, long, default_value = "0.0.0.0:7890")]
    bind: SocketAddr,

    /// Directory for the object log
    #[arg(short, long, default_value = ".")]
    data: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Args::parse();

    // RUST_LOG wins over --verbose
    let default = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    info!("Starting objsync-remote server");
    info!("  Bind address: {}", args.bind);
    info!("  Data directory: {}", args.data.display());

    let state = ServerState::new(&args.data)?;

    server::run(args.bind, state).await?;

    Ok(())
}
