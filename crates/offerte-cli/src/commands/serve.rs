//! Serve command - run the HTTP server.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use console::style;
use tracing::info;

use offerte_core::{InvoiceService, InvoiceStore, MemoryStore, ReportRenderer, SqliteStore};

use super::load_config;
use crate::server::{create_router, AppState};

/// Arguments for the serve command.
#[derive(Args)]
pub struct ServeArgs {
    /// Host to bind to (default from config)
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (default from config)
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,

    /// SQLite database file (default from config)
    #[arg(long)]
    db: Option<PathBuf>,

    /// Keep invoices in memory only
    #[arg(long, conflicts_with = "db")]
    in_memory: bool,
}

pub async fn run(args: ServeArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let mut config = load_config(config_path)?;

    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    let store: Arc<dyn InvoiceStore> = if args.in_memory {
        info!("Using in-memory invoice store");
        Arc::new(MemoryStore::new())
    } else {
        let path = args.db.unwrap_or_else(|| config.store.path.clone());
        Arc::new(SqliteStore::open(&path)?)
    };

    let service = InvoiceService::new(store, &config.media);
    let renderer = ReportRenderer::new(config.report.clone(), config.export.clone())?;
    let app = create_router(Arc::new(AppState::new(service, renderer)));

    let bind_addr = config.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    println!(
        "{} Listening on http://{}",
        style("✓").green(),
        listener.local_addr()?
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Received Ctrl+C, shutting down");
}
