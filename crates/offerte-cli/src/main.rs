//! `offerte` binary: quotation store, totals calculator, report export and
//! the JSON API server.

mod commands;
mod server;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::EnvFilter;

use commands::{calc, config, invoice, serve};

/// Offerte - build quotations with VAT totals and printable reports
#[derive(Parser)]
#[command(name = "offerte")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log more (-v info, -vv debug, -vvv trace); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Config file (defaults to offerte/config.json in the user config dir)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the JSON API for editors and report export
    Serve(serve::ServeArgs),

    /// Create, list, edit, export and delete stored quotations
    Invoice(invoice::InvoiceArgs),

    /// Calculate totals for a draft or item list
    Calc(calc::CalcArgs),

    /// Show or change server, store, image and report settings
    Config(config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over -v
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Serve(args) => serve::run(args, config_path).await,
        Commands::Invoice(args) => invoice::run(args, config_path).await,
        Commands::Calc(args) => calc::run(args).await,
        Commands::Config(args) => config::run(args, config_path).await,
    }
}
