//! Subcommands and the helpers they share.

pub mod calc;
pub mod config;
pub mod invoice;
pub mod serve;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use offerte_core::models::config::OfferteConfig;
use offerte_core::{InvoiceService, InvoiceStore, SqliteStore};
use tracing::debug;

/// Default config file location: `<config dir>/offerte/config.json`.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("offerte")
        .join("config.json")
}

/// The config file in effect: `--config` if given, else the default location.
pub fn config_file(config_path: Option<&str>) -> PathBuf {
    config_path.map_or_else(default_config_path, PathBuf::from)
}

/// Load the configuration, falling back to defaults when no file exists.
///
/// An explicit `--config` path must exist.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<OfferteConfig> {
    let path = config_file(config_path);

    if path.exists() {
        debug!("Loading config from {}", path.display());
        Ok(OfferteConfig::from_file(&path)?)
    } else if config_path.is_some() {
        anyhow::bail!("Config file not found: {}", path.display());
    } else {
        Ok(OfferteConfig::default())
    }
}

/// Open the SQLite store and wrap it in a service.
pub fn open_service(config: &OfferteConfig, db: Option<&Path>) -> anyhow::Result<InvoiceService> {
    let path = db.unwrap_or(&config.store.path);
    let store: Arc<dyn InvoiceStore> = Arc::new(SqliteStore::open(path)?);
    Ok(InvoiceService::new(store, &config.media))
}
