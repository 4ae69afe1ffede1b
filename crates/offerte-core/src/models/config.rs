//! Configuration structures for the quotation builder.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration for offerte.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OfferteConfig {
    /// HTTP server configuration.
    pub server: ServerConfig,

    /// Document store configuration.
    pub store: StoreConfig,

    /// Inline image configuration.
    pub media: MediaConfig,

    /// Export page geometry.
    pub export: ExportConfig,

    /// Boilerplate printed on the report.
    pub report: ReportConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to.
    pub host: String,

    /// Port to listen on.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

impl ServerConfig {
    /// Get the bind address.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Document store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// SQLite database file.
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("offerte.db"),
        }
    }
}

/// Inline image configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    /// Images whose payload exceeds this many bytes are dropped before a write.
    pub max_inline_image_bytes: usize,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            max_inline_image_bytes: 900 * 1024,
        }
    }
}

/// Export page geometry (A4 in logical units).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Page width in logical units.
    pub page_width: u32,

    /// Page height in logical units.
    pub page_height: u32,

    /// Raster scale factor for embedded images.
    pub raster_scale: f32,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            page_width: 595,
            page_height: 842,
            raster_scale: 0.75,
        }
    }
}

/// Boilerplate printed on the report.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Company name used on the cover and in the signature.
    pub company_name: String,

    /// Slogan on the cover banner.
    pub tagline: String,

    /// Headline on the cover banner.
    pub headline: String,

    /// Services listed on the cover banner.
    pub services: Vec<String>,

    /// Paragraphs of the closing terms page.
    pub terms: Vec<String>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            company_name: "Labelbewust".to_string(),
            tagline: "Een aannemer op wie je kunt bouwen".to_string(),
            headline: "De aannemer van groot Amsterdam".to_string(),
            services: vec![
                "Ruwbouw".to_string(),
                "Totaalrenovatie".to_string(),
                "Sloopwerk".to_string(),
                "Nieuwbouw".to_string(),
                "Staaframe bouw".to_string(),
                "Hallenbouw".to_string(),
            ],
            terms: vec![
                "Voorwaarden".to_string(),
                "Op deze aanbieding zijn de UAV 2012 van toepassing met onderstaande afwijkingen:"
                    .to_string(),
                "In het geval dat bepalingen in deze offerte strijdig zijn met bepalingen uit een \
                 eerder gesloten raamovereenkomst met dezelfde opdrachtgever, prevaleren de \
                 bepalingen uit de raamovereenkomst."
                    .to_string(),
            ],
        }
    }
}

impl OfferteConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }
}
