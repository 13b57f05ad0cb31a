//! Application configuration
//!
//! Loads deployment settings from the embedded config.toml: where rater
//! data lives on disk and how submissions are exported.

use std::path::PathBuf;

use serde::Deserialize;

/// Application configuration
#[derive(Debug, Default, Deserialize)]
pub(crate) struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct StorageConfig {
    /// Root directory for arc files, credentials, and submission logs
    /// (None = platform data dir)
    pub data_root: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ExportConfig {
    /// Render each submission to a PDF alongside the CSV record
    #[serde(default = "default_pdf")]
    pub pdf: bool,
    /// Directory containing the TTF files used for PDF output
    /// (None = try common system locations)
    pub font_dir: Option<PathBuf>,
    /// Mounted drive folder that finished submissions are copied into
    /// (None = mirroring disabled)
    pub mirror_dir: Option<PathBuf>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        ExportConfig {
            pdf: default_pdf(),
            font_dir: None,
            mirror_dir: None,
        }
    }
}

fn default_pdf() -> bool {
    true
}

/// Load configuration from embedded config.toml
pub(crate) fn load_config() -> Result<Config, toml::de::Error> {
    const CONFIG_TOML: &str = include_str!("../config.toml");
    toml::from_str(CONFIG_TOML)
}
