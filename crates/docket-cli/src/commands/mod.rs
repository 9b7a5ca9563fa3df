//! Subcommands of the `docket` binary.

pub mod config;
pub mod invoice;
pub mod pages;
pub mod prefs;
pub mod qr;
pub mod validate;

use std::path::{Path, PathBuf};

use tracing::debug;

use docket_core::models::config::DocketConfig;

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

/// Directory holding the configuration and the preference flags.
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("docket")
}

pub fn default_config_path() -> PathBuf {
    config_dir().join("config.json")
}

/// Load the configuration from `--config`, the default location, or defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<DocketConfig> {
    if let Some(path) = config_path {
        debug!("Loading configuration from {}", path);
        return Ok(DocketConfig::from_file(Path::new(path))?);
    }

    let default_path = default_config_path();
    if default_path.exists() {
        debug!("Loading configuration from {}", default_path.display());
        Ok(DocketConfig::from_file(&default_path)?)
    } else {
        Ok(DocketConfig::default())
    }
}
