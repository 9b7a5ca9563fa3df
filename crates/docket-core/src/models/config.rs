//! Configuration structures for the capture pipeline.
//!
//! The configuration is a plain value: components receive the section they
//! need at construction time instead of reading shared state.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration for docket.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocketConfig {
    /// Document validation limits.
    pub validation: ValidationConfig,

    /// Multi-page review configuration.
    pub pages: PagesConfig,

    /// Preview rendering configuration.
    pub preview: PreviewConfig,

    /// QR code handling configuration.
    pub qr: QrConfig,

    /// Digital invoice configuration.
    pub invoice: InvoiceConfig,

    /// Persisted flags configuration.
    pub preferences: PreferencesConfig,
}

/// Document validation limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Maximum accepted file size in bytes.
    pub max_file_size: usize,

    /// Maximum number of pages in an imported PDF.
    pub max_pdf_pages: u32,
}

impl ValidationConfig {
    /// 10 MiB.
    pub const DEFAULT_MAX_FILE_SIZE: usize = 10 * 1024 * 1024;
    pub const DEFAULT_MAX_PDF_PAGES: u32 = 10;
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_file_size: Self::DEFAULT_MAX_FILE_SIZE,
            max_pdf_pages: Self::DEFAULT_MAX_PDF_PAGES,
        }
    }
}

/// Multi-page review configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PagesConfig {
    /// Maximum number of pages in one capture session.
    pub max_pages: usize,

    /// Allow capturing more than one page.
    pub multipage_enabled: bool,
}

impl Default for PagesConfig {
    fn default() -> Self {
        Self {
            max_pages: 10,
            multipage_enabled: true,
        }
    }
}

/// Preview rendering configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    /// Longer side of generated previews, in pixels.
    pub max_dimension: u32,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self { max_dimension: 1280 }
    }
}

/// QR code handling configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QrConfig {
    /// Detect payment QR codes in captured images.
    pub detection_enabled: bool,

    /// Currency assumed when a bezahlcode omits one.
    pub default_currency: String,
}

impl Default for QrConfig {
    fn default() -> Self {
        Self {
            detection_enabled: true,
            default_currency: "EUR".to_string(),
        }
    }
}

/// Digital invoice configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InvoiceConfig {
    /// Offer line-item review when the extraction result has line items.
    pub enabled: bool,
}

impl Default for InvoiceConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Persisted flags configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreferencesConfig {
    /// File holding the one-time flags.
    pub path: PathBuf,
}

impl Default for PreferencesConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("preferences.json"),
        }
    }
}

impl DocketConfig {
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
