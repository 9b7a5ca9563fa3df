//! Data models.

pub mod config;
pub mod document;
pub mod extraction;
pub mod price;

pub use config::DocketConfig;
pub use document::{
    Document, DocumentBuilder, DocumentKind, DocumentSource, ImageDocument, ImportMethod,
    PdfDocument, QrCodeDocument,
};
pub use extraction::{Extraction, ExtractionBox, ExtractionResult};
pub use price::Price;
