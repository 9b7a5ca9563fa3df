//! Core library for document capture.
//!
//! This crate provides:
//! - Document model for photographed images, imported PDFs and payment QR codes
//! - Document validation (file size, image format, PDF page count, QR payload)
//! - Cancellable background validation
//! - Provenance comments in exported JPEG pages
//! - Multi-page review collection (append, delete, reorder, rotate)
//! - Digital invoice line-item review with price arithmetic
//! - Payment QR code parsing (Bezahlcode, EPC069-12, EPS) and detection
//! - Persisted one-time UI flags

pub mod error;
pub mod invoice;
pub mod metadata;
pub mod models;
pub mod pages;
pub mod pdf;
pub mod preferences;
pub mod qr;
pub mod task;
pub mod validation;

pub use error::{
    CameraError, CustomValidationError, DocketError, FilePickerError, InvoiceError, MetadataError,
    PageError, PriceError, Result, UserMessage, ValidationError,
};
pub use invoice::{Addon, AddonKind, DigitalInvoice, LineItem, ReturnReason, SelectedState};
pub use metadata::UserComment;
pub use models::{
    DocketConfig, Document, DocumentBuilder, DocumentKind, DocumentSource, Extraction,
    ExtractionBox, ExtractionResult, ImportMethod, Price,
};
pub use pages::{ensure_single_kind, Page, PageCollection, PageEvent, PageObserver};
pub use pdf::{PdfExtractor, PdfProcessor};
pub use preferences::{FilePreferences, MemoryPreferences, PreferenceFlag, PreferenceStore};
pub use qr::{detect_qr_codes, parse_payment_code, PaymentCode, QrCodeFormat, QrDetector};
pub use task::{spawn_validation, validate_all, CancellationToken, ValidationTask};
pub use validation::{DocumentValidator, ValidatedDocument};
