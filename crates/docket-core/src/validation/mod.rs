//! Document validation.
//!
//! Checks run in a fixed order: file size, then the per-kind checks
//! (image format, PDF page count, QR payload), then the caller's custom
//! rule. The first failing check decides the error.

use std::fmt;
use std::sync::Arc;

use image::ImageFormat;
use tracing::debug;

use crate::error::{CustomValidationError, PdfError, ValidationError};
use crate::models::config::ValidationConfig;
use crate::models::document::{Document, ImageDocument, PdfDocument, QrCodeDocument};
use crate::pdf;

/// Caller-supplied validation rule, run after the built-in checks.
pub type CustomValidation =
    Arc<dyn Fn(&Document) -> Result<(), CustomValidationError> + Send + Sync>;

/// Image formats accepted for analysis.
pub const SUPPORTED_IMAGE_FORMATS: [ImageFormat; 4] = [
    ImageFormat::Jpeg,
    ImageFormat::Png,
    ImageFormat::Gif,
    ImageFormat::Tiff,
];

/// A document paired with the outcome of its validation.
#[derive(Debug, Clone)]
pub struct ValidatedDocument {
    pub document: Document,
    pub error: Option<ValidationError>,
}

impl ValidatedDocument {
    pub fn is_valid(&self) -> bool {
        self.error.is_none()
    }
}

/// Validates documents against size, format and page limits.
#[derive(Clone)]
pub struct DocumentValidator {
    config: ValidationConfig,
    custom: Option<CustomValidation>,
}

impl fmt::Debug for DocumentValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentValidator")
            .field("config", &self.config)
            .field("custom", &self.custom.is_some())
            .finish()
    }
}

impl Default for DocumentValidator {
    fn default() -> Self {
        Self::new(ValidationConfig::default())
    }
}

impl DocumentValidator {
    pub fn new(config: ValidationConfig) -> Self {
        Self { config, custom: None }
    }

    /// Add a rule that runs after all built-in checks pass.
    pub fn with_custom_validation<F>(mut self, rule: F) -> Self
    where
        F: Fn(&Document) -> Result<(), CustomValidationError> + Send + Sync + 'static,
    {
        self.custom = Some(Arc::new(rule));
        self
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Validate a document.
    pub fn validate(&self, document: &Document) -> Result<(), ValidationError> {
        let result = self.run_checks(document);
        match &result {
            Ok(()) => debug!(id = %document.id(), kind = %document.kind(), "Document is valid"),
            Err(e) => debug!(id = %document.id(), kind = %document.kind(), "Document is invalid: {}", e),
        }
        result
    }

    /// Validate a document and keep the outcome alongside it.
    pub fn validate_document(&self, document: Document) -> ValidatedDocument {
        let error = self.validate(&document).err();
        ValidatedDocument { document, error }
    }

    fn run_checks(&self, document: &Document) -> Result<(), ValidationError> {
        self.check_size(document.data())?;

        match document {
            Document::Image(image) => self.check_image(image)?,
            Document::Pdf(pdf) => self.check_pdf(pdf)?,
            Document::QrCode(qr) => self.check_qr_code(qr)?,
        }

        if let Some(custom) = &self.custom {
            custom(document)?;
        }

        Ok(())
    }

    fn check_size(&self, data: &[u8]) -> Result<(), ValidationError> {
        if data.len() > self.config.max_file_size {
            return Err(ValidationError::ExceededMaxFileSize);
        }
        if data.is_empty() {
            return Err(ValidationError::FileFormatNotValid);
        }
        Ok(())
    }

    fn check_image(&self, image: &ImageDocument) -> Result<(), ValidationError> {
        match image.format() {
            None => Err(ValidationError::FileFormatNotValid),
            Some(format) if SUPPORTED_IMAGE_FORMATS.contains(&format) => Ok(()),
            Some(format) => {
                debug!("Unsupported image format: {:?}", format);
                Err(ValidationError::ImageFormatNotValid)
            }
        }
    }

    fn check_pdf(&self, document: &PdfDocument) -> Result<(), ValidationError> {
        if !pdf::is_pdf(document.data()) {
            return Err(ValidationError::FileFormatNotValid);
        }

        let pages = match pdf::count_pages(document.data()) {
            Ok(pages) => pages,
            Err(PdfError::NoPages) => 0,
            Err(e) => {
                debug!("Unreadable PDF: {}", e);
                return Err(ValidationError::FileFormatNotValid);
            }
        };

        if !(1..=self.config.max_pdf_pages).contains(&pages) {
            return Err(ValidationError::PdfPageLengthExceeded);
        }
        Ok(())
    }

    fn check_qr_code(&self, document: &QrCodeDocument) -> Result<(), ValidationError> {
        let Some(format) = document.format() else {
            return Err(ValidationError::QrCodeFormatNotValid);
        };

        if !document.parameters().contains_key(format.required_parameter()) {
            return Err(ValidationError::QrCodeFormatNotValid);
        }
        Ok(())
    }
}
