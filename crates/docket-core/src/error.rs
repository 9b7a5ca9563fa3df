//! Error types for the docket-core library.

use thiserror::Error;

/// Main error type for the docket library.
#[derive(Error, Debug)]
pub enum DocketError {
    /// Camera capture error.
    #[error("camera error: {0}")]
    Camera(#[from] CameraError),

    /// File import error.
    #[error("file picker error: {0}")]
    FilePicker(#[from] FilePickerError),

    /// Document validation error.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// Price parsing or arithmetic error.
    #[error("price error: {0}")]
    Price(#[from] PriceError),

    /// Digital invoice error.
    #[error("invoice error: {0}")]
    Invoice(#[from] InvoiceError),

    /// Page collection error.
    #[error("page error: {0}")]
    Page(#[from] PageError),

    /// Persisted flag storage error.
    #[error("preferences error: {0}")]
    Preferences(#[from] PreferencesError),

    /// Image metadata error.
    #[error("metadata error: {0}")]
    Metadata(#[from] MetadataError),

    /// Image processing error.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that carry a message meant for the person holding the device.
pub trait UserMessage {
    /// Human-readable explanation of the error.
    fn user_message(&self) -> String;
}

/// Errors raised while capturing with the camera.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraError {
    /// Unknown error during camera use.
    #[error("unknown camera error")]
    Unknown,

    /// Access to the camera was denied by the user.
    #[error("not authorized to use the camera")]
    NotAuthorizedToUseDevice,

    /// No valid input device could be found for capturing.
    #[error("no input device available")]
    NoInputDevice,

    /// Capturing could not be completed.
    #[error("capture failed")]
    CaptureFailed,
}

impl UserMessage for CameraError {
    fn user_message(&self) -> String {
        match self {
            CameraError::CaptureFailed => "The picture could not be taken. Please try again.",
            CameraError::NoInputDevice | CameraError::NotAuthorizedToUseDevice => {
                "Access to the camera is needed to photograph documents. Please allow it in the settings."
            }
            CameraError::Unknown => "An unknown error occurred while using the camera.",
        }
        .to_string()
    }
}

/// Errors raised while importing files.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilePickerError {
    /// The photo library cannot be read because access was denied.
    #[error("photo library access denied")]
    PhotoLibraryAccessDenied,

    /// More files were picked than the session accepts.
    #[error("maximum number of picked files exceeded")]
    MaxFilesPickedCountExceeded,

    /// Images and PDFs were picked together.
    #[error("mixed document types are not supported")]
    MixedDocumentsUnsupported,

    /// The picked file could not be opened.
    #[error("failed to open document")]
    FailedToOpenDocument,
}

impl UserMessage for FilePickerError {
    fn user_message(&self) -> String {
        match self {
            FilePickerError::PhotoLibraryAccessDenied => {
                "Access to the photo library is needed to import images. Please allow it in the settings."
            }
            FilePickerError::MaxFilesPickedCountExceeded => {
                "Too many pages. Please reduce the number of pages."
            }
            FilePickerError::MixedDocumentsUnsupported => {
                "PDFs and images cannot be imported together. Please choose one type."
            }
            FilePickerError::FailedToOpenDocument => "The document could not be opened.",
        }
        .to_string()
    }
}

/// Error returned by a caller-supplied validation rule.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct CustomValidationError {
    /// Free-text message shown to the user.
    pub message: String,
}

impl CustomValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Errors raised while validating a document (image, PDF or QR code).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Unknown error during validation.
    #[error("unknown validation error")]
    Unknown,

    /// The file is larger than the configured ceiling.
    #[error("exceeded max file size")]
    ExceededMaxFileSize,

    /// The file is an image, but not JPEG, PNG, GIF or TIFF.
    #[error("image format not valid")]
    ImageFormatNotValid,

    /// The file is neither a supported image nor a PDF.
    #[error("file format not valid")]
    FileFormatNotValid,

    /// The PDF has no pages or more pages than allowed.
    #[error("pdf page length exceeded")]
    PdfPageLengthExceeded,

    /// The QR code payload is not a supported payment format.
    #[error("QR code format not valid")]
    QrCodeFormatNotValid,

    /// A caller-supplied rule rejected the document.
    #[error("custom validation failed: {0}")]
    Custom(#[from] CustomValidationError),
}

impl UserMessage for ValidationError {
    fn user_message(&self) -> String {
        match self {
            ValidationError::ExceededMaxFileSize => {
                "The file is too large. Please choose a file smaller than 10MB.".to_string()
            }
            ValidationError::ImageFormatNotValid
            | ValidationError::FileFormatNotValid
            | ValidationError::QrCodeFormatNotValid => {
                "The format is not supported. Please choose a JPEG, PNG, GIF, TIFF or PDF file."
                    .to_string()
            }
            ValidationError::PdfPageLengthExceeded => {
                "Too many pages. Please reduce the number of pages.".to_string()
            }
            ValidationError::Unknown => "The document could not be validated.".to_string(),
            ValidationError::Custom(err) => err.message.clone(),
        }
    }
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract images from PDF.
    #[error("failed to extract images: {0}")]
    ImageExtraction(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// Invalid page number requested.
    #[error("invalid page number: {0}")]
    InvalidPage(u32),
}

/// Errors related to prices.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The string is not of the form `<decimal>:<currency>`.
    #[error("cannot parse price: {0:?}")]
    Parse(String),

    /// Two prices with different currencies were combined.
    #[error("currency mismatch: {left} vs {right}")]
    CurrencyMismatch { left: String, right: String },

    /// The result does not fit into a decimal.
    #[error("price arithmetic overflowed")]
    Overflow,
}

/// Errors related to the digital invoice model.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvoiceError {
    /// The extraction result carries no line items.
    #[error("a digital invoice needs at least one line item")]
    NoLineItems,

    /// A line item group has no description.
    #[error("line item name missing")]
    NameMissing,

    /// A line item group has no quantity.
    #[error("line item quantity missing")]
    QuantityMissing,

    /// A line item group has no gross price.
    #[error("line item price missing")]
    PriceMissing,

    /// The quantity is not a non-negative integer.
    #[error("cannot parse quantity: {0:?}")]
    CannotParseQuantity(String),

    /// The price is not a valid price string.
    #[error("cannot parse price: {0:?}")]
    CannotParsePrice(String),

    /// Price arithmetic failed.
    #[error(transparent)]
    Price(#[from] PriceError),

    /// Line item index out of range.
    #[error("no line item at index {0}")]
    InvalidLineItem(usize),
}

/// Errors related to the multi-page collection.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PageError {
    /// Index outside of the collection.
    #[error("page index {index} out of bounds (len {len})")]
    IndexOutOfBounds { index: usize, len: usize },

    /// Appending would exceed the page ceiling.
    #[error("maximum of {max} pages exceeded ({attempted} requested)")]
    MaxPagesExceeded { max: usize, attempted: usize },

    /// Only image pages can be rotated.
    #[error("page {0} cannot be rotated")]
    NotRotatable(usize),
}

impl UserMessage for PageError {
    fn user_message(&self) -> String {
        match self {
            PageError::MaxPagesExceeded { .. } => {
                FilePickerError::MaxFilesPickedCountExceeded.user_message()
            }
            PageError::IndexOutOfBounds { .. } | PageError::NotRotatable(_) => {
                "This page cannot be changed.".to_string()
            }
        }
    }
}

/// Errors related to persisted flags.
#[derive(Error, Debug)]
pub enum PreferencesError {
    /// Reading or writing the flags file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The flags file is not valid JSON.
    #[error("invalid preferences file: {0}")]
    Format(#[from] serde_json::Error),
}

/// Errors related to the provenance comment embedded in exported images.
#[derive(Error, Debug)]
pub enum MetadataError {
    /// Only JPEG files carry the comment.
    #[error("not a JPEG file")]
    NotJpeg,

    /// The JPEG segment structure is broken.
    #[error("malformed JPEG: {0}")]
    Malformed(String),

    /// The comment does not fit into one APP1 segment.
    #[error("comment of {0} bytes is too long")]
    CommentTooLong(usize),

    /// Decoding or re-encoding the image failed.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

/// Result type for the docket library.
pub type Result<T> = std::result::Result<T, DocketError>;
