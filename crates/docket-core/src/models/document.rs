//! Documents captured or imported during a session.
//!
//! A [`Document`] is one of three kinds. Callers dispatch on the variant
//! instead of probing capabilities at runtime.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};
use uuid::Uuid;

use crate::error::MetadataError;
use crate::metadata::{self, UserComment};
use crate::models::config::PreviewConfig;
use crate::pdf::{self, PdfExtractor, PdfProcessor};
use crate::qr::{self, QrCodeFormat};

const EXPORT_JPEG_QUALITY: u8 = 90;

/// Kind of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Pdf,
    Image,
    QrCode,
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentKind::Pdf => write!(f, "pdf"),
            DocumentKind::Image => write!(f, "image"),
            DocumentKind::QrCode => write!(f, "qrcode"),
        }
    }
}

/// Where a document came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentSource {
    /// Photographed in this session.
    Camera,
    /// Imported from outside the host app.
    External,
    /// Shared by another app.
    AppName(Option<String>),
}

impl DocumentSource {
    pub fn value(&self) -> &str {
        match self {
            DocumentSource::Camera => "camera",
            DocumentSource::External => "external",
            DocumentSource::AppName(Some(name)) => name.rsplit('.').next().unwrap_or(name),
            DocumentSource::AppName(None) => "external",
        }
    }
}

/// How an imported document reached the host app.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ImportMethod {
    OpenWith,
    Picker,
}

impl ImportMethod {
    /// Value written to image metadata.
    pub fn value(&self) -> &'static str {
        match self {
            ImportMethod::OpenWith => "openwith",
            ImportMethod::Picker => "picker",
        }
    }

    pub fn from_value(value: &str) -> Option<Self> {
        match value {
            "openwith" => Some(ImportMethod::OpenWith),
            "picker" => Some(ImportMethod::Picker),
            _ => None,
        }
    }
}

/// A captured or imported document.
#[derive(Debug, Clone)]
pub enum Document {
    Image(ImageDocument),
    Pdf(PdfDocument),
    QrCode(QrCodeDocument),
}

impl Document {
    pub fn kind(&self) -> DocumentKind {
        match self {
            Document::Image(_) => DocumentKind::Image,
            Document::Pdf(_) => DocumentKind::Pdf,
            Document::QrCode(_) => DocumentKind::QrCode,
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            Document::Image(doc) => doc.id,
            Document::Pdf(doc) => doc.id,
            Document::QrCode(doc) => doc.id,
        }
    }

    /// Raw bytes of the document.
    pub fn data(&self) -> &[u8] {
        match self {
            Document::Image(doc) => &doc.data,
            Document::Pdf(doc) => &doc.data,
            Document::QrCode(doc) => &doc.data,
        }
    }

    /// Lazily rendered preview. QR codes have none.
    pub fn preview(&self) -> Option<&DynamicImage> {
        match self {
            Document::Image(doc) => doc.preview(),
            Document::Pdf(doc) => doc.preview(),
            Document::QrCode(_) => None,
        }
    }

    /// Whether the document is shown on the review screen before analysis.
    pub fn is_reviewable(&self) -> bool {
        matches!(self, Document::Image(_))
    }

    pub fn is_imported(&self) -> bool {
        match self {
            Document::Image(doc) => doc.is_imported(),
            Document::Pdf(_) => true,
            Document::QrCode(_) => false,
        }
    }
}

/// A photographed or imported image.
#[derive(Debug, Clone)]
pub struct ImageDocument {
    pub id: Uuid,
    data: Vec<u8>,
    pub source: DocumentSource,
    pub import_method: Option<ImportMethod>,
    rotation_delta: u16,
    preview_max_dimension: u32,
    preview: OnceLock<Option<DynamicImage>>,
}

impl ImageDocument {
    /// Wrap image bytes. A JPEG exported earlier keeps its content id.
    pub fn new(data: Vec<u8>, source: DocumentSource) -> Self {
        let id = metadata::read_user_comment(&data)
            .and_then(|comment| UserComment::parse(&comment))
            .map_or_else(Uuid::new_v4, |comment| comment.content_id);

        Self {
            id,
            data,
            source,
            import_method: None,
            rotation_delta: 0,
            preview_max_dimension: PreviewConfig::default().max_dimension,
            preview: OnceLock::new(),
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Detected image format, if the bytes are a known image.
    pub fn format(&self) -> Option<ImageFormat> {
        image::guess_format(&self.data).ok()
    }

    /// Clockwise rotation applied by the user, in degrees (0, 90, 180, 270).
    pub fn rotation_delta(&self) -> u16 {
        self.rotation_delta
    }

    pub fn is_imported(&self) -> bool {
        self.source != DocumentSource::Camera
    }

    /// Rotate clockwise by `degrees`, rounded to a quarter turn.
    ///
    /// The cached preview is discarded and re-rendered on next access.
    pub fn rotate(&mut self, degrees: u16) {
        let quarter_turns = (degrees / 90) % 4;
        self.rotation_delta = (self.rotation_delta + quarter_turns * 90) % 360;
        self.preview = OnceLock::new();
        debug!(id = %self.id, rotation = self.rotation_delta, "Rotated image document");
    }

    pub fn preview(&self) -> Option<&DynamicImage> {
        self.preview
            .get_or_init(|| {
                let image = match image::load_from_memory(&self.data) {
                    Ok(image) => image,
                    Err(e) => {
                        trace!("Could not decode image preview: {}", e);
                        return None;
                    }
                };
                Some(thumbnail(rotated(image, self.rotation_delta), self.preview_max_dimension))
            })
            .as_ref()
    }

    /// Provenance comment describing this image.
    pub fn user_comment(&self) -> UserComment {
        UserComment::new(self.id, &self.source)
            .with_import_method(self.import_method)
            .with_rotation(self.rotation_delta)
    }

    /// JPEG bytes with the rotation applied and the provenance comment attached.
    ///
    /// An unrotated JPEG keeps its compressed data. Anything else is re-encoded.
    pub fn export_jpeg(&self) -> Result<Vec<u8>, MetadataError> {
        let jpeg = if self.rotation_delta == 0 && self.format() == Some(ImageFormat::Jpeg) {
            self.data.clone()
        } else {
            let image = rotated(image::load_from_memory(&self.data)?, self.rotation_delta);
            let mut jpeg = Vec::new();
            JpegEncoder::new_with_quality(&mut jpeg, EXPORT_JPEG_QUALITY).encode_image(&image.to_rgb8())?;
            jpeg
        };

        let comment = self.user_comment().to_string();
        trace!(id = %self.id, %comment, "Exporting image");
        metadata::write_user_comment(&jpeg, &comment)
    }
}

fn rotated(image: DynamicImage, degrees: u16) -> DynamicImage {
    match degrees {
        90 => image.rotate90(),
        180 => image.rotate180(),
        270 => image.rotate270(),
        _ => image,
    }
}

/// An imported PDF.
#[derive(Debug, Clone)]
pub struct PdfDocument {
    pub id: Uuid,
    data: Vec<u8>,
    page_count: u32,
    preview_max_dimension: u32,
    preview: OnceLock<Option<DynamicImage>>,
}

impl PdfDocument {
    /// Wrap PDF bytes. The page count is 0 when the PDF cannot be read.
    pub fn new(data: Vec<u8>) -> Self {
        let page_count = match pdf::count_pages(&data) {
            Ok(count) => count,
            Err(e) => {
                debug!("Could not count PDF pages: {}", e);
                0
            }
        };

        Self {
            id: Uuid::new_v4(),
            data,
            page_count,
            preview_max_dimension: PreviewConfig::default().max_dimension,
            preview: OnceLock::new(),
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    /// First embedded image of the first page.
    pub fn preview(&self) -> Option<&DynamicImage> {
        self.preview
            .get_or_init(|| {
                let mut extractor = PdfExtractor::new();
                extractor.load(&self.data).ok()?;
                let page = extractor.render_page(1).ok()?;
                Some(thumbnail(page, self.preview_max_dimension))
            })
            .as_ref()
    }
}

/// A payment QR code read by the camera.
#[derive(Debug, Clone)]
pub struct QrCodeDocument {
    pub id: Uuid,
    scanned_string: String,
    format: Option<QrCodeFormat>,
    parameters: BTreeMap<String, String>,
    data: Vec<u8>,
}

impl QrCodeDocument {
    pub fn new(scanned_string: impl Into<String>) -> Self {
        Self::with_default_currency(scanned_string, qr::DEFAULT_CURRENCY)
    }

    /// Classify and extract using `currency` when a bezahlcode names none.
    pub fn with_default_currency(scanned_string: impl Into<String>, currency: &str) -> Self {
        let scanned_string = scanned_string.into();
        let format = QrCodeFormat::classify(&scanned_string);
        let parameters = format
            .map(|f| qr::extract_parameters_with_currency(&scanned_string, f, currency))
            .unwrap_or_default();

        let payload = serde_json::json!({
            "qrcode": scanned_string,
            "paymentdata": parameters,
        });
        let data = serde_json::to_vec_pretty(&payload).unwrap_or_default();

        Self {
            id: Uuid::new_v4(),
            scanned_string,
            format,
            parameters,
            data,
        }
    }

    pub fn scanned_string(&self) -> &str {
        &self.scanned_string
    }

    pub fn format(&self) -> Option<QrCodeFormat> {
        self.format
    }

    pub fn parameters(&self) -> &BTreeMap<String, String> {
        &self.parameters
    }
}

impl PartialEq for QrCodeDocument {
    fn eq(&self, other: &Self) -> bool {
        self.scanned_string == other.scanned_string
    }
}

fn thumbnail(image: DynamicImage, max_dimension: u32) -> DynamicImage {
    if image.width() <= max_dimension && image.height() <= max_dimension {
        image
    } else {
        image.thumbnail(max_dimension, max_dimension)
    }
}

/// Builds a [`Document`] from bytes of unknown type.
pub struct DocumentBuilder {
    data: Vec<u8>,
    source: DocumentSource,
    import_method: ImportMethod,
    preview: PreviewConfig,
}

impl DocumentBuilder {
    pub fn new(data: Vec<u8>, source: DocumentSource) -> Self {
        Self {
            data,
            source,
            import_method: ImportMethod::Picker,
            preview: PreviewConfig::default(),
        }
    }

    /// Set how the document was imported.
    pub fn with_import_method(mut self, import_method: ImportMethod) -> Self {
        self.import_method = import_method;
        self
    }

    /// Set the preview rendering configuration.
    pub fn with_preview_config(mut self, preview: PreviewConfig) -> Self {
        self.preview = preview;
        self
    }

    /// Build a PDF or image document, or `None` if the bytes are neither.
    pub fn build(self) -> Option<Document> {
        if pdf::is_pdf(&self.data) {
            let mut doc = PdfDocument::new(self.data);
            doc.preview_max_dimension = self.preview.max_dimension;
            return Some(Document::Pdf(doc));
        }

        if image::guess_format(&self.data).is_ok() {
            let import_method = (self.source != DocumentSource::Camera).then_some(self.import_method);
            let mut doc = ImageDocument::new(self.data, self.source);
            doc.import_method = import_method;
            doc.preview_max_dimension = self.preview.max_dimension;
            return Some(Document::Image(doc));
        }

        debug!("Bytes are neither a PDF nor a known image");
        None
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use image::{ImageBuffer, Rgb};
    use std::io::Cursor;

    /// Encode a `width`x`height` image in the given format.
    pub fn encoded_image(width: u32, height: u32, format: image::ImageFormat) -> Vec<u8> {
        let img = ImageBuffer::from_fn(width, height, |x, _| Rgb([(x % 256) as u8, 0, 0]));
        let mut data = Vec::new();
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut data), format)
            .unwrap();
        data
    }

    pub fn png(width: u32, height: u32) -> Vec<u8> {
        encoded_image(width, height, image::ImageFormat::Png)
    }
}
