//! QR code detection in still images.
//!
//! Images are converted to grayscale, optionally downscaled, and searched
//! for QR grids with rqrr. Only the decoded payloads are returned.

use image::{imageops::FilterType, DynamicImage};
use tracing::{debug, trace, warn};

/// QR code detector for photographed documents.
pub struct QrDetector {
    /// Images larger than this are downscaled before detection.
    max_dimension: u32,
}

impl Default for QrDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl QrDetector {
    pub fn new() -> Self {
        Self {
            max_dimension: 1280,
        }
    }

    pub fn with_max_dimension(max_dimension: u32) -> Self {
        Self { max_dimension }
    }

    /// Decode all QR codes in `image`.
    pub fn detect(&self, image: &DynamicImage) -> Vec<String> {
        let start = std::time::Instant::now();

        let image = if image.width() > self.max_dimension || image.height() > self.max_dimension {
            image.resize(self.max_dimension, self.max_dimension, FilterType::Triangle)
        } else {
            image.clone()
        };
        let luma = image.to_luma8();

        let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
            luma.width() as usize,
            luma.height() as usize,
            |x, y| luma.get_pixel(x as u32, y as u32).0[0],
        );
        let grids = prepared.detect_grids();
        trace!(count = grids.len(), "Found QR grids");

        let mut payloads = Vec::with_capacity(grids.len());
        for grid in grids {
            match grid.decode() {
                Ok((_meta, content)) => {
                    debug!(content = %content, "Detected QR code");
                    payloads.push(content);
                }
                Err(e) => debug!(error = ?e, "Failed to decode QR code"),
            }
        }

        trace!(
            count = payloads.len(),
            total_ms = start.elapsed().as_millis(),
            "QR detection complete"
        );
        payloads
    }

    /// Run [`detect`](Self::detect) on the blocking thread pool.
    pub async fn detect_in_background(&self, image: DynamicImage) -> Vec<String> {
        let detector = QrDetector::with_max_dimension(self.max_dimension);

        tokio::task::spawn_blocking(move || detector.detect(&image))
            .await
            .unwrap_or_else(|e| {
                warn!(error = %e, "QR detection task panicked");
                Vec::new()
            })
    }
}

/// Decode all QR codes in `image` with default settings.
pub fn detect_qr_codes(image: &DynamicImage) -> Vec<String> {
    QrDetector::new().detect(image)
}
