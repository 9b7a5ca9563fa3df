//! Page counting and embedded page images, backed by lopdf.

use image::{DynamicImage, GrayImage, RgbImage};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use tracing::{debug, trace};

use super::{PdfProcessor, Result};
use crate::error::PdfError;

/// Bound on `/Parent` hops when looking for inherited resources.
const MAX_PAGE_TREE_DEPTH: usize = 32;

/// Reads scanned PDFs: page count plus the images placed on each page.
#[derive(Default)]
pub struct PdfExtractor {
    document: Option<Document>,
}

impl PdfExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    fn loaded(&self) -> Result<&Document> {
        self.document
            .as_ref()
            .ok_or_else(|| PdfError::Parse("no document loaded".to_string()))
    }
}

impl PdfProcessor for PdfExtractor {
    fn load(&mut self, data: &[u8]) -> Result<()> {
        let mut doc = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        // Owner-password-only PDFs open with an empty user password.
        if doc.is_encrypted() {
            doc.decrypt("").map_err(|_| PdfError::Encrypted)?;
            debug!("Opened encrypted PDF with empty user password");
        }

        let pages = doc.get_pages().len();
        if pages == 0 {
            return Err(PdfError::NoPages);
        }

        debug!(pages, "Loaded PDF");
        self.document = Some(doc);
        Ok(())
    }

    fn page_count(&self) -> u32 {
        self.document
            .as_ref()
            .map_or(0, |doc| doc.get_pages().len() as u32)
    }

    fn render_page(&self, page: u32) -> Result<DynamicImage> {
        self.extract_images(page)?
            .into_iter()
            .max_by_key(|img| u64::from(img.width()) * u64::from(img.height()))
            .ok_or_else(|| PdfError::ImageExtraction(format!("no image on page {}", page)))
    }

    fn extract_images(&self, page: u32) -> Result<Vec<DynamicImage>> {
        let doc = self.loaded()?;
        let page_id = *doc.get_pages().get(&page).ok_or(PdfError::InvalidPage(page))?;

        let Some(xobjects) = inherited_resources(doc, page_id)
            .and_then(|resources| resources.get(b"XObject").ok())
            .and_then(|xobjects| doc.dereference(xobjects).ok())
            .and_then(|(_, xobjects)| xobjects.as_dict().ok())
        else {
            trace!(page, "Page has no XObject resources");
            return Ok(Vec::new());
        };

        let images: Vec<DynamicImage> = xobjects
            .iter()
            .filter_map(|(_, reference)| doc.dereference(reference).ok())
            .filter_map(|(_, object)| object.as_stream().ok())
            .filter_map(|stream| ImageXObject::parse(doc, stream))
            .filter_map(|xobject| xobject.decode())
            .collect();

        debug!(page, count = images.len(), "Extracted page images");
        Ok(images)
    }
}

/// The `/Resources` of a page, walking up the page tree when the page inherits them.
fn inherited_resources(doc: &Document, page_id: ObjectId) -> Option<&Dictionary> {
    let mut node = doc.get_dictionary(page_id).ok()?;

    for _ in 0..MAX_PAGE_TREE_DEPTH {
        if let Some(resources) = node
            .get(b"Resources")
            .ok()
            .and_then(|r| doc.dereference(r).ok())
            .and_then(|(_, r)| r.as_dict().ok())
        {
            return Some(resources);
        }

        let parent = node.get(b"Parent").ok()?.as_reference().ok()?;
        node = doc.get_dictionary(parent).ok()?;
    }

    None
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColorSpace {
    Gray,
    Rgb,
}

/// An image XObject on a page, before decoding.
struct ImageXObject<'a> {
    stream: &'a Stream,
    width: u32,
    height: u32,
    jpeg: bool,
    color_space: Option<ColorSpace>,
    bits_per_component: i64,
}

impl<'a> ImageXObject<'a> {
    fn parse(doc: &Document, stream: &'a Stream) -> Option<Self> {
        let dict = &stream.dict;
        if dict.get(b"Subtype").ok()?.as_name().ok()? != b"Image" {
            return None;
        }

        let width = u32::try_from(dict.get(b"Width").ok()?.as_i64().ok()?).ok()?;
        let height = u32::try_from(dict.get(b"Height").ok()?.as_i64().ok()?).ok()?;

        let filter = dict.get(b"Filter").ok().and_then(|f| match f {
            Object::Array(filters) => filters.last().and_then(|o| o.as_name().ok()),
            other => other.as_name().ok(),
        });

        let color_space = dict
            .get(b"ColorSpace")
            .ok()
            .and_then(|cs| doc.dereference(cs).ok())
            .and_then(|(_, cs)| match cs {
                Object::Array(parts) => parts.first().and_then(|o| o.as_name().ok()),
                other => other.as_name().ok(),
            })
            .and_then(|name| match name {
                b"DeviceGray" | b"G" | b"CalGray" => Some(ColorSpace::Gray),
                b"DeviceRGB" | b"RGB" | b"CalRGB" => Some(ColorSpace::Rgb),
                _ => None,
            });

        let bits_per_component = dict
            .get(b"BitsPerComponent")
            .ok()
            .and_then(|o| o.as_i64().ok())
            .unwrap_or(8);

        trace!(width, height, ?filter, ?color_space, "Found image XObject");

        Some(Self {
            stream,
            width,
            height,
            jpeg: filter == Some(b"DCTDecode".as_slice()),
            color_space,
            bits_per_component,
        })
    }

    fn decode(&self) -> Option<DynamicImage> {
        if self.jpeg {
            return image::load_from_memory_with_format(&self.stream.content, image::ImageFormat::Jpeg)
                .map_err(|e| trace!("Skipping undecodable JPEG image: {}", e))
                .ok();
        }

        // lopdf only decompresses filtered streams.
        let samples = if self.stream.dict.get(b"Filter").is_ok() {
            self.stream.decompressed_content().ok()?
        } else {
            self.stream.content.clone()
        };
        raw_image(&samples, self.width, self.height, self.color_space?, self.bits_per_component)
    }
}

/// Build an image from uncompressed 8-bit samples.
fn raw_image(
    samples: &[u8],
    width: u32,
    height: u32,
    color_space: ColorSpace,
    bits_per_component: i64,
) -> Option<DynamicImage> {
    if bits_per_component != 8 {
        trace!(bits_per_component, "Unsupported sample depth");
        return None;
    }

    let channels = match color_space {
        ColorSpace::Gray => 1,
        ColorSpace::Rgb => 3,
    };
    let len = (width as usize)
        .checked_mul(height as usize)?
        .checked_mul(channels)?;
    let samples = samples.get(..len)?.to_vec();

    match color_space {
        ColorSpace::Gray => GrayImage::from_raw(width, height, samples).map(DynamicImage::ImageLuma8),
        ColorSpace::Rgb => RgbImage::from_raw(width, height, samples).map(DynamicImage::ImageRgb8),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::fixtures::{blank_pdf, scanned_pdf};

    #[test]
    fn test_unloaded_extractor() {
        let extractor = PdfExtractor::new();
        assert_eq!(extractor.page_count(), 0);
        assert!(matches!(extractor.extract_images(1), Err(PdfError::Parse(_))));
    }

    #[test]
    fn test_blank_page_has_no_images() {
        let mut extractor = PdfExtractor::new();
        extractor.load(&blank_pdf(2)).unwrap();

        assert_eq!(extractor.page_count(), 2);
        assert!(extractor.extract_images(1).unwrap().is_empty());
        assert!(matches!(extractor.render_page(1), Err(PdfError::ImageExtraction(_))));
        assert!(matches!(extractor.extract_images(3), Err(PdfError::InvalidPage(3))));
    }

    #[test]
    fn test_raw_gray_image() {
        let img = raw_image(&[0, 128, 255, 64], 2, 2, ColorSpace::Gray, 8).unwrap();
        assert_eq!((img.width(), img.height()), (2, 2));
        assert!(raw_image(&[0, 1], 2, 2, ColorSpace::Gray, 8).is_none());
        assert!(raw_image(&[0; 4], 2, 2, ColorSpace::Gray, 1).is_none());
        assert!(raw_image(&[0; 12], 2, 2, ColorSpace::Rgb, 8).is_some());
    }

    #[test]
    fn test_huge_declared_size_is_rejected() {
        assert!(raw_image(&[0; 12], u32::MAX, u32::MAX, ColorSpace::Rgb, 8).is_none());
        assert!(raw_image(&[0; 12], u32::MAX, 2, ColorSpace::Gray, 8).is_none());
    }

    #[test]
    fn test_scanned_pages_yield_images() {
        let mut extractor = PdfExtractor::new();
        extractor.load(&scanned_pdf()).unwrap();
        assert_eq!(extractor.page_count(), 2);

        let first = extractor.render_page(1).unwrap();
        assert_eq!((first.width(), first.height()), (40, 20));

        let second = extractor.extract_images(2).unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!((second[0].width(), second[0].height()), (4, 2));
        assert_eq!(second[0].to_luma8().get_pixel(3, 1).0, [224]);
    }
}
