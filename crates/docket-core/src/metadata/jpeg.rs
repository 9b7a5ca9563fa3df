//! EXIF UserComment stored in a JPEG APP1 segment.

use crate::error::MetadataError;

const SOI: [u8; 2] = [0xFF, 0xD8];
const APP0: u8 = 0xE0;
const APP1: u8 = 0xE1;
const SOS: u8 = 0xDA;
const EOI: u8 = 0xD9;
const EXIF_HEADER: &[u8] = b"Exif\0\0";

const TAG_EXIF_IFD: u16 = 0x8769;
const TAG_USER_COMMENT: u16 = 0x9286;
const TYPE_LONG: u16 = 4;
const TYPE_UNDEFINED: u16 = 7;
/// Character code prefix of an ASCII UserComment.
const ASCII_PREFIX: &[u8; 8] = b"ASCII\0\0\0";

/// Size of an IFD holding a single entry.
const SINGLE_ENTRY_IFD_LEN: u32 = 2 + 12 + 4;

/// A marker segment before the scan data.
struct Segment<'a> {
    marker: u8,
    /// Marker, length and payload.
    bytes: &'a [u8],
    payload: &'a [u8],
}

impl Segment<'_> {
    fn is_exif(&self) -> bool {
        self.marker == APP1 && self.payload.starts_with(EXIF_HEADER)
    }
}

/// Split a JPEG into its header segments and the bytes from the first scan on.
fn split_segments(data: &[u8]) -> Result<(Vec<Segment<'_>>, &[u8]), MetadataError> {
    if !data.starts_with(&SOI) {
        return Err(MetadataError::NotJpeg);
    }

    let mut segments = Vec::new();
    let mut pos = SOI.len();
    loop {
        let Some(&[0xFF, marker]) = data.get(pos..pos + 2) else {
            return Err(MetadataError::Malformed(format!("no marker at offset {}", pos)));
        };

        match marker {
            // Fill byte before the actual marker.
            0xFF => {
                pos += 1;
                continue;
            }
            SOS | EOI => return Ok((segments, &data[pos..])),
            0x01 | 0xD0..=0xD7 => {
                segments.push(Segment {
                    marker,
                    bytes: &data[pos..pos + 2],
                    payload: &[],
                });
                pos += 2;
                continue;
            }
            _ => {}
        }

        let len = data
            .get(pos + 2..pos + 4)
            .map(|b| usize::from(u16::from_be_bytes([b[0], b[1]])))
            .filter(|len| *len >= 2)
            .ok_or_else(|| MetadataError::Malformed(format!("bad segment length at offset {}", pos)))?;
        let end = pos + 2 + len;
        let bytes = data
            .get(pos..end)
            .ok_or_else(|| MetadataError::Malformed("segment runs past the end of the file".to_string()))?;

        segments.push(Segment {
            marker,
            bytes,
            payload: &bytes[4..],
        });
        pos = end;
    }
}

/// The EXIF UserComment of a JPEG, if it has one.
pub fn read_user_comment(data: &[u8]) -> Option<String> {
    let (segments, _) = split_segments(data).ok()?;
    let tiff = segments
        .iter()
        .find(|segment| segment.is_exif())?
        .payload
        .get(EXIF_HEADER.len()..)?;
    user_comment_from_tiff(tiff)
}

/// Return `data` with its EXIF block replaced by one holding `comment`.
///
/// The new block follows any APP0 (JFIF) segments. Other segments and the
/// scan data are copied unchanged.
pub fn write_user_comment(data: &[u8], comment: &str) -> Result<Vec<u8>, MetadataError> {
    let (segments, scan) = split_segments(data)?;
    let exif = exif_segment(comment)?;

    let mut out = Vec::with_capacity(data.len() + exif.len());
    out.extend_from_slice(&SOI);

    let mut inserted = false;
    for segment in segments.iter().filter(|segment| !segment.is_exif()) {
        if !inserted && segment.marker != APP0 {
            out.extend_from_slice(&exif);
            inserted = true;
        }
        out.extend_from_slice(segment.bytes);
    }
    if !inserted {
        out.extend_from_slice(&exif);
    }

    out.extend_from_slice(scan);
    Ok(out)
}

fn exif_segment(comment: &str) -> Result<Vec<u8>, MetadataError> {
    let tiff = tiff_with_user_comment(comment);
    let len = u16::try_from(2 + EXIF_HEADER.len() + tiff.len())
        .map_err(|_| MetadataError::CommentTooLong(comment.len()))?;

    let mut segment = Vec::with_capacity(usize::from(len) + 2);
    segment.extend_from_slice(&[0xFF, APP1]);
    segment.extend_from_slice(&len.to_be_bytes());
    segment.extend_from_slice(EXIF_HEADER);
    segment.extend_from_slice(&tiff);
    Ok(segment)
}

/// Big-endian TIFF block: IFD0 points at an Exif IFD holding only the UserComment.
fn tiff_with_user_comment(comment: &str) -> Vec<u8> {
    const IFD0: u32 = 8;
    const EXIF_IFD: u32 = IFD0 + SINGLE_ENTRY_IFD_LEN;
    const VALUE: u32 = EXIF_IFD + SINGLE_ENTRY_IFD_LEN;

    let mut value = ASCII_PREFIX.to_vec();
    value.extend_from_slice(comment.as_bytes());

    let mut tiff = Vec::with_capacity(VALUE as usize + value.len());
    tiff.extend_from_slice(b"MM");
    tiff.extend_from_slice(&42u16.to_be_bytes());
    tiff.extend_from_slice(&IFD0.to_be_bytes());
    push_single_entry_ifd(&mut tiff, TAG_EXIF_IFD, TYPE_LONG, 1, EXIF_IFD);
    push_single_entry_ifd(&mut tiff, TAG_USER_COMMENT, TYPE_UNDEFINED, value.len() as u32, VALUE);
    tiff.extend_from_slice(&value);
    tiff
}

fn push_single_entry_ifd(tiff: &mut Vec<u8>, tag: u16, kind: u16, count: u32, value: u32) {
    tiff.extend_from_slice(&1u16.to_be_bytes());
    tiff.extend_from_slice(&tag.to_be_bytes());
    tiff.extend_from_slice(&kind.to_be_bytes());
    tiff.extend_from_slice(&count.to_be_bytes());
    tiff.extend_from_slice(&value.to_be_bytes());
    // No further IFD.
    tiff.extend_from_slice(&0u32.to_be_bytes());
}

#[derive(Debug, Clone, Copy)]
enum ByteOrder {
    Little,
    Big,
}

/// Read-only view of a TIFF block in either byte order.
struct Tiff<'a> {
    data: &'a [u8],
    order: ByteOrder,
}

impl<'a> Tiff<'a> {
    fn new(data: &'a [u8]) -> Option<Self> {
        let order = match data.get(..2)? {
            b"II" => ByteOrder::Little,
            b"MM" => ByteOrder::Big,
            _ => return None,
        };
        Some(Self { data, order })
    }

    fn u16_at(&self, offset: usize) -> Option<u16> {
        let bytes: [u8; 2] = self.data.get(offset..offset.checked_add(2)?)?.try_into().ok()?;
        Some(match self.order {
            ByteOrder::Little => u16::from_le_bytes(bytes),
            ByteOrder::Big => u16::from_be_bytes(bytes),
        })
    }

    fn u32_at(&self, offset: usize) -> Option<u32> {
        let bytes: [u8; 4] = self.data.get(offset..offset.checked_add(4)?)?.try_into().ok()?;
        Some(match self.order {
            ByteOrder::Little => u32::from_le_bytes(bytes),
            ByteOrder::Big => u32::from_be_bytes(bytes),
        })
    }

    /// Count and value-field offset of `tag` in the IFD at `ifd`.
    fn entry(&self, ifd: usize, tag: u16) -> Option<(usize, usize)> {
        let entries = usize::from(self.u16_at(ifd)?);
        let entry = (0..entries)
            .map(|i| ifd + 2 + i * 12)
            .find(|&entry| self.u16_at(entry) == Some(tag))?;
        Some((self.u32_at(entry + 4)? as usize, entry + 8))
    }
}

fn user_comment_from_tiff(data: &[u8]) -> Option<String> {
    let tiff = Tiff::new(data)?;
    let ifd0 = tiff.u32_at(4)? as usize;
    let (_, pointer) = tiff.entry(ifd0, TAG_EXIF_IFD)?;
    let exif_ifd = tiff.u32_at(pointer)? as usize;
    let (count, field) = tiff.entry(exif_ifd, TAG_USER_COMMENT)?;

    let start = if count <= 4 { field } else { tiff.u32_at(field)? as usize };
    let raw = data.get(start..start.checked_add(count)?)?;
    let text = raw.get(ASCII_PREFIX.len()..).unwrap_or_default();

    Some(
        String::from_utf8_lossy(text)
            .trim_end_matches('\0')
            .trim()
            .to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::document::fixtures::encoded_image;
    use pretty_assertions::assert_eq;

    fn jpeg() -> Vec<u8> {
        encoded_image(16, 8, image::ImageFormat::Jpeg)
    }

    fn exif_blocks(data: &[u8]) -> usize {
        data.windows(EXIF_HEADER.len()).filter(|w| *w == EXIF_HEADER).count()
    }

    #[test]
    fn test_write_and_read_comment() {
        let original = jpeg();
        assert_eq!(read_user_comment(&original), None);

        let tagged = write_user_comment(&original, "ContentId=abc,Source=camera").unwrap();
        assert_eq!(read_user_comment(&tagged).as_deref(), Some("ContentId=abc,Source=camera"));

        let decoded = image::load_from_memory(&tagged).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (16, 8));
    }

    #[test]
    fn test_rewrite_replaces_comment() {
        let tagged = write_user_comment(&jpeg(), "Source=camera").unwrap();
        let retagged = write_user_comment(&tagged, "Source=external").unwrap();

        assert_eq!(read_user_comment(&retagged).as_deref(), Some("Source=external"));
        assert_eq!(exif_blocks(&retagged), 1);
    }

    #[test]
    fn test_little_endian_comment() {
        let comment = b"ASCII\0\0\0RotDeltaDeg=90";
        let mut tiff = b"II".to_vec();
        tiff.extend_from_slice(&42u16.to_le_bytes());
        tiff.extend_from_slice(&8u32.to_le_bytes());
        for (tag, kind, count, value) in [
            (TAG_EXIF_IFD, TYPE_LONG, 1u32, 26u32),
            (TAG_USER_COMMENT, TYPE_UNDEFINED, comment.len() as u32, 44u32),
        ] {
            tiff.extend_from_slice(&1u16.to_le_bytes());
            tiff.extend_from_slice(&tag.to_le_bytes());
            tiff.extend_from_slice(&kind.to_le_bytes());
            tiff.extend_from_slice(&count.to_le_bytes());
            tiff.extend_from_slice(&value.to_le_bytes());
            tiff.extend_from_slice(&0u32.to_le_bytes());
        }
        tiff.extend_from_slice(comment);

        assert_eq!(user_comment_from_tiff(&tiff).as_deref(), Some("RotDeltaDeg=90"));
        assert_eq!(user_comment_from_tiff(&tiff[..30]), None);
    }

    #[test]
    fn test_rejects_non_jpeg() {
        let png = encoded_image(2, 2, image::ImageFormat::Png);
        assert!(matches!(write_user_comment(&png, "x"), Err(MetadataError::NotJpeg)));
        assert!(matches!(
            write_user_comment(&[0xFF, 0xD8, 0xFF, 0xE1, 0xFF], "x"),
            Err(MetadataError::Malformed(_))
        ));
        assert_eq!(read_user_comment(&png), None);
    }

    #[test]
    fn test_comment_too_long() {
        let comment = "x".repeat(70_000);
        assert!(matches!(
            write_user_comment(&jpeg(), &comment),
            Err(MetadataError::CommentTooLong(70_000))
        ));
    }
}
