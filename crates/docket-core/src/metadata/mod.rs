//! Provenance carried inside exported images.
//!
//! Exported JPEG pages keep an EXIF UserComment so that the document id,
//! its origin and the user's rotation travel with the bytes. The comment is
//! a flat comma separated `key=value` list:
//!
//! ```text
//! Platform=linux,DocketVer=0.1.0,ContentId=<uuid>,Source=external,ImportMethod=picker,RotDeltaDeg=90
//! ```

mod jpeg;

pub use jpeg::{read_user_comment, write_user_comment};

use std::fmt;

use uuid::Uuid;

use crate::models::document::{DocumentSource, ImportMethod};

pub const KEY_PLATFORM: &str = "Platform";
pub const KEY_VERSION: &str = "DocketVer";
pub const KEY_CONTENT_ID: &str = "ContentId";
pub const KEY_SOURCE: &str = "Source";
pub const KEY_IMPORT_METHOD: &str = "ImportMethod";
pub const KEY_ROTATION: &str = "RotDeltaDeg";

/// Parsed provenance comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserComment {
    pub platform: String,
    pub version: String,
    pub content_id: Uuid,
    /// [`DocumentSource::value`] of the document.
    pub source: String,
    /// Only written for documents that did not come from the camera.
    pub import_method: Option<ImportMethod>,
    /// Clockwise rotation in degrees, 0 to 270.
    pub rotation_delta: u16,
}

impl UserComment {
    pub fn new(content_id: Uuid, source: &DocumentSource) -> Self {
        Self {
            platform: std::env::consts::OS.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            content_id,
            source: source.value().to_string(),
            import_method: None,
            rotation_delta: 0,
        }
    }

    pub fn with_import_method(mut self, import_method: Option<ImportMethod>) -> Self {
        self.import_method = import_method;
        self
    }

    pub fn with_rotation(mut self, degrees: u16) -> Self {
        self.rotation_delta = normalized_degrees(i64::from(degrees));
        self
    }

    /// Parse a comment. `ContentId` and `Source` are required.
    pub fn parse(comment: &str) -> Option<Self> {
        let content_id = field(comment, KEY_CONTENT_ID)?.parse().ok()?;
        let source = field(comment, KEY_SOURCE)?.to_string();

        Some(Self {
            platform: field(comment, KEY_PLATFORM).unwrap_or_default().to_string(),
            version: field(comment, KEY_VERSION).unwrap_or_default().to_string(),
            content_id,
            source,
            import_method: field(comment, KEY_IMPORT_METHOD).and_then(ImportMethod::from_value),
            rotation_delta: field(comment, KEY_ROTATION)
                .and_then(|value| value.parse::<i64>().ok())
                .map(normalized_degrees)
                .unwrap_or(0),
        })
    }
}

impl fmt::Display for UserComment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}={},{}={},{}={},{}={}",
            KEY_PLATFORM,
            self.platform,
            KEY_VERSION,
            self.version,
            KEY_CONTENT_ID,
            self.content_id,
            KEY_SOURCE,
            self.source
        )?;

        if let Some(import_method) = self.import_method {
            if self.source != DocumentSource::Camera.value() {
                write!(f, ",{}={}", KEY_IMPORT_METHOD, import_method.value())?;
            }
        }

        write!(f, ",{}={}", KEY_ROTATION, self.rotation_delta)
    }
}

/// Value of `key` in a comment. The last occurrence wins.
pub fn field<'a>(comment: &'a str, key: &str) -> Option<&'a str> {
    comment
        .split(',')
        .filter_map(|component| component.split_once('='))
        .filter(|(k, _)| k.trim() == key)
        .map(|(_, value)| value.trim())
        .last()
}

fn normalized_degrees(degrees: i64) -> u16 {
    degrees.rem_euclid(360) as u16
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_comment_round_trip() {
        let id = Uuid::new_v4();
        let comment = UserComment::new(id, &DocumentSource::External)
            .with_import_method(Some(ImportMethod::OpenWith))
            .with_rotation(270);

        let text = comment.to_string();
        assert!(text.contains(&format!("ContentId={}", id)));
        assert!(text.contains("Source=external"));
        assert!(text.contains("ImportMethod=openwith"));
        assert!(text.ends_with("RotDeltaDeg=270"));

        assert_eq!(UserComment::parse(&text), Some(comment));
    }

    #[test]
    fn test_camera_comment_has_no_import_method() {
        let comment = UserComment::new(Uuid::new_v4(), &DocumentSource::Camera)
            .with_import_method(Some(ImportMethod::Picker));
        assert!(!comment.to_string().contains(KEY_IMPORT_METHOD));
    }

    #[test]
    fn test_parse_foreign_comment() {
        let comment = UserComment::parse(
            "Platform=iOS,OSVer=11.0,ContentId=1E4E3B1E-7DA6-4C4B-9DB4-5F9C1C2A1B0A,Source=camera,RotDeltaDeg=-90",
        )
        .unwrap();
        assert_eq!(comment.platform, "iOS");
        assert_eq!(comment.version, "");
        assert_eq!(comment.source, "camera");
        assert_eq!(comment.rotation_delta, 270);

        assert!(UserComment::parse("Platform=iOS,Source=camera").is_none());
        assert!(UserComment::parse("ContentId=nope,Source=camera").is_none());
    }

    #[test]
    fn test_field_lookup() {
        assert_eq!(field("a=1,b=2,a=3", "a"), Some("3"));
        assert_eq!(field("a=1,bb=2", "b"), None);
        assert_eq!(field("", "a"), None);
    }
}
