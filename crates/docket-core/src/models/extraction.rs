//! Extraction results produced by the external analysis service.
//!
//! These types mirror the wire format so that a result can be read, edited
//! and written back without losing fields this crate does not interpret.

use serde::{Deserialize, Serialize};

/// Bounding box of an extraction on a document page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionBox {
    pub height: f64,
    pub left: f64,
    pub page: u32,
    pub top: f64,
    pub width: f64,
}

/// A single named field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extraction {
    #[serde(rename = "box", default, skip_serializing_if = "Option::is_none")]
    pub bounding_box: Option<ExtractionBox>,

    /// Name of the candidates list this extraction was picked from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candidates: Option<String>,

    /// Entity type (`amount`, `text`, `iban`, ...).
    pub entity: String,

    pub value: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Extraction {
    pub fn new(name: impl Into<String>, entity: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            bounding_box: None,
            candidates: None,
            entity: entity.into(),
            value: value.into(),
            name: Some(name.into()),
        }
    }

    pub fn with_box(mut self, bounding_box: ExtractionBox) -> Self {
        self.bounding_box = Some(bounding_box);
        self
    }

    /// Whether this extraction carries the given name.
    pub fn is_named(&self, name: &str) -> bool {
        self.name.as_deref() == Some(name)
    }
}

/// Top-level extractions plus optional line-item groups.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResult {
    #[serde(default)]
    pub extractions: Vec<Extraction>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_items: Option<Vec<Vec<Extraction>>>,
}

impl ExtractionResult {
    pub fn new(extractions: Vec<Extraction>, line_items: Option<Vec<Vec<Extraction>>>) -> Self {
        Self {
            extractions,
            line_items,
        }
    }

    /// Value of the first top-level extraction with the given name.
    pub fn value_of(&self, name: &str) -> Option<&str> {
        find_value(&self.extractions, name)
    }
}

/// Value of the first extraction in `extractions` with the given name.
pub fn find_value<'a>(extractions: &'a [Extraction], name: &str) -> Option<&'a str> {
    extractions
        .iter()
        .find(|e| e.is_named(name))
        .map(|e| e.value.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_wire_format() {
        let json = r#"{
            "extractions": [
                {"box": {"height": 9.0, "left": 516.0, "page": 1, "top": 588.0, "width": 42.0},
                 "entity": "amount", "value": "24.99:EUR", "name": "amountToPay"}
            ],
            "lineItems": [[
                {"entity": "text", "value": "Sweatjacke", "name": "description"}
            ]]
        }"#;

        let result: ExtractionResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.value_of("amountToPay"), Some("24.99:EUR"));
        assert_eq!(result.extractions[0].bounding_box.as_ref().unwrap().page, 1);
        assert_eq!(result.line_items.as_ref().unwrap()[0][0].value, "Sweatjacke");

        let written = serde_json::to_value(&result).unwrap();
        assert!(written.get("lineItems").is_some());
        assert!(written["lineItems"][0][0].get("box").is_none());
    }

    #[test]
    fn test_missing_line_items() {
        let result: ExtractionResult = serde_json::from_str(r#"{"extractions": []}"#).unwrap();
        assert_eq!(result.line_items, None);
    }
}
