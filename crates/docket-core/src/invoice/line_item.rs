//! Line items of a digital invoice.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::Result;
use crate::error::{InvoiceError, PriceError};
use crate::models::extraction::{find_value, Extraction};
use crate::models::price::Price;

/// Extraction names read from a line-item group.
pub const KEY_DESCRIPTION: &str = "description";
pub const KEY_QUANTITY: &str = "quantity";
pub const KEY_GROSS_PRICE: &str = "grossPrice";
pub const KEY_BASE_GROSS: &str = "baseGross";

/// Why a line item was deselected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReturnReason {
    LooksDifferent,
    PoorQualityOrFaulty,
    DoesNotFit,
    DoesNotSuit,
    WrongItem,
    Damaged,
    ArrivedTooLate,
}

impl ReturnReason {
    pub const ALL: [ReturnReason; 7] = [
        ReturnReason::LooksDifferent,
        ReturnReason::PoorQualityOrFaulty,
        ReturnReason::DoesNotFit,
        ReturnReason::DoesNotSuit,
        ReturnReason::WrongItem,
        ReturnReason::Damaged,
        ReturnReason::ArrivedTooLate,
    ];

    pub fn display_string(&self) -> &'static str {
        match self {
            ReturnReason::LooksDifferent => "Looks different than site image",
            ReturnReason::PoorQualityOrFaulty => "Poor quality/faulty",
            ReturnReason::DoesNotFit => "Doesn't fit properly",
            ReturnReason::DoesNotSuit => "Doesn't suit me",
            ReturnReason::WrongItem => "Received wrong item",
            ReturnReason::Damaged => "Parcel damaged",
            ReturnReason::ArrivedTooLate => "Arrived too late",
        }
    }

    /// Identifier used on the command line and in JSON.
    pub fn key(&self) -> &'static str {
        match self {
            ReturnReason::LooksDifferent => "looksDifferent",
            ReturnReason::PoorQualityOrFaulty => "poorQualityOrFaulty",
            ReturnReason::DoesNotFit => "doesNotFit",
            ReturnReason::DoesNotSuit => "doesNotSuit",
            ReturnReason::WrongItem => "wrongItem",
            ReturnReason::Damaged => "damaged",
            ReturnReason::ArrivedTooLate => "arrivedTooLate",
        }
    }
}

impl fmt::Display for ReturnReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_string())
    }
}

impl FromStr for ReturnReason {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        ReturnReason::ALL
            .into_iter()
            .find(|reason| reason.key().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                let keys: Vec<&str> = ReturnReason::ALL.iter().map(|r| r.key()).collect();
                format!("unknown return reason {:?}, expected one of: {}", s, keys.join(", "))
            })
    }
}

/// Whether a line item is kept or returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "reason", rename_all = "camelCase")]
pub enum SelectedState {
    Selected,
    Deselected(ReturnReason),
}

/// One invoice position.
///
/// The extractions it was parsed from are kept so the item can be written
/// back with its boxes and unknown fields intact.
#[derive(Debug, Clone, PartialEq)]
pub struct LineItem {
    pub name: String,
    pub quantity: u32,
    pub price: Price,
    pub selected_state: SelectedState,
    extractions: Vec<Extraction>,
    price_key: &'static str,
}

impl LineItem {
    pub fn new(name: impl Into<String>, quantity: u32, price: Price) -> Self {
        Self {
            name: name.into(),
            quantity,
            price,
            selected_state: SelectedState::Selected,
            extractions: Vec::new(),
            price_key: KEY_GROSS_PRICE,
        }
    }

    /// Parse a line-item group.
    pub fn from_extractions(extractions: Vec<Extraction>) -> Result<Self> {
        let name = find_value(&extractions, KEY_DESCRIPTION).ok_or(InvoiceError::NameMissing)?;
        let quantity = find_value(&extractions, KEY_QUANTITY).ok_or(InvoiceError::QuantityMissing)?;
        let (price_key, price) = [KEY_GROSS_PRICE, KEY_BASE_GROSS]
            .into_iter()
            .find_map(|key| find_value(&extractions, key).map(|value| (key, value)))
            .ok_or(InvoiceError::PriceMissing)?;

        let quantity = u32::from_str(quantity.trim())
            .map_err(|_| InvoiceError::CannotParseQuantity(quantity.to_string()))?;
        let price = Price::from_extraction_string(price)
            .map_err(|_| InvoiceError::CannotParsePrice(price.to_string()))?;
        let name = name.to_string();

        Ok(Self {
            name,
            quantity,
            price,
            selected_state: SelectedState::Selected,
            extractions,
            price_key,
        })
    }

    pub fn is_selected(&self) -> bool {
        self.selected_state == SelectedState::Selected
    }

    pub fn select(&mut self) {
        self.selected_state = SelectedState::Selected;
    }

    pub fn deselect(&mut self, reason: ReturnReason) {
        self.selected_state = SelectedState::Deselected(reason);
    }

    /// Price times quantity.
    pub fn total_price(&self) -> std::result::Result<Price, PriceError> {
        self.price.try_mul(self.quantity)
    }

    /// The original extractions with the edited values written back.
    ///
    /// A deselected item reports quantity `0`.
    pub fn extractions(&self) -> Vec<Extraction> {
        self.extractions
            .iter()
            .cloned()
            .map(|mut extraction| {
                match extraction.name.as_deref() {
                    Some(KEY_DESCRIPTION) => extraction.value = self.name.clone(),
                    Some(KEY_QUANTITY) => {
                        extraction.value = match self.selected_state {
                            SelectedState::Selected => self.quantity.to_string(),
                            SelectedState::Deselected(_) => "0".to_string(),
                        }
                    }
                    Some(key) if key == self.price_key => {
                        extraction.value = self.price.extraction_string()
                    }
                    _ => {}
                }
                extraction
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::extraction::ExtractionBox;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;

    fn line_item_box() -> ExtractionBox {
        ExtractionBox {
            height: 9.0,
            left: 72.0,
            page: 1,
            top: 347.11,
            width: 5.0,
        }
    }

    fn sweatjacke() -> Vec<Extraction> {
        vec![
            Extraction::new("baseGross", "amount", "39.99:EUR").with_box(line_item_box()),
            Extraction::new("description", "text", "CORE ICON - Sweatjacke - emerald"),
            Extraction::new("artNumber", "idnumber", "H0422S039-M11000L000"),
            Extraction::new("quantity", "number", "3"),
        ]
    }

    #[test]
    fn test_parse_line_item() {
        let item = LineItem::from_extractions(sweatjacke()).unwrap();
        assert_eq!(item.name, "CORE ICON - Sweatjacke - emerald");
        assert_eq!(item.price, Price::new(Decimal::new(3999, 2), "eur"));
        assert_eq!(item.quantity, 3);
        assert_eq!(item.selected_state, SelectedState::Selected);
    }

    #[test]
    fn test_total_price() {
        let item = LineItem::from_extractions(sweatjacke()).unwrap();
        assert_eq!(item.total_price(), Ok(Price::new(Decimal::new(11997, 2), "eur")));
    }

    #[test]
    fn test_missing_fields() {
        let without = |name: &str| -> Vec<Extraction> {
            sweatjacke()
                .into_iter()
                .filter(|e| !e.is_named(name))
                .collect()
        };

        assert_eq!(
            LineItem::from_extractions(without("description")),
            Err(InvoiceError::NameMissing)
        );
        assert_eq!(
            LineItem::from_extractions(without("quantity")),
            Err(InvoiceError::QuantityMissing)
        );
        assert_eq!(
            LineItem::from_extractions(without("baseGross")),
            Err(InvoiceError::PriceMissing)
        );
    }

    #[test]
    fn test_unparseable_fields() {
        let mut group = sweatjacke();
        group[3].value = "-1".to_string();
        assert_eq!(
            LineItem::from_extractions(group),
            Err(InvoiceError::CannotParseQuantity("-1".to_string()))
        );

        let mut group = sweatjacke();
        group[0].value = "cheap".to_string();
        assert_eq!(
            LineItem::from_extractions(group),
            Err(InvoiceError::CannotParsePrice("cheap".to_string()))
        );
    }

    #[test]
    fn test_deselect_then_select() {
        let mut item = LineItem::from_extractions(sweatjacke()).unwrap();
        item.deselect(ReturnReason::Damaged);
        assert!(!item.is_selected());
        assert_eq!(item.selected_state, SelectedState::Deselected(ReturnReason::Damaged));

        item.select();
        assert!(item.is_selected());
    }

    #[test]
    fn test_extractions_write_back_edits() {
        let mut item = LineItem::from_extractions(sweatjacke()).unwrap();
        item.name = "Sweatjacke".to_string();
        item.price = Price::new(Decimal::new(2999, 2), "eur");
        item.deselect(ReturnReason::WrongItem);

        let written = item.extractions();
        assert_eq!(written.len(), 4);
        assert_eq!(written[0].value, "29.99:EUR");
        assert_eq!(written[0].bounding_box, Some(line_item_box()));
        assert_eq!(written[1].value, "Sweatjacke");
        assert_eq!(written[2].value, "H0422S039-M11000L000");
        assert_eq!(written[3].value, "0");

        item.select();
        assert_eq!(item.extractions()[3].value, "3");
    }

    #[test]
    fn test_return_reason_strings() {
        assert_eq!(ReturnReason::LooksDifferent.to_string(), "Looks different than site image");
        assert_eq!(ReturnReason::ArrivedTooLate.display_string(), "Arrived too late");
        assert_eq!("damaged".parse::<ReturnReason>(), Ok(ReturnReason::Damaged));
        assert_eq!("WRONGITEM".parse::<ReturnReason>(), Ok(ReturnReason::WrongItem));
        assert!("lost".parse::<ReturnReason>().is_err());
    }
}
