//! Charges and discounts that are not line items.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::models::extraction::Extraction;
use crate::models::price::Price;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AddonKind {
    #[serde(rename = "discount-addon")]
    Discount,
    #[serde(rename = "giftcard-addon")]
    Giftcard,
    #[serde(rename = "other-discounts-addon")]
    OtherDiscounts,
    #[serde(rename = "other-charges-addon")]
    OtherCharges,
    #[serde(rename = "shipment-addon")]
    Shipment,
}

impl AddonKind {
    /// Look up the kind from an extraction name.
    pub fn from_extraction_name(name: &str) -> Option<Self> {
        match name {
            "discount-addon" => Some(AddonKind::Discount),
            "giftcard-addon" => Some(AddonKind::Giftcard),
            "other-discounts-addon" => Some(AddonKind::OtherDiscounts),
            "other-charges-addon" => Some(AddonKind::OtherCharges),
            "shipment-addon" => Some(AddonKind::Shipment),
            _ => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            AddonKind::Discount => "Discount",
            AddonKind::Giftcard => "Gift card",
            AddonKind::OtherDiscounts => "Other discounts",
            AddonKind::OtherCharges => "Other charges",
            AddonKind::Shipment => "Shipping",
        }
    }
}

impl fmt::Display for AddonKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// A priced addon such as shipping or a discount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Addon {
    pub kind: AddonKind,
    pub price: Price,
}

impl Addon {
    /// Read an addon from a top-level extraction, if it is one.
    pub fn from_extraction(extraction: &Extraction) -> Option<Self> {
        let kind = AddonKind::from_extraction_name(extraction.name.as_deref()?)?;
        match Price::from_extraction_string(&extraction.value) {
            Ok(price) => Some(Self { kind, price }),
            Err(e) => {
                trace!(%kind, "Ignoring addon with unparseable price: {}", e);
                None
            }
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind.display_name()
    }
}
