//! Digital invoice review.
//!
//! A [`DigitalInvoice`] is built from an [`ExtractionResult`] that carries
//! line items. The user may deselect items (with a [`ReturnReason`]) or edit
//! their name, quantity and price. [`DigitalInvoice::extraction_result`]
//! writes the edits back into the extraction format without losing any of
//! the fields this module does not interpret.

mod addon;
mod line_item;

pub use addon::{Addon, AddonKind};
pub use line_item::{
    LineItem, ReturnReason, SelectedState, KEY_BASE_GROSS, KEY_DESCRIPTION, KEY_GROSS_PRICE,
    KEY_QUANTITY,
};

use rust_decimal::Decimal;
use tracing::debug;

use crate::error::InvoiceError;
use crate::models::extraction::{Extraction, ExtractionResult};
use crate::models::price::Price;

/// Result type for invoice operations.
pub type Result<T> = std::result::Result<T, InvoiceError>;

/// Top-level extraction names read by the lookups.
pub const KEY_AMOUNT_TO_PAY: &str = "amountToPay";
pub const KEY_PAYMENT_RECIPIENT: &str = "paymentRecipient";
pub const KEY_IBAN: &str = "iban";
pub const KEY_PAYMENT_REFERENCE: &str = "paymentReference";

/// Line items, addons and the untouched top-level extractions of one invoice.
#[derive(Debug, Clone, PartialEq)]
pub struct DigitalInvoice {
    pub line_items: Vec<LineItem>,
    pub addons: Vec<Addon>,
    extractions: Vec<Extraction>,
}

impl DigitalInvoice {
    /// Parse an extraction result. Fails if it has no line items or any
    /// line item cannot be parsed.
    pub fn new(result: ExtractionResult) -> Result<Self> {
        let groups = match result.line_items {
            Some(groups) if !groups.is_empty() => groups,
            _ => return Err(InvoiceError::NoLineItems),
        };

        let line_items = groups
            .into_iter()
            .map(LineItem::from_extractions)
            .collect::<Result<Vec<_>>>()?;

        let addons: Vec<Addon> = result
            .extractions
            .iter()
            .filter_map(Addon::from_extraction)
            .collect();

        debug!(
            line_items = line_items.len(),
            addons = addons.len(),
            "Parsed digital invoice"
        );

        Ok(Self {
            line_items,
            addons,
            extractions: result.extractions,
        })
    }

    /// Top-level extractions as received.
    pub fn extractions(&self) -> &[Extraction] {
        &self.extractions
    }

    pub fn line_item(&self, index: usize) -> Result<&LineItem> {
        self.line_items
            .get(index)
            .ok_or(InvoiceError::InvalidLineItem(index))
    }

    pub fn line_item_mut(&mut self, index: usize) -> Result<&mut LineItem> {
        self.line_items
            .get_mut(index)
            .ok_or(InvoiceError::InvalidLineItem(index))
    }

    pub fn select(&mut self, index: usize) -> Result<()> {
        self.line_item_mut(index)?.select();
        Ok(())
    }

    pub fn deselect(&mut self, index: usize, reason: ReturnReason) -> Result<()> {
        self.line_item_mut(index)?.deselect(reason);
        debug!(index, reason = reason.key(), "Deselected line item");
        Ok(())
    }

    /// Currency of the invoice, taken from the first line item.
    pub fn currency_code(&self) -> &str {
        self.line_items
            .first()
            .map(|item| item.price.currency_code.as_str())
            .unwrap_or("eur")
    }

    /// Sum of the selected line items' totals.
    pub fn line_items_total(&self) -> Result<Price> {
        let totals = self
            .line_items
            .iter()
            .filter(|item| item.is_selected())
            .map(LineItem::total_price)
            .collect::<std::result::Result<Vec<Price>, _>>()?;

        Ok(Price::sum(self.currency_code(), &totals)?)
    }

    /// Selected line items plus all addons.
    pub fn total(&self) -> Result<Price> {
        let line_items_total = self.line_items_total()?;
        let addons: Vec<&Price> = self.addons.iter().map(|addon| &addon.price).collect();

        addons
            .into_iter()
            .try_fold(line_items_total, |acc, price| acc.try_add(price))
            .map_err(InvoiceError::from)
    }

    /// Quantity of all selected line items.
    pub fn num_selected(&self) -> u64 {
        self.line_items
            .iter()
            .filter(|item| item.is_selected())
            .map(|item| u64::from(item.quantity))
            .sum()
    }

    /// Quantity of all line items.
    pub fn num_total(&self) -> u64 {
        self.line_items.iter().map(|item| u64::from(item.quantity)).sum()
    }

    pub fn amount_to_pay(&self) -> Option<Price> {
        self.value_of(KEY_AMOUNT_TO_PAY)
            .and_then(|value| Price::from_extraction_string(value).ok())
    }

    pub fn payment_recipient(&self) -> Option<&str> {
        self.value_of(KEY_PAYMENT_RECIPIENT)
    }

    pub fn iban(&self) -> Option<&str> {
        self.value_of(KEY_IBAN)
    }

    pub fn payment_reference(&self) -> Option<&str> {
        self.value_of(KEY_PAYMENT_REFERENCE)
    }

    fn value_of(&self, name: &str) -> Option<&str> {
        crate::models::extraction::find_value(&self.extractions, name)
    }

    /// Write the reviewed invoice back into the extraction format.
    ///
    /// Top-level extractions are returned unchanged. Each line-item group
    /// is the original group with description, quantity and price updated.
    pub fn extraction_result(&self) -> ExtractionResult {
        ExtractionResult::new(
            self.extractions.clone(),
            Some(self.line_items.iter().map(LineItem::extractions).collect()),
        )
    }

    /// Check the invoice for problems worth showing before payment.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if self.num_selected() == 0 {
            issues.push("No line items selected".to_string());
        }

        for (index, item) in self.line_items.iter().enumerate() {
            if item.name.trim().is_empty() {
                issues.push(format!("Line item {} has no name", index + 1));
            }
            if item.is_selected() && item.quantity == 0 {
                issues.push(format!("Line item {} has zero quantity", index + 1));
            }
        }

        if self.iban().is_none() {
            issues.push("Missing IBAN".to_string());
        }

        if self.payment_recipient().is_none() {
            issues.push("Missing payment recipient".to_string());
        }

        match self.total() {
            Ok(total) => {
                if let Some(amount_to_pay) = self.amount_to_pay() {
                    if amount_to_pay.currency_code != total.currency_code {
                        issues.push(format!(
                            "Amount to pay is in {} but line items are in {}",
                            amount_to_pay.currency_code.to_uppercase(),
                            total.currency_code.to_uppercase()
                        ));
                    } else if (amount_to_pay.value - total.value).abs() > Decimal::new(1, 2) {
                        issues.push(format!(
                            "Total ({}) differs from amount to pay ({})",
                            total, amount_to_pay
                        ));
                    }
                }
            }
            Err(e) => issues.push(format!("Cannot compute total: {}", e)),
        }

        issues
    }
}

impl TryFrom<ExtractionResult> for DigitalInvoice {
    type Error = InvoiceError;

    fn try_from(result: ExtractionResult) -> Result<Self> {
        DigitalInvoice::new(result)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::models::extraction::{Extraction, ExtractionBox, ExtractionResult};

    pub fn amount_to_pay_box() -> ExtractionBox {
        ExtractionBox {
            height: 9.0,
            left: 516.0,
            page: 1,
            top: 588.0,
            width: 42.0,
        }
    }

    pub fn line_item_box() -> ExtractionBox {
        ExtractionBox {
            height: 9.0,
            left: 72.0,
            page: 1,
            top: 347.11,
            width: 5.0,
        }
    }

    pub fn group(price: &str, description: &str, art_number: &str, quantity: &str) -> Vec<Extraction> {
        vec![
            Extraction::new("grossPrice", "amount", price),
            Extraction::new("description", "text", description),
            Extraction::new("artNumber", "idnumber", art_number),
            Extraction::new("quantity", "number", quantity),
        ]
    }

    /// Three clothing items, 9 pieces in total.
    pub fn clothing_order() -> ExtractionResult {
        let mut first = group("39.99:EUR", "CORE ICON - Sweatjacke - emerald", "H0422S039-M11000L000", "3");
        first[0] = first[0].clone().with_box(line_item_box());

        ExtractionResult::new(
            vec![Extraction::new("amountToPay", "amount", "24.99:EUR").with_box(amount_to_pay_box())],
            Some(vec![
                first,
                group("34.99:EUR", "Strickpullover - yellow", "YO122Q047-E11000L000", "1"),
                group(
                    "49.99:EUR",
                    "JPRDEEP CREW NECK - Strickpullover - vintage indigo",
                    "JAM22Q01E-K11000L000",
                    "5",
                ),
            ]),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    /// The clothing order with the first item returned for arriving too late.
    fn example_invoice() -> DigitalInvoice {
        let mut invoice = DigitalInvoice::new(fixtures::clothing_order()).unwrap();
        invoice.deselect(0, ReturnReason::ArrivedTooLate).unwrap();
        invoice
    }

    #[test]
    fn test_requires_line_items() {
        assert_eq!(
            DigitalInvoice::new(ExtractionResult::new(Vec::new(), None)),
            Err(InvoiceError::NoLineItems)
        );
        assert_eq!(
            DigitalInvoice::try_from(ExtractionResult::new(Vec::new(), Some(Vec::new()))),
            Err(InvoiceError::NoLineItems)
        );
    }

    #[test]
    fn test_bad_line_item_fails_construction() {
        let mut result = fixtures::clothing_order();
        result.line_items.as_mut().unwrap()[1].retain(|e| !e.is_named("quantity"));
        assert_eq!(DigitalInvoice::new(result), Err(InvoiceError::QuantityMissing));
    }

    #[test]
    fn test_total() {
        assert_eq!(example_invoice().total().unwrap(), Price::new(dec("284.94"), "eur"));
    }

    #[test]
    fn test_counts() {
        let invoice = example_invoice();
        assert_eq!(invoice.num_selected(), 6);
        assert_eq!(invoice.num_total(), 9);
    }

    #[test]
    fn test_reselect_counts_again() {
        let mut invoice = example_invoice();
        invoice.select(0).unwrap();
        assert_eq!(invoice.num_selected(), 9);
        assert_eq!(invoice.total().unwrap(), Price::new(dec("404.91"), "eur"));
    }

    #[test]
    fn test_invalid_index() {
        let mut invoice = example_invoice();
        assert_eq!(
            invoice.deselect(3, ReturnReason::Damaged),
            Err(InvoiceError::InvalidLineItem(3))
        );
        assert!(invoice.line_item(2).is_ok());
    }

    #[test]
    fn test_extraction_result_preserves_extractions() {
        let result = example_invoice().extraction_result();

        assert_eq!(result.extractions.len(), 1);
        assert_eq!(
            result.extractions[0],
            Extraction::new("amountToPay", "amount", "24.99:EUR").with_box(fixtures::amount_to_pay_box())
        );

        let line_items = result.line_items.unwrap();
        assert_eq!(line_items.len(), 3);
        assert_eq!(line_items[0][0].bounding_box, Some(fixtures::line_item_box()));
        assert_eq!(line_items[0][3].value, "0");
        assert_eq!(line_items[2][3].value, "5");
    }

    #[test]
    fn test_extraction_result_reparses_to_same_state() {
        let mut invoice = DigitalInvoice::new(fixtures::clothing_order()).unwrap();
        invoice.line_item_mut(1).unwrap().quantity = 2;

        let reparsed = DigitalInvoice::new(invoice.extraction_result()).unwrap();
        assert_eq!(reparsed.num_total(), 10);
        assert_eq!(reparsed.line_items[1].quantity, 2);
        assert_eq!(reparsed.total().unwrap(), invoice.total().unwrap());
    }

    #[test]
    fn test_addons_count_towards_total() {
        let mut result = fixtures::clothing_order();
        result.extractions.push(Extraction::new("shipment-addon", "amount", "4.95:EUR"));
        result.extractions.push(Extraction::new("discount-addon", "amount", "-10.00:EUR"));

        let mut invoice = DigitalInvoice::new(result).unwrap();
        invoice.deselect(0, ReturnReason::ArrivedTooLate).unwrap();

        assert_eq!(invoice.addons.len(), 2);
        assert_eq!(invoice.line_items_total().unwrap(), Price::new(dec("284.94"), "eur"));
        assert_eq!(invoice.total().unwrap(), Price::new(dec("279.89"), "eur"));
        // Addons stay in the top-level extractions
        assert_eq!(invoice.extraction_result().extractions.len(), 3);
    }

    #[test]
    fn test_overflowing_total_is_an_error() {
        let result = ExtractionResult::new(
            Vec::new(),
            Some(vec![fixtures::group("79228162514264337593543950335:EUR", "Gold bar", "G1", "2")]),
        );
        let mut invoice = DigitalInvoice::new(result).unwrap();

        assert!(matches!(
            invoice.line_items_total(),
            Err(InvoiceError::Price(crate::error::PriceError::Overflow))
        ));
        assert!(matches!(
            invoice.total(),
            Err(InvoiceError::Price(crate::error::PriceError::Overflow))
        ));

        invoice.deselect(0, ReturnReason::Damaged).unwrap();
        assert_eq!(invoice.total().unwrap(), Price::zero("eur"));
    }

    #[test]
    fn test_counts_beyond_u32() {
        let result = ExtractionResult::new(
            Vec::new(),
            Some(vec![
                fixtures::group("1.00:EUR", "Screw", "S1", "4000000000"),
                fixtures::group("1.00:EUR", "Nut", "N1", "4000000000"),
            ]),
        );
        let mut invoice = DigitalInvoice::new(result).unwrap();
        assert_eq!(invoice.num_total(), 8_000_000_000);

        invoice.deselect(1, ReturnReason::Damaged).unwrap();
        assert_eq!(invoice.num_selected(), 4_000_000_000);
        assert!(invoice.num_selected() <= invoice.num_total());
    }

    #[test]
    fn test_currency_mismatch() {
        let mut invoice = example_invoice();
        invoice.line_items[2].price = Price::new(dec("49.99"), "pln");
        assert!(matches!(
            invoice.total(),
            Err(InvoiceError::Price(crate::error::PriceError::CurrencyMismatch { .. }))
        ));
    }

    #[test]
    fn test_lookups() {
        let mut result = fixtures::clothing_order();
        result.extractions.push(Extraction::new("iban", "iban", "DE89370400440532013000"));
        result.extractions.push(Extraction::new("paymentRecipient", "companyname", "Zalando SE"));
        result.extractions.push(Extraction::new("paymentReference", "reference", "10203040"));
        let invoice = DigitalInvoice::new(result).unwrap();

        assert_eq!(invoice.amount_to_pay(), Some(Price::new(dec("24.99"), "eur")));
        assert_eq!(invoice.iban(), Some("DE89370400440532013000"));
        assert_eq!(invoice.payment_recipient(), Some("Zalando SE"));
        assert_eq!(invoice.payment_reference(), Some("10203040"));
    }

    #[test]
    fn test_validate() {
        let invoice = example_invoice();
        let issues = invoice.validate();
        assert!(issues.contains(&"Total (€284.94) differs from amount to pay (€24.99)".to_string()));
        assert!(issues.contains(&"Missing IBAN".to_string()));

        let mut invoice = example_invoice();
        for index in 0..3 {
            invoice.deselect(index, ReturnReason::Damaged).unwrap();
        }
        assert!(invoice.validate().contains(&"No line items selected".to_string()));
    }
}
