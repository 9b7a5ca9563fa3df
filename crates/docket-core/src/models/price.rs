//! Monetary amounts as they appear in extraction results.

use std::fmt;
use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::PriceError;

lazy_static! {
    /// `<decimal>:<ISO 4217 code>`, e.g. `-12.30:EUR`.
    static ref EXTRACTION_STRING: Regex = Regex::new(r"^(-?[0-9]+(?:\.[0-9]+)?):([A-Za-z]{3})$").unwrap();
}

/// A decimal amount in a given currency.
///
/// The currency code is stored lowercase (`"eur"`), the extraction string
/// encoding uses the uppercase ISO 4217 code (`"39.99:EUR"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Price {
    pub value: Decimal,
    pub currency_code: String,
}

impl Price {
    pub fn new(value: Decimal, currency_code: impl AsRef<str>) -> Self {
        Self {
            value,
            currency_code: currency_code.as_ref().to_lowercase(),
        }
    }

    /// Zero in the given currency.
    pub fn zero(currency_code: impl AsRef<str>) -> Self {
        Self::new(Decimal::ZERO, currency_code)
    }

    /// Parse an extraction string such as `"12.30:EUR"` or `"-4:PLN"`.
    pub fn from_extraction_string(s: &str) -> Result<Self, PriceError> {
        let caps = EXTRACTION_STRING
            .captures(s)
            .ok_or_else(|| PriceError::Parse(s.to_string()))?;

        let value = Decimal::from_str(&caps[1]).map_err(|_| PriceError::Parse(s.to_string()))?;

        Ok(Self::new(value, &caps[2]))
    }

    /// Encode as an extraction string (`"<value>:<CODE>"`).
    pub fn extraction_string(&self) -> String {
        format!("{}:{}", self.value, self.currency_code.to_uppercase())
    }

    /// Add two prices of the same currency.
    pub fn try_add(&self, other: &Price) -> Result<Price, PriceError> {
        if self.currency_code != other.currency_code {
            return Err(PriceError::CurrencyMismatch {
                left: self.currency_code.clone(),
                right: other.currency_code.clone(),
            });
        }

        Ok(Price {
            value: self.value.checked_add(other.value).ok_or(PriceError::Overflow)?,
            currency_code: self.currency_code.clone(),
        })
    }

    /// Multiply by a quantity.
    pub fn try_mul(&self, quantity: u32) -> Result<Price, PriceError> {
        Ok(Price {
            value: self
                .value
                .checked_mul(Decimal::from(quantity))
                .ok_or(PriceError::Overflow)?,
            currency_code: self.currency_code.clone(),
        })
    }

    /// Sum prices, starting from zero in `currency_code`.
    pub fn sum<'a>(
        currency_code: &str,
        prices: impl IntoIterator<Item = &'a Price>,
    ) -> Result<Price, PriceError> {
        prices
            .into_iter()
            .try_fold(Price::zero(currency_code), |acc, price| acc.try_add(price))
    }

    /// Currency symbol used for display, falling back to the uppercase code.
    pub fn currency_symbol(&self) -> String {
        match self.currency_code.as_str() {
            "eur" => "€".to_string(),
            "usd" => "$".to_string(),
            "gbp" => "£".to_string(),
            "chf" => "CHF ".to_string(),
            "pln" => "zł ".to_string(),
            other => format!("{} ", other.to_uppercase()),
        }
    }
}

impl FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_extraction_string(s)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = self.value.round_dp(2);
        if value.is_sign_negative() && !value.is_zero() {
            write!(f, "-{}{:.2}", self.currency_symbol(), value.abs())
        } else {
            write!(f, "{}{:.2}", self.currency_symbol(), value.abs())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_value_init_lowercases_currency() {
        let price = Price::new(dec("0.98"), "EUR");
        assert_eq!(price.value, dec("0.98"));
        assert_eq!(price.currency_code, "eur");
    }

    #[test]
    fn test_extraction_string_parsing() {
        assert_eq!(Price::from_extraction_string("0:EUR").unwrap().value, Decimal::ZERO);
        assert_eq!(Price::from_extraction_string("0:EUR").unwrap().currency_code, "eur");
        assert_eq!(Price::from_extraction_string("0.45:PLN").unwrap().value, dec("0.45"));
        assert_eq!(Price::from_extraction_string("0.45:PLN").unwrap().currency_code, "pln");
        assert_eq!(Price::from_extraction_string("-0:EUR").unwrap().value, Decimal::ZERO);
        assert_eq!(Price::from_extraction_string("12.34:EUR").unwrap().value, dec("12.34"));
        assert_eq!(Price::from_extraction_string("-12.34:EUR").unwrap().value, dec("-12.34"));
        assert_eq!(Price::from_extraction_string("12.30:EUR").unwrap().value, dec("12.30"));
        assert_eq!(Price::from_extraction_string("12.3:EUR").unwrap().value, dec("12.30"));
    }

    #[test]
    fn test_extraction_string_rejects_garbage() {
        assert!(Price::from_extraction_string("").is_err());
        assert!(Price::from_extraction_string("bloop").is_err());
        assert!(Price::from_extraction_string("12.30").is_err());
        assert!(Price::from_extraction_string("12.30:EUR:USD").is_err());
        assert!(Price::from_extraction_string("abc:EUR").is_err());
        assert!(Price::from_extraction_string("1.00:").is_err());
    }

    #[test]
    fn test_extraction_string_encoding() {
        let price = Price::new(dec("39.99"), "eur");
        assert_eq!(price.extraction_string(), "39.99:EUR");
        assert_eq!(Price::from_extraction_string(&price.extraction_string()).unwrap(), price);
    }

    #[test]
    fn test_extraction_string_is_strict() {
        for input in ["+5:EUR", " 5:EUR", "5 : EUR", "1_000:EUR", "5:EURO", "5:EU", "1e3:EUR", ".5:EUR", "5.:EUR"] {
            assert_eq!(
                Price::from_extraction_string(input),
                Err(PriceError::Parse(input.to_string())),
                "{input}"
            );
        }
        assert_eq!(Price::from_extraction_string("5:eur").unwrap().currency_code, "eur");
    }

    #[test]
    fn test_multiplication_with_quantity() {
        assert_eq!(Price::zero("eur").try_mul(0), Ok(Price::zero("eur")));
        assert_eq!(Price::new(dec("100"), "eur").try_mul(0), Ok(Price::zero("eur")));
        assert_eq!(Price::new(dec("2"), "eur").try_mul(4), Ok(Price::new(dec("8"), "eur")));
        assert_eq!(Price::new(dec("39.99"), "eur").try_mul(3), Ok(Price::new(dec("119.97"), "eur")));
    }

    #[test]
    fn test_arithmetic_overflow() {
        let max = Price::from_extraction_string("79228162514264337593543950335:EUR").unwrap();
        assert_eq!(max.try_mul(2), Err(PriceError::Overflow));
        assert_eq!(max.try_mul(1), Ok(max.clone()));
        assert_eq!(max.try_add(&max), Err(PriceError::Overflow));
        assert_eq!(Price::sum("eur", [&max, &Price::new(dec("1"), "eur")]), Err(PriceError::Overflow));
    }

    #[test]
    fn test_addition() {
        assert_eq!(
            Price::zero("eur").try_add(&Price::zero("eur")).unwrap(),
            Price::zero("eur")
        );
        assert_eq!(
            Price::new(dec("1"), "eur").try_add(&Price::new(dec("2"), "eur")).unwrap(),
            Price::new(dec("3"), "eur")
        );
        assert_eq!(
            Price::new(dec("23"), "eur").try_add(&Price::new(dec("32"), "pln")),
            Err(PriceError::CurrencyMismatch {
                left: "eur".to_string(),
                right: "pln".to_string()
            })
        );
    }

    #[test]
    fn test_sum_empty_is_zero() {
        let prices: Vec<Price> = Vec::new();
        assert_eq!(Price::sum("eur", &prices).unwrap(), Price::zero("eur"));
    }

    #[test]
    fn test_display() {
        assert_eq!(Price::new(dec("12.3"), "eur").to_string(), "€12.30");
        assert_eq!(Price::new(dec("-5"), "usd").to_string(), "-$5.00");
        assert_eq!(Price::new(dec("1"), "sek").to_string(), "SEK 1.00");
    }
}
