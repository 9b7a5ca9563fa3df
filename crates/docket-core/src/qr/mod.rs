//! Payment QR codes.
//!
//! Supported payloads:
//! - Bezahlcode (`bank://singlepaymentsepa?...`)
//! - EPC069-12 / GiroCode (line based, `BCD` service tag)
//! - EPS e-payment (`epspayment://...`)
//!
//! [`QrCodeFormat::classify`] recognises the payload, [`extract_parameters`]
//! pulls out the payment fields and [`parse_payment_code`] combines both
//! and checks that the fields needed for a transfer are present.

mod detector;
mod extract;
pub mod iban;
pub mod patterns;

pub use detector::{detect_qr_codes, QrDetector};
pub use extract::{extract_parameters, extract_parameters_with_currency, normalize_amount};
pub use iban::{format_iban, validate_iban};

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ValidationError;
use patterns::{EPC_CHARACTER_SET, EPC_VERSION};

/// Currency assumed for bezahlcodes without a `currency` parameter.
pub const DEFAULT_CURRENCY: &str = "EUR";

/// Parameter keys written into the extracted payment data.
pub const PARAM_BIC: &str = "bic";
pub const PARAM_PAYMENT_RECIPIENT: &str = "paymentRecipient";
pub const PARAM_IBAN: &str = "iban";
pub const PARAM_PAYMENT_REFERENCE: &str = "paymentReference";
pub const PARAM_AMOUNT_TO_PAY: &str = "amountToPay";
pub const PARAM_EPS_URL: &str = "epsPaymentQRCodeUrl";

const BEZAHLCODE_SCHEME: &str = "bank://";
const EPS_SCHEME: &str = "epspayment://";
/// An EPC payload has more lines than this.
const EPC_MIN_LINES: usize = 9;

/// Recognised payment QR code formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QrCodeFormat {
    Bezahlcode,
    Epc06912,
    Eps4Mobile,
}

impl QrCodeFormat {
    /// Classify a scanned string, or `None` if it is not a payment code.
    pub fn classify(scanned: &str) -> Option<Self> {
        if scanned.starts_with(BEZAHLCODE_SCHEME) {
            return Some(QrCodeFormat::Bezahlcode);
        }
        if scanned.starts_with(EPS_SCHEME) {
            return Some(QrCodeFormat::Eps4Mobile);
        }

        let lines = split_lines(scanned);
        if lines.len() > EPC_MIN_LINES && EPC_VERSION.is_match(lines[1]) {
            if !EPC_CHARACTER_SET.is_match(lines[2]) {
                warn!(
                    "Character set {:?} is unknown, expected version 1 or 2",
                    lines[2]
                );
            }
            return Some(QrCodeFormat::Epc06912);
        }

        None
    }

    /// Parameter that must be present for the code to be usable.
    pub fn required_parameter(&self) -> &'static str {
        match self {
            QrCodeFormat::Bezahlcode | QrCodeFormat::Epc06912 => PARAM_IBAN,
            QrCodeFormat::Eps4Mobile => PARAM_EPS_URL,
        }
    }
}

impl fmt::Display for QrCodeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QrCodeFormat::Bezahlcode => write!(f, "bezahlcode"),
            QrCodeFormat::Epc06912 => write!(f, "epc06912"),
            QrCodeFormat::Eps4Mobile => write!(f, "eps4mobile"),
        }
    }
}

/// A classified payment code with its extracted parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentCode {
    pub format: QrCodeFormat,
    pub parameters: BTreeMap<String, String>,
}

impl PaymentCode {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).map(String::as_str)
    }

    /// Whether the parameter required by the format is present.
    pub fn is_complete(&self) -> bool {
        self.parameters.contains_key(self.format.required_parameter())
    }
}

/// Classify and extract a payment code.
///
/// Fails with [`ValidationError::QrCodeFormatNotValid`] if the payload is
/// not a known format or lacks the parameter its format requires.
pub fn parse_payment_code(scanned: &str) -> Result<PaymentCode, ValidationError> {
    let format = QrCodeFormat::classify(scanned).ok_or_else(|| {
        debug!("QR payload is not a payment code");
        ValidationError::QrCodeFormatNotValid
    })?;

    let code = PaymentCode {
        format,
        parameters: extract_parameters(scanned, format),
    };

    if !code.is_complete() {
        debug!(%format, "Payment code is missing {}", format.required_parameter());
        return Err(ValidationError::QrCodeFormatNotValid);
    }

    Ok(code)
}

/// Split on line breaks, keeping empty lines.
pub(crate) fn split_lines(s: &str) -> Vec<&str> {
    s.split('\n').map(|line| line.trim_end_matches('\r')).collect()
}

#[cfg(test)]
pub(crate) mod samples {
    pub const BEZAHLCODE: &str = "bank://singlepaymentsepa?name=Gini%20Online%20Shop&reason=A12345-6789&iban=DE89370400440532013000&bic=GINIBICXXX&amount=47%2C65&currency=EUR";

    pub const EPC: &str = "BCD\n001\n2\nSCT\nGENODEF1KIL\nMax Mustermann\nDE52210900070088299309\nEUR1456.89\n\n457845789452\n\nDiverse Autoteile, Re 789452 KN 457845";

    pub const EPS: &str = "epspayment://eps.or.at/?transactionid=epsJUW26JIS8";
}
