//! Payment parameter extraction per QR code format.

use std::collections::BTreeMap;

use tracing::trace;

use super::iban::validate_iban;
use super::patterns::CURRENCY_PREFIXED_AMOUNT;
use super::{
    split_lines, QrCodeFormat, DEFAULT_CURRENCY, PARAM_AMOUNT_TO_PAY, PARAM_BIC, PARAM_EPS_URL,
    PARAM_IBAN, PARAM_PAYMENT_RECIPIENT, PARAM_PAYMENT_REFERENCE,
};

/// EPC069-12 line numbers.
mod epc {
    pub const BIC: usize = 4;
    pub const RECIPIENT: usize = 5;
    pub const IBAN: usize = 6;
    pub const AMOUNT: usize = 7;
    pub const REFERENCE: usize = 9;
}

/// Extract payment parameters from a scanned string of a known format.
pub fn extract_parameters(scanned: &str, format: QrCodeFormat) -> BTreeMap<String, String> {
    extract_parameters_with_currency(scanned, format, DEFAULT_CURRENCY)
}

/// Like [`extract_parameters`], using `default_currency` for bezahlcodes
/// that carry an amount but no currency.
pub fn extract_parameters_with_currency(
    scanned: &str,
    format: QrCodeFormat,
    default_currency: &str,
) -> BTreeMap<String, String> {
    let parameters = match format {
        QrCodeFormat::Bezahlcode => from_bezahlcode(scanned, default_currency),
        QrCodeFormat::Epc06912 => from_epc(scanned),
        QrCodeFormat::Eps4Mobile => {
            BTreeMap::from([(PARAM_EPS_URL.to_string(), scanned.to_string())])
        }
    };

    trace!(%format, count = parameters.len(), "Extracted payment parameters");
    parameters
}

fn from_bezahlcode(scanned: &str, default_currency: &str) -> BTreeMap<String, String> {
    let query = query_parameters(scanned);
    let mut parameters = BTreeMap::new();

    if let Some(bic) = query.get("bic") {
        parameters.insert(PARAM_BIC.to_string(), bic.clone());
    }
    if let Some(name) = query.get("name") {
        parameters.insert(PARAM_PAYMENT_RECIPIENT.to_string(), name.clone());
    }
    if let Some(iban) = query.get("iban").filter(|iban| validate_iban(iban)) {
        parameters.insert(PARAM_IBAN.to_string(), iban.clone());
    }
    if let Some(reason) = query.get("reason").or_else(|| query.get("reason1")) {
        parameters.insert(PARAM_PAYMENT_REFERENCE.to_string(), reason.clone());
    }
    if let Some(amount) = query.get("amount") {
        let currency = query
            .get("currency")
            .map(String::as_str)
            .unwrap_or(default_currency);
        if let Some(amount) = normalize_amount(amount, Some(currency)) {
            parameters.insert(PARAM_AMOUNT_TO_PAY.to_string(), amount);
        }
    }

    parameters
}

fn from_epc(scanned: &str) -> BTreeMap<String, String> {
    let lines = split_lines(scanned);
    let line = |index: usize| lines.get(index).copied().unwrap_or("");
    let mut parameters = BTreeMap::new();

    for (index, key) in [
        (epc::BIC, PARAM_BIC),
        (epc::RECIPIENT, PARAM_PAYMENT_RECIPIENT),
        (epc::REFERENCE, PARAM_PAYMENT_REFERENCE),
    ] {
        if !line(index).is_empty() {
            parameters.insert(key.to_string(), line(index).to_string());
        }
    }

    if validate_iban(line(epc::IBAN)) {
        parameters.insert(PARAM_IBAN.to_string(), line(epc::IBAN).to_string());
    }

    if let Some(amount) = normalize_amount(line(epc::AMOUNT), None) {
        parameters.insert(PARAM_AMOUNT_TO_PAY.to_string(), amount);
    }

    parameters
}

/// Turn an amount into the `"<amount>:<CURRENCY>"` extraction form.
///
/// A 3-letter prefix (`"EUR1456.89"`) names the currency; otherwise
/// `currency` is used. Returns `None` when neither is available.
pub fn normalize_amount(amount: &str, currency: Option<&str>) -> Option<String> {
    if let Some(caps) = CURRENCY_PREFIXED_AMOUNT.captures(amount) {
        return Some(format!("{}:{}", &caps[2], &caps[1]));
    }

    currency.map(|currency| format!("{}:{}", amount, currency))
}

/// Decoded query parameters of a URL. The first occurrence of a key wins.
fn query_parameters(url: &str) -> BTreeMap<String, String> {
    let Some((_, query)) = url.split_once('?') else {
        return BTreeMap::new();
    };
    let query = query.split('#').next().unwrap_or_default();

    let mut parameters = BTreeMap::new();
    for pair in query.split('&').filter(|pair| !pair.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        parameters
            .entry(percent_decode(key))
            .or_insert_with(|| percent_decode(value));
    }
    parameters
}

/// Decode `%XX` escapes. Malformed escapes are kept verbatim.
fn percent_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let (hi, lo) = (bytes[i + 1], bytes[i + 2]);
            if hi.is_ascii_hexdigit() && lo.is_ascii_hexdigit() {
                decoded.push((hex_value(hi) << 4) | hex_value(lo));
                i += 3;
                continue;
            }
        }
        decoded.push(bytes[i]);
        i += 1;
    }

    String::from_utf8_lossy(&decoded).into_owned()
}

fn hex_value(digit: u8) -> u8 {
    match digit {
        b'0'..=b'9' => digit - b'0',
        b'a'..=b'f' => digit - b'a' + 10,
        _ => digit - b'A' + 10,
    }
}
