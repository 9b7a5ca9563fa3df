//! Regex patterns for payment QR code payloads.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Country code, check digits, then an uppercase alphanumeric BBAN
    pub static ref IBAN_CHARSET: Regex = Regex::new(
        r"^[A-Z]{2}[0-9]{2}[A-Z0-9]+$"
    ).unwrap();

    // Amount carrying its currency as a 3-letter prefix, e.g. "EUR1456.89"
    pub static ref CURRENCY_PREFIXED_AMOUNT: Regex = Regex::new(
        r"^([A-Za-z]{3})(.*)$"
    ).unwrap();

    // EPC header lines: service tag, version, character set
    pub static ref EPC_VERSION: Regex = Regex::new(
        r"^00[12]$"
    ).unwrap();

    pub static ref EPC_CHARACTER_SET: Regex = Regex::new(
        r"^[12]$"
    ).unwrap();
}
