//! IBAN (International Bank Account Number) validation.

use super::patterns::IBAN_CHARSET;

/// Registered IBAN length per country code.
const IBAN_LENGTHS: &[(&str, usize)] = &[
    ("AD", 24), ("AE", 23), ("AL", 28), ("AT", 20), ("AZ", 28), ("BA", 20),
    ("BE", 16), ("BG", 22), ("BH", 22), ("BR", 29), ("CH", 21), ("CR", 21),
    ("CY", 28), ("CZ", 24), ("DE", 22), ("DK", 18), ("DO", 28), ("EE", 20),
    ("ES", 24), ("FI", 18), ("FO", 18), ("FR", 27), ("GB", 22), ("GE", 22),
    ("GI", 23), ("GL", 18), ("GR", 27), ("GT", 28), ("HR", 21), ("HU", 28),
    ("IE", 22), ("IL", 23), ("IS", 26), ("IT", 27), ("KW", 30), ("KZ", 20),
    ("LB", 28), ("LT", 20), ("LU", 20), ("LV", 21), ("MC", 27), ("MD", 24),
    ("ME", 22), ("MK", 19), ("MR", 27), ("MT", 31), ("MU", 30), ("NL", 18),
    ("NO", 15), ("PK", 24), ("PL", 28), ("PS", 29), ("PT", 25), ("RO", 24),
    ("RS", 22), ("SA", 24), ("SE", 24), ("SI", 19), ("SK", 24), ("SM", 27),
    ("TN", 24), ("TR", 26), ("VG", 24),
];

/// Registered length of IBANs issued in `country_code`.
pub fn iban_length(country_code: &str) -> Option<usize> {
    IBAN_LENGTHS
        .iter()
        .find(|(code, _)| *code == country_code)
        .map(|(_, len)| *len)
}

/// Validate an IBAN.
///
/// Spaces are ignored; letters must be uppercase. The country must be
/// known, the length must match the country and the mod-97 checksum must
/// equal 1.
pub fn validate_iban(iban: &str) -> bool {
    let iban: String = iban.chars().filter(|c| *c != ' ').collect();

    if !IBAN_CHARSET.is_match(&iban) {
        return false;
    }

    match iban_length(&iban[..2]) {
        Some(len) if len == iban.len() => {}
        _ => return false,
    }

    let rearranged = format!("{}{}", &iban[4..], &iban[..4]);
    mod97(&rearranged) == 1
}

/// Remainder of the IBAN number modulo 97, letters counting as 10..=35.
fn mod97(iban: &str) -> u32 {
    iban.chars().fold(0u32, |remainder, c| match c.to_digit(36) {
        Some(value) if value >= 10 => (remainder * 100 + value) % 97,
        Some(value) => (remainder * 10 + value) % 97,
        None => remainder,
    })
}

/// Format IBAN in groups of 4 characters.
pub fn format_iban(iban: &str) -> String {
    iban.chars()
        .filter(|c| !c.is_whitespace())
        .collect::<Vec<char>>()
        .chunks(4)
        .map(|chunk| chunk.iter().collect::<String>())
        .collect::<Vec<String>>()
        .join(" ")
}
