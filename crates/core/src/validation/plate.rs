//! Turkish licence plate format.
//!
//! A plate is two digits (province code 01-81), one to three letters and
//! one to four digits. Q, W and X are not part of the Turkish alphabet and
//! never appear in the letter group.

use std::sync::LazyLock;

use regex::Regex;

pub const PLATE_MIN_LEN: usize = 7;
pub const PLATE_MAX_LEN: usize = 9;
pub const MIN_REGION_CODE: u8 = 1;
pub const MAX_REGION_CODE: u8 = 81;

const FORBIDDEN_LETTERS: [char; 3] = ['Q', 'W', 'X'];

static PLATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{2}[A-Z]{1,3}[0-9]{1,4}$").expect("valid regex"));
static PLATE_SINGLE_LETTER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{2}[A-Z][0-9]{4}$").expect("valid regex"));

/// Remove spaces and uppercase, the form the format check runs against.
pub fn compact_plate(raw: &str) -> String {
    raw.chars()
        .filter(|c| *c != ' ')
        .collect::<String>()
        .to_uppercase()
}

/// Whether `raw` is an acceptable plate. Sub-checks are not itemized; any
/// failure rejects the whole plate.
pub fn is_valid_license_plate(raw: &str) -> bool {
    let plate = compact_plate(raw);

    let len = plate.chars().count();
    if !(PLATE_MIN_LEN..=PLATE_MAX_LEN).contains(&len) {
        return false;
    }

    if !(PLATE_RE.is_match(&plate) || PLATE_SINGLE_LETTER_RE.is_match(&plate)) {
        return false;
    }

    // The regex guarantees ASCII from here on.
    let Some(region) = plate.get(..2).and_then(|code| code.parse::<u8>().ok()) else {
        return false;
    };
    if !(MIN_REGION_CODE..=MAX_REGION_CODE).contains(&region) {
        return false;
    }

    !plate
        .chars()
        .skip(2)
        .take_while(char::is_ascii_uppercase)
        .any(|c| FORBIDDEN_LETTERS.contains(&c))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_common_formats() {
        for plate in ["34ABC123", "06A1234", "35AB1234", "01ABC12", "81A1234"] {
            assert!(is_valid_license_plate(plate), "{plate} should be valid");
        }
    }

    #[test]
    fn strips_spaces_and_uppercases() {
        assert!(is_valid_license_plate("34 abc 123"));
        assert!(is_valid_license_plate(" 06 a 1234 "));
    }

    #[test]
    fn rejects_length_outside_bounds() {
        assert!(!is_valid_license_plate("34AB12"));
        assert!(!is_valid_license_plate("34ABC12345"));
    }

    #[test]
    fn rejects_region_codes_outside_range() {
        assert!(!is_valid_license_plate("00ABC123"));
        assert!(!is_valid_license_plate("82ABC123"));
        assert!(!is_valid_license_plate("99A1234"));
    }

    #[test]
    fn rejects_letters_outside_alphabet() {
        assert!(!is_valid_license_plate("34QAB123"));
        assert!(!is_valid_license_plate("34AWB123"));
        assert!(!is_valid_license_plate("34X1234"));
    }

    #[test]
    fn rejects_malformed_layouts() {
        assert!(!is_valid_license_plate("ABC34123"));
        assert!(!is_valid_license_plate("34ABCD12"));
        assert!(!is_valid_license_plate("3A4BC123"));
        assert!(!is_valid_license_plate("34ABC-12"));
        assert!(!is_valid_license_plate(""));
    }

    #[test]
    fn rejects_non_ascii_digits() {
        assert!(!is_valid_license_plate("٣٤ABC123"));
    }
}
