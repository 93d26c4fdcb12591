//! Phone number normalization and display formatting.
//!
//! The canonical form of a number is `+<digits>`; it is what gets stored
//! and what the click-to-chat link is built from. The display form only
//! groups digits for readability and is never used as an identity.

use crate::error::PhoneError;

/// Check that `code` is a plausible country calling code (1-3 digits, no `+`).
pub fn validate_country_code(code: &str) -> Result<&str, PhoneError> {
    let code = code.trim().trim_start_matches('+');
    if code.is_empty() || code.len() > 3 || !code.bytes().all(|b| b.is_ascii_digit()) {
        return Err(PhoneError::InvalidCountryCode(code.to_string()));
    }
    Ok(code)
}

/// Normalize a user-entered number to `+<digits>`.
///
/// Every character except digits and a leading `+` is dropped. Numbers
/// without a leading `+` get `country_code` prepended.
pub fn normalize(raw: &str, country_code: &str) -> Result<String, PhoneError> {
    let has_plus = raw.trim_start().starts_with('+');
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();

    if digits.is_empty() {
        return Err(PhoneError::Empty);
    }

    if has_plus {
        Ok(format!("+{digits}"))
    } else {
        let code = validate_country_code(country_code)?;
        Ok(format!("+{code}{digits}"))
    }
}

/// Group a canonical number for display.
///
/// `+91` numbers with ten national digits render as `+91 XXXXX XXXXX`;
/// single-digit country codes followed by ten digits as `+C XXX XXX XXXX`.
/// Anything else is returned unchanged.
pub fn display(canonical: &str) -> String {
    let Some(rest) = canonical.strip_prefix('+') else {
        return canonical.to_string();
    };
    if !rest.bytes().all(|b| b.is_ascii_digit()) {
        return canonical.to_string();
    }

    if let Some(national) = rest.strip_prefix("91") {
        if national.len() == 10 {
            return format!("+91 {} {}", &national[..5], &national[5..]);
        }
        return canonical.to_string();
    }

    if rest.len() == 11 {
        let (code, national) = rest.split_at(1);
        return format!(
            "+{code} {} {} {}",
            &national[..3],
            &national[3..6],
            &national[6..]
        );
    }

    canonical.to_string()
}

/// Digits of a number with everything else removed, as used in `wa.me` links.
pub fn digits_only(phone: &str) -> String {
    phone.chars().filter(|c| c.is_ascii_digit()).collect()
}
