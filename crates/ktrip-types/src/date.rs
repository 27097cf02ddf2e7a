use chrono::NaiveDate;

use crate::{Result, ValidationError};

const ISO_FORMAT: &str = "%Y-%m-%d";
const TOKEN_FORMAT: &str = "%Y%m%d";

/// Validate a `YYYYMMDD` token and return it trimmed.
pub fn normalize_date_token(token: &str) -> Result<String> {
    let token = token.trim();
    if token.len() != 8 || !token.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::InvalidDateToken(token.to_string()));
    }
    NaiveDate::parse_from_str(token, TOKEN_FORMAT)
        .map_err(|_| ValidationError::InvalidDateToken(token.to_string()))?;
    Ok(token.to_string())
}

/// Convert `20260216` into `2026-02-16`.
pub fn date_token_to_iso(token: &str) -> Result<String> {
    let token = normalize_date_token(token)?;
    Ok(format!("{}-{}-{}", &token[0..4], &token[4..6], &token[6..8]))
}

pub fn parse_date_token(token: &str) -> Result<NaiveDate> {
    let token = normalize_date_token(token)?;
    NaiveDate::parse_from_str(&token, TOKEN_FORMAT)
        .map_err(|_| ValidationError::InvalidDateToken(token))
}

/// Parse a stored `YYYY-MM-DD` date.
///
/// The length check rejects the unpadded forms chrono would otherwise accept
/// (`2026-2-16`), which would break date equality in the store.
pub fn parse_iso_date(value: &str) -> Result<NaiveDate> {
    let value = value.trim();
    if value.len() != 10 {
        return Err(ValidationError::InvalidDate(value.to_string()));
    }
    NaiveDate::parse_from_str(value, ISO_FORMAT)
        .map_err(|_| ValidationError::InvalidDate(value.to_string()))
}

pub fn format_iso_date(date: NaiveDate) -> String {
    date.format(ISO_FORMAT).to_string()
}

/// Lenient date reader for historical exports: accepts ISO dates and
/// `YYYYMMDD` tokens, anything else yields `None`.
pub fn normalize_legacy_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    parse_iso_date(value)
        .ok()
        .or_else(|| parse_date_token(value).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_token_to_iso() {
        assert_eq!(date_token_to_iso("20260216").unwrap(), "2026-02-16");
        assert_eq!(date_token_to_iso(" 20260216 ").unwrap(), "2026-02-16");
    }

    #[test]
    fn test_date_token_rejects_malformed_input() {
        assert!(normalize_date_token("2026-02-16").is_err());
        assert!(normalize_date_token("2026021").is_err());
        assert_eq!(
            normalize_date_token("20260230"),
            Err(ValidationError::InvalidDateToken("20260230".to_string()))
        );
    }

    #[test]
    fn test_parse_iso_date_requires_padding() {
        assert!(parse_iso_date("2026-02-16").is_ok());
        assert!(parse_iso_date("2026-2-16").is_err());
        assert!(parse_iso_date("16/02/2026").is_err());
    }

    #[test]
    fn test_normalize_legacy_date() {
        let expected = NaiveDate::from_ymd_opt(2026, 2, 16);
        assert_eq!(normalize_legacy_date("2026-02-16"), expected);
        assert_eq!(normalize_legacy_date("20260216"), expected);
        assert_eq!(normalize_legacy_date(""), None);
        assert_eq!(normalize_legacy_date("yesterday"), None);
    }
}
