//! Numeric normalization helpers shared by the HTML-scraping providers.
//!
//! The Korean quote pages format numbers with thousands separators and
//! express the sign of the daily change with a textual marker instead of
//! a minus sign. Everything here is pure so fixtures can be tested
//! without network access.

use chrono::NaiveDate;
use rust_decimal::Decimal;

/// Korean down-marker found in the change cell of the daily quote table.
const DOWN_MARKER: &str = "하락";

/// Parses a decimal from a cell that may carry thousands separators and
/// surrounding whitespace. Returns `None` for empty or unparsable cells.
pub fn parse_decimal(raw: &str) -> Option<Decimal> {
    let cleaned = raw.trim().replace(',', "");
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<Decimal>().ok()
}

/// Parses an integer volume cell, stripping separators.
pub fn parse_volume(raw: &str) -> Option<i64> {
    let cleaned = raw.trim().replace(',', "");
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<i64>().ok()
}

/// Parses the daily change cell. The page renders the magnitude with a
/// textual direction marker; "하락" means the close moved down, so the
/// parsed magnitude gets its sign flipped.
pub fn parse_signed_change(raw: &str) -> Option<Decimal> {
    let is_down = raw.contains(DOWN_MARKER);
    let digits: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    if digits.is_empty() {
        return None;
    }
    let value = digits.parse::<Decimal>().ok()?;
    Some(if is_down { -value } else { value })
}

/// Parses a percentage cell such as `"+1.25%"` or `"-0.40%"`.
pub fn parse_percent(raw: &str) -> Option<Decimal> {
    let cleaned = raw.trim().trim_end_matches('%').replace(',', "");
    if cleaned.is_empty() {
        return None;
    }
    cleaned.trim_start_matches('+').parse::<Decimal>().ok()
}

/// Parses a date in the `YYYY.MM.DD` style the Korean quote pages use.
pub fn parse_dotted_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y.%m.%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_decimal_strips_separators() {
        assert_eq!(parse_decimal("71,300"), Some(dec!(71300)));
        assert_eq!(parse_decimal(" 1,234,567 "), Some(dec!(1234567)));
        assert_eq!(parse_decimal("0"), Some(dec!(0)));
    }

    #[test]
    fn test_parse_decimal_rejects_garbage() {
        assert_eq!(parse_decimal(""), None);
        assert_eq!(parse_decimal("  "), None);
        assert_eq!(parse_decimal("N/A"), None);
    }

    #[test]
    fn test_parse_volume() {
        assert_eq!(parse_volume("13,278,100"), Some(13_278_100));
        assert_eq!(parse_volume("-"), None);
    }

    #[test]
    fn test_parse_signed_change_down_marker_flips_sign() {
        assert_eq!(parse_signed_change("하락 400"), Some(dec!(-400)));
        assert_eq!(parse_signed_change("상승 1,200"), Some(dec!(1200)));
        assert_eq!(parse_signed_change("보합 0"), Some(dec!(0)));
    }

    #[test]
    fn test_parse_signed_change_empty() {
        assert_eq!(parse_signed_change(""), None);
        assert_eq!(parse_signed_change("보합"), None);
    }

    #[test]
    fn test_parse_percent() {
        assert_eq!(parse_percent("+1.25%"), Some(dec!(1.25)));
        assert_eq!(parse_percent("-0.40%"), Some(dec!(-0.40)));
        assert_eq!(parse_percent("0.00%"), Some(dec!(0.00)));
        assert_eq!(parse_percent(""), None);
    }

    #[test]
    fn test_parse_dotted_date() {
        assert_eq!(
            parse_dotted_date("2024.03.15"),
            NaiveDate::from_ymd_opt(2024, 3, 15)
        );
        assert_eq!(parse_dotted_date("2024-03-15"), None);
    }
}
