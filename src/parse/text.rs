//! Byte decoding and field-level text cleanup shared by the parsers.

use std::sync::OnceLock;

use chrono::{NaiveDate, NaiveDateTime};
use encoding_rs::Encoding;
use regex::Regex;
use rust_decimal::Decimal;

/// Decode raw bytes with the platform's declared encoding. Malformed
/// sequences degrade into replacement characters; decoding never fails.
pub fn decode(bytes: &[u8], encoding: &'static Encoding) -> String {
    let (text, _, _) = encoding.decode(bytes);
    text.into_owned()
}

/// Split decoded text into trimmed, non-empty lines.
pub fn lines(text: &str) -> Vec<&str> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect()
}

/// Split a delimited line into trimmed, de-quoted fields.
pub fn split_fields(line: &str) -> Vec<String> {
    line.split(',')
        .map(|field| field.trim().trim_matches('"').to_string())
        .collect()
}

/// Parse an amount field, tolerating stray currency symbols and grouping
/// characters. Everything but digits, sign, and decimal point is stripped
/// before parsing. Returns the signed value; callers absorb the sign into
/// the bill kind and keep the magnitude.
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    static NON_NUMERIC: OnceLock<Regex> = OnceLock::new();
    let re = NON_NUMERIC.get_or_init(|| Regex::new(r"[^0-9.\-]").expect("static regex"));
    let cleaned = re.replace_all(raw, "");
    cleaned.parse::<Decimal>().ok()
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

/// Parse a bill timestamp. Exports write naive local timestamps, most
/// commonly `2024-01-01 12:00:00`; date-only values get midnight.
pub fn parse_date(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    for format in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(parsed);
        }
    }
    for format in DATE_FORMATS {
        if let Ok(parsed) = NaiveDate::parse_from_str(raw, format) {
            return parsed.and_hms_opt(0, 0, 0);
        }
    }
    None
}
