//! Header-row location and column resolution.
//!
//! Bill exports vary their column names and preamble length across app
//! versions, so exact header matching is too brittle. A line counts as the
//! header when it names something from each of the three keyword groups a
//! bill table must have: a time column, a counterparty column, and an
//! amount/direction column.

use crate::error::ParseError;
use crate::models::Platform;

const TIME_KEYWORDS: &[&str] = &["付款时间", "交易时间", "时间", "日期"];
const PARTY_KEYWORDS: &[&str] = &["交易对方", "商户", "对方"];
const AMOUNT_KEYWORDS: &[&str] = &["金额", "收/支"];

fn contains_any(line: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|kw| line.contains(kw))
}

/// Find the index of the most likely header line.
///
/// Strict rule first: one keyword from each group on the same line. Looser
/// fallback: a time keyword plus an amount keyword on a line with more than
/// five comma-delimited fields (some exports omit the counterparty column
/// name the strict rule wants).
pub fn locate_header(lines: &[&str]) -> Option<usize> {
    if let Some(index) = lines.iter().position(|line| {
        contains_any(line, TIME_KEYWORDS)
            && contains_any(line, PARTY_KEYWORDS)
            && contains_any(line, AMOUNT_KEYWORDS)
    }) {
        return Some(index);
    }

    lines.iter().position(|line| {
        contains_any(line, TIME_KEYWORDS)
            && contains_any(line, AMOUNT_KEYWORDS)
            && line.split(',').count() > 5
    })
}

/// Resolve a semantic field to a column index by trying candidate header
/// names in order, most specific first. Substring match, so `金额` finds
/// `金额(元)` and `金额（元）` alike.
pub fn find_column(headers: &[String], candidates: &[&str]) -> Option<usize> {
    for candidate in candidates {
        if let Some(index) = headers.iter().position(|h| h.contains(candidate)) {
            return Some(index);
        }
    }
    None
}

/// Like [`find_column`], but a miss fails the parse naming the column.
pub fn require_column(
    headers: &[String],
    candidates: &[&str],
    platform: Platform,
    column: &str,
) -> Result<usize, ParseError> {
    find_column(headers, candidates).ok_or_else(|| ParseError::MissingColumn {
        platform,
        column: column.to_string(),
    })
}
