//! Bill parsers and the dispatcher that selects between them.

pub mod header;
pub mod text;

mod alipay;
mod csv;
mod wechat;

pub use alipay::AlipayParser;
pub use csv::GenericCsvParser;
pub use wechat::WechatParser;

use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use tracing::warn;

use crate::categorize::CategoryTable;
use crate::clock::{Clock, SystemClock};
use crate::config::{DateFallback, ImportConfig};
use crate::error::ParseError;
use crate::models::{ParsedBill, Platform};

/// Capability shared by every format-specific parser.
pub trait BillParser: Send + Sync {
    fn platform(&self) -> Platform;

    /// Filename heuristic: can this parser handle the upload?
    fn can_parse(&self, filename: &str) -> bool;

    /// Decode, locate the header, resolve columns, and normalize each row.
    fn parse(&self, data: &[u8]) -> Result<Vec<ParsedBill>, ParseError>;
}

/// State every parser carries: the shared category table, an injectable
/// clock, and the unparsable-date policy.
pub(crate) struct ParserCommon {
    categories: Arc<CategoryTable>,
    clock: Arc<dyn Clock>,
    date_fallback: DateFallback,
}

impl ParserCommon {
    pub(crate) fn new(categories: Arc<CategoryTable>) -> Self {
        Self {
            categories,
            clock: Arc::new(SystemClock),
            date_fallback: DateFallback::default(),
        }
    }

    pub(crate) fn set_clock(&mut self, clock: Arc<dyn Clock>) {
        self.clock = clock;
    }

    pub(crate) fn set_date_fallback(&mut self, policy: DateFallback) {
        self.date_fallback = policy;
    }

    pub(crate) fn categorize(&self, text: &str) -> String {
        self.categories.categorize(text).to_string()
    }

    /// Parse a row's timestamp, applying the configured fallback.
    /// `None` means the row should be dropped.
    pub(crate) fn resolve_date(
        &self,
        platform: Platform,
        row: usize,
        raw: &str,
    ) -> Option<DateTime<Utc>> {
        if let Some(parsed) = text::parse_date(raw) {
            return Some(parsed.and_utc());
        }
        match self.date_fallback {
            DateFallback::Now => {
                warn!(platform = %platform, row, value = raw, "unparseable bill date, using current time");
                Some(self.clock.now())
            }
            DateFallback::Drop => {
                warn!(platform = %platform, row, value = raw, "unparseable bill date, dropping row");
                None
            }
        }
    }
}

/// Selects the first capable parser for an uploaded file.
///
/// Order matters: platform-specific parsers come before the generic CSV
/// fallback, so a WeChat export named `wechat_bill.csv` is never mis-parsed
/// as a generic CSV.
pub struct BillParserFactory {
    parsers: Vec<Box<dyn BillParser>>,
}

impl BillParserFactory {
    /// Factory with the built-in category table and default column mapping.
    pub fn new() -> Self {
        Self::with_table(Arc::new(CategoryTable::builtin()))
    }

    pub fn with_table(categories: Arc<CategoryTable>) -> Self {
        Self::from_parsers(vec![
            Box::new(WechatParser::new(categories.clone())),
            Box::new(AlipayParser::new(categories.clone())),
            Box::new(GenericCsvParser::new(categories, Default::default())),
        ])
    }

    /// Factory configured from an [`ImportConfig`].
    pub fn from_config(config: &ImportConfig) -> Result<Self> {
        let categories = Arc::new(config.category_table()?);
        Ok(Self::from_parsers(vec![
            Box::new(
                WechatParser::new(categories.clone()).with_date_fallback(config.date_fallback),
            ),
            Box::new(
                AlipayParser::new(categories.clone()).with_date_fallback(config.date_fallback),
            ),
            Box::new(
                GenericCsvParser::new(categories, config.csv.clone())
                    .with_date_fallback(config.date_fallback),
            ),
        ]))
    }

    pub fn from_parsers(parsers: Vec<Box<dyn BillParser>>) -> Self {
        Self { parsers }
    }

    /// First parser whose filename predicate matches, in registration order.
    pub fn find_parser(&self, filename: &str) -> Option<&dyn BillParser> {
        self.parsers
            .iter()
            .find(|parser| parser.can_parse(filename))
            .map(|parser| parser.as_ref())
    }

    /// Parse an uploaded file end to end.
    pub fn parse_file(&self, filename: &str, data: &[u8]) -> Result<Vec<ParsedBill>, ParseError> {
        let parser = self
            .find_parser(filename)
            .ok_or_else(|| ParseError::UnsupportedFormat {
                filename: filename.to_string(),
            })?;
        parser.parse(data)
    }

    pub fn supported_formats(&self) -> &'static [&'static str] {
        &["微信支付账单 (.csv)", "支付宝账单 (.csv)", "通用CSV格式 (.csv)"]
    }
}

impl Default for BillParserFactory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_token_beats_csv_fallback() {
        let factory = BillParserFactory::new();
        assert_eq!(
            factory.find_parser("wechat_bill.csv").map(|p| p.platform()),
            Some(Platform::Wechat)
        );
        assert_eq!(
            factory.find_parser("支付宝账单.csv").map(|p| p.platform()),
            Some(Platform::Alipay)
        );
        assert_eq!(
            factory.find_parser("other_bill.csv").map(|p| p.platform()),
            Some(Platform::Csv)
        );
    }

    #[test]
    fn lists_supported_formats() {
        let factory = BillParserFactory::new();
        assert_eq!(factory.supported_formats().len(), 3);
    }

    #[test]
    fn unmatched_filename_is_unsupported() {
        let factory = BillParserFactory::new();
        assert!(factory.find_parser("statement.pdf").is_none());

        let err = factory.parse_file("statement.pdf", b"").unwrap_err();
        assert!(matches!(err, ParseError::UnsupportedFormat { .. }));
        assert!(err.to_string().contains("statement.pdf"));
    }
}
