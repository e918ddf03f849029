use std::sync::Arc;

use encoding_rs::UTF_8;
use rust_decimal::Decimal;
use serde_json::json;
use tracing::warn;

use crate::categorize::CategoryTable;
use crate::clock::Clock;
use crate::config::{CsvMapping, DateFallback};
use crate::error::ParseError;
use crate::models::{BillKind, ParsedBill, Platform};

use super::{header, text, BillParser, ParserCommon};

/// Fallback parser for plain CSV exports (bank statements, hand-kept
/// sheets). The first line is the header; column names come from a
/// configurable mapping instead of platform knowledge.
pub struct GenericCsvParser {
    common: ParserCommon,
    mapping: CsvMapping,
}

struct Columns {
    date: usize,
    amount: usize,
    description: Option<usize>,
    kind: Option<usize>,
    category: Option<usize>,
    account: Option<usize>,
}

impl GenericCsvParser {
    pub fn new(categories: Arc<CategoryTable>, mapping: CsvMapping) -> Self {
        Self {
            common: ParserCommon::new(categories),
            mapping,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.common.set_clock(clock);
        self
    }

    pub fn with_date_fallback(mut self, policy: DateFallback) -> Self {
        self.common.set_date_fallback(policy);
        self
    }

    fn resolve_columns(&self, headers: &[String]) -> Result<Columns, ParseError> {
        let platform = Platform::Csv;
        let optional = |name: &Option<String>| {
            name.as_deref()
                .and_then(|n| header::find_column(headers, &[n]))
        };
        Ok(Columns {
            date: header::require_column(
                headers,
                &[self.mapping.date_column.as_str()],
                platform,
                &self.mapping.date_column,
            )?,
            amount: header::require_column(
                headers,
                &[self.mapping.amount_column.as_str()],
                platform,
                &self.mapping.amount_column,
            )?,
            description: header::find_column(headers, &[self.mapping.description_column.as_str()]),
            kind: optional(&self.mapping.type_column),
            category: optional(&self.mapping.category_column),
            account: optional(&self.mapping.account_column),
        })
    }

    fn normalize_row(
        &self,
        index: usize,
        line: &str,
        headers: &[String],
        cols: &Columns,
    ) -> Option<ParsedBill> {
        let fields = text::split_fields(line);
        let needed = cols.date.max(cols.amount);
        if fields.len() <= needed || fields[cols.date].is_empty() {
            return None;
        }

        let Some(signed) = text::parse_amount(&fields[cols.amount]) else {
            warn!(row = index, value = %fields[cols.amount], "unparseable csv amount, dropping row");
            return None;
        };

        let date = self
            .common
            .resolve_date(Platform::Csv, index, &fields[cols.date])?;

        let field = |col: Option<usize>| {
            col.and_then(|i| fields.get(i))
                .map(String::as_str)
                .filter(|v| !v.is_empty())
        };

        let description = field(cols.description).unwrap_or("");
        let kind = determine_kind(field(cols.kind), signed);
        let category = match field(cols.category) {
            Some(value) => value.to_string(),
            None => self.common.categorize(description),
        };

        let mut raw = serde_json::Map::new();
        for (name, value) in headers.iter().zip(&fields) {
            raw.insert(name.clone(), json!(value));
        }

        Some(ParsedBill {
            title: if description.is_empty() {
                "导入交易".to_string()
            } else {
                description.to_string()
            },
            amount: signed.abs(),
            kind,
            description: description.to_string(),
            date,
            category,
            account: field(cols.account).map(str::to_string),
            platform: Platform::Csv,
            raw: raw.into(),
        })
    }
}

impl BillParser for GenericCsvParser {
    fn platform(&self) -> Platform {
        Platform::Csv
    }

    fn can_parse(&self, filename: &str) -> bool {
        filename.to_lowercase().ends_with(".csv")
    }

    fn parse(&self, data: &[u8]) -> Result<Vec<ParsedBill>, ParseError> {
        let decoded = text::decode(data, UTF_8);
        let lines = text::lines(&decoded);

        // The header is always the first line here; there is no preamble to
        // scan past in hand-kept CSV exports.
        let Some((header_line, data_lines)) = lines.split_first() else {
            return Err(ParseError::HeaderNotFound {
                platform: Platform::Csv,
            });
        };
        let headers = text::split_fields(header_line);
        let cols = self.resolve_columns(&headers)?;

        Ok(data_lines
            .iter()
            .enumerate()
            .filter_map(|(index, line)| self.normalize_row(index, line, &headers, &cols))
            .collect())
    }
}

/// Generic CSVs have no 收/支 column convention, so the amount sign is the
/// primary signal; a mapped type column overrides it.
fn determine_kind(type_text: Option<&str>, signed_amount: Decimal) -> BillKind {
    if let Some(value) = type_text {
        let lower = value.to_lowercase();
        if lower.contains("transfer") || value.contains("转账") {
            return BillKind::Transfer;
        }
        if lower.contains("income") || value.contains("收入") {
            return BillKind::Income;
        }
        if lower.contains("expense") || value.contains("支出") {
            return BillKind::Expense;
        }
    }
    if signed_amount >= Decimal::ZERO {
        BillKind::Income
    } else {
        BillKind::Expense
    }
}
