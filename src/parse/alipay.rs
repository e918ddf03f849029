use std::sync::Arc;

use encoding_rs::GBK;
use rust_decimal::Decimal;
use serde_json::json;
use tracing::warn;

use crate::categorize::CategoryTable;
use crate::clock::Clock;
use crate::config::DateFallback;
use crate::error::ParseError;
use crate::models::{BillKind, ParsedBill, Platform};

use super::{header, text, BillParser, ParserCommon};

/// Parser for Alipay CSV exports. Alipay ships GBK-encoded files with a
/// multi-line preamble and footer around the actual table.
pub struct AlipayParser {
    common: ParserCommon,
}

struct Columns {
    time: usize,
    amount: usize,
    direction: usize,
    party: Option<usize>,
    commodity: Option<usize>,
}

impl AlipayParser {
    pub fn new(categories: Arc<CategoryTable>) -> Self {
        Self {
            common: ParserCommon::new(categories),
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
        let platform = Platform::Alipay;
        Ok(Columns {
            time: header::require_column(
                headers,
                &["付款时间", "交易时间", "时间"],
                platform,
                "付款时间",
            )?,
            amount: header::require_column(headers, &["金额"], platform, "金额")?,
            direction: header::require_column(headers, &["收/支", "类型"], platform, "收/支")?,
            party: header::find_column(headers, &["交易对方", "商户", "对方"]),
            commodity: header::find_column(headers, &["商品说明", "商品名称", "商品", "说明"]),
        })
    }

    /// Footer lines mixed into the data region: separators, the vendor
    /// boilerplate, and truncated lines with far fewer fields than the
    /// header.
    fn is_data_line(line: &str, header_len: usize) -> bool {
        !line.starts_with("---")
            && !line.contains("支付宝")
            && line.split(',').count() + 2 >= header_len
    }

    fn normalize_row(&self, index: usize, line: &str, cols: &Columns) -> Option<ParsedBill> {
        let fields = text::split_fields(line);
        let needed = cols.time.max(cols.amount).max(cols.direction);
        if fields.len() <= needed || fields[cols.time].is_empty() {
            return None;
        }

        let Some(signed) = text::parse_amount(&fields[cols.amount]) else {
            warn!(row = index, value = %fields[cols.amount], "unparseable alipay amount, dropping row");
            return None;
        };

        let date = self
            .common
            .resolve_date(Platform::Alipay, index, &fields[cols.time])?;
        let kind = determine_kind(&fields[cols.direction]);

        let party = cols
            .party
            .and_then(|i| fields.get(i))
            .map(String::as_str)
            .unwrap_or("");
        let commodity = cols
            .commodity
            .and_then(|i| fields.get(i))
            .map(String::as_str)
            .unwrap_or("");
        let label = if !commodity.is_empty() {
            commodity
        } else if !party.is_empty() {
            party
        } else {
            "支付宝交易"
        };

        Some(ParsedBill {
            title: label.to_string(),
            amount: signed.abs(),
            kind,
            description: format!("{party} - {label}"),
            date,
            category: self.common.categorize(label),
            account: None,
            platform: Platform::Alipay,
            raw: json!({ "columns": fields }),
        })
    }
}

impl BillParser for AlipayParser {
    fn platform(&self) -> Platform {
        Platform::Alipay
    }

    fn can_parse(&self, filename: &str) -> bool {
        let filename = filename.to_lowercase();
        filename.contains("支付宝") || filename.contains("alipay")
    }

    fn parse(&self, data: &[u8]) -> Result<Vec<ParsedBill>, ParseError> {
        let decoded = text::decode(data, GBK);
        let lines = text::lines(&decoded);

        let header_index = header::locate_header(&lines).ok_or(ParseError::HeaderNotFound {
            platform: Platform::Alipay,
        })?;
        let headers = text::split_fields(lines[header_index]);
        let cols = self.resolve_columns(&headers)?;

        Ok(lines[header_index + 1..]
            .iter()
            .enumerate()
            .filter(|(_, line)| Self::is_data_line(line, headers.len()))
            .filter_map(|(index, line)| self.normalize_row(index, line, &cols))
            .collect())
    }
}

/// Direction from the 收/支 (or 类型) column text. Alipay writes explicit
/// transfer markers; bare 收 counts as income only when 支 is absent.
fn determine_kind(status: &str) -> BillKind {
    if status.contains("转账") || status.contains("转入") || status.contains("转出") {
        BillKind::Transfer
    } else if status.contains("收入")
        || status.contains("收款")
        || (status.contains('收') && !status.contains('支'))
    {
        BillKind::Income
    } else {
        BillKind::Expense
    }
}
