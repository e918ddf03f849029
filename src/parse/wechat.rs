use std::sync::Arc;

use encoding_rs::UTF_8;
use rust_decimal::Decimal;
use serde_json::json;
use tracing::warn;

use crate::categorize::CategoryTable;
use crate::clock::Clock;
use crate::config::DateFallback;
use crate::error::ParseError;
use crate::models::{BillKind, ParsedBill, Platform};

use super::{header, text, BillParser, ParserCommon};

/// Parser for WeChat Pay CSV exports (UTF-8).
pub struct WechatParser {
    common: ParserCommon,
}

struct Columns {
    time: usize,
    amount: usize,
    direction: usize,
    party: Option<usize>,
    commodity: Option<usize>,
}

impl WechatParser {
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
        let platform = Platform::Wechat;
        Ok(Columns {
            time: header::require_column(headers, &["交易时间"], platform, "交易时间")?,
            amount: header::require_column(headers, &["金额(元)", "金额"], platform, "金额(元)")?,
            direction: header::require_column(headers, &["收/支"], platform, "收/支")?,
            party: header::find_column(headers, &["交易对方"]),
            commodity: header::find_column(headers, &["商品"]),
        })
    }

    fn normalize_row(&self, index: usize, line: &str, cols: &Columns) -> Option<ParsedBill> {
        let fields = text::split_fields(line);
        let needed = cols.time.max(cols.amount).max(cols.direction);
        // Short trailing lines and footers are expected garbage.
        if fields.len() <= needed || fields[cols.time].is_empty() {
            return None;
        }

        let raw_time = &fields[cols.time];
        let Some(signed) = text::parse_amount(&fields[cols.amount]) else {
            warn!(row = index, value = %fields[cols.amount], "unparseable wechat amount, dropping row");
            return None;
        };

        let date = self.common.resolve_date(Platform::Wechat, index, raw_time)?;
        let kind = determine_kind(&fields[cols.direction], signed);

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

        let title = if party.is_empty() { "微信支付" } else { party };
        let category = self
            .common
            .categorize(if commodity.is_empty() { party } else { commodity });

        Some(ParsedBill {
            title: title.to_string(),
            amount: signed.abs(),
            kind,
            description: format!("{party} - {commodity}"),
            date,
            category,
            account: None,
            platform: Platform::Wechat,
            raw: json!({ "columns": fields }),
        })
    }
}

impl BillParser for WechatParser {
    fn platform(&self) -> Platform {
        Platform::Wechat
    }

    fn can_parse(&self, filename: &str) -> bool {
        let filename = filename.to_lowercase();
        filename.contains("微信") || filename.contains("wechat")
    }

    fn parse(&self, data: &[u8]) -> Result<Vec<ParsedBill>, ParseError> {
        let decoded = text::decode(data, UTF_8);
        let lines = text::lines(&decoded);

        let header_index = header::locate_header(&lines).ok_or(ParseError::HeaderNotFound {
            platform: Platform::Wechat,
        })?;
        let headers = text::split_fields(lines[header_index]);
        let cols = self.resolve_columns(&headers)?;

        Ok(lines[header_index + 1..]
            .iter()
            .enumerate()
            .filter_map(|(index, line)| self.normalize_row(index, line, &cols))
            .collect())
    }
}

/// Direction from the 收/支 column; the raw amount sign only breaks ties
/// when the column text matches no keyword.
fn determine_kind(status: &str, signed_amount: Decimal) -> BillKind {
    if status.contains("转账") {
        BillKind::Transfer
    } else if status.contains("支出") {
        BillKind::Expense
    } else if status.contains("收入") {
        BillKind::Income
    } else if signed_amount > Decimal::ZERO {
        BillKind::Income
    } else {
        BillKind::Expense
    }
}
