use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::Id;

/// Transaction direction/class, derived from a status column (or the raw
/// amount sign for formats without one).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BillKind {
    Income,
    Expense,
    Transfer,
    Investment,
}

impl fmt::Display for BillKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            BillKind::Income => "INCOME",
            BillKind::Expense => "EXPENSE",
            BillKind::Transfer => "TRANSFER",
            BillKind::Investment => "INVESTMENT",
        };
        f.write_str(label)
    }
}

/// The source application whose export format produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Wechat,
    Alipay,
    Csv,
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Platform::Wechat => "wechat",
            Platform::Alipay => "alipay",
            Platform::Csv => "csv",
        };
        f.write_str(label)
    }
}

/// One normalized bill record, produced by a parser and consumed once by
/// the importer. Never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedBill {
    pub title: String,
    /// Always a non-negative magnitude; direction lives in `kind`.
    pub amount: Decimal,
    pub kind: BillKind,
    pub description: String,
    /// Export timestamps carry no zone; the naive value is taken as UTC.
    pub date: DateTime<Utc>,
    pub category: String,
    /// Only the generic CSV parser fills this, when a column is mapped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
    pub platform: Platform,
    /// Opaque raw-row snapshot kept for audit. Not interpreted further.
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub raw: serde_json::Value,
}

/// A persisted bill. The dedup key is (owner, date, amount, description).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bill {
    pub id: Id,
    pub owner_id: Id,
    pub category_id: Option<Id>,
    pub title: String,
    pub amount: Decimal,
    pub kind: BillKind,
    pub description: String,
    pub date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
    pub platform: Platform,
}

impl Bill {
    pub fn from_parsed(owner: &Id, category_id: Option<Id>, parsed: &ParsedBill) -> Self {
        Self {
            id: Id::new(),
            owner_id: owner.clone(),
            category_id,
            title: parsed.title.clone(),
            amount: parsed.amount,
            kind: parsed.kind,
            description: parsed.description.clone(),
            date: parsed.date,
            account: parsed.account.clone(),
            platform: parsed.platform,
        }
    }
}
