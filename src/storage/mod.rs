mod memory;

pub use memory::MemoryStore;

use anyhow::Result;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::models::{Bill, BillKind, Category, Id};

/// Persistence contract the importer depends on.
///
/// The importer never talks to a database directly; it is handed an
/// implementation of this trait so the core stays testable without one.
#[async_trait::async_trait]
pub trait BillStore: Send + Sync {
    /// Upsert a category by its natural key (owner, name). Must be atomic:
    /// concurrent calls for the same key return the same category rather
    /// than creating duplicates.
    async fn find_or_create_category(
        &self,
        owner: &Id,
        name: &str,
        kind: BillKind,
    ) -> Result<Category>;

    /// Look up a persisted bill by the dedup key.
    async fn find_bill(
        &self,
        owner: &Id,
        date: DateTime<Utc>,
        amount: Decimal,
        description: &str,
    ) -> Result<Option<Bill>>;

    async fn insert_bill(&self, bill: &Bill) -> Result<()>;

    async fn list_bills(&self, owner: &Id) -> Result<Vec<Bill>>;

    async fn list_categories(&self, owner: &Id) -> Result<Vec<Category>>;
}
