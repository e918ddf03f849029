//! In-memory store implementation for testing.

use std::collections::HashMap;

use anyhow::Result;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::Mutex;

use crate::models::{Bill, BillKind, Category, Id};

use super::BillStore;

/// In-memory [`BillStore`] for tests and offline use.
#[derive(Default)]
pub struct MemoryStore {
    categories: Mutex<HashMap<(Id, String), Category>>,
    bills: Mutex<HashMap<Id, Vec<Bill>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl BillStore for MemoryStore {
    async fn find_or_create_category(
        &self,
        owner: &Id,
        name: &str,
        kind: BillKind,
    ) -> Result<Category> {
        // Single lock across check-and-insert keeps the upsert atomic.
        let mut categories = self.categories.lock().await;
        let category = categories
            .entry((owner.clone(), name.to_string()))
            .or_insert_with(|| Category::new(owner, name, kind));
        Ok(category.clone())
    }

    async fn find_bill(
        &self,
        owner: &Id,
        date: DateTime<Utc>,
        amount: Decimal,
        description: &str,
    ) -> Result<Option<Bill>> {
        let bills = self.bills.lock().await;
        Ok(bills.get(owner).and_then(|owned| {
            owned
                .iter()
                .find(|bill| {
                    bill.date == date && bill.amount == amount && bill.description == description
                })
                .cloned()
        }))
    }

    async fn insert_bill(&self, bill: &Bill) -> Result<()> {
        let mut bills = self.bills.lock().await;
        bills
            .entry(bill.owner_id.clone())
            .or_default()
            .push(bill.clone());
        Ok(())
    }

    async fn list_bills(&self, owner: &Id) -> Result<Vec<Bill>> {
        let bills = self.bills.lock().await;
        Ok(bills.get(owner).cloned().unwrap_or_default())
    }

    async fn list_categories(&self, owner: &Id) -> Result<Vec<Category>> {
        let categories = self.categories.lock().await;
        Ok(categories
            .values()
            .filter(|category| &category.owner_id == owner)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[tokio::test]
    async fn category_upsert_is_idempotent() -> Result<()> {
        let store = MemoryStore::new();
        let owner = Id::from_string("user-1");

        let first = store
            .find_or_create_category(&owner, "餐饮美食", BillKind::Expense)
            .await?;
        let second = store
            .find_or_create_category(&owner, "餐饮美食", BillKind::Expense)
            .await?;

        assert_eq!(first.id, second.id);
        assert_eq!(store.list_categories(&owner).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn categories_are_scoped_per_owner() -> Result<()> {
        let store = MemoryStore::new();
        let a = Id::from_string("user-a");
        let b = Id::from_string("user-b");

        let first = store
            .find_or_create_category(&a, "餐饮美食", BillKind::Expense)
            .await?;
        let second = store
            .find_or_create_category(&b, "餐饮美食", BillKind::Expense)
            .await?;

        assert_ne!(first.id, second.id);
        Ok(())
    }

    #[tokio::test]
    async fn find_bill_matches_the_full_dedup_key() -> Result<()> {
        let store = MemoryStore::new();
        let owner = Id::from_string("user-1");
        let date = Utc.with_ymd_and_hms(2024, 7, 22, 10, 0, 0).unwrap();

        let bill = Bill {
            id: Id::new(),
            owner_id: owner.clone(),
            category_id: None,
            title: "商家".to_string(),
            amount: Decimal::from(100),
            kind: BillKind::Expense,
            description: "商家 - 超市购物".to_string(),
            date,
            account: None,
            platform: crate::models::Platform::Wechat,
        };
        store.insert_bill(&bill).await?;

        let hit = store
            .find_bill(&owner, date, Decimal::from(100), "商家 - 超市购物")
            .await?;
        assert!(hit.is_some());

        // Any key component differing is a miss.
        let miss = store
            .find_bill(&owner, date, Decimal::from(101), "商家 - 超市购物")
            .await?;
        assert!(miss.is_none());
        let miss = store
            .find_bill(&Id::from_string("user-2"), date, Decimal::from(100), "商家 - 超市购物")
            .await?;
        assert!(miss.is_none());
        Ok(())
    }
}
