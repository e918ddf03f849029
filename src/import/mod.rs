//! Deduplicating import of parsed bill records.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::ParseError;
use crate::models::{Bill, Id, ParsedBill, Platform};
use crate::parse::BillParserFactory;
use crate::storage::BillStore;

/// User-facing result of one import run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    pub created: usize,
    pub skipped: usize,
    pub platform: Platform,
}

enum Outcome {
    Created,
    Skipped,
}

/// Persists parsed records through a [`BillStore`], skipping records that
/// already exist under the (owner, date, amount, description) key.
///
/// Records are independent: one record's persistence failure is logged and
/// the rest of the batch continues. There is deliberately no wrapping
/// transaction; a bulk import reports partial success instead of aborting.
pub struct BillImporter {
    store: Arc<dyn BillStore>,
}

impl BillImporter {
    pub fn new(store: Arc<dyn BillStore>) -> Self {
        Self { store }
    }

    pub async fn import(
        &self,
        owner: &Id,
        platform: Platform,
        records: &[ParsedBill],
    ) -> ImportSummary {
        let mut summary = ImportSummary {
            created: 0,
            skipped: 0,
            platform,
        };

        for (index, record) in records.iter().enumerate() {
            match self.import_one(owner, record).await {
                Ok(Outcome::Created) => summary.created += 1,
                Ok(Outcome::Skipped) => {
                    debug!(row = index, description = %record.description, "duplicate bill, skipping");
                    summary.skipped += 1;
                }
                Err(err) => {
                    warn!(row = index, error = %err, "failed to persist bill, continuing");
                }
            }
        }

        info!(
            platform = %summary.platform,
            created = summary.created,
            skipped = summary.skipped,
            "bill import complete"
        );
        summary
    }

    async fn import_one(&self, owner: &Id, record: &ParsedBill) -> anyhow::Result<Outcome> {
        let category_id = if record.category.is_empty() {
            None
        } else {
            let category = self
                .store
                .find_or_create_category(owner, &record.category, record.kind)
                .await?;
            Some(category.id)
        };

        let existing = self
            .store
            .find_bill(owner, record.date, record.amount, &record.description)
            .await?;
        if existing.is_some() {
            return Ok(Outcome::Skipped);
        }

        let bill = Bill::from_parsed(owner, category_id, record);
        self.store.insert_bill(&bill).await?;
        Ok(Outcome::Created)
    }
}

/// The whole ingestion pipeline behind one call: pick a parser by filename,
/// extract records, import them.
pub struct ImportService {
    factory: BillParserFactory,
    importer: BillImporter,
}

impl ImportService {
    pub fn new(factory: BillParserFactory, store: Arc<dyn BillStore>) -> Self {
        Self {
            factory,
            importer: BillImporter::new(store),
        }
    }

    pub async fn import_file(
        &self,
        owner: &Id,
        filename: &str,
        data: &[u8],
    ) -> Result<ImportSummary, ParseError> {
        let parser =
            self.factory
                .find_parser(filename)
                .ok_or_else(|| ParseError::UnsupportedFormat {
                    filename: filename.to_string(),
                })?;
        let records = parser.parse(data)?;
        Ok(self.importer.import(owner, parser.platform(), &records).await)
    }
}
