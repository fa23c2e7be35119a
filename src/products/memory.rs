use std::sync::Mutex;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio_util::sync::CancellationToken;

use crate::error::StoreError;
use crate::products::repo::ProductRepository;
use crate::products::repo_types::ProductRecord;

/// Vec-backed store with the same row semantics as `PgProductStore`.
#[derive(Default)]
pub struct InMemoryProductStore {
    rows: Mutex<Vec<ProductRecord>>,
}

impl InMemoryProductStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    fn check(cancel: &CancellationToken) -> Result<(), StoreError> {
        if cancel.is_cancelled() {
            Err(StoreError::Cancelled)
        } else {
            Ok(())
        }
    }

    fn active_sorted<F>(&self, keep: F) -> Vec<ProductRecord>
    where
        F: Fn(&ProductRecord) -> bool,
    {
        let mut out: Vec<_> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.is_active && keep(r))
            .cloned()
            .collect();
        out.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        out
    }
}

#[async_trait]
impl ProductRepository for InMemoryProductStore {
    async fn fetch_all(&self, cancel: &CancellationToken) -> Result<Vec<ProductRecord>, StoreError> {
        Self::check(cancel)?;
        Ok(self.active_sorted(|_| true))
    }

    async fn fetch_by_id(
        &self,
        id: i32,
        cancel: &CancellationToken,
    ) -> Result<Option<ProductRecord>, StoreError> {
        Self::check(cancel)?;
        Ok(self.rows.lock().unwrap().iter().find(|r| r.id == id).cloned())
    }

    async fn insert(
        &self,
        record: &ProductRecord,
        cancel: &CancellationToken,
    ) -> Result<i32, StoreError> {
        Self::check(cancel)?;
        let mut rows = self.rows.lock().unwrap();
        let id = rows.iter().map(|r| r.id).max().unwrap_or(0) + 1;
        rows.push(ProductRecord {
            id,
            updated_at: None,
            ..record.clone()
        });
        Ok(id)
    }

    async fn update(
        &self,
        record: &ProductRecord,
        cancel: &CancellationToken,
    ) -> Result<bool, StoreError> {
        Self::check(cancel)?;
        let mut rows = self.rows.lock().unwrap();
        let Some(row) = rows.iter_mut().find(|r| r.id == record.id) else {
            return Ok(false);
        };
        row.name = record.name.clone();
        row.description = record.description.clone();
        row.price = record.price;
        row.stock_quantity = record.stock_quantity;
        row.category = record.category.clone();
        row.updated_at = record.updated_at;
        row.is_active = record.is_active;
        Ok(true)
    }

    async fn soft_delete(
        &self,
        id: i32,
        updated_at: OffsetDateTime,
        cancel: &CancellationToken,
    ) -> Result<bool, StoreError> {
        Self::check(cancel)?;
        let mut rows = self.rows.lock().unwrap();
        match rows.iter_mut().find(|r| r.id == id && r.is_active) {
            Some(row) => {
                row.is_active = false;
                row.updated_at = Some(updated_at);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn search(
        &self,
        term: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<ProductRecord>, StoreError> {
        Self::check(cancel)?;
        let needle = term.to_lowercase();
        Ok(self.active_sorted(|r| {
            r.name.to_lowercase().contains(&needle)
                || r.category.to_lowercase().contains(&needle)
                || r
                    .description
                    .as_deref()
                    .is_some_and(|d| d.to_lowercase().contains(&needle))
        }))
    }
}
