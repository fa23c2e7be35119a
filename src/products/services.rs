use std::sync::Arc;

use time::OffsetDateTime;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::error::CatalogResult;
use crate::products::dto::ProductDto;
use crate::products::repo::ProductRepository;
use crate::products::repo_types::ProductRecord;

/// Catalog operations offered to callers. Maps between the transfer shape
/// and stored records, owns timestamps and the active flag, and leaves
/// persistence to the repository.
#[derive(Clone)]
pub struct ProductCatalogService {
    store: Arc<dyn ProductRepository>,
}

impl ProductCatalogService {
    pub fn new(store: Arc<dyn ProductRepository>) -> Self {
        Self { store }
    }

    #[instrument(skip(self, cancel))]
    pub async fn list_products(&self, cancel: &CancellationToken) -> CatalogResult<Vec<ProductDto>> {
        let rows = self.store.fetch_all(cancel).await?;
        debug!(count = rows.len(), "products listed");
        Ok(rows.into_iter().map(ProductDto::from).collect())
    }

    /// Returns inactive products too; only list and search hide them.
    #[instrument(skip(self, cancel))]
    pub async fn get_product(
        &self,
        id: i32,
        cancel: &CancellationToken,
    ) -> CatalogResult<Option<ProductDto>> {
        let row = self.store.fetch_by_id(id, cancel).await?;
        debug!(found = row.is_some(), "product lookup");
        Ok(row.map(ProductDto::from))
    }

    #[instrument(skip(self, dto, cancel), fields(name = %dto.name))]
    pub async fn create_product(
        &self,
        dto: ProductDto,
        cancel: &CancellationToken,
    ) -> CatalogResult<i32> {
        if let Err(errs) = dto.validate() {
            warn!(error = %errs, "create rejected");
            return Err(errs.into());
        }

        let record = ProductRecord {
            id: 0,
            created_at: now_utc(),
            updated_at: None,
            is_active: true,
            ..ProductRecord::from(dto)
        };
        let id = self.store.insert(&record, cancel).await?;
        info!(product_id = id, "product created");
        Ok(id)
    }

    #[instrument(skip(self, dto, cancel), fields(product_id = dto.id))]
    pub async fn update_product(
        &self,
        dto: ProductDto,
        cancel: &CancellationToken,
    ) -> CatalogResult<bool> {
        if let Err(errs) = dto.validate() {
            warn!(error = %errs, "update rejected");
            return Err(errs.into());
        }

        let record = ProductRecord {
            updated_at: Some(now_utc()),
            ..ProductRecord::from(dto)
        };
        let updated = self.store.update(&record, cancel).await?;
        if updated {
            info!("product updated");
        } else {
            debug!("update matched no product");
        }
        Ok(updated)
    }

    #[instrument(skip(self, cancel))]
    pub async fn delete_product(&self, id: i32, cancel: &CancellationToken) -> CatalogResult<bool> {
        let deleted = self.store.soft_delete(id, now_utc(), cancel).await?;
        if deleted {
            info!("product deactivated");
        } else {
            debug!("delete matched no active product");
        }
        Ok(deleted)
    }

    #[instrument(skip(self, cancel))]
    pub async fn search_products(
        &self,
        term: &str,
        cancel: &CancellationToken,
    ) -> CatalogResult<Vec<ProductDto>> {
        let rows = self.store.search(term, cancel).await?;
        debug!(count = rows.len(), "products searched");
        Ok(rows.into_iter().map(ProductDto::from).collect())
    }
}

/// Current UTC time at the precision Postgres keeps (microseconds).
fn now_utc() -> OffsetDateTime {
    let now = OffsetDateTime::now_utc();
    now.replace_microsecond(now.microsecond()).unwrap_or(now)
}
