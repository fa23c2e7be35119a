use std::sync::Arc;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio_util::sync::CancellationToken;

use crate::db::{run_cancellable, ConnectionFactory};
use crate::error::StoreError;
use crate::products::repo_types::ProductRecord;

/// Storage operations the catalog service relies on.
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Active products ordered by name.
    async fn fetch_all(&self, cancel: &CancellationToken) -> Result<Vec<ProductRecord>, StoreError>;

    /// Any product with this id, active or not.
    async fn fetch_by_id(
        &self,
        id: i32,
        cancel: &CancellationToken,
    ) -> Result<Option<ProductRecord>, StoreError>;

    /// Inserts the record and returns the id the database assigned. `record.id` is ignored.
    async fn insert(&self, record: &ProductRecord, cancel: &CancellationToken)
        -> Result<i32, StoreError>;

    /// Overwrites every mutable column of the row at `record.id`.
    async fn update(&self, record: &ProductRecord, cancel: &CancellationToken)
        -> Result<bool, StoreError>;

    /// Marks an active row inactive and stamps `updated_at`.
    async fn soft_delete(
        &self,
        id: i32,
        updated_at: OffsetDateTime,
        cancel: &CancellationToken,
    ) -> Result<bool, StoreError>;

    /// Active products whose name, description or category contains `term`, ordered by name.
    async fn search(
        &self,
        term: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<ProductRecord>, StoreError>;
}

/// Postgres-backed product store. Each call takes its own connection from the
/// factory and gives it back when the call ends.
#[derive(Clone)]
pub struct PgProductStore {
    connections: Arc<dyn ConnectionFactory>,
}

impl PgProductStore {
    pub fn new(connections: Arc<dyn ConnectionFactory>) -> Self {
        Self { connections }
    }
}

#[async_trait]
impl ProductRepository for PgProductStore {
    async fn fetch_all(&self, cancel: &CancellationToken) -> Result<Vec<ProductRecord>, StoreError> {
        run_cancellable(cancel, async {
            let mut conn = self.connections.acquire(cancel).await?;
            let rows = sqlx::query_as::<_, ProductRecord>(
                r#"
                SELECT id, name, description, price, stock_quantity, category,
                       created_at, updated_at, is_active
                FROM products
                WHERE is_active = TRUE
                ORDER BY name
                "#,
            )
            .fetch_all(&mut *conn)
            .await?;
            Ok(rows)
        })
        .await
    }

    async fn fetch_by_id(
        &self,
        id: i32,
        cancel: &CancellationToken,
    ) -> Result<Option<ProductRecord>, StoreError> {
        run_cancellable(cancel, async {
            let mut conn = self.connections.acquire(cancel).await?;
            let row = sqlx::query_as::<_, ProductRecord>(
                r#"
                SELECT id, name, description, price, stock_quantity, category,
                       created_at, updated_at, is_active
                FROM products
                WHERE id = $1
                "#,
            )
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;
            Ok(row)
        })
        .await
    }

    async fn insert(
        &self,
        record: &ProductRecord,
        cancel: &CancellationToken,
    ) -> Result<i32, StoreError> {
        run_cancellable(cancel, async {
            let mut conn = self.connections.acquire(cancel).await?;
            let id = sqlx::query_scalar::<_, i32>(
                r#"
                INSERT INTO products (name, description, price, stock_quantity, category,
                                      created_at, is_active)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING id
                "#,
            )
            .bind(&record.name)
            .bind(&record.description)
            .bind(record.price)
            .bind(record.stock_quantity)
            .bind(&record.category)
            .bind(record.created_at)
            .bind(record.is_active)
            .fetch_one(&mut *conn)
            .await?;
            Ok(id)
        })
        .await
    }

    async fn update(
        &self,
        record: &ProductRecord,
        cancel: &CancellationToken,
    ) -> Result<bool, StoreError> {
        run_cancellable(cancel, async {
            let mut conn = self.connections.acquire(cancel).await?;
            let result = sqlx::query(
                r#"
                UPDATE products
                SET name = $2,
                    description = $3,
                    price = $4,
                    stock_quantity = $5,
                    category = $6,
                    updated_at = $7,
                    is_active = $8
                WHERE id = $1
                "#,
            )
            .bind(record.id)
            .bind(&record.name)
            .bind(&record.description)
            .bind(record.price)
            .bind(record.stock_quantity)
            .bind(&record.category)
            .bind(record.updated_at)
            .bind(record.is_active)
            .execute(&mut *conn)
            .await?;
            Ok(result.rows_affected() > 0)
        })
        .await
    }

    async fn soft_delete(
        &self,
        id: i32,
        updated_at: OffsetDateTime,
        cancel: &CancellationToken,
    ) -> Result<bool, StoreError> {
        run_cancellable(cancel, async {
            let mut conn = self.connections.acquire(cancel).await?;
            let result = sqlx::query(
                r#"
                UPDATE products
                SET is_active = FALSE,
                    updated_at = $2
                WHERE id = $1 AND is_active = TRUE
                "#,
            )
            .bind(id)
            .bind(updated_at)
            .execute(&mut *conn)
            .await?;
            Ok(result.rows_affected() > 0)
        })
        .await
    }

    async fn search(
        &self,
        term: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<ProductRecord>, StoreError> {
        let pattern = contains_pattern(term);
        run_cancellable(cancel, async {
            let mut conn = self.connections.acquire(cancel).await?;
            let rows = sqlx::query_as::<_, ProductRecord>(
                r#"
                SELECT id, name, description, price, stock_quantity, category,
                       created_at, updated_at, is_active
                FROM products
                WHERE is_active = TRUE
                  AND (name ILIKE $1 OR description ILIKE $1 OR category ILIKE $1)
                ORDER BY name
                "#,
            )
            .bind(&pattern)
            .fetch_all(&mut *conn)
            .await?;
            Ok(rows)
        })
        .await
    }
}

/// `%term%` with LIKE metacharacters escaped, so the term matches literally.
pub(crate) fn contains_pattern(term: &str) -> String {
    let mut out = String::with_capacity(term.len() + 2);
    out.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('%');
    out
}
