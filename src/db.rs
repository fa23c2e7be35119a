use std::{future::Future, time::Duration};

use anyhow::Context;
use async_trait::async_trait;
use sqlx::{pool::PoolConnection, postgres::PgPoolOptions, PgPool, Postgres};
use tokio_util::sync::CancellationToken;

use crate::{config::DbConfig, error::StoreError};

pub async fn connect(config: &DbConfig) -> anyhow::Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect(&config.url)
        .await
        .context("connect to database")
}

/// Hands out one open connection per unit of work. The connection goes back
/// to the backing store when the returned guard is dropped.
#[async_trait]
pub trait ConnectionFactory: Send + Sync {
    async fn acquire(
        &self,
        cancel: &CancellationToken,
    ) -> Result<PoolConnection<Postgres>, StoreError>;
}

#[derive(Clone)]
pub struct PgConnectionFactory {
    pool: PgPool,
}

impl PgConnectionFactory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConnectionFactory for PgConnectionFactory {
    async fn acquire(
        &self,
        cancel: &CancellationToken,
    ) -> Result<PoolConnection<Postgres>, StoreError> {
        run_cancellable(cancel, async { Ok(self.pool.acquire().await?) }).await
    }
}

/// Races `fut` against `cancel`. Whatever `fut` owns (a pooled connection
/// included) is dropped when the token wins.
pub async fn run_cancellable<T, F>(cancel: &CancellationToken, fut: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    if cancel.is_cancelled() {
        return Err(StoreError::Cancelled);
    }
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(StoreError::Cancelled),
        res = fut => res,
    }
}
