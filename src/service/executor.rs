//! Query execution against the PostgreSQL pool: reads, writes, per-call transactions.

use crate::config::DbConfig;
use crate::error::AppError;
use crate::model::{Model, ModelSchema};
use crate::service::row::{row_to_map, Row};
use crate::sql::{to_native_placeholders, Limit, SqlValue};
use futures::{StreamExt, TryStreamExt};
use serde_json::Value;
use sqlx::postgres::{PgArguments, PgConnectOptions, PgPool, PgPoolOptions, Postgres};
use sqlx::query::Query;

/// Pooled connection handle. Cheap to clone; every clone shares the same pool.
#[derive(Clone, Debug)]
pub struct Database {
    pool: PgPool,
    autocommit: bool,
}

fn connect_options(cfg: &DbConfig) -> PgConnectOptions {
    PgConnectOptions::new()
        .host(&cfg.host)
        .port(cfg.port)
        .username(&cfg.user)
        .password(&cfg.password)
        .database(&cfg.database)
}

fn pool_options(cfg: &DbConfig) -> PgPoolOptions {
    PgPoolOptions::new()
        .min_connections(cfg.min_size)
        .max_connections(cfg.max_size)
}

fn bind_all<'q>(
    mut query: Query<'q, Postgres, PgArguments>,
    args: &[Value],
) -> Query<'q, Postgres, PgArguments> {
    for a in args {
        query = query.bind(SqlValue::from_json(a));
    }
    query
}

impl Database {
    pub async fn connect(cfg: &DbConfig) -> Result<Self, AppError> {
        tracing::info!(host = %cfg.host, port = cfg.port, database = %cfg.database, "create database connection pool...");
        let pool = pool_options(cfg).connect_with(connect_options(cfg)).await?;
        Ok(Self::from_pool(pool, cfg.autocommit))
    }

    /// Pool that opens connections on first use.
    pub fn connect_lazy(cfg: &DbConfig) -> Self {
        let pool = pool_options(cfg).connect_lazy_with(connect_options(cfg));
        Self::from_pool(pool, cfg.autocommit)
    }

    pub fn from_pool(pool: PgPool, autocommit: bool) -> Self {
        Database { pool, autocommit }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Mode model writes use.
    pub fn autocommit(&self) -> bool {
        self.autocommit
    }

    /// Wait for checked-out connections to return, then close the pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Run a read. `limit` trims the returned rows; it does not rewrite the statement.
    pub async fn select(
        &self,
        sql: &str,
        args: &[Value],
        limit: Option<Limit>,
    ) -> Result<Vec<Row>, AppError> {
        let sql = to_native_placeholders(sql);
        tracing::info!("SQL: {}", sql);
        tracing::debug!(args = ?args, "args");
        let (skip, take) = limit.map(|l| l.window()).unwrap_or((0, usize::MAX));
        let rows: Vec<Row> = bind_all(sqlx::query(&sql), args)
            .fetch(&self.pool)
            .skip(skip)
            .take(take)
            .map_ok(|r| row_to_map(&r))
            .try_collect()
            .await?;
        tracing::info!("rows returned: {}", rows.len());
        Ok(rows)
    }

    /// Run a write and return the affected-row count. Without autocommit the statement runs in
    /// its own transaction, rolled back on failure before the error is returned.
    pub async fn execute(&self, sql: &str, args: &[Value], autocommit: bool) -> Result<u64, AppError> {
        let sql = to_native_placeholders(sql);
        tracing::info!("SQL: {}", sql);
        tracing::debug!(args = ?args, "args");
        if autocommit {
            let done = bind_all(sqlx::query(&sql), args).execute(&self.pool).await?;
            return Ok(done.rows_affected());
        }
        let mut tx = self.pool.begin().await?;
        match bind_all(sqlx::query(&sql), args).execute(&mut *tx).await {
            Ok(done) => {
                tx.commit().await?;
                Ok(done.rows_affected())
            }
            Err(e) => {
                if let Err(rb) = tx.rollback().await {
                    tracing::error!(error = %rb, "rollback failed");
                }
                Err(e.into())
            }
        }
    }

    /// Create the model's table if it does not exist.
    pub async fn ensure_table<M: Model>(&self) -> Result<(), AppError> {
        let schema: &ModelSchema = M::schema()?;
        self.execute(&schema.create_table_sql(), &[], true).await?;
        Ok(())
    }
}
