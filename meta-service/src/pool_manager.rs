//! Per-request connection pools.
//!
//! Every request gets its own pool for its own descriptor. The pool is closed
//! when the work finishes, whether it succeeded, failed, timed out, or the
//! request future was dropped. Work that did not finish has its server-side
//! statements cancelled before the pool is closed.

use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use sqlx::postgres::{PgConnectOptions, PgConnection, PgPool, PgPoolOptions, PgRow};
use sqlx::{Column, Connection, Row, TypeInfo, ValueRef};

use common::config::AppConfig;
use common::errors::{AppError, AppResult};
use common::models::role::rfc3339_millis;
use common::models::ConnectionConfig;

/// Upper bound on waiting for a pool to drain during teardown.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens, lends out and tears down per-request pools.
#[derive(Debug, Clone)]
pub struct PoolManager {
    max_connections: u32,
    connect_timeout: Duration,
    query_timeout: Duration,
}

impl PoolManager {
    /// Creates a pool manager from the application configuration.
    pub fn new(config: &AppConfig) -> Self {
        Self {
            max_connections: config.max_connections,
            connect_timeout: Duration::from_secs(config.connect_timeout_secs),
            query_timeout: Duration::from_secs(config.query_timeout_secs),
        }
    }

    /// Runs `work` against a fresh pool for `conn` and closes the pool after.
    ///
    /// Connecting and the work together are bounded by the configured query
    /// timeout. The server enforces the same budget per statement. Closing
    /// the pool happens outside the budget.
    ///
    /// # Errors
    /// `AppError::DatabaseConnection` when the pool cannot be established,
    /// `AppError::Timeout` when the budget runs out, or whatever `work`
    /// returns.
    pub async fn with_pool<T, F, Fut>(&self, conn: &ConnectionConfig, work: F) -> AppResult<T>
    where
        F: FnOnce(PgPool) -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        let options = self.connect_options(conn);
        let mut guard = PoolGuard::new(options.clone());

        let scoped = async {
            let pool = self.open_pool(conn, options, guard.backends.clone()).await?;
            guard.pool = Some(pool.clone());
            work(pool).await
        };

        let outcome = tokio::time::timeout(self.query_timeout, scoped).await;
        match outcome {
            Ok(result) => {
                guard.close().await;
                result
            }
            Err(_) => {
                tracing::warn!(
                    host = %conn.host,
                    database = %conn.database,
                    timeout_secs = self.query_timeout.as_secs(),
                    "Database work timed out"
                );
                guard.abandon().await;
                Err(AppError::Timeout(self.query_timeout.as_secs()))
            }
        }
    }

    /// Executes arbitrary SQL and returns the rows as JSON objects.
    ///
    /// Uses the simple query protocol, so several `;`-separated statements
    /// may be sent at once.
    pub async fn execute(&self, conn: &ConnectionConfig, sql: &str) -> AppResult<Vec<Value>> {
        self.with_pool(conn, |pool| async move {
            let start = Instant::now();
            let rows = sqlx::raw_sql(sql).fetch_all(&pool).await?;
            tracing::debug!(
                rows = rows.len(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Query executed"
            );
            rows.iter().map(row_to_json).collect()
        })
        .await
    }

    /// Descriptor options plus server-side statement and lock timeouts.
    fn connect_options(&self, conn: &ConnectionConfig) -> PgConnectOptions {
        let millis = self.query_timeout.as_millis().to_string();
        conn.connect_options().options([
            ("statement_timeout", millis.as_str()),
            ("lock_timeout", millis.as_str()),
        ])
    }

    async fn open_pool(
        &self,
        conn: &ConnectionConfig,
        options: PgConnectOptions,
        backends: Backends,
    ) -> AppResult<PgPool> {
        let pool = PgPoolOptions::new()
            .max_connections(self.max_connections)
            .min_connections(0)
            .acquire_timeout(self.connect_timeout)
            .after_connect(move |connection, _meta| {
                let backends = backends.clone();
                Box::pin(async move {
                    let pid: i32 = sqlx::query_scalar("SELECT pg_backend_pid()")
                        .fetch_one(&mut *connection)
                        .await?;
                    backends.record(pid);
                    Ok(())
                })
            })
            .connect_with(options)
            .await
            .map_err(|e| AppError::DatabaseConnection(e.to_string()))?;

        tracing::debug!(host = %conn.host, port = conn.port, database = %conn.database, "Pool opened");
        Ok(pool)
    }
}

/// Backend process ids of the connections a pool has opened.
#[derive(Debug, Clone, Default)]
struct Backends(Arc<Mutex<Vec<i32>>>);

impl Backends {
    fn record(&self, pid: i32) {
        if let Ok(mut pids) = self.0.lock() {
            pids.push(pid);
        }
    }

    fn snapshot(&self) -> Vec<i32> {
        self.0.lock().map(|pids| pids.clone()).unwrap_or_default()
    }
}

/// Closes its pool exactly once.
///
/// `close` is the path for finished work. `abandon` cancels whatever the
/// pool's backends are still running, then closes. Dropping the guard without
/// either (the request future was cancelled) spawns `abandon` onto the
/// runtime.
struct PoolGuard {
    pool: Option<PgPool>,
    options: PgConnectOptions,
    backends: Backends,
}

impl PoolGuard {
    fn new(options: PgConnectOptions) -> Self {
        Self {
            pool: None,
            options,
            backends: Backends::default(),
        }
    }

    async fn close(mut self) {
        if let Some(pool) = self.pool.take() {
            close_pool(pool).await;
        }
    }

    async fn abandon(mut self) {
        if let Some(pool) = self.pool.take() {
            abandon_pool(pool, self.options.clone(), self.backends.snapshot()).await;
        }
    }
}

impl Drop for PoolGuard {
    fn drop(&mut self) {
        if let Some(pool) = self.pool.take() {
            match tokio::runtime::Handle::try_current() {
                Ok(handle) => {
                    handle.spawn(abandon_pool(
                        pool,
                        self.options.clone(),
                        self.backends.snapshot(),
                    ));
                }
                Err(_) => tracing::warn!("No runtime available to close an abandoned pool"),
            }
        }
    }
}

async fn abandon_pool(pool: PgPool, options: PgConnectOptions, pids: Vec<i32>) {
    if !pids.is_empty()
        && tokio::time::timeout(CLOSE_TIMEOUT, cancel_backends(&options, &pids))
            .await
            .is_err()
    {
        tracing::warn!(
            timeout_secs = CLOSE_TIMEOUT.as_secs(),
            "Cancelling abandoned statements did not finish in time"
        );
    }
    close_pool(pool).await;
}

/// Sends `pg_cancel_backend` for each pid over a separate connection.
async fn cancel_backends(options: &PgConnectOptions, pids: &[i32]) {
    let mut side = match PgConnection::connect_with(options).await {
        Ok(side) => side,
        Err(e) => {
            tracing::warn!(error = %e, "Could not connect to cancel abandoned statements");
            return;
        }
    };
    for pid in pids {
        match sqlx::query("SELECT pg_cancel_backend($1)")
            .bind(pid)
            .execute(&mut side)
            .await
        {
            Ok(_) => tracing::debug!(pid, "Cancelled backend"),
            Err(e) => tracing::warn!(pid, error = %e, "Failed to cancel backend"),
        }
    }
    if let Err(e) = side.close().await {
        tracing::debug!(error = %e, "Cancel connection did not close cleanly");
    }
}

async fn close_pool(pool: PgPool) {
    if tokio::time::timeout(CLOSE_TIMEOUT, pool.close()).await.is_err() {
        tracing::warn!(
            timeout_secs = CLOSE_TIMEOUT.as_secs(),
            "Pool did not close in time"
        );
    } else {
        tracing::debug!("Pool closed");
    }
}

/// Converts a row to a JSON object keyed by column name.
fn row_to_json(row: &PgRow) -> AppResult<Value> {
    let mut object = Map::with_capacity(row.len());
    for (idx, column) in row.columns().iter().enumerate() {
        object.insert(column.name().to_string(), column_to_json(row, idx)?);
    }
    Ok(Value::Object(object))
}

fn column_to_json(row: &PgRow, idx: usize) -> AppResult<Value> {
    let raw = row.try_get_raw(idx)?;
    if raw.is_null() {
        return Ok(Value::Null);
    }
    let type_name = raw.type_info().name().to_string();

    let value = match type_name.as_str() {
        "BOOL" => Value::Bool(row.try_get::<bool, _>(idx)?),
        "INT2" => Value::from(row.try_get::<i16, _>(idx)?),
        "INT4" => Value::from(row.try_get::<i32, _>(idx)?),
        "INT8" => Value::from(row.try_get::<i64, _>(idx)?),
        "FLOAT4" => Value::from(f64::from(row.try_get::<f32, _>(idx)?)),
        "FLOAT8" => Value::from(row.try_get::<f64, _>(idx)?),
        "JSON" | "JSONB" => row.try_get::<Value, _>(idx)?,
        // Values the rich decoders reject (multi-dimensional arrays,
        // `infinity`) fall back to their text form.
        "TIMESTAMPTZ" => match row.try_get::<DateTime<Utc>, _>(idx) {
            Ok(at) => Value::String(rfc3339_millis::format(&at)),
            Err(_) => text(row, idx)?,
        },
        array if array.ends_with("[]") => match array_to_json(row, idx, array) {
            Ok(Some(value)) => value,
            Ok(None) | Err(_) => text(row, idx)?,
        },
        _ => text(row, idx)?,
    };
    Ok(value)
}

/// Decodes one-dimensional arrays of scalar element types.
fn array_to_json(row: &PgRow, idx: usize, type_name: &str) -> Result<Option<Value>, sqlx::Error> {
    let value = match type_name {
        "BOOL[]" => Value::from(row.try_get::<Vec<Option<bool>>, _>(idx)?),
        "INT2[]" => Value::from(row.try_get::<Vec<Option<i16>>, _>(idx)?),
        "INT4[]" => Value::from(row.try_get::<Vec<Option<i32>>, _>(idx)?),
        "INT8[]" => Value::from(row.try_get::<Vec<Option<i64>>, _>(idx)?),
        "FLOAT4[]" => Value::from(
            row.try_get::<Vec<Option<f32>>, _>(idx)?
                .into_iter()
                .map(|v| v.map(f64::from))
                .collect::<Vec<_>>(),
        ),
        "FLOAT8[]" => Value::from(row.try_get::<Vec<Option<f64>>, _>(idx)?),
        "TEXT[]" | "VARCHAR[]" | "NAME[]" | "BPCHAR[]" => {
            Value::from(row.try_get_unchecked::<Vec<Option<String>>, _>(idx)?)
        }
        _ => return Ok(None),
    };
    Ok(Some(value))
}

// Simple-protocol results arrive as text, so any type can be read as its
// textual form.
fn text(row: &PgRow, idx: usize) -> AppResult<Value> {
    Ok(Value::String(row.try_get_unchecked::<String, _>(idx)?))
}
