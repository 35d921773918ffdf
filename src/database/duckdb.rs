//! DuckDB query executor
//!
//! Serves data set rows from named DuckDB databases. File connections open a
//! fresh DuckDB connection per handle; in-memory connections share one
//! database per name so rows seeded through [`DuckDbExecutor::execute_batch`]
//! stay visible to later handles.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use super::{
    ConnectionHandle, DatabaseError, DatabaseResult, QueryExecutor, QueryResult, quote_identifier,
    quote_qualified,
};
use crate::config::{ConnectionBackend, TestingConfig};
use crate::models::Row;

/// Where a named connection points
#[derive(Debug, Clone, PartialEq, Eq)]
enum Target {
    File(PathBuf),
    Memory,
}

/// DuckDB implementation of [`QueryExecutor`]
pub struct DuckDbExecutor {
    targets: HashMap<String, Target>,
    /// In-memory databases by connection name
    shared: Mutex<HashMap<String, duckdb::Connection>>,
    /// Open handles
    open: Mutex<HashMap<Uuid, duckdb::Connection>>,
}

impl DuckDbExecutor {
    /// Create an executor without connections
    pub fn new() -> Self {
        Self {
            targets: HashMap::new(),
            shared: Mutex::new(HashMap::new()),
            open: Mutex::new(HashMap::new()),
        }
    }

    /// Create an executor for every connection in a configuration
    ///
    /// Relative database paths are resolved against `workspace_path`.
    pub fn from_config(config: &TestingConfig, workspace_path: &Path) -> DatabaseResult<Self> {
        let mut executor = Self::new();
        for (name, connection) in &config.connections {
            executor = match connection.backend {
                ConnectionBackend::Memory => executor.with_memory(name),
                ConnectionBackend::DuckDB => {
                    let path = config.connection_path(name, workspace_path)?.ok_or_else(|| {
                        DatabaseError::ConfigError(format!(
                            "Connection '{}' has no database path",
                            name
                        ))
                    })?;
                    executor.with_file(name, path)
                }
            };
        }
        Ok(executor)
    }

    /// Register a DuckDB database file under a connection name
    pub fn with_file(mut self, name: impl Into<String>, path: impl AsRef<Path>) -> Self {
        self.targets
            .insert(name.into(), Target::File(path.as_ref().to_path_buf()));
        self
    }

    /// Register an in-memory database under a connection name
    pub fn with_memory(mut self, name: impl Into<String>) -> Self {
        self.targets.insert(name.into(), Target::Memory);
        self
    }

    /// Names of the registered connections, sorted
    pub fn connection_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.targets.keys().cloned().collect();
        names.sort();
        names
    }

    /// Execute statements that return no rows, e.g. to seed data set tables
    pub fn execute_batch(&self, connection_name: &str, sql: &str) -> DatabaseResult<()> {
        let conn = self.open_connection(connection_name)?;
        conn.execute_batch(sql)
            .map_err(|e| DatabaseError::QueryFailed(format!("Batch execute failed: {}", e)))
    }

    /// Number of handles currently open
    pub fn open_handles(&self) -> usize {
        self.open.lock().map(|open| open.len()).unwrap_or(0)
    }

    fn open_connection(&self, connection_name: &str) -> DatabaseResult<duckdb::Connection> {
        let target = self
            .targets
            .get(connection_name)
            .ok_or_else(|| DatabaseError::UnknownConnection(connection_name.to_string()))?;

        match target {
            Target::File(path) => duckdb::Connection::open(path).map_err(|e| {
                DatabaseError::ConnectionFailed(format!(
                    "Failed to open DuckDB at {}: {}",
                    path.display(),
                    e
                ))
            }),
            Target::Memory => {
                let mut shared = self
                    .shared
                    .lock()
                    .map_err(|e| DatabaseError::ConnectionFailed(format!("Lock error: {}", e)))?;
                if !shared.contains_key(connection_name) {
                    let conn = duckdb::Connection::open_in_memory().map_err(|e| {
                        DatabaseError::ConnectionFailed(format!(
                            "Failed to create in-memory DuckDB: {}",
                            e
                        ))
                    })?;
                    shared.insert(connection_name.to_string(), conn);
                }
                let conn = shared.get(connection_name).ok_or_else(|| {
                    DatabaseError::UnknownConnection(connection_name.to_string())
                })?;
                conn.try_clone().map_err(|e| {
                    DatabaseError::ConnectionFailed(format!("Failed to clone connection: {}", e))
                })
            }
        }
    }

    fn run_query(conn: &duckdb::Connection, sql: &str) -> DatabaseResult<(Vec<String>, Vec<Row>)> {
        let mut stmt = conn
            .prepare(sql)
            .map_err(|e| DatabaseError::QueryFailed(format!("Prepare failed: {}", e)))?;

        // Columns are only known once the statement has been executed
        let mut result_rows = stmt
            .query([])
            .map_err(|e| DatabaseError::QueryFailed(format!("Query failed: {}", e)))?;

        let column_count = result_rows.as_ref().map(|r| r.column_count()).unwrap_or(0);
        let columns: Vec<String> = (0..column_count)
            .map(|i| {
                result_rows
                    .as_ref()
                    .and_then(|r| r.column_name(i).ok())
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| format!("col{}", i))
            })
            .collect();

        let mut rows = Vec::new();
        while let Some(row) = result_rows
            .next()
            .map_err(|e| DatabaseError::QueryFailed(format!("Row fetch error: {}", e)))?
        {
            let values: Row = (0..column_count)
                .map(|i| match row.get_ref(i) {
                    Ok(value_ref) => value_ref_to_json(value_ref),
                    Err(_) => serde_json::Value::Null,
                })
                .collect();
            rows.push(values);
        }

        Ok((columns, rows))
    }
}

impl Default for DuckDbExecutor {
    fn default() -> Self {
        Self::new()
    }
}

/// Convert a DuckDB ValueRef to a JSON value
///
/// Dates and timestamps become ISO-like strings so they compare as temporal
/// values; blobs are base64 encoded.
fn value_ref_to_json(value: duckdb::types::ValueRef) -> serde_json::Value {
    use duckdb::types::{TimeUnit, ValueRef};

    match value {
        ValueRef::Null => serde_json::Value::Null,
        ValueRef::Boolean(b) => serde_json::Value::Bool(b),
        ValueRef::TinyInt(i) => serde_json::Value::Number(i.into()),
        ValueRef::SmallInt(i) => serde_json::Value::Number(i.into()),
        ValueRef::Int(i) => serde_json::Value::Number(i.into()),
        ValueRef::BigInt(i) => serde_json::Value::Number(i.into()),
        // i128 may not fit in a JSON number
        ValueRef::HugeInt(i) => serde_json::Value::String(i.to_string()),
        ValueRef::UTinyInt(i) => serde_json::Value::Number(i.into()),
        ValueRef::USmallInt(i) => serde_json::Value::Number(i.into()),
        ValueRef::UInt(i) => serde_json::Value::Number(i.into()),
        ValueRef::UBigInt(i) => serde_json::Value::Number(i.into()),
        ValueRef::Float(f) => serde_json::Number::from_f64(f as f64)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        ValueRef::Double(f) => serde_json::Number::from_f64(f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        ValueRef::Decimal(d) => serde_json::Value::String(d.to_string()),
        ValueRef::Text(bytes) => String::from_utf8_lossy(bytes).into_owned().into(),
        ValueRef::Blob(bytes) => {
            use base64::Engine;
            serde_json::Value::String(base64::engine::general_purpose::STANDARD.encode(bytes))
        }
        ValueRef::Date32(days) => chrono::DateTime::from_timestamp(i64::from(days) * 86_400, 0)
            .map(|dt| serde_json::Value::String(dt.date_naive().format("%Y-%m-%d").to_string()))
            .unwrap_or(serde_json::Value::Null),
        ValueRef::Timestamp(unit, v) => {
            let micros = match unit {
                TimeUnit::Second => v.saturating_mul(1_000_000),
                TimeUnit::Millisecond => v.saturating_mul(1_000),
                TimeUnit::Microsecond => v,
                TimeUnit::Nanosecond => v / 1_000,
            };
            chrono::DateTime::from_timestamp_micros(micros)
                .map(|dt| {
                    serde_json::Value::String(
                        dt.naive_utc().format("%Y-%m-%d %H:%M:%S%.f").to_string(),
                    )
                })
                .unwrap_or(serde_json::Value::Null)
        }
        ValueRef::Time64(_, _)
        | ValueRef::Interval { .. }
        | ValueRef::List(_, _)
        | ValueRef::Enum(_, _)
        | ValueRef::Struct(_, _)
        | ValueRef::Map(_, _)
        | ValueRef::Union(_, _)
        | ValueRef::Array(_, _) => serde_json::Value::String(format!("{:?}", value)),
    }
}

#[async_trait(?Send)]
impl QueryExecutor for DuckDbExecutor {
    async fn connect(&self, connection_name: &str) -> DatabaseResult<ConnectionHandle> {
        let conn = self.open_connection(connection_name)?;
        let handle = ConnectionHandle::new(connection_name);

        self.open
            .lock()
            .map_err(|e| DatabaseError::ConnectionFailed(format!("Lock error: {}", e)))?
            .insert(handle.id, conn);

        debug!("Opened DuckDB connection '{}' ({})", connection_name, handle.id);
        Ok(handle)
    }

    fn quote_column(&self, name: &str) -> String {
        quote_identifier(name)
    }

    fn quote_schema_table(&self, schema: Option<&str>, table: &str) -> String {
        quote_qualified(schema, table)
    }

    async fn query(&self, handle: &ConnectionHandle, sql: &str) -> DatabaseResult<QueryResult> {
        let start = std::time::Instant::now();

        let open = self
            .open
            .lock()
            .map_err(|e| DatabaseError::ConnectionFailed(format!("Lock error: {}", e)))?;
        let conn = open
            .get(&handle.id)
            .ok_or(DatabaseError::InvalidHandle(handle.id))?;

        let (columns, rows) = Self::run_query(conn, sql)?;
        debug!(
            "Query on '{}' returned {} rows",
            handle.connection_name,
            rows.len()
        );

        Ok(QueryResult {
            columns,
            rows,
            execution_time_ms: start.elapsed().as_millis() as u64,
        })
    }

    async fn disconnect(&self, handle: ConnectionHandle) -> DatabaseResult<()> {
        let removed = self
            .open
            .lock()
            .map_err(|e| DatabaseError::ConnectionFailed(format!("Lock error: {}", e)))?
            .remove(&handle.id);

        match removed {
            Some(_) => Ok(()),
            None => Err(DatabaseError::InvalidHandle(handle.id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn seeded() -> DuckDbExecutor {
        let executor = DuckDbExecutor::new().with_memory("golden");
        executor
            .execute_batch(
                "golden",
                r#"
CREATE TABLE golden_out (D INTEGER, C VARCHAR, B VARCHAR, A VARCHAR, DAY DATE);
INSERT INTO golden_out VALUES
    (123456, 'c1', 'b1', 'a1', DATE '2024-01-31'),
    (123456, 'c2', 'b2', 'a2', DATE '2024-02-01');
"#,
            )
            .unwrap();
        executor
    }

    #[tokio::test]
    async fn test_memory_connection_shares_database() {
        let executor = seeded();
        let handle = executor.connect("golden").await.unwrap();
        let result = executor
            .query(&handle, "SELECT C, D, DAY FROM golden_out ORDER BY C")
            .await
            .unwrap();
        executor.disconnect(handle).await.unwrap();

        assert_eq!(result.columns, vec!["C", "D", "DAY"]);
        assert_eq!(
            result.rows[1],
            vec![json!("c2"), json!(123456), json!("2024-02-01")]
        );
        assert_eq!(executor.open_handles(), 0);
    }

    #[tokio::test]
    async fn test_unknown_connection() {
        let executor = DuckDbExecutor::new();
        assert!(matches!(
            executor.connect("nope").await,
            Err(DatabaseError::UnknownConnection(_))
        ));
    }

    #[tokio::test]
    async fn test_closed_handle_is_rejected() {
        let executor = seeded();
        let handle = executor.connect("golden").await.unwrap();
        let stale = handle.clone();
        executor.disconnect(handle).await.unwrap();

        assert!(matches!(
            executor.query(&stale, "SELECT 1").await,
            Err(DatabaseError::InvalidHandle(_))
        ));
        assert!(executor.disconnect(stale).await.is_err());
    }

    #[tokio::test]
    async fn test_file_connection_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = TestingConfig::new().with_duckdb("golden", "golden.duckdb");
        let executor = DuckDbExecutor::from_config(&config, dir.path()).unwrap();
        executor
            .execute_batch("golden", "CREATE TABLE t (x BLOB); INSERT INTO t VALUES ('\\xAA'::BLOB);")
            .unwrap();

        let handle = executor.connect("golden").await.unwrap();
        let result = executor.query(&handle, "SELECT x FROM t").await.unwrap();
        executor.disconnect(handle).await.unwrap();

        assert_eq!(result.rows, vec![vec![json!("qg==")]]);
        assert_eq!(executor.connection_names(), vec!["golden"]);
    }

    #[test]
    fn test_quoting() {
        let executor = DuckDbExecutor::new();
        assert_eq!(executor.quote_column("A"), "\"A\"");
        assert_eq!(
            executor.quote_schema_table(Some("main"), "golden_out"),
            "\"main\".\"golden_out\""
        );
    }
}
