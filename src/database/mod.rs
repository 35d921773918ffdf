//! Query executor abstraction for data set retrieval
//!
//! Data set rows live in a relational store. This module defines the thin
//! contract the SDK needs from it:
//! - connect to a named connection and get a handle back
//! - quote identifiers in the store's dialect
//! - run a projection query and return positional rows
//! - disconnect
//!
//! A DuckDB implementation is available behind the `duckdb-backend` feature.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(feature = "duckdb-backend")]
pub mod duckdb;

#[cfg(feature = "duckdb-backend")]
pub use self::duckdb::DuckDbExecutor;

use crate::models::Row;

/// Error type for database operations
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    /// Failed to connect to database
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Unknown connection name
    #[error("Unknown connection: {0}")]
    UnknownConnection(String),

    /// Handle does not belong to an open connection
    #[error("Connection handle {0} is not open")]
    InvalidHandle(Uuid),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(String),
}

/// Result type for database operations
pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// Handle to an open connection
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnectionHandle {
    pub id: Uuid,
    /// Name of the connection this handle was opened for
    pub connection_name: String,
}

impl ConnectionHandle {
    pub fn new(connection_name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            connection_name: connection_name.into(),
        }
    }
}

/// Query result set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResult {
    /// Column names
    pub columns: Vec<String>,
    /// Rows of data, positionally aligned with `columns`
    pub rows: Vec<Row>,
    /// Execution time in milliseconds
    pub execution_time_ms: u64,
}

impl QueryResult {
    /// Create a new query result
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self {
            columns,
            rows,
            execution_time_ms: 0,
        }
    }

    /// Create an empty result
    pub fn empty() -> Self {
        Self::new(Vec::new(), Vec::new())
    }

    /// Get the number of rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Check if the result is empty
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Query executor trait
///
/// Each test run should use its own executor instance; isolation between
/// concurrent runs is the executor's concern.
#[async_trait(?Send)]
pub trait QueryExecutor {
    /// Open a connection by name
    async fn connect(&self, connection_name: &str) -> DatabaseResult<ConnectionHandle>;

    /// Quote a column name in the store's dialect
    fn quote_column(&self, name: &str) -> String;

    /// Quote a table name, optionally qualified by a schema
    fn quote_schema_table(&self, schema: Option<&str>, table: &str) -> String;

    /// Run a query on an open connection
    async fn query(&self, handle: &ConnectionHandle, sql: &str) -> DatabaseResult<QueryResult>;

    /// Close a connection
    async fn disconnect(&self, handle: ConnectionHandle) -> DatabaseResult<()>;
}

/// ANSI double-quote identifier quoting
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// ANSI schema-qualified table quoting
pub fn quote_qualified(schema: Option<&str>, table: &str) -> String {
    match schema {
        Some(schema) if !schema.is_empty() => {
            format!("{}.{}", quote_identifier(schema), quote_identifier(table))
        }
        _ => quote_identifier(table),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_identifier_escapes_quotes() {
        assert_eq!(quote_identifier("name"), "\"name\"");
        assert_eq!(quote_identifier("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn test_quote_qualified() {
        assert_eq!(quote_qualified(Some("gold"), "out"), "\"gold\".\"out\"");
        assert_eq!(quote_qualified(Some(""), "out"), "\"out\"");
        assert_eq!(quote_qualified(None, "out"), "\"out\"");
    }

    #[test]
    fn test_query_result_empty() {
        let result = QueryResult::empty();
        assert!(result.is_empty());
        assert_eq!(result.row_count(), 0);
    }
}
