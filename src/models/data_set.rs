//! Data set model for the SDK

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::field::FieldDescriptor;
use super::group::DataSetGroup;
use super::row::{Row, RowSchema};
use crate::compare::{FieldResolutionError, MappingSide, sort_rows};
use crate::database::{DatabaseError, QueryExecutor};

/// Errors raised while reading a data set
#[derive(Debug, thiserror::Error)]
pub enum DataSetError {
    /// Connection or query failure in the backing store
    #[error("Unable to read rows of data set '{data_set}': {source}")]
    DataAccess {
        data_set: String,
        #[source]
        source: DatabaseError,
    },

    /// A requested field is not part of the data set
    #[error(transparent)]
    FieldResolution(#[from] FieldResolutionError),

    /// The supplied group is not the one the data set belongs to
    #[error("Data set '{data_set}' belongs to group '{expected}', not '{actual}'")]
    GroupMismatch {
        data_set: String,
        expected: String,
        actual: String,
    },

    /// A fetched row does not have one value per field
    #[error("Row {row} of data set '{data_set}' has {actual} values, expected {expected}")]
    RowShape {
        data_set: String,
        row: usize,
        expected: usize,
        actual: usize,
    },
}

/// Data set model
///
/// A named, typed record schema stored in a table of its group's
/// connection. Data sets are used both as pipeline input and as golden
/// output to compare against.
///
/// # Example
///
/// ```rust
/// use data_testing_sdk::models::{DataSet, FieldDescriptor, FieldType};
///
/// let data_set = DataSet::new("customers", "test-data", "CUSTOMERS")
///     .with_field(FieldDescriptor::new("id", "ID", FieldType::Integer))
///     .with_field(FieldDescriptor::new("name", "NAME", FieldType::String));
///
/// assert_eq!(data_set.column_for_field("NAME"), Some("NAME"));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DataSet {
    /// Data set name (unique)
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Name of the owning [`DataSetGroup`]
    pub group_name: String,
    /// Table holding the rows
    pub table_name: String,
    /// Fields in declaration order
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
}

impl DataSet {
    pub fn new(
        name: impl Into<String>,
        group_name: impl Into<String>,
        table_name: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            group_name: group_name.into(),
            table_name: table_name.into(),
            fields: Vec::new(),
        }
    }

    pub fn with_field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    /// Build the row schema of this data set
    ///
    /// Values are named by column name when `use_column_names` is set,
    /// otherwise by field name. Order is declaration order.
    pub fn materialize_schema(&self, use_column_names: bool) -> RowSchema {
        RowSchema::new(
            self.fields
                .iter()
                .map(|field| field.value_meta(use_column_names))
                .collect(),
        )
    }

    /// Find a field by name (case-insensitive)
    pub fn find_field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields
            .iter()
            .find(|field| field.field_name.eq_ignore_ascii_case(name))
    }

    /// Physical column of a field (case-insensitive field lookup)
    pub fn column_for_field(&self, name: &str) -> Option<&str> {
        self.find_field(name).map(|field| field.column_name.as_str())
    }

    /// Projection query listing every column in declaration order
    pub fn select_sql(&self, group: &DataSetGroup, executor: &dyn QueryExecutor) -> String {
        let columns: Vec<String> = self
            .fields
            .iter()
            .map(|field| executor.quote_column(&field.column_name))
            .collect();
        format!(
            "SELECT {} FROM {}",
            columns.join(", "),
            executor.quote_schema_table(group.schema_name.as_deref(), &self.table_name)
        )
    }

    /// Read every row of the data set
    ///
    /// The connection is opened right before the query and closed right
    /// after it, whether the query succeeded or not.
    pub async fn fetch_all_rows(
        &self,
        group: &DataSetGroup,
        executor: &dyn QueryExecutor,
    ) -> Result<Vec<Row>, DataSetError> {
        if group.name != self.group_name {
            return Err(DataSetError::GroupMismatch {
                data_set: self.name.clone(),
                expected: self.group_name.clone(),
                actual: group.name.clone(),
            });
        }

        let sql = self.select_sql(group, executor);
        debug!("Fetching rows of data set '{}': {}", self.name, sql);

        let handle = executor
            .connect(&group.connection_name)
            .await
            .map_err(|e| self.data_access(e))?;
        let outcome = executor.query(&handle, &sql).await;
        let released = executor.disconnect(handle).await;

        let result = match (outcome, released) {
            (Ok(result), Ok(())) => result,
            (Ok(_), Err(e)) => return Err(self.data_access(e)),
            (Err(e), Ok(())) => return Err(self.data_access(e)),
            (Err(e), Err(disconnect_err)) => {
                warn!(
                    "Failed to disconnect after query error on data set '{}': {}",
                    self.name, disconnect_err
                );
                return Err(self.data_access(e));
            }
        };

        for (i, row) in result.rows.iter().enumerate() {
            if row.len() != self.fields.len() {
                return Err(DataSetError::RowShape {
                    data_set: self.name.clone(),
                    row: i + 1,
                    expected: self.fields.len(),
                    actual: row.len(),
                });
            }
        }

        debug!(
            "Fetched {} rows from data set '{}'",
            result.rows.len(),
            self.name
        );
        Ok(result.rows)
    }

    /// Read every row, stably ordered on the given field names
    ///
    /// Every key must name a field of the data set; an empty key list keeps
    /// fetch order.
    pub async fn fetch_rows_ordered_by(
        &self,
        group: &DataSetGroup,
        executor: &dyn QueryExecutor,
        keys: &[String],
    ) -> Result<Vec<Row>, DataSetError> {
        let schema = self.materialize_schema(false);
        let indices = keys
            .iter()
            .map(|key| {
                schema.index_of(key).ok_or_else(|| {
                    FieldResolutionError::new(key, MappingSide::DataSet, &self.name, &schema)
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut rows = self.fetch_all_rows(group, executor).await?;
        sort_rows(&mut rows, &schema, &indices);
        Ok(rows)
    }

    fn data_access(&self, source: DatabaseError) -> DataSetError {
        DataSetError::DataAccess {
            data_set: self.name.clone(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FieldType;

    fn golden_out() -> DataSet {
        DataSet::new("GoldenOut", "golden", "GOLDEN_OUT")
            .with_field(FieldDescriptor::new("d", "COL_D", FieldType::Integer))
            .with_field(FieldDescriptor::new("c", "COL_C", FieldType::String))
            .with_field(FieldDescriptor::new("b", "COL_B", FieldType::String))
            .with_field(FieldDescriptor::new("a", "COL_A", FieldType::String))
    }

    #[test]
    fn test_materialize_schema_keeps_declaration_order() {
        let data_set = golden_out();
        assert_eq!(
            data_set.materialize_schema(false).field_names(),
            vec!["d", "c", "b", "a"]
        );
        assert_eq!(
            data_set.materialize_schema(true).field_names(),
            vec!["COL_D", "COL_C", "COL_B", "COL_A"]
        );
    }

    #[test]
    fn test_find_field_is_case_insensitive() {
        let data_set = golden_out();
        assert_eq!(data_set.find_field("D").unwrap().column_name, "COL_D");
        assert_eq!(data_set.column_for_field("a"), Some("COL_A"));
        assert!(data_set.find_field("zzz").is_none());
        assert!(data_set.column_for_field("zzz").is_none());
    }
}
