//! Data set group model

use serde::{Deserialize, Serialize};

/// Shared storage namespace for several data sets
///
/// All data sets in a group are read through the same connection and live
/// in the same (optional) schema.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DataSetGroup {
    /// Group name (unique)
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Name of the connection the query executor opens
    pub connection_name: String,
    /// Schema holding the data set tables
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_name: Option<String>,
}

impl DataSetGroup {
    pub fn new(name: impl Into<String>, connection_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            connection_name: connection_name.into(),
            schema_name: None,
        }
    }

    pub fn with_schema(mut self, schema_name: impl Into<String>) -> Self {
        self.schema_name = Some(schema_name.into());
        self
    }
}
