//! Row schema and row values
//!
//! Rows are positional: value `i` of a [`Row`] belongs to field `i` of the
//! [`RowSchema`] that accompanies it. Values are JSON values so that rows
//! coming from a query executor and rows captured from a pipeline share
//! one representation.

use serde::{Deserialize, Serialize};

use super::enums::FieldType;

/// A single row of values, positionally aligned with a [`RowSchema`]
pub type Row = Vec<serde_json::Value>;

/// Metadata for one value in a row
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValueMeta {
    pub name: String,
    pub field_type: FieldType,
    #[serde(default)]
    pub length: Option<u32>,
    #[serde(default)]
    pub precision: Option<u32>,
    #[serde(default)]
    pub comment: Option<String>,
}

impl ValueMeta {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            length: None,
            precision: None,
            comment: None,
        }
    }
}

/// Ordered list of value metadata describing a row layout
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RowSchema {
    pub values: Vec<ValueMeta>,
}

impl RowSchema {
    pub fn new(values: Vec<ValueMeta>) -> Self {
        Self { values }
    }

    /// Index of the value with the given name (case-insensitive)
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.values
            .iter()
            .position(|meta| meta.name.eq_ignore_ascii_case(name))
    }

    /// Value metadata by name (case-insensitive)
    pub fn find(&self, name: &str) -> Option<&ValueMeta> {
        self.index_of(name).map(|i| &self.values[i])
    }

    pub fn get(&self, index: usize) -> Option<&ValueMeta> {
        self.values.get(index)
    }

    /// All value names in order
    pub fn field_names(&self) -> Vec<String> {
        self.values.iter().map(|meta| meta.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
