//! Field mappings and set locations

use serde::{Deserialize, Serialize};

/// Association between a pipeline field and a data set field
///
/// `source_field_name` is the field as the pipeline node sees it,
/// `target_field_name` the data set field. A mapping with a `sort_order`
/// takes part in ordering golden rows.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldMapping {
    pub source_field_name: String,
    pub target_field_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<u32>,
}

impl FieldMapping {
    pub fn new(source_field_name: impl Into<String>, target_field_name: impl Into<String>) -> Self {
        Self {
            source_field_name: source_field_name.into(),
            target_field_name: target_field_name.into(),
            sort_order: None,
        }
    }

    pub fn sorted(mut self, sort_order: u32) -> Self {
        self.sort_order = Some(sort_order);
        self
    }

    /// Same names on both sides
    pub fn identity(field_name: impl Into<String>) -> Self {
        let name = field_name.into();
        Self::new(name.clone(), name)
    }
}

/// Binding of a pipeline node to a data set
///
/// Used for input injection and for golden verification. The data set is
/// referenced by name and looked up when the test runs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SetLocation {
    pub node_name: String,
    pub data_set_name: String,
    #[serde(default)]
    pub field_mappings: Vec<FieldMapping>,
    /// Data set fields ordering injected input rows
    #[serde(default)]
    pub field_order_keys: Vec<String>,
}

impl SetLocation {
    pub fn new(node_name: impl Into<String>, data_set_name: impl Into<String>) -> Self {
        Self {
            node_name: node_name.into(),
            data_set_name: data_set_name.into(),
            field_mappings: Vec::new(),
            field_order_keys: Vec::new(),
        }
    }

    pub fn with_mapping(mut self, mapping: FieldMapping) -> Self {
        self.field_mappings.push(mapping);
        self
    }

    pub fn with_order_key(mut self, field_name: impl Into<String>) -> Self {
        self.field_order_keys.push(field_name.into());
        self
    }
}
