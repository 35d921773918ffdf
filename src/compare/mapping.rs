//! Field mapping resolution
//!
//! Resolves each [`FieldMapping`] of a set location to positions in the
//! captured row schema (pipeline side) and the golden row schema (data set
//! side). Lookups are case-insensitive on both sides, matching
//! [`RowSchema::index_of`].

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::{FieldMapping, FieldType, RowSchema};

/// Which schema a field failed to resolve against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MappingSide {
    /// Rows captured from the pipeline node
    Captured,
    /// Rows of the data set
    DataSet,
}

impl fmt::Display for MappingSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MappingSide::Captured => write!(f, "captured rows"),
            MappingSide::DataSet => write!(f, "data set"),
        }
    }
}

/// A field could not be found in a schema
#[derive(Debug, Clone, PartialEq, thiserror::Error, Serialize, Deserialize)]
#[error("Unable to find field '{field}' in {side} '{context}'. Available fields: {}", .available.join(", "))]
pub struct FieldResolutionError {
    pub field: String,
    pub side: MappingSide,
    /// Node or data set name the schema belongs to
    pub context: String,
    pub available: Vec<String>,
}

impl FieldResolutionError {
    pub fn new(
        field: impl Into<String>,
        side: MappingSide,
        context: impl Into<String>,
        schema: &RowSchema,
    ) -> Self {
        Self {
            field: field.into(),
            side,
            context: context.into(),
            available: schema.field_names(),
        }
    }
}

/// A mapping resolved to positions in both schemas
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedMapping {
    pub source_field_name: String,
    pub target_field_name: String,
    pub source_index: usize,
    pub target_index: usize,
    /// Declared type of the data set field; drives comparison
    pub field_type: FieldType,
}

/// Resolve every mapping against the captured and golden schemas
///
/// `node_name` and `data_set_name` only label errors.
pub fn resolve_field_mappings(
    captured_schema: &RowSchema,
    golden_schema: &RowSchema,
    mappings: &[FieldMapping],
    node_name: &str,
    data_set_name: &str,
) -> Result<Vec<ResolvedMapping>, FieldResolutionError> {
    mappings
        .iter()
        .map(|mapping| {
            let source_index = captured_schema
                .index_of(&mapping.source_field_name)
                .ok_or_else(|| {
                    FieldResolutionError::new(
                        &mapping.source_field_name,
                        MappingSide::Captured,
                        node_name,
                        captured_schema,
                    )
                })?;
            let target_index = golden_schema
                .index_of(&mapping.target_field_name)
                .ok_or_else(|| {
                    FieldResolutionError::new(
                        &mapping.target_field_name,
                        MappingSide::DataSet,
                        data_set_name,
                        golden_schema,
                    )
                })?;

            Ok(ResolvedMapping {
                source_field_name: mapping.source_field_name.clone(),
                target_field_name: mapping.target_field_name.clone(),
                source_index,
                target_index,
                field_type: golden_schema.values[target_index].field_type,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ValueMeta;

    fn captured() -> RowSchema {
        RowSchema::new(vec![
            ValueMeta::new("a", FieldType::String),
            ValueMeta::new("b", FieldType::String),
            ValueMeta::new("c", FieldType::String),
        ])
    }

    fn golden() -> RowSchema {
        RowSchema::new(vec![
            ValueMeta::new("d", FieldType::Integer),
            ValueMeta::new("c", FieldType::String),
            ValueMeta::new("b", FieldType::String),
            ValueMeta::new("a", FieldType::String),
        ])
    }

    #[test]
    fn test_resolves_differently_ordered_schemas() {
        let mappings = vec![FieldMapping::new("A", "a"), FieldMapping::new("c", "C")];
        let resolved =
            resolve_field_mappings(&captured(), &golden(), &mappings, "out", "GoldenOut").unwrap();

        assert_eq!(resolved[0].source_index, 0);
        assert_eq!(resolved[0].target_index, 3);
        assert_eq!(resolved[1].source_index, 2);
        assert_eq!(resolved[1].target_index, 1);
    }

    #[test]
    fn test_unresolved_source_lists_captured_fields() {
        let mappings = vec![FieldMapping::new("zzz", "a")];
        let err = resolve_field_mappings(&captured(), &golden(), &mappings, "out", "GoldenOut")
            .unwrap_err();

        assert_eq!(err.side, MappingSide::Captured);
        assert_eq!(err.available, vec!["a", "b", "c"]);
        assert!(err.to_string().contains("zzz"));
        assert!(err.to_string().contains("a, b, c"));
    }

    #[test]
    fn test_unresolved_target_lists_data_set_fields() {
        let mappings = vec![FieldMapping::new("a", "zzz")];
        let err = resolve_field_mappings(&captured(), &golden(), &mappings, "out", "GoldenOut")
            .unwrap_err();

        assert_eq!(err.side, MappingSide::DataSet);
        assert_eq!(err.context, "GoldenOut");
        assert_eq!(err.available, vec!["d", "c", "b", "a"]);
    }
}
