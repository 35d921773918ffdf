//! Golden row resolution
//!
//! Produces the golden rows of a set location in the order the orchestrator
//! compares them:
//!
//! 1. Mappings are stably sorted on their sort order; mappings without one
//!    come first, in their original order.
//! 2. The target field of every sortable mapping is resolved to an index in
//!    the data set schema (field names, not column names). A missing field
//!    fails before any row is fetched.
//! 3. All rows are fetched and, when at least one mapping is sortable,
//!    stably sorted on those indices with type-aware comparison.

use std::cmp::Ordering;
use tracing::debug;

use crate::compare::{FieldResolutionError, MappingSide, sort_rows};
use crate::database::QueryExecutor;
use crate::models::{DataSet, DataSetError, DataSetGroup, FieldMapping, Row, RowSchema, SetLocation};

/// Stable sort of field mappings on sort order
///
/// Mappings without a sort order sort before mappings with one. Ties keep
/// their relative order.
pub fn sort_field_mappings(mappings: &[FieldMapping]) -> Vec<FieldMapping> {
    let mut sorted = mappings.to_vec();
    sorted.sort_by(|left, right| match (left.sort_order, right.sort_order) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(l), Some(r)) => l.cmp(&r),
    });
    sorted
}

/// Schema indices of the sortable mappings' target fields, in sort order
pub fn compare_indices(
    data_set: &DataSet,
    schema: &RowSchema,
    mappings: &[FieldMapping],
) -> Result<Vec<usize>, FieldResolutionError> {
    sort_field_mappings(mappings)
        .iter()
        .filter(|mapping| mapping.sort_order.is_some())
        .map(|mapping| {
            schema.index_of(&mapping.target_field_name).ok_or_else(|| {
                FieldResolutionError::new(
                    &mapping.target_field_name,
                    MappingSide::DataSet,
                    &data_set.name,
                    schema,
                )
            })
        })
        .collect()
}

/// Fetch the golden rows of a location in comparison order
///
/// Two calls against an unchanged data set return identically ordered rows.
pub async fn resolve_golden_rows(
    executor: &dyn QueryExecutor,
    group: &DataSetGroup,
    data_set: &DataSet,
    location: &SetLocation,
) -> Result<Vec<Row>, DataSetError> {
    let schema = data_set.materialize_schema(false);
    let indices = compare_indices(data_set, &schema, &location.field_mappings)?;

    let mut rows = data_set.fetch_all_rows(group, executor).await?;
    if !indices.is_empty() {
        debug!(
            "Sorting {} golden rows of data set '{}' on {} field(s)",
            rows.len(),
            data_set.name,
            indices.len()
        );
        sort_rows(&mut rows, &schema, &indices);
    }

    Ok(rows)
}
