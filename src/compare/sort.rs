//! Stable composite row ordering

use std::cmp::Ordering;

use super::value::compare_values;
use crate::models::{Row, RowSchema};

/// Compare two rows on the given value indices, in order
///
/// The first non-equal index decides. Indices past the end of a row compare
/// as null.
pub fn compare_rows(schema: &RowSchema, indices: &[usize], left: &Row, right: &Row) -> Ordering {
    let null = serde_json::Value::Null;
    for &index in indices {
        let field_type = schema
            .get(index)
            .map(|meta| meta.field_type)
            .unwrap_or_default();
        let l = left.get(index).unwrap_or(&null);
        let r = right.get(index).unwrap_or(&null);
        match compare_values(field_type, l, r) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}

/// Stable sort of rows on the given value indices
///
/// Rows equal on every index keep their relative order. An empty index
/// list leaves the rows untouched.
pub fn sort_rows(rows: &mut [Row], schema: &RowSchema, indices: &[usize]) {
    if indices.is_empty() {
        return;
    }
    rows.sort_by(|left, right| compare_rows(schema, indices, left, right));
}
