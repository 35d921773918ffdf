//! Field descriptor model for data sets

use serde::{Deserialize, Serialize};

use super::enums::FieldType;
use super::row::ValueMeta;

/// Field descriptor representing one typed column of a data set
///
/// A field has a logical name, used by field mappings, and a physical
/// column name, used when querying the backing table.
///
/// # Example
///
/// ```rust
/// use data_testing_sdk::models::{FieldDescriptor, FieldType};
///
/// let field = FieldDescriptor::new("customer_id", "CUSTOMER_ID", FieldType::Integer);
/// assert_eq!(field.column_name, "CUSTOMER_ID");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldDescriptor {
    /// Logical field name, unique within the data set (case-insensitive)
    pub field_name: String,
    /// Physical column name in the backing table
    pub column_name: String,
    /// Value type
    #[serde(default)]
    pub field_type: FieldType,
    /// Length (e.g. string length, number of digits)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<u32>,
    /// Precision (number of decimals)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<u32>,
    /// Free-form annotation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl FieldDescriptor {
    /// Create a new field with the given names and type
    pub fn new(
        field_name: impl Into<String>,
        column_name: impl Into<String>,
        field_type: FieldType,
    ) -> Self {
        Self {
            field_name: field_name.into(),
            column_name: column_name.into(),
            field_type,
            length: None,
            precision: None,
            comment: None,
        }
    }

    pub fn with_length(mut self, length: u32, precision: Option<u32>) -> Self {
        self.length = Some(length);
        self.precision = precision;
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Value metadata for this field, named by field or column name
    pub fn value_meta(&self, use_column_name: bool) -> ValueMeta {
        let name = if use_column_name {
            &self.column_name
        } else {
            &self.field_name
        };
        ValueMeta {
            name: name.clone(),
            field_type: self.field_type,
            length: self.length,
            precision: self.precision,
            comment: self.comment.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_meta_naming() {
        let field = FieldDescriptor::new("amount", "AMT_EUR", FieldType::Number)
            .with_length(12, Some(2))
            .with_comment("gross amount");

        let by_field = field.value_meta(false);
        assert_eq!(by_field.name, "amount");
        assert_eq!(by_field.length, Some(12));
        assert_eq!(by_field.precision, Some(2));

        let by_column = field.value_meta(true);
        assert_eq!(by_column.name, "AMT_EUR");
        assert_eq!(by_column.comment.as_deref(), Some("gross amount"));
    }
}
