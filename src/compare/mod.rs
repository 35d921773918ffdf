//! Comparison utilities
//!
//! - Type-aware value ordering and equality
//! - Stable composite row ordering
//! - Field mapping resolution between captured and golden schemas

pub mod mapping;
pub mod sort;
pub mod value;

pub use mapping::{FieldResolutionError, MappingSide, ResolvedMapping, resolve_field_mappings};
pub use sort::{compare_rows, sort_rows};
pub use value::{compare_values, value_text, values_equal};
