//! Golden data retrieval
//!
//! Resolves the expected rows of a golden set location in a deterministic,
//! sort-stable order. Callable on its own for tooling and debugging.

pub mod resolver;

pub use resolver::{compare_indices, resolve_golden_rows, sort_field_mappings};
