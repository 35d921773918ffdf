//! Validation functionality
//!
//! Provides validation logic for:
//! - Definition validation (data sets, groups, unit tests)
//! - Input validation (names and identifiers)

pub mod definitions;
pub mod input;

pub use definitions::{
    DefinitionIssue, DefinitionValidationResult, DefinitionValidator,
};
pub use input::{
    ValidationError, validate_description, validate_element_name, validate_identifier,
};
