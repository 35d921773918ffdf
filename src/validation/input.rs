//! Input validation utilities.
//!
//! Checks names used by data sets, groups and unit tests before they reach
//! storage or a query. Table and column names are quoted when queried, but
//! they are still restricted to identifier characters so that a definition
//! created against one store stays usable against another.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum length for element names (data sets, groups, unit tests)
pub const MAX_ELEMENT_NAME_LENGTH: usize = 255;

/// Maximum length for table and column identifiers
pub const MAX_IDENTIFIER_LENGTH: usize = 255;

/// Maximum length for descriptions
pub const MAX_DESCRIPTION_LENGTH: usize = 10000;

static IDENTIFIER_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[\p{L}_][\p{L}\p{N}_$#.-]*$").expect("identifier pattern is valid")
});

/// Errors that can occur during input validation.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq)]
pub enum ValidationError {
    /// Input is empty when a value is required
    #[error("{0} cannot be empty")]
    Empty(&'static str),

    /// Input exceeds maximum allowed length
    #[error("{field} exceeds maximum length (max: {max}, got: {actual})")]
    TooLong {
        field: &'static str,
        max: usize,
        actual: usize,
    },

    /// Input contains invalid characters
    #[error("{field} contains invalid characters: {reason}")]
    InvalidCharacters { field: &'static str, reason: String },

    /// Input has invalid format
    #[error("{0}: {1}")]
    InvalidFormat(&'static str, String),
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validate the name of a stored element.
///
/// # Rules
///
/// - Must not be empty or only whitespace
/// - Must not exceed 255 characters
/// - Must not contain control characters
///
/// # Examples
///
/// ```
/// use data_testing_sdk::validation::input::validate_element_name;
///
/// assert!(validate_element_name("data set name", "Golden Out").is_ok());
/// assert!(validate_element_name("data set name", "  ").is_err());
/// ```
pub fn validate_element_name(field: &'static str, name: &str) -> ValidationResult<()> {
    if name.trim().is_empty() {
        return Err(ValidationError::Empty(field));
    }

    if name.len() > MAX_ELEMENT_NAME_LENGTH {
        return Err(ValidationError::TooLong {
            field,
            max: MAX_ELEMENT_NAME_LENGTH,
            actual: name.len(),
        });
    }

    if let Some(c) = name.chars().find(|c| c.is_control()) {
        return Err(ValidationError::InvalidCharacters {
            field,
            reason: format!("control character U+{:04X}", c as u32),
        });
    }

    Ok(())
}

/// Validate a table or column identifier.
///
/// # Rules
///
/// - Must not be empty
/// - Must not exceed 255 characters
/// - Must start with a letter or underscore
/// - May contain letters, digits, underscores, `$`, `#`, hyphens and dots
///
/// # Examples
///
/// ```
/// use data_testing_sdk::validation::input::validate_identifier;
///
/// assert!(validate_identifier("column name", "order_total").is_ok());
/// assert!(validate_identifier("column name", "1st").is_err());
/// assert!(validate_identifier("table name", "x; DROP TABLE y").is_err());
/// ```
pub fn validate_identifier(field: &'static str, name: &str) -> ValidationResult<()> {
    if name.is_empty() {
        return Err(ValidationError::Empty(field));
    }

    if name.len() > MAX_IDENTIFIER_LENGTH {
        return Err(ValidationError::TooLong {
            field,
            max: MAX_IDENTIFIER_LENGTH,
            actual: name.len(),
        });
    }

    if !IDENTIFIER_PATTERN.is_match(name) {
        let first = name.chars().next().unwrap_or_default();
        if !first.is_alphabetic() && first != '_' {
            return Err(ValidationError::InvalidFormat(
                field,
                "must start with a letter or underscore".to_string(),
            ));
        }
        let bad = name
            .chars()
            .find(|c| !(c.is_alphanumeric() || matches!(c, '_' | '$' | '#' | '.' | '-')))
            .unwrap_or_default();
        return Err(ValidationError::InvalidCharacters {
            field,
            reason: format!("invalid character: '{}'", bad),
        });
    }

    Ok(())
}

/// Validate a description string.
///
/// # Rules
///
/// - May be empty
/// - Must not exceed 10000 characters
pub fn validate_description(desc: &str) -> ValidationResult<()> {
    if desc.len() > MAX_DESCRIPTION_LENGTH {
        return Err(ValidationError::TooLong {
            field: "description",
            max: MAX_DESCRIPTION_LENGTH,
            actual: desc.len(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_rules() {
        assert!(validate_identifier("column name", "a").is_ok());
        assert!(validate_identifier("column name", "_tmp$1").is_ok());
        assert_eq!(
            validate_identifier("column name", ""),
            Err(ValidationError::Empty("column name"))
        );
        assert!(matches!(
            validate_identifier("column name", "9lives"),
            Err(ValidationError::InvalidFormat(..))
        ));
        assert!(matches!(
            validate_identifier("column name", "a b"),
            Err(ValidationError::InvalidCharacters { .. })
        ));
    }

    #[test]
    fn test_element_name_length() {
        let long = "x".repeat(MAX_ELEMENT_NAME_LENGTH + 1);
        assert!(matches!(
            validate_element_name("unit test name", &long),
            Err(ValidationError::TooLong { .. })
        ));
        assert!(validate_element_name("unit test name", "tab\there").is_err());
    }

    #[test]
    fn test_description_length() {
        assert!(validate_description("").is_ok());
        assert!(validate_description(&"d".repeat(MAX_DESCRIPTION_LENGTH + 1)).is_err());
    }
}
