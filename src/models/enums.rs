//! Enums for data sets and unit tests
//!
//! # Serde Casing Conventions
//!
//! - `SCREAMING_SNAKE_CASE`: Technical constants stored alongside definitions
//!   (FieldType, TweakMode, TestType)
//! - `camelCase`: Pipeline locator tags

use serde::{Deserialize, Serialize};

/// Value type of a data set field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldType {
    #[default]
    String,
    Integer,
    Number,
    BigNumber,
    Date,
    Timestamp,
    Boolean,
    Binary,
    Internet,
    Json,
}

impl FieldType {
    /// Whether values of this type compare numerically
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            FieldType::Integer | FieldType::Number | FieldType::BigNumber
        )
    }

    /// Whether values of this type compare chronologically
    pub fn is_temporal(&self) -> bool {
        matches!(self, FieldType::Date | FieldType::Timestamp)
    }
}

impl std::str::FromStr for FieldType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "STRING" | "VARCHAR" | "TEXT" => Ok(FieldType::String),
            "INTEGER" | "INT" | "BIGINT" => Ok(FieldType::Integer),
            "NUMBER" | "DOUBLE" | "FLOAT" => Ok(FieldType::Number),
            "BIGNUMBER" | "BIG_NUMBER" | "DECIMAL" | "NUMERIC" => Ok(FieldType::BigNumber),
            "DATE" => Ok(FieldType::Date),
            "TIMESTAMP" | "DATETIME" => Ok(FieldType::Timestamp),
            "BOOLEAN" | "BOOL" => Ok(FieldType::Boolean),
            "BINARY" | "BLOB" => Ok(FieldType::Binary),
            "INTERNET" | "INET" => Ok(FieldType::Internet),
            "JSON" => Ok(FieldType::Json),
            _ => Err(format!("Unknown field type: {}", s)),
        }
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FieldType::String => "STRING",
            FieldType::Integer => "INTEGER",
            FieldType::Number => "NUMBER",
            FieldType::BigNumber => "BIG_NUMBER",
            FieldType::Date => "DATE",
            FieldType::Timestamp => "TIMESTAMP",
            FieldType::Boolean => "BOOLEAN",
            FieldType::Binary => "BINARY",
            FieldType::Internet => "INTERNET",
            FieldType::Json => "JSON",
        };
        write!(f, "{}", name)
    }
}

/// Structural modification applied to one pipeline node for a test run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TweakMode {
    /// Leave the node untouched
    #[default]
    None,
    /// Route rows around the node, keeping downstream hops
    Bypass,
    /// Delete the node and every hop touching it
    Remove,
}

impl std::fmt::Display for TweakMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TweakMode::None => write!(f, "NONE"),
            TweakMode::Bypass => write!(f, "BYPASS"),
            TweakMode::Remove => write!(f, "REMOVE"),
        }
    }
}

/// Kind of unit test
///
/// `Development` tests only inject input rows and run the pipeline; no
/// golden comparison takes place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TestType {
    None,
    Development,
    #[default]
    UnitTest,
}

impl TestType {
    /// Whether golden locations are compared after execution
    pub fn compares_golden_rows(&self) -> bool {
        !matches!(self, TestType::Development)
    }
}

impl std::str::FromStr for TestType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().replace('-', "_").as_str() {
            "NONE" => Ok(TestType::None),
            "DEVELOPMENT" => Ok(TestType::Development),
            "UNIT_TEST" => Ok(TestType::UnitTest),
            _ => Err(format!("Unknown test type: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_type_from_str_aliases() {
        assert_eq!("varchar".parse::<FieldType>().unwrap(), FieldType::String);
        assert_eq!("BIGINT".parse::<FieldType>().unwrap(), FieldType::Integer);
        assert_eq!("decimal".parse::<FieldType>().unwrap(), FieldType::BigNumber);
        assert!("geometry".parse::<FieldType>().is_err());
    }

    #[test]
    fn test_field_type_serde_casing() {
        let yaml = serde_yaml::to_string(&FieldType::BigNumber).unwrap();
        assert_eq!(yaml.trim(), "BIG_NUMBER");
        let parsed: TweakMode = serde_yaml::from_str("BYPASS").unwrap();
        assert_eq!(parsed, TweakMode::Bypass);
    }

    #[test]
    fn test_development_skips_comparison() {
        assert!(!TestType::Development.compares_golden_rows());
        assert!(TestType::UnitTest.compares_golden_rows());
        assert!(TestType::None.compares_golden_rows());
    }
}
