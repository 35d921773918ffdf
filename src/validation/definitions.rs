//! Definition validation functionality
//!
//! Validates data sets, groups and unit tests for structural problems that
//! would make a test run meaningless: duplicate field names, duplicate tweak
//! targets, empty mappings, missing pipeline locators.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::input::{validate_description, validate_element_name, validate_identifier};
use crate::models::{DataSet, DataSetGroup, SetLocation, TransUnitTest};

/// One problem found in a definition
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DefinitionIssue {
    /// Name of the element the issue belongs to
    pub element: String,
    pub message: String,
}

/// Result of definition validation.
#[derive(Debug, Default, Serialize, Deserialize)]
#[must_use = "validation results should be checked for issues"]
pub struct DefinitionValidationResult {
    pub issues: Vec<DefinitionIssue>,
}

impl DefinitionValidationResult {
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }

    /// All messages joined into one line
    pub fn summary(&self) -> String {
        self.issues
            .iter()
            .map(|issue| format!("{}: {}", issue.element, issue.message))
            .collect::<Vec<_>>()
            .join("; ")
    }

    fn push(&mut self, element: &str, message: impl Into<String>) {
        self.issues.push(DefinitionIssue {
            element: element.to_string(),
            message: message.into(),
        });
    }
}

/// Definition validator
#[derive(Default)]
pub struct DefinitionValidator;

impl DefinitionValidator {
    /// Create a new definition validator
    ///
    /// # Example
    ///
    /// ```rust
    /// use data_testing_sdk::validation::definitions::DefinitionValidator;
    /// use data_testing_sdk::models::{DataSet, FieldDescriptor, FieldType};
    ///
    /// let data_set = DataSet::new("ds", "group", "T")
    ///     .with_field(FieldDescriptor::new("id", "ID", FieldType::Integer))
    ///     .with_field(FieldDescriptor::new("ID", "ID2", FieldType::Integer));
    ///
    /// let result = DefinitionValidator::new().validate_data_set(&data_set);
    /// assert!(!result.is_valid());
    /// ```
    pub fn new() -> Self {
        Self
    }

    /// Validate a data set
    ///
    /// Field names and column names must both be unique, ignoring case.
    pub fn validate_data_set(&self, data_set: &DataSet) -> DefinitionValidationResult {
        let mut result = DefinitionValidationResult::default();
        let element = data_set.name.as_str();

        if let Err(e) = validate_element_name("data set name", &data_set.name) {
            result.push(element, e.to_string());
        }
        if let Err(e) = validate_element_name("group name", &data_set.group_name) {
            result.push(element, e.to_string());
        }
        if let Err(e) = validate_identifier("table name", &data_set.table_name) {
            result.push(element, e.to_string());
        }
        if let Err(e) = validate_description(&data_set.description) {
            result.push(element, e.to_string());
        }
        if data_set.fields.is_empty() {
            result.push(element, "data set has no fields");
        }

        let mut field_names = HashSet::new();
        let mut column_names = HashSet::new();
        for field in &data_set.fields {
            if let Err(e) = validate_element_name("field name", &field.field_name) {
                result.push(element, e.to_string());
            }
            if let Err(e) = validate_identifier("column name", &field.column_name) {
                result.push(element, e.to_string());
            }
            if !field_names.insert(field.field_name.to_lowercase()) {
                result.push(
                    element,
                    format!("duplicate field name '{}'", field.field_name),
                );
            }
            if !column_names.insert(field.column_name.to_lowercase()) {
                result.push(
                    element,
                    format!("duplicate column name '{}'", field.column_name),
                );
            }
        }

        result
    }

    /// Validate a data set group
    pub fn validate_group(&self, group: &DataSetGroup) -> DefinitionValidationResult {
        let mut result = DefinitionValidationResult::default();
        let element = group.name.as_str();

        if let Err(e) = validate_element_name("group name", &group.name) {
            result.push(element, e.to_string());
        }
        if let Err(e) = validate_element_name("connection name", &group.connection_name) {
            result.push(element, e.to_string());
        }
        if let Some(schema) = &group.schema_name
            && !schema.is_empty()
            && let Err(e) = validate_identifier("schema name", schema)
        {
            result.push(element, e.to_string());
        }

        result
    }

    /// Validate a unit test definition
    ///
    /// Checks names, pipeline locators, tweak uniqueness per node and the
    /// shape of every set location. Whether data sets and nodes exist is
    /// only known when the test runs.
    pub fn validate_unit_test(&self, unit_test: &TransUnitTest) -> DefinitionValidationResult {
        let mut result = DefinitionValidationResult::default();
        let element = unit_test.name.as_str();

        if let Err(e) = validate_element_name("unit test name", &unit_test.name) {
            result.push(element, e.to_string());
        }
        if let Err(e) = validate_description(&unit_test.description) {
            result.push(element, e.to_string());
        }
        if unit_test.pipeline.is_empty() {
            result.push(element, "no pipeline reference (id, path or filename)");
        }

        let mut tweaked = HashSet::new();
        for tweak in &unit_test.tweaks {
            if tweak.node_name.trim().is_empty() {
                result.push(element, "tweak without node name");
            } else if !tweaked.insert(tweak.node_name.as_str()) {
                result.push(
                    element,
                    format!("more than one tweak for node '{}'", tweak.node_name),
                );
            }
        }

        for location in &unit_test.input_locations {
            self.check_location(&mut result, element, "input", location);
        }
        for location in &unit_test.golden_locations {
            self.check_location(&mut result, element, "golden", location);
        }

        let mut golden_targets = HashSet::new();
        for location in &unit_test.golden_locations {
            let target = (
                location.node_name.as_str(),
                location.data_set_name.to_lowercase(),
            );
            if !golden_targets.insert(target) {
                result.push(
                    element,
                    format!(
                        "data set '{}' verified twice at node '{}'",
                        location.data_set_name, location.node_name
                    ),
                );
            }
        }

        for replacement in &unit_test.database_replacements {
            if replacement.original_connection_name.trim().is_empty()
                || replacement.replacement_connection_name.trim().is_empty()
            {
                result.push(element, "database replacement with empty connection name");
            }
        }

        result
    }

    fn check_location(
        &self,
        result: &mut DefinitionValidationResult,
        element: &str,
        kind: &str,
        location: &SetLocation,
    ) {
        if location.node_name.trim().is_empty() {
            result.push(element, format!("{} location without node name", kind));
        }
        if location.data_set_name.trim().is_empty() {
            result.push(
                element,
                format!(
                    "{} location '{}' has no data set",
                    kind, location.node_name
                ),
            );
        }
        for mapping in &location.field_mappings {
            if mapping.source_field_name.trim().is_empty()
                || mapping.target_field_name.trim().is_empty()
            {
                result.push(
                    element,
                    format!(
                        "{} location '{}' has a field mapping with an empty name",
                        kind, location.node_name
                    ),
                );
            }
        }
    }
}
