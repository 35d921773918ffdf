//! Unit test results

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Verdict for one evaluated golden location
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UnitTestResult {
    pub pipeline_name: String,
    pub unit_test_name: String,
    /// Empty for results not tied to a data set (e.g. pipeline failure)
    #[serde(default)]
    pub data_set_name: String,
    #[serde(default)]
    pub node_name: String,
    pub is_error: bool,
    #[serde(default)]
    pub comment: String,
}

impl UnitTestResult {
    pub fn passed(
        pipeline_name: impl Into<String>,
        unit_test_name: impl Into<String>,
        data_set_name: impl Into<String>,
        node_name: impl Into<String>,
        comment: impl Into<String>,
    ) -> Self {
        Self {
            pipeline_name: pipeline_name.into(),
            unit_test_name: unit_test_name.into(),
            data_set_name: data_set_name.into(),
            node_name: node_name.into(),
            is_error: false,
            comment: comment.into(),
        }
    }

    pub fn failed(
        pipeline_name: impl Into<String>,
        unit_test_name: impl Into<String>,
        data_set_name: impl Into<String>,
        node_name: impl Into<String>,
        comment: impl Into<String>,
    ) -> Self {
        Self {
            is_error: true,
            ..Self::passed(
                pipeline_name,
                unit_test_name,
                data_set_name,
                node_name,
                comment,
            )
        }
    }
}

/// Persisted record of one unit test run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TestRunRecord {
    pub run_id: Uuid,
    pub unit_test_name: String,
    pub pipeline_name: String,
    pub finished_at: DateTime<Utc>,
    pub passed: bool,
    #[serde(default)]
    pub results: Vec<UnitTestResult>,
}
