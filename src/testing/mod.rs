//! Unit test execution
//!
//! Turns a [`TransUnitTest`](crate::models::TransUnitTest) into a pipeline
//! run and a verdict. The [`TestOrchestrator`] walks each run through
//! explicit phases:
//!
//! ```text
//! Defined -> Prepared -> Executed -> Compared -> Passed | Failed
//!    \           \           \
//!     +-----------+-----------+--> SetupError
//! ```
//!
//! Setup errors (missing data sets, nodes or fields) mean the test
//! definition is broken; they are reported apart from golden mismatches.

use async_trait::async_trait;
use std::collections::HashMap;

pub mod orchestrator;
pub mod report;
pub mod run;

pub use orchestrator::{TestOrchestrator, verify_location};
pub use report::{OutputFormat, format_results};
pub use run::{TestRunReport, TestState};

use crate::compare::FieldResolutionError;
use crate::model::{ModelLoader, ModelSaver};
use crate::models::{DataSet, DataSetError, DataSetGroup, TestRunRecord};
use crate::pipeline::PipelineError;
use crate::storage::{StorageBackend, StorageError};

/// Configuration faults in a unit test definition
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("Invalid unit test definition: {0}")]
    InvalidDefinition(String),

    #[error("Unable to find pipeline, tried: {}", .tried.join(", "))]
    PipelineNotFound { tried: Vec<String> },

    #[error("Data set '{data_set}' used at node '{node}' does not exist")]
    DataSetNotFound { data_set: String, node: String },

    #[error("Group '{group}' of data set '{data_set}' does not exist")]
    GroupNotFound { group: String, data_set: String },

    #[error("Unable to find {purpose} node '{node}' in pipeline '{pipeline}'")]
    NodeNotFound {
        node: String,
        /// What the node was needed for: tweak, input or golden
        purpose: &'static str,
        pipeline: String,
    },

    #[error(transparent)]
    FieldResolution(#[from] FieldResolutionError),

    #[error("Unable to prepare pipeline: {0}")]
    Engine(#[source] PipelineError),
}

/// Errors that end a unit test run without a verdict
#[derive(Debug, thiserror::Error)]
pub enum TestError {
    /// Broken test definition; reported as a SetupError state by the orchestrator
    #[error(transparent)]
    Setup(#[from] SetupError),

    /// Failure reading data set rows
    #[error(transparent)]
    DataAccess(DataSetError),

    /// Unexpected pipeline engine fault
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// Failure loading definitions or persisting results
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<DataSetError> for TestError {
    fn from(e: DataSetError) -> Self {
        match e {
            DataSetError::FieldResolution(err) => TestError::Setup(SetupError::FieldResolution(err)),
            DataSetError::GroupMismatch { .. } => {
                TestError::Setup(SetupError::InvalidDefinition(e.to_string()))
            }
            other => TestError::DataAccess(other),
        }
    }
}

/// Looks up data sets and groups by name at run time
#[async_trait(?Send)]
pub trait DataSetLookup {
    async fn data_set(&self, name: &str) -> Result<Option<DataSet>, StorageError>;

    async fn group(&self, name: &str) -> Result<Option<DataSetGroup>, StorageError>;
}

#[async_trait(?Send)]
impl<B: StorageBackend> DataSetLookup for ModelLoader<B> {
    async fn data_set(&self, name: &str) -> Result<Option<DataSet>, StorageError> {
        self.load_data_set(name).await
    }

    async fn group(&self, name: &str) -> Result<Option<DataSetGroup>, StorageError> {
        self.load_group(name).await
    }
}

/// In-memory data set lookup
#[derive(Debug, Clone, Default)]
pub struct DataSetCatalog {
    data_sets: HashMap<String, DataSet>,
    groups: HashMap<String, DataSetGroup>,
}

impl DataSetCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_group(mut self, group: DataSetGroup) -> Self {
        self.groups.insert(group.name.clone(), group);
        self
    }

    pub fn with_data_set(mut self, data_set: DataSet) -> Self {
        self.data_sets.insert(data_set.name.clone(), data_set);
        self
    }
}

#[async_trait(?Send)]
impl DataSetLookup for DataSetCatalog {
    async fn data_set(&self, name: &str) -> Result<Option<DataSet>, StorageError> {
        Ok(self.data_sets.get(name).cloned())
    }

    async fn group(&self, name: &str) -> Result<Option<DataSetGroup>, StorageError> {
        Ok(self.groups.get(name).cloned())
    }
}

/// Receives run records of tests that ask for their results to be kept
#[async_trait(?Send)]
pub trait ResultSink {
    async fn persist(&self, record: &TestRunRecord) -> Result<(), StorageError>;
}

#[async_trait(?Send)]
impl<B: StorageBackend> ResultSink for ModelSaver<B> {
    async fn persist(&self, record: &TestRunRecord) -> Result<(), StorageError> {
        self.save_run(record).await
    }
}
