//! Pipeline engine contract
//!
//! The SDK does not run pipelines itself. The engine that does exposes the
//! operations below; the orchestrator drives them in explicit phases
//! instead of reacting to engine lifecycle events.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::models::{PipelineLocator, Row, RowSchema};

/// Error type for pipeline engine operations
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The handle does not refer to a node of the loaded pipeline
    #[error("Node not found in pipeline: {0}")]
    NodeNotFound(String),

    /// The engine refused a structural change
    #[error("Unable to modify node '{node}': {reason}")]
    ModificationFailed { node: String, reason: String },

    /// The connection to replace is unknown to the pipeline
    #[error("Connection not found in pipeline: {0}")]
    ConnectionNotFound(String),

    /// No rows were captured for a node that was not observed
    #[error("Node '{0}' was not observed during the run")]
    NotObserved(String),

    /// Failure loading a pipeline
    #[error("Unable to load pipeline from {locator}: {reason}")]
    LoadFailed { locator: String, reason: String },

    /// Any other engine fault
    #[error("Pipeline engine error: {0}")]
    Engine(String),
}

/// Result type for pipeline engine operations
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Handle to a node of a loaded pipeline
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeHandle {
    pub name: String,
    /// Engine-specific node identifier
    pub id: String,
}

impl NodeHandle {
    pub fn new(name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
        }
    }
}

/// Outcome of a completed run
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunOutcome {
    pub success: bool,
    pub error_count: u64,
    /// Engine log excerpt or error detail
    #[serde(default)]
    pub detail: Option<String>,
}

impl RunOutcome {
    pub fn succeeded() -> Self {
        Self {
            success: true,
            error_count: 0,
            detail: None,
        }
    }

    pub fn failed(error_count: u64, detail: impl Into<String>) -> Self {
        Self {
            success: false,
            error_count,
            detail: Some(detail.into()),
        }
    }

    /// Successful run without errors
    pub fn is_clean(&self) -> bool {
        self.success && self.error_count == 0
    }
}

/// Rows that flowed past an observed node
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CapturedRows {
    pub schema: RowSchema,
    pub rows: Vec<Row>,
}

/// A loaded pipeline that can be modified, run and observed
#[async_trait(?Send)]
pub trait PipelineEngine {
    /// Name of the loaded pipeline
    fn pipeline_name(&self) -> String;

    /// Locate a node by name
    fn find_node(&self, name: &str) -> Option<NodeHandle>;

    /// Route rows around a node, keeping downstream hops
    fn bypass_node(&mut self, node: &NodeHandle) -> PipelineResult<()>;

    /// Delete a node and all hops touching it
    fn remove_node(&mut self, node: &NodeHandle) -> PipelineResult<()>;

    /// Replace the rows a node produces with a fixed record sequence
    fn inject_rows(
        &mut self,
        node: &NodeHandle,
        schema: RowSchema,
        rows: Vec<Row>,
    ) -> PipelineResult<()>;

    /// Swap a database connection used by the pipeline
    fn replace_connection(&mut self, original: &str, replacement: &str) -> PipelineResult<()>;

    /// Start capturing every row emitted by a node
    fn observe_node(&mut self, node: &NodeHandle) -> PipelineResult<()>;

    /// Run the pipeline and wait for it to finish
    async fn run(&mut self) -> PipelineResult<RunOutcome>;

    /// Rows captured at an observed node during the last run
    fn captured_rows(&self, node: &NodeHandle) -> PipelineResult<CapturedRows>;
}

/// Loads pipelines from locators
#[async_trait(?Send)]
pub trait PipelineResolver {
    /// Load the pipeline a locator points at; `None` when it does not exist
    async fn resolve(
        &self,
        locator: &PipelineLocator,
    ) -> PipelineResult<Option<Box<dyn PipelineEngine>>>;
}
