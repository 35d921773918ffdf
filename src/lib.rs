//! Data Testing SDK - Golden-data unit testing for data pipelines
//!
//! Provides unified interfaces for:
//! - Data set, group and unit test definitions
//! - Golden row retrieval with stable, type-aware ordering
//! - Unit test orchestration (input injection, tweaks, golden comparison)
//! - Definition loading/saving (via storage backends)
//! - Validation logic
//! - Query executors for data set storage (DuckDB behind `duckdb-backend`)

pub mod compare;
#[cfg(feature = "database")]
pub mod config;
pub mod database;
pub mod golden;
pub mod model;
pub mod models;
pub mod pipeline;
pub mod storage;
pub mod testing;
pub mod validation;

// Re-export commonly used types
#[cfg(feature = "native-fs")]
pub use storage::FileSystemStorageBackend;
pub use storage::{MemoryStorageBackend, StorageBackend, StorageError};

pub use model::{ModelLoader, ModelSaver};

#[cfg(feature = "database")]
pub use config::TestingConfig;
#[cfg(feature = "duckdb-backend")]
pub use database::DuckDbExecutor;
pub use database::{
    ConnectionHandle, DatabaseError, DatabaseResult, QueryExecutor, QueryResult,
};

pub use compare::{FieldResolutionError, ResolvedMapping, compare_values, values_equal};
pub use golden::{resolve_golden_rows, sort_field_mappings};
pub use pipeline::{
    CapturedRows, NodeHandle, PipelineEngine, PipelineError, PipelineResolver, RunOutcome,
};
pub use testing::{
    DataSetCatalog, DataSetLookup, OutputFormat, ResultSink, SetupError, TestError,
    TestOrchestrator, TestRunReport, TestState, format_results,
};
pub use validation::{DefinitionValidationResult, DefinitionValidator, ValidationError};

// Re-export models
pub use models::enums::*;
pub use models::{
    DataSet, DataSetError, DataSetGroup, DatabaseReplacement, FieldDescriptor, FieldMapping,
    PipelineLocator, PipelineReference, Row, RowSchema, SetLocation, TestRunRecord, TestTweak,
    TransUnitTest, UnitTestResult, ValueMeta,
};
