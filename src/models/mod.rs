//! Models module for the SDK
//!
//! Defines the data set and unit test structures the testing engine works
//! on. Every model serializes with serde so storage backends can round-trip
//! it.

pub mod data_set;
pub mod enums;
pub mod field;
pub mod group;
pub mod location;
pub mod result;
pub mod row;
pub mod tweak;

pub use data_set::{DataSet, DataSetError};
pub use enums::*;
pub use field::FieldDescriptor;
pub use group::DataSetGroup;
pub use location::{FieldMapping, SetLocation};
pub use result::{TestRunRecord, UnitTestResult};
pub use row::{Row, RowSchema, ValueMeta};
pub use tweak::TestTweak;
pub use unit_test::{DatabaseReplacement, PipelineLocator, PipelineReference, TransUnitTest};
