//! Element loading and saving functionality
//!
//! Provides load-by-name, list and save operations for data sets, data set
//! groups, unit tests and run records on top of a storage backend.
//!
//! File structure:
//! - `datasets/{name}.yaml` - Data set definitions
//! - `groups/{name}.yaml` - Data set group definitions
//! - `unit-tests/{name}.yaml` - Unit test definitions
//! - `results/{unit test}/{run id}.yaml` - Persisted run records
//!
//! Names are percent-encoded where they appear in paths.

pub mod loader;
pub mod saver;

pub use loader::ModelLoader;
pub use saver::ModelSaver;

pub(crate) const DATA_SETS_DIR: &str = "datasets";
pub(crate) const GROUPS_DIR: &str = "groups";
pub(crate) const UNIT_TESTS_DIR: &str = "unit-tests";
pub(crate) const RESULTS_DIR: &str = "results";

/// File stem of an element: its name percent-encoded, so that distinct
/// names never share a file
pub(crate) fn element_stem(name: &str) -> String {
    urlencoding::encode(name).into_owned()
}

/// File name of an element, derived from its name
pub(crate) fn element_file_name(name: &str) -> String {
    format!("{}.yaml", element_stem(name))
}
