//! Element loading functionality
//!
//! Loads data sets, groups, unit tests and run records from a storage
//! backend, parsing their YAML representation.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use tracing::{info, warn};

use super::{
    DATA_SETS_DIR, GROUPS_DIR, RESULTS_DIR, UNIT_TESTS_DIR, element_file_name, element_stem,
};
use crate::models::{DataSet, DataSetGroup, TestRunRecord, TransUnitTest};
use crate::storage::{StorageBackend, StorageError};
use crate::testing::DataSetCatalog;

/// Element loader that uses a storage backend
pub struct ModelLoader<B: StorageBackend> {
    storage: B,
}

impl<B: StorageBackend> ModelLoader<B> {
    /// Create a new loader with the given storage backend
    pub fn new(storage: B) -> Self {
        Self { storage }
    }

    pub async fn load_data_set(&self, name: &str) -> Result<Option<DataSet>, StorageError> {
        self.load_element(DATA_SETS_DIR, name).await
    }

    pub async fn list_data_sets(&self) -> Result<Vec<DataSet>, StorageError> {
        self.list_elements(DATA_SETS_DIR).await
    }

    pub async fn load_group(&self, name: &str) -> Result<Option<DataSetGroup>, StorageError> {
        self.load_element(GROUPS_DIR, name).await
    }

    pub async fn list_groups(&self) -> Result<Vec<DataSetGroup>, StorageError> {
        self.list_elements(GROUPS_DIR).await
    }

    pub async fn load_unit_test(&self, name: &str) -> Result<Option<TransUnitTest>, StorageError> {
        self.load_element(UNIT_TESTS_DIR, name).await
    }

    pub async fn list_unit_tests(&self) -> Result<Vec<TransUnitTest>, StorageError> {
        self.list_elements(UNIT_TESTS_DIR).await
    }

    /// Unit tests whose pipeline reference mentions the given locator value
    pub async fn find_unit_tests_for_pipeline(
        &self,
        locator_value: &str,
    ) -> Result<Vec<TransUnitTest>, StorageError> {
        Ok(self
            .list_unit_tests()
            .await?
            .into_iter()
            .filter(|test| {
                test.pipeline
                    .resolution_order()
                    .iter()
                    .any(|locator| locator.value() == locator_value)
            })
            .collect())
    }

    /// Run records of a unit test, oldest first
    pub async fn list_runs(&self, unit_test_name: &str) -> Result<Vec<TestRunRecord>, StorageError> {
        let dir = format!("{}/{}", RESULTS_DIR, element_stem(unit_test_name));
        let mut runs: Vec<TestRunRecord> = self.list_elements(&dir).await?;
        runs.sort_by_key(|run| run.finished_at);
        Ok(runs)
    }

    /// Load every group and data set into an in-memory catalog
    ///
    /// Useful when many unit tests run against the same definitions.
    pub async fn load_catalog(&self) -> Result<DataSetCatalog> {
        let mut catalog = DataSetCatalog::new();
        for group in self.list_groups().await.context("Failed to list groups")? {
            catalog = catalog.with_group(group);
        }
        for data_set in self
            .list_data_sets()
            .await
            .context("Failed to list data sets")?
        {
            catalog = catalog.with_data_set(data_set);
        }
        Ok(catalog)
    }

    /// Load one element by name; `None` when no such file exists
    async fn load_element<T: DeserializeOwned>(
        &self,
        dir: &str,
        name: &str,
    ) -> Result<Option<T>, StorageError> {
        let path = format!("{}/{}", dir, element_file_name(name));
        if !self.storage.file_exists(&path).await? {
            return Ok(None);
        }
        self.read_yaml(&path).await.map(Some)
    }

    /// Load every element of a directory
    ///
    /// Files that fail to parse are skipped with a warning so one broken
    /// definition does not hide the others.
    async fn list_elements<T: DeserializeOwned>(&self, dir: &str) -> Result<Vec<T>, StorageError> {
        if !self.storage.dir_exists(dir).await? {
            return Ok(Vec::new());
        }

        let mut elements = Vec::new();
        for file_name in self.storage.list_files(dir).await? {
            if !(file_name.ends_with(".yaml") || file_name.ends_with(".yml")) {
                continue;
            }
            let path = format!("{}/{}", dir, file_name);
            match self.read_yaml(&path).await {
                Ok(element) => elements.push(element),
                Err(e) => warn!("Failed to load {}: {}", path, e),
            }
        }

        info!("Loaded {} elements from {}", elements.len(), dir);
        Ok(elements)
    }

    async fn read_yaml<T: DeserializeOwned>(&self, path: &str) -> Result<T, StorageError> {
        let content = self.storage.read_file(path).await?;
        let yaml_content = String::from_utf8(content)
            .map_err(|e| StorageError::SerializationError(format!("Invalid UTF-8: {}", e)))?;

        serde_yaml::from_str(&yaml_content).map_err(|e| {
            StorageError::SerializationError(format!("Failed to parse {}: {}", path, e))
        })
    }
}
