//! Element saving functionality
//!
//! Saves data sets, groups, unit tests and run records to a storage backend
//! as YAML.

use serde::Serialize;
use tracing::info;

use super::{
    DATA_SETS_DIR, GROUPS_DIR, RESULTS_DIR, UNIT_TESTS_DIR, element_file_name, element_stem,
};
use crate::models::{DataSet, DataSetGroup, TestRunRecord, TransUnitTest};
use crate::storage::{StorageBackend, StorageError};

/// Element saver that uses a storage backend
pub struct ModelSaver<B: StorageBackend> {
    storage: B,
}

impl<B: StorageBackend> ModelSaver<B> {
    /// Create a new saver with the given storage backend
    pub fn new(storage: B) -> Self {
        Self { storage }
    }

    pub async fn save_data_set(&self, data_set: &DataSet) -> Result<(), StorageError> {
        self.save_element(DATA_SETS_DIR, &data_set.name, data_set)
            .await
    }

    pub async fn save_group(&self, group: &DataSetGroup) -> Result<(), StorageError> {
        self.save_element(GROUPS_DIR, &group.name, group).await
    }

    pub async fn save_unit_test(&self, unit_test: &TransUnitTest) -> Result<(), StorageError> {
        self.save_element(UNIT_TESTS_DIR, &unit_test.name, unit_test)
            .await
    }

    pub async fn delete_data_set(&self, name: &str) -> Result<(), StorageError> {
        self.delete_element(DATA_SETS_DIR, name).await
    }

    pub async fn delete_group(&self, name: &str) -> Result<(), StorageError> {
        self.delete_element(GROUPS_DIR, name).await
    }

    pub async fn delete_unit_test(&self, name: &str) -> Result<(), StorageError> {
        self.delete_element(UNIT_TESTS_DIR, name).await
    }

    /// Save the record of one unit test run
    pub async fn save_run(&self, record: &TestRunRecord) -> Result<(), StorageError> {
        let dir = format!(
            "{}/{}",
            RESULTS_DIR,
            element_stem(&record.unit_test_name)
        );
        self.save_element(&dir, &record.run_id.to_string(), record)
            .await
    }

    async fn save_element<T: Serialize>(
        &self,
        dir: &str,
        name: &str,
        element: &T,
    ) -> Result<(), StorageError> {
        if !self.storage.dir_exists(dir).await? {
            self.storage.create_dir(dir).await?;
        }

        let file_path = format!("{}/{}", dir, element_file_name(name));
        let yaml_content = serde_yaml::to_string(element).map_err(|e| {
            StorageError::SerializationError(format!("Failed to serialize '{}': {}", name, e))
        })?;

        self.storage
            .write_file(&file_path, yaml_content.as_bytes())
            .await?;

        info!("Saved '{}' to {}", name, file_path);
        Ok(())
    }

    async fn delete_element(&self, dir: &str, name: &str) -> Result<(), StorageError> {
        let file_path = format!("{}/{}", dir, element_file_name(name));
        self.storage.delete_file(&file_path).await?;
        info!("Deleted '{}' from {}", name, dir);
        Ok(())
    }
}
