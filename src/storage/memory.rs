//! In-memory storage backend

use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

use super::{StorageBackend, StorageError, check_relative_path};

/// Storage backend keeping files in memory
///
/// Directories exist implicitly once a file is written below them, or
/// explicitly after [`StorageBackend::create_dir`].
#[derive(Debug, Default)]
pub struct MemoryStorageBackend {
    files: Mutex<BTreeMap<String, Vec<u8>>>,
    dirs: Mutex<BTreeSet<String>>,
}

impl MemoryStorageBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_files(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, Vec<u8>>>, StorageError> {
        self.files
            .lock()
            .map_err(|e| StorageError::IoError(format!("Lock error: {}", e)))
    }

    fn lock_dirs(&self) -> Result<std::sync::MutexGuard<'_, BTreeSet<String>>, StorageError> {
        self.dirs
            .lock()
            .map_err(|e| StorageError::IoError(format!("Lock error: {}", e)))
    }
}

fn normalize_dir(dir: &str) -> String {
    dir.trim_end_matches('/').to_string()
}

#[async_trait(?Send)]
impl StorageBackend for MemoryStorageBackend {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        check_relative_path(path)?;
        self.lock_files()?
            .get(path)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(path.to_string()))
    }

    async fn write_file(&self, path: &str, content: &[u8]) -> Result<(), StorageError> {
        check_relative_path(path)?;
        self.lock_files()?.insert(path.to_string(), content.to_vec());
        Ok(())
    }

    async fn list_files(&self, dir: &str) -> Result<Vec<String>, StorageError> {
        check_relative_path(dir)?;
        let prefix = format!("{}/", normalize_dir(dir));
        let files = self.lock_files()?;
        Ok(files
            .keys()
            .filter_map(|path| path.strip_prefix(&prefix))
            .filter(|rest| !rest.contains('/'))
            .map(str::to_string)
            .collect())
    }

    async fn file_exists(&self, path: &str) -> Result<bool, StorageError> {
        check_relative_path(path)?;
        Ok(self.lock_files()?.contains_key(path))
    }

    async fn delete_file(&self, path: &str) -> Result<(), StorageError> {
        check_relative_path(path)?;
        self.lock_files()?
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound(path.to_string()))
    }

    async fn create_dir(&self, path: &str) -> Result<(), StorageError> {
        check_relative_path(path)?;
        self.lock_dirs()?.insert(normalize_dir(path));
        Ok(())
    }

    async fn dir_exists(&self, path: &str) -> Result<bool, StorageError> {
        check_relative_path(path)?;
        let dir = normalize_dir(path);
        if self.lock_dirs()?.contains(&dir) {
            return Ok(true);
        }
        let prefix = format!("{}/", dir);
        Ok(self.lock_files()?.keys().any(|p| p.starts_with(&prefix)))
    }
}
