//! Storage backends
//!
//! Byte-level file storage used by [`crate::model::ModelLoader`] and
//! [`crate::model::ModelSaver`]. Paths are `/`-separated and relative to the
//! backend's root.
//!
//! - [`memory::MemoryStorageBackend`]: always available, used in tests and
//!   for throw-away workspaces
//! - [`filesystem::FileSystemStorageBackend`]: native file system (feature
//!   `native-fs`)

use async_trait::async_trait;

#[cfg(feature = "native-fs")]
pub mod filesystem;
pub mod memory;

#[cfg(feature = "native-fs")]
pub use filesystem::FileSystemStorageBackend;
pub use memory::MemoryStorageBackend;

/// Error type for storage operations
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// File or directory does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Path escapes the backend root or is otherwise unusable
    #[error("Invalid path: {0}")]
    InvalidPath(String),
}

/// File storage trait
#[async_trait(?Send)]
pub trait StorageBackend {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>, StorageError>;

    async fn write_file(&self, path: &str, content: &[u8]) -> Result<(), StorageError>;

    /// File names (not paths) directly inside a directory, sorted
    async fn list_files(&self, dir: &str) -> Result<Vec<String>, StorageError>;

    async fn file_exists(&self, path: &str) -> Result<bool, StorageError>;

    async fn delete_file(&self, path: &str) -> Result<(), StorageError>;

    async fn create_dir(&self, path: &str) -> Result<(), StorageError>;

    async fn dir_exists(&self, path: &str) -> Result<bool, StorageError>;
}

#[async_trait(?Send)]
impl<T: StorageBackend + ?Sized> StorageBackend for &T {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        (**self).read_file(path).await
    }

    async fn write_file(&self, path: &str, content: &[u8]) -> Result<(), StorageError> {
        (**self).write_file(path, content).await
    }

    async fn list_files(&self, dir: &str) -> Result<Vec<String>, StorageError> {
        (**self).list_files(dir).await
    }

    async fn file_exists(&self, path: &str) -> Result<bool, StorageError> {
        (**self).file_exists(path).await
    }

    async fn delete_file(&self, path: &str) -> Result<(), StorageError> {
        (**self).delete_file(path).await
    }

    async fn create_dir(&self, path: &str) -> Result<(), StorageError> {
        (**self).create_dir(path).await
    }

    async fn dir_exists(&self, path: &str) -> Result<bool, StorageError> {
        (**self).dir_exists(path).await
    }
}

/// Reject absolute paths and parent-directory segments
pub(crate) fn check_relative_path(path: &str) -> Result<(), StorageError> {
    if path.starts_with('/') || path.split('/').any(|segment| segment == "..") {
        return Err(StorageError::InvalidPath(path.to_string()));
    }
    Ok(())
}
