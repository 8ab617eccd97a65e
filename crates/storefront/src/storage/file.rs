//! File-backed storage.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::warn;

use super::{LocalStore, StorageError};

/// Storage persisted as a single JSON object on disk.
///
/// Every write rewrites the whole file through a temporary sibling and a
/// rename, so a crash never leaves a half-written document behind.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<BTreeMap<String, String>, StorageError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_str(&raw) {
            Ok(slots) => Ok(slots),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Storage file is corrupt, starting empty");
                Ok(BTreeMap::new())
            }
        }
    }
}

impl LocalStore for FileStorage {
    async fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.load().await?.remove(key))
    }

    async fn write(&self, key: &str, value: String) -> Result<(), StorageError> {
        let mut slots = self.load().await?;
        slots.insert(key.to_string(), value);

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, serde_json::to_vec_pretty(&slots)?).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("shopease-{}", uuid::Uuid::new_v4()))
            .join("cart.json")
    }

    #[tokio::test]
    async fn test_missing_file_reads_none() {
        let storage = FileStorage::new(scratch_path());
        assert!(storage.read("shopease_cart").await.expect("read").is_none());
    }

    #[tokio::test]
    async fn test_write_then_read_from_new_handle() {
        let path = scratch_path();
        let storage = FileStorage::new(&path);
        storage
            .write("shopease_cart", "[]".to_string())
            .await
            .expect("write");
        storage
            .write("shopease_checkout", "null".to_string())
            .await
            .expect("write");

        let reopened = FileStorage::new(&path);
        assert_eq!(
            reopened.read("shopease_cart").await.expect("read").as_deref(),
            Some("[]")
        );
        assert_eq!(
            reopened.read("shopease_checkout").await.expect("read").as_deref(),
            Some("null")
        );
    }

    #[tokio::test]
    async fn test_corrupt_file_reads_empty() {
        let path = scratch_path();
        tokio::fs::create_dir_all(path.parent().expect("parent"))
            .await
            .expect("mkdir");
        tokio::fs::write(&path, "{not json").await.expect("write");

        let storage = FileStorage::new(&path);
        assert!(storage.read("shopease_cart").await.expect("read").is_none());
    }
}
