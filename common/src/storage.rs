use crate::{Error, Result};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::debug;

/// One storage tier: a flat namespace of named files.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn put_object(&self, key: &str, data: &[u8]) -> Result<()>;
    async fn get_object(&self, key: &str) -> Result<Vec<u8>>;
    async fn list_objects(&self) -> Result<Vec<String>>;
    async fn check_file_exists(&self, key: &str) -> Result<bool>;
    fn location(&self) -> &str;
}

/// Tier backed by a local directory.
pub struct LocalStorage {
    root: PathBuf,
    location: String,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let location = root.display().to_string();
        Self { root, location }
    }

    fn object_path(&self, key: &str) -> Result<PathBuf> {
        let clean_key = key.trim_matches('/');
        if clean_key.is_empty() || clean_key.contains('/') || clean_key.starts_with('.') {
            return Err(Error::InvalidInput(format!(
                "'{}' is not a valid object key for tier {}",
                key, self.location
            )));
        }
        Ok(self.root.join(clean_key))
    }

    fn access_error(&self, err: std::io::Error) -> Error {
        match err.kind() {
            ErrorKind::NotFound | ErrorKind::PermissionDenied => Error::StorageAccess(format!(
                "tier root {} is not readable: {}",
                self.location, err
            )),
            _ => Error::Io(err),
        }
    }
}

#[async_trait]
impl ObjectStorage for LocalStorage {
    /// Writes through a hidden temp file and renames, so readers never see a partial object.
    async fn put_object(&self, key: &str, data: &[u8]) -> Result<()> {
        let target = self.object_path(key)?;
        let staging = self.root.join(format!(".{}.partial", key.trim_matches('/')));

        if let Err(e) = tokio::fs::write(&staging, data).await {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(self.access_error(e));
        }
        if let Err(e) = tokio::fs::rename(&staging, &target).await {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(Error::Io(e));
        }

        debug!(key, bytes = data.len(), tier = %self.location, "Object written");
        Ok(())
    }

    async fn get_object(&self, key: &str) -> Result<Vec<u8>> {
        let path = self.object_path(key)?;
        tokio::fs::read(&path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => Error::Storage(format!(
                "Object {} not found in tier {}",
                key, self.location
            )),
            _ => Error::Io(e),
        })
    }

    async fn list_objects(&self) -> Result<Vec<String>> {
        let mut entries = tokio::fs::read_dir(&self.root)
            .await
            .map_err(|e| self.access_error(e))?;

        let mut objects = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| self.access_error(e))? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') {
                continue;
            }
            objects.push(name);
        }

        objects.sort();
        Ok(objects)
    }

    async fn check_file_exists(&self, key: &str) -> Result<bool> {
        let path = self.object_path(key)?;
        Ok(tokio::fs::try_exists(&path).await?)
    }

    fn location(&self) -> &str {
        &self.location
    }
}
