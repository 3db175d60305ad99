use async_trait::async_trait;
use log::debug;
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{ Path, PathBuf };
use tokio::fs;
use tokio::sync::Mutex;
use crate::storage::{ KeyValueStore, StorageError };

/// All keys live in one JSON object document that is rewritten in full on
/// every write. Writers in other processes are not coordinated with.
pub struct FileStorage {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStorage {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    async fn read_document(&self) -> Result<BTreeMap<String, String>, StorageError> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(e.into()),
        };
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&content).map_err(|source| StorageError::Document {
            path: self.path.display().to_string(),
            source,
        })
    }
}

#[async_trait]
impl KeyValueStore for FileStorage {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.read_document().await?.remove(key))
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        let mut document = self.read_document().await?;
        document.insert(key.to_string(), value.to_string());

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(&document).map_err(StorageError::Serialize)?;
        fs::write(&self.path, json).await?;
        debug!("Wrote key '{}' to {}", key, self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn values_survive_a_new_instance() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("storage.json");

        let storage = FileStorage::new(&path);
        assert_eq!(storage.get_item("selectedProducts").await.unwrap(), None);
        storage.set_item("selectedProducts", "[]").await.unwrap();
        storage.set_item("other", "x").await.unwrap();

        let reopened = FileStorage::new(&path);
        assert_eq!(reopened.get_item("selectedProducts").await.unwrap().as_deref(), Some("[]"));
        assert_eq!(reopened.get_item("other").await.unwrap().as_deref(), Some("x"));
    }

    #[tokio::test]
    async fn garbage_document_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(&path, "not json").unwrap();

        let storage = FileStorage::new(&path);
        assert!(matches!(
            storage.get_item("selectedProducts").await,
            Err(StorageError::Document { .. })
        ));
    }
}
