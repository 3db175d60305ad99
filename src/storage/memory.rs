use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;
use crate::storage::{ KeyValueStore, StorageError };

#[derive(Default)]
pub struct MemoryStorage {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStorage {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.items.lock().await.get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.items.lock().await.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
