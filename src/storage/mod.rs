mod file;
mod memory;
mod redis;

pub use self::file::FileStorage;
pub use self::memory::MemoryStorage;
pub use self::redis::RedisStorage;

use async_trait::async_trait;
use log::{ debug, error, info };
use std::sync::Arc;
use thiserror::Error;
use crate::cli::Args;
use crate::models::product::Product;

/// The single namespaced key holding the serialized selection.
pub const SELECTED_PRODUCTS_KEY: &str = "selectedProducts";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Storage document '{path}' is not valid JSON: {source}")]
    Document {
        path: String,
        source: serde_json::Error,
    },
    #[error("Stored value under '{key}' is corrupt: {source}")]
    Corrupt {
        key: String,
        source: serde_json::Error,
    },
    #[error("Failed to serialize selection: {0}")]
    Serialize(serde_json::Error),
    #[error("Redis storage error: {0}")]
    Redis(#[from] ::redis::RedisError),
    #[error("Unsupported storage type: {0}")]
    Unsupported(String),
}

/// String key/value storage shared by every session of this service,
/// the server-side stand-in for browser local storage.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

pub fn create_storage(args: &Args) -> Result<Arc<dyn KeyValueStore>, StorageError> {
    match args.storage_type.to_lowercase().as_str() {
        "file" => Ok(Arc::new(FileStorage::new(&args.storage_path))),
        "redis" => {
            let store = RedisStorage::new(&args.storage_redis_url, &args.storage_redis_prefix)?;
            Ok(Arc::new(store))
        }
        "memory" => Ok(Arc::new(MemoryStorage::new())),
        other => Err(StorageError::Unsupported(other.to_string())),
    }
}

pub fn initialize_storage(args: &Args) -> Result<Arc<dyn KeyValueStore>, StorageError> {
    match args.storage_type.to_lowercase().as_str() {
        "file" => info!("Selection will be stored in file at {}", args.storage_path),
        "redis" => info!("Selection will be stored in redis at {}", args.storage_redis_url),
        other => info!("Selection will be stored in: {}", other),
    }
    create_storage(args)
}

/// Whole-list persistence of the selected products. Every save overwrites
/// the stored value; there are no partial updates and no versioning.
#[derive(Clone)]
pub struct SelectionStore {
    storage: Arc<dyn KeyValueStore>,
}

impl SelectionStore {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self { storage }
    }

    pub async fn load(&self) -> Result<Vec<Product>, StorageError> {
        let Some(saved) = self.storage.get_item(SELECTED_PRODUCTS_KEY).await? else {
            debug!("No stored selection found, starting empty");
            return Ok(Vec::new());
        };
        serde_json::from_str(&saved).map_err(|source| {
            error!("Stored selection is not valid JSON: {}", source);
            StorageError::Corrupt { key: SELECTED_PRODUCTS_KEY.to_string(), source }
        })
    }

    pub async fn save(&self, selection: &[Product]) -> Result<(), StorageError> {
        let json = serde_json::to_string(selection).map_err(StorageError::Serialize)?;
        self.storage.set_item(SELECTED_PRODUCTS_KEY, &json).await?;
        debug!("Persisted {} selected product(s)", selection.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::product::ProductId;
    use serde_json::Map;

    fn product(id: ProductId, name: &str) -> Product {
        Product {
            id,
            name: name.to_string(),
            brand: "L'Oréal".to_string(),
            category: "skincare".to_string(),
            image: format!("{}.jpg", name),
            description: format!("About {}", name),
            extra: Map::new(),
        }
    }

    #[tokio::test]
    async fn load_defaults_to_empty_when_absent() {
        let store = SelectionStore::new(Arc::new(MemoryStorage::new()));
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn save_then_load_is_identity() {
        let storage = Arc::new(MemoryStorage::new());
        let store = SelectionStore::new(storage.clone());
        let selection = vec![
            product(ProductId::from(3), "Serum"),
            product(ProductId::from("a-1"), "Toner"),
            product(ProductId::from(1), "Cleanser"),
        ];
        store.save(&selection).await.unwrap();

        let reloaded = SelectionStore::new(storage);
        assert_eq!(reloaded.load().await.unwrap(), selection);
    }

    #[tokio::test]
    async fn corrupt_value_is_an_error() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set_item(SELECTED_PRODUCTS_KEY, "[{not json").await.unwrap();
        let store = SelectionStore::new(storage);
        assert!(matches!(store.load().await, Err(StorageError::Corrupt { .. })));
    }

    #[test]
    fn unknown_storage_type_is_rejected() {
        use clap::Parser;
        let args = Args::parse_from(["routine-advisor", "--storage-type", "sqlite"]);
        assert!(matches!(create_storage(&args), Err(StorageError::Unsupported(_))));
    }
}
