use async_trait::async_trait;
use redis::{ AsyncCommands, Client };
use crate::storage::{ KeyValueStore, StorageError };

pub struct RedisStorage {
    client: Client,
    key_prefix: String,
}

impl RedisStorage {
    pub fn new(url: &str, key_prefix: &str) -> Result<Self, StorageError> {
        Ok(Self {
            client: Client::open(url)?,
            key_prefix: key_prefix.to_string(),
        })
    }

    async fn get_connection(&self) -> Result<redis::aio::MultiplexedConnection, redis::RedisError> {
        self.client.get_multiplexed_async_connection().await
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }
}

#[async_trait]
impl KeyValueStore for RedisStorage {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let mut conn = self.get_connection().await?;
        let value: Option<String> = conn.get(self.full_key(key)).await?;
        Ok(value)
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut conn = self.get_connection().await?;
        let _: () = conn.set(self.full_key(key), value).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_namespaced_by_prefix() {
        let store = RedisStorage::new("redis://127.0.0.1:6379", "advisor:").unwrap();
        assert_eq!(store.full_key("selectedProducts"), "advisor:selectedProducts");
    }
}
