//! In-memory key-value storage for testing.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use courier_core::storage::{KeyValueStore, Result};
use tokio::sync::RwLock;

/// In-memory store. Data is lost when the last clone is dropped.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let values = self.values.read().await;
        Ok(values.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self.values.write().await;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let mut values = self.values.write().await;
        values.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_get_remove() {
        let store = MemoryStore::new();
        assert_eq!(store.get("auth_token").await.unwrap(), None);

        store.set("auth_token", "T1").await.unwrap();
        assert_eq!(store.get("auth_token").await.unwrap().as_deref(), Some("T1"));

        store.remove("auth_token").await.unwrap();
        store.remove("auth_token").await.unwrap();
        assert_eq!(store.get("auth_token").await.unwrap(), None);
    }

    #[tokio::test]
    async fn clones_share_values() {
        let store = MemoryStore::new();
        store.clone().set("k", "v").await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));
    }
}
