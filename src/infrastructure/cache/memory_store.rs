use crate::application::ports::LocalStore;
use crate::domain::value_objects::{CollectionName, EntityKey};
use crate::shared::error::AppError;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Process-local entity mirror. Nothing survives a restart.
#[derive(Clone, Default)]
pub struct MemoryLocalStore {
    collections: Arc<RwLock<HashMap<CollectionName, BTreeMap<EntityKey, Value>>>>,
}

impl MemoryLocalStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of records across all collections.
    pub async fn size(&self) -> usize {
        let collections = self.collections.read().await;
        collections.values().map(BTreeMap::len).sum()
    }

    pub async fn clear(&self) {
        self.collections.write().await.clear();
    }
}

#[async_trait]
impl LocalStore for MemoryLocalStore {
    async fn get(
        &self,
        collection: &CollectionName,
        key: &EntityKey,
    ) -> Result<Option<Value>, AppError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|records| records.get(key))
            .cloned())
    }

    async fn put(
        &self,
        collection: &CollectionName,
        key: &EntityKey,
        value: Value,
    ) -> Result<(), AppError> {
        let mut collections = self.collections.write().await;
        collections
            .entry(collection.clone())
            .or_default()
            .insert(key.clone(), value);
        Ok(())
    }

    async fn delete(&self, collection: &CollectionName, key: &EntityKey) -> Result<bool, AppError> {
        let mut collections = self.collections.write().await;
        let removed = collections
            .get_mut(collection)
            .map(|records| records.remove(key).is_some())
            .unwrap_or(false);
        if collections.get(collection).is_some_and(BTreeMap::is_empty) {
            collections.remove(collection);
        }
        Ok(removed)
    }

    async fn scan(&self, collection: &CollectionName) -> Result<Vec<(EntityKey, Value)>, AppError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|records| {
                records
                    .iter()
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn collections(&self) -> Result<Vec<CollectionName>, AppError> {
        let collections = self.collections.read().await;
        let mut names: Vec<CollectionName> = collections.keys().cloned().collect();
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn scan_is_key_ordered_and_delete_drops_empty_collection() {
        let store = MemoryLocalStore::new();
        let farms = CollectionName::new("farms").unwrap();

        for key in ["b", "a", "c"] {
            store
                .put(&farms, &EntityKey::new(key).unwrap(), json!({"name": key}))
                .await
                .unwrap();
        }

        let keys: Vec<String> = store
            .scan(&farms)
            .await
            .unwrap()
            .into_iter()
            .map(|(key, _)| key.to_string())
            .collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
        assert_eq!(store.size().await, 3);

        for key in ["a", "b", "c"] {
            store.delete(&farms, &EntityKey::new(key).unwrap()).await.unwrap();
        }
        assert!(store.collections().await.unwrap().is_empty());
    }
}
