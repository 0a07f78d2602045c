use crate::domain::value_objects::{CollectionName, EntityKey};
use crate::shared::error::AppError;
use async_trait::async_trait;
use serde_json::Value;

/// Generic key/value + collection store holding the local entity mirror.
#[async_trait]
pub trait LocalStore: Send + Sync {
    async fn get(&self, collection: &CollectionName, key: &EntityKey)
        -> Result<Option<Value>, AppError>;

    async fn put(
        &self,
        collection: &CollectionName,
        key: &EntityKey,
        value: Value,
    ) -> Result<(), AppError>;

    /// Returns whether a record was removed.
    async fn delete(&self, collection: &CollectionName, key: &EntityKey) -> Result<bool, AppError>;

    async fn scan(&self, collection: &CollectionName) -> Result<Vec<(EntityKey, Value)>, AppError>;

    async fn collections(&self) -> Result<Vec<CollectionName>, AppError>;
}
