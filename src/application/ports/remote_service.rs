use crate::domain::value_objects::{CollectionName, EntityKey};
use crate::shared::error::AppError;
use async_trait::async_trait;
use serde_json::Value;

/// Authenticated network CRUD API acting as the source of truth.
///
/// Values cross this boundary in the remote shape. Failures are reported as
/// `AppError::Network` when the service could not be reached and
/// `AppError::RemoteRejected`/`Unauthorized`/`NotFound` when it answered.
#[async_trait]
pub trait RemoteDataService: Send + Sync {
    async fn list(&self, collection: &CollectionName) -> Result<Vec<Value>, AppError>;

    async fn get_by_id(
        &self,
        collection: &CollectionName,
        key: &EntityKey,
    ) -> Result<Option<Value>, AppError>;

    /// Returns the stored row, including any server-assigned key.
    async fn insert(&self, collection: &CollectionName, value: Value) -> Result<Value, AppError>;

    async fn update(
        &self,
        collection: &CollectionName,
        key: &EntityKey,
        value: Value,
    ) -> Result<Value, AppError>;

    async fn delete(&self, collection: &CollectionName, key: &EntityKey) -> Result<(), AppError>;

    async fn is_authenticated(&self) -> bool;

    async fn is_reachable(&self) -> bool;

    /// Field carrying the primary key in remote rows.
    fn key_field(&self) -> &str {
        "id"
    }
}

/// Extracts the primary key of a remote row, accepting string or numeric ids.
pub fn remote_key_of(value: &Value, key_field: &str) -> Option<EntityKey> {
    match value.get(key_field)? {
        Value::String(s) => EntityKey::new(s.clone()).ok(),
        Value::Number(n) => EntityKey::new(n.to_string()).ok(),
        _ => None,
    }
}
