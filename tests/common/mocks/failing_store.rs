use agrisync::application::ports::LocalStore;
use agrisync::domain::value_objects::{CollectionName, EntityKey};
use agrisync::AppError;
use async_trait::async_trait;
use serde_json::Value;

/// Local store whose every call fails, as when the disk is full or corrupted.
#[derive(Debug, Default)]
pub struct FailingLocalStore;

fn broken() -> AppError {
    AppError::Storage("disk I/O error".into())
}

#[async_trait]
impl LocalStore for FailingLocalStore {
    async fn get(&self, _: &CollectionName, _: &EntityKey) -> Result<Option<Value>, AppError> {
        Err(broken())
    }

    async fn put(&self, _: &CollectionName, _: &EntityKey, _: Value) -> Result<(), AppError> {
        Err(broken())
    }

    async fn delete(&self, _: &CollectionName, _: &EntityKey) -> Result<bool, AppError> {
        Err(broken())
    }

    async fn scan(&self, _: &CollectionName) -> Result<Vec<(EntityKey, Value)>, AppError> {
        Err(broken())
    }

    async fn collections(&self) -> Result<Vec<CollectionName>, AppError> {
        Err(broken())
    }
}
