use super::queries::{
    DELETE_LOCAL_ENTITY, SELECT_LOCAL_COLLECTION, SELECT_LOCAL_COLLECTION_NAMES,
    SELECT_LOCAL_ENTITY, UPSERT_LOCAL_ENTITY,
};
use super::rows::LocalEntityRow;
use super::ConnectionPool;
use crate::application::ports::LocalStore;
use crate::domain::value_objects::{CollectionName, EntityKey};
use crate::shared::error::AppError;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;

pub struct SqliteLocalStore {
    pool: ConnectionPool,
}

impl SqliteLocalStore {
    pub fn new(pool: ConnectionPool) -> Self {
        Self { pool }
    }
}

fn decode_value(row: &LocalEntityRow) -> Result<Value, AppError> {
    serde_json::from_str(&row.value).map_err(|err| {
        AppError::Storage(format!(
            "Corrupt local record {}/{}: {err}",
            row.collection, row.entity_key
        ))
    })
}

#[async_trait]
impl LocalStore for SqliteLocalStore {
    async fn get(
        &self,
        collection: &CollectionName,
        key: &EntityKey,
    ) -> Result<Option<Value>, AppError> {
        let row = sqlx::query_as::<_, LocalEntityRow>(SELECT_LOCAL_ENTITY)
            .bind(collection.as_str())
            .bind(key.as_str())
            .fetch_optional(self.pool.get_pool())
            .await?;

        row.as_ref().map(decode_value).transpose()
    }

    async fn put(
        &self,
        collection: &CollectionName,
        key: &EntityKey,
        value: Value,
    ) -> Result<(), AppError> {
        let encoded = serde_json::to_string(&value)?;
        sqlx::query(UPSERT_LOCAL_ENTITY)
            .bind(collection.as_str())
            .bind(key.as_str())
            .bind(encoded)
            .bind(Utc::now().timestamp_millis())
            .execute(self.pool.get_pool())
            .await?;
        Ok(())
    }

    async fn delete(&self, collection: &CollectionName, key: &EntityKey) -> Result<bool, AppError> {
        let result = sqlx::query(DELETE_LOCAL_ENTITY)
            .bind(collection.as_str())
            .bind(key.as_str())
            .execute(self.pool.get_pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn scan(&self, collection: &CollectionName) -> Result<Vec<(EntityKey, Value)>, AppError> {
        let rows = sqlx::query_as::<_, LocalEntityRow>(SELECT_LOCAL_COLLECTION)
            .bind(collection.as_str())
            .fetch_all(self.pool.get_pool())
            .await?;

        rows.iter()
            .map(|row| {
                let key = EntityKey::new(row.entity_key.clone()).map_err(AppError::Storage)?;
                Ok((key, decode_value(row)?))
            })
            .collect()
    }

    async fn collections(&self) -> Result<Vec<CollectionName>, AppError> {
        let names: Vec<(String,)> = sqlx::query_as(SELECT_LOCAL_COLLECTION_NAMES)
            .fetch_all(self.pool.get_pool())
            .await?;

        names
            .into_iter()
            .map(|(name,)| CollectionName::new(name).map_err(AppError::Storage))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn setup_store() -> SqliteLocalStore {
        let pool = ConnectionPool::from_memory().await.unwrap();
        pool.migrate().await.unwrap();
        SqliteLocalStore::new(pool)
    }

    fn farms() -> CollectionName {
        CollectionName::new("farms").unwrap()
    }

    #[tokio::test]
    async fn put_get_and_overwrite() {
        let store = setup_store().await;
        let key = EntityKey::new("f1").unwrap();

        store
            .put(&farms(), &key, json!({"name": "North Field"}))
            .await
            .unwrap();
        store
            .put(&farms(), &key, json!({"name": "North Field II"}))
            .await
            .unwrap();

        let value = store.get(&farms(), &key).await.unwrap().unwrap();
        assert_eq!(value["name"], "North Field II");
        assert_eq!(store.scan(&farms()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delete_reports_whether_removed() {
        let store = setup_store().await;
        let key = EntityKey::new("f1").unwrap();
        store.put(&farms(), &key, json!({"name": "A"})).await.unwrap();

        assert!(store.delete(&farms(), &key).await.unwrap());
        assert!(!store.delete(&farms(), &key).await.unwrap());
        assert!(store.get(&farms(), &key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn collections_are_isolated() {
        let store = setup_store().await;
        let key = EntityKey::new("1").unwrap();
        let irrigation = CollectionName::new("irrigationRecords").unwrap();

        store.put(&farms(), &key, json!({"name": "A"})).await.unwrap();
        store
            .put(&irrigation, &key, json!({"volumeLiters": 10}))
            .await
            .unwrap();

        assert_eq!(store.scan(&farms()).await.unwrap().len(), 1);
        let names: Vec<String> = store
            .collections()
            .await
            .unwrap()
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(names, vec!["farms", "irrigationRecords"]);
    }
}
