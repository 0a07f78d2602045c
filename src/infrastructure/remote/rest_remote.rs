use crate::application::ports::RemoteDataService;
use crate::domain::value_objects::{CollectionName, EntityKey};
use crate::shared::config::RemoteConfig;
use crate::shared::error::AppError;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tokio::sync::RwLock;

/// PostgREST-style remote data service (`/rest/v1/{collection}` with `eq.` filters).
pub struct RestRemoteService {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    access_token: RwLock<Option<String>>,
    key_field: String,
}

impl RestRemoteService {
    pub fn new(config: &RemoteConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout.max(1)))
            .build()
            .map_err(|err| AppError::ConfigurationError(err.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            access_token: RwLock::new(config.access_token.clone()),
            key_field: config.key_field.clone(),
        })
    }

    pub async fn set_access_token(&self, token: Option<String>) {
        *self.access_token.write().await = token;
    }

    fn collection_url(&self, collection: &CollectionName) -> String {
        format!("{}/rest/v1/{}", self.base_url, collection.as_str())
    }

    fn key_filter(&self, key: &EntityKey) -> [(String, String); 1] {
        [(self.key_field.clone(), format!("eq.{}", key.as_str()))]
    }

    async fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let mut request = request;
        if let Some(api_key) = &self.api_key {
            request = request.header("apikey", api_key);
        }
        let token = self.access_token.read().await.clone();
        match token.or_else(|| self.api_key.clone()) {
            Some(bearer) => request.bearer_auth(bearer),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, AppError> {
        let response = self.authorize(request).await.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response.text().await.unwrap_or_default();
        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AppError::Unauthorized(message),
            StatusCode::NOT_FOUND => AppError::NotFound(message),
            other => AppError::RemoteRejected {
                status: other.as_u16(),
                message,
            },
        })
    }

    async fn rows(response: Response) -> Result<Vec<Value>, AppError> {
        match response.json::<Value>().await? {
            Value::Array(rows) => Ok(rows),
            Value::Null => Ok(Vec::new()),
            single => Ok(vec![single]),
        }
    }
}

#[async_trait]
impl RemoteDataService for RestRemoteService {
    async fn list(&self, collection: &CollectionName) -> Result<Vec<Value>, AppError> {
        let request = self
            .client
            .get(self.collection_url(collection))
            .query(&[("select", "*")]);
        Self::rows(self.send(request).await?).await
    }

    async fn get_by_id(
        &self,
        collection: &CollectionName,
        key: &EntityKey,
    ) -> Result<Option<Value>, AppError> {
        let request = self
            .client
            .get(self.collection_url(collection))
            .query(&self.key_filter(key))
            .query(&[("select", "*")]);
        let rows = Self::rows(self.send(request).await?).await?;
        Ok(rows.into_iter().next())
    }

    async fn insert(&self, collection: &CollectionName, value: Value) -> Result<Value, AppError> {
        let request = self
            .client
            .post(self.collection_url(collection))
            .header("Prefer", "return=representation")
            .json(&value);
        let rows = Self::rows(self.send(request).await?).await?;
        rows.into_iter().next().ok_or_else(|| AppError::RemoteRejected {
            status: 204,
            message: format!("insert into {collection} returned no row"),
        })
    }

    async fn update(
        &self,
        collection: &CollectionName,
        key: &EntityKey,
        value: Value,
    ) -> Result<Value, AppError> {
        let request = self
            .client
            .patch(self.collection_url(collection))
            .query(&self.key_filter(key))
            .header("Prefer", "return=representation")
            .json(&value);
        let rows = Self::rows(self.send(request).await?).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound(format!("{collection}/{key}")))
    }

    async fn delete(&self, collection: &CollectionName, key: &EntityKey) -> Result<(), AppError> {
        let request = self
            .client
            .delete(self.collection_url(collection))
            .query(&self.key_filter(key));
        self.send(request).await?;
        Ok(())
    }

    async fn is_authenticated(&self) -> bool {
        self.access_token.read().await.is_some()
    }

    async fn is_reachable(&self) -> bool {
        let request = self.client.get(format!("{}/rest/v1/", self.base_url));
        match self.authorize(request).await.send().await {
            Ok(response) => !response.status().is_server_error(),
            Err(err) => {
                tracing::debug!(target: "offline::network", error = %err, "remote unreachable");
                false
            }
        }
    }

    fn key_field(&self) -> &str {
        &self.key_field
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(access_token: Option<&str>) -> RestRemoteService {
        let config = RemoteConfig {
            base_url: "https://farm.example.com/".into(),
            api_key: Some("anon".into()),
            access_token: access_token.map(str::to_string),
            key_field: "uuid".into(),
            timeout: 5,
        };
        RestRemoteService::new(&config).unwrap()
    }

    #[test]
    fn urls_and_filters_follow_rest_layout() {
        let remote = service(None);
        let farms = CollectionName::new("farms").unwrap();
        assert_eq!(
            remote.collection_url(&farms),
            "https://farm.example.com/rest/v1/farms"
        );
        let filter = remote.key_filter(&EntityKey::new("abc").unwrap());
        assert_eq!(filter[0], ("uuid".to_string(), "eq.abc".to_string()));
        assert_eq!(remote.key_field(), "uuid");
    }

    #[tokio::test]
    async fn authentication_follows_access_token() {
        let remote = service(None);
        assert!(!remote.is_authenticated().await);
        remote.set_access_token(Some("jwt".into())).await;
        assert!(remote.is_authenticated().await);
        assert!(service(Some("jwt")).is_authenticated().await);
    }
}
