use agrisync::application::ports::RemoteDataService;
use agrisync::domain::value_objects::{CollectionName, EntityKey};
use agrisync::AppError;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteCall {
    pub operation: &'static str,
    pub collection: String,
    pub key: Option<String>,
}

/// In-memory remote service assigning numeric string ids from 101 upwards.
pub struct MockRemoteService {
    rows: Mutex<HashMap<String, BTreeMap<String, Value>>>,
    calls: Mutex<Vec<RemoteCall>>,
    flaky_names: Mutex<HashSet<String>>,
    rejected_names: Mutex<HashSet<String>>,
    reachable: AtomicBool,
    authenticated: AtomicBool,
    next_id: AtomicU64,
}

impl MockRemoteService {
    pub fn new() -> Self {
        Self {
            rows: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            flaky_names: Mutex::new(HashSet::new()),
            rejected_names: Mutex::new(HashSet::new()),
            reachable: AtomicBool::new(true),
            authenticated: AtomicBool::new(true),
            next_id: AtomicU64::new(101),
        }
    }

    pub fn unreachable() -> Self {
        let remote = Self::new();
        remote.set_reachable(false);
        remote
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    pub fn set_authenticated(&self, authenticated: bool) {
        self.authenticated.store(authenticated, Ordering::SeqCst);
    }

    /// Writes carrying this `name` fail as if the connection dropped.
    pub fn fail_name(&self, name: &str) {
        self.flaky_names.lock().unwrap().insert(name.to_string());
    }

    pub fn heal_name(&self, name: &str) {
        self.flaky_names.lock().unwrap().remove(name);
    }

    /// Writes carrying this `name` are refused with 422.
    pub fn reject_name(&self, name: &str) {
        self.rejected_names.lock().unwrap().insert(name.to_string());
    }

    pub fn seed(&self, collection: &str, row: Value) {
        let key = row_key(&row).expect("seeded row needs an id");
        self.rows
            .lock()
            .unwrap()
            .entry(collection.to_string())
            .or_default()
            .insert(key, row);
    }

    pub fn row(&self, collection: &str, key: &str) -> Option<Value> {
        self.rows
            .lock()
            .unwrap()
            .get(collection)
            .and_then(|rows| rows.get(key).cloned())
    }

    pub fn row_count(&self, collection: &str) -> usize {
        self.rows
            .lock()
            .unwrap()
            .get(collection)
            .map(BTreeMap::len)
            .unwrap_or(0)
    }

    pub fn calls(&self) -> Vec<RemoteCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, operation: &str, collection: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.operation == operation && call.collection == collection)
            .count()
    }

    fn record(&self, operation: &'static str, collection: &CollectionName, key: Option<&str>) {
        self.calls.lock().unwrap().push(RemoteCall {
            operation,
            collection: collection.to_string(),
            key: key.map(str::to_string),
        });
    }

    fn ensure_reachable(&self) -> Result<(), AppError> {
        if self.reachable.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(AppError::Network("connection refused".into()))
        }
    }

    fn check_write(&self, value: &Value) -> Result<(), AppError> {
        let Some(name) = value.get("name").and_then(Value::as_str) else {
            return Ok(());
        };
        if self.rejected_names.lock().unwrap().contains(name) {
            return Err(AppError::RemoteRejected {
                status: 422,
                message: format!("{name} violates a check constraint"),
            });
        }
        if self.flaky_names.lock().unwrap().contains(name) {
            return Err(AppError::Network("connection reset".into()));
        }
        Ok(())
    }
}

impl Default for MockRemoteService {
    fn default() -> Self {
        Self::new()
    }
}

fn row_key(row: &Value) -> Option<String> {
    match row.get("id")? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[async_trait]
impl RemoteDataService for MockRemoteService {
    async fn list(&self, collection: &CollectionName) -> Result<Vec<Value>, AppError> {
        self.record("list", collection, None);
        self.ensure_reachable()?;
        Ok(self
            .rows
            .lock()
            .unwrap()
            .get(collection.as_str())
            .map(|rows| rows.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn get_by_id(
        &self,
        collection: &CollectionName,
        key: &EntityKey,
    ) -> Result<Option<Value>, AppError> {
        self.record("get", collection, Some(key.as_str()));
        self.ensure_reachable()?;
        Ok(self.row(collection.as_str(), key.as_str()))
    }

    async fn insert(&self, collection: &CollectionName, value: Value) -> Result<Value, AppError> {
        self.record("insert", collection, None);
        self.ensure_reachable()?;
        self.check_write(&value)?;

        let mut row = match value {
            Value::Object(map) => map,
            _ => return Err(AppError::ValidationError("row must be an object".into())),
        };
        let key = match row_key(&Value::Object(row.clone())) {
            Some(key) => key,
            None => self.next_id.fetch_add(1, Ordering::SeqCst).to_string(),
        };
        row.insert("id".into(), Value::String(key.clone()));
        let row = Value::Object(row);

        self.rows
            .lock()
            .unwrap()
            .entry(collection.to_string())
            .or_default()
            .insert(key, row.clone());
        Ok(row)
    }

    async fn update(
        &self,
        collection: &CollectionName,
        key: &EntityKey,
        value: Value,
    ) -> Result<Value, AppError> {
        self.record("update", collection, Some(key.as_str()));
        self.ensure_reachable()?;
        self.check_write(&value)?;

        let mut rows = self.rows.lock().unwrap();
        let Some(existing) = rows
            .get_mut(collection.as_str())
            .and_then(|rows| rows.get_mut(key.as_str()))
        else {
            return Err(AppError::NotFound(format!("{collection}/{key}")));
        };

        let mut merged: Map<String, Value> = existing.as_object().cloned().unwrap_or_default();
        if let Value::Object(changes) = value {
            for (field, change) in changes {
                merged.insert(field, change);
            }
        }
        merged.insert("id".into(), Value::String(key.to_string()));
        *existing = Value::Object(merged);
        Ok(existing.clone())
    }

    async fn delete(&self, collection: &CollectionName, key: &EntityKey) -> Result<(), AppError> {
        self.record("delete", collection, Some(key.as_str()));
        self.ensure_reachable()?;
        let removed = self
            .rows
            .lock()
            .unwrap()
            .get_mut(collection.as_str())
            .and_then(|rows| rows.remove(key.as_str()));
        match removed {
            Some(_) => Ok(()),
            None => Err(AppError::NotFound(format!("{collection}/{key}"))),
        }
    }

    async fn is_authenticated(&self) -> bool {
        self.authenticated.load(Ordering::SeqCst)
    }

    async fn is_reachable(&self) -> bool {
        self.reachable.load(Ordering::SeqCst)
    }
}
