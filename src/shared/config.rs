use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub sync: SyncConfig,
    pub remote: RemoteConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    pub auto_sync: bool,
    /// Milliseconds between scheduler ticks.
    pub sync_interval_ms: u64,
    pub max_retries: u32,
    pub batch_size: u32,
    /// Send remote validation failures straight to `failed` instead of retrying them.
    pub fail_fast_on_rejection: bool,
    /// Milliseconds between reachability probes; 0 disables the probe.
    pub reachability_probe_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub access_token: Option<String>,
    /// Column the remote service uses as primary key.
    pub key_field: String,
    /// Seconds before a single remote call is abandoned.
    pub timeout: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        let path = default_data_dir().join("agrisync.db");
        Self {
            url: format!("sqlite://{}?mode=rwc", path.display()),
            max_connections: 5,
            connection_timeout: 30,
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            auto_sync: true,
            sync_interval_ms: 30_000,
            max_retries: 3,
            batch_size: 50,
            fail_fast_on_rejection: true,
            reachability_probe_ms: 0,
        }
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:54321".to_string(),
            api_key: None,
            access_token: None,
            key_field: "id".to_string(),
            timeout: 15,
        }
    }
}

impl SyncConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.sync_interval_ms)
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(v) = std::env::var("AGRISYNC_DATABASE_URL") {
            if !v.trim().is_empty() {
                cfg.database.url = v.trim().to_string();
            }
        }
        if let Some(value) = env_u64("AGRISYNC_DATABASE_MAX_CONNECTIONS") {
            cfg.database.max_connections = value.clamp(1, u32::MAX as u64) as u32;
        }

        if let Ok(v) = std::env::var("AGRISYNC_AUTO_SYNC") {
            cfg.sync.auto_sync = parse_bool(&v, cfg.sync.auto_sync);
        }
        if let Some(value) = env_u64("AGRISYNC_SYNC_INTERVAL_MS") {
            cfg.sync.sync_interval_ms = value.max(100);
        }
        if let Some(value) = env_u64("AGRISYNC_MAX_RETRIES") {
            cfg.sync.max_retries = value.clamp(1, u32::MAX as u64) as u32;
        }
        if let Some(value) = env_u64("AGRISYNC_BATCH_SIZE") {
            cfg.sync.batch_size = value.clamp(1, u32::MAX as u64) as u32;
        }
        if let Ok(v) = std::env::var("AGRISYNC_FAIL_FAST_ON_REJECTION") {
            cfg.sync.fail_fast_on_rejection = parse_bool(&v, cfg.sync.fail_fast_on_rejection);
        }
        if let Some(value) = env_u64("AGRISYNC_REACHABILITY_PROBE_MS") {
            cfg.sync.reachability_probe_ms = value;
        }

        if let Ok(v) = std::env::var("AGRISYNC_REMOTE_URL") {
            if !v.trim().is_empty() {
                cfg.remote.base_url = v.trim().trim_end_matches('/').to_string();
            }
        }
        cfg.remote.api_key = env_non_empty("AGRISYNC_REMOTE_API_KEY").or(cfg.remote.api_key);
        cfg.remote.access_token =
            env_non_empty("AGRISYNC_REMOTE_ACCESS_TOKEN").or(cfg.remote.access_token);
        if let Some(field) = env_non_empty("AGRISYNC_REMOTE_KEY_FIELD") {
            cfg.remote.key_field = field;
        }
        if let Some(value) = env_u64("AGRISYNC_REMOTE_TIMEOUT") {
            cfg.remote.timeout = value.max(1);
        }

        cfg
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.database.max_connections == 0 {
            return Err("Database max_connections must be greater than 0".to_string());
        }
        if self.sync.max_retries == 0 {
            return Err("Sync max_retries must be greater than 0".to_string());
        }
        if self.sync.batch_size == 0 {
            return Err("Sync batch_size must be greater than 0".to_string());
        }
        if self.sync.sync_interval_ms == 0 {
            return Err("Sync sync_interval_ms must be greater than 0".to_string());
        }
        if self.remote.key_field.trim().is_empty() {
            return Err("Remote key_field cannot be empty".to_string());
        }
        if !self.remote.base_url.starts_with("http://")
            && !self.remote.base_url.starts_with("https://")
        {
            return Err(format!(
                "Remote base_url must be an http(s) URL: {}",
                self.remote.base_url
            ));
        }
        Ok(())
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join("agrisync"))
        .unwrap_or_else(|| PathBuf::from("./data"))
}

fn env_u64(key: &str) -> Option<u64> {
    std::env::var(key).ok().and_then(|v| parse_u64(&v))
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_bool(s: &str, default: bool) -> bool {
    match s.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

fn parse_u64(value: &str) -> Option<u64> {
    value.trim().parse::<u64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_sync_policy() {
        let cfg = AppConfig::default();
        assert!(cfg.sync.auto_sync);
        assert_eq!(cfg.sync.max_retries, 3);
        assert_eq!(cfg.sync.batch_size, 50);
        assert_eq!(cfg.sync.interval(), Duration::from_secs(30));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_batch() {
        let mut cfg = AppConfig::default();
        cfg.sync.batch_size = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_non_http_remote() {
        let mut cfg = AppConfig::default();
        cfg.remote.base_url = "ftp://example".into();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn parse_bool_falls_back_to_default() {
        assert!(parse_bool("yes", false));
        assert!(!parse_bool("off", true));
        assert!(parse_bool("maybe", true));
    }
}
