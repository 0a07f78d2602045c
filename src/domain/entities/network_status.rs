use crate::domain::value_objects::LinkQuality;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkStatus {
    pub is_online: bool,
    pub last_online_at: Option<DateTime<Utc>>,
    pub connection_type: String,
    pub effective_type: String,
}

impl NetworkStatus {
    pub fn link_quality(&self) -> LinkQuality {
        LinkQuality::classify(self.is_online, &self.effective_type)
    }
}

impl Default for NetworkStatus {
    fn default() -> Self {
        Self {
            is_online: false,
            last_online_at: None,
            connection_type: LinkInfo::UNKNOWN.to_string(),
            effective_type: LinkInfo::UNKNOWN.to_string(),
        }
    }
}

/// Link metadata reported by the platform alongside an online event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkInfo {
    pub connection_type: String,
    pub effective_type: String,
}

impl LinkInfo {
    pub const UNKNOWN: &'static str = "unknown";

    pub fn new(connection_type: impl Into<String>, effective_type: impl Into<String>) -> Self {
        Self {
            connection_type: connection_type.into(),
            effective_type: effective_type.into(),
        }
    }
}

impl Default for LinkInfo {
    fn default() -> Self {
        Self::new(Self::UNKNOWN, Self::UNKNOWN)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectivityEvent {
    Online(LinkInfo),
    Offline,
}
