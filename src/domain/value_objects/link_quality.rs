use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkQuality {
    Offline,
    Slow,
    Moderate,
    Fast,
    Unknown,
}

impl LinkQuality {
    /// Classifies a platform-reported effective connection type.
    pub fn classify(is_online: bool, effective_type: &str) -> Self {
        if !is_online {
            return LinkQuality::Offline;
        }
        match effective_type.trim().to_ascii_lowercase().as_str() {
            "slow-2g" | "2g" => LinkQuality::Slow,
            "3g" => LinkQuality::Moderate,
            "4g" | "5g" | "wifi" | "ethernet" => LinkQuality::Fast,
            _ => LinkQuality::Unknown,
        }
    }
}
