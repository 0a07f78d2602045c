use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Storage error: {0}")]
    Storage(String),

    /// The remote service could not be reached at all.
    #[error("Network error: {0}")]
    Network(String),

    /// The remote service answered, but refused the request.
    #[error("Remote rejected request ({status}): {message}")]
    RemoteRejected { status: u16, message: String },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether replaying the same request later could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::Network(_) | AppError::Database(_) | AppError::Storage(_) => true,
            AppError::RemoteRejected { status, .. } => {
                *status >= 500 || *status == 408 || *status == 429
            }
            _ => false,
        }
    }

    /// The remote service reached a verdict on the payload itself.
    pub fn is_rejection(&self) -> bool {
        match self {
            AppError::RemoteRejected { .. } => !self.is_retryable(),
            AppError::ValidationError(_) => true,
            _ => false,
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        AppError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_data() || err.is_syntax() || err.is_eof() {
            AppError::DeserializationError(err.to_string())
        } else {
            AppError::SerializationError(err.to_string())
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => AppError::RemoteRejected {
                status: status.as_u16(),
                message: err.to_string(),
            },
            None if err.is_decode() => AppError::DeserializationError(err.to_string()),
            None => AppError::Network(err.to_string()),
        }
    }
}

impl From<String> for AppError {
    fn from(err: String) -> Self {
        AppError::Internal(err)
    }
}

impl From<&str> for AppError {
    fn from(err: &str) -> Self {
        AppError::Internal(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classification() {
        assert!(AppError::Network("offline".into()).is_retryable());
        assert!(AppError::RemoteRejected {
            status: 503,
            message: "unavailable".into()
        }
        .is_retryable());
        assert!(AppError::RemoteRejected {
            status: 429,
            message: "slow down".into()
        }
        .is_retryable());
        assert!(!AppError::RemoteRejected {
            status: 422,
            message: "bad payload".into()
        }
        .is_retryable());
    }

    #[test]
    fn rejection_excludes_transient_statuses() {
        let invalid = AppError::RemoteRejected {
            status: 400,
            message: "missing name".into(),
        };
        assert!(invalid.is_rejection());

        let transient = AppError::RemoteRejected {
            status: 502,
            message: "bad gateway".into(),
        };
        assert!(!transient.is_rejection());
        assert!(!AppError::Network("timeout".into()).is_rejection());
    }
}
