//! Error taxonomy for a collection run.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, StatsError>;

#[derive(Debug, Error)]
pub enum StatsError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("repository {repository} not found or not accessible")]
    NotFound { repository: String },

    #[error("{operation}: remote unavailable: {reason}")]
    RemoteUnavailable { operation: String, reason: String },

    #[error("{operation}: unexpected response: {reason}")]
    UnexpectedResponse { operation: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StatsError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn not_found(repository: impl Into<String>) -> Self {
        Self::NotFound {
            repository: repository.into(),
        }
    }

    pub fn unavailable(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::RemoteUnavailable {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    pub fn unexpected(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::UnexpectedResponse {
            operation: operation.into(),
            reason: reason.into(),
        }
    }
}
