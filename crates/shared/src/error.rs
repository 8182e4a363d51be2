use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_GENERATION_ERROR: &str = "Generation failed";
pub const DEFAULT_LIBRARY_ERROR: &str = "Failed to load library";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Validation,
    Transport,
    Status,
    Malformed,
}

/// Failure taxonomy of the client core. Controllers convert these into
/// state; they never escape a controller boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("invalid request: {0}")]
    Validation(String),
    #[error("{0}")]
    Transport(String),
    #[error("Request failed: {0}")]
    Status(u16),
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl ClientError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ClientError::Validation(_) => ErrorCode::Validation,
            ClientError::Transport(_) => ErrorCode::Transport,
            ClientError::Status(_) => ErrorCode::Status,
            ClientError::Malformed(_) => ErrorCode::Malformed,
        }
    }

    /// Human readable message for an inline error notice, falling back to
    /// `default` when the underlying failure carries no text.
    pub fn user_message(&self, default: &str) -> String {
        let message = match self {
            ClientError::Transport(message) | ClientError::Malformed(message) => {
                message.trim().to_string()
            }
            other => other.to_string(),
        };
        if message.is_empty() {
            default.to_string()
        } else {
            message
        }
    }
}
