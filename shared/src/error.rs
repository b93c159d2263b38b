use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TodoError {
    #[error("backing store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("todo {todo_id} not found")]
    NotFound { todo_id: String },

    #[error("missing or invalid identity")]
    Unauthorized,

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("malformed item: {0}")]
    MalformedItem(String),
}

impl TodoError {
    pub fn status_code(&self) -> u16 {
        match self {
            TodoError::StoreUnavailable(_) | TodoError::MalformedItem(_) => 500,
            TodoError::NotFound { .. } => 404,
            TodoError::Unauthorized => 401,
            TodoError::InvalidRequest(_) => 400,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            TodoError::StoreUnavailable(_) => "StoreUnavailable",
            TodoError::NotFound { .. } => "NotFound",
            TodoError::Unauthorized => "Unauthorized",
            TodoError::InvalidRequest(_) => "InvalidRequest",
            TodoError::MalformedItem(_) => "MalformedItem",
        }
    }

    /// Body sent back to the caller. Server-side details stay in the logs.
    pub fn to_response(&self) -> ErrorResponse {
        let message = match self {
            TodoError::StoreUnavailable(_) | TodoError::MalformedItem(_) => {
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        ErrorResponse {
            error: self.kind().to_string(),
            message,
        }
    }
}

impl From<serde_json::Error> for TodoError {
    fn from(e: serde_json::Error) -> Self {
        TodoError::InvalidRequest(format!("Invalid request body: {}", e))
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}
