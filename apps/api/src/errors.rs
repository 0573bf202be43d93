use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::conversation::StoreError;
use crate::llm_client::LlmError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
/// Resume extraction failures never reach this type; they degrade to empty text.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid request body: {0}")]
    InvalidRequest(String),

    #[error("Missing chat message")]
    EmptyInput,

    #[error("Missing OPENROUTER_API_KEY")]
    MissingCredential,

    #[error("Invalid conversation id: {0}")]
    InvalidConversationId(String),

    #[error("Conversation has reached its maximum length")]
    ConversationFull,

    #[error("Upstream error: {0}")]
    Upstream(#[from] LlmError),
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::ConversationFull { .. } => AppError::ConversationFull,
        }
    }
}

/// Caller-facing failure payload: `{ "error": ..., "status": ... }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub status: u16,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidRequest(_)
            | AppError::EmptyInput
            | AppError::MissingCredential
            | AppError::InvalidConversationId(_)
            | AppError::ConversationFull => StatusCode::BAD_REQUEST,
            AppError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message shown to the widget. Upstream details stay in the log.
    pub fn public_message(&self) -> String {
        match self {
            AppError::InvalidRequest(_) => "Invalid request body.".to_string(),
            AppError::EmptyInput => "Missing chat message...".to_string(),
            AppError::MissingCredential => "Missing OPENROUTER_API_KEY...".to_string(),
            AppError::InvalidConversationId(_) => "Invalid conversation id.".to_string(),
            AppError::ConversationFull => {
                "Conversation has reached its maximum length. Please start a new conversation."
                    .to_string()
            }
            AppError::Upstream(_) => "Failed to process your request.".to_string(),
        }
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            error: self.public_message(),
            status: self.status().as_u16(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Upstream(e) => tracing::error!("LLM error: {e}"),
            other => tracing::debug!("Rejected request: {other}"),
        }

        (self.status(), Json(self.body())).into_response()
    }
}
