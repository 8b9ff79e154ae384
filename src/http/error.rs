use crate::llm::LlmError;
use crate::narration::NarrationError;
use crate::session::StoreError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,

    /// Set when the client should narrate locally instead
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<&'static str>,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("{0}")]
    BadRequest(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Narration provider is not configured")]
    NarrationUnavailable,

    #[error("Script generation failed: {0}")]
    Llm(#[from] LlmError),

    #[error("Narration failed: {0}")]
    Narration(NarrationError),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

impl From<NarrationError> for ApiError {
    fn from(err: NarrationError) -> Self {
        match err {
            NarrationError::NotConfigured => Self::NarrationUnavailable,
            NarrationError::EmptyText => Self::BadRequest("text must not be empty".to_string()),
            other => Self::Narration(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut fallback = None;

        let status = match &self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::NarrationUnavailable => {
                fallback = Some("local");
                StatusCode::SERVICE_UNAVAILABLE
            }
            Self::Llm(LlmError::MissingApiKey) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Llm(e) => {
                warn!("LLM request failed: {}", e);
                StatusCode::BAD_GATEWAY
            }
            Self::Narration(e) => {
                warn!("Narration request failed: {}", e);
                StatusCode::BAD_GATEWAY
            }
            Self::Store(e) => {
                error!("State store failure: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(ErrorResponse {
            error: self.to_string(),
            fallback,
        });

        (status, body).into_response()
    }
}
