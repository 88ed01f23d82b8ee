//! API errors rendered as `{"error": message}` with a status code.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

use slidedeck_core::execution::ExecutionError;
use slidedeck_core::files::FileError;
use slidedeck_core::llm::LLMError;
use slidedeck_core::planning::PlanError;
use slidedeck_core::pptx::PptxError;
use slidedeck_core::templates::TemplateError;
use slidedeck_core::{ManagerError, StorageError};

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(status = %self.status, error = %self.message, "request failed");
        }
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<ManagerError> for ApiError {
    fn from(e: ManagerError) -> Self {
        match &e {
            _ if e.is_not_found() => Self::not_found(e.to_string()),
            ManagerError::Storage(StorageError::InvalidId(_)) => Self::not_found(e.to_string()),
            ManagerError::NoSections => Self::bad_request(e.to_string()),
            _ => Self::internal(e.to_string()),
        }
    }
}

impl From<TemplateError> for ApiError {
    fn from(e: TemplateError) -> Self {
        match e {
            TemplateError::Unknown(name) => Self::bad_request(format!("Invalid template: {name}")),
            other => Self::internal(other.to_string()),
        }
    }
}

impl From<PlanError> for ApiError {
    fn from(e: PlanError) -> Self {
        match e {
            PlanError::EmptyQuery => Self::bad_request("Query required"),
            other => Self::internal(other.to_string()),
        }
    }
}

impl From<FileError> for ApiError {
    fn from(e: FileError) -> Self {
        match e {
            FileError::LLM(inner) => inner.into(),
            other => Self::bad_request(other.to_string()),
        }
    }
}

impl From<ExecutionError> for ApiError {
    fn from(e: ExecutionError) -> Self {
        Self::internal(e.to_string())
    }
}

impl From<LLMError> for ApiError {
    fn from(e: LLMError) -> Self {
        Self::internal(e.to_string())
    }
}

impl From<PptxError> for ApiError {
    fn from(e: PptxError) -> Self {
        Self::internal(e.to_string())
    }
}
