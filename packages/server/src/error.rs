use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::pipeline::PipelineError;

/// Structured error response returned by all endpoints on failure.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Machine-readable error code. One of: `VALIDATION_ERROR`,
    /// `INVALID_REORDER`, `NOT_FOUND`, `CONFLICT`, `UNPROCESSABLE_IMAGE`,
    /// `STORAGE_ERROR`, `METADATA_ERROR`, `INTERNAL_ERROR`.
    #[schema(example = "VALIDATION_ERROR")]
    pub code: &'static str,
    /// Human-readable error description, suitable for display as-is.
    #[schema(example = "File is empty")]
    pub message: String,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    InvalidReorder(String),
    NotFound(String),
    Conflict(String),
    /// The upload is not a decodable image in an accepted format.
    Unprocessable(String),
    /// The blob store failed; the caller may retry.
    Storage(String),
    Metadata(String),
    Internal(String),
}

impl AppError {
    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        match self {
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "VALIDATION_ERROR",
                    message: msg,
                },
            ),
            AppError::InvalidReorder(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "INVALID_REORDER",
                    message: msg,
                },
            ),
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    code: "NOT_FOUND",
                    message: msg,
                },
            ),
            AppError::Conflict(msg) => (
                StatusCode::CONFLICT,
                ErrorBody {
                    code: "CONFLICT",
                    message: msg,
                },
            ),
            AppError::Unprocessable(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorBody {
                    code: "UNPROCESSABLE_IMAGE",
                    message: msg,
                },
            ),
            AppError::Storage(detail) => {
                tracing::error!("Storage error: {}", detail);
                (
                    StatusCode::BAD_GATEWAY,
                    ErrorBody {
                        code: "STORAGE_ERROR",
                        message: "File storage is unavailable, please try again".into(),
                    },
                )
            }
            AppError::Metadata(detail) => {
                tracing::error!("Metadata error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code: "METADATA_ERROR",
                        message: "Image details could not be saved, please try again".into(),
                    },
                )
            }
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code: "INTERNAL_ERROR",
                        message: "An unexpected error occurred".into(),
                    },
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Compression(e) => AppError::Unprocessable(e.to_string()),
            PipelineError::Storage { ref source, .. } if source.is_duplicate() => {
                AppError::Conflict("An object already exists at the generated path".into())
            }
            e @ PipelineError::Storage { .. } => AppError::Storage(e.to_string()),
            e @ PipelineError::Metadata { .. } => AppError::Metadata(e.to_string()),
            PipelineError::InvalidReorder(msg) => AppError::InvalidReorder(msg),
            e @ PipelineError::NotFound { .. } => AppError::NotFound(e.to_string()),
            PipelineError::InvalidInput(msg) => AppError::Validation(msg),
            PipelineError::Internal(detail) => AppError::Internal(detail),
        }
    }
}
