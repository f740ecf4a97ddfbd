//! Turns failures into HTTP responses. Server-side causes are logged here and
//! never echoed to the client.

use ac_core::AppError;
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    App(#[from] AppError),

    #[error("failed to render page: {0}")]
    Render(#[from] askama::Error),

    #[error(transparent)]
    Multipart(#[from] MultipartError),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::App(AppError::NotFound(kind, id)) => {
                (StatusCode::NOT_FOUND, format!("{kind} {id} does not exist")).into_response()
            }
            ApiError::App(AppError::Rejected(messages)) => {
                (StatusCode::BAD_REQUEST, messages.join("\n")).into_response()
            }
            ApiError::App(AppError::Internal(err)) => {
                tracing::error!(error = ?err, "request failed");
                internal_error()
            }
            ApiError::Render(err) => {
                tracing::error!(error = %err, "template rendering failed");
                internal_error()
            }
            ApiError::Multipart(err) => {
                tracing::debug!(error = %err, "malformed upload");
                (err.status(), err.body_text()).into_response()
            }
        }
    }
}

fn internal_error() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
}
