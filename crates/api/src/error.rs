//! Maps core errors onto HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::error;

use darkroom_core::derivative::DerivativeError;
use darkroom_core::library::LibraryError;
use darkroom_shared::AppError;

/// Response-side wrapper around [`AppError`].
///
/// Handlers return this from `?` on any core error; the conversion chain
/// picks the status code and error code, and `into_response` renders the
/// JSON shape `{"error": CODE, "message": text}`.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl ApiError {
    /// A 400 for request parameters rejected before the core is invoked.
    pub fn validation(message: impl Into<String>) -> Self {
        Self(AppError::Validation(message.into()))
    }

    /// A 500 for failures with no more specific category.
    pub fn internal(message: impl Into<String>) -> Self {
        Self(AppError::Internal(message.into()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            error!(error = %self.0, "Request failed");
        }
        let body = Json(json!({
            "error": self.0.error_code(),
            "message": self.0.to_string(),
        }));
        (status, body).into_response()
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<DerivativeError> for ApiError {
    fn from(err: DerivativeError) -> Self {
        let app = match err {
            DerivativeError::ForbiddenPath(msg) => AppError::Forbidden(msg),
            DerivativeError::NotFound(msg) => AppError::NotFound(msg),
            err @ (DerivativeError::Decode(_)
            | DerivativeError::Encode(_)
            | DerivativeError::PageOutOfRange { .. }) => AppError::Validation(err.to_string()),
            err @ DerivativeError::RenderTimeout(_) => AppError::Timeout(err.to_string()),
            err @ (DerivativeError::ToolNotFound(_)
            | DerivativeError::Render(_)
            | DerivativeError::DeleteFailed(_)) => AppError::Internal(err.to_string()),
        };
        Self(app)
    }
}

impl From<LibraryError> for ApiError {
    fn from(err: LibraryError) -> Self {
        let app = match err {
            err @ LibraryError::UnsupportedFormat { .. } => AppError::Validation(err.to_string()),
            LibraryError::Forbidden(msg) => AppError::Forbidden(msg),
            LibraryError::NotFound(msg) => AppError::NotFound(msg),
            LibraryError::Io(source) => AppError::Internal(source.to_string()),
        };
        Self(app)
    }
}
