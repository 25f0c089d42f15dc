use axum::Json;
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::{error, warn};

use storefront_types::api::ErrorResponse;
use storefront_types::validation::{ImageRejection, ValidationErrors};

pub const UNAUTHENTICATED: &str = "You must be logged in";

/// Every way a request can fail. The `Display` text is what the caller sees
/// in the `error` field; upstream causes are logged and never sent out.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Auth(&'static str),

    #[error("{0}")]
    Permission(&'static str),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    TooLarge(String),

    #[error("{0}")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(&'static str),

    /// The blob store answered, but not with something usable.
    #[error("{0}")]
    Upstream(&'static str),

    #[error("{message}")]
    Storage {
        message: &'static str,
        cause: anyhow::Error,
    },

    #[error("{message}")]
    Database {
        message: &'static str,
        cause: anyhow::Error,
    },

    #[error("Internal server error")]
    Internal,
}

impl ApiError {
    pub fn unauthenticated() -> Self {
        Self::Auth(UNAUTHENTICATED)
    }

    /// `map_err` adapter for persistence failures.
    pub fn database(message: &'static str) -> impl FnOnce(anyhow::Error) -> Self {
        move |cause| Self::Database { message, cause }
    }

    /// `map_err` adapter for blob store failures.
    pub fn storage(message: &'static str) -> impl FnOnce(anyhow::Error) -> Self {
        move |cause| Self::Storage { message, cause }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Auth(_) => StatusCode::UNAUTHORIZED,
            Self::Permission(_) => StatusCode::FORBIDDEN,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::TooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Upstream(_) | Self::Storage { .. } => StatusCode::BAD_GATEWAY,
            Self::Database { .. } | Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            Self::Storage { message, cause } | Self::Database { message, cause } => {
                error!("{}: {:#}", message, cause);
            }
            Self::Upstream(message) => error!("{}", message),
            Self::Validation(message) | Self::TooLarge(message) => {
                warn!("Rejected request: {}", message)
            }
            _ => {}
        }

        (self.status(), Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors.to_string())
    }
}

impl From<ImageRejection> for ApiError {
    fn from(rejection: ImageRejection) -> Self {
        match rejection {
            ImageRejection::TooLarge => Self::TooLarge(rejection.to_string()),
            other => Self::Validation(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::TooLarge(ImageRejection::TooLarge.to_string())
        } else {
            Self::Validation(err.body_text())
        }
    }
}

/// Runs a blocking closure (SQLite, password hashing) off the async runtime.
pub async fn blocking<F, T>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        ApiError::Internal
    })?
}
