use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::resource::ResourceError;
use crate::twitter::TwitterError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Resource(#[from] ResourceError),
}

impl From<TwitterError> for AppError {
    fn from(err: TwitterError) -> Self {
        AppError::Resource(ResourceError::Twitter(err))
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Serialize)]
struct ErrorBody {
    code: String,
    message: String,
}

/// Check if running in production mode (based on RUN_MODE env var)
fn is_production() -> bool {
    std::env::var("RUN_MODE")
        .map(|m| m == "production" || m == "prod")
        .unwrap_or(false)
}

fn twitter_status(err: &TwitterError) -> StatusCode {
    match err {
        TwitterError::Authentication(_) => StatusCode::UNAUTHORIZED,
        TwitterError::ConnectionNotFound(_) | TwitterError::StreamNotFound { .. } => {
            StatusCode::NOT_FOUND
        }
        TwitterError::ExternalService { .. } | TwitterError::PartialFailure { .. } => {
            StatusCode::BAD_GATEWAY
        }
        TwitterError::AlreadyConnected(_) => StatusCode::CONFLICT,
        TwitterError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        TwitterError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, client_message, log_message) = match &self {
            AppError::Auth(msg) => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                msg.clone(),
                msg.clone(),
            ),
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                msg.clone(),
                msg.clone(),
            ),
            AppError::Resource(e) => {
                let msg = e.to_string();
                match e {
                    ResourceError::UnknownResource(_) => {
                        (StatusCode::NOT_FOUND, "UNKNOWN_RESOURCE", msg.clone(), msg)
                    }
                    ResourceError::UnknownMethod { .. } => {
                        (StatusCode::NOT_FOUND, "UNKNOWN_METHOD", msg.clone(), msg)
                    }
                    ResourceError::InvalidParams { .. } => {
                        (StatusCode::BAD_REQUEST, "INVALID_PARAMS", msg.clone(), msg)
                    }
                    ResourceError::Twitter(err) => {
                        (twitter_status(err), err.code(), msg.clone(), msg)
                    }
                    ResourceError::Serialization(_) => {
                        let client_msg = if is_production() {
                            "Internal server error".to_string()
                        } else {
                            msg.clone()
                        };
                        (
                            StatusCode::INTERNAL_SERVER_ERROR,
                            "SERIALIZATION_ERROR",
                            client_msg,
                            msg,
                        )
                    }
                }
            }
        };

        // Always log the detailed error server-side
        tracing::error!(
            code = %code,
            status = %status.as_u16(),
            message = %log_message,
            "API error"
        );

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message: client_message,
            },
        };

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
