//! Error taxonomy for the Twitter resource.

use thiserror::Error;

use crate::client::ClientError;

/// Errors surfaced by connection, stream and account operations.
#[derive(Debug, Error)]
pub enum TwitterError {
    /// Credential verification was rejected by the service
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// The referenced user has no active session
    #[error("No active connection for {0}")]
    ConnectionNotFound(String),

    /// The referenced stream is unknown or already closed
    #[error("Stream {stream_id} not found for {user}")]
    StreamNotFound { user: String, stream_id: String },

    /// Any failure returned by the social-media client
    #[error("Twitter service error: {message}")]
    ExternalService { message: String, code: Option<i64> },

    /// One or more items of a batch open/close failed
    #[error("{operation} failed for {} stream(s): {source}", .failed.len())]
    PartialFailure {
        operation: &'static str,
        failed: Vec<String>,
        #[source]
        source: Box<TwitterError>,
    },

    /// The handle already owns a session
    #[error("{0} is already connected")]
    AlreadyConnected(String),

    /// Request parameters are unusable
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The client did not confirm in time
    #[error("Timed out waiting for {operation}")]
    Timeout { operation: &'static str },
}

impl TwitterError {
    /// Build a service error from the `(message, code)` pair streams emit.
    ///
    /// The code is appended to the message so log lines stay self-contained.
    pub fn from_stream_error(message: impl Into<String>, code: Option<i64>) -> Self {
        let message = message.into();
        let message = match code {
            Some(code) => format!("{} {}", message, code),
            None => message,
        };
        Self::ExternalService { message, code }
    }

    /// Stable machine-readable code for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Authentication(_) => "AUTHENTICATION_FAILED",
            Self::ConnectionNotFound(_) => "CONNECTION_NOT_FOUND",
            Self::StreamNotFound { .. } => "STREAM_NOT_FOUND",
            Self::ExternalService { .. } => "EXTERNAL_SERVICE_ERROR",
            Self::PartialFailure { .. } => "PARTIAL_FAILURE",
            Self::AlreadyConnected(_) => "ALREADY_CONNECTED",
            Self::InvalidRequest(_) => "INVALID_REQUEST",
            Self::Timeout { .. } => "TIMEOUT",
        }
    }
}

impl From<ClientError> for TwitterError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Unauthorized(message) => Self::Authentication(message),
            ClientError::Api { message, code } => Self::ExternalService { message, code },
            ClientError::Transport(message) | ClientError::Malformed(message) => {
                Self::ExternalService {
                    message,
                    code: None,
                }
            }
        }
    }
}

/// Result type for Twitter resource operations.
pub type TwitterResult<T> = Result<T, TwitterError>;
