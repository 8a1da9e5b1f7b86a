use validator::ValidationErrors;

use crate::http::HttpError;

pub const NO_RESPONSE_MESSAGE: &str = "No response from server. Please check your connection.";

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("{0}")]
    InvalidCredentials(String),
    #[error("No response from server. Please check your connection.")]
    NoServerResponse,
    #[error("{0}")]
    ServerError(String),
    #[error("{0}")]
    Unknown(String),
    #[error("Validation error: {0}")]
    Validation(ValidationErrors),
}

impl AuthError {
    /// Failures of `/auth/login`: any answered request is reported with the
    /// server's own words, defaulting to "Invalid credentials".
    pub fn from_login_failure(error: HttpError) -> Self {
        match error {
            HttpError::NetworkUnreachable(_) => AuthError::NoServerResponse,
            HttpError::Unauthorized { .. } => AuthError::InvalidCredentials(
                error.server_message().unwrap_or("Invalid credentials").to_string(),
            ),
            HttpError::ServerRejected { status, .. } if status.is_client_error() => {
                AuthError::InvalidCredentials(
                    error.server_message().unwrap_or("Invalid credentials").to_string(),
                )
            }
            HttpError::ServerRejected { .. } => AuthError::ServerError(
                error.server_message().unwrap_or("Invalid credentials").to_string(),
            ),
            HttpError::MalformedResponse { message, .. } => AuthError::Unknown(message),
        }
    }

    pub fn from_http(error: HttpError, fallback: &str) -> Self {
        match error {
            HttpError::NetworkUnreachable(_) => AuthError::NoServerResponse,
            HttpError::ServerRejected { .. } | HttpError::Unauthorized { .. } => {
                AuthError::ServerError(error.server_message().unwrap_or(fallback).to_string())
            }
            HttpError::MalformedResponse { message, .. } => AuthError::Unknown(message),
        }
    }
}
