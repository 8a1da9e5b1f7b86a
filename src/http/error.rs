use reqwest::StatusCode;

pub const FALLBACK_MESSAGE: &str = "Something went wrong. Please try again.";

#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    #[error("No response from server: {0}")]
    NetworkUnreachable(String),

    #[error("{message}")]
    ServerRejected { status: StatusCode, message: String },

    #[error("{message}")]
    Unauthorized { message: String },

    #[error("Unexpected response: {message}")]
    MalformedResponse {
        status: Option<StatusCode>,
        message: String,
    },
}

impl HttpError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            HttpError::NetworkUnreachable(_) => None,
            HttpError::ServerRejected { status, .. } => Some(*status),
            HttpError::Unauthorized { .. } => Some(StatusCode::UNAUTHORIZED),
            HttpError::MalformedResponse { status, .. } => *status,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            HttpError::NetworkUnreachable(message) => message.as_str(),
            HttpError::ServerRejected { message, .. } => message.as_str(),
            HttpError::Unauthorized { message } => message.as_str(),
            HttpError::MalformedResponse { message, .. } => message.as_str(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }

    /// Message the server put in the failure payload, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            HttpError::ServerRejected { message, .. } | HttpError::Unauthorized { message }
                if message != FALLBACK_MESSAGE =>
            {
                Some(message.as_str())
            }
            _ => None,
        }
    }
}

impl From<reqwest::Error> for HttpError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            HttpError::MalformedResponse {
                status: error.status(),
                message: error.to_string(),
            }
        } else {
            HttpError::NetworkUnreachable(error.to_string())
        }
    }
}

/// Pulls a human-readable message out of a failure payload.
///
/// Priority: `error.message`, then top-level `message`, then the fallback.
pub fn extract_message(body: &serde_json::Value) -> String {
    body.get("error")
        .and_then(|e| e.get("message"))
        .and_then(|m| m.as_str())
        .or_else(|| body.get("message").and_then(|m| m.as_str()))
        .filter(|m| !m.is_empty())
        .unwrap_or(FALLBACK_MESSAGE)
        .to_string()
}
