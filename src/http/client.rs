use std::time::Duration;

use reqwest::{Method, RequestBuilder, StatusCode, header::HeaderValue, multipart::Form};
use secrecy::ExposeSecret;
use serde::{Serialize, de::DeserializeOwned};

use crate::{
    configuration::{AuthMode, Backend},
    storage::CredentialStore,
};

use super::{AuthEvent, AuthEventBus, HttpError, error::extract_message};

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// The backend's `{ success, message, data }` wrapper.
#[derive(serde::Deserialize, Debug)]
pub struct ApiResponse<T> {
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    pub data: Option<T>,
}

fn default_success() -> bool {
    true
}

/// HTTP client for the backend application API.
///
/// Attaches the current credential to every request and broadcasts
/// [`AuthEvent::ForcedLogout`] when the server answers 401 to anything but
/// the session-check endpoint. It never clears credentials itself.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    auth_mode: AuthMode,
    session_check_path: String,
    credentials: CredentialStore,
    events: AuthEventBus,
}

impl ApiClient {
    pub fn new(
        config: &Backend,
        credentials: CredentialStore,
        events: AuthEventBus,
    ) -> Result<Self, HttpError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .cookie_store(config.auth_mode == AuthMode::Cookie)
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            auth_mode: config.auth_mode,
            session_check_path: config.session_check_path.clone(),
            credentials,
            events,
        })
    }

    pub fn auth_mode(&self) -> AuthMode {
        self.auth_mode
    }

    pub fn session_check_path(&self) -> &str {
        &self.session_check_path
    }

    pub fn events(&self) -> &AuthEventBus {
        &self.events
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, HttpError> {
        self.send(Method::GET, path, |request| request).await
    }

    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, HttpError> {
        self.send(Method::POST, path, |request| request.json(body))
            .await
    }

    pub async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, HttpError> {
        self.send(Method::PUT, path, |request| request.json(body))
            .await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, HttpError> {
        self.send(Method::DELETE, path, |request| request).await
    }

    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: Form,
    ) -> Result<T, HttpError> {
        self.send(Method::POST, path, |request| request.multipart(form))
            .await
    }

    fn is_session_check(&self, path: &str) -> bool {
        path.split('?').next() == Some(self.session_check_path.as_str())
    }

    fn request(&self, method: Method, path: &str, request_id: &str) -> RequestBuilder {
        let mut request = self
            .http
            .request(method, format!("{}{}", self.base_url, path));

        if let Ok(value) = HeaderValue::from_str(request_id) {
            request = request.header(REQUEST_ID_HEADER, value);
        }

        if self.auth_mode == AuthMode::Bearer {
            if let Some(token) = self.credentials.bearer_token() {
                request = request.bearer_auth(token.expose_secret());
            }
        }

        request
    }

    #[tracing::instrument(
        name = "backend request",
        skip(self, build),
        fields(request_id = tracing::field::Empty, status = tracing::field::Empty)
    )]
    async fn send<T, F>(&self, method: Method, path: &str, build: F) -> Result<T, HttpError>
    where
        T: DeserializeOwned,
        F: FnOnce(RequestBuilder) -> RequestBuilder,
    {
        let request_id = uuid::Uuid::new_v4().to_string();
        tracing::Span::current().record("request_id", request_id.as_str());

        let response = build(self.request(method, path, &request_id))
            .send()
            .await
            .map_err(|error| {
                tracing::warn!(err.msg = %error, err.details = ?error, "Backend unreachable");
                HttpError::NetworkUnreachable(error.to_string())
            })?;

        let status = response.status();
        tracing::Span::current().record("status", status.as_u16());

        if status.is_success() {
            let bytes = response.bytes().await?;
            let bytes: &[u8] = if bytes.is_empty() { b"null" } else { &bytes };

            return serde_json::from_slice(bytes).map_err(|error| {
                tracing::warn!(err.msg = %error, "Backend sent an unexpected payload");
                HttpError::MalformedResponse {
                    status: Some(status),
                    message: error.to_string(),
                }
            });
        }

        let body: serde_json::Value = response.json().await.unwrap_or_default();
        let message = extract_message(&body);

        if status == StatusCode::UNAUTHORIZED {
            if self.is_session_check(path) {
                tracing::debug!("Session check rejected");
            } else {
                tracing::warn!(path, "Credential rejected, signalling forced logout");
                self.events.publish(AuthEvent::ForcedLogout);
            }

            return Err(HttpError::Unauthorized { message });
        }

        tracing::warn!(status = status.as_u16(), err.msg = %message, "Backend rejected request");

        Err(HttpError::ServerRejected { status, message })
    }
}
