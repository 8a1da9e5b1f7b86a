use std::sync::{Arc, Weak};

use secrecy::SecretString;
use tokio::{
    sync::{broadcast::error::RecvError, watch},
    task::JoinHandle,
};
use validator::Validate;

use crate::{
    configuration::AuthMode,
    http::{ApiClient, ApiResponse, AuthEvent},
    notify::{Notification, Notifier},
    storage::CredentialStore,
};

use super::{
    AuthError, LoginCredentials, RegisterCredentials, UserIdentity, model::AuthData,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Uninitialized,
    Loading,
    Authenticated,
    Anonymous,
}

/// Snapshot of the authentication state.
///
/// `is_authenticated` holds exactly when `user` is set and the credential is
/// considered valid.
#[derive(Debug, Clone)]
pub struct Session {
    pub phase: SessionPhase,
    pub user: Option<UserIdentity>,
    pub token: Option<SecretString>,
    pub is_authenticated: bool,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl Session {
    fn starting() -> Self {
        Self {
            phase: SessionPhase::Uninitialized,
            user: None,
            token: None,
            is_authenticated: false,
            is_loading: true,
            error: None,
        }
    }

    fn authenticated(user: UserIdentity, token: Option<SecretString>) -> Self {
        Self {
            phase: SessionPhase::Authenticated,
            user: Some(user),
            token,
            is_authenticated: true,
            is_loading: false,
            error: None,
        }
    }

    fn anonymous(error: Option<String>) -> Self {
        Self {
            phase: SessionPhase::Anonymous,
            user: None,
            token: None,
            is_authenticated: false,
            is_loading: false,
            error,
        }
    }
}

/// Owns the canonical authentication state.
///
/// State lives in a `watch` channel; observers call [`AuthSession::subscribe`].
pub struct AuthSession {
    api: ApiClient,
    credentials: CredentialStore,
    notifier: Notifier,
    state: watch::Sender<Session>,
}

impl AuthSession {
    pub fn new(api: ApiClient, credentials: CredentialStore, notifier: Notifier) -> Self {
        Self {
            api,
            credentials,
            notifier,
            state: watch::Sender::new(Session::starting()),
        }
    }

    pub fn snapshot(&self) -> Session {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated
    }

    pub fn current_user(&self) -> Option<UserIdentity> {
        self.state.borrow().user.clone()
    }

    pub fn clear_error(&self) {
        self.state.send_modify(|state| state.error = None);
    }

    fn start_loading(&self) {
        self.state.send_modify(|state| {
            if state.phase != SessionPhase::Authenticated {
                state.phase = SessionPhase::Loading;
            }
            state.is_loading = true;
            state.error = None;
        });
    }

    /// Restores the session persisted by a previous run.
    #[tracing::instrument(name = "initialize session", skip_all)]
    pub async fn initialize(&self) -> Session {
        self.start_loading();

        let restored = match self.api.auth_mode() {
            AuthMode::Bearer => self.restore_bearer(),
            AuthMode::Cookie => self.restore_cookie().await,
        };

        match restored {
            Some(session) => {
                tracing::info!(user_id = ?session.user.as_ref().map(|u| &u.id), "Session restored");
                self.state.send_replace(session);
            }
            None => {
                self.state.send_replace(Session::anonymous(None));
            }
        }

        self.snapshot()
    }

    fn restore_bearer(&self) -> Option<Session> {
        let token = self.credentials.get_token();
        let user = self.credentials.get_user();

        match (token, user) {
            (Some(token), Some(user)) if !self.credentials.is_token_expired() => {
                Some(Session::authenticated(user, Some(token)))
            }
            (None, None) => None,
            _ => {
                tracing::info!("Discarding stale or partial credentials");
                self.credentials.clear();
                None
            }
        }
    }

    async fn restore_cookie(&self) -> Option<Session> {
        self.credentials.get_user()?;

        match self.check_session().await {
            Ok(user) => {
                self.credentials.set_user(&user);
                Some(Session::authenticated(user, None))
            }
            Err(error) => {
                tracing::info!(err.msg = %error, "Cookie session no longer valid");
                self.credentials.clear();
                None
            }
        }
    }

    #[tracing::instrument(name = "login", skip_all, fields(email = %credentials.email))]
    pub async fn login(&self, credentials: LoginCredentials) -> Result<UserIdentity, AuthError> {
        if let Err(errors) = credentials.validate() {
            let error = AuthError::Validation(errors);
            self.state
                .send_modify(|state| state.error = Some(error.to_string()));
            return Err(error);
        }

        self.start_loading();

        match self.request_login(&credentials).await {
            Ok((user, token)) => {
                if let Some(token) = &token {
                    self.credentials.set_token(token);
                }
                self.credentials.set_user(&user);
                self.state
                    .send_replace(Session::authenticated(user.clone(), token));

                tracing::info!(user_id = %user.id, "Logged in");
                self.notifier.notify(Notification::info(
                    "Login successful",
                    format!("Welcome back, {}!", user.display_name()),
                ));

                Ok(user)
            }
            Err(error) => {
                tracing::warn!(err.msg = %error, err.details = ?error, "Login failed");
                self.state
                    .send_replace(Session::anonymous(Some(error.to_string())));
                self.notifier
                    .notify(Notification::error("Login failed", error.to_string()));

                Err(error)
            }
        }
    }

    async fn request_login(
        &self,
        credentials: &LoginCredentials,
    ) -> Result<(UserIdentity, Option<SecretString>), AuthError> {
        let response: ApiResponse<AuthData> = self
            .api
            .post("/auth/login", &credentials.to_body())
            .await
            .map_err(AuthError::from_login_failure)?;

        if !response.success {
            return Err(AuthError::ServerError(
                response.message.unwrap_or_else(|| "Login failed".to_string()),
            ));
        }

        let data = response
            .data
            .ok_or_else(|| AuthError::Unknown("Invalid response from server".to_string()))?;
        let token = data.access_token().map(SecretString::from);

        match (data.user, token) {
            (Some(user), Some(token)) => Ok((user, Some(token))),
            (Some(user), None) if self.api.auth_mode() == AuthMode::Cookie => Ok((user, None)),
            _ => Err(AuthError::Unknown(
                "Invalid response from server".to_string(),
            )),
        }
    }

    /// Creates an account. Never signs the caller in; the account has to be
    /// verified by email first.
    #[tracing::instrument(name = "register", skip_all, fields(email = %credentials.email))]
    pub async fn register(&self, credentials: RegisterCredentials) -> Result<(), AuthError> {
        if let Err(errors) = credentials.validate() {
            let error = AuthError::Validation(errors);
            self.state
                .send_modify(|state| state.error = Some(error.to_string()));
            return Err(error);
        }

        self.start_loading();

        let result = self
            .api
            .post::<_, ApiResponse<serde_json::Value>>("/auth/register", &credentials.to_body())
            .await
            .map_err(|e| AuthError::from_http(e, "Registration failed. Please try again."))
            .and_then(|response| {
                if response.success {
                    Ok(())
                } else {
                    Err(AuthError::ServerError(response.message.unwrap_or_else(|| {
                        "Registration failed. Please try again.".to_string()
                    })))
                }
            });

        let error = result.as_ref().err().map(ToString::to_string);
        self.state.send_modify(|state| {
            state.is_loading = false;
            if state.phase != SessionPhase::Authenticated {
                state.phase = SessionPhase::Anonymous;
            }
            state.error = error;
        });

        match &result {
            Ok(()) => self.notifier.notify(Notification::info(
                "Registration successful",
                "Please check your email for verification instructions.",
            )),
            Err(error) => self
                .notifier
                .notify(Notification::error("Registration failed", error.to_string())),
        }

        result
    }

    /// Ends the session. Local state is always cleared, whatever the server says.
    #[tracing::instrument(name = "logout", skip_all)]
    pub async fn logout(&self) {
        let name = self
            .current_user()
            .map(|user| user.display_name().to_string())
            .unwrap_or_else(|| "user".to_string());

        self.state.send_modify(|state| state.is_loading = true);

        match self
            .api
            .post::<_, serde_json::Value>("/auth/logout", &serde_json::json!({}))
            .await
        {
            Ok(_) => self.notifier.notify(Notification::info(
                "Logged out",
                format!("You have been successfully logged out. See you soon, {name}!"),
            )),
            Err(error) => {
                tracing::warn!(err.msg = %error, err.details = ?error, "Server logout failed");
                self.notifier.notify(Notification::info(
                    "Logout issue",
                    "There was an issue with the server logout, but you've been logged out locally.",
                ));
            }
        }

        self.credentials.clear();
        self.state.send_replace(Session::anonymous(None));
    }

    /// Asks the backend who the current credential belongs to.
    ///
    /// A 401 here is an answer, not a reason to force a logout.
    #[tracing::instrument(name = "check session", skip_all)]
    pub async fn check_session(&self) -> Result<UserIdentity, AuthError> {
        let response: ApiResponse<AuthData> = self
            .api
            .get(self.api.session_check_path())
            .await
            .map_err(|e| AuthError::from_http(e, "Session is no longer valid"))?;

        response
            .data
            .and_then(|data| data.user)
            .ok_or_else(|| AuthError::Unknown("Invalid response from server".to_string()))
    }

    /// Drops the session after the server rejected the credential.
    pub fn handle_forced_logout(&self) {
        let had_session = self.state.borrow().user.is_some();

        self.credentials.clear();
        self.state.send_modify(|state| {
            state.phase = SessionPhase::Anonymous;
            state.user = None;
            state.token = None;
            state.is_authenticated = false;
            state.is_loading = false;
        });

        if had_session {
            tracing::warn!("Session expired, forced logout");
            self.notifier.notify(Notification::error(
                "Session expired",
                "Your session has expired. Please log in again.",
            ));
        }
    }

    /// Reacts to [`AuthEvent::ForcedLogout`] for as long as the session lives.
    pub fn spawn_forced_logout_listener(self: &Arc<Self>) -> JoinHandle<()> {
        let mut receiver = self.api.events().subscribe();
        let session: Weak<Self> = Arc::downgrade(self);

        tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(AuthEvent::ForcedLogout) | Err(RecvError::Lagged(_)) => {
                        match session.upgrade() {
                            Some(session) => session.handle_forced_logout(),
                            None => break,
                        }
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }
}
