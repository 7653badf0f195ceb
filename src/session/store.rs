//! Session store
//!
//! Single source of truth for "who is logged in". Wraps the shared
//! [`SessionHandle`] with the auth endpoints:
//! - start-up resolution of a persisted token
//! - login / registration / logout
//! - password reset
//!
//! Role flags are derived from the current identity on every call.

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::watch;

use super::guard::{decide, GuardDecision};
use super::handle::{SessionHandle, SessionState};
use crate::api::{ApiClient, ApiError};
use crate::models::{AuthResponse, User, UserRole};
use crate::services::password::{validate_new_password, PasswordError};

/// Error types for session operations
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Input rejected before any network call
    #[error(transparent)]
    Validation(#[from] PasswordError),

    /// Missing required field
    #[error("{0} is required")]
    MissingField(&'static str),

    /// Backend or transport failure
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The token could not be persisted
    #[error("Failed to persist session: {0}")]
    Storage(anyhow::Error),
}

/// Registration form input
#[derive(Debug, Clone, Serialize)]
pub struct RegisterInput {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl RegisterInput {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            password: password.into(),
        }
    }
}

/// `/api/auth/me` answers either `{ user }` or the bare user
#[derive(Deserialize)]
#[serde(untagged)]
enum MeResponse {
    Wrapped { user: User },
    Bare(User),
}

impl From<MeResponse> for User {
    fn from(response: MeResponse) -> Self {
        match response {
            MeResponse::Wrapped { user } | MeResponse::Bare(user) => user,
        }
    }
}

#[derive(Deserialize)]
struct MessageResponse {
    #[serde(default)]
    message: Option<String>,
}

const FORGOT_PASSWORD_SENT: &str = "If that email is registered, a reset link was sent.";
const PASSWORD_UPDATED: &str = "Password updated.";

/// Session store
#[derive(Debug, Clone)]
pub struct SessionStore {
    api: ApiClient,
    session: Arc<SessionHandle>,
}

impl SessionStore {
    /// Create a store over the client's session
    pub fn new(api: ApiClient) -> Self {
        let session = api.session().clone();
        Self { api, session }
    }

    /// Resolve the persisted token into an identity.
    ///
    /// Any failure (expired token, network error, bad body) clears the
    /// token and leaves the session anonymous.
    pub async fn init(&self) -> SessionState {
        if self.session.token().await.is_none() {
            self.session.set_state(SessionState::Anonymous);
            return self.state();
        }

        match self.fetch_me().await {
            Ok(user) => {
                tracing::info!(user_id = %user.id, role = %user.role, "Session restored");
                self.session.set_state(SessionState::Authenticated(user));
            }
            Err(e) => {
                tracing::warn!(error = %e, "Stored session could not be resolved");
                self.session.clear_token().await;
                self.session.set_state(SessionState::Anonymous);
            }
        }
        self.state()
    }

    /// `POST /api/auth/login`
    pub async fn login(&self, email: &str, password: &str) -> Result<User, SessionError> {
        if email.trim().is_empty() {
            return Err(SessionError::MissingField("Email"));
        }
        if password.is_empty() {
            return Err(SessionError::MissingField("Password"));
        }

        let response: AuthResponse = self
            .api
            .post(
                "/api/auth/login",
                &json!({ "email": email.trim(), "password": password }),
            )
            .await?;
        self.establish(response).await
    }

    /// `POST /api/auth/register`
    pub async fn register(&self, input: RegisterInput) -> Result<User, SessionError> {
        if input.name.trim().is_empty() {
            return Err(SessionError::MissingField("Name"));
        }
        if input.email.trim().is_empty() {
            return Err(SessionError::MissingField("Email"));
        }

        let response: AuthResponse = self.api.post("/api/auth/register", &input).await?;
        self.establish(response).await
    }

    /// Registration form submit: the password pair is checked locally first
    pub async fn register_with_confirmation(
        &self,
        input: RegisterInput,
        confirm_password: &str,
    ) -> Result<User, SessionError> {
        validate_new_password(&input.password, confirm_password)?;
        self.register(input).await
    }

    /// Forget the token and identity. No network round-trip.
    pub async fn logout(&self) {
        let was = self.state();
        self.session.clear_token().await;
        self.session.set_state(SessionState::Anonymous);
        if let Some(user) = was.user() {
            tracing::info!(user_id = %user.id, "Logged out");
        }
    }

    /// `POST /api/auth/forgot-password`; returns the confirmation to show
    pub async fn forgot_password(&self, email: &str) -> Result<String, SessionError> {
        if email.trim().is_empty() {
            return Err(SessionError::MissingField("Email"));
        }
        let response: Option<MessageResponse> = self
            .api
            .post("/api/auth/forgot-password", &json!({ "email": email.trim() }))
            .await?;
        Ok(response
            .and_then(|r| r.message)
            .unwrap_or_else(|| FORGOT_PASSWORD_SENT.to_string()))
    }

    /// `POST /api/auth/reset-password/:token` after local validation
    pub async fn reset_password(
        &self,
        reset_token: &str,
        password: &str,
        confirm_password: &str,
    ) -> Result<String, SessionError> {
        validate_new_password(password, confirm_password)?;
        if reset_token.trim().is_empty() {
            return Err(SessionError::MissingField("Reset token"));
        }

        let path = format!(
            "/api/auth/reset-password/{}",
            urlencoding::encode(reset_token.trim())
        );
        let response: Option<MessageResponse> =
            self.api.post(&path, &json!({ "password": password })).await?;
        Ok(response
            .and_then(|r| r.message)
            .unwrap_or_else(|| PASSWORD_UPDATED.to_string()))
    }

    /// Re-read the identity, e.g. after the avatar changed
    pub async fn refresh_user(&self) -> Result<User, SessionError> {
        let user = self.fetch_me().await?;
        self.session
            .set_state(SessionState::Authenticated(user.clone()));
        Ok(user)
    }

    /// Current state snapshot
    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    /// Receiver notified on every state change
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.session.subscribe()
    }

    /// The logged-in user, if any
    pub fn user(&self) -> Option<User> {
        self.state().user().cloned()
    }

    pub fn is_loading(&self) -> bool {
        self.state().is_loading()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state().is_authenticated()
    }

    pub fn is_admin(&self) -> bool {
        self.state().user().is_some_and(User::is_admin)
    }

    pub fn is_teacher(&self) -> bool {
        self.state().user().is_some_and(User::is_teacher)
    }

    /// Gate a protected view on the current state
    pub fn guard(&self, required: &[UserRole]) -> GuardDecision {
        decide(&self.state(), required)
    }

    async fn fetch_me(&self) -> Result<User, ApiError> {
        let response: MeResponse = self.api.get("/api/auth/me").await?;
        Ok(response.into())
    }

    async fn establish(&self, response: AuthResponse) -> Result<User, SessionError> {
        self.session
            .store_token(&response.token)
            .await
            .map_err(SessionError::Storage)?;

        let user = response.user;
        tracing::info!(user_id = %user.id, role = %user.role, "Logged in");
        self.session
            .set_state(SessionState::Authenticated(user.clone()));
        Ok(user)
    }
}
