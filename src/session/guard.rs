//! Protected navigation guard
//!
//! A pure decision over the session state and the roles a view admits.

use tokio::sync::watch;

use super::handle::SessionState;
use crate::api::LOGIN_PATH;
use crate::models::UserRole;

/// What a protected view should do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// Identity not resolved yet; show a neutral placeholder
    Pending,
    /// Show the protected content
    Render,
    /// Send the user elsewhere
    Redirect(&'static str),
}

/// Decide whether a view requiring one of `required` may render.
///
/// An empty `required` slice admits any authenticated user. Unauthenticated
/// users and users whose role is not listed are sent to the login screen.
pub fn decide(state: &SessionState, required: &[UserRole]) -> GuardDecision {
    match state {
        SessionState::Loading => GuardDecision::Pending,
        SessionState::Anonymous => GuardDecision::Redirect(LOGIN_PATH),
        SessionState::Authenticated(user) if user.has_any_role(required) => GuardDecision::Render,
        SessionState::Authenticated(_) => GuardDecision::Redirect(LOGIN_PATH),
    }
}

/// Wait for the session to leave `Loading`, then decide
pub async fn resolve(
    rx: &mut watch::Receiver<SessionState>,
    required: &[UserRole],
) -> GuardDecision {
    match rx.wait_for(|state| !state.is_loading()).await {
        Ok(state) => decide(&state, required),
        // Sender gone: nobody will ever resolve the session.
        Err(_) => GuardDecision::Redirect(LOGIN_PATH),
    }
}
