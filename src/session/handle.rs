//! Shared session state
//!
//! `SessionHandle` owns the persisted credential token and the current
//! `SessionState`. It is shared by the API client (which expires the session
//! on 401) and the session store (which logs in and out). Mutators are
//! crate-private so nothing outside those two paths can change the token.

use std::sync::Arc;
use tokio::sync::watch;

use crate::models::User;
use crate::storage::{keys, Storage, StorageLayer};

/// Who is logged in, as far as the client knows
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    /// Start-up identity resolution has not finished
    Loading,
    /// No valid session
    Anonymous,
    /// Token accepted by the backend at last check
    Authenticated(User),
}

impl SessionState {
    /// The logged-in user, if any
    pub fn user(&self) -> Option<&User> {
        match self {
            SessionState::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, SessionState::Loading)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated(_))
    }
}

/// Token and identity shared between the API client and the session store
#[derive(Debug)]
pub struct SessionHandle {
    storage: Arc<Storage>,
    state: watch::Sender<SessionState>,
}

impl SessionHandle {
    /// Create a handle over `storage`. The state starts as `Loading`.
    pub fn new(storage: Arc<Storage>) -> Self {
        let (state, _) = watch::channel(SessionState::Loading);
        Self { storage, state }
    }

    /// Currently persisted token. Storage failures read as "no token".
    pub async fn token(&self) -> Option<String> {
        match self.storage.get(keys::TOKEN).await {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read session token");
                None
            }
        }
    }

    /// Snapshot of the current state
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Receiver notified on every state change
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub(crate) async fn store_token(&self, token: &str) -> anyhow::Result<()> {
        self.storage.set(keys::TOKEN, token).await
    }

    /// Remove the token. Safe to call any number of times.
    pub(crate) async fn clear_token(&self) -> bool {
        match self.storage.remove(keys::TOKEN).await {
            Ok(removed) => removed,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to clear session token");
                false
            }
        }
    }

    pub(crate) fn set_state(&self, state: SessionState) {
        self.state.send_replace(state);
    }

    /// Drop the credential and identity after the backend rejected it
    pub(crate) async fn expire(&self) {
        let removed = self.clear_token().await;
        if removed {
            tracing::info!("Session token cleared");
        }
        self.set_state(SessionState::Anonymous);
    }
}
