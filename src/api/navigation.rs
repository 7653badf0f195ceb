//! Navigation sink
//!
//! The client core does not own a router. Whatever hosts it (a CLI, a UI
//! shell, a test) supplies a `Navigator`, and the 401 interceptor uses it to
//! send the user back to the login screen.

use std::sync::Mutex;

/// Where expired sessions are sent
pub const LOGIN_PATH: &str = "/login";

/// Navigation target injected into the API client
pub trait Navigator: Send + Sync {
    /// Replace the current location with `path`
    fn replace(&self, path: &str);
}

/// Navigator for headless hosts: only records the redirect in the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNavigator;

impl Navigator for TracingNavigator {
    fn replace(&self, path: &str) {
        tracing::warn!(path, "Session expired, navigation requested");
    }
}

/// Navigator that keeps every requested location in memory.
#[derive(Debug, Default)]
pub struct HistoryNavigator {
    entries: Mutex<Vec<String>>,
}

impl HistoryNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// All requested locations, oldest first
    pub fn entries(&self) -> Vec<String> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Most recent location
    pub fn current(&self) -> Option<String> {
        self.entries().last().cloned()
    }
}

impl Navigator for HistoryNavigator {
    fn replace(&self, path: &str) {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(path.to_string());
    }
}
