//! Backend API access
//!
//! This module contains the HTTP client every other module talks to the
//! backend through:
//! - `client` - base URL, bearer token, body encoding, global 401 handling
//! - `envelope` - unwrapping of `{ "users": [...] }`-style bodies
//! - `error` - typed errors carrying the backend's `message`
//! - `navigation` - the navigation sink the 401 handler redirects through

pub mod client;
pub mod envelope;
pub mod error;
pub mod navigation;

pub use client::{ApiClient, RequestBody};
pub use envelope::{item_from, list_from};
pub use error::ApiError;
pub use navigation::{HistoryNavigator, Navigator, TracingNavigator, LOGIN_PATH};
