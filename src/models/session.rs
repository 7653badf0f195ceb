//! Auth response model

use serde::Deserialize;

use super::User;

/// Body of a successful login or registration
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    /// Credential token to present as a bearer token
    pub token: String,
    /// The identity the token belongs to
    pub user: User,
}
