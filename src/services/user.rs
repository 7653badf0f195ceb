//! User administration service
//!
//! Staff-facing account management:
//! - listing accounts
//! - changing a user's role
//! - deleting an account
//! - headcounts per role

use serde_json::{json, Value};

use crate::api::{list_from, ApiClient, ApiError};
use crate::models::{User, UserRole};

/// Error types for user administration
#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    /// Invalid input
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Backend or transport failure
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Headcounts shown on the admin dashboard
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UserStats {
    pub total: usize,
    pub students: usize,
    /// Teachers and admins together
    pub staff: usize,
}

impl UserStats {
    pub fn from_users(users: &[User]) -> Self {
        let students = users.iter().filter(|u| u.is_student()).count();
        let staff = users.iter().filter(|u| u.is_staff()).count();
        Self {
            total: users.len(),
            students,
            staff,
        }
    }
}

/// User administration service
#[derive(Debug, Clone)]
pub struct UserService {
    api: ApiClient,
}

impl UserService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// `GET /api/users`
    pub async fn list(&self) -> Result<Vec<User>, UserServiceError> {
        let body: Value = self.api.get("/api/users").await?;
        Ok(list_from(body, "users")?)
    }

    /// `PUT /api/users/:id` with the new role
    pub async fn change_role(&self, user_id: &str, role: UserRole) -> Result<(), UserServiceError> {
        let path = user_path(user_id)?;
        self.api
            .put::<_, Value>(&path, &json!({ "role": role }))
            .await?;
        tracing::info!(user_id, %role, "User role changed");
        Ok(())
    }

    /// `DELETE /api/users/:id`
    pub async fn delete(&self, user_id: &str) -> Result<(), UserServiceError> {
        let path = user_path(user_id)?;
        self.api.delete(&path).await?;
        tracing::info!(user_id, "User deleted");
        Ok(())
    }

    /// List users and count them per role
    pub async fn stats(&self) -> Result<UserStats, UserServiceError> {
        let users = self.list().await?;
        Ok(UserStats::from_users(&users))
    }
}

fn user_path(user_id: &str) -> Result<String, UserServiceError> {
    let user_id = user_id.trim();
    if user_id.is_empty() {
        return Err(UserServiceError::ValidationError(
            "User id cannot be empty".to_string(),
        ));
    }
    Ok(format!("/api/users/{}", urlencoding::encode(user_id)))
}
