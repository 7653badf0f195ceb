//! User model
//!
//! This module defines the User identity and the role used for route and
//! menu gating.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use super::common::WireId;

/// An authenticated identity as returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "UserRecord")]
pub struct User {
    /// Unique identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Email address
    pub email: String,
    /// User role
    pub role: UserRole,
    /// Avatar URL, if one has been set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    /// Account creation timestamp
    #[serde(rename = "createdAt", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct UserRecord {
    #[serde(flatten)]
    ids: WireId,
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    role: UserRole,
    #[serde(default)]
    avatar: Option<String>,
    #[serde(rename = "createdAt", default)]
    created_at: Option<DateTime<Utc>>,
}

impl From<UserRecord> for User {
    fn from(record: UserRecord) -> Self {
        Self {
            id: record.ids.resolve(),
            name: record.name,
            email: record.email,
            role: record.role,
            avatar: record.avatar.filter(|a| !a.is_empty()),
            created_at: record.created_at,
        }
    }
}

impl User {
    /// Create a user with the given identity
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        email: impl Into<String>,
        role: UserRole,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: email.into(),
            role,
            avatar: None,
            created_at: None,
        }
    }

    /// Check if the user is an administrator
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// Check if the user is a teacher
    pub fn is_teacher(&self) -> bool {
        self.role == UserRole::Teacher
    }

    /// Check if the user is a student
    pub fn is_student(&self) -> bool {
        self.role == UserRole::Student
    }

    /// Admins and teachers both pass "admin-like" gates
    pub fn is_staff(&self) -> bool {
        matches!(self.role, UserRole::Admin | UserRole::Teacher)
    }

    /// Set-membership check; an empty set admits every role
    pub fn has_any_role(&self, roles: &[UserRole]) -> bool {
        roles.is_empty() || roles.contains(&self.role)
    }

    /// First letter of the name, upper-cased, for avatar placeholders
    pub fn initial(&self) -> Option<char> {
        self.name.chars().next().and_then(|c| c.to_uppercase().next())
    }
}

/// User role.
///
/// There is no hierarchy; gates list the roles they admit explicitly.
/// Serialized lower-case; read case-insensitively through [`FromStr`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Learner (default for new accounts)
    #[default]
    Student,
    /// Group admin / instructor
    Teacher,
    /// Platform administrator
    Admin,
}

impl UserRole {
    /// Every role, in display order
    pub const ALL: [UserRole; 3] = [UserRole::Student, UserRole::Teacher, UserRole::Admin];

    /// Roles admitted by "admin-like" gates
    pub const STAFF: [UserRole; 2] = [UserRole::Admin, UserRole::Teacher];
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRole::Student => write!(f, "student"),
            UserRole::Teacher => write!(f, "teacher"),
            UserRole::Admin => write!(f, "admin"),
        }
    }
}

impl FromStr for UserRole {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "student" => Ok(UserRole::Student),
            "teacher" => Ok(UserRole::Teacher),
            "admin" => Ok(UserRole::Admin),
            _ => Err(anyhow::anyhow!("Invalid user role: {}", s)),
        }
    }
}

impl<'de> Deserialize<'de> for UserRole {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
