//! Attendance model

use serde::{Deserialize, Serialize};

use super::common::UserRef;

/// One attendance mark: one per user per day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    /// Whose attendance this is; `None` when the account was deleted
    #[serde(default)]
    pub user: Option<UserRef>,
    /// Present flag
    #[serde(default = "default_present")]
    pub present: bool,
    /// 1 when the mark also advanced the student's lesson count
    #[serde(default)]
    pub lesson_increment: u8,
}

fn default_present() -> bool {
    true
}

impl AttendanceRecord {
    /// A local present-mark, used for optimistic updates
    pub fn present(user_id: impl Into<String>, increment_lesson: bool) -> Self {
        Self {
            user: Some(UserRef::new(user_id)),
            present: true,
            lesson_increment: u8::from(increment_lesson),
        }
    }

    /// Id of the user this record belongs to, if it still exists
    pub fn user_id(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.id.as_str())
    }
}

/// Body of `POST /api/attendance/mark`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkAttendanceInput {
    pub user_id: String,
    pub present: bool,
    pub increment_lesson: bool,
}

impl MarkAttendanceInput {
    /// Mark `user_id` present, optionally advancing their lesson count
    pub fn present(user_id: impl Into<String>, increment_lesson: bool) -> Self {
        Self {
            user_id: user_id.into(),
            present: true,
            increment_lesson,
        }
    }
}
