//! Attendance board service
//!
//! Holds today's attendance view for staff: the student list, each
//! student's progress counters and today's marks. Marks are applied
//! locally first and confirmed by the backend afterwards.

use futures::future::join_all;
use serde_json::Value;
use std::collections::HashMap;

use super::mutation::MutationState;
use crate::api::{list_from, ApiClient, ApiError};
use crate::models::{AttendanceRecord, MarkAttendanceInput, Profile, Progress, User};

const LOAD_FAILED: &str = "Failed to load attendance data";
const MARK_FAILED: &str = "Failed to mark attendance";
const SOME_MARKS_FAILED: &str = "Some marks failed";

/// Error types for attendance operations
#[derive(Debug, thiserror::Error)]
pub enum AttendanceError {
    /// A plain present-mark for a student who is already marked today
    #[error("Attendance already marked for {0}")]
    AlreadyMarked(String),

    /// Backend or transport failure
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// One student line on the board
#[derive(Debug, Clone, PartialEq)]
pub struct StudentRow {
    pub user: User,
    pub marked: bool,
    pub lessons_completed: u32,
    pub current_streak: u32,
}

/// Reverts one optimistic mark
#[derive(Debug, Clone, PartialEq)]
pub struct MarkCompensation {
    user_id: String,
    previous: Option<AttendanceRecord>,
    lesson_bumped: bool,
}

impl MarkCompensation {
    pub fn user_id(&self) -> &str {
        &self.user_id
    }
}

/// A mark applied locally and waiting to be sent
#[derive(Debug)]
#[must_use = "the mark is only local until completed"]
pub struct PendingMark {
    input: MarkAttendanceInput,
    compensation: MarkCompensation,
}

impl PendingMark {
    pub fn user_id(&self) -> &str {
        &self.input.user_id
    }

    /// State of the mutation; always `Pending` until completed
    pub fn state(&self) -> MutationState<MarkCompensation> {
        MutationState::Pending
    }
}

/// Result of marking every unmarked student
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarkAllOutcome {
    /// Students whose mark the backend accepted
    pub confirmed: Vec<String>,
    /// Rejected marks and how to revert them
    pub failed: Vec<MarkCompensation>,
}

impl MarkAllOutcome {
    /// Aggregate message for the banner, if anything failed
    pub fn error(&self) -> Option<&'static str> {
        (!self.failed.is_empty()).then_some(SOME_MARKS_FAILED)
    }
}

/// Attendance board state
#[derive(Debug)]
pub struct AttendanceBoard {
    api: ApiClient,
    users: Vec<User>,
    progress: HashMap<String, Progress>,
    records: HashMap<String, AttendanceRecord>,
    error: Option<String>,
}

impl AttendanceBoard {
    /// Create an empty board; call [`AttendanceBoard::refresh`] to load it
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            users: Vec::new(),
            progress: HashMap::new(),
            records: HashMap::new(),
            error: None,
        }
    }

    /// Reload users, profiles and today's records together.
    ///
    /// All three must succeed; on failure the previous view is kept and the
    /// error banner is set.
    pub async fn refresh(&mut self) -> Result<(), AttendanceError> {
        let loaded = tokio::try_join!(
            self.api.get::<Value>("/api/users"),
            self.api.get::<Value>("/api/profiles"),
            self.api.get::<Value>("/api/attendance/today"),
        )
        .and_then(|(users, profiles, records)| {
            Ok((
                list_from::<User>(users, "users")?,
                list_from::<Profile>(profiles, "profiles")?,
                list_from::<AttendanceRecord>(records, "records")?,
            ))
        });

        let (users, profiles, records) = match loaded {
            Ok(loaded) => loaded,
            Err(e) => {
                self.error = Some(banner_message(&e, LOAD_FAILED));
                return Err(e.into());
            }
        };

        self.users = users;
        self.progress = profiles
            .into_iter()
            .filter_map(|p| p.user_id().map(str::to_string).map(|id| (id, p.progress)))
            .collect();
        // Records of deleted accounts have no user left to show.
        self.records = records
            .into_iter()
            .filter_map(|r| r.user_id().map(str::to_string).map(|id| (id, r)))
            .collect();

        tracing::debug!(
            students = self.student_count(),
            marked = self.marked_count(),
            "Attendance board loaded"
        );
        Ok(())
    }

    /// Students in backend order, with today's status
    pub fn students(&self) -> Vec<StudentRow> {
        self.users
            .iter()
            .filter(|u| u.is_student())
            .map(|user| {
                let progress = self.progress.get(&user.id).cloned().unwrap_or_default();
                StudentRow {
                    user: user.clone(),
                    marked: self.is_marked(&user.id),
                    lessons_completed: progress.lessons_completed,
                    current_streak: progress.current_streak,
                }
            })
            .collect()
    }

    /// Number of students on the board
    pub fn student_count(&self) -> usize {
        self.users.iter().filter(|u| u.is_student()).count()
    }

    /// Number of marks recorded today
    pub fn marked_count(&self) -> usize {
        self.records.len()
    }

    pub fn is_marked(&self, user_id: &str) -> bool {
        self.records.contains_key(user_id)
    }

    /// Current error banner
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    /// Apply a present-mark locally and return the request to confirm it.
    ///
    /// With `increment_lesson` an already-marked student may be marked
    /// again to advance their lesson count; a plain repeat mark is refused.
    pub fn begin_mark(
        &mut self,
        user_id: &str,
        increment_lesson: bool,
    ) -> Result<PendingMark, AttendanceError> {
        if self.is_marked(user_id) && !increment_lesson {
            return Err(AttendanceError::AlreadyMarked(user_id.to_string()));
        }

        let previous = self.records.insert(
            user_id.to_string(),
            AttendanceRecord::present(user_id, increment_lesson),
        );

        let lesson_bumped = increment_lesson && self.progress.contains_key(user_id);
        if lesson_bumped {
            if let Some(progress) = self.progress.get_mut(user_id) {
                progress.lessons_completed += 1;
            }
        }

        Ok(PendingMark {
            input: MarkAttendanceInput::present(user_id, increment_lesson),
            compensation: MarkCompensation {
                user_id: user_id.to_string(),
                previous,
                lesson_bumped,
            },
        })
    }

    /// Send a pending mark. A rejection sets the error banner; the local
    /// patch stays until the caller applies the compensation.
    pub async fn complete(&mut self, pending: PendingMark) -> MutationState<MarkCompensation> {
        match post_mark(&self.api, &pending.input).await {
            Ok(()) => MutationState::Confirmed,
            Err(e) => {
                let error = banner_message(&e, MARK_FAILED);
                tracing::warn!(user_id = %pending.input.user_id, error = %e, "Attendance mark rejected");
                self.error = Some(error.clone());
                MutationState::Failed {
                    error,
                    compensation: pending.compensation,
                }
            }
        }
    }

    /// [`begin_mark`](Self::begin_mark) followed by [`complete`](Self::complete)
    pub async fn mark(
        &mut self,
        user_id: &str,
        increment_lesson: bool,
    ) -> Result<MutationState<MarkCompensation>, AttendanceError> {
        let pending = self.begin_mark(user_id, increment_lesson)?;
        Ok(self.complete(pending).await)
    }

    /// Mark every unmarked student present. Requests are independent; any
    /// failure sets the single banner "Some marks failed".
    pub async fn mark_all_unmarked(&mut self, increment_lesson: bool) -> MarkAllOutcome {
        let unmarked: Vec<String> = self
            .students()
            .into_iter()
            .filter(|row| !row.marked)
            .map(|row| row.user.id)
            .collect();

        let pending: Vec<PendingMark> = unmarked
            .iter()
            .filter_map(|id| self.begin_mark(id, increment_lesson).ok())
            .collect();

        let api = self.api.clone();
        let results = join_all(pending.iter().map(|p| post_mark(&api, &p.input))).await;

        let mut outcome = MarkAllOutcome::default();
        for (pending, result) in pending.into_iter().zip(results) {
            match result {
                Ok(()) => outcome.confirmed.push(pending.input.user_id),
                Err(e) => {
                    tracing::debug!(user_id = %pending.input.user_id, error = %e, "Bulk mark rejected");
                    outcome.failed.push(pending.compensation);
                }
            }
        }

        if let Some(message) = outcome.error() {
            self.error = Some(message.to_string());
        }
        outcome
    }

    /// Revert a rejected optimistic mark
    pub fn compensate(&mut self, compensation: MarkCompensation) {
        match compensation.previous {
            Some(record) => {
                self.records.insert(compensation.user_id.clone(), record);
            }
            None => {
                self.records.remove(&compensation.user_id);
            }
        }
        if compensation.lesson_bumped {
            if let Some(progress) = self.progress.get_mut(&compensation.user_id) {
                progress.lessons_completed = progress.lessons_completed.saturating_sub(1);
            }
        }
    }
}

async fn post_mark(api: &ApiClient, input: &MarkAttendanceInput) -> Result<(), ApiError> {
    api.post::<_, Value>("/api/attendance/mark", input).await?;
    Ok(())
}

fn banner_message(error: &ApiError, fallback: &str) -> String {
    match error {
        ApiError::Status { .. } | ApiError::Unauthorized { .. } => error.user_message(),
        _ => fallback.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{connect, scripted, Recorder, RecordedRequest};
    use axum::http::StatusCode;
    use serde_json::json;

    fn backend(req: &RecordedRequest) -> (StatusCode, Value) {
        match (req.method.as_str(), req.path.as_str()) {
            ("GET", "/api/users") => (
                StatusCode::OK,
                json!({ "users": [
                    { "_id": "s1", "name": "Aiko", "email": "a@x.jp", "role": "student" },
                    { "_id": "s2", "name": "Ken", "email": "k@x.jp", "role": "student" },
                    { "_id": "s3", "name": "Mei", "email": "m@x.jp", "role": "student" },
                    { "_id": "t1", "name": "Tanaka", "email": "t@x.jp", "role": "teacher" }
                ] }),
            ),
            ("GET", "/api/profiles") => (
                StatusCode::OK,
                json!({ "profiles": [
                    { "_id": "p1", "user": { "_id": "s1", "name": "Aiko", "email": "a@x.jp" },
                      "progress": { "lessonsCompleted": 10, "currentStreak": 2 } },
                    { "_id": "p2", "user": { "_id": "s2", "name": "Ken", "email": "k@x.jp" },
                      "progress": { "lessonsCompleted": 4, "currentStreak": 0 } }
                ] }),
            ),
            ("GET", "/api/attendance/today") => (
                StatusCode::OK,
                json!({ "records": [
                    { "_id": "r1", "user": { "_id": "s1", "name": "Aiko" }, "present": true, "lessonIncrement": 0 }
                ] }),
            ),
            ("POST", "/api/attendance/mark") => {
                if req.json()["userId"] == "s3" {
                    (StatusCode::BAD_REQUEST, json!({ "message": "Student is inactive" }))
                } else {
                    (StatusCode::OK, json!({ "success": true }))
                }
            }
            _ => (StatusCode::NOT_FOUND, json!({})),
        }
    }

    async fn loaded_board() -> (AttendanceBoard, Recorder) {
        let (router, recorder) = scripted(backend);
        let client = connect(router).await;
        let mut board = AttendanceBoard::new(client.api.clone());
        board.refresh().await.unwrap();
        (board, recorder)
    }

    #[tokio::test]
    async fn test_refresh_builds_rows() {
        let (board, _) = loaded_board().await;

        assert_eq!(board.student_count(), 3);
        assert_eq!(board.marked_count(), 1);

        let rows = board.students();
        assert_eq!(rows[0].user.name, "Aiko");
        assert!(rows[0].marked);
        assert_eq!(rows[0].lessons_completed, 10);
        assert_eq!(rows[0].current_streak, 2);
        assert!(!rows[2].marked);
        assert_eq!(rows[2].lessons_completed, 0);
    }

    #[tokio::test]
    async fn test_refresh_skips_records_of_deleted_accounts() {
        let (router, _) = scripted(|req| match req.path.as_str() {
            "/api/users" => (
                StatusCode::OK,
                json!([{ "_id": "s1", "name": "Aiko", "email": "a@x.jp", "role": "Student" }]),
            ),
            "/api/profiles" => (
                StatusCode::OK,
                json!([{ "_id": "p1", "user": "s1", "progress": { "lessonsCompleted": 7 } }]),
            ),
            _ => (
                StatusCode::OK,
                json!({ "records": [
                    { "user": { "_id": "s1" }, "present": true },
                    { "user": null, "present": true }
                ] }),
            ),
        });
        let client = connect(router).await;
        let mut board = AttendanceBoard::new(client.api.clone());

        board.refresh().await.unwrap();

        assert_eq!(board.error(), None);
        assert_eq!(board.student_count(), 1);
        assert_eq!(board.marked_count(), 1);
        assert!(board.is_marked("s1"));
        assert_eq!(board.students()[0].lessons_completed, 7);
    }

    #[tokio::test]
    async fn test_begin_mark_updates_count_before_confirmation() {
        let (mut board, recorder) = loaded_board().await;
        let requests_before = recorder.requests().len();

        let pending = board.begin_mark("s2", true).unwrap();

        assert_eq!(board.marked_count(), 2);
        assert!(board.is_marked("s2"));
        assert_eq!(board.students()[1].lessons_completed, 5);
        assert!(pending.state().is_pending());
        assert_eq!(recorder.requests().len(), requests_before);

        let state = board.complete(pending).await;

        assert!(state.is_confirmed());
        let sent = recorder.requests().pop().unwrap();
        assert!(sent.is("POST", "/api/attendance/mark"));
        assert_eq!(sent.json(), json!({ "userId": "s2", "present": true, "incrementLesson": true }));
    }

    #[tokio::test]
    async fn test_failed_mark_keeps_local_patch_until_compensated() {
        let (mut board, _) = loaded_board().await;

        let state = board.mark("s3", false).await.unwrap();

        assert_eq!(state.error(), Some("Student is inactive"));
        assert_eq!(board.error(), Some("Student is inactive"));
        assert!(board.is_marked("s3"));
        assert_eq!(board.marked_count(), 2);

        board.compensate(state.into_compensation().unwrap());
        assert!(!board.is_marked("s3"));
        assert_eq!(board.marked_count(), 1);

        board.dismiss_error();
        assert_eq!(board.error(), None);
    }

    #[tokio::test]
    async fn test_plain_repeat_mark_refused() {
        let (mut board, _) = loaded_board().await;

        let err = board.begin_mark("s1", false).unwrap_err();
        assert!(matches!(err, AttendanceError::AlreadyMarked(_)));

        let again = board.begin_mark("s1", true).unwrap();
        assert_eq!(board.marked_count(), 1);
        assert_eq!(board.students()[0].lessons_completed, 11);

        board.compensate(again.compensation);
        assert!(board.is_marked("s1"));
        assert_eq!(board.students()[0].lessons_completed, 10);
    }

    #[tokio::test]
    async fn test_mark_all_reports_partial_failure() {
        let (mut board, recorder) = loaded_board().await;

        let outcome = board.mark_all_unmarked(false).await;

        assert_eq!(outcome.confirmed, vec!["s2".to_string()]);
        assert_eq!(outcome.failed.len(), 1);
        assert_eq!(outcome.failed[0].user_id(), "s3");
        assert_eq!(board.error(), Some("Some marks failed"));
        assert_eq!(board.marked_count(), 3);

        let marks = recorder
            .requests()
            .into_iter()
            .filter(|r| r.is("POST", "/api/attendance/mark"))
            .count();
        assert_eq!(marks, 2);
    }

    #[tokio::test]
    async fn test_refresh_failure_sets_banner_and_keeps_view() {
        let (router, _) = scripted(|req| {
            if req.path == "/api/attendance/today" {
                (StatusCode::INTERNAL_SERVER_ERROR, json!({}))
            } else {
                (StatusCode::OK, json!({}))
            }
        });
        let client = connect(router).await;
        let mut board = AttendanceBoard::new(client.api.clone());

        let err = board.refresh().await.unwrap_err();

        assert!(matches!(err, AttendanceError::Api(_)));
        assert_eq!(board.error(), Some("Internal Server Error"));
        assert_eq!(board.student_count(), 0);
    }
}
