//! Notice board service
//!
//! Everyone can read notices; only teachers and admins can post or delete
//! them. Deletes are applied locally before the backend confirms.

use serde_json::Value;

use super::mutation::MutationState;
use crate::api::{list_from, ApiClient, ApiError};
use crate::models::{CreateNoticeInput, Notice, User};

const CREATE_FAILED: &str = "Failed to create notice";
const DELETE_FAILED: &str = "Failed to delete notice";

/// Error types for notice operations
#[derive(Debug, thiserror::Error)]
pub enum NoticeError {
    /// Invalid input
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// The current user may not manage notices
    #[error("Only teachers and admins can manage notices")]
    Forbidden,

    /// No notice with this id on the board
    #[error("Notice not found: {0}")]
    NotFound(String),

    /// Backend or transport failure
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Puts a locally deleted notice back where it was
#[derive(Debug, Clone, PartialEq)]
pub struct NoticeCompensation {
    index: usize,
    notice: Notice,
}

/// A delete applied locally and waiting to be sent
#[derive(Debug)]
#[must_use = "the delete is only local until completed"]
pub struct PendingDelete {
    compensation: NoticeCompensation,
}

impl PendingDelete {
    pub fn notice_id(&self) -> &str {
        &self.compensation.notice.id
    }
}

/// Notice board state
#[derive(Debug)]
pub struct NoticeBoard {
    api: ApiClient,
    notices: Vec<Notice>,
    error: Option<String>,
}

impl NoticeBoard {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            notices: Vec::new(),
            error: None,
        }
    }

    /// Whether `user` may post and delete notices
    pub fn can_manage(user: Option<&User>) -> bool {
        user.is_some_and(User::is_staff)
    }

    /// Notices as last loaded, newest first as the backend sends them
    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    /// Current error banner
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    /// `GET /api/notices`
    pub async fn refresh(&mut self) -> Result<&[Notice], NoticeError> {
        let body: Value = self.api.get("/api/notices").await?;
        self.notices = list_from(body, "notices")?;
        Ok(&self.notices)
    }

    /// Post a notice, then reload the board
    pub async fn create(&mut self, input: CreateNoticeInput) -> Result<(), NoticeError> {
        self.ensure_manager()?;
        if input.title.trim().is_empty() {
            return Err(NoticeError::ValidationError("Title cannot be empty".to_string()));
        }
        if input.content.trim().is_empty() {
            return Err(NoticeError::ValidationError("Content cannot be empty".to_string()));
        }

        if let Err(e) = self.api.post::<_, Value>("/api/notices", &input).await {
            self.error = Some(fallback_message(&e, CREATE_FAILED));
            return Err(e.into());
        }
        tracing::info!(title = %input.title, priority = %input.priority, "Notice created");

        self.refresh().await?;
        Ok(())
    }

    /// Remove a notice locally and return the request that confirms it
    pub fn begin_delete(&mut self, id: &str) -> Result<PendingDelete, NoticeError> {
        self.ensure_manager()?;
        let index = self
            .notices
            .iter()
            .position(|n| n.id == id)
            .ok_or_else(|| NoticeError::NotFound(id.to_string()))?;
        let notice = self.notices.remove(index);

        Ok(PendingDelete {
            compensation: NoticeCompensation { index, notice },
        })
    }

    /// `DELETE /api/notices/:id`. A rejection sets the banner; the notice
    /// stays removed until the caller restores it.
    pub async fn complete_delete(
        &mut self,
        pending: PendingDelete,
    ) -> MutationState<NoticeCompensation> {
        let path = format!("/api/notices/{}", urlencoding::encode(pending.notice_id()));
        match self.api.delete(&path).await {
            Ok(()) => MutationState::Confirmed,
            Err(e) => {
                let error = fallback_message(&e, DELETE_FAILED);
                tracing::warn!(notice_id = %pending.notice_id(), error = %e, "Notice delete rejected");
                self.error = Some(error.clone());
                MutationState::Failed {
                    error,
                    compensation: pending.compensation,
                }
            }
        }
    }

    /// [`begin_delete`](Self::begin_delete) followed by
    /// [`complete_delete`](Self::complete_delete)
    pub async fn delete(&mut self, id: &str) -> Result<MutationState<NoticeCompensation>, NoticeError> {
        let pending = self.begin_delete(id)?;
        Ok(self.complete_delete(pending).await)
    }

    /// Put a notice back after a rejected delete
    pub fn restore(&mut self, compensation: NoticeCompensation) {
        let index = compensation.index.min(self.notices.len());
        self.notices.insert(index, compensation.notice);
    }

    fn ensure_manager(&self) -> Result<(), NoticeError> {
        let state = self.api.session().state();
        if Self::can_manage(state.user()) {
            Ok(())
        } else {
            Err(NoticeError::Forbidden)
        }
    }
}

fn fallback_message(error: &ApiError, fallback: &str) -> String {
    match error {
        ApiError::Status { .. } => error.user_message(),
        _ => fallback.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NoticePriority, UserRole};
    use crate::session::SessionState;
    use crate::test_support::{connect, scripted, RecordedRequest, TestClient};
    use axum::http::StatusCode;
    use serde_json::json;

    fn backend(req: &RecordedRequest) -> (StatusCode, Value) {
        match (req.method.as_str(), req.path.as_str()) {
            ("GET", "/api/notices") => (
                StatusCode::OK,
                json!({ "notices": [
                    { "_id": "n1", "title": "休講", "content": "No class", "priority": "high" },
                    { "_id": "n2", "title": "宿題", "content": "Lesson 5", "author": { "name": "Tanaka" } }
                ] }),
            ),
            ("POST", "/api/notices") => (StatusCode::CREATED, json!({ "success": true })),
            ("DELETE", "/api/notices/n1") => (StatusCode::OK, json!({ "success": true })),
            ("DELETE", _) => (StatusCode::FORBIDDEN, json!({ "message": "Not your notice" })),
            _ => (StatusCode::NOT_FOUND, json!({})),
        }
    }

    fn sign_in(client: &TestClient, role: UserRole) {
        client
            .session
            .set_state(SessionState::Authenticated(User::new("u1", "Tanaka", "t@x.jp", role)));
    }

    #[tokio::test]
    async fn test_refresh_loads_notices() {
        let (router, _) = scripted(backend);
        let client = connect(router).await;
        let mut board = NoticeBoard::new(client.api.clone());

        let notices = board.refresh().await.unwrap();

        assert_eq!(notices.len(), 2);
        assert_eq!(notices[0].priority, NoticePriority::High);
        assert_eq!(notices[1].author_name(), "Tanaka");
    }

    #[tokio::test]
    async fn test_create_validates_then_posts_and_reloads() {
        let (router, recorder) = scripted(backend);
        let client = connect(router).await;
        sign_in(&client, UserRole::Teacher);
        let mut board = NoticeBoard::new(client.api.clone());

        let err = board.create(CreateNoticeInput::new("  ", "body")).await.unwrap_err();
        assert!(matches!(err, NoticeError::ValidationError(_)));
        assert!(recorder.requests().is_empty());

        board.create(CreateNoticeInput::new("テスト", "明日は休みです")).await.unwrap();

        let seen = recorder.requests();
        assert!(seen[0].is("POST", "/api/notices"));
        assert_eq!(
            seen[0].json(),
            json!({ "title": "テスト", "content": "明日は休みです", "priority": "medium" })
        );
        assert!(seen[1].is("GET", "/api/notices"));
        assert_eq!(board.notices().len(), 2);
    }

    #[tokio::test]
    async fn test_students_cannot_manage() {
        let (router, recorder) = scripted(backend);
        let client = connect(router).await;
        sign_in(&client, UserRole::Student);
        let mut board = NoticeBoard::new(client.api.clone());
        board.refresh().await.unwrap();

        let err = board.create(CreateNoticeInput::new("t", "c")).await.unwrap_err();
        assert!(matches!(err, NoticeError::Forbidden));
        assert!(matches!(board.begin_delete("n1"), Err(NoticeError::Forbidden)));
        assert_eq!(recorder.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_removes_locally_first() {
        let (router, recorder) = scripted(backend);
        let client = connect(router).await;
        sign_in(&client, UserRole::Admin);
        let mut board = NoticeBoard::new(client.api.clone());
        board.refresh().await.unwrap();

        let pending = board.begin_delete("n1").unwrap();
        assert_eq!(board.notices().len(), 1);
        assert_eq!(recorder.requests().len(), 1);

        let state = board.complete_delete(pending).await;

        assert!(state.is_confirmed());
        assert!(recorder.requests()[1].is("DELETE", "/api/notices/n1"));
    }

    #[tokio::test]
    async fn test_rejected_delete_can_be_restored() {
        let (router, _) = scripted(backend);
        let client = connect(router).await;
        sign_in(&client, UserRole::Teacher);
        let mut board = NoticeBoard::new(client.api.clone());
        board.refresh().await.unwrap();

        let state = board.delete("n2").await.unwrap();

        assert_eq!(state.error(), Some("Not your notice"));
        assert_eq!(board.error(), Some("Not your notice"));
        assert_eq!(board.notices().len(), 1);

        board.restore(state.into_compensation().unwrap());
        let ids: Vec<_> = board.notices().iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["n1", "n2"]);
    }

    #[tokio::test]
    async fn test_delete_unknown_notice() {
        let (router, _) = scripted(backend);
        let client = connect(router).await;
        sign_in(&client, UserRole::Admin);
        let mut board = NoticeBoard::new(client.api.clone());

        assert!(matches!(board.delete("missing").await, Err(NoticeError::NotFound(_))));
    }

    #[test]
    fn test_can_manage() {
        let teacher = User::new("1", "T", "t@x.jp", UserRole::Teacher);
        let student = User::new("2", "S", "s@x.jp", UserRole::Student);

        assert!(NoticeBoard::can_manage(Some(&teacher)));
        assert!(!NoticeBoard::can_manage(Some(&student)));
        assert!(!NoticeBoard::can_manage(None));
    }
}
