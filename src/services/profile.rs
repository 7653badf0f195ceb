//! Profile service
//!
//! Reads and edits learner profiles, uploads avatars and ranks learners by
//! progress.

use reqwest::multipart::{Form, Part};
use serde_json::{json, Value};

use crate::api::{item_from, list_from, ApiClient, ApiError};
use crate::models::{AdminProfileUpdate, JapaneseLevel, Profile, UpdateProfileInput};

/// Error types for profile operations
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    /// Invalid input
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Backend or transport failure
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Where a new avatar comes from
#[derive(Debug, Clone)]
pub enum AvatarSource {
    /// Image uploaded as the multipart `avatar` part
    File {
        file_name: String,
        bytes: Vec<u8>,
        /// MIME type, e.g. `image/png`
        content_type: Option<String>,
    },
    /// Image already hosted elsewhere
    Url(String),
}

/// A learner's position in the progress ranking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rank {
    /// 1-based
    pub rank: usize,
    pub total: usize,
}

/// Profile service
#[derive(Debug, Clone)]
pub struct ProfileService {
    api: ApiClient,
}

impl ProfileService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// `GET /api/profiles/me`
    pub async fn me(&self) -> Result<Profile, ProfileError> {
        let body: Value = self.api.get("/api/profiles/me").await?;
        Ok(item_from(body, "profile")?)
    }

    /// `PUT /api/profiles`, then reload the profile
    pub async fn update_me(&self, input: &UpdateProfileInput) -> Result<Profile, ProfileError> {
        self.api.put::<_, Value>("/api/profiles", input).await?;
        self.me().await
    }

    /// `GET /api/profiles`, optionally narrowed to one level
    pub async fn list(&self, level: Option<JapaneseLevel>) -> Result<Vec<Profile>, ProfileError> {
        let body: Value = self.api.get("/api/profiles").await?;
        let profiles: Vec<Profile> = list_from(body, "profiles")?;
        Ok(match level {
            Some(level) => profiles
                .into_iter()
                .filter(|p| p.japanese_level == level)
                .collect(),
            None => profiles,
        })
    }

    /// `GET /api/profiles/user/:id`
    pub async fn by_user(&self, user_id: &str) -> Result<Profile, ProfileError> {
        let path = format!("/api/profiles/user/{}", encode_id(user_id)?);
        let body: Value = self.api.get(&path).await?;
        Ok(item_from(body, "profile")?)
    }

    /// `PUT /api/profiles/:id/admin`
    pub async fn admin_update(
        &self,
        profile_id: &str,
        update: &AdminProfileUpdate,
    ) -> Result<(), ProfileError> {
        let path = format!("/api/profiles/{}/admin", encode_id(profile_id)?);
        self.api.put::<_, Value>(&path, update).await?;
        tracing::info!(profile_id, "Profile updated by staff");
        Ok(())
    }

    /// `POST /api/users/:id/avatar`.
    ///
    /// Returns the new avatar URL when the backend reports one. The session
    /// identity still carries the old avatar; refresh it afterwards.
    pub async fn upload_avatar(
        &self,
        user_id: &str,
        source: AvatarSource,
    ) -> Result<Option<String>, ProfileError> {
        let path = format!("/api/users/{}/avatar", encode_id(user_id)?);

        let body: Value = match source {
            AvatarSource::File {
                file_name,
                bytes,
                content_type,
            } => {
                if bytes.is_empty() {
                    return Err(ProfileError::ValidationError("Avatar file is empty".to_string()));
                }
                let mut part = Part::bytes(bytes).file_name(file_name);
                if let Some(mime) = content_type {
                    part = part.mime_str(&mime).map_err(ApiError::Transport)?;
                }
                self.api.upload(&path, Form::new().part("avatar", part)).await?
            }
            AvatarSource::Url(url) => {
                let url = url.trim();
                if url.is_empty() {
                    return Err(ProfileError::ValidationError(
                        "Choose a file or enter a URL".to_string(),
                    ));
                }
                self.api.post(&path, &json!({ "url": url })).await?
            }
        };

        Ok(avatar_url(&body))
    }
}

/// Rank `user_id` among `profiles` by lessons completed, most first.
/// Ties keep backend order.
pub fn rank_by_lessons(profiles: &[Profile], user_id: &str) -> Option<Rank> {
    let mut ranked: Vec<&Profile> = profiles.iter().collect();
    ranked.sort_by(|a, b| b.lessons_completed().cmp(&a.lessons_completed()));
    ranked
        .iter()
        .position(|p| p.user_id() == Some(user_id))
        .map(|index| Rank {
            rank: index + 1,
            total: ranked.len(),
        })
}

fn avatar_url(body: &Value) -> Option<String> {
    let from = |v: &Value| {
        v.get("avatar")
            .or_else(|| v.get("url"))
            .and_then(Value::as_str)
            .map(str::to_string)
    };
    body.get("user").and_then(from).or_else(|| from(body))
}

fn encode_id(id: &str) -> Result<String, ProfileError> {
    let id = id.trim();
    if id.is_empty() {
        return Err(ProfileError::ValidationError("Id cannot be empty".to_string()));
    }
    Ok(urlencoding::encode(id).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Progress, SocialLinks};
    use crate::test_support::{connect, scripted, RecordedRequest};
    use axum::http::StatusCode;

    fn profile_json(id: &str, user_id: &str, level: &str, lessons: u32) -> Value {
        json!({
            "_id": id,
            "user": { "_id": user_id, "name": user_id, "email": format!("{}@x.jp", user_id) },
            "japaneseLevel": level,
            "progress": { "lessonsCompleted": lessons, "currentStreak": 1 }
        })
    }

    fn backend(req: &RecordedRequest) -> (StatusCode, Value) {
        match (req.method.as_str(), req.path.as_str()) {
            ("GET", "/api/profiles") => (
                StatusCode::OK,
                json!({ "profiles": [
                    profile_json("p1", "u1", "beginner", 12),
                    profile_json("p2", "u2", "advanced", 40),
                    profile_json("p3", "u3", "beginner", 25)
                ] }),
            ),
            ("GET", "/api/profiles/me") => (StatusCode::OK, json!({ "profile": profile_json("p1", "u1", "elementary", 13) })),
            ("GET", "/api/profiles/user/u2") => (StatusCode::OK, profile_json("p2", "u2", "advanced", 40)),
            ("PUT", _) => (StatusCode::OK, json!({ "success": true })),
            ("POST", "/api/users/u1/avatar") => {
                (StatusCode::OK, json!({ "user": { "_id": "u1", "avatar": "/uploads/u1.png" } }))
            }
            _ => (StatusCode::NOT_FOUND, json!({})),
        }
    }

    #[tokio::test]
    async fn test_list_with_level_filter() {
        let (router, _) = scripted(backend);
        let client = connect(router).await;
        let service = ProfileService::new(client.api.clone());

        assert_eq!(service.list(None).await.unwrap().len(), 3);
        let beginners = service.list(Some(JapaneseLevel::Beginner)).await.unwrap();
        let ids: Vec<_> = beginners.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["p1", "p3"]);
    }

    #[tokio::test]
    async fn test_me_and_by_user_accept_both_envelopes() {
        let (router, _) = scripted(backend);
        let client = connect(router).await;
        let service = ProfileService::new(client.api.clone());

        assert_eq!(service.me().await.unwrap().lessons_completed(), 13);
        assert_eq!(service.by_user("u2").await.unwrap().id, "p2");
    }

    #[tokio::test]
    async fn test_update_me_puts_form_then_reloads() {
        let (router, recorder) = scripted(backend);
        let client = connect(router).await;
        let service = ProfileService::new(client.api.clone());
        let input = UpdateProfileInput {
            bio: "よろしくお願いします".to_string(),
            japanese_level: JapaneseLevel::Elementary,
            social_links: SocialLinks {
                twitter: "@aiko".to_string(),
                ..SocialLinks::default()
            },
        };

        let profile = service.update_me(&input).await.unwrap();

        assert_eq!(profile.japanese_level, JapaneseLevel::Elementary);
        let seen = recorder.requests();
        assert!(seen[0].is("PUT", "/api/profiles"));
        assert_eq!(seen[0].json()["japaneseLevel"], "elementary");
        assert_eq!(seen[0].json()["socialLinks"]["twitter"], "@aiko");
        assert!(seen[1].is("GET", "/api/profiles/me"));
    }

    #[tokio::test]
    async fn test_admin_update() {
        let (router, recorder) = scripted(backend);
        let client = connect(router).await;
        let update = AdminProfileUpdate {
            progress: Some(Progress {
                lessons_completed: 30,
                current_streak: 2,
            }),
            ..AdminProfileUpdate::default()
        };

        ProfileService::new(client.api.clone())
            .admin_update("p2", &update)
            .await
            .unwrap();

        let seen = recorder.requests();
        assert!(seen[0].is("PUT", "/api/profiles/p2/admin"));
        assert_eq!(
            seen[0].json(),
            json!({ "progress": { "lessonsCompleted": 30, "currentStreak": 2 } })
        );
    }

    #[tokio::test]
    async fn test_avatar_file_is_multipart() {
        let (router, recorder) = scripted(backend);
        let client = connect(router).await;
        let source = AvatarSource::File {
            file_name: "me.png".to_string(),
            bytes: vec![0x89, b'P', b'N', b'G'],
            content_type: Some("image/png".to_string()),
        };

        let url = ProfileService::new(client.api.clone())
            .upload_avatar("u1", source)
            .await
            .unwrap();

        assert_eq!(url.as_deref(), Some("/uploads/u1.png"));
        let seen = recorder.requests();
        let content_type = seen[0].header("content-type").unwrap();
        assert!(content_type.starts_with("multipart/form-data; boundary="));
        let raw = String::from_utf8_lossy(&seen[0].body);
        assert!(raw.contains("name=\"avatar\""));
        assert!(raw.contains("filename=\"me.png\""));
    }

    #[tokio::test]
    async fn test_avatar_url_is_json() {
        let (router, recorder) = scripted(backend);
        let client = connect(router).await;
        let service = ProfileService::new(client.api.clone());

        let err = service
            .upload_avatar("u1", AvatarSource::Url("  ".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, ProfileError::ValidationError(_)));

        service
            .upload_avatar("u1", AvatarSource::Url("https://cdn.example.jp/a.jpg".to_string()))
            .await
            .unwrap();

        let seen = recorder.requests();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].header("content-type").as_deref(), Some("application/json"));
        assert_eq!(seen[0].json(), json!({ "url": "https://cdn.example.jp/a.jpg" }));
    }

    #[test]
    fn test_rank_by_lessons() {
        let profiles: Vec<Profile> = vec![
            serde_json::from_value(profile_json("p1", "u1", "beginner", 12)).unwrap(),
            serde_json::from_value(profile_json("p2", "u2", "advanced", 40)).unwrap(),
            serde_json::from_value(profile_json("p3", "u3", "beginner", 25)).unwrap(),
        ];

        assert_eq!(rank_by_lessons(&profiles, "u2"), Some(Rank { rank: 1, total: 3 }));
        assert_eq!(rank_by_lessons(&profiles, "u1"), Some(Rank { rank: 3, total: 3 }));
        assert_eq!(rank_by_lessons(&profiles, "nobody"), None);
    }
}
