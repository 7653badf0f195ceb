//! Rating service

use serde_json::Value;

use crate::api::{item_from, list_from, ApiClient, ApiError};
use crate::models::{CreateRatingInput, Rating};

/// Valid scores
pub const SCORE_RANGE: std::ops::RangeInclusive<u8> = 1..=5;

/// Error types for rating operations
#[derive(Debug, thiserror::Error)]
pub enum RatingError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error(transparent)]
    Api(#[from] ApiError),
}

#[derive(Debug, Clone)]
pub struct RatingService {
    api: ApiClient,
}

impl RatingService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// `GET /api/ratings/user/:id`
    pub async fn for_user(&self, user_id: &str) -> Result<Vec<Rating>, RatingError> {
        let path = format!("/api/ratings/user/{}", urlencoding::encode(user_id.trim()));
        let body: Value = self.api.get(&path).await?;
        Ok(list_from(body, "ratings")?)
    }

    /// `POST /api/ratings`
    pub async fn rate(&self, input: &CreateRatingInput) -> Result<Rating, RatingError> {
        if input.user_id.trim().is_empty() {
            return Err(RatingError::ValidationError("User id cannot be empty".to_string()));
        }
        if !SCORE_RANGE.contains(&input.score) {
            return Err(RatingError::ValidationError(format!(
                "Score must be between {} and {}",
                SCORE_RANGE.start(),
                SCORE_RANGE.end()
            )));
        }

        let body: Value = self.api.post("/api/ratings", input).await?;
        Ok(item_from(body, "rating")?)
    }
}

/// Mean score, or `None` for no ratings
pub fn average_score(ratings: &[Rating]) -> Option<f64> {
    if ratings.is_empty() {
        return None;
    }
    let sum: u32 = ratings.iter().map(|r| u32::from(r.score)).sum();
    Some(f64::from(sum) / ratings.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{connect, scripted};
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_for_user() {
        let (router, recorder) = scripted(|_| {
            (StatusCode::OK, json!({ "ratings": [
                { "_id": "r1", "user": { "_id": "u1", "name": "Aiko" }, "score": 5 },
                { "_id": "r2", "user": "u1", "score": 2, "comment": "Practice kanji" }
            ] }))
        });
        let client = connect(router).await;

        let ratings = RatingService::new(client.api.clone()).for_user("u1").await.unwrap();

        assert_eq!(ratings.len(), 2);
        assert!(ratings
            .iter()
            .all(|r| r.user.as_ref().map(|u| u.id.as_str()) == Some("u1")));
        assert_eq!(average_score(&ratings), Some(3.5));
        assert!(recorder.requests()[0].is("GET", "/api/ratings/user/u1"));
    }

    #[tokio::test]
    async fn test_rate_validates_score() {
        let (router, recorder) = scripted(|_| {
            (StatusCode::CREATED, json!({ "rating": { "_id": "r3", "score": 4 } }))
        });
        let client = connect(router).await;
        let service = RatingService::new(client.api.clone());

        let bad = CreateRatingInput { user_id: "u1".to_string(), score: 6, comment: None };
        assert!(matches!(service.rate(&bad).await, Err(RatingError::ValidationError(_))));
        assert!(recorder.requests().is_empty());

        let good = CreateRatingInput {
            user_id: "u1".to_string(),
            score: 4,
            comment: Some("よくできました".to_string()),
        };
        let rating = service.rate(&good).await.unwrap();

        assert_eq!(rating.id, "r3");
        assert_eq!(
            recorder.requests()[0].json(),
            json!({ "userId": "u1", "score": 4, "comment": "よくできました" })
        );
    }

    #[test]
    fn test_average_of_nothing() {
        assert_eq!(average_score(&[]), None);
    }
}
