//! Rating model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::common::{UserRef, WireId};

/// A score given to a learner by a teacher
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RatingRecord")]
pub struct Rating {
    pub id: String,
    /// The rated learner
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserRef>,
    /// 1–5
    pub score: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(rename = "createdAt", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct RatingRecord {
    #[serde(flatten)]
    ids: WireId,
    #[serde(default)]
    user: Option<UserRef>,
    #[serde(default)]
    score: u8,
    #[serde(default)]
    comment: Option<String>,
    #[serde(rename = "createdAt", default)]
    created_at: Option<DateTime<Utc>>,
}

impl From<RatingRecord> for Rating {
    fn from(record: RatingRecord) -> Self {
        Self {
            id: record.ids.resolve(),
            user: record.user.filter(|u| !u.id.is_empty()),
            score: record.score,
            comment: record.comment.filter(|c| !c.trim().is_empty()),
            created_at: record.created_at,
        }
    }
}

/// Body of `POST /api/ratings`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRatingInput {
    pub user_id: String,
    pub score: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}
