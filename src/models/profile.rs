//! Learner profile model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::common::WireId;
use super::User;

/// Lessons in the full course, used for course-progress percentages
pub const COURSE_LESSON_TARGET: u32 = 100;

/// Learner profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ProfileRecord")]
pub struct Profile {
    pub id: String,
    /// Owning user's id, whether or not the document was populated
    #[serde(rename = "userId", skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
    /// Populated owner; absent if the backend sent only an id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    pub bio: String,
    #[serde(rename = "japaneseLevel")]
    pub japanese_level: JapaneseLevel,
    #[serde(rename = "socialLinks")]
    pub social_links: SocialLinks,
    pub progress: Progress,
}

#[derive(Deserialize)]
struct ProfileRecord {
    #[serde(flatten)]
    ids: WireId,
    #[serde(default)]
    user: Option<ProfileOwner>,
    #[serde(default)]
    bio: Option<String>,
    #[serde(rename = "japaneseLevel", default)]
    japanese_level: Option<JapaneseLevel>,
    #[serde(rename = "socialLinks", default)]
    social_links: Option<SocialLinks>,
    #[serde(default)]
    progress: Option<Progress>,
}

/// `user` is either populated or a bare id
#[derive(Deserialize)]
#[serde(untagged)]
enum ProfileOwner {
    Id(String),
    Document(User),
}

impl From<ProfileRecord> for Profile {
    fn from(record: ProfileRecord) -> Self {
        let (owner_id, user) = match record.user {
            Some(ProfileOwner::Id(id)) => (Some(id), None),
            Some(ProfileOwner::Document(user)) => (Some(user.id.clone()), Some(user)),
            None => (None, None),
        };
        Self {
            id: record.ids.resolve(),
            owner_id: owner_id.filter(|id| !id.is_empty()),
            user,
            bio: record.bio.unwrap_or_default(),
            japanese_level: record.japanese_level.unwrap_or_default(),
            social_links: record.social_links.unwrap_or_default(),
            progress: record.progress.unwrap_or_default(),
        }
    }
}

impl Profile {
    /// Id of the owning user, if known
    pub fn user_id(&self) -> Option<&str> {
        self.owner_id.as_deref()
    }

    /// Lessons completed so far
    pub fn lessons_completed(&self) -> u32 {
        self.progress.lessons_completed
    }

    /// Naive performance score on a 0.00–4.00 scale: 25 lessons per point
    pub fn performance_score(&self) -> f64 {
        (f64::from(self.progress.lessons_completed) / 25.0).min(4.0)
    }

    /// Course progress against the full course, 0–100
    pub fn course_percent(&self) -> u32 {
        let pct = (f64::from(self.progress.lessons_completed) / f64::from(COURSE_LESSON_TARGET)
            * 100.0)
            .round();
        (pct as u32).min(100)
    }

    /// Placeholder attendance percentage derived from the streak, 50–100
    pub fn attendance_score(&self) -> u32 {
        self.progress.current_streak.saturating_add(60).clamp(50, 100)
    }

    /// Form values for editing this profile
    pub fn to_update_input(&self) -> UpdateProfileInput {
        UpdateProfileInput {
            bio: self.bio.clone(),
            japanese_level: self.japanese_level,
            social_links: self.social_links.clone(),
        }
    }
}

/// Learning progress counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    #[serde(default)]
    pub lessons_completed: u32,
    #[serde(default)]
    pub current_streak: u32,
}

/// Social profile links; empty strings mean "not set"
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialLinks {
    #[serde(default)]
    pub facebook: String,
    #[serde(default)]
    pub whatsapp: String,
    #[serde(default)]
    pub instagram: String,
    #[serde(default)]
    pub twitter: String,
}

/// Self-reported Japanese level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JapaneseLevel {
    #[default]
    Beginner,
    Elementary,
    Intermediate,
    Advanced,
}

impl fmt::Display for JapaneseLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JapaneseLevel::Beginner => write!(f, "beginner"),
            JapaneseLevel::Elementary => write!(f, "elementary"),
            JapaneseLevel::Intermediate => write!(f, "intermediate"),
            JapaneseLevel::Advanced => write!(f, "advanced"),
        }
    }
}

impl FromStr for JapaneseLevel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "beginner" => Ok(JapaneseLevel::Beginner),
            "elementary" => Ok(JapaneseLevel::Elementary),
            "intermediate" => Ok(JapaneseLevel::Intermediate),
            "advanced" => Ok(JapaneseLevel::Advanced),
            _ => Err(anyhow::anyhow!("Invalid Japanese level: {}", s)),
        }
    }
}

/// Body of `PUT /api/profiles` (own profile)
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileInput {
    pub bio: String,
    pub japanese_level: JapaneseLevel,
    pub social_links: SocialLinks,
}

/// Body of `PUT /api/profiles/:id/admin`; only set fields are sent
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub japanese_level: Option<JapaneseLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<Progress>,
}
