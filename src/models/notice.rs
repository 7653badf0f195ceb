//! Notice model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::common::WireId;

/// A notice-board post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "NoticeRecord")]
pub struct Notice {
    pub id: String,
    pub title: String,
    pub content: String,
    pub priority: NoticePriority,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<NoticeAuthor>,
    #[serde(rename = "createdAt", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
}

#[derive(Deserialize)]
struct NoticeRecord {
    #[serde(flatten)]
    ids: WireId,
    #[serde(default)]
    title: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    priority: NoticePriority,
    #[serde(default)]
    author: Option<NoticeAuthor>,
    #[serde(rename = "createdAt", default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    attachments: Vec<Attachment>,
}

impl From<NoticeRecord> for Notice {
    fn from(record: NoticeRecord) -> Self {
        Self {
            id: record.ids.resolve(),
            title: record.title,
            content: record.content,
            priority: record.priority,
            author: record.author,
            created_at: record.created_at,
            attachments: record.attachments,
        }
    }
}

impl Notice {
    /// Author name, or "Unknown" when the author was not populated
    pub fn author_name(&self) -> &str {
        self.author
            .as_ref()
            .map(|a| a.name.as_str())
            .filter(|name| !name.is_empty())
            .unwrap_or("Unknown")
    }
}

/// Populated author of a notice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoticeAuthor {
    #[serde(default)]
    pub name: String,
}

/// File or link attached to a notice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,
    pub url: String,
}

/// Notice priority
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticePriority {
    Low,
    #[default]
    Medium,
    High,
}

impl fmt::Display for NoticePriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoticePriority::Low => write!(f, "low"),
            NoticePriority::Medium => write!(f, "medium"),
            NoticePriority::High => write!(f, "high"),
        }
    }
}

impl FromStr for NoticePriority {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(NoticePriority::Low),
            "medium" => Ok(NoticePriority::Medium),
            "high" => Ok(NoticePriority::High),
            _ => Err(anyhow::anyhow!("Invalid notice priority: {}", s)),
        }
    }
}

/// Body of `POST /api/notices`
#[derive(Debug, Clone, Serialize)]
pub struct CreateNoticeInput {
    pub title: String,
    pub content: String,
    pub priority: NoticePriority,
}

impl CreateNoticeInput {
    /// A medium-priority notice
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            priority: NoticePriority::default(),
        }
    }

    /// Override the priority
    pub fn with_priority(mut self, priority: NoticePriority) -> Self {
        self.priority = priority;
        self
    }
}
