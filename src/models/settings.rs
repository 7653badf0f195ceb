//! Class settings model
//!
//! The backend contract for this resource is loose: field names vary between
//! deployments, so responses are normalized onto one canonical shape instead
//! of being deserialized strictly.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Textbook assumed when the backend does not name one
pub const DEFAULT_BOOK_NAME: &str = "みんなの日本語";

/// Alias keys for the current textbook, in priority order
const BOOK_KEYS: [&str; 4] = ["currentBookNameJa", "currentBookNameJP", "bookNameJa", "book"];

/// Alias keys for the current lesson, in priority order
const LESSON_KEYS: [&str; 2] = ["currentLesson", "lesson"];

/// Class-wide settings: which textbook and lesson the class is on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassSettings {
    /// Backend identifier, when the resource has one
    pub id: Option<String>,
    /// Current textbook (Japanese title)
    pub current_book_name_ja: String,
    /// Current lesson number
    pub current_lesson: u32,
}

impl Default for ClassSettings {
    fn default() -> Self {
        Self {
            id: None,
            current_book_name_ja: DEFAULT_BOOK_NAME.to_string(),
            current_lesson: 0,
        }
    }
}

impl ClassSettings {
    /// Create settings for the given book and lesson
    pub fn new(book: impl Into<String>, lesson: u32) -> Self {
        Self {
            id: None,
            current_book_name_ja: book.into(),
            current_lesson: lesson,
        }
    }

    /// Map whatever shape the backend returned onto the canonical one.
    ///
    /// A `{ "settings": { ... } }` envelope is unwrapped first. Missing,
    /// empty or mistyped fields fall back to the defaults.
    pub fn normalize(value: &Value) -> Self {
        Self::normalize_onto(value, &Self::default())
    }

    /// Like [`ClassSettings::normalize`], but fields the body does not carry
    /// are taken from `fallback`. Used for write responses, which may echo
    /// only part of the resource or nothing at all.
    pub fn normalize_onto(value: &Value, fallback: &ClassSettings) -> Self {
        let body = match value.get("settings") {
            Some(inner) if inner.is_object() => inner,
            _ => value,
        };

        let id = ["_id", "id"]
            .iter()
            .find_map(|key| match body.get(*key) {
                Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
                Some(Value::Number(n)) => Some(n.to_string()),
                _ => None,
            })
            .or_else(|| fallback.id.clone());

        let current_book_name_ja = BOOK_KEYS
            .iter()
            .find_map(|key| {
                body.get(*key)
                    .and_then(Value::as_str)
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| fallback.current_book_name_ja.clone());

        let current_lesson = LESSON_KEYS
            .iter()
            .find_map(|key| body.get(*key).and_then(lesson_number).filter(|n| *n > 0))
            .unwrap_or(fallback.current_lesson);

        Self {
            id,
            current_book_name_ja,
            current_lesson,
        }
    }
}

fn lesson_number(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
