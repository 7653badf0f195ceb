//! Class settings service
//!
//! The settings resource has no fixed contract: deployments differ in path,
//! write method and field names. Reads try each candidate path in order and
//! soft-fail. Writes walk an ordered list of [`ProbeStrategy`] values
//! (path, then method, then body shape) until one is accepted, keeping a
//! trail of every rejected attempt.

use reqwest::Method;
use serde_json::{json, Value};
use std::fmt;

use crate::api::{ApiClient, ApiError, RequestBody};
use crate::config::SettingsConfig;
use crate::models::ClassSettings;

/// Field-naming variant of a settings write body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BodyShape {
    /// `currentBookNameJa` / `currentLesson`
    Canonical,
    /// `currentBookNameJP` / `currentLesson`
    JpSuffix,
    /// `bookNameJa` / `lesson`
    Short,
    /// `book` / `lesson`
    Minimal,
}

impl BodyShape {
    /// Every shape, in the order they are tried
    pub const ALL: [BodyShape; 4] = [
        BodyShape::Canonical,
        BodyShape::JpSuffix,
        BodyShape::Short,
        BodyShape::Minimal,
    ];

    fn keys(self) -> (&'static str, &'static str) {
        match self {
            BodyShape::Canonical => ("currentBookNameJa", "currentLesson"),
            BodyShape::JpSuffix => ("currentBookNameJP", "currentLesson"),
            BodyShape::Short => ("bookNameJa", "lesson"),
            BodyShape::Minimal => ("book", "lesson"),
        }
    }

    /// Encode `settings` in this shape
    pub fn body(self, settings: &ClassSettings) -> Value {
        let (book_key, lesson_key) = self.keys();
        json!({
            book_key: settings.current_book_name_ja,
            lesson_key: settings.current_lesson,
        })
    }
}

impl fmt::Display for BodyShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (book_key, lesson_key) = self.keys();
        write!(f, "{}/{}", book_key, lesson_key)
    }
}

/// One way of writing the settings resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeStrategy {
    pub method: Method,
    pub url: String,
    pub shape: BodyShape,
}

impl fmt::Display for ProbeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} [{}]", self.method, self.url, self.shape)
    }
}

/// A rejected write attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeAttempt {
    pub strategy: ProbeStrategy,
    /// Response status; `None` when the request never got an answer
    pub status: Option<u16>,
    pub message: String,
}

impl fmt::Display for ProbeAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "{} -> {}", self.strategy, status),
            None => write!(f, "{} -> {}", self.strategy, self.message),
        }
    }
}

/// Result of a successful write
#[derive(Debug, Clone)]
pub struct WriteOutcome {
    /// Settings as the backend now has them
    pub settings: ClassSettings,
    /// The strategy that was accepted
    pub accepted: ProbeStrategy,
    /// Attempts rejected before it, in the order they were made
    pub failed_attempts: Vec<ProbeAttempt>,
}

/// Error types for settings operations
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// Input rejected before any network call
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Every strategy was rejected
    #[error("No settings endpoint accepted the update ({} attempts)", .attempts.len())]
    Exhausted { attempts: Vec<ProbeAttempt> },

    /// The session ended mid-probe; the remaining strategies were skipped
    #[error("Settings update aborted: {source}")]
    Aborted {
        source: ApiError,
        attempts: Vec<ProbeAttempt>,
    },
}

impl SettingsError {
    /// Attempts made before the error, for diagnostics
    pub fn attempts(&self) -> &[ProbeAttempt] {
        match self {
            SettingsError::ValidationError(_) => &[],
            SettingsError::Exhausted { attempts } | SettingsError::Aborted { attempts, .. } => {
                attempts
            }
        }
    }
}

/// Class settings service
#[derive(Debug, Clone)]
pub struct SettingsService {
    api: ApiClient,
    candidate_urls: Vec<String>,
    methods: Vec<Method>,
    current: ClassSettings,
}

impl SettingsService {
    /// Create a service probing the configured candidates
    ///
    /// Methods that are not valid HTTP tokens are skipped with a warning.
    pub fn new(api: ApiClient, config: &SettingsConfig) -> Self {
        let methods = config
            .methods
            .iter()
            .filter_map(|m| match Method::from_bytes(m.trim().to_uppercase().as_bytes()) {
                Ok(method) => Some(method),
                Err(_) => {
                    tracing::warn!(method = %m, "Ignoring invalid settings write method");
                    None
                }
            })
            .collect();

        Self {
            api,
            candidate_urls: config.candidate_urls.clone(),
            methods,
            current: ClassSettings::default(),
        }
    }

    /// Last known settings (defaults until a read or write succeeds)
    pub fn current(&self) -> &ClassSettings {
        &self.current
    }

    /// Write strategies in the order they are tried
    pub fn write_strategies(&self) -> Vec<ProbeStrategy> {
        let mut strategies =
            Vec::with_capacity(self.candidate_urls.len() * self.methods.len() * BodyShape::ALL.len());
        for url in &self.candidate_urls {
            for method in &self.methods {
                for shape in BodyShape::ALL {
                    strategies.push(ProbeStrategy {
                        method: method.clone(),
                        url: url.clone(),
                        shape,
                    });
                }
            }
        }
        strategies
    }

    /// Try each candidate path with `GET`; the first 2xx wins.
    ///
    /// Returns the path that answered and the normalized value, or `None`
    /// when every candidate failed. Failures are logged, never returned.
    pub async fn fetch(&self) -> Option<(String, ClassSettings)> {
        for url in &self.candidate_urls {
            match self.api.get::<Value>(url).await {
                Ok(body) => {
                    tracing::debug!(url = %url, "Settings read succeeded");
                    return Some((url.clone(), ClassSettings::normalize(&body)));
                }
                Err(e) if e.is_unauthorized() => {
                    tracing::warn!(url = %url, "Settings read stopped: session ended");
                    return None;
                }
                Err(e) => {
                    tracing::debug!(url = %url, error = %e, "Settings read candidate failed");
                }
            }
        }
        tracing::warn!("No settings endpoint answered, keeping current settings");
        None
    }

    /// Refresh [`SettingsService::current`]; keeps the prior value on failure
    pub async fn refresh(&mut self) -> &ClassSettings {
        if let Some((_, settings)) = self.fetch().await {
            self.current = settings;
        }
        &self.current
    }

    /// Write the current book and lesson, probing strategies until one is
    /// accepted.
    pub async fn update(
        &mut self,
        book: &str,
        lesson: u32,
    ) -> Result<WriteOutcome, SettingsError> {
        let book = book.trim();
        if book.is_empty() {
            return Err(SettingsError::ValidationError(
                "Book name cannot be empty".to_string(),
            ));
        }

        let requested = ClassSettings {
            id: self.current.id.clone(),
            current_book_name_ja: book.to_string(),
            current_lesson: lesson,
        };

        let mut attempts = Vec::new();
        for strategy in self.write_strategies() {
            let body = RequestBody::Json(strategy.shape.body(&requested));
            match self
                .api
                .send_json::<Value>(strategy.method.clone(), &strategy.url, body)
                .await
            {
                Ok(response) => {
                    let settings = ClassSettings::normalize_onto(&response, &requested);
                    tracing::info!(
                        strategy = %strategy,
                        rejected = attempts.len(),
                        "Settings updated"
                    );
                    self.current = settings.clone();
                    return Ok(WriteOutcome {
                        settings,
                        accepted: strategy,
                        failed_attempts: attempts,
                    });
                }
                Err(e) if e.is_unauthorized() => {
                    return Err(SettingsError::Aborted {
                        source: e,
                        attempts,
                    });
                }
                Err(e) => {
                    tracing::debug!(strategy = %strategy, error = %e, "Settings write rejected");
                    attempts.push(ProbeAttempt {
                        strategy,
                        status: e.status(),
                        message: e.user_message(),
                    });
                }
            }
        }

        tracing::warn!(attempts = attempts.len(), "Settings update exhausted every strategy");
        Err(SettingsError::Exhausted { attempts })
    }
}
