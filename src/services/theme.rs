//! Theme preference
//!
//! Persisted under the `theme` storage key as `"dark"` or `"light"`.
//! Anything else reads as light.

use anyhow::Result;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::storage::{keys, Storage, StorageLayer};

/// Colour scheme
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    /// The other theme
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    /// Lenient parse for stored values
    pub fn from_stored(value: Option<&str>) -> Self {
        value.and_then(|v| v.parse().ok()).unwrap_or_default()
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Theme::Light => write!(f, "light"),
            Theme::Dark => write!(f, "dark"),
        }
    }
}

impl FromStr for Theme {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            _ => Err(anyhow::anyhow!("Invalid theme: {}", s)),
        }
    }
}

/// Persisted theme preference
#[derive(Debug)]
pub struct ThemePreference {
    storage: Arc<Storage>,
    current: Theme,
}

impl ThemePreference {
    /// Read the stored preference
    pub async fn load(storage: Arc<Storage>) -> Result<Self> {
        let stored = storage.get(keys::THEME).await?;
        let current = Theme::from_stored(stored.as_deref());
        Ok(Self { storage, current })
    }

    pub fn current(&self) -> Theme {
        self.current
    }

    /// Persist `theme`
    pub async fn set(&mut self, theme: Theme) -> Result<()> {
        self.storage.set(keys::THEME, &theme.to_string()).await?;
        self.current = theme;
        Ok(())
    }

    /// Flip and persist; returns the new theme
    pub async fn toggle(&mut self) -> Result<Theme> {
        let next = self.current.toggled();
        self.set(next).await?;
        Ok(next)
    }
}
