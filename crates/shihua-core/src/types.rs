use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::FavoritesError;

/// A poem as produced by a generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoemRecord {
    pub title: String,
    /// Verses separated by `\n`.
    pub content: String,
    pub author: String,
}

impl PoemRecord {
    pub fn new(
        title: impl Into<String>,
        content: impl Into<String>,
        author: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            author: author.into(),
        }
    }

    /// Check the non-empty invariant on every field.
    ///
    /// Whitespace-only values count as empty.
    pub fn validate(&self) -> Result<(), FavoritesError> {
        for (field, value) in [
            ("title", &self.title),
            ("content", &self.content),
            ("author", &self.author),
        ] {
            if value.trim().is_empty() {
                return Err(FavoritesError::InvalidInput(format!(
                    "poem {field} must not be empty"
                )));
            }
        }
        Ok(())
    }

    /// Verses of the poem, one per line.
    pub fn verses(&self) -> impl Iterator<Item = &str> {
        self.content.lines().filter(|line| !line.trim().is_empty())
    }
}

/// A poem saved to favorites together with the image it was generated from.
///
/// Entries are never edited after creation; the store only adds and removes
/// whole entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedPoemEntry {
    pub id: String,
    #[serde(flatten)]
    pub poem: PoemRecord,
    /// Opaque image URI. Older collections stored this as `imageUri`.
    #[serde(alias = "imageUri")]
    pub image_reference: String,
    pub saved_at: DateTime<Utc>,
}

impl SavedPoemEntry {
    /// Structural check applied to every decoded entry.
    pub fn validate(&self) -> Result<(), FavoritesError> {
        if self.id.trim().is_empty() {
            return Err(FavoritesError::InvalidInput(
                "entry id must not be empty".to_string(),
            ));
        }
        self.poem.validate()
    }
}

/// What to do when the persisted collection cannot be decoded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorruptPolicy {
    /// Log a warning and treat the collection as empty.
    #[default]
    FailOpen,
    /// Report `CorruptStore` to the caller.
    FailClosed,
}

impl std::fmt::Display for CorruptPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FailOpen => write!(f, "fail_open"),
            Self::FailClosed => write!(f, "fail_closed"),
        }
    }
}

/// Output format for CLI responses
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}
