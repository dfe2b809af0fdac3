//! Content document model.
//!
//! # Responsibility
//! - Define the canonical record shared by news, gallery and video content.
//! - Own field-level validation for writes and persisted reads.
//!
//! # Invariants
//! - `id` is stable and never reused for another document.
//! - `slug` is unique within `kind` (enforced by the store, checked by the
//!   allocator).
//! - `movie_rating`, when set, is within `0..=MAX_MOVIE_RATING`.

use crate::slugs::is_valid_slug;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

/// Stable identifier for every content document.
pub type ContentId = Uuid;

/// Upper bound of the review score attached to news reviews.
pub const MAX_MOVIE_RATING: i64 = 5;

/// Content collection. Each kind is its own slug namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    /// Article with a cover image.
    News,
    /// Photo gallery.
    Gallery,
    /// Video post with an external media URL.
    Video,
}

impl ContentKind {
    /// All kinds, in storage order.
    pub const ALL: [ContentKind; 3] = [Self::News, Self::Gallery, Self::Video];

    /// Stable storage/wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::News => "news",
            Self::Gallery => "gallery",
            Self::Video => "video",
        }
    }

    /// Category applied when the caller leaves it blank.
    pub fn default_category(self) -> Option<&'static str> {
        match self {
            Self::Video => Some("videos"),
            Self::News | Self::Gallery => None,
        }
    }

    fn requires_description(self) -> bool {
        matches!(self, Self::News | Self::Gallery)
    }
}

impl Display for ContentKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "news" => Ok(Self::News),
            "gallery" => Ok(Self::Gallery),
            "video" | "videos" => Ok(Self::Video),
            other => Err(format!(
                "unknown content kind `{other}`; expected news|gallery|video"
            )),
        }
    }
}

/// Validation failures for content documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentValidationError {
    BlankTitle,
    BlankCategory,
    BlankDescription(ContentKind),
    InvalidSlug(String),
    MovieRatingOutOfRange(i64),
    MovieRatingNotApplicable(ContentKind),
}

impl Display for ContentValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankTitle => write!(f, "title must not be blank"),
            Self::BlankCategory => write!(f, "category must not be blank"),
            Self::BlankDescription(kind) => {
                write!(f, "description must not be blank for {kind} content")
            }
            Self::InvalidSlug(slug) => write!(f, "invalid slug `{slug}`"),
            Self::MovieRatingOutOfRange(value) => write!(
                f,
                "movie rating {value} is outside 0..={MAX_MOVIE_RATING}"
            ),
            Self::MovieRatingNotApplicable(kind) => {
                write!(f, "movie rating is only allowed on news, got {kind}")
            }
        }
    }
}

impl Error for ContentValidationError {}

/// Canonical content record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentDocument {
    pub id: ContentId,
    pub kind: ContentKind,
    /// URL identifier, unique within `kind`.
    pub slug: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub sub_category: Option<String>,
    /// Cover image URL.
    pub main_url: Option<String>,
    /// Playback URL for video content.
    pub media_url: Option<String>,
    /// Author display name.
    pub posted_by: Option<String>,
    pub tags: Vec<String>,
    /// Review score for news reviews.
    pub movie_rating: Option<i64>,
    /// Unix epoch milliseconds. Assigned by storage.
    pub created_at: i64,
    /// Unix epoch milliseconds. Assigned by storage.
    pub updated_at: i64,
}

impl ContentDocument {
    /// Creates a document with a generated id and empty optional fields.
    ///
    /// Timestamps stay `0` until the repository assigns them.
    pub fn new(
        kind: ContentKind,
        slug: impl Into<String>,
        title: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            slug: slug.into(),
            title: title.into(),
            description: String::new(),
            category: category.into(),
            sub_category: None,
            main_url: None,
            media_url: None,
            posted_by: None,
            tags: Vec::new(),
            movie_rating: None,
            created_at: 0,
            updated_at: 0,
        }
    }

    /// Checks field-level invariants, slug included.
    ///
    /// # Errors
    /// Returns the first violated rule.
    pub fn validate(&self) -> Result<(), ContentValidationError> {
        self.validate_fields()?;
        if !is_valid_slug(&self.slug) {
            return Err(ContentValidationError::InvalidSlug(self.slug.clone()));
        }
        Ok(())
    }

    /// Checks every invariant except the slug.
    ///
    /// Used before a slug has been allocated.
    pub fn validate_fields(&self) -> Result<(), ContentValidationError> {
        if self.title.trim().is_empty() {
            return Err(ContentValidationError::BlankTitle);
        }
        if self.category.trim().is_empty() {
            return Err(ContentValidationError::BlankCategory);
        }
        if self.kind.requires_description() && self.description.trim().is_empty() {
            return Err(ContentValidationError::BlankDescription(self.kind));
        }
        if let Some(rating) = self.movie_rating {
            if self.kind != ContentKind::News {
                return Err(ContentValidationError::MovieRatingNotApplicable(self.kind));
            }
            if !(0..=MAX_MOVIE_RATING).contains(&rating) {
                return Err(ContentValidationError::MovieRatingOutOfRange(rating));
            }
        }
        Ok(())
    }

    /// Projection rendered by curation widgets.
    pub fn summary(&self) -> ContentSummary {
        ContentSummary {
            id: self.id,
            kind: self.kind,
            slug: self.slug.clone(),
            title: self.title.clone(),
            posted_by: self.posted_by.clone(),
            main_url: self.main_url.clone(),
        }
    }
}

/// Summary projection of a content document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentSummary {
    pub id: ContentId,
    pub kind: ContentKind,
    pub slug: String,
    pub title: String,
    pub posted_by: Option<String>,
    pub main_url: Option<String>,
}
