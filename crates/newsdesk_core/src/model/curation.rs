//! Homepage curation list model.
//!
//! # Responsibility
//! - Name every curation list held by the site assets aggregate.
//! - Describe the per-widget cardinality policy applied by endpoints.
//!
//! # Invariants
//! - Positions order rendering; storage order carries no meaning.
//! - A list is replaced wholesale; there is no partial patch model.
//! - The same content id may appear in several lists, and the model does
//!   not prevent it appearing twice in one list.

use crate::model::content::{ContentId, ContentSummary};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// One positional pair inside a curation list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurationEntry {
    /// Referenced content document.
    pub content_id: ContentId,
    /// Render slot. Lower renders first.
    pub position: i64,
}

impl CurationEntry {
    pub fn new(content_id: ContentId, position: i64) -> Self {
        Self {
            content_id,
            position,
        }
    }
}

/// A curation entry resolved to its content summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CuratedItem {
    pub position: i64,
    pub content: ContentSummary,
}

/// Cardinality rule enforced by the endpoint that writes a list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardinalityPolicy {
    Exact(usize),
    AtLeast(usize),
    Any,
}

impl CardinalityPolicy {
    pub fn allows(self, count: usize) -> bool {
        match self {
            Self::Exact(expected) => count == expected,
            Self::AtLeast(minimum) => count >= minimum,
            Self::Any => true,
        }
    }
}

impl Display for CardinalityPolicy {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exact(expected) => write!(f, "exactly {expected}"),
            Self::AtLeast(minimum) => write!(f, "at least {minimum}"),
            Self::Any => write!(f, "any number of"),
        }
    }
}

/// Every curation list of the site assets aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurationList {
    /// Homepage five-slot grid.
    TopFiveGrid,
    /// Homepage nine-slot strip.
    TopNine,
    Trends,
    HotTopics,
    Andhra,
    Telangana,
    Movies,
    Reviews,
    Gossips,
    LatestStories,
    Trailers,
}

impl CurationList {
    pub const ALL: [CurationList; 11] = [
        Self::TopFiveGrid,
        Self::TopNine,
        Self::Trends,
        Self::HotTopics,
        Self::Andhra,
        Self::Telangana,
        Self::Movies,
        Self::Reviews,
        Self::Gossips,
        Self::LatestStories,
        Self::Trailers,
    ];

    /// Stable storage name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TopFiveGrid => "top_five_grid",
            Self::TopNine => "top_nine",
            Self::Trends => "trends",
            Self::HotTopics => "hot_topics",
            Self::Andhra => "andhra",
            Self::Telangana => "telangana",
            Self::Movies => "movies",
            Self::Reviews => "reviews",
            Self::Gossips => "gossips",
            Self::LatestStories => "latest_stories",
            Self::Trailers => "trailers",
        }
    }

    /// Whether callers supply positions explicitly.
    ///
    /// Section lists take an ordered id list and derive positions `1..=n`.
    pub fn is_positional(self) -> bool {
        matches!(
            self,
            Self::TopFiveGrid | Self::TopNine | Self::Trends | Self::HotTopics
        )
    }

    pub fn cardinality(self) -> CardinalityPolicy {
        match self {
            Self::TopFiveGrid | Self::HotTopics => CardinalityPolicy::Exact(5),
            Self::TopNine => CardinalityPolicy::Exact(9),
            Self::Trends => CardinalityPolicy::AtLeast(1),
            Self::Andhra
            | Self::Telangana
            | Self::Movies
            | Self::Reviews
            | Self::Gossips
            | Self::LatestStories
            | Self::Trailers => CardinalityPolicy::Any,
        }
    }

    pub(crate) fn from_db(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|list| list.as_str() == value)
    }
}

impl Display for CurationList {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CurationList {
    type Err = String;

    /// Accepts storage names and their kebab-case spelling (`top-nine`).
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase().replace('-', "_");
        Self::from_db(&normalized).ok_or_else(|| format!("unknown curation list `{value}`"))
    }
}
