//! Site assets aggregate: promo placements, movie boards and file links.
//!
//! The aggregate is a singleton. Curation lists, boards and links live in
//! their own tables but are owned by the same singleton row.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Poster and ad placements rendered around site pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromoSlot {
    PopupPoster,
    MoviePoster,
    NavbarAd,
    HomeLongAd,
    HomeShortAd,
    CategoryLongAd,
    CategoryShortAd,
    NewsLongAd,
    NewsShortAd,
}

impl PromoSlot {
    pub const ALL: [PromoSlot; 9] = [
        Self::PopupPoster,
        Self::MoviePoster,
        Self::NavbarAd,
        Self::HomeLongAd,
        Self::HomeShortAd,
        Self::CategoryLongAd,
        Self::CategoryShortAd,
        Self::NewsLongAd,
        Self::NewsShortAd,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::PopupPoster => "popup_poster",
            Self::MoviePoster => "movie_poster",
            Self::NavbarAd => "navbar_ad",
            Self::HomeLongAd => "home_long_ad",
            Self::HomeShortAd => "home_short_ad",
            Self::CategoryLongAd => "category_long_ad",
            Self::CategoryShortAd => "category_short_ad",
            Self::NewsLongAd => "news_long_ad",
            Self::NewsShortAd => "news_short_ad",
        }
    }
}

impl Display for PromoSlot {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PromoSlot {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|slot| slot.as_str() == normalized)
            .ok_or_else(|| format!("unknown promo slot `{value}`"))
    }
}

/// Image and click-through link for one promo slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromoAsset {
    pub image_url: String,
    pub link: String,
    /// Epoch ms of the last write. `None` when the slot was never set.
    pub updated_at: Option<i64>,
}

impl PromoAsset {
    pub fn new(image_url: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            image_url: image_url.into(),
            link: link.into(),
            updated_at: None,
        }
    }

    /// A slot with no image renders nothing.
    pub fn is_empty(&self) -> bool {
        self.image_url.is_empty()
    }
}

/// Most recent file links kept by the aggregate.
pub const FILE_LINKS_KEEP: usize = 10;

pub type MovieEntryId = Uuid;

/// Box-office boards rendered on the movies page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovieBoard {
    /// Upcoming releases; `detail` is the release date.
    Releases,
    /// Collection figures; `detail` is the amount.
    Collections,
}

impl MovieBoard {
    pub const ALL: [MovieBoard; 2] = [Self::Releases, Self::Collections];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Releases => "releases",
            Self::Collections => "collections",
        }
    }

    /// Name of the `detail` field in operator-facing messages.
    pub fn detail_name(self) -> &'static str {
        match self {
            Self::Releases => "date",
            Self::Collections => "amount",
        }
    }
}

impl Display for MovieBoard {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MovieBoard {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|board| board.as_str() == normalized)
            .ok_or_else(|| format!("unknown movie board `{value}`"))
    }
}

/// One row of a movie board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovieEntry {
    pub id: MovieEntryId,
    pub board: MovieBoard,
    pub movie: String,
    /// Release date or collection amount, kept as entered.
    pub detail: String,
    pub category: String,
}

/// Partial edit of a movie board row. Blank or missing fields are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MovieEntryPatch {
    pub movie: Option<String>,
    pub detail: Option<String>,
    pub category: Option<String>,
}

impl MovieEntryPatch {
    /// Drops blank fields and trims the rest.
    pub fn normalized(self) -> Self {
        fn keep(value: Option<String>) -> Option<String> {
            value
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        }
        Self {
            movie: keep(self.movie),
            detail: keep(self.detail),
            category: keep(self.category),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.movie.is_none() && self.detail.is_none() && self.category.is_none()
    }

    pub fn apply(&self, entry: &mut MovieEntry) {
        if let Some(movie) = &self.movie {
            entry.movie.clone_from(movie);
        }
        if let Some(detail) = &self.detail {
            entry.detail.clone_from(detail);
        }
        if let Some(category) = &self.category {
            entry.category.clone_from(category);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{MovieBoard, MovieEntry, MovieEntryPatch, PromoSlot};
    use uuid::Uuid;

    #[test]
    fn slot_names_parse_in_kebab_case() {
        assert_eq!("navbar-ad".parse::<PromoSlot>(), Ok(PromoSlot::NavbarAd));
        assert!("sidebar".parse::<PromoSlot>().is_err());
        assert_eq!("Collections".parse::<MovieBoard>(), Ok(MovieBoard::Collections));
    }

    #[test]
    fn patch_ignores_blank_fields() {
        let patch = MovieEntryPatch {
            movie: Some("  ".to_string()),
            detail: Some(" Jan 12 ".to_string()),
            category: None,
        }
        .normalized();
        assert!(!patch.is_empty());

        let mut entry = MovieEntry {
            id: Uuid::new_v4(),
            board: MovieBoard::Releases,
            movie: "Devara".to_string(),
            detail: "TBA".to_string(),
            category: "telugu".to_string(),
        };
        patch.apply(&mut entry);
        assert_eq!(entry.movie, "Devara");
        assert_eq!(entry.detail, "Jan 12");
        assert_eq!(entry.category, "telugu");

        assert!(MovieEntryPatch::default().normalized().is_empty());
    }
}
