//! Slug normalization and collision-free allocation.
//!
//! # Responsibility
//! - Derive a URL-safe base slug from a human title.
//! - Resolve collisions inside one content kind with numeric suffixes.
//!
//! # Invariants
//! - Allocated slugs contain only `[a-z0-9-]`, never start or end with `-`
//!   and never contain `--`.
//! - Allocation is deterministic for a given store state, except the opaque
//!   fallback used for titles with no sluggable characters.
//! - The suffix search is bounded by `SlugPolicy::max_attempts`.
//!
//! Existence checks and the later write are not atomic. The store's unique
//! `(kind, slug)` index is the final guard; writers that lose the race get
//! `RepoError::SlugTaken` and allocate again.

use crate::model::content::{ContentId, ContentKind};
use crate::repo::content_repo::{RepoError, RepoResult};
use log::{debug, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 10_000;
pub const DEFAULT_MAX_BASE_LEN: usize = 96;
const FALLBACK_TOKEN_LEN: usize = 12;

static APOSTROPHE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"['’‘`]").expect("valid apostrophe regex"));
static NON_SLUG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9]+").expect("valid non-slug regex"));

/// Bounds applied by [`SlugAllocator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SlugPolicy {
    /// Candidates checked (base included) before giving up.
    pub max_attempts: u32,
    /// Maximum base length before the numeric suffix.
    pub max_base_len: usize,
}

impl Default for SlugPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            max_base_len: DEFAULT_MAX_BASE_LEN,
        }
    }
}

/// Slug allocation failures.
#[derive(Debug)]
pub enum SlugError {
    /// Title is empty or whitespace only.
    InvalidTitle,
    /// Every candidate up to the attempt bound is taken.
    Exhausted { base: String, attempts: u32 },
    /// Store lookup failed; passed through unchanged.
    Repo(RepoError),
}

impl Display for SlugError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTitle => write!(f, "title must not be blank"),
            Self::Exhausted { base, attempts } => write!(
                f,
                "no free slug for base `{base}` after {attempts} attempts"
            ),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SlugError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::InvalidTitle | Self::Exhausted { .. } => None,
        }
    }
}

impl From<RepoError> for SlugError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Lookup seam over a slug namespace.
pub trait SlugIndex {
    /// Returns whether `slug` is used by a document of `kind` other than
    /// `exclude_id`.
    fn slug_exists(
        &self,
        kind: ContentKind,
        slug: &str,
        exclude_id: Option<ContentId>,
    ) -> RepoResult<bool>;
}

impl<T: SlugIndex + ?Sized> SlugIndex for &T {
    fn slug_exists(
        &self,
        kind: ContentKind,
        slug: &str,
        exclude_id: Option<ContentId>,
    ) -> RepoResult<bool> {
        (**self).slug_exists(kind, slug, exclude_id)
    }
}

/// Allocates unique slugs against a [`SlugIndex`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SlugAllocator {
    policy: SlugPolicy,
}

impl SlugAllocator {
    pub fn new(policy: SlugPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> SlugPolicy {
        self.policy
    }

    /// Derives the base candidate for `title` without touching storage.
    ///
    /// # Errors
    /// - `InvalidTitle` when `title` is blank.
    pub fn base_slug(&self, kind: ContentKind, title: &str) -> Result<String, SlugError> {
        if title.trim().is_empty() {
            return Err(SlugError::InvalidTitle);
        }
        Ok(normalize_title(title, self.policy.max_base_len)
            .unwrap_or_else(|| fallback_token(kind)))
    }

    /// Returns the first free candidate among `base`, `base-2`, `base-3`, ...
    ///
    /// Pass the edited document's id as `exclude_id` so its current slug does
    /// not count as a collision with itself.
    ///
    /// # Errors
    /// - `InvalidTitle` when `title` is blank.
    /// - `Exhausted` when `max_attempts` candidates are all taken.
    /// - `Repo` when a lookup fails.
    pub fn allocate<I>(
        &self,
        index: &I,
        kind: ContentKind,
        title: &str,
        exclude_id: Option<ContentId>,
    ) -> Result<String, SlugError>
    where
        I: SlugIndex + ?Sized,
    {
        let base = self.base_slug(kind, title)?;

        for attempt in 1..=self.policy.max_attempts {
            let candidate = candidate_for(&base, attempt);
            if !index.slug_exists(kind, &candidate, exclude_id)? {
                info!(
                    "event=slug_allocate module=slug status=ok kind={} attempts={} excluded={}",
                    kind,
                    attempt,
                    exclude_id.is_some()
                );
                return Ok(candidate);
            }
            debug!("event=slug_collision module=slug kind={kind} attempt={attempt}");
        }

        warn!(
            "event=slug_allocate module=slug status=error kind={} error_code=slug_exhausted attempts={}",
            kind, self.policy.max_attempts
        );
        Err(SlugError::Exhausted {
            base,
            attempts: self.policy.max_attempts,
        })
    }
}

/// Normalizes a title to a base slug.
///
/// Apostrophes are dropped so possessives stay one word, the rest is
/// transliterated to ASCII and hyphenated. Returns `None` when nothing
/// sluggable remains.
pub fn normalize_title(title: &str, max_len: usize) -> Option<String> {
    let without_apostrophes = APOSTROPHE_RE.replace_all(title.trim(), "");
    let transliterated = ::slug::slugify(without_apostrophes.as_ref());
    let hyphenated = NON_SLUG_RE.replace_all(&transliterated, "-");
    let base = truncate_at_hyphen(hyphenated.trim_matches('-'), max_len);
    if base.is_empty() {
        None
    } else {
        Some(base)
    }
}

/// Returns `true` when `value` is lowercase kebab-case.
pub fn is_valid_slug(value: &str) -> bool {
    !value.is_empty()
        && !value.starts_with('-')
        && !value.ends_with('-')
        && !value.contains("--")
        && value
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

fn candidate_for(base: &str, attempt: u32) -> String {
    if attempt == 1 {
        base.to_string()
    } else {
        format!("{base}-{attempt}")
    }
}

fn truncate_at_hyphen(slug: &str, max_len: usize) -> String {
    if slug.len() <= max_len {
        return slug.to_string();
    }
    let head = &slug[..max_len];
    let cut = match head.rfind('-') {
        Some(index) if index > 0 => &head[..index],
        _ => head,
    };
    cut.trim_end_matches('-').to_string()
}

fn fallback_token(kind: ContentKind) -> String {
    let token = Uuid::new_v4().simple().to_string();
    format!("{}-{}", kind.as_str(), &token[..FALLBACK_TOKEN_LEN])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[derive(Default)]
    struct MemoryIndex {
        slugs: HashMap<(ContentKind, String), ContentId>,
    }

    impl MemoryIndex {
        fn insert(&mut self, kind: ContentKind, slug: &str) -> ContentId {
            let id = Uuid::new_v4();
            self.slugs.insert((kind, slug.to_string()), id);
            id
        }
    }

    impl SlugIndex for MemoryIndex {
        fn slug_exists(
            &self,
            kind: ContentKind,
            slug: &str,
            exclude_id: Option<ContentId>,
        ) -> RepoResult<bool> {
            Ok(self
                .slugs
                .get(&(kind, slug.to_string()))
                .is_some_and(|owner| Some(*owner) != exclude_id))
        }
    }

    #[test]
    fn possessive_title_normalizes_without_apostrophe() {
        assert_eq!(
            normalize_title("Pawan Kalyan's New Movie!!", DEFAULT_MAX_BASE_LEN).as_deref(),
            Some("pawan-kalyans-new-movie")
        );
    }

    #[test]
    fn punctuation_runs_collapse_to_single_hyphen() {
        assert_eq!(
            normalize_title("  --Box   Office:: Day 3 -- Report?? ", 96).as_deref(),
            Some("box-office-day-3-report")
        );
    }

    #[test]
    fn punctuation_only_title_has_no_base() {
        assert_eq!(normalize_title("!!! ... ???", 96), None);
    }

    #[test]
    fn long_titles_truncate_on_word_boundary() {
        let slug = normalize_title("alpha beta gamma delta", 13).unwrap();
        assert_eq!(slug, "alpha-beta");
        assert!(is_valid_slug(&slug));
    }

    #[test]
    fn normalized_titles_are_valid_slugs() {
        for title in [
            "Hello, World",
            "ÜBER café — naïve",
            "RRR 2: Return!!",
            "a'b'c",
            "tab\tand\nnewline",
            "emoji 🎬 launch",
        ] {
            let slug = normalize_title(title, 96).unwrap();
            assert!(is_valid_slug(&slug), "`{title}` produced `{slug}`");
        }
    }

    #[test]
    fn blank_title_is_rejected() {
        let allocator = SlugAllocator::default();
        let index = MemoryIndex::default();
        let err = allocator
            .allocate(&index, ContentKind::News, "   ", None)
            .unwrap_err();
        assert!(matches!(err, SlugError::InvalidTitle));
    }

    #[test]
    fn punctuation_title_falls_back_to_opaque_token() {
        let allocator = SlugAllocator::default();
        let index = MemoryIndex::default();
        let slug = allocator
            .allocate(&index, ContentKind::Gallery, "?!?!", None)
            .unwrap();
        assert!(slug.starts_with("gallery-"));
        assert_eq!(slug.len(), "gallery-".len() + FALLBACK_TOKEN_LEN);
        assert!(is_valid_slug(&slug));
    }

    #[test]
    fn collision_appends_next_free_suffix() {
        let allocator = SlugAllocator::default();
        let mut index = MemoryIndex::default();
        index.insert(ContentKind::News, "pawan-kalyans-new-movie");
        assert_eq!(
            allocator
                .allocate(&index, ContentKind::News, "Pawan Kalyan's New Movie!!", None)
                .unwrap(),
            "pawan-kalyans-new-movie-2"
        );

        index.insert(ContentKind::News, "pawan-kalyans-new-movie-2");
        assert_eq!(
            allocator
                .allocate(&index, ContentKind::News, "Pawan Kalyan's New Movie!!", None)
                .unwrap(),
            "pawan-kalyans-new-movie-3"
        );
    }

    #[test]
    fn kinds_are_separate_namespaces() {
        let allocator = SlugAllocator::default();
        let mut index = MemoryIndex::default();
        index.insert(ContentKind::News, "trailer-launch");
        assert_eq!(
            allocator
                .allocate(&index, ContentKind::Video, "Trailer Launch", None)
                .unwrap(),
            "trailer-launch"
        );
    }

    #[test]
    fn excluded_owner_keeps_its_slug() {
        let allocator = SlugAllocator::default();
        let mut index = MemoryIndex::default();
        index.insert(ContentKind::News, "budget-session");
        let own_id = index.insert(ContentKind::News, "budget-session-2");

        let slug = allocator
            .allocate(&index, ContentKind::News, "Budget Session", Some(own_id))
            .unwrap();
        assert_eq!(slug, "budget-session-2");
    }

    #[test]
    fn exhausted_search_reports_base_and_bound() {
        let allocator = SlugAllocator::new(SlugPolicy {
            max_attempts: 3,
            ..SlugPolicy::default()
        });
        let mut index = MemoryIndex::default();
        for slug in ["rain-alert", "rain-alert-2", "rain-alert-3"] {
            index.insert(ContentKind::News, slug);
        }

        match allocator.allocate(&index, ContentKind::News, "Rain alert", None) {
            Err(SlugError::Exhausted { base, attempts }) => {
                assert_eq!(base, "rain-alert");
                assert_eq!(attempts, 3);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn slug_validation_rejects_malformed_values() {
        assert!(is_valid_slug("abc-123"));
        assert!(!is_valid_slug(""));
        assert!(!is_valid_slug("-abc"));
        assert!(!is_valid_slug("abc-"));
        assert!(!is_valid_slug("a--b"));
        assert!(!is_valid_slug("Abc"));
    }
}
