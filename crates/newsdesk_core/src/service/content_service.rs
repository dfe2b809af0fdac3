//! Content use-case service.
//!
//! # Responsibility
//! - Create, edit, read, list and delete news/gallery/video documents.
//! - Allocate slugs on create and re-allocate them when a title changes.
//! - Run the purge cascade over curation lists after a delete.
//!
//! # Invariants
//! - Slugs are regenerated only when the normalized title changed; case,
//!   punctuation and other edits keep the stored slug untouched.
//! - A write rejected by the unique slug index is retried with a fresh
//!   allocation at most `ContentPolicy::write_retries` times.
//! - Deleting a document removes its references from every curation list
//!   and the featured gallery in the same transaction as the row delete.

use crate::model::content::{ContentDocument, ContentId, ContentKind, ContentValidationError};
use crate::model::curation::CurationList;
use crate::repo::content_repo::{
    normalize_content_limit, ContentListQuery, ContentRepository, RepoError, RepoResult,
};
use crate::repo::curation_repo::CurationRepository;
use crate::slugs::{normalize_title, SlugAllocator, SlugError, SlugPolicy};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const DEFAULT_WRITE_RETRIES: u32 = 3;

/// Write behavior for content endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContentPolicy {
    /// Total write attempts when the slug index reports a lost race.
    pub write_retries: u32,
}

impl Default for ContentPolicy {
    fn default() -> Self {
        Self {
            write_retries: DEFAULT_WRITE_RETRIES,
        }
    }
}

/// Service error for content use-cases.
#[derive(Debug)]
pub enum ContentServiceError {
    Validation(ContentValidationError),
    NotFound(ContentId),
    /// Slug allocation failed (blank title, exhausted suffixes).
    Slug(SlugError),
    /// Concurrent writers kept taking the allocated slug.
    SlugConflict {
        kind: ContentKind,
        slug: String,
        attempts: u32,
    },
    Repo(RepoError),
    /// Internal consistency mismatch between write and read-back.
    InconsistentState(&'static str),
}

impl Display for ContentServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "content not found: {id}"),
            Self::Slug(err) => write!(f, "{err}"),
            Self::SlugConflict {
                kind,
                slug,
                attempts,
            } => write!(
                f,
                "slug `{slug}` for {kind} was taken concurrently on all {attempts} write attempts"
            ),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => {
                write!(f, "inconsistent content state: {details}")
            }
        }
    }
}

impl Error for ContentServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Slug(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ContentServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NotFound(id),
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

impl From<ContentValidationError> for ContentServiceError {
    fn from(value: ContentValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<SlugError> for ContentServiceError {
    fn from(value: SlugError) -> Self {
        match value {
            SlugError::Repo(err) => err.into(),
            other => Self::Slug(other),
        }
    }
}

/// Input for the "add" endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewContent {
    pub kind: ContentKind,
    pub title: String,
    pub description: String,
    pub category: String,
    pub sub_category: Option<String>,
    pub main_url: Option<String>,
    pub media_url: Option<String>,
    pub posted_by: Option<String>,
    pub tags: Vec<String>,
    pub movie_rating: Option<i64>,
}

impl NewContent {
    pub fn new(kind: ContentKind, title: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            description: String::new(),
            category: category.into(),
            sub_category: None,
            main_url: None,
            media_url: None,
            posted_by: None,
            tags: Vec::new(),
            movie_rating: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }
}

/// Full replacement of the editable fields of a document.
///
/// Media URLs and authorship are not editable here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentEdit {
    pub title: String,
    pub description: String,
    pub category: String,
    pub sub_category: Option<String>,
    pub tags: Vec<String>,
    pub movie_rating: Option<i64>,
}

impl ContentEdit {
    /// Starts an edit from the document's current values.
    pub fn from_document(doc: &ContentDocument) -> Self {
        Self {
            title: doc.title.clone(),
            description: doc.description.clone(),
            category: doc.category.clone(),
            sub_category: doc.sub_category.clone(),
            tags: doc.tags.clone(),
            movie_rating: doc.movie_rating,
        }
    }
}

/// Result of a delete, including the purge cascade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub id: ContentId,
    /// Lists that referenced the document before the purge.
    pub purged_lists: Vec<CurationList>,
    pub purged_entries: usize,
    /// Whether the document was the featured gallery.
    pub cleared_featured_gallery: bool,
}

/// List result envelope used by service callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentListResult {
    /// Sorted `created_at DESC, id ASC`.
    pub items: Vec<ContentDocument>,
    pub applied_limit: u32,
}

/// Content service facade over content and curation repositories.
pub struct ContentService<R: ContentRepository, C: CurationRepository> {
    repo: R,
    curation: C,
    allocator: SlugAllocator,
    policy: ContentPolicy,
}

impl<R: ContentRepository, C: CurationRepository> ContentService<R, C> {
    /// Creates a service with default slug and write policies.
    pub fn new(repo: R, curation: C) -> Self {
        Self::with_policies(repo, curation, SlugPolicy::default(), ContentPolicy::default())
    }

    pub fn with_policies(
        repo: R,
        curation: C,
        slug_policy: SlugPolicy,
        policy: ContentPolicy,
    ) -> Self {
        Self {
            repo,
            curation,
            allocator: SlugAllocator::new(slug_policy),
            policy,
        }
    }

    /// Validates input, allocates a unique slug and persists a new document.
    ///
    /// # Errors
    /// - `Validation` for missing title/category/description or a bad rating.
    /// - `Slug` when the suffix search is exhausted.
    /// - `SlugConflict` when every write attempt lost the slug to another writer.
    pub fn create(&self, input: NewContent) -> Result<ContentDocument, ContentServiceError> {
        let kind = input.kind;
        let mut doc = ContentDocument::new(kind, String::new(), input.title.trim(), "");
        doc.category = normalize_category(kind, &input.category);
        doc.description = input.description.trim().to_string();
        doc.sub_category = normalize_optional(input.sub_category);
        doc.main_url = normalize_optional(input.main_url);
        doc.media_url = normalize_optional(input.media_url);
        doc.posted_by = normalize_optional(input.posted_by);
        doc.tags = normalize_tags(&input.tags);
        doc.movie_rating = input.movie_rating;
        doc.validate_fields()?;

        for attempt in 1..=self.policy.write_retries {
            doc.slug = self.allocator.allocate(&self.repo, kind, &doc.title, None)?;
            match self.repo.create_content(&doc) {
                Ok(id) => {
                    info!(
                        "event=content_create module=content status=ok kind={} id={} write_attempts={}",
                        kind, id, attempt
                    );
                    return self.read_back(id, "created content not found in read-back");
                }
                Err(RepoError::SlugTaken { .. }) => {
                    warn!(
                        "event=content_create module=content status=retry kind={} error_code=slug_taken attempt={}",
                        kind, attempt
                    );
                }
                Err(err) => return Err(err.into()),
            }
        }

        Err(ContentServiceError::SlugConflict {
            kind,
            slug: doc.slug,
            attempts: self.policy.write_retries,
        })
    }

    /// Replaces the editable fields of one document.
    ///
    /// The slug is re-allocated, excluding the document itself, only when the
    /// normalized title differs from the stored one.
    pub fn edit(
        &self,
        id: ContentId,
        edit: ContentEdit,
    ) -> Result<ContentDocument, ContentServiceError> {
        let current = self
            .repo
            .get_content(id)?
            .ok_or(ContentServiceError::NotFound(id))?;

        let mut doc = current.clone();
        doc.title = edit.title.trim().to_string();
        doc.description = edit.description.trim().to_string();
        doc.category = normalize_category(doc.kind, &edit.category);
        doc.sub_category = normalize_optional(edit.sub_category);
        doc.tags = normalize_tags(&edit.tags);
        doc.movie_rating = edit.movie_rating;
        doc.validate_fields()?;

        let title_changed = self.slug_base_changed(&current.title, &doc.title);
        for attempt in 1..=self.policy.write_retries {
            if title_changed {
                doc.slug = self
                    .allocator
                    .allocate(&self.repo, doc.kind, &doc.title, Some(id))?;
            }
            match self.repo.update_content(&doc) {
                Ok(()) => {
                    info!(
                        "event=content_edit module=content status=ok kind={} id={} reslugged={} write_attempts={}",
                        doc.kind,
                        id,
                        doc.slug != current.slug,
                        attempt
                    );
                    return self.read_back(id, "edited content not found in read-back");
                }
                Err(RepoError::SlugTaken { .. }) if title_changed => {
                    warn!(
                        "event=content_edit module=content status=retry kind={} id={} error_code=slug_taken attempt={}",
                        doc.kind, id, attempt
                    );
                }
                Err(err) => return Err(err.into()),
            }
        }

        Err(ContentServiceError::SlugConflict {
            kind: doc.kind,
            slug: doc.slug,
            attempts: self.policy.write_retries,
        })
    }

    pub fn get(&self, id: ContentId) -> RepoResult<Option<ContentDocument>> {
        self.repo.get_content(id)
    }

    pub fn get_by_slug(
        &self,
        kind: ContentKind,
        slug: &str,
    ) -> RepoResult<Option<ContentDocument>> {
        self.repo.find_by_slug(kind, slug.trim())
    }

    /// Lists documents with optional kind/category filters and pagination.
    pub fn list(&self, query: &ContentListQuery) -> RepoResult<ContentListResult> {
        let applied_limit = normalize_content_limit(query.limit);
        let query = ContentListQuery {
            category: normalize_optional(query.category.clone()),
            sub_category: normalize_optional(query.sub_category.clone()),
            limit: Some(applied_limit),
            ..query.clone()
        };
        let items = self.repo.list_content(&query)?;
        Ok(ContentListResult {
            items,
            applied_limit,
        })
    }

    /// Deletes one document and purges it from every curation list.
    ///
    /// The row delete and the purge commit together or not at all.
    pub fn delete(&self, id: ContentId) -> Result<DeleteOutcome, ContentServiceError> {
        let report = self
            .curation
            .delete_with_purge(id, || self.repo.delete_content(id))?;
        if report.entries > 0 || report.cleared_featured_gallery {
            info!(
                "event=curation_purge module=curation status=ok id={} entries={} featured_gallery={}",
                id, report.entries, report.cleared_featured_gallery
            );
        }

        info!(
            "event=content_delete module=content status=ok id={} purged_lists={} purged_entries={}",
            id,
            report.lists.len(),
            report.entries
        );
        Ok(DeleteOutcome {
            id,
            purged_lists: report.lists,
            purged_entries: report.entries,
            cleared_featured_gallery: report.cleared_featured_gallery,
        })
    }

    fn slug_base_changed(&self, old_title: &str, new_title: &str) -> bool {
        let max_len = self.allocator.policy().max_base_len;
        normalize_title(old_title, max_len) != normalize_title(new_title, max_len)
    }

    fn read_back(
        &self,
        id: ContentId,
        details: &'static str,
    ) -> Result<ContentDocument, ContentServiceError> {
        self.repo
            .get_content(id)?
            .ok_or(ContentServiceError::InconsistentState(details))
    }
}

/// Normalizes and deduplicates tag values (trimmed, lowercase, sorted).
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    tags.iter()
        .map(|tag| tag.trim().to_lowercase())
        .filter(|tag| !tag.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn normalize_category(kind: ContentKind, category: &str) -> String {
    let trimmed = category.trim();
    match (trimmed.is_empty(), kind.default_category()) {
        (true, Some(default)) => default.to_string(),
        _ => trimmed.to_string(),
    }
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
