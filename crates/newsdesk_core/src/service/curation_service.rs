//! Curation widget use-case service.
//!
//! # Responsibility
//! - Enforce per-widget policy (cardinality, positive and distinct positions)
//!   before handing a list to the repository.
//! - Expose the homepage widget endpoints (grid, top nine, trends, hot topics)
//!   and the ordered section lists.
//!
//! # Invariants
//! - A rejected list leaves the stored list untouched.
//! - Reads are ascending by position and omit deleted content.

use crate::model::content::ContentId;
use crate::model::curation::{CardinalityPolicy, CuratedItem, CurationEntry, CurationList};
use crate::repo::content_repo::{RepoError, RepoResult};
use crate::repo::curation_repo::CurationRepository;
use log::{info, warn};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors from curation widget operations.
#[derive(Debug)]
pub enum CurationServiceError {
    CardinalityMismatch {
        list: CurationList,
        policy: CardinalityPolicy,
        actual: usize,
    },
    /// Positions start at 1.
    InvalidPosition { list: CurationList, position: i64 },
    DuplicatePosition { list: CurationList, position: i64 },
    /// Positional widgets need explicit positions.
    NotASection(CurationList),
    Repo(RepoError),
}

impl Display for CurationServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CardinalityMismatch {
                list,
                policy,
                actual,
            } => write!(f, "{list} requires {policy} items, got {actual}"),
            Self::InvalidPosition { list, position } => {
                write!(f, "{list} position must be at least 1, got {position}")
            }
            Self::DuplicatePosition { list, position } => {
                write!(f, "{list} position {position} is used more than once")
            }
            Self::NotASection(list) => {
                write!(f, "{list} takes explicit positions, not an ordered id list")
            }
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CurationServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for CurationServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Curation service facade.
pub struct CurationService<C: CurationRepository> {
    repo: C,
}

impl<C: CurationRepository> CurationService<C> {
    pub fn new(repo: C) -> Self {
        Self { repo }
    }

    /// Validates and wholesale-replaces one list.
    ///
    /// Returns the stored pairs in position order.
    pub fn set_list(
        &self,
        list: CurationList,
        entries: Vec<CurationEntry>,
    ) -> Result<Vec<CurationEntry>, CurationServiceError> {
        if let Err(err) = validate_entries(list, &entries) {
            warn!(
                "event=curation_replace module=curation status=rejected list={} entries={} error={}",
                list,
                entries.len(),
                err
            );
            return Err(err);
        }

        self.repo.replace_entries(list, &entries)?;
        info!(
            "event=curation_replace module=curation status=ok list={} entries={}",
            list,
            entries.len()
        );
        Ok(self.repo.list_entries(list)?)
    }

    /// Replaces a section list from an ordered id sequence; positions are
    /// `1..=n`.
    pub fn set_section(
        &self,
        list: CurationList,
        ids: &[ContentId],
    ) -> Result<Vec<CurationEntry>, CurationServiceError> {
        if list.is_positional() {
            return Err(CurationServiceError::NotASection(list));
        }
        let entries = ids
            .iter()
            .zip(1_i64..)
            .map(|(id, position)| CurationEntry::new(*id, position))
            .collect();
        self.set_list(list, entries)
    }

    /// Reads one list resolved to content summaries.
    pub fn get_list(&self, list: CurationList) -> RepoResult<Vec<CuratedItem>> {
        self.repo.read_list(list)
    }

    /// Stored pairs, including references to deleted content.
    pub fn raw_entries(&self, list: CurationList) -> RepoResult<Vec<CurationEntry>> {
        self.repo.list_entries(list)
    }

    pub fn set_home_grid(
        &self,
        entries: Vec<CurationEntry>,
    ) -> Result<Vec<CurationEntry>, CurationServiceError> {
        self.set_list(CurationList::TopFiveGrid, entries)
    }

    pub fn get_home_grid(&self) -> RepoResult<Vec<CuratedItem>> {
        self.get_list(CurationList::TopFiveGrid)
    }

    pub fn set_top_nine(
        &self,
        entries: Vec<CurationEntry>,
    ) -> Result<Vec<CurationEntry>, CurationServiceError> {
        self.set_list(CurationList::TopNine, entries)
    }

    pub fn get_top_nine(&self) -> RepoResult<Vec<CuratedItem>> {
        self.get_list(CurationList::TopNine)
    }

    pub fn set_trends(
        &self,
        entries: Vec<CurationEntry>,
    ) -> Result<Vec<CurationEntry>, CurationServiceError> {
        self.set_list(CurationList::Trends, entries)
    }

    pub fn get_trends(&self) -> RepoResult<Vec<CuratedItem>> {
        self.get_list(CurationList::Trends)
    }

    pub fn set_hot_topics(
        &self,
        entries: Vec<CurationEntry>,
    ) -> Result<Vec<CurationEntry>, CurationServiceError> {
        self.set_list(CurationList::HotTopics, entries)
    }

    pub fn get_hot_topics(&self) -> RepoResult<Vec<CuratedItem>> {
        self.get_list(CurationList::HotTopics)
    }
}

/// Applies the endpoint policy for `list` to `entries`.
pub fn validate_entries(
    list: CurationList,
    entries: &[CurationEntry],
) -> Result<(), CurationServiceError> {
    let policy = list.cardinality();
    if !policy.allows(entries.len()) {
        return Err(CurationServiceError::CardinalityMismatch {
            list,
            policy,
            actual: entries.len(),
        });
    }

    let mut seen = HashSet::with_capacity(entries.len());
    for entry in entries {
        if entry.position < 1 {
            return Err(CurationServiceError::InvalidPosition {
                list,
                position: entry.position,
            });
        }
        if !seen.insert(entry.position) {
            return Err(CurationServiceError::DuplicatePosition {
                list,
                position: entry.position,
            });
        }
    }
    Ok(())
}
