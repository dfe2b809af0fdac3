//! Site assets use-case service.
//!
//! # Responsibility
//! - Validate and persist poster/ad placements.
//! - Manage the featured gallery, the movie release and collection boards,
//!   and the recent file links.
//! - Bootstrap the site assets singleton on demand.

use crate::model::assets::{
    MovieBoard, MovieEntry, MovieEntryId, MovieEntryPatch, PromoAsset, PromoSlot,
};
use crate::model::content::{ContentId, ContentKind, ContentSummary};
use crate::repo::assets_repo::{SiteAssetsMeta, SiteAssetsRepository};
use crate::repo::content_repo::{RepoError, RepoResult};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Errors from site assets writes.
#[derive(Debug)]
pub enum AssetsServiceError {
    BlankImageUrl(PromoSlot),
    /// A required movie board field is blank.
    BlankField {
        board: MovieBoard,
        field: &'static str,
    },
    /// An edit carried no non-blank field.
    NothingToUpdate(MovieBoard),
    MovieEntryNotFound {
        board: MovieBoard,
        id: MovieEntryId,
    },
    ContentNotFound(ContentId),
    NotAGallery {
        id: ContentId,
        kind: ContentKind,
    },
    BlankFileLink,
    Repo(RepoError),
}

impl Display for AssetsServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankImageUrl(slot) => write!(f, "{slot} requires a non-blank image url"),
            Self::BlankField { board, field } => {
                write!(f, "{board} entry requires a non-blank {field}")
            }
            Self::NothingToUpdate(board) => write!(f, "{board} edit has nothing to update"),
            Self::MovieEntryNotFound { board, id } => {
                write!(f, "{board} entry not found: {id}")
            }
            Self::ContentNotFound(id) => write!(f, "content not found: {id}"),
            Self::NotAGallery { id, kind } => {
                write!(f, "content {id} is a {kind} document, not a gallery")
            }
            Self::BlankFileLink => write!(f, "file link must not be blank"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for AssetsServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for AssetsServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Site assets service facade.
pub struct AssetsService<R: SiteAssetsRepository> {
    repo: R,
}

impl<R: SiteAssetsRepository> AssetsService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn ensure_site_assets(&self) -> RepoResult<SiteAssetsMeta> {
        self.repo.ensure_site_assets()
    }

    /// Returns the stored asset, or an empty one for a never-set slot.
    pub fn get_promo(&self, slot: PromoSlot) -> RepoResult<PromoAsset> {
        self.repo.get_promo(slot)
    }

    pub fn set_promo(
        &self,
        slot: PromoSlot,
        image_url: &str,
        link: &str,
    ) -> Result<PromoAsset, AssetsServiceError> {
        let image_url = image_url.trim();
        if image_url.is_empty() {
            return Err(AssetsServiceError::BlankImageUrl(slot));
        }

        let stored = self
            .repo
            .set_promo(slot, &PromoAsset::new(image_url, link.trim()))?;
        info!(
            "event=promo_set module=assets status=ok slot={} has_link={}",
            slot,
            !stored.link.is_empty()
        );
        Ok(stored)
    }

    /// Features a gallery document on the homepage.
    ///
    /// # Errors
    /// - `ContentNotFound` when `id` does not exist.
    /// - `NotAGallery` when `id` is a news or video document.
    pub fn set_featured_gallery(
        &self,
        id: ContentId,
    ) -> Result<ContentSummary, AssetsServiceError> {
        match self.repo.content_kind(id)? {
            None => return Err(AssetsServiceError::ContentNotFound(id)),
            Some(ContentKind::Gallery) => {}
            Some(kind) => return Err(AssetsServiceError::NotAGallery { id, kind }),
        }

        self.repo.set_featured_gallery(Some(id))?;
        info!("event=featured_gallery_set module=assets status=ok id={id}");
        self.repo
            .featured_gallery()?
            .ok_or(AssetsServiceError::ContentNotFound(id))
    }

    pub fn clear_featured_gallery(&self) -> RepoResult<()> {
        self.repo.set_featured_gallery(None)?;
        info!("event=featured_gallery_set module=assets status=ok id=none");
        Ok(())
    }

    pub fn featured_gallery(&self) -> RepoResult<Option<ContentSummary>> {
        self.repo.featured_gallery()
    }

    /// Appends a row to `board`; `detail` is the release date or amount.
    pub fn add_movie_entry(
        &self,
        board: MovieBoard,
        movie: &str,
        detail: &str,
        category: &str,
    ) -> Result<MovieEntry, AssetsServiceError> {
        let entry = MovieEntry {
            id: Uuid::new_v4(),
            board,
            movie: required(board, "movie", movie)?,
            detail: required(board, board.detail_name(), detail)?,
            category: required(board, "category", category)?,
        };

        self.repo.insert_movie_entry(&entry)?;
        info!(
            "event=movie_entry_add module=assets status=ok board={} id={}",
            board, entry.id
        );
        Ok(entry)
    }

    /// Rows of `board`, newest first.
    pub fn movie_entries(&self, board: MovieBoard) -> RepoResult<Vec<MovieEntry>> {
        self.repo.list_movie_entries(board)
    }

    /// Applies the non-blank fields of `patch` to one row.
    pub fn edit_movie_entry(
        &self,
        board: MovieBoard,
        id: MovieEntryId,
        patch: MovieEntryPatch,
    ) -> Result<MovieEntry, AssetsServiceError> {
        let patch = patch.normalized();
        if patch.is_empty() {
            return Err(AssetsServiceError::NothingToUpdate(board));
        }

        let mut entry = self
            .repo
            .get_movie_entry(board, id)?
            .ok_or(AssetsServiceError::MovieEntryNotFound { board, id })?;
        patch.apply(&mut entry);
        if !self.repo.update_movie_entry(&entry)? {
            return Err(AssetsServiceError::MovieEntryNotFound { board, id });
        }

        info!("event=movie_entry_edit module=assets status=ok board={board} id={id}");
        Ok(entry)
    }

    pub fn delete_movie_entry(
        &self,
        board: MovieBoard,
        id: MovieEntryId,
    ) -> Result<(), AssetsServiceError> {
        if !self.repo.delete_movie_entry(board, id)? {
            warn!(
                "event=movie_entry_delete module=assets status=error board={board} error_code=not_found"
            );
            return Err(AssetsServiceError::MovieEntryNotFound { board, id });
        }
        info!("event=movie_entry_delete module=assets status=ok board={board} id={id}");
        Ok(())
    }

    /// Records an uploaded file link, keeping only the most recent ones.
    ///
    /// Returns the kept links, oldest first.
    pub fn push_file_link(&self, url: &str) -> Result<Vec<String>, AssetsServiceError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(AssetsServiceError::BlankFileLink);
        }
        let links = self.repo.push_file_link(url)?;
        info!(
            "event=file_link_push module=assets status=ok kept={}",
            links.len()
        );
        Ok(links)
    }

    pub fn file_links(&self) -> RepoResult<Vec<String>> {
        self.repo.file_links()
    }
}

fn required(
    board: MovieBoard,
    field: &'static str,
    value: &str,
) -> Result<String, AssetsServiceError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AssetsServiceError::BlankField { board, field });
    }
    Ok(value.to_string())
}
