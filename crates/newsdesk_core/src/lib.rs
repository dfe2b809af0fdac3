//! Core domain logic for the newsdesk CMS.
//! This crate owns slug allocation, content storage and homepage curation.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod slugs;

pub use config::{ConfigError, CoreConfig};
pub use db::{open_db, open_db_in_memory, DbError};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::assets::{
    MovieBoard, MovieEntry, MovieEntryId, MovieEntryPatch, PromoAsset, PromoSlot, FILE_LINKS_KEEP,
};
pub use model::content::{
    ContentDocument, ContentId, ContentKind, ContentSummary, ContentValidationError,
};
pub use model::curation::{CardinalityPolicy, CuratedItem, CurationEntry, CurationList};
pub use repo::assets_repo::{SiteAssetsMeta, SiteAssetsRepository, SqliteSiteAssetsRepository};
pub use repo::content_repo::{
    ContentListQuery, ContentRepository, RepoError, RepoResult, SqliteContentRepository,
};
pub use repo::curation_repo::{CurationRepository, PurgeReport, SqliteCurationRepository};
pub use service::assets_service::{AssetsService, AssetsServiceError};
pub use service::content_service::{
    ContentEdit, ContentPolicy, ContentService, ContentServiceError, DeleteOutcome, NewContent,
};
pub use service::curation_service::{CurationService, CurationServiceError};
pub use slugs::{SlugAllocator, SlugError, SlugIndex, SlugPolicy};

pub use rusqlite::Connection;

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
