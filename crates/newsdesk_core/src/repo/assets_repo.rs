//! Site assets singleton repository.
//!
//! # Responsibility
//! - Find-or-create the singleton `site_assets` row through one explicit
//!   upsert instead of ad hoc existence checks in callers.
//! - Persist poster and ad placements (`promo_slots`), the featured gallery,
//!   movie boards (`movie_entries`) and recent file links (`file_links`).
//!
//! # Invariants
//! - At most one `site_assets` row exists (`id = 1`, enforced by CHECK).
//! - Reading a never-written promo slot yields an empty asset, not an error.
//! - A featured gallery that no longer resolves to a gallery reads as `None`.
//! - Board reads are newest first; file links are oldest first and capped at
//!   `FILE_LINKS_KEEP`.

use crate::model::assets::{
    MovieBoard, MovieEntry, MovieEntryId, PromoAsset, PromoSlot, FILE_LINKS_KEEP,
};
use crate::model::content::{ContentId, ContentKind, ContentSummary};
use crate::repo::content_repo::{parse_content_id, parse_kind, RepoError, RepoResult};
use crate::repo::curation_repo::{parse_summary, CONTENT_SUMMARY_COLUMNS};
use crate::repo::ensure_schema_ready;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};

const SITE_ASSETS_ID: i64 = 1;
const SITE_ASSETS_COLUMNS: &[&str] = &["id", "created_at", "updated_at", "featured_gallery_id"];
const PROMO_SLOT_COLUMNS: &[&str] = &["slot", "image_url", "link", "updated_at"];
const MOVIE_ENTRY_COLUMNS: &[&str] = &["seq", "id", "board", "movie", "detail", "category"];
const FILE_LINK_COLUMNS: &[&str] = &["seq", "url"];

/// Timestamps of the singleton aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SiteAssetsMeta {
    pub created_at: i64,
    pub updated_at: i64,
}

/// Repository interface for the site assets aggregate.
pub trait SiteAssetsRepository {
    /// Creates the singleton when missing and returns its timestamps.
    fn ensure_site_assets(&self) -> RepoResult<SiteAssetsMeta>;
    fn get_promo(&self, slot: PromoSlot) -> RepoResult<PromoAsset>;
    /// Replaces one slot and returns the stored value.
    fn set_promo(&self, slot: PromoSlot, asset: &PromoAsset) -> RepoResult<PromoAsset>;

    /// Kind of a stored document, used to vet featured references.
    fn content_kind(&self, id: ContentId) -> RepoResult<Option<ContentKind>>;
    /// Stores or clears the featured gallery reference.
    fn set_featured_gallery(&self, id: Option<ContentId>) -> RepoResult<()>;
    fn featured_gallery(&self) -> RepoResult<Option<ContentSummary>>;

    fn insert_movie_entry(&self, entry: &MovieEntry) -> RepoResult<()>;
    /// Newest first.
    fn list_movie_entries(&self, board: MovieBoard) -> RepoResult<Vec<MovieEntry>>;
    fn get_movie_entry(
        &self,
        board: MovieBoard,
        id: MovieEntryId,
    ) -> RepoResult<Option<MovieEntry>>;
    /// Returns `false` when no row of `entry.board` has `entry.id`.
    fn update_movie_entry(&self, entry: &MovieEntry) -> RepoResult<bool>;
    /// Returns `false` when no row matched.
    fn delete_movie_entry(&self, board: MovieBoard, id: MovieEntryId) -> RepoResult<bool>;

    /// Appends a link and drops all but the newest `FILE_LINKS_KEEP`.
    fn push_file_link(&self, url: &str) -> RepoResult<Vec<String>>;
    /// Oldest first.
    fn file_links(&self) -> RepoResult<Vec<String>>;
}

/// SQLite-backed site assets repository.
pub struct SqliteSiteAssetsRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSiteAssetsRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_ready(
            conn,
            &[
                ("site_assets", SITE_ASSETS_COLUMNS),
                ("promo_slots", PROMO_SLOT_COLUMNS),
                ("movie_entries", MOVIE_ENTRY_COLUMNS),
                ("file_links", FILE_LINK_COLUMNS),
                ("content", CONTENT_SUMMARY_COLUMNS),
            ],
        )?;
        Ok(Self { conn })
    }
}

impl SiteAssetsRepository for SqliteSiteAssetsRepository<'_> {
    fn ensure_site_assets(&self) -> RepoResult<SiteAssetsMeta> {
        self.conn.execute(
            "INSERT OR IGNORE INTO site_assets (id) VALUES (?1);",
            [SITE_ASSETS_ID],
        )?;
        let meta = self.conn.query_row(
            "SELECT created_at, updated_at FROM site_assets WHERE id = ?1;",
            [SITE_ASSETS_ID],
            |row| {
                Ok(SiteAssetsMeta {
                    created_at: row.get(0)?,
                    updated_at: row.get(1)?,
                })
            },
        )?;
        Ok(meta)
    }

    fn get_promo(&self, slot: PromoSlot) -> RepoResult<PromoAsset> {
        let stored = self
            .conn
            .query_row(
                "SELECT image_url, link, updated_at FROM promo_slots WHERE slot = ?1;",
                [slot.as_str()],
                |row| {
                    Ok(PromoAsset {
                        image_url: row.get(0)?,
                        link: row.get(1)?,
                        updated_at: Some(row.get(2)?),
                    })
                },
            )
            .optional()?;
        Ok(stored.unwrap_or_default())
    }

    fn set_promo(&self, slot: PromoSlot, asset: &PromoAsset) -> RepoResult<PromoAsset> {
        touch_site_assets(self.conn)?;
        self.conn.execute(
            "INSERT INTO promo_slots (slot, image_url, link)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(slot) DO UPDATE SET
                image_url = excluded.image_url,
                link = excluded.link,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![slot.as_str(), asset.image_url.as_str(), asset.link.as_str()],
        )?;
        self.get_promo(slot)
    }

    fn content_kind(&self, id: ContentId) -> RepoResult<Option<ContentKind>> {
        let kind: Option<String> = self
            .conn
            .query_row(
                "SELECT kind FROM content WHERE id = ?1;",
                [id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        kind.as_deref().map(parse_kind).transpose()
    }

    fn set_featured_gallery(&self, id: Option<ContentId>) -> RepoResult<()> {
        touch_site_assets(self.conn)?;
        self.conn.execute(
            "UPDATE site_assets SET featured_gallery_id = ?1 WHERE id = ?2;",
            params![id.map(|id| id.to_string()), SITE_ASSETS_ID],
        )?;
        Ok(())
    }

    fn featured_gallery(&self) -> RepoResult<Option<ContentSummary>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                c.id AS id,
                c.kind AS kind,
                c.slug AS slug,
                c.title AS title,
                c.posted_by AS posted_by,
                c.main_url AS main_url
             FROM site_assets a
             INNER JOIN content c ON c.id = a.featured_gallery_id
             WHERE a.id = ?1 AND c.kind = 'gallery';",
        )?;
        let mut rows = stmt.query([SITE_ASSETS_ID])?;
        let found = match rows.next()? {
            Some(row) => Some(parse_summary(row)?),
            None => None,
        };
        Ok(found)
    }

    fn insert_movie_entry(&self, entry: &MovieEntry) -> RepoResult<()> {
        touch_site_assets(self.conn)?;
        self.conn.execute(
            "INSERT INTO movie_entries (id, board, movie, detail, category)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                entry.id.to_string(),
                entry.board.as_str(),
                entry.movie.as_str(),
                entry.detail.as_str(),
                entry.category.as_str()
            ],
        )?;
        Ok(())
    }

    fn list_movie_entries(&self, board: MovieBoard) -> RepoResult<Vec<MovieEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, board, movie, detail, category
             FROM movie_entries
             WHERE board = ?1
             ORDER BY seq DESC;",
        )?;
        let mut rows = stmt.query([board.as_str()])?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            entries.push(parse_movie_entry(row)?);
        }
        Ok(entries)
    }

    fn get_movie_entry(
        &self,
        board: MovieBoard,
        id: MovieEntryId,
    ) -> RepoResult<Option<MovieEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, board, movie, detail, category
             FROM movie_entries
             WHERE board = ?1 AND id = ?2;",
        )?;
        let mut rows = stmt.query(params![board.as_str(), id.to_string()])?;
        let found = match rows.next()? {
            Some(row) => Some(parse_movie_entry(row)?),
            None => None,
        };
        Ok(found)
    }

    fn update_movie_entry(&self, entry: &MovieEntry) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "UPDATE movie_entries
             SET movie = ?1, detail = ?2, category = ?3
             WHERE board = ?4 AND id = ?5;",
            params![
                entry.movie.as_str(),
                entry.detail.as_str(),
                entry.category.as_str(),
                entry.board.as_str(),
                entry.id.to_string()
            ],
        )?;
        if changed > 0 {
            touch_site_assets(self.conn)?;
        }
        Ok(changed > 0)
    }

    fn delete_movie_entry(&self, board: MovieBoard, id: MovieEntryId) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "DELETE FROM movie_entries WHERE board = ?1 AND id = ?2;",
            params![board.as_str(), id.to_string()],
        )?;
        if changed > 0 {
            touch_site_assets(self.conn)?;
        }
        Ok(changed > 0)
    }

    fn push_file_link(&self, url: &str) -> RepoResult<Vec<String>> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        touch_site_assets(&tx)?;
        tx.execute("INSERT INTO file_links (url) VALUES (?1);", [url])?;
        tx.execute(
            "DELETE FROM file_links
             WHERE seq NOT IN (
                SELECT seq FROM file_links ORDER BY seq DESC LIMIT ?1
             );",
            [FILE_LINKS_KEEP as i64],
        )?;
        tx.commit()?;
        self.file_links()
    }

    fn file_links(&self) -> RepoResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT url FROM file_links ORDER BY seq ASC;")?;
        let links = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(links)
    }
}

/// Upserts the singleton row and bumps its `updated_at`.
///
/// Curation writes call this inside their own transaction.
pub(crate) fn touch_site_assets(conn: &Connection) -> RepoResult<()> {
    conn.execute(
        "INSERT INTO site_assets (id) VALUES (?1)
         ON CONFLICT(id) DO UPDATE SET
            updated_at = (strftime('%s', 'now') * 1000);",
        [SITE_ASSETS_ID],
    )?;
    Ok(())
}

fn parse_movie_entry(row: &Row<'_>) -> RepoResult<MovieEntry> {
    let id_text: String = row.get("id")?;
    let board_text: String = row.get("board")?;
    let board = board_text.parse::<MovieBoard>().map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid board `{board_text}` in movie_entries.board"
        ))
    })?;
    Ok(MovieEntry {
        id: parse_content_id(&id_text, "movie_entries.id")?,
        board,
        movie: row.get("movie")?,
        detail: row.get("detail")?,
        category: row.get("category")?,
    })
}
