//! Curation list repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Replace one curation list wholesale in a single transaction.
//! - Read lists in position order, resolved to content summaries.
//! - Purge a deleted document's references from every list, atomically with
//!   the content row delete.
//!
//! # Invariants
//! - Stored pairs are only ever written by `replace_entries`; there is no
//!   partial update path.
//! - Reads are ordered `position ASC`.
//! - Resolved reads drop pairs whose content no longer exists.
//! - Cardinality and position policy belong to callers; this layer stores
//!   any array of pairs that fits the `(list, position)` key.

use crate::model::content::{ContentId, ContentSummary};
use crate::model::curation::{CuratedItem, CurationEntry, CurationList};
use crate::repo::assets_repo::touch_site_assets;
use crate::repo::content_repo::{parse_content_id, parse_kind, RepoError, RepoResult};
use crate::repo::ensure_schema_ready;
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};

const CURATION_COLUMNS: &[&str] = &["assets_id", "list_name", "position", "content_id"];
const SITE_ASSETS_COLUMNS: &[&str] = &["id", "featured_gallery_id"];
pub(crate) const CONTENT_SUMMARY_COLUMNS: &[&str] =
    &["id", "kind", "slug", "title", "posted_by", "main_url"];

/// Repository interface for curation lists.
pub trait CurationRepository {
    /// Atomically replaces every pair of `list` with `entries`.
    fn replace_entries(&self, list: CurationList, entries: &[CurationEntry]) -> RepoResult<()>;
    /// Returns stored pairs, dangling ones included, ascending by position.
    fn list_entries(&self, list: CurationList) -> RepoResult<Vec<CurationEntry>>;
    /// Returns live pairs resolved to content summaries, ascending by position.
    fn read_list(&self, list: CurationList) -> RepoResult<Vec<CuratedItem>>;
    /// Removes every pair referencing `content_id` across all lists.
    ///
    /// Returns the number of removed pairs.
    fn purge_reference(&self, content_id: ContentId) -> RepoResult<usize>;
    /// Names the lists that currently reference `content_id`.
    fn lists_referencing(&self, content_id: ContentId) -> RepoResult<Vec<CurationList>>;
    /// Runs `delete` and the purge of `content_id` in one IMMEDIATE
    /// transaction.
    ///
    /// `delete` must write through the same connection. Any error rolls back
    /// both the delete and the purge.
    fn delete_with_purge<F>(&self, content_id: ContentId, delete: F) -> RepoResult<PurgeReport>
    where
        F: FnOnce() -> RepoResult<()>;
}

/// What a purge removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PurgeReport {
    /// Lists that referenced the content, by storage name.
    pub lists: Vec<CurationList>,
    pub entries: usize,
    pub cleared_featured_gallery: bool,
}

/// SQLite-backed curation repository.
pub struct SqliteCurationRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCurationRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_ready(
            conn,
            &[
                ("site_assets", SITE_ASSETS_COLUMNS),
                ("curation_entries", CURATION_COLUMNS),
                ("content", CONTENT_SUMMARY_COLUMNS),
            ],
        )?;
        Ok(Self { conn })
    }
}

impl CurationRepository for SqliteCurationRepository<'_> {
    fn replace_entries(&self, list: CurationList, entries: &[CurationEntry]) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        touch_site_assets(&tx)?;

        tx.execute(
            "DELETE FROM curation_entries WHERE list_name = ?1;",
            [list.as_str()],
        )?;
        {
            let mut insert = tx.prepare(
                "INSERT INTO curation_entries (assets_id, list_name, position, content_id)
                 VALUES (1, ?1, ?2, ?3);",
            )?;
            for entry in entries {
                insert.execute(params![
                    list.as_str(),
                    entry.position,
                    entry.content_id.to_string()
                ])?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    fn list_entries(&self, list: CurationList) -> RepoResult<Vec<CurationEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT content_id, position
             FROM curation_entries
             WHERE list_name = ?1
             ORDER BY position ASC;",
        )?;
        let mut rows = stmt.query([list.as_str()])?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            let content_id: String = row.get("content_id")?;
            entries.push(CurationEntry {
                content_id: parse_content_id(&content_id, "curation_entries.content_id")?,
                position: row.get("position")?,
            });
        }
        Ok(entries)
    }

    fn read_list(&self, list: CurationList) -> RepoResult<Vec<CuratedItem>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                e.position AS position,
                c.id AS id,
                c.kind AS kind,
                c.slug AS slug,
                c.title AS title,
                c.posted_by AS posted_by,
                c.main_url AS main_url
             FROM curation_entries e
             INNER JOIN content c ON c.id = e.content_id
             WHERE e.list_name = ?1
             ORDER BY e.position ASC;",
        )?;
        let mut rows = stmt.query([list.as_str()])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(CuratedItem {
                position: row.get("position")?,
                content: parse_summary(row)?,
            });
        }
        Ok(items)
    }

    fn purge_reference(&self, content_id: ContentId) -> RepoResult<usize> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let removed = purge_entries(&tx, content_id)?;
        if removed > 0 {
            touch_site_assets(&tx)?;
        }
        tx.commit()?;
        Ok(removed)
    }

    fn lists_referencing(&self, content_id: ContentId) -> RepoResult<Vec<CurationList>> {
        lists_referencing(self.conn, content_id)
    }

    fn delete_with_purge<F>(&self, content_id: ContentId, delete: F) -> RepoResult<PurgeReport>
    where
        F: FnOnce() -> RepoResult<()>,
    {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let lists = lists_referencing(&tx, content_id)?;
        delete()?;
        let entries = purge_entries(&tx, content_id)?;
        let cleared_featured_gallery = tx.execute(
            "UPDATE site_assets SET featured_gallery_id = NULL WHERE featured_gallery_id = ?1;",
            [content_id.to_string()],
        )? > 0;
        if entries > 0 || cleared_featured_gallery {
            touch_site_assets(&tx)?;
        }
        tx.commit()?;

        Ok(PurgeReport {
            lists,
            entries,
            cleared_featured_gallery,
        })
    }
}

/// Parses a row selected with the `ContentSummary` column names.
pub(crate) fn parse_summary(row: &Row<'_>) -> RepoResult<ContentSummary> {
    let id_text: String = row.get("id")?;
    let kind_text: String = row.get("kind")?;
    Ok(ContentSummary {
        id: parse_content_id(&id_text, "content.id")?,
        kind: parse_kind(&kind_text)?,
        slug: row.get("slug")?,
        title: row.get("title")?,
        posted_by: row.get("posted_by")?,
        main_url: row.get("main_url")?,
    })
}

fn purge_entries(conn: &Connection, content_id: ContentId) -> RepoResult<usize> {
    let removed = conn.execute(
        "DELETE FROM curation_entries WHERE content_id = ?1;",
        [content_id.to_string()],
    )?;
    Ok(removed)
}

fn lists_referencing(conn: &Connection, content_id: ContentId) -> RepoResult<Vec<CurationList>> {
    let mut stmt = conn.prepare(
        "SELECT DISTINCT list_name
         FROM curation_entries
         WHERE content_id = ?1
         ORDER BY list_name ASC;",
    )?;
    let mut rows = stmt.query([content_id.to_string()])?;
    let mut lists = Vec::new();
    while let Some(row) = rows.next()? {
        let name: String = row.get(0)?;
        let list = CurationList::from_db(&name).ok_or_else(|| {
            RepoError::InvalidData(format!(
                "invalid list `{name}` in curation_entries.list_name"
            ))
        })?;
        lists.push(list);
    }
    Ok(lists)
}
