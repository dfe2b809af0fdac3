//! Content repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD APIs over the `content` table for all content kinds.
//! - Answer slug existence lookups for the allocator.
//! - Translate unique-index violations into `RepoError::SlugTaken`.
//!
//! # Invariants
//! - Write paths call `ContentDocument::validate()` before SQL mutations.
//! - Read paths reject invalid persisted state instead of masking it.
//! - Delete is a hard delete; the slug becomes free immediately.

use crate::db::DbError;
use crate::model::content::{ContentDocument, ContentId, ContentKind, ContentValidationError};
use crate::repo::ensure_schema_ready;
use crate::slugs::SlugIndex;
use rusqlite::types::Value;
use rusqlite::{ffi, params, params_from_iter, Connection, ErrorCode, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const CONTENT_SELECT_SQL: &str = "SELECT
    id,
    kind,
    slug,
    title,
    description,
    category,
    sub_category,
    main_url,
    media_url,
    posted_by,
    tags_json,
    movie_rating,
    created_at,
    updated_at
FROM content";

const CONTENT_COLUMNS: &[&str] = &[
    "id",
    "kind",
    "slug",
    "title",
    "description",
    "category",
    "sub_category",
    "main_url",
    "media_url",
    "posted_by",
    "tags_json",
    "movie_rating",
    "created_at",
    "updated_at",
];

const CONTENT_DEFAULT_LIMIT: u32 = 20;
const CONTENT_LIMIT_MAX: u32 = 100;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for content, curation and assets persistence.
#[derive(Debug)]
pub enum RepoError {
    Validation(ContentValidationError),
    Db(DbError),
    NotFound(ContentId),
    /// The `(kind, slug)` unique index rejected a write.
    SlugTaken {
        kind: ContentKind,
        slug: String,
    },
    InvalidData(String),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "content not found: {id}"),
            Self::SlugTaken { kind, slug } => {
                write!(f, "slug `{slug}` is already used by another {kind} document")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "repository requires column `{column}` in table `{table}`"
            ),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ContentValidationError> for RepoError {
    fn from(value: ContentValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Query options for listing content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentListQuery {
    pub kind: Option<ContentKind>,
    /// Exact, case-insensitive category match.
    pub category: Option<String>,
    /// Exact, case-insensitive sub-category match.
    pub sub_category: Option<String>,
    /// Defaults to 20 and clamps to 100.
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Repository interface for content documents.
pub trait ContentRepository: SlugIndex {
    /// Inserts a new document. Fails with `SlugTaken` on a slug collision.
    fn create_content(&self, doc: &ContentDocument) -> RepoResult<ContentId>;
    /// Replaces all editable fields, slug included.
    fn update_content(&self, doc: &ContentDocument) -> RepoResult<()>;
    fn get_content(&self, id: ContentId) -> RepoResult<Option<ContentDocument>>;
    fn find_by_slug(&self, kind: ContentKind, slug: &str) -> RepoResult<Option<ContentDocument>>;
    /// Lists documents newest first (`created_at DESC, id ASC`).
    fn list_content(&self, query: &ContentListQuery) -> RepoResult<Vec<ContentDocument>>;
    fn delete_content(&self, id: ContentId) -> RepoResult<()>;
}

/// SQLite-backed content repository.
pub struct SqliteContentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteContentRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_ready(conn, &[("content", CONTENT_COLUMNS)])?;
        Ok(Self { conn })
    }
}

impl SlugIndex for SqliteContentRepository<'_> {
    fn slug_exists(
        &self,
        kind: ContentKind,
        slug: &str,
        exclude_id: Option<ContentId>,
    ) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM content
                WHERE kind = ?1
                  AND slug = ?2
                  AND (?3 IS NULL OR id <> ?3)
            );",
            params![kind.as_str(), slug, exclude_id.map(|id| id.to_string())],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }
}

impl ContentRepository for SqliteContentRepository<'_> {
    fn create_content(&self, doc: &ContentDocument) -> RepoResult<ContentId> {
        doc.validate()?;
        let tags_json = encode_tags(&doc.tags)?;

        self.conn
            .execute(
                "INSERT INTO content (
                    id,
                    kind,
                    slug,
                    title,
                    description,
                    category,
                    sub_category,
                    main_url,
                    media_url,
                    posted_by,
                    tags_json,
                    movie_rating
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12);",
                params![
                    doc.id.to_string(),
                    doc.kind.as_str(),
                    doc.slug.as_str(),
                    doc.title.as_str(),
                    doc.description.as_str(),
                    doc.category.as_str(),
                    doc.sub_category.as_deref(),
                    doc.main_url.as_deref(),
                    doc.media_url.as_deref(),
                    doc.posted_by.as_deref(),
                    tags_json,
                    doc.movie_rating,
                ],
            )
            .map_err(|err| map_slug_conflict(err, doc))?;

        Ok(doc.id)
    }

    fn update_content(&self, doc: &ContentDocument) -> RepoResult<()> {
        doc.validate()?;
        let tags_json = encode_tags(&doc.tags)?;

        let changed = self
            .conn
            .execute(
                "UPDATE content
                 SET
                    slug = ?2,
                    title = ?3,
                    description = ?4,
                    category = ?5,
                    sub_category = ?6,
                    main_url = ?7,
                    media_url = ?8,
                    posted_by = ?9,
                    tags_json = ?10,
                    movie_rating = ?11,
                    updated_at = (strftime('%s', 'now') * 1000)
                 WHERE id = ?1;",
                params![
                    doc.id.to_string(),
                    doc.slug.as_str(),
                    doc.title.as_str(),
                    doc.description.as_str(),
                    doc.category.as_str(),
                    doc.sub_category.as_deref(),
                    doc.main_url.as_deref(),
                    doc.media_url.as_deref(),
                    doc.posted_by.as_deref(),
                    tags_json,
                    doc.movie_rating,
                ],
            )
            .map_err(|err| map_slug_conflict(err, doc))?;

        if changed == 0 {
            return Err(RepoError::NotFound(doc.id));
        }

        Ok(())
    }

    fn get_content(&self, id: ContentId) -> RepoResult<Option<ContentDocument>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{CONTENT_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_content_row(row)?));
        }
        Ok(None)
    }

    fn find_by_slug(&self, kind: ContentKind, slug: &str) -> RepoResult<Option<ContentDocument>> {
        let mut stmt = self.conn.prepare(&format!(
            "{CONTENT_SELECT_SQL} WHERE kind = ?1 AND slug = ?2;"
        ))?;
        let mut rows = stmt.query(params![kind.as_str(), slug])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_content_row(row)?));
        }
        Ok(None)
    }

    fn list_content(&self, query: &ContentListQuery) -> RepoResult<Vec<ContentDocument>> {
        let mut sql = format!("{CONTENT_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(kind) = query.kind {
            sql.push_str(" AND kind = ?");
            bind_values.push(Value::Text(kind.as_str().to_string()));
        }
        if let Some(category) = query.category.as_ref() {
            sql.push_str(" AND category = ? COLLATE NOCASE");
            bind_values.push(Value::Text(category.trim().to_string()));
        }
        if let Some(sub_category) = query.sub_category.as_ref() {
            sql.push_str(" AND sub_category = ? COLLATE NOCASE");
            bind_values.push(Value::Text(sub_category.trim().to_string()));
        }

        sql.push_str(" ORDER BY created_at DESC, id ASC LIMIT ?");
        bind_values.push(Value::Integer(i64::from(normalize_content_limit(
            query.limit,
        ))));
        if query.offset > 0 {
            sql.push_str(" OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_content_row(row)?);
        }
        Ok(items)
    }

    fn delete_content(&self, id: ContentId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM content WHERE id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }
}

/// Normalizes list limit according to the content listing contract.
pub fn normalize_content_limit(limit: Option<u32>) -> u32 {
    match limit {
        Some(0) | None => CONTENT_DEFAULT_LIMIT,
        Some(value) if value > CONTENT_LIMIT_MAX => CONTENT_LIMIT_MAX,
        Some(value) => value,
    }
}

pub(crate) fn parse_kind(value: &str) -> RepoResult<ContentKind> {
    value
        .parse::<ContentKind>()
        .map_err(|_| RepoError::InvalidData(format!("invalid kind `{value}` in content.kind")))
}

pub(crate) fn parse_content_id(value: &str, column: &'static str) -> RepoResult<ContentId> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}

fn parse_content_row(row: &Row<'_>) -> RepoResult<ContentDocument> {
    let id_text: String = row.get("id")?;
    let kind_text: String = row.get("kind")?;
    let tags_text: String = row.get("tags_json")?;
    let tags = serde_json::from_str::<Vec<String>>(&tags_text).map_err(|err| {
        RepoError::InvalidData(format!("invalid tags in content.tags_json: {err}"))
    })?;

    let doc = ContentDocument {
        id: parse_content_id(&id_text, "content.id")?,
        kind: parse_kind(&kind_text)?,
        slug: row.get("slug")?,
        title: row.get("title")?,
        description: row.get("description")?,
        category: row.get("category")?,
        sub_category: row.get("sub_category")?,
        main_url: row.get("main_url")?,
        media_url: row.get("media_url")?,
        posted_by: row.get("posted_by")?,
        tags,
        movie_rating: row.get("movie_rating")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    };
    doc.validate()?;
    Ok(doc)
}

fn encode_tags(tags: &[String]) -> RepoResult<String> {
    serde_json::to_string(tags)
        .map_err(|err| RepoError::InvalidData(format!("tags are not encodable: {err}")))
}

fn map_slug_conflict(err: rusqlite::Error, doc: &ContentDocument) -> RepoError {
    if is_slug_unique_violation(&err) {
        return RepoError::SlugTaken {
            kind: doc.kind,
            slug: doc.slug.clone(),
        };
    }
    err.into()
}

fn is_slug_unique_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(code, message) => {
            code.code == ErrorCode::ConstraintViolation
                && code.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
                && message
                    .as_deref()
                    .is_some_and(|text| text.contains("content.slug"))
        }
        _ => false,
    }
}
