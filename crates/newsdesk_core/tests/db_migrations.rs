use newsdesk_core::db::migrations::latest_version;
use newsdesk_core::db::{open_db, open_db_in_memory, DbError};
use newsdesk_core::{
    RepoError, SqliteContentRepository, SqliteCurationRepository, SqliteSiteAssetsRepository,
};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "content");
    assert_table_exists(&conn, "site_assets");
    assert_table_exists(&conn, "curation_entries");
    assert_table_exists(&conn, "promo_slots");
    assert_table_exists(&conn, "movie_entries");
    assert_table_exists(&conn, "file_links");
}

#[test]
fn reopening_file_database_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("newsdesk.db");

    let first = open_db(&path).unwrap();
    assert_eq!(schema_version(&first), latest_version());
    drop(first);

    let second = open_db(&path).unwrap();
    assert_eq!(schema_version(&second), latest_version());
    assert_table_exists(&second, "content");
}

#[test]
fn newer_schema_version_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    match open_db(&path).unwrap_err() {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn slug_index_is_unique_per_kind() {
    let conn = open_db_in_memory().unwrap();
    insert_raw(&conn, "news", "same-slug").unwrap();
    insert_raw(&conn, "gallery", "same-slug").unwrap();

    let err = insert_raw(&conn, "news", "same-slug").unwrap_err();
    assert!(err.to_string().contains("UNIQUE"));
}

#[test]
fn repositories_refuse_unmigrated_connections() {
    let conn = Connection::open_in_memory().unwrap();

    assert!(matches!(
        SqliteContentRepository::try_new(&conn),
        Err(RepoError::UninitializedConnection {
            actual_version: 0,
            ..
        })
    ));
    assert!(matches!(
        SqliteCurationRepository::try_new(&conn),
        Err(RepoError::UninitializedConnection { .. })
    ));
    assert!(matches!(
        SqliteSiteAssetsRepository::try_new(&conn),
        Err(RepoError::UninitializedConnection { .. })
    ));
}

fn insert_raw(conn: &Connection, kind: &str, slug: &str) -> rusqlite::Result<usize> {
    conn.execute(
        "INSERT INTO content (id, kind, slug, title, category)
         VALUES (?1, ?2, ?3, 'title', 'politics');",
        [uuid::Uuid::new_v4().to_string().as_str(), kind, slug],
    )
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
