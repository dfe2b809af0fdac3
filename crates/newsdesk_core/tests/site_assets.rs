use newsdesk_core::db::open_db_in_memory;
use newsdesk_core::{
    AssetsService, AssetsServiceError, ContentKind, ContentService, MovieBoard, MovieEntryPatch,
    NewContent, PromoAsset, PromoSlot, SqliteContentRepository, SqliteCurationRepository,
    SqliteSiteAssetsRepository, FILE_LINKS_KEEP,
};
use rusqlite::Connection;
use uuid::Uuid;

fn assets_service(conn: &Connection) -> AssetsService<SqliteSiteAssetsRepository<'_>> {
    AssetsService::new(SqliteSiteAssetsRepository::try_new(conn).unwrap())
}

fn site_assets_rows(conn: &Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM site_assets;", [], |row| row.get(0))
        .unwrap()
}

#[test]
fn ensure_site_assets_creates_singleton_once() {
    let conn = open_db_in_memory().unwrap();
    let service = assets_service(&conn);
    assert_eq!(site_assets_rows(&conn), 0);

    let first = service.ensure_site_assets().unwrap();
    let second = service.ensure_site_assets().unwrap();

    assert_eq!(site_assets_rows(&conn), 1);
    assert_eq!(first.created_at, second.created_at);
}

#[test]
fn singleton_rejects_second_row() {
    let conn = open_db_in_memory().unwrap();
    assets_service(&conn).ensure_site_assets().unwrap();

    let err = conn
        .execute("INSERT INTO site_assets (id) VALUES (2);", [])
        .unwrap_err();
    assert!(err.to_string().contains("CHECK"));
}

#[test]
fn unset_promo_reads_as_empty() {
    let conn = open_db_in_memory().unwrap();
    let asset = assets_service(&conn).get_promo(PromoSlot::NavbarAd).unwrap();

    assert!(asset.is_empty());
    assert_eq!(asset, PromoAsset::default());
}

#[test]
fn set_promo_trims_and_replaces() {
    let conn = open_db_in_memory().unwrap();
    let service = assets_service(&conn);

    let stored = service
        .set_promo(
            PromoSlot::PopupPoster,
            "  https://cdn.example.com/poster.jpg ",
            " https://example.com/offer ",
        )
        .unwrap();
    assert_eq!(stored.image_url, "https://cdn.example.com/poster.jpg");
    assert_eq!(stored.link, "https://example.com/offer");
    assert!(stored.updated_at.is_some());
    assert_eq!(site_assets_rows(&conn), 1);

    service
        .set_promo(PromoSlot::PopupPoster, "https://cdn.example.com/v2.jpg", "")
        .unwrap();
    let reloaded = service.get_promo(PromoSlot::PopupPoster).unwrap();
    assert_eq!(reloaded.image_url, "https://cdn.example.com/v2.jpg");
    assert!(reloaded.link.is_empty());

    assert!(service.get_promo(PromoSlot::MoviePoster).unwrap().is_empty());
}

#[test]
fn blank_image_url_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let service = assets_service(&conn);

    let err = service
        .set_promo(PromoSlot::HomeLongAd, "   ", "https://example.com")
        .unwrap_err();
    assert!(matches!(
        err,
        AssetsServiceError::BlankImageUrl(PromoSlot::HomeLongAd)
    ));
    assert!(service.get_promo(PromoSlot::HomeLongAd).unwrap().is_empty());
}

fn content_service(
    conn: &Connection,
) -> ContentService<SqliteContentRepository<'_>, SqliteCurationRepository<'_>> {
    ContentService::new(
        SqliteContentRepository::try_new(conn).unwrap(),
        SqliteCurationRepository::try_new(conn).unwrap(),
    )
}

#[test]
fn featured_gallery_accepts_only_galleries() {
    let conn = open_db_in_memory().unwrap();
    let content = content_service(&conn);
    let service = assets_service(&conn);
    let gallery = content
        .create(NewContent::new(ContentKind::Gallery, "Audio Launch", "events").with_description("x"))
        .unwrap();
    let article = content
        .create(NewContent::new(ContentKind::News, "Audio Launch", "movies").with_description("x"))
        .unwrap();

    assert!(service.featured_gallery().unwrap().is_none());

    let featured = service.set_featured_gallery(gallery.id).unwrap();
    assert_eq!(featured, gallery.summary());
    assert_eq!(service.featured_gallery().unwrap(), Some(gallery.summary()));

    assert!(matches!(
        service.set_featured_gallery(article.id).unwrap_err(),
        AssetsServiceError::NotAGallery { kind: ContentKind::News, .. }
    ));
    let missing = Uuid::new_v4();
    assert!(matches!(
        service.set_featured_gallery(missing).unwrap_err(),
        AssetsServiceError::ContentNotFound(id) if id == missing
    ));
    assert_eq!(
        service.featured_gallery().unwrap().map(|summary| summary.id),
        Some(gallery.id)
    );

    service.clear_featured_gallery().unwrap();
    assert!(service.featured_gallery().unwrap().is_none());
}

#[test]
fn deleting_featured_gallery_clears_reference() {
    let conn = open_db_in_memory().unwrap();
    let content = content_service(&conn);
    let service = assets_service(&conn);
    let gallery = content
        .create(NewContent::new(ContentKind::Gallery, "Stills", "movies").with_description("x"))
        .unwrap();
    service.set_featured_gallery(gallery.id).unwrap();

    let outcome = content.delete(gallery.id).unwrap();
    assert!(outcome.cleared_featured_gallery);
    assert_eq!(outcome.purged_entries, 0);
    assert!(service.featured_gallery().unwrap().is_none());

    let stored: Option<String> = conn
        .query_row("SELECT featured_gallery_id FROM site_assets;", [], |row| row.get(0))
        .unwrap();
    assert!(stored.is_none());
}

#[test]
fn movie_boards_list_newest_first_and_stay_separate() {
    let conn = open_db_in_memory().unwrap();
    let service = assets_service(&conn);

    let first = service
        .add_movie_entry(MovieBoard::Releases, " Devara ", "Sep 27", "telugu")
        .unwrap();
    let second = service
        .add_movie_entry(MovieBoard::Releases, "Pushpa 2", "Dec 5", "telugu")
        .unwrap();
    service
        .add_movie_entry(MovieBoard::Collections, "Kalki", "1000 Cr", "worldwide")
        .unwrap();

    let releases = service.movie_entries(MovieBoard::Releases).unwrap();
    let ids: Vec<Uuid> = releases.iter().map(|entry| entry.id).collect();
    assert_eq!(ids, vec![second.id, first.id]);
    assert_eq!(releases[1].movie, "Devara");

    let collections = service.movie_entries(MovieBoard::Collections).unwrap();
    assert_eq!(collections.len(), 1);
    assert_eq!(collections[0].detail, "1000 Cr");
}

#[test]
fn movie_entry_requires_every_field() {
    let conn = open_db_in_memory().unwrap();
    let service = assets_service(&conn);

    assert!(matches!(
        service
            .add_movie_entry(MovieBoard::Collections, "Kalki", " ", "worldwide")
            .unwrap_err(),
        AssetsServiceError::BlankField {
            board: MovieBoard::Collections,
            field: "amount"
        }
    ));
    assert!(matches!(
        service
            .add_movie_entry(MovieBoard::Releases, "", "Jan 1", "telugu")
            .unwrap_err(),
        AssetsServiceError::BlankField { field: "movie", .. }
    ));
    assert!(service.movie_entries(MovieBoard::Releases).unwrap().is_empty());
}

#[test]
fn movie_entry_edit_applies_non_blank_fields() {
    let conn = open_db_in_memory().unwrap();
    let service = assets_service(&conn);
    let entry = service
        .add_movie_entry(MovieBoard::Releases, "Game Changer", "TBA", "telugu")
        .unwrap();

    let edited = service
        .edit_movie_entry(
            MovieBoard::Releases,
            entry.id,
            MovieEntryPatch {
                movie: Some(" ".to_string()),
                detail: Some("Jan 10".to_string()),
                category: None,
            },
        )
        .unwrap();
    assert_eq!(edited.movie, "Game Changer");
    assert_eq!(edited.detail, "Jan 10");
    assert_eq!(
        service.movie_entries(MovieBoard::Releases).unwrap(),
        vec![edited]
    );

    assert!(matches!(
        service
            .edit_movie_entry(MovieBoard::Releases, entry.id, MovieEntryPatch::default())
            .unwrap_err(),
        AssetsServiceError::NothingToUpdate(MovieBoard::Releases)
    ));

    let patch = MovieEntryPatch {
        movie: Some("Other".to_string()),
        ..MovieEntryPatch::default()
    };
    assert!(matches!(
        service
            .edit_movie_entry(MovieBoard::Collections, entry.id, patch)
            .unwrap_err(),
        AssetsServiceError::MovieEntryNotFound {
            board: MovieBoard::Collections,
            ..
        }
    ));
}

#[test]
fn movie_entry_delete_reports_missing_rows() {
    let conn = open_db_in_memory().unwrap();
    let service = assets_service(&conn);
    let entry = service
        .add_movie_entry(MovieBoard::Collections, "Salaar", "700 Cr", "worldwide")
        .unwrap();

    service
        .delete_movie_entry(MovieBoard::Collections, entry.id)
        .unwrap();
    assert!(service.movie_entries(MovieBoard::Collections).unwrap().is_empty());

    assert!(matches!(
        service
            .delete_movie_entry(MovieBoard::Collections, entry.id)
            .unwrap_err(),
        AssetsServiceError::MovieEntryNotFound { id, .. } if id == entry.id
    ));
}

#[test]
fn file_links_keep_only_most_recent() {
    let conn = open_db_in_memory().unwrap();
    let service = assets_service(&conn);
    assert!(service.file_links().unwrap().is_empty());

    for index in 1..=12 {
        let links = service
            .push_file_link(&format!(" https://files.example.com/{index}.pdf "))
            .unwrap();
        assert_eq!(links.len(), index.min(FILE_LINKS_KEEP));
    }

    let links = service.file_links().unwrap();
    assert_eq!(links.len(), FILE_LINKS_KEEP);
    assert_eq!(links.first().unwrap(), "https://files.example.com/3.pdf");
    assert_eq!(links.last().unwrap(), "https://files.example.com/12.pdf");

    assert!(matches!(
        service.push_file_link("   ").unwrap_err(),
        AssetsServiceError::BlankFileLink
    ));
}
