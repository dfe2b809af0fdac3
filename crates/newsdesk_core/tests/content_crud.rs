use newsdesk_core::db::open_db_in_memory;
use newsdesk_core::{
    ContentDocument, ContentEdit, ContentKind, ContentListQuery, ContentRepository, ContentService,
    ContentServiceError, ContentValidationError, NewContent, RepoError, SqliteContentRepository,
    SqliteCurationRepository,
};
use rusqlite::Connection;
use uuid::Uuid;

fn service(
    conn: &Connection,
) -> ContentService<SqliteContentRepository<'_>, SqliteCurationRepository<'_>> {
    ContentService::new(
        SqliteContentRepository::try_new(conn).unwrap(),
        SqliteCurationRepository::try_new(conn).unwrap(),
    )
}

fn set_created_at(conn: &Connection, id: Uuid, created_at: i64) {
    conn.execute(
        "UPDATE content SET created_at = ?1 WHERE id = ?2;",
        rusqlite::params![created_at, id.to_string()],
    )
    .unwrap();
}

#[test]
fn create_and_get_roundtrip() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let mut input = NewContent::new(ContentKind::News, "  Review: Salaar  ", " Movies ")
        .with_description("A loud action film.")
        .with_tags(["Prabhas", " action ", "prabhas", ""]);
    input.sub_category = Some(" reviews ".to_string());
    input.posted_by = Some("desk".to_string());
    input.main_url = Some("https://cdn.example.com/salaar.jpg".to_string());
    input.movie_rating = Some(3);

    let created = service.create(input).unwrap();
    let loaded = service.get(created.id).unwrap().unwrap();

    assert_eq!(loaded, created);
    assert_eq!(loaded.title, "Review: Salaar");
    assert_eq!(loaded.slug, "review-salaar");
    assert_eq!(loaded.category, "Movies");
    assert_eq!(loaded.sub_category.as_deref(), Some("reviews"));
    assert_eq!(loaded.tags, vec!["action".to_string(), "prabhas".to_string()]);
    assert_eq!(loaded.movie_rating, Some(3));
    assert!(loaded.created_at > 0);
}

#[test]
fn find_by_slug_is_scoped_to_kind() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let doc = service
        .create(NewContent::new(ContentKind::Gallery, "Red Carpet", "events").with_description("x"))
        .unwrap();

    assert_eq!(
        service
            .get_by_slug(ContentKind::Gallery, " red-carpet ")
            .unwrap()
            .map(|found| found.id),
        Some(doc.id)
    );
    assert!(service
        .get_by_slug(ContentKind::News, "red-carpet")
        .unwrap()
        .is_none());
}

#[test]
fn validation_rules_reject_incomplete_input() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let err = service
        .create(NewContent::new(ContentKind::News, "Headline", "politics"))
        .unwrap_err();
    assert!(matches!(
        err,
        ContentServiceError::Validation(ContentValidationError::BlankDescription(
            ContentKind::News
        ))
    ));

    let err = service
        .create(NewContent::new(ContentKind::Gallery, "Stills", " ").with_description("x"))
        .unwrap_err();
    assert!(matches!(
        err,
        ContentServiceError::Validation(ContentValidationError::BlankCategory)
    ));

    let mut rated = NewContent::new(ContentKind::News, "Review", "movies").with_description("x");
    rated.movie_rating = Some(9);
    assert!(matches!(
        service.create(rated).unwrap_err(),
        ContentServiceError::Validation(ContentValidationError::MovieRatingOutOfRange(9))
    ));

    let mut rated_video = NewContent::new(ContentKind::Video, "Trailer", "");
    rated_video.movie_rating = Some(4);
    assert!(matches!(
        service.create(rated_video).unwrap_err(),
        ContentServiceError::Validation(ContentValidationError::MovieRatingNotApplicable(
            ContentKind::Video
        ))
    ));
}

#[test]
fn edit_replaces_editable_fields() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let doc = service
        .create(
            NewContent::new(ContentKind::News, "Budget Session", "politics")
                .with_description("draft")
                .with_tags(["budget"]),
        )
        .unwrap();

    let edit = ContentEdit {
        title: "Budget Session Ends".to_string(),
        description: "final".to_string(),
        category: "economy".to_string(),
        sub_category: Some("national".to_string()),
        tags: vec!["Finance".to_string()],
        movie_rating: None,
    };
    let edited = service.edit(doc.id, edit).unwrap();

    assert_eq!(edited.slug, "budget-session-ends");
    assert_eq!(edited.category, "economy");
    assert_eq!(edited.tags, vec!["finance".to_string()]);
    assert_eq!(edited.created_at, doc.created_at);
    assert!(service
        .get_by_slug(ContentKind::News, "budget-session")
        .unwrap()
        .is_none());
}

#[test]
fn edit_and_delete_missing_document_return_not_found() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let missing = Uuid::new_v4();

    assert!(matches!(
        service.edit(missing, ContentEdit::default()).unwrap_err(),
        ContentServiceError::NotFound(id) if id == missing
    ));
    assert!(matches!(
        service.delete(missing).unwrap_err(),
        ContentServiceError::NotFound(id) if id == missing
    ));
}

#[test]
fn list_orders_newest_first_and_filters() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let older = service
        .create(NewContent::new(ContentKind::News, "Older", "Politics").with_description("x"))
        .unwrap();
    let newer = service
        .create(NewContent::new(ContentKind::News, "Newer", "politics").with_description("x"))
        .unwrap();
    let gossip = service
        .create(NewContent::new(ContentKind::News, "Rumour", "gossips").with_description("x"))
        .unwrap();
    let video = service
        .create(NewContent::new(ContentKind::Video, "Clip", ""))
        .unwrap();
    set_created_at(&conn, older.id, 1_000);
    set_created_at(&conn, newer.id, 3_000);
    set_created_at(&conn, gossip.id, 2_000);
    set_created_at(&conn, video.id, 4_000);

    let news = service
        .list(&ContentListQuery {
            kind: Some(ContentKind::News),
            ..ContentListQuery::default()
        })
        .unwrap();
    let ids: Vec<Uuid> = news.items.iter().map(|doc| doc.id).collect();
    assert_eq!(ids, vec![newer.id, gossip.id, older.id]);
    assert_eq!(news.applied_limit, 20);

    let politics = service
        .list(&ContentListQuery {
            kind: Some(ContentKind::News),
            category: Some(" POLITICS ".to_string()),
            ..ContentListQuery::default()
        })
        .unwrap();
    let ids: Vec<Uuid> = politics.items.iter().map(|doc| doc.id).collect();
    assert_eq!(ids, vec![newer.id, older.id]);

    let paged = service
        .list(&ContentListQuery {
            limit: Some(1),
            offset: 1,
            ..ContentListQuery::default()
        })
        .unwrap();
    assert_eq!(paged.items.len(), 1);
    assert_eq!(paged.items[0].id, newer.id);

    let clamped = service
        .list(&ContentListQuery {
            limit: Some(5_000),
            ..ContentListQuery::default()
        })
        .unwrap();
    assert_eq!(clamped.applied_limit, 100);
}

#[test]
fn repository_rejects_duplicate_slug_as_slug_taken() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteContentRepository::try_new(&conn).unwrap();

    let mut first = ContentDocument::new(ContentKind::News, "same-slug", "One", "politics");
    first.description = "x".to_string();
    repo.create_content(&first).unwrap();

    let mut second = ContentDocument::new(ContentKind::News, "same-slug", "Two", "politics");
    second.description = "x".to_string();
    match repo.create_content(&second).unwrap_err() {
        RepoError::SlugTaken { kind, slug } => {
            assert_eq!(kind, ContentKind::News);
            assert_eq!(slug, "same-slug");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn repository_rejects_malformed_slug() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteContentRepository::try_new(&conn).unwrap();

    let mut doc = ContentDocument::new(ContentKind::Video, "Not A Slug", "Clip", "videos");
    doc.description = String::new();
    assert!(matches!(
        repo.create_content(&doc).unwrap_err(),
        RepoError::Validation(ContentValidationError::InvalidSlug(_))
    ));
}

#[test]
fn file_backed_content_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("newsdesk.db");

    let id = {
        let conn = newsdesk_core::open_db(&path).unwrap();
        let created = service(&conn)
            .create(NewContent::new(ContentKind::Video, "Teaser Drop", ""))
            .unwrap();
        created.id
    };

    let conn = newsdesk_core::open_db(&path).unwrap();
    let loaded = service(&conn).get(id).unwrap().unwrap();
    assert_eq!(loaded.slug, "teaser-drop");
}
