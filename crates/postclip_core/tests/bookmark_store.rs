use postclip_core::db::migrations::latest_version;
use postclip_core::db::open_db_in_memory;
use postclip_core::{
    BookmarkId, BookmarkListQuery, BookmarkRepository, NewBookmark, RepoError,
    SqliteBookmarkRepository,
};
use rusqlite::Connection;

fn new_bookmark(url: &str, owner: &str) -> NewBookmark {
    NewBookmark::new(url, "instagram", owner)
}

#[test]
fn insert_assigns_identity_and_reads_back_all_fields() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBookmarkRepository::try_new(&conn).unwrap();

    let mut bookmark = new_bookmark("https://www.instagram.com/p/ABC123/", "default");
    bookmark.post_id = Some("ABC123".to_string());
    bookmark.caption = Some("Hello world".to_string());
    bookmark.author_name = Some("Test User".to_string());
    bookmark.author_handle = Some("testuser".to_string());
    bookmark.media_type = Some("image".to_string());
    bookmark.timestamp = Some("2026-02-10T12:00:00Z".to_string());

    let created = repo.insert(&bookmark).unwrap();
    assert!(!created.captured_at.is_empty());
    assert_eq!(created.url, bookmark.url);
    assert_eq!(created.post_id.as_deref(), Some("ABC123"));
    assert_eq!(created.author_handle.as_deref(), Some("testuser"));
    assert!(created.media_urls.is_empty());

    let loaded = repo.get_by_id(created.id).unwrap().unwrap();
    assert_eq!(loaded, created);
}

#[test]
fn media_urls_round_trip_in_order_with_duplicates() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBookmarkRepository::try_new(&conn).unwrap();

    let mut bookmark = new_bookmark("https://example.com/p/MEDIA", "default");
    bookmark.media_urls = vec!["a".to_string(), "b".to_string(), "c".to_string(), "a".to_string()];
    let created = repo.insert(&bookmark).unwrap();

    let loaded = repo.get_by_id(created.id).unwrap().unwrap();
    assert_eq!(loaded.media_urls, vec!["a", "b", "c", "a"]);
}

#[test]
fn duplicate_url_for_same_owner_is_a_constraint_violation() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBookmarkRepository::try_new(&conn).unwrap();

    let first = repo
        .insert(&new_bookmark("https://example.com/p/A", "default"))
        .unwrap();

    let mut second = new_bookmark("https://example.com/p/A", "default");
    second.caption = Some("different caption".to_string());
    let err = repo.insert(&second).unwrap_err();
    match err {
        RepoError::ConstraintViolation { url, owner } => {
            assert_eq!(url, "https://example.com/p/A");
            assert_eq!(owner, "default");
        }
        other => panic!("unexpected error: {other}"),
    }

    // The original record is untouched.
    let loaded = repo.get_by_id(first.id).unwrap().unwrap();
    assert_eq!(loaded.caption, None);
    assert_eq!(repo.count("default").unwrap(), 1);
}

#[test]
fn same_url_is_independent_per_owner() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBookmarkRepository::try_new(&conn).unwrap();

    let alice = repo
        .insert(&new_bookmark("https://example.com/p/A", "alice"))
        .unwrap();
    let bob = repo
        .insert(&new_bookmark("https://example.com/p/A", "bob"))
        .unwrap();
    assert_ne!(alice.id, bob.id);

    let found = repo
        .find_by_url("https://example.com/p/A", "bob")
        .unwrap()
        .unwrap();
    assert_eq!(found.id, bob.id);
    assert!(repo
        .find_by_url("https://example.com/p/A", "carol")
        .unwrap()
        .is_none());

    let alice_page = repo.list(&BookmarkListQuery::for_owner("alice")).unwrap();
    assert_eq!(alice_page.total, 1);
    assert_eq!(alice_page.records[0].id, alice.id);
}

#[test]
fn list_orders_by_capture_time_then_id_descending() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBookmarkRepository::try_new(&conn).unwrap();

    insert_with_captured_at(&conn, "https://example.com/p/NEWEST", "2026-03-01T00:00:00.000Z");
    insert_with_captured_at(&conn, "https://example.com/p/OLDEST", "2026-01-01T00:00:00.000Z");
    insert_with_captured_at(&conn, "https://example.com/p/TIE_1", "2026-02-01T00:00:00.000Z");
    insert_with_captured_at(&conn, "https://example.com/p/TIE_2", "2026-02-01T00:00:00.000Z");

    let page = repo.list(&BookmarkListQuery::for_owner("default")).unwrap();
    let urls = page
        .records
        .iter()
        .map(|bookmark| bookmark.url.as_str())
        .collect::<Vec<_>>();
    assert_eq!(
        urls,
        vec![
            "https://example.com/p/NEWEST",
            "https://example.com/p/TIE_2",
            "https://example.com/p/TIE_1",
            "https://example.com/p/OLDEST",
        ]
    );
}

#[test]
fn list_total_is_independent_of_pagination() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBookmarkRepository::try_new(&conn).unwrap();

    let mut ids = Vec::new();
    for index in 0..5 {
        let url = format!("https://example.com/p/X{index}");
        ids.push(repo.insert(&new_bookmark(&url, "X")).unwrap().id);
    }
    repo.insert(&new_bookmark("https://example.com/p/OTHER", "Y"))
        .unwrap();

    let first = repo
        .list(&BookmarkListQuery {
            owner: "X".to_string(),
            limit: Some(2),
            offset: 0,
        })
        .unwrap();
    assert_eq!(first.records.len(), 2);
    assert_eq!(first.total, 5);
    assert_eq!(first.limit, 2);
    assert_eq!(first.records[0].id, ids[4]);

    let last = repo
        .list(&BookmarkListQuery {
            owner: "X".to_string(),
            limit: Some(2),
            offset: 4,
        })
        .unwrap();
    assert_eq!(last.records.len(), 1);
    assert_eq!(last.records[0].id, ids[0]);
    assert_eq!(last.total, 5);

    let past_end = repo
        .list(&BookmarkListQuery {
            owner: "X".to_string(),
            limit: None,
            offset: 10,
        })
        .unwrap();
    assert!(past_end.records.is_empty());
    assert_eq!(past_end.total, 5);
    assert_eq!(past_end.limit, 50);
}

#[test]
fn delete_is_idempotent_and_ids_are_not_reused() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBookmarkRepository::try_new(&conn).unwrap();

    let created = repo
        .insert(&new_bookmark("https://example.com/p/DEL", "default"))
        .unwrap();
    assert_eq!(repo.delete(created.id).unwrap(), 1);
    assert_eq!(repo.delete(created.id).unwrap(), 0);
    assert!(repo.get_by_id(created.id).unwrap().is_none());
    assert_eq!(repo.delete(BookmarkId::new(424_242)).unwrap(), 0);

    let recreated = repo
        .insert(&new_bookmark("https://example.com/p/DEL", "default"))
        .unwrap();
    assert!(recreated.id > created.id);
}

#[test]
fn clear_removes_every_owner() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBookmarkRepository::try_new(&conn).unwrap();

    repo.insert(&new_bookmark("https://example.com/p/A", "alice"))
        .unwrap();
    repo.insert(&new_bookmark("https://example.com/p/B", "bob"))
        .unwrap();

    assert_eq!(repo.clear().unwrap(), 2);
    assert_eq!(repo.count("alice").unwrap(), 0);
    assert_eq!(repo.count("bob").unwrap(), 0);
}

#[test]
fn insert_rejects_blank_required_fields() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBookmarkRepository::try_new(&conn).unwrap();

    let err = repo.insert(&new_bookmark("   ", "default")).unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));
    assert_eq!(repo.count("default").unwrap(), 0);
}

#[test]
fn undecodable_media_urls_are_reported_not_masked() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBookmarkRepository::try_new(&conn).unwrap();

    conn.execute(
        "INSERT INTO bookmarks (url, platform, owner, media_urls)
         VALUES ('https://example.com/p/BAD', 'instagram', 'default', 'not-json');",
        [],
    )
    .unwrap();

    let err = repo
        .find_by_url("https://example.com/p/BAD", "default")
        .unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(_)));
}

#[test]
fn try_new_rejects_uninitialized_connection() {
    let conn = Connection::open_in_memory().unwrap();
    let err = SqliteBookmarkRepository::try_new(&conn)
        .err()
        .expect("raw connection must be rejected");
    match err {
        RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        } => {
            assert_eq!(expected_version, latest_version());
            assert_eq!(actual_version, 0);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn try_new_rejects_missing_required_column() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(&format!(
        "CREATE TABLE bookmarks (id INTEGER PRIMARY KEY, url TEXT NOT NULL);
         PRAGMA user_version = {};",
        latest_version()
    ))
    .unwrap();

    let err = SqliteBookmarkRepository::try_new(&conn)
        .err()
        .expect("partial schema must be rejected");
    assert!(matches!(
        err,
        RepoError::MissingRequiredColumn {
            table: "bookmarks",
            column: "platform"
        }
    ));
}

fn insert_with_captured_at(conn: &Connection, url: &str, captured_at: &str) {
    conn.execute(
        "INSERT INTO bookmarks (url, platform, owner, captured_at)
         VALUES (?1, 'instagram', 'default', ?2);",
        [url, captured_at],
    )
    .unwrap();
}
