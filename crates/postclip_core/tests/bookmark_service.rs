use postclip_core::db::open_db_in_memory;
use postclip_core::{
    BookmarkCandidate, BookmarkRepository, BookmarkService, ServiceError, ServiceProfile,
    SqliteBookmarkRepository,
};

#[test]
fn capture_scenario_create_conflict_get_remove() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBookmarkRepository::try_new(&conn).unwrap();
    let service = BookmarkService::new(repo, ServiceProfile::Capture);

    let created = service
        .create(&BookmarkCandidate::with_url("https://example.com/p/A"))
        .unwrap();
    assert!(!created.captured_at.is_empty());

    let err = service
        .create(&BookmarkCandidate::with_url("https://example.com/p/A"))
        .unwrap_err();
    match err {
        ServiceError::Conflict {
            existing: Some(existing),
        } => assert_eq!(existing.id, created.id),
        other => panic!("unexpected error: {other}"),
    }

    assert_eq!(service.get_one(created.id).unwrap(), created);
    service.remove(created.id).unwrap();
    assert!(matches!(
        service.get_one(created.id),
        Err(ServiceError::NotFound(id)) if id == created.id
    ));
    assert!(matches!(
        service.remove(created.id),
        Err(ServiceError::NotFound(_))
    ));
}

#[test]
fn conflict_ignores_differing_non_key_fields() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBookmarkRepository::try_new(&conn).unwrap();
    let service = BookmarkService::new(repo, ServiceProfile::Capture);

    let mut first = BookmarkCandidate::with_url("https://example.com/p/A");
    first.caption = Some("first".to_string());
    let created = service.create(&first).unwrap();

    let mut second = BookmarkCandidate::with_url("https://example.com/p/A");
    second.caption = Some("second".to_string());
    second.platform = Some("tiktok".to_string());
    second.media_urls = Some(vec!["x".to_string()]);
    match service.create(&second).unwrap_err() {
        ServiceError::Conflict {
            existing: Some(existing),
        } => {
            assert_eq!(existing.caption.as_deref(), Some("first"));
            assert_eq!(existing.id, created.id);
        }
        other => panic!("expected conflict with existing record, got {other}"),
    }
}

#[test]
fn capture_profile_defaults_platform_owner_and_post_id() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBookmarkRepository::try_new(&conn).unwrap();
    let service = BookmarkService::new(repo, ServiceProfile::Capture);

    let mut candidate = BookmarkCandidate::with_url("https://www.instagram.com/reel/DEF456/");
    candidate.platform = Some("   ".to_string());
    candidate.author_username = Some("testuser".to_string());
    let created = service.create(&candidate).unwrap();

    assert_eq!(created.platform, "instagram");
    assert_eq!(created.owner, "default");
    assert_eq!(created.post_id.as_deref(), Some("DEF456"));
    assert_eq!(created.author_handle.as_deref(), Some("testuser"));
}

#[test]
fn explicit_fields_win_over_derived_ones() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBookmarkRepository::try_new(&conn).unwrap();
    let service = BookmarkService::new(repo, ServiceProfile::Capture);

    let mut candidate = BookmarkCandidate::with_url("https://www.instagram.com/p/FROMURL/");
    candidate.post_id = Some("EXPLICIT".to_string());
    candidate.author_handle = Some("handle".to_string());
    candidate.author_username = Some("username".to_string());
    candidate.owner = Some("alice".to_string());
    let created = service.create(&candidate).unwrap();

    assert_eq!(created.post_id.as_deref(), Some("EXPLICIT"));
    assert_eq!(created.author_handle.as_deref(), Some("handle"));
    assert_eq!(created.owner, "alice");
}

#[test]
fn missing_url_is_invalid_input_under_every_profile() {
    for profile in [ServiceProfile::Capture, ServiceProfile::Strict] {
        let conn = open_db_in_memory().unwrap();
        let repo = SqliteBookmarkRepository::try_new(&conn).unwrap();
        let service = BookmarkService::new(repo, profile);

        for url in [None, Some(""), Some("  ")] {
            let candidate = BookmarkCandidate {
                url: url.map(str::to_string),
                platform: Some("instagram".to_string()),
                ..BookmarkCandidate::default()
            };
            let err = service.create(&candidate).unwrap_err();
            assert!(
                matches!(&err, ServiceError::InvalidInput(message) if message == "url required"),
                "{err}"
            );
        }
    }
}

#[test]
fn strict_profile_requires_platform() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBookmarkRepository::try_new(&conn).unwrap();
    let service = BookmarkService::new(repo, ServiceProfile::Strict);
    assert_eq!(service.profile(), ServiceProfile::Strict);

    let err = service
        .create(&BookmarkCandidate::with_url("https://example.com/p/A"))
        .unwrap_err();
    assert!(matches!(&err, ServiceError::InvalidInput(message) if message == "platform required"));

    let mut candidate = BookmarkCandidate::with_url("https://example.com/p/A");
    candidate.platform = Some("tiktok".to_string());
    assert_eq!(service.create(&candidate).unwrap().platform, "tiktok");
}

#[test]
fn list_applies_defaults_and_scopes_by_owner() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBookmarkRepository::try_new(&conn).unwrap();
    let service = BookmarkService::new(repo, ServiceProfile::Capture);

    let mut ids = Vec::new();
    for name in ["A", "B", "C"] {
        let candidate = BookmarkCandidate::with_url(format!("https://instagram.com/p/{name}/"));
        ids.push(service.create(&candidate).unwrap().id);
    }
    let mut other = BookmarkCandidate::with_url("https://instagram.com/p/A/");
    other.owner = Some("alice".to_string());
    service.create(&other).unwrap();

    let page = service.list(None, None, None).unwrap();
    assert_eq!(page.total, 3);
    assert_eq!(page.limit, 50);
    assert_eq!(page.offset, 0);
    let listed = page
        .records
        .iter()
        .map(|bookmark| bookmark.id)
        .collect::<Vec<_>>();
    assert_eq!(listed, vec![ids[2], ids[1], ids[0]]);

    let alice = service.list(Some("alice"), Some(0), Some(0)).unwrap();
    assert_eq!(alice.total, 1);
    assert_eq!(alice.records[0].owner, "alice");
}

#[test]
fn health_counts_default_owner_records() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBookmarkRepository::try_new(&conn).unwrap();
    let service = BookmarkService::new(repo, ServiceProfile::Capture);

    assert_eq!(service.health().unwrap().bookmarks, 0);
    service
        .create(&BookmarkCandidate::with_url("https://example.com/p/A"))
        .unwrap();
    let report = service.health().unwrap();
    assert_eq!(report.bookmarks, 1);
    assert_eq!(report.profile, ServiceProfile::Capture);
}

#[test]
fn storage_failure_maps_to_storage_unavailable() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBookmarkRepository::try_new(&conn).unwrap();
    conn.execute_batch("DROP TABLE bookmarks;").unwrap();
    let service = BookmarkService::new(repo, ServiceProfile::Capture);

    let err = service.list(None, None, None).unwrap_err();
    assert!(matches!(err, ServiceError::StorageUnavailable(_)));
    assert!(std::error::Error::source(&err).is_some());
}

#[test]
fn store_clear_resets_health_count() {
    let conn = open_db_in_memory().unwrap();
    let service = BookmarkService::new(
        SqliteBookmarkRepository::try_new(&conn).unwrap(),
        ServiceProfile::Capture,
    );
    service
        .create(&BookmarkCandidate::with_url("https://example.com/p/A"))
        .unwrap();

    let repo = SqliteBookmarkRepository::try_new(&conn).unwrap();
    assert_eq!(repo.clear().unwrap(), 1);
    assert_eq!(service.health().unwrap().bookmarks, 0);
}
