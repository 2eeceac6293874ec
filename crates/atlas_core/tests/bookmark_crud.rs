use atlas_core::db::open_db_in_memory;
use atlas_core::{
    Bookmark, BookmarkDraft, BookmarkPatch, BookmarkRepository, BookmarkService,
    BookmarkServiceError, BookmarkValidationError, NewBookmark, RepoError,
    SqliteBookmarkRepository,
};
use rusqlite::params;
use uuid::Uuid;

fn draft(url: &str, title: &str) -> BookmarkDraft {
    BookmarkDraft::new(url, title)
}

#[test]
fn create_and_get_roundtrip() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteBookmarkRepository::new(&mut conn);
    let service = BookmarkService::new(repo);

    let mut input = draft("https://example.com/article", "Example");
    input.tags = vec!["research".to_string(), "example".to_string()];
    input.description = Some("worth keeping".to_string());

    let (created, was_created) = service.create_bookmark(&input).unwrap();
    assert!(was_created);
    assert_eq!(created.url, "https://example.com/article");
    assert_eq!(created.normalized_url, "https://example.com/article");
    assert_eq!(created.tags, "example,research");
    assert!(created.created_at > 0);

    let loaded = service.get_bookmark(created.uuid).unwrap().unwrap();
    assert_eq!(loaded, created);
    assert_eq!(
        loaded.tag_list(),
        vec!["example".to_string(), "research".to_string()]
    );
}

#[test]
fn duplicate_create_returns_existing_first_write_wins() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteBookmarkRepository::new(&mut conn);
    let service = BookmarkService::new(repo);

    let (first, created) = service
        .create_bookmark(&draft("https://example.com", "First"))
        .unwrap();
    assert!(created);

    // Same normalized key spelled differently; no field is updated.
    let (second, created) = service
        .create_bookmark(&draft("https://EXAMPLE.com/", "Duplicate"))
        .unwrap();
    assert!(!created);
    assert_eq!(second.uuid, first.uuid);
    assert_eq!(second.title, "First");
}

#[test]
fn lookup_by_raw_url_normalizes_first() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteBookmarkRepository::new(&mut conn);
    let service = BookmarkService::new(repo);

    let (created, _) = service
        .create_bookmark(&draft("https://example.com/path", "Target"))
        .unwrap();

    let found = service
        .get_bookmark_by_url("https://WWW.example.com/path/?utm_source=mail")
        .unwrap()
        .unwrap();
    assert_eq!(found.uuid, created.uuid);

    let err = service.get_bookmark_by_url("   ").unwrap_err();
    assert!(matches!(err, BookmarkServiceError::InvalidUrl(_)));
}

#[test]
fn update_patches_only_present_fields() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteBookmarkRepository::new(&mut conn);
    let service = BookmarkService::new(repo);

    let mut input = draft("https://example.com/update", "Update Me");
    input.language = Some("en".to_string());
    let (created, _) = service.create_bookmark(&input).unwrap();

    let patch = BookmarkPatch {
        title: Some("Updated".to_string()),
        tags: Some(vec!["new".to_string(), "new".to_string()]),
        reading_time_minutes: Some(12),
        ..Default::default()
    };
    let updated = service.update_bookmark(created.uuid, &patch).unwrap();

    assert_eq!(updated.title, "Updated");
    assert_eq!(updated.tags, "new");
    assert_eq!(updated.reading_time_minutes, Some(12));
    // Untouched fields survive.
    assert_eq!(updated.language.as_deref(), Some("en"));
    assert_eq!(updated.url, created.url);
}

#[test]
fn update_url_never_refreshes_the_normalized_key() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteBookmarkRepository::new(&mut conn);
    let service = BookmarkService::new(repo);

    let (created, _) = service
        .create_bookmark(&draft("https://example.com/article", "Pinned"))
        .unwrap();

    let patch = BookmarkPatch {
        url: Some("https://example.com/moved".to_string()),
        ..Default::default()
    };
    let updated = service.update_bookmark(created.uuid, &patch).unwrap();

    assert_eq!(updated.url, "https://example.com/moved");
    assert_eq!(updated.normalized_url, created.normalized_url);

    // The frozen key still answers lookups for the original spelling.
    let found = service
        .get_bookmark_by_url("https://example.com/article")
        .unwrap()
        .unwrap();
    assert_eq!(found.uuid, created.uuid);
}

#[test]
fn empty_patch_is_a_checked_no_op() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteBookmarkRepository::new(&mut conn);
    let service = BookmarkService::new(repo);

    let (created, _) = service
        .create_bookmark(&draft("https://example.com/still", "Same"))
        .unwrap();

    let unchanged = service
        .update_bookmark(created.uuid, &BookmarkPatch::default())
        .unwrap();
    assert_eq!(unchanged, created);

    let err = service
        .update_bookmark(Uuid::new_v4(), &BookmarkPatch::default())
        .unwrap_err();
    assert!(matches!(err, BookmarkServiceError::BookmarkNotFound(_)));
}

#[test]
fn update_missing_bookmark_reports_not_found() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteBookmarkRepository::new(&mut conn);
    let service = BookmarkService::new(repo);

    let patch = BookmarkPatch {
        title: Some("ghost".to_string()),
        ..Default::default()
    };
    let err = service.update_bookmark(Uuid::new_v4(), &patch).unwrap_err();
    assert!(matches!(err, BookmarkServiceError::BookmarkNotFound(_)));
}

#[test]
fn delete_removes_the_row_and_missing_delete_errors() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteBookmarkRepository::new(&mut conn);
    let service = BookmarkService::new(repo);

    let (created, _) = service
        .create_bookmark(&draft("https://example.com/gone", "Gone"))
        .unwrap();

    service.delete_bookmark(created.uuid).unwrap();
    assert!(service.get_bookmark(created.uuid).unwrap().is_none());

    let err = service.delete_bookmark(created.uuid).unwrap_err();
    assert!(matches!(err, BookmarkServiceError::BookmarkNotFound(_)));

    // A deleted key frees the slot for a fresh create.
    let (recreated, created_again) = service
        .create_bookmark(&draft("https://example.com/gone", "Back"))
        .unwrap();
    assert!(created_again);
    assert_ne!(recreated.uuid, created.uuid);
}

#[test]
fn list_orders_newest_first_with_pagination() {
    let mut conn = open_db_in_memory().unwrap();
    let ids: Vec<_> = {
        let repo = SqliteBookmarkRepository::new(&mut conn);
        let service = BookmarkService::new(repo);
        (0..3)
            .map(|idx| {
                let (created, _) = service
                    .create_bookmark(&draft(
                        &format!("https://example.com/{idx}"),
                        &format!("entry {idx}"),
                    ))
                    .unwrap();
                created.uuid
            })
            .collect()
    };

    // Pin distinct creation times so ordering is observable.
    for (idx, id) in ids.iter().enumerate() {
        conn.execute(
            "UPDATE bookmarks SET created_at = ?1 WHERE uuid = ?2;",
            params![1_000 * (idx as i64 + 1), id.to_string()],
        )
        .unwrap();
    }

    let repo = SqliteBookmarkRepository::new(&mut conn);
    let service = BookmarkService::new(repo);

    let all = service.list_bookmarks(None, 0).unwrap();
    assert_eq!(all.applied_limit, 100);
    let listed: Vec<_> = all.items.iter().map(|b: &Bookmark| b.uuid).collect();
    assert_eq!(listed, vec![ids[2], ids[1], ids[0]]);

    let page = service.list_bookmarks(Some(1), 1).unwrap();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].uuid, ids[1]);

    let capped = service.list_bookmarks(Some(9_999), 0).unwrap();
    assert_eq!(capped.applied_limit, 500);
}

#[test]
fn bookmarks_round_trip_through_json() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteBookmarkRepository::new(&mut conn);
    let service = BookmarkService::new(repo);

    let mut input = draft("https://example.com/json", "Serialized");
    input.tags = vec!["io".to_string()];
    let (created, _) = service.create_bookmark(&input).unwrap();

    let encoded = serde_json::to_string(&created).unwrap();
    let decoded: Bookmark = serde_json::from_str(&encoded).unwrap();
    assert_eq!(decoded, created);
}

#[test]
fn repository_rejects_blank_titles_before_sql() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteBookmarkRepository::new(&mut conn);

    let mut new = NewBookmark::from_draft(&draft("https://example.com/v", "ok")).unwrap();
    new.title = "   ".to_string();

    let err = repo.upsert_if_new(&new).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(BookmarkValidationError::BlankTitle)
    ));
}

#[test]
fn constraint_violations_outside_the_upsert_key_surface_as_conflict() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteBookmarkRepository::new(&mut conn);

    let first = NewBookmark::from_draft(&draft("https://example.com/a", "A")).unwrap();
    repo.upsert_if_new(&first).unwrap();

    // Same primary key, different normalized URL: the DO NOTHING clause
    // does not cover this, so the PK violation must surface.
    let mut second = NewBookmark::from_draft(&draft("https://example.com/b", "B")).unwrap();
    second.uuid = first.uuid;

    let err = repo.upsert_if_new(&second).unwrap_err();
    assert!(matches!(err, RepoError::Conflict(_)));
}
