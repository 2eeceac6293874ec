use atlas_core::db::migrations::latest_version;
use atlas_core::db::{open_db, open_db_in_memory, DbError};
use rusqlite::Connection;

#[test]
fn fresh_database_is_migrated_to_latest_version() {
    let conn = open_db_in_memory().unwrap();
    let version: u32 = conn
        .query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(version, latest_version());
}

#[test]
fn reopening_an_up_to_date_database_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("atlas.sqlite3");

    {
        let conn = open_db(&path).unwrap();
        conn.execute(
            "INSERT INTO bookmarks (uuid, url, normalized_url, title)
             VALUES ('00000000-0000-0000-0000-000000000001', 'https://a', 'https://a/', 'A');",
            [],
        )
        .unwrap();
    }

    let conn = open_db(&path).unwrap();
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM bookmarks;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 1);
}

#[test]
fn newer_schema_versions_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.sqlite3");

    {
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch("PRAGMA user_version = 99;").unwrap();
    }

    let err = open_db(&path).unwrap_err();
    assert!(matches!(
        err,
        DbError::UnsupportedSchemaVersion {
            db_version: 99,
            ..
        }
    ));
}

#[test]
fn normalized_url_uniqueness_is_enforced_by_the_schema() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO bookmarks (uuid, url, normalized_url, title)
         VALUES ('00000000-0000-0000-0000-000000000001', 'https://a', 'https://a/', 'A');",
        [],
    )
    .unwrap();

    let err = conn
        .execute(
            "INSERT INTO bookmarks (uuid, url, normalized_url, title)
             VALUES ('00000000-0000-0000-0000-000000000002', 'https://A', 'https://a/', 'B');",
            [],
        )
        .unwrap_err();
    assert!(err.to_string().contains("UNIQUE"));
}

#[test]
fn timestamps_are_assigned_by_the_schema_defaults() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO bookmarks (uuid, url, normalized_url, title)
         VALUES ('00000000-0000-0000-0000-000000000003', 'https://t', 'https://t/', 'T');",
        [],
    )
    .unwrap();

    let (created_at, updated_at): (i64, i64) = conn
        .query_row(
            "SELECT created_at, updated_at FROM bookmarks
             WHERE uuid = '00000000-0000-0000-0000-000000000003';",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .unwrap();
    assert!(created_at > 0);
    assert_eq!(created_at, updated_at);
}
