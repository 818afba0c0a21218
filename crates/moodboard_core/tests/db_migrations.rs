use moodboard_core::db::migrations::latest_version;
use moodboard_core::db::{open_db, open_db_in_memory};
use moodboard_core::repo::SchemaError;
use moodboard_core::{BoardRepoError, SqliteBoardRepository, SqliteJournalRepository};
use rusqlite::Connection;

const CORE_TABLES: [&str; 8] = [
    "users",
    "boards",
    "board_members",
    "lists",
    "tasks",
    "task_assignees",
    "journal_entries",
    "journal_shares",
];

fn table_exists(conn: &Connection, table: &str) -> bool {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1
            );",
            [table],
            |row| row.get(0),
        )
        .unwrap();
    exists == 1
}

#[test]
fn migrations_create_every_core_table() {
    let conn = open_db_in_memory().unwrap();
    for table in CORE_TABLES {
        assert!(table_exists(&conn, table), "missing table {table}");
    }

    let version: u32 = conn
        .query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(version, latest_version());
}

#[test]
fn file_backed_open_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("moodboard.sqlite3");

    let first = open_db(&path).unwrap();
    drop(first);
    let second = open_db(&path).unwrap();

    let version: u32 = second
        .query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(version, latest_version());
}

#[test]
fn repositories_reject_unmigrated_connections() {
    let conn = Connection::open_in_memory().unwrap();

    match SqliteBoardRepository::try_new(&conn) {
        Err(BoardRepoError::Schema(SchemaError::VersionMismatch {
            expected,
            actual: 0,
        })) => assert!(expected > 0),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected version mismatch"),
    }
}

#[test]
fn repositories_reject_connections_missing_required_tables() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    let result = SqliteJournalRepository::try_new(&conn);
    assert!(matches!(
        result,
        Err(moodboard_core::JournalRepoError::Schema(
            SchemaError::MissingTable(_)
        ))
    ));
}

#[test]
fn store_rejects_one_sided_mood_signals() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO users (uuid, username) VALUES ('u-1', 'alice');",
        [],
    )
    .unwrap();

    let result = conn.execute(
        "INSERT INTO journal_entries (uuid, user_uuid, title, created_at, valence, arousal)
         VALUES ('e-1', 'u-1', 'half signal', 0, 0.5, NULL);",
        [],
    );
    assert!(result.is_err());
}
