//! Journal entry repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist journal entries, their mood signals and share sets.
//! - Encode the visibility predicate exactly once (`list_visible_to`);
//!   aggregation callers receive pre-scoped sets and never re-derive it.
//!
//! # Invariants
//! - Writes enforce `JournalEntry::validate()`; a one-sided signal never
//!   reaches storage.
//! - `set_shared_with` replaces the whole share set in one transaction.
//! - Listing order is newest first: `created_at DESC, uuid ASC`.

use crate::db::DbError;
use crate::model::board::BoardId;
use crate::model::journal::{EntryId, JournalEntry, JournalValidationError, Visibility};
use crate::model::task::{Complexity, Priority, TaskId};
use crate::model::user::UserId;
use crate::mood::MoodSignal;
use crate::repo::task_repo::{parse_complexity, parse_priority};
use crate::repo::{ensure_schema_ready, parse_uuid, SchemaError};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};

const ENTRY_SELECT_SQL: &str = "SELECT
    j.uuid,
    j.user_uuid,
    j.task_uuid,
    j.title,
    j.content,
    j.created_at,
    j.valence,
    j.arousal,
    j.visibility
FROM journal_entries j";

pub type JournalRepoResult<T> = Result<T, JournalRepoError>;

/// Errors from journal repository operations.
#[derive(Debug)]
pub enum JournalRepoError {
    Schema(SchemaError),
    Db(DbError),
    Validation(JournalValidationError),
    EntryNotFound(EntryId),
    InvalidData(String),
}

impl Display for JournalRepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Schema(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::EntryNotFound(id) => write!(f, "journal entry not found: {id}"),
            Self::InvalidData(message) => {
                write!(f, "invalid persisted journal data: {message}")
            }
        }
    }
}

impl Error for JournalRepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Schema(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<SchemaError> for JournalRepoError {
    fn from(value: SchemaError) -> Self {
        Self::Schema(value)
    }
}

impl From<rusqlite::Error> for JournalRepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<JournalValidationError> for JournalRepoError {
    fn from(value: JournalValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Narrowing options for entry listings; all conditions are conjunctive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JournalFilter {
    /// Only entries linked to this task.
    pub task: Option<TaskId>,
    /// Only entries linked to tasks on this board.
    pub board: Option<BoardId>,
    /// Inclusive lower bound on `created_at`, epoch milliseconds.
    pub created_from_ms: Option<i64>,
    /// Inclusive upper bound on `created_at`, epoch milliseconds.
    pub created_to_ms: Option<i64>,
}

/// One signal-bearing entry joined with its task's bucketing attributes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TaskMoodSample {
    pub complexity: Complexity,
    pub priority: Priority,
    pub signal: MoodSignal,
}

/// Repository interface for journal entries, shares and mood reads.
pub trait JournalRepository {
    /// Persists one validated entry.
    fn create_entry(&self, entry: &JournalEntry) -> JournalRepoResult<EntryId>;
    /// Rewrites one validated entry by stable ID.
    fn update_entry(&self, entry: &JournalEntry) -> JournalRepoResult<()>;
    /// Loads one entry by stable ID.
    fn get_entry(&self, id: EntryId) -> JournalRepoResult<Option<JournalEntry>>;
    /// Deletes one entry and its share links.
    fn delete_entry(&self, id: EntryId) -> JournalRepoResult<()>;
    /// Replaces the whole share set of one entry.
    fn set_shared_with(&self, entry: EntryId, users: &[UserId]) -> JournalRepoResult<()>;
    /// Lists the share targets of one entry.
    fn shared_with(&self, entry: EntryId) -> JournalRepoResult<Vec<UserId>>;
    /// Lists entries authored by `author`, newest first.
    fn list_for_author(
        &self,
        author: UserId,
        filter: &JournalFilter,
    ) -> JournalRepoResult<Vec<JournalEntry>>;
    /// Lists entries `requester` may read: own entries, public entries,
    /// and shared entries whose share set contains the requester.
    fn list_visible_to(
        &self,
        requester: UserId,
        filter: &JournalFilter,
    ) -> JournalRepoResult<Vec<JournalEntry>>;
    /// Loads the author's signal-bearing entries joined with task
    /// complexity/priority, for bucket rollups.
    fn task_mood_samples_for_author(
        &self,
        author: UserId,
    ) -> JournalRepoResult<Vec<TaskMoodSample>>;
    /// Probes whether a task id resolves, for link validation.
    fn task_exists(&self, task: TaskId) -> JournalRepoResult<bool>;
    /// Probes whether a board id resolves, for overview scoping.
    fn board_exists(&self, board: BoardId) -> JournalRepoResult<bool>;
}

/// SQLite-backed journal repository.
pub struct SqliteJournalRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteJournalRepository<'conn> {
    /// Creates the repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> JournalRepoResult<Self> {
        ensure_schema_ready(
            conn,
            &["journal_entries", "journal_shares", "tasks", "lists", "boards"],
        )?;
        Ok(Self { conn })
    }

    fn list_entries(
        &self,
        scope_sql: &str,
        scope_binds: &[Value],
        filter: &JournalFilter,
    ) -> JournalRepoResult<Vec<JournalEntry>> {
        let mut sql = format!("{ENTRY_SELECT_SQL} WHERE {scope_sql}");
        let mut binds: Vec<Value> = scope_binds.to_vec();

        if let Some(task) = filter.task {
            sql.push_str(" AND j.task_uuid = ?");
            binds.push(Value::Text(task.to_string()));
        }
        if let Some(board) = filter.board {
            sql.push_str(
                " AND j.task_uuid IN (
                    SELECT t.uuid
                    FROM tasks t
                    INNER JOIN lists l ON l.uuid = t.list_uuid
                    WHERE l.board_uuid = ?
                )",
            );
            binds.push(Value::Text(board.to_string()));
        }
        if let Some(from) = filter.created_from_ms {
            sql.push_str(" AND j.created_at >= ?");
            binds.push(Value::Integer(from));
        }
        if let Some(to) = filter.created_to_ms {
            sql.push_str(" AND j.created_at <= ?");
            binds.push(Value::Integer(to));
        }

        sql.push_str(" ORDER BY j.created_at DESC, j.uuid ASC");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(binds))?;

        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            entries.push(parse_entry_row(row)?);
        }
        Ok(entries)
    }
}

impl JournalRepository for SqliteJournalRepository<'_> {
    fn create_entry(&self, entry: &JournalEntry) -> JournalRepoResult<EntryId> {
        entry.validate()?;

        self.conn.execute(
            "INSERT INTO journal_entries (
                uuid,
                user_uuid,
                task_uuid,
                title,
                content,
                created_at,
                valence,
                arousal,
                visibility
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9);",
            params![
                entry.uuid.to_string(),
                entry.author.to_string(),
                entry.task.map(|task| task.to_string()),
                entry.title.as_str(),
                entry.content.as_str(),
                entry.created_at,
                entry.signal.map(|signal| signal.valence),
                entry.signal.map(|signal| signal.arousal),
                visibility_to_db(entry.visibility),
            ],
        )?;
        Ok(entry.uuid)
    }

    fn update_entry(&self, entry: &JournalEntry) -> JournalRepoResult<()> {
        entry.validate()?;

        let changed = self.conn.execute(
            "UPDATE journal_entries
             SET task_uuid = ?2,
                 title = ?3,
                 content = ?4,
                 created_at = ?5,
                 valence = ?6,
                 arousal = ?7,
                 visibility = ?8
             WHERE uuid = ?1;",
            params![
                entry.uuid.to_string(),
                entry.task.map(|task| task.to_string()),
                entry.title.as_str(),
                entry.content.as_str(),
                entry.created_at,
                entry.signal.map(|signal| signal.valence),
                entry.signal.map(|signal| signal.arousal),
                visibility_to_db(entry.visibility),
            ],
        )?;
        if changed == 0 {
            return Err(JournalRepoError::EntryNotFound(entry.uuid));
        }
        Ok(())
    }

    fn get_entry(&self, id: EntryId) -> JournalRepoResult<Option<JournalEntry>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ENTRY_SELECT_SQL} WHERE j.uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_entry_row(row)?));
        }
        Ok(None)
    }

    fn delete_entry(&self, id: EntryId) -> JournalRepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM journal_entries WHERE uuid = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(JournalRepoError::EntryNotFound(id));
        }
        Ok(())
    }

    fn set_shared_with(&self, entry: EntryId, users: &[UserId]) -> JournalRepoResult<()> {
        if self.get_entry(entry)?.is_none() {
            return Err(JournalRepoError::EntryNotFound(entry));
        }

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        tx.execute(
            "DELETE FROM journal_shares WHERE entry_uuid = ?1;",
            [entry.to_string()],
        )?;
        for user in users {
            tx.execute(
                "INSERT OR IGNORE INTO journal_shares (entry_uuid, user_uuid) VALUES (?1, ?2);",
                params![entry.to_string(), user.to_string()],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    fn shared_with(&self, entry: EntryId) -> JournalRepoResult<Vec<UserId>> {
        if self.get_entry(entry)?.is_none() {
            return Err(JournalRepoError::EntryNotFound(entry));
        }
        let mut stmt = self.conn.prepare(
            "SELECT user_uuid
             FROM journal_shares
             WHERE entry_uuid = ?1
             ORDER BY user_uuid ASC;",
        )?;
        let mut rows = stmt.query([entry.to_string()])?;

        let mut users = Vec::new();
        while let Some(row) = rows.next()? {
            let value: String = row.get(0)?;
            users.push(
                parse_uuid(&value, "journal_shares.user_uuid")
                    .map_err(JournalRepoError::InvalidData)?,
            );
        }
        Ok(users)
    }

    fn list_for_author(
        &self,
        author: UserId,
        filter: &JournalFilter,
    ) -> JournalRepoResult<Vec<JournalEntry>> {
        self.list_entries(
            "j.user_uuid = ?",
            &[Value::Text(author.to_string())],
            filter,
        )
    }

    fn list_visible_to(
        &self,
        requester: UserId,
        filter: &JournalFilter,
    ) -> JournalRepoResult<Vec<JournalEntry>> {
        self.list_entries(
            "(j.user_uuid = ?
              OR j.visibility = 'public'
              OR (j.visibility = 'shared' AND EXISTS (
                  SELECT 1
                  FROM journal_shares s
                  WHERE s.entry_uuid = j.uuid AND s.user_uuid = ?
              )))",
            &[
                Value::Text(requester.to_string()),
                Value::Text(requester.to_string()),
            ],
            filter,
        )
    }

    fn task_mood_samples_for_author(
        &self,
        author: UserId,
    ) -> JournalRepoResult<Vec<TaskMoodSample>> {
        let mut stmt = self.conn.prepare(
            "SELECT t.complexity, t.priority, j.valence, j.arousal
             FROM journal_entries j
             INNER JOIN tasks t ON t.uuid = j.task_uuid
             WHERE j.user_uuid = ?1
               AND j.valence IS NOT NULL
               AND j.arousal IS NOT NULL;",
        )?;
        let mut rows = stmt.query([author.to_string()])?;

        let mut samples = Vec::new();
        while let Some(row) = rows.next()? {
            let complexity_value: i64 = row.get(0)?;
            let priority_value: i64 = row.get(1)?;
            let complexity = parse_complexity(complexity_value).ok_or_else(|| {
                JournalRepoError::InvalidData(format!(
                    "invalid complexity `{complexity_value}` in tasks.complexity"
                ))
            })?;
            let priority = parse_priority(priority_value).ok_or_else(|| {
                JournalRepoError::InvalidData(format!(
                    "invalid priority `{priority_value}` in tasks.priority"
                ))
            })?;
            let signal = MoodSignal {
                valence: row.get(2)?,
                arousal: row.get(3)?,
            };
            signal
                .validate()
                .map_err(|err| JournalRepoError::InvalidData(err.to_string()))?;
            samples.push(TaskMoodSample {
                complexity,
                priority,
                signal,
            });
        }
        Ok(samples)
    }

    fn task_exists(&self, task: TaskId) -> JournalRepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM tasks WHERE uuid = ?1);",
            [task.to_string()],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn board_exists(&self, board: BoardId) -> JournalRepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM boards WHERE uuid = ?1);",
            [board.to_string()],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }
}

fn parse_entry_row(row: &Row<'_>) -> JournalRepoResult<JournalEntry> {
    let uuid_text: String = row.get(0)?;
    let author_text: String = row.get(1)?;
    let task_text: Option<String> = row.get(2)?;

    let valence: Option<f64> = row.get(6)?;
    let arousal: Option<f64> = row.get(7)?;
    let signal = MoodSignal::from_parts(valence, arousal)
        .map_err(|err| JournalRepoError::InvalidData(err.to_string()))?;

    let visibility_text: String = row.get(8)?;
    let visibility = parse_visibility(&visibility_text).ok_or_else(|| {
        JournalRepoError::InvalidData(format!(
            "invalid visibility `{visibility_text}` in journal_entries.visibility"
        ))
    })?;

    Ok(JournalEntry {
        uuid: parse_uuid(&uuid_text, "journal_entries.uuid")
            .map_err(JournalRepoError::InvalidData)?,
        author: parse_uuid(&author_text, "journal_entries.user_uuid")
            .map_err(JournalRepoError::InvalidData)?,
        task: task_text
            .map(|value| parse_uuid(&value, "journal_entries.task_uuid"))
            .transpose()
            .map_err(JournalRepoError::InvalidData)?,
        title: row.get(3)?,
        content: row.get(4)?,
        created_at: row.get(5)?,
        signal,
        visibility,
    })
}

fn visibility_to_db(visibility: Visibility) -> &'static str {
    match visibility {
        Visibility::Private => "private",
        Visibility::Shared => "shared",
        Visibility::Public => "public",
    }
}

fn parse_visibility(value: &str) -> Option<Visibility> {
    match value {
        "private" => Some(Visibility::Private),
        "shared" => Some(Visibility::Shared),
        "public" => Some(Visibility::Public),
        _ => None,
    }
}
