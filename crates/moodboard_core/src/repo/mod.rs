//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts per aggregate.
//! - Isolate SQLite query details from service/business orchestration.
//! - Run every position-mutating operation inside one `BEGIN IMMEDIATE`
//!   transaction, realizing the serialization discipline the position
//!   engine requires from its callers.
//!
//! # Invariants
//! - Repository writes enforce model validation before SQL mutations.
//! - Read paths reject invalid persisted state instead of masking it.
//! - Repositories refuse to operate on unmigrated connections.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub mod board_repo;
pub mod journal_repo;
pub mod task_repo;
pub mod user_repo;

/// Schema readiness failure shared by all repository constructors.
#[derive(Debug)]
pub enum SchemaError {
    /// Underlying SQLite error while probing the schema.
    Db(DbError),
    /// Connection is not at the migrated version this binary expects.
    VersionMismatch { expected: u32, actual: u32 },
    /// A table the repository depends on is missing.
    MissingTable(&'static str),
}

impl Display for SchemaError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::VersionMismatch { expected, actual } => write!(
                f,
                "repository requires schema version {expected}, got {actual}"
            ),
            Self::MissingTable(table) => write!(f, "repository requires table `{table}`"),
        }
    }
}

impl Error for SchemaError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::VersionMismatch { .. } => None,
            Self::MissingTable(_) => None,
        }
    }
}

impl From<rusqlite::Error> for SchemaError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Verifies migration version and the presence of `tables` on `conn`.
pub(crate) fn ensure_schema_ready(
    conn: &Connection,
    tables: &[&'static str],
) -> Result<(), SchemaError> {
    let expected = latest_version();
    let actual: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual != expected {
        return Err(SchemaError::VersionMismatch { expected, actual });
    }

    for table in tables {
        let exists: i64 = conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table],
            |row| row.get(0),
        )?;
        if exists != 1 {
            return Err(SchemaError::MissingTable(table));
        }
    }

    Ok(())
}

pub(crate) fn parse_uuid(value: &str, column: &'static str) -> Result<Uuid, String> {
    Uuid::parse_str(value).map_err(|_| format!("invalid uuid `{value}` in {column}"))
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

pub(crate) fn int_to_bool(value: i64, column: &'static str) -> Result<bool, String> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(format!("invalid boolean `{other}` in {column}")),
    }
}
