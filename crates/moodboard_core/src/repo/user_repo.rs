//! User repository contract and SQLite implementation.
//!
//! Identity records only. Authentication and registration flows live
//! outside this crate; this repository stores the identities they produce.

use crate::db::DbError;
use crate::model::user::{User, UserId};
use crate::repo::{ensure_schema_ready, parse_uuid, SchemaError};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type UserRepoResult<T> = Result<T, UserRepoError>;

/// Errors from user repository operations.
#[derive(Debug)]
pub enum UserRepoError {
    Schema(SchemaError),
    Db(DbError),
    NotFound(UserId),
    /// Another user already claimed the username.
    DuplicateUsername(String),
    InvalidData(String),
}

impl Display for UserRepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Schema(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "user not found: {id}"),
            Self::DuplicateUsername(username) => {
                write!(f, "username already taken: `{username}`")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted user data: {message}"),
        }
    }
}

impl Error for UserRepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Schema(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<SchemaError> for UserRepoError {
    fn from(value: SchemaError) -> Self {
        Self::Schema(value)
    }
}

impl From<rusqlite::Error> for UserRepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for user identity records.
pub trait UserRepository {
    /// Persists one user; usernames are unique.
    fn create_user(&self, user: &User) -> UserRepoResult<UserId>;
    /// Loads one user by stable ID.
    fn get_user(&self, id: UserId) -> UserRepoResult<Option<User>>;
    /// Loads one user by exact username.
    fn find_by_username(&self, username: &str) -> UserRepoResult<Option<User>>;
}

/// SQLite-backed user repository.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    /// Creates the repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> UserRepoResult<Self> {
        ensure_schema_ready(conn, &["users"])?;
        Ok(Self { conn })
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn create_user(&self, user: &User) -> UserRepoResult<UserId> {
        let taken: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM users WHERE username = ?1);",
            [user.username.as_str()],
            |row| row.get(0),
        )?;
        if taken == 1 {
            return Err(UserRepoError::DuplicateUsername(user.username.clone()));
        }

        self.conn.execute(
            "INSERT INTO users (uuid, username) VALUES (?1, ?2);",
            params![user.uuid.to_string(), user.username.as_str()],
        )?;
        Ok(user.uuid)
    }

    fn get_user(&self, id: UserId) -> UserRepoResult<Option<User>> {
        self.conn
            .query_row(
                "SELECT uuid, username FROM users WHERE uuid = ?1;",
                [id.to_string()],
                parse_user_row,
            )
            .optional()?
            .transpose()
    }

    fn find_by_username(&self, username: &str) -> UserRepoResult<Option<User>> {
        self.conn
            .query_row(
                "SELECT uuid, username FROM users WHERE username = ?1;",
                [username],
                parse_user_row,
            )
            .optional()?
            .transpose()
    }
}

fn parse_user_row(row: &Row<'_>) -> rusqlite::Result<UserRepoResult<User>> {
    let uuid_text: String = row.get(0)?;
    let username: String = row.get(1)?;
    Ok(parse_uuid(&uuid_text, "users.uuid")
        .map(|uuid| User { uuid, username })
        .map_err(UserRepoError::InvalidData))
}
