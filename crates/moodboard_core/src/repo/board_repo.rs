//! Board and list repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist boards, membership, and the ordered lists of each board.
//! - Keep the board-of-lists container gap-free by routing every insert,
//!   move and delete through the position engine.
//!
//! # Invariants
//! - List positions within one board are exactly `{0, 1, ..., n-1}`.
//! - Position-mutating operations read the snapshot and write the change
//!   set inside a single `BEGIN IMMEDIATE` transaction.
//! - List ordering is deterministic: `position ASC, uuid ASC`.

use crate::db::DbError;
use crate::model::board::{Board, BoardId, ListId, TaskList};
use crate::model::user::UserId;
use crate::position::{self, PositionChange, PositionError, PositionedItem};
use crate::repo::{ensure_schema_ready, parse_uuid, SchemaError};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type BoardRepoResult<T> = Result<T, BoardRepoError>;

/// Errors from board/list repository operations.
#[derive(Debug)]
pub enum BoardRepoError {
    Schema(SchemaError),
    Db(DbError),
    BoardNotFound(BoardId),
    ListNotFound(ListId),
    /// Invalid target position or unknown item, reported by the engine.
    Position(PositionError),
    InvalidData(String),
}

impl Display for BoardRepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Schema(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::BoardNotFound(id) => write!(f, "board not found: {id}"),
            Self::ListNotFound(id) => write!(f, "list not found: {id}"),
            Self::Position(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted board data: {message}"),
        }
    }
}

impl Error for BoardRepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Schema(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Position(err) => Some(err),
            _ => None,
        }
    }
}

impl From<SchemaError> for BoardRepoError {
    fn from(value: SchemaError) -> Self {
        Self::Schema(value)
    }
}

impl From<rusqlite::Error> for BoardRepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<PositionError> for BoardRepoError {
    fn from(value: PositionError) -> Self {
        Self::Position(value)
    }
}

/// Repository interface for boards, membership and list ordering.
pub trait BoardRepository {
    /// Persists one board.
    fn create_board(&self, board: &Board) -> BoardRepoResult<BoardId>;
    /// Loads one board by stable ID.
    fn get_board(&self, id: BoardId) -> BoardRepoResult<Option<Board>>;
    /// Lists boards the user is a member of.
    fn list_boards_for_member(&self, user: UserId) -> BoardRepoResult<Vec<Board>>;
    /// Adds one member; idempotent for existing members.
    fn add_member(&self, board: BoardId, user: UserId) -> BoardRepoResult<()>;
    /// Checks board membership.
    fn is_member(&self, board: BoardId, user: UserId) -> BoardRepoResult<bool>;
    /// Lists member ids of one board.
    fn members(&self, board: BoardId) -> BoardRepoResult<Vec<UserId>>;
    /// Appends one list at the end of the board.
    fn create_list(&self, board: BoardId, name: &str) -> BoardRepoResult<TaskList>;
    /// Loads one list by stable ID.
    fn get_list(&self, list: ListId) -> BoardRepoResult<Option<TaskList>>;
    /// Lists a board's lists in position order.
    fn lists(&self, board: BoardId) -> BoardRepoResult<Vec<TaskList>>;
    /// Renames one list.
    fn rename_list(&self, list: ListId, name: &str) -> BoardRepoResult<()>;
    /// Moves one list to a new position within its board.
    fn move_list(&self, list: ListId, new_position: i64) -> BoardRepoResult<()>;
    /// Deletes one list and compacts the remaining positions.
    fn delete_list(&self, list: ListId) -> BoardRepoResult<()>;
}

/// SQLite-backed board repository.
pub struct SqliteBoardRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteBoardRepository<'conn> {
    /// Creates the repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> BoardRepoResult<Self> {
        ensure_schema_ready(conn, &["boards", "board_members", "lists"])?;
        Ok(Self { conn })
    }

    fn ensure_board_exists(&self, board: BoardId) -> BoardRepoResult<()> {
        if self.get_board(board)?.is_none() {
            return Err(BoardRepoError::BoardNotFound(board));
        }
        Ok(())
    }
}

impl BoardRepository for SqliteBoardRepository<'_> {
    fn create_board(&self, board: &Board) -> BoardRepoResult<BoardId> {
        self.conn.execute(
            "INSERT INTO boards (uuid, name) VALUES (?1, ?2);",
            params![board.uuid.to_string(), board.name.as_str()],
        )?;
        Ok(board.uuid)
    }

    fn get_board(&self, id: BoardId) -> BoardRepoResult<Option<Board>> {
        self.conn
            .query_row(
                "SELECT uuid, name FROM boards WHERE uuid = ?1;",
                [id.to_string()],
                parse_board_row,
            )
            .optional()?
            .transpose()
    }

    fn list_boards_for_member(&self, user: UserId) -> BoardRepoResult<Vec<Board>> {
        let mut stmt = self.conn.prepare(
            "SELECT b.uuid, b.name
             FROM boards b
             INNER JOIN board_members m ON m.board_uuid = b.uuid
             WHERE m.user_uuid = ?1
             ORDER BY b.created_at ASC, b.uuid ASC;",
        )?;
        let mut rows = stmt.query([user.to_string()])?;

        let mut boards = Vec::new();
        while let Some(row) = rows.next()? {
            boards.push(parse_board_row(row)??);
        }
        Ok(boards)
    }

    fn add_member(&self, board: BoardId, user: UserId) -> BoardRepoResult<()> {
        self.ensure_board_exists(board)?;
        self.conn.execute(
            "INSERT OR IGNORE INTO board_members (board_uuid, user_uuid) VALUES (?1, ?2);",
            params![board.to_string(), user.to_string()],
        )?;
        Ok(())
    }

    fn is_member(&self, board: BoardId, user: UserId) -> BoardRepoResult<bool> {
        let found: i64 = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM board_members WHERE board_uuid = ?1 AND user_uuid = ?2
            );",
            params![board.to_string(), user.to_string()],
            |row| row.get(0),
        )?;
        Ok(found == 1)
    }

    fn members(&self, board: BoardId) -> BoardRepoResult<Vec<UserId>> {
        self.ensure_board_exists(board)?;
        let mut stmt = self.conn.prepare(
            "SELECT m.user_uuid
             FROM board_members m
             INNER JOIN users u ON u.uuid = m.user_uuid
             WHERE m.board_uuid = ?1
             ORDER BY u.username ASC;",
        )?;
        let mut rows = stmt.query([board.to_string()])?;

        let mut members = Vec::new();
        while let Some(row) = rows.next()? {
            let value: String = row.get(0)?;
            members
                .push(parse_uuid(&value, "board_members.user_uuid")
                    .map_err(BoardRepoError::InvalidData)?);
        }
        Ok(members)
    }

    fn create_list(&self, board: BoardId, name: &str) -> BoardRepoResult<TaskList> {
        self.ensure_board_exists(board)?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let snapshot = load_list_positions(&tx, board)?;
        let list = TaskList {
            uuid: Uuid::new_v4(),
            board_uuid: board,
            name: name.to_string(),
            position: position::append_position(&snapshot),
        };
        tx.execute(
            "INSERT INTO lists (uuid, board_uuid, name, position) VALUES (?1, ?2, ?3, ?4);",
            params![
                list.uuid.to_string(),
                list.board_uuid.to_string(),
                list.name.as_str(),
                list.position,
            ],
        )?;
        tx.commit()?;
        Ok(list)
    }

    fn get_list(&self, list: ListId) -> BoardRepoResult<Option<TaskList>> {
        self.conn
            .query_row(
                "SELECT uuid, board_uuid, name, position FROM lists WHERE uuid = ?1;",
                [list.to_string()],
                parse_list_row,
            )
            .optional()?
            .transpose()
    }

    fn lists(&self, board: BoardId) -> BoardRepoResult<Vec<TaskList>> {
        self.ensure_board_exists(board)?;
        let mut stmt = self.conn.prepare(
            "SELECT uuid, board_uuid, name, position
             FROM lists
             WHERE board_uuid = ?1
             ORDER BY position ASC, uuid ASC;",
        )?;
        let mut rows = stmt.query([board.to_string()])?;

        let mut lists = Vec::new();
        while let Some(row) = rows.next()? {
            lists.push(parse_list_row(row)??);
        }
        Ok(lists)
    }

    fn rename_list(&self, list: ListId, name: &str) -> BoardRepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE lists
             SET name = ?2,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            params![list.to_string(), name],
        )?;
        if changed == 0 {
            return Err(BoardRepoError::ListNotFound(list));
        }
        Ok(())
    }

    fn move_list(&self, list: ListId, new_position: i64) -> BoardRepoResult<()> {
        let board = self
            .get_list(list)?
            .ok_or(BoardRepoError::ListNotFound(list))?
            .board_uuid;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let snapshot = load_list_positions(&tx, board)?;
        let changes = position::move_within(&snapshot, list, new_position)?;
        apply_list_positions(&tx, &changes)?;
        tx.commit()?;
        Ok(())
    }

    fn delete_list(&self, list: ListId) -> BoardRepoResult<()> {
        let removed = self
            .get_list(list)?
            .ok_or(BoardRepoError::ListNotFound(list))?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        tx.execute("DELETE FROM lists WHERE uuid = ?1;", [list.to_string()])?;
        let remaining = load_list_positions(&tx, removed.board_uuid)?;
        let changes = position::compact_after_removal(&remaining, removed.position);
        apply_list_positions(&tx, &changes)?;
        tx.commit()?;
        Ok(())
    }
}

fn load_list_positions(conn: &Connection, board: BoardId) -> BoardRepoResult<Vec<PositionedItem>> {
    let mut stmt = conn.prepare(
        "SELECT uuid, position
         FROM lists
         WHERE board_uuid = ?1
         ORDER BY position ASC, uuid ASC;",
    )?;
    let mut rows = stmt.query([board.to_string()])?;

    let mut items = Vec::new();
    while let Some(row) = rows.next()? {
        let uuid_text: String = row.get(0)?;
        items.push(PositionedItem {
            id: parse_uuid(&uuid_text, "lists.uuid").map_err(BoardRepoError::InvalidData)?,
            position: row.get(1)?,
        });
    }
    Ok(items)
}

fn apply_list_positions(conn: &Connection, changes: &[PositionChange]) -> BoardRepoResult<()> {
    for change in changes {
        conn.execute(
            "UPDATE lists
             SET position = ?2,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            params![change.id.to_string(), change.position],
        )?;
    }
    Ok(())
}

fn parse_board_row(row: &Row<'_>) -> rusqlite::Result<BoardRepoResult<Board>> {
    let uuid_text: String = row.get(0)?;
    let name: String = row.get(1)?;
    Ok(parse_uuid(&uuid_text, "boards.uuid")
        .map(|uuid| Board { uuid, name })
        .map_err(BoardRepoError::InvalidData))
}

fn parse_list_row(row: &Row<'_>) -> rusqlite::Result<BoardRepoResult<TaskList>> {
    let uuid_text: String = row.get(0)?;
    let board_text: String = row.get(1)?;
    let name: String = row.get(2)?;
    let position: i64 = row.get(3)?;

    let parsed = parse_uuid(&uuid_text, "lists.uuid").and_then(|uuid| {
        parse_uuid(&board_text, "lists.board_uuid").map(|board_uuid| TaskList {
            uuid,
            board_uuid,
            name,
            position,
        })
    });
    Ok(parsed.map_err(BoardRepoError::InvalidData))
}
