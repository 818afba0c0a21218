//! Board use-case service.
//!
//! # Responsibility
//! - Validate board/list names and membership above the repository layer.
//! - Guard board-scoped operations: only members may read or mutate a
//!   board and its lists.
//!
//! # Invariants
//! - Every operation on an existing board verifies the requester's
//!   membership before touching data.
//! - List ordering semantics live in the repository/position engine; this
//!   layer never computes positions.

use crate::model::board::{Board, BoardId, ListId, TaskList};
use crate::model::user::UserId;
use crate::repo::board_repo::{BoardRepoError, BoardRepository};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors from board service operations.
#[derive(Debug)]
pub enum BoardServiceError {
    /// Name is blank after trimming.
    BlankName,
    BoardNotFound(BoardId),
    ListNotFound(ListId),
    /// Requester is not a member of the target board.
    NotAMember { board: BoardId, user: UserId },
    /// The user is already a member of the board.
    AlreadyMember { board: BoardId, user: UserId },
    /// Repository-level failure.
    Repo(BoardRepoError),
}

impl Display for BoardServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankName => write!(f, "name must not be blank"),
            Self::BoardNotFound(id) => write!(f, "board not found: {id}"),
            Self::ListNotFound(id) => write!(f, "list not found: {id}"),
            Self::NotAMember { board, user } => {
                write!(f, "user {user} is not a member of board {board}")
            }
            Self::AlreadyMember { board, user } => {
                write!(f, "user {user} is already a member of board {board}")
            }
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for BoardServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<BoardRepoError> for BoardServiceError {
    fn from(value: BoardRepoError) -> Self {
        match value {
            BoardRepoError::BoardNotFound(id) => Self::BoardNotFound(id),
            BoardRepoError::ListNotFound(id) => Self::ListNotFound(id),
            other => Self::Repo(other),
        }
    }
}

/// Full read model of one board: members plus ordered lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardDetail {
    pub board: Board,
    pub members: Vec<UserId>,
    pub lists: Vec<TaskList>,
}

/// Board use-case facade.
pub struct BoardService<R: BoardRepository> {
    repo: R,
}

impl<R: BoardRepository> BoardService<R> {
    /// Creates the service from a repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates a board and enrolls its creator as the first member.
    pub fn create_board(
        &self,
        name: impl Into<String>,
        owner: UserId,
    ) -> Result<Board, BoardServiceError> {
        let name = normalize_name(name.into())?;
        let board = Board::new(name);
        self.repo.create_board(&board)?;
        self.repo.add_member(board.uuid, owner)?;
        Ok(board)
    }

    /// Boards the user belongs to.
    pub fn boards_for(&self, user: UserId) -> Result<Vec<Board>, BoardServiceError> {
        self.repo.list_boards_for_member(user).map_err(Into::into)
    }

    /// Loads a board with its members and ordered lists.
    pub fn board_detail(
        &self,
        requester: UserId,
        board: BoardId,
    ) -> Result<BoardDetail, BoardServiceError> {
        self.ensure_member(board, requester)?;
        let record = self
            .repo
            .get_board(board)?
            .ok_or(BoardServiceError::BoardNotFound(board))?;
        Ok(BoardDetail {
            board: record,
            members: self.repo.members(board)?,
            lists: self.repo.lists(board)?,
        })
    }

    /// Adds a member to a board the requester belongs to.
    pub fn add_member(
        &self,
        requester: UserId,
        board: BoardId,
        new_member: UserId,
    ) -> Result<(), BoardServiceError> {
        self.ensure_member(board, requester)?;
        if self.repo.is_member(board, new_member)? {
            return Err(BoardServiceError::AlreadyMember {
                board,
                user: new_member,
            });
        }
        self.repo.add_member(board, new_member).map_err(Into::into)
    }

    /// Appends a new list at the end of the board.
    pub fn create_list(
        &self,
        requester: UserId,
        board: BoardId,
        name: impl Into<String>,
    ) -> Result<TaskList, BoardServiceError> {
        let name = normalize_name(name.into())?;
        self.ensure_member(board, requester)?;
        self.repo.create_list(board, &name).map_err(Into::into)
    }

    /// Lists a board's lists in position order.
    pub fn lists(
        &self,
        requester: UserId,
        board: BoardId,
    ) -> Result<Vec<TaskList>, BoardServiceError> {
        self.ensure_member(board, requester)?;
        self.repo.lists(board).map_err(Into::into)
    }

    /// Renames a list on a board the requester belongs to.
    pub fn rename_list(
        &self,
        requester: UserId,
        list: ListId,
        name: impl Into<String>,
    ) -> Result<(), BoardServiceError> {
        let name = normalize_name(name.into())?;
        self.ensure_list_access(requester, list)?;
        self.repo.rename_list(list, &name).map_err(Into::into)
    }

    /// Moves a list to a new position within its board.
    pub fn move_list(
        &self,
        requester: UserId,
        list: ListId,
        new_position: i64,
    ) -> Result<(), BoardServiceError> {
        self.ensure_list_access(requester, list)?;
        self.repo.move_list(list, new_position).map_err(Into::into)
    }

    /// Deletes a list; remaining list positions are compacted.
    pub fn delete_list(&self, requester: UserId, list: ListId) -> Result<(), BoardServiceError> {
        self.ensure_list_access(requester, list)?;
        self.repo.delete_list(list).map_err(Into::into)
    }

    fn ensure_member(&self, board: BoardId, user: UserId) -> Result<(), BoardServiceError> {
        if self.repo.get_board(board)?.is_none() {
            return Err(BoardServiceError::BoardNotFound(board));
        }
        if !self.repo.is_member(board, user)? {
            return Err(BoardServiceError::NotAMember { board, user });
        }
        Ok(())
    }

    fn ensure_list_access(&self, requester: UserId, list: ListId) -> Result<(), BoardServiceError> {
        let record = self
            .repo
            .get_list(list)?
            .ok_or(BoardServiceError::ListNotFound(list))?;
        self.ensure_member(record.board_uuid, requester)
    }
}

fn normalize_name(value: String) -> Result<String, BoardServiceError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(BoardServiceError::BlankName);
    }
    Ok(trimmed.to_string())
}
