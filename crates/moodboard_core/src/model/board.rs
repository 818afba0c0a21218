//! Board and list records.
//!
//! A board groups ordered task lists; membership controls who may operate
//! on it. Lists are the positioned items of the board container.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable board identifier.
pub type BoardId = Uuid;

/// Stable list identifier.
pub type ListId = Uuid;

/// An ordered grouping of task lists shared by its members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    /// Stable global ID.
    pub uuid: BoardId,
    /// User-facing board name.
    pub name: String,
}

impl Board {
    /// Creates a board with a generated stable ID.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: name.into(),
        }
    }
}

/// One ordered list of tasks within a board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskList {
    /// Stable global ID.
    pub uuid: ListId,
    /// Owning board.
    pub board_uuid: BoardId,
    /// User-facing list name.
    pub name: String,
    /// Rank within the board; contiguous from 0, maintained by the
    /// position engine.
    pub position: i64,
}
