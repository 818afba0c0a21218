//! Task record and its priority/complexity attributes.

use crate::model::board::ListId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable task identifier.
pub type TaskId = Uuid;

/// Task urgency level. Ordinal values 1..=3 match the persisted encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    /// All priorities in ascending order.
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

/// Task difficulty level. Ordinal values 1..=3 match the persisted encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Complexity {
    Easy,
    Medium,
    Hard,
}

impl Complexity {
    /// All complexities in ascending order.
    pub const ALL: [Complexity; 3] = [Complexity::Easy, Complexity::Medium, Complexity::Hard];

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Easy => "Easy",
            Self::Medium => "Medium",
            Self::Hard => "Hard",
        }
    }
}

/// One task inside an ordered list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Stable global ID.
    pub uuid: TaskId,
    /// Owning list; rewritten on cross-list moves.
    pub list_uuid: ListId,
    /// Short task title.
    pub title: String,
    /// Free-form description.
    pub description: String,
    /// Optional deadline in epoch milliseconds.
    pub due_at: Option<i64>,
    pub priority: Priority,
    pub complexity: Complexity,
    /// Rank within the list; contiguous from 0, maintained by the
    /// position engine.
    pub position: i64,
    pub completed: bool,
    /// Set when `completed` flips to true, in epoch milliseconds.
    pub completed_at: Option<i64>,
}

impl Task {
    /// Marks the task completed at `now_ms`.
    pub fn complete(&mut self, now_ms: i64) {
        self.completed = true;
        self.completed_at = Some(now_ms);
    }

    /// Clears completion state.
    pub fn reopen(&mut self) {
        self.completed = false;
        self.completed_at = None;
    }

    /// True when a due date exists, has passed, and the task is still open.
    pub fn is_overdue(&self, now_ms: i64) -> bool {
        self.due_at.is_some_and(|due| due < now_ms) && !self.completed
    }
}
