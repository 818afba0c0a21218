//! Journal entry record, visibility tag and write-time validation.
//!
//! # Invariants
//! - An entry carries a complete mood signal or none; write paths must
//!   call [`JournalEntry::validate`] before persisting.
//! - Share targets are meaningful only while `visibility == Shared`.

use crate::model::task::TaskId;
use crate::model::user::UserId;
use crate::mood::{MoodSignal, SignalError};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable journal entry identifier.
pub type EntryId = Uuid;

/// Who may read a journal entry besides its author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    /// Author only.
    Private,
    /// Author plus the entry's share set.
    Shared,
    /// Everyone.
    Public,
}

/// Validation failures for journal entry writes.
#[derive(Debug, Clone, PartialEq)]
pub enum JournalValidationError {
    /// Title is blank after trimming.
    BlankTitle,
    /// Mood signal is one-sided or out of range.
    Signal(SignalError),
}

impl Display for JournalValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankTitle => write!(f, "journal entry title must not be blank"),
            Self::Signal(err) => write!(f, "{err}"),
        }
    }
}

impl Error for JournalValidationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::BlankTitle => None,
            Self::Signal(err) => Some(err),
        }
    }
}

impl From<SignalError> for JournalValidationError {
    fn from(value: SignalError) -> Self {
        Self::Signal(value)
    }
}

/// One journal entry, optionally linked to a task and carrying a mood
/// signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Stable global ID.
    pub uuid: EntryId,
    /// Authoring user.
    pub author: UserId,
    /// Optional linked task; cleared when the task is deleted.
    pub task: Option<TaskId>,
    pub title: String,
    pub content: String,
    /// Entry timestamp in epoch milliseconds. May be back-dated, never
    /// future-dated.
    pub created_at: i64,
    /// Complete mood signal, or none at all.
    pub signal: Option<MoodSignal>,
    pub visibility: Visibility,
}

impl JournalEntry {
    /// Creates a private entry with a generated stable ID.
    pub fn new(author: UserId, title: impl Into<String>, created_at: i64) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            author,
            task: None,
            title: title.into(),
            content: String::new(),
            created_at,
            signal: None,
            visibility: Visibility::Private,
        }
    }

    /// Scalar mood index, absent when the entry carries no signal.
    pub fn mood_index(&self) -> Option<f64> {
        self.signal.map(|signal| signal.index())
    }

    /// Checks the write invariants of this entry.
    pub fn validate(&self) -> Result<(), JournalValidationError> {
        if self.title.trim().is_empty() {
            return Err(JournalValidationError::BlankTitle);
        }
        if let Some(signal) = self.signal {
            signal.validate()?;
        }
        Ok(())
    }
}
