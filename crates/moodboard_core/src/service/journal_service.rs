//! Journal use-case service.
//!
//! # Responsibility
//! - Validate entry input (signal parts, title, timestamps) and enforce
//!   author-only mutation.
//! - Manage the share-set lifecycle around visibility changes.
//! - Run the mood rollup use-cases over correctly scoped entry sets.
//!
//! # Invariants
//! - Personal rollups (`mood_statistics`, `heatmap`) see only the
//!   requester's own entries; task/board rollups see the requester's
//!   visibility scope.
//! - Scoping happens here, before observations reach the mood engine.
//! - Leaving `Shared` visibility clears the entry's share set.

use crate::model::board::BoardId;
use crate::model::journal::{EntryId, JournalEntry, JournalValidationError, Visibility};
use crate::model::task::{Complexity, Priority, TaskId};
use crate::model::user::UserId;
use crate::mood::{
    bucket_average, daily_average, daily_stats, DailyMood, DailyMoodStats, DateRange, MoodBucket,
    MoodObservation, MoodSignal,
};
use crate::repo::journal_repo::{JournalFilter, JournalRepoError, JournalRepository};
use chrono::{DateTime, NaiveDate, Utc};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors from journal service operations.
#[derive(Debug)]
pub enum JournalServiceError {
    /// Entry-level validation failure (blank title, bad signal).
    Validation(JournalValidationError),
    /// `created_at` lies in the future.
    CreatedAtInFuture { created_at_ms: i64, now_ms: i64 },
    EntryNotFound(EntryId),
    /// Requester does not own the entry they tried to mutate.
    NotEntryAuthor { entry: EntryId, requester: UserId },
    TaskNotFound(TaskId),
    BoardNotFound(BoardId),
    /// Persisted timestamp cannot be interpreted as a UTC instant.
    InvalidTimestamp { entry: EntryId, created_at_ms: i64 },
    /// Repository-level failure.
    Repo(JournalRepoError),
}

impl Display for JournalServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::CreatedAtInFuture {
                created_at_ms,
                now_ms,
            } => write!(
                f,
                "created_at {created_at_ms} lies in the future (now {now_ms})"
            ),
            Self::EntryNotFound(id) => write!(f, "journal entry not found: {id}"),
            Self::NotEntryAuthor { entry, requester } => {
                write!(f, "user {requester} is not the author of entry {entry}")
            }
            Self::TaskNotFound(id) => write!(f, "task not found: {id}"),
            Self::BoardNotFound(id) => write!(f, "board not found: {id}"),
            Self::InvalidTimestamp {
                entry,
                created_at_ms,
            } => write!(f, "entry {entry} has unusable created_at {created_at_ms}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for JournalServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<JournalRepoError> for JournalServiceError {
    fn from(value: JournalRepoError) -> Self {
        match value {
            JournalRepoError::EntryNotFound(id) => Self::EntryNotFound(id),
            JournalRepoError::Validation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

impl From<JournalValidationError> for JournalServiceError {
    fn from(value: JournalValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Input for creating one journal entry.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryDraft {
    pub author: UserId,
    pub title: String,
    pub content: String,
    pub task: Option<TaskId>,
    /// Defaults to the current instant; may be back-dated, never
    /// future-dated.
    pub created_at_ms: Option<i64>,
    pub valence: Option<f64>,
    pub arousal: Option<f64>,
    pub visibility: Visibility,
    /// Applied only while `visibility == Shared`.
    pub shared_with: Vec<UserId>,
}

impl EntryDraft {
    /// Starts a private, signal-less draft.
    pub fn new(author: UserId, title: impl Into<String>) -> Self {
        Self {
            author,
            title: title.into(),
            content: String::new(),
            task: None,
            created_at_ms: None,
            valence: None,
            arousal: None,
            visibility: Visibility::Private,
            shared_with: Vec::new(),
        }
    }
}

/// Journal use-case facade.
pub struct JournalService<R: JournalRepository> {
    repo: R,
}

impl<R: JournalRepository> JournalService<R> {
    /// Creates the service from a repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates one entry from a draft.
    pub fn create_entry(&self, draft: EntryDraft) -> Result<JournalEntry, JournalServiceError> {
        let signal = MoodSignal::from_parts(draft.valence, draft.arousal)
            .map_err(JournalValidationError::from)?;

        let now_ms = Utc::now().timestamp_millis();
        let created_at = match draft.created_at_ms {
            Some(created_at_ms) if created_at_ms > now_ms => {
                return Err(JournalServiceError::CreatedAtInFuture {
                    created_at_ms,
                    now_ms,
                });
            }
            Some(created_at_ms) => created_at_ms,
            None => now_ms,
        };

        if let Some(task) = draft.task {
            if !self.repo.task_exists(task)? {
                return Err(JournalServiceError::TaskNotFound(task));
            }
        }

        let entry = JournalEntry {
            uuid: uuid::Uuid::new_v4(),
            author: draft.author,
            task: draft.task,
            title: draft.title,
            content: draft.content,
            created_at,
            signal,
            visibility: draft.visibility,
        };
        entry.validate()?;
        self.repo.create_entry(&entry)?;

        if entry.visibility == Visibility::Shared && !draft.shared_with.is_empty() {
            self.repo.set_shared_with(entry.uuid, &draft.shared_with)?;
        }
        Ok(entry)
    }

    /// Rewrites an entry; only its author may do so.
    ///
    /// `shared_with`, when given, replaces the share set while the entry is
    /// `Shared`. Leaving `Shared` visibility always clears the share set.
    pub fn update_entry(
        &self,
        requester: UserId,
        updated: &JournalEntry,
        shared_with: Option<&[UserId]>,
    ) -> Result<(), JournalServiceError> {
        let existing = self
            .repo
            .get_entry(updated.uuid)?
            .ok_or(JournalServiceError::EntryNotFound(updated.uuid))?;
        if existing.author != requester {
            return Err(JournalServiceError::NotEntryAuthor {
                entry: updated.uuid,
                requester,
            });
        }

        if let Some(task) = updated.task {
            if updated.task != existing.task && !self.repo.task_exists(task)? {
                return Err(JournalServiceError::TaskNotFound(task));
            }
        }

        updated.validate()?;
        self.repo.update_entry(updated)?;

        if existing.visibility == Visibility::Shared && updated.visibility != Visibility::Shared {
            self.repo.set_shared_with(updated.uuid, &[])?;
        } else if updated.visibility == Visibility::Shared {
            if let Some(users) = shared_with {
                self.repo.set_shared_with(updated.uuid, users)?;
            }
        }
        Ok(())
    }

    /// Deletes an entry; only its author may do so.
    pub fn delete_entry(
        &self,
        requester: UserId,
        entry: EntryId,
    ) -> Result<(), JournalServiceError> {
        let existing = self
            .repo
            .get_entry(entry)?
            .ok_or(JournalServiceError::EntryNotFound(entry))?;
        if existing.author != requester {
            return Err(JournalServiceError::NotEntryAuthor { entry, requester });
        }
        self.repo.delete_entry(entry).map_err(Into::into)
    }

    /// The requester's own entries, newest first.
    pub fn entries_for(
        &self,
        requester: UserId,
        filter: &JournalFilter,
    ) -> Result<Vec<JournalEntry>, JournalServiceError> {
        self.repo.list_for_author(requester, filter).map_err(Into::into)
    }

    /// Mean mood index per day over the trailing `days` window ending at
    /// `end_date`, from the requester's own entries.
    pub fn mood_statistics(
        &self,
        requester: UserId,
        end_date: NaiveDate,
        days: u32,
    ) -> Result<Vec<DailyMood>, JournalServiceError> {
        let range = DateRange::trailing_days(end_date, days);
        let entries = self
            .repo
            .list_for_author(requester, &range_filter(range))?;
        Ok(daily_average(&observations(&entries)?, range))
    }

    /// Mean mood index per (complexity, priority) bucket from the
    /// requester's own task-linked entries.
    pub fn heatmap(
        &self,
        requester: UserId,
    ) -> Result<Vec<MoodBucket<(Complexity, Priority)>>, JournalServiceError> {
        let samples = self.repo.task_mood_samples_for_author(requester)?;
        Ok(bucket_average(
            &samples,
            |sample| Some(sample.signal),
            |sample| Some((sample.complexity, sample.priority)),
        ))
    }

    /// Daily min/mean/max/count for one task, over the requester's
    /// visibility scope.
    pub fn task_mood_statistics(
        &self,
        requester: UserId,
        task: TaskId,
        range: DateRange,
    ) -> Result<Vec<DailyMoodStats>, JournalServiceError> {
        if !self.repo.task_exists(task)? {
            return Err(JournalServiceError::TaskNotFound(task));
        }
        let filter = JournalFilter {
            task: Some(task),
            ..range_filter(range)
        };
        let entries = self.repo.list_visible_to(requester, &filter)?;
        Ok(daily_stats(&observations(&entries)?, range))
    }

    /// Daily min/mean/max/count across every task of one board, over the
    /// requester's visibility scope.
    pub fn board_mood_overview(
        &self,
        requester: UserId,
        board: BoardId,
        range: DateRange,
    ) -> Result<Vec<DailyMoodStats>, JournalServiceError> {
        if !self.repo.board_exists(board)? {
            return Err(JournalServiceError::BoardNotFound(board));
        }
        let filter = JournalFilter {
            board: Some(board),
            ..range_filter(range)
        };
        let entries = self.repo.list_visible_to(requester, &filter)?;
        Ok(daily_stats(&observations(&entries)?, range))
    }

    /// Chronological visible entries for one task, oldest first.
    pub fn task_mood_history(
        &self,
        requester: UserId,
        task: TaskId,
    ) -> Result<Vec<JournalEntry>, JournalServiceError> {
        if !self.repo.task_exists(task)? {
            return Err(JournalServiceError::TaskNotFound(task));
        }
        let filter = JournalFilter {
            task: Some(task),
            ..JournalFilter::default()
        };
        let mut entries = self.repo.list_visible_to(requester, &filter)?;
        entries.sort_by_key(|entry| (entry.created_at, entry.uuid));
        Ok(entries)
    }
}

fn observations(
    entries: &[JournalEntry],
) -> Result<Vec<MoodObservation>, JournalServiceError> {
    entries
        .iter()
        .map(|entry| {
            let recorded_at = DateTime::<Utc>::from_timestamp_millis(entry.created_at).ok_or(
                JournalServiceError::InvalidTimestamp {
                    entry: entry.uuid,
                    created_at_ms: entry.created_at,
                },
            )?;
            Ok(MoodObservation {
                recorded_at,
                signal: entry.signal,
            })
        })
        .collect()
}

/// Maps an inclusive calendar-date window onto `created_at` bounds so the
/// store pre-filters what the engine would drop anyway.
fn range_filter(range: DateRange) -> JournalFilter {
    JournalFilter {
        created_from_ms: range
            .start
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|at| at.and_utc().timestamp_millis()),
        created_to_ms: range
            .end
            .and_then(|date| date.and_hms_milli_opt(23, 59, 59, 999))
            .map(|at| at.and_utc().timestamp_millis()),
        ..JournalFilter::default()
    }
}
