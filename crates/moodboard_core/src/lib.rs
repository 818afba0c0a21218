//! Core domain logic for moodboard.
//! This crate is the single source of truth for business invariants:
//! gap-free container positions and mood rollup semantics.

pub mod db;
pub mod logging;
pub mod model;
pub mod mood;
pub mod position;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::board::{Board, BoardId, ListId, TaskList};
pub use model::journal::{EntryId, JournalEntry, JournalValidationError, Visibility};
pub use model::task::{Complexity, Priority, Task, TaskId};
pub use model::user::{User, UserId};
pub use mood::{
    bucket_average, daily_average, daily_stats, DailyMood, DailyMoodStats, DateRange, MoodBucket,
    MoodObservation, MoodSignal, SignalError,
};
pub use position::{
    append_position, compact_after_removal, move_across, move_within, ItemId, PositionChange,
    PositionError, PositionedItem, TransferPlan,
};
pub use repo::board_repo::{BoardRepoError, BoardRepository, SqliteBoardRepository};
pub use repo::journal_repo::{
    JournalFilter, JournalRepoError, JournalRepository, SqliteJournalRepository, TaskMoodSample,
};
pub use repo::task_repo::{SqliteTaskRepository, TaskDraft, TaskRepoError, TaskRepository};
pub use repo::user_repo::{SqliteUserRepository, UserRepoError, UserRepository};
pub use service::board_service::{BoardDetail, BoardService, BoardServiceError};
pub use service::bootstrap::{bootstrap_user, BootstrapError, BootstrapSummary};
pub use service::journal_service::{EntryDraft, JournalService, JournalServiceError};
pub use service::task_service::{DashboardSummary, TaskService, TaskServiceError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
