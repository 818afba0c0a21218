//! Task use-case service.
//!
//! # Responsibility
//! - Validate task input and orchestrate task lifecycle operations.
//! - Derive the per-user dashboard summary.
//!
//! # Invariants
//! - Move semantics (including cross-list transfer) are delegated to the
//!   repository/position engine unchanged; invalid positions surface as
//!   errors, never clamped.

use crate::model::board::ListId;
use crate::model::task::{Task, TaskId};
use crate::model::user::UserId;
use crate::position::PositionError;
use crate::repo::task_repo::{TaskDraft, TaskRepoError, TaskRepository};
use std::error::Error;
use std::fmt::{Display, Formatter};

const WEEK_MS: i64 = 7 * 24 * 60 * 60 * 1000;

/// Errors from task service operations.
#[derive(Debug)]
pub enum TaskServiceError {
    /// Title is blank after trimming.
    BlankTitle,
    TaskNotFound(TaskId),
    ListNotFound(ListId),
    /// Invalid target position, reported by the engine.
    Position(PositionError),
    /// Repository-level failure.
    Repo(TaskRepoError),
}

impl Display for TaskServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankTitle => write!(f, "task title must not be blank"),
            Self::TaskNotFound(id) => write!(f, "task not found: {id}"),
            Self::ListNotFound(id) => write!(f, "list not found: {id}"),
            Self::Position(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for TaskServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Position(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TaskRepoError> for TaskServiceError {
    fn from(value: TaskRepoError) -> Self {
        match value {
            TaskRepoError::TaskNotFound(id) => Self::TaskNotFound(id),
            TaskRepoError::ListNotFound(id) => Self::ListNotFound(id),
            TaskRepoError::Position(err) => Self::Position(err),
            other => Self::Repo(other),
        }
    }
}

/// Per-user task overview for the dashboard surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardSummary {
    pub total_tasks: u64,
    pub completed_tasks: u64,
    /// Tasks completed within the trailing seven days.
    pub completed_last_week: u64,
    /// Open tasks, soonest due date first.
    pub open_tasks: Vec<Task>,
}

/// Task use-case facade.
pub struct TaskService<R: TaskRepository> {
    repo: R,
}

impl<R: TaskRepository> TaskService<R> {
    /// Creates the service from a repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates a task at the end of its list and assigns the given users.
    pub fn create_task(
        &self,
        draft: TaskDraft,
        assignees: &[UserId],
    ) -> Result<Task, TaskServiceError> {
        if draft.title.trim().is_empty() {
            return Err(TaskServiceError::BlankTitle);
        }
        let task = self.repo.create_task(&draft)?;
        for user in assignees {
            self.repo.assign(task.uuid, *user)?;
        }
        Ok(task)
    }

    /// Loads one task.
    pub fn get_task(&self, id: TaskId) -> Result<Option<Task>, TaskServiceError> {
        self.repo.get_task(id).map_err(Into::into)
    }

    /// Lists a list's tasks in position order.
    pub fn list_tasks(&self, list: ListId) -> Result<Vec<Task>, TaskServiceError> {
        self.repo.list_tasks(list).map_err(Into::into)
    }

    /// Updates task fields other than list and position.
    pub fn update_task(&self, task: &Task) -> Result<(), TaskServiceError> {
        if task.title.trim().is_empty() {
            return Err(TaskServiceError::BlankTitle);
        }
        self.repo.update_task(task).map_err(Into::into)
    }

    /// Moves a task within its list, or into `dest_list` when given.
    pub fn move_task(
        &self,
        task: TaskId,
        dest_list: Option<ListId>,
        new_position: i64,
    ) -> Result<(), TaskServiceError> {
        self.repo
            .move_task(task, dest_list, new_position)
            .map_err(Into::into)
    }

    /// Marks a task completed at `now_ms`.
    pub fn complete_task(&self, task: TaskId, now_ms: i64) -> Result<Task, TaskServiceError> {
        let mut record = self
            .repo
            .get_task(task)?
            .ok_or(TaskServiceError::TaskNotFound(task))?;
        record.complete(now_ms);
        self.repo.update_task(&record)?;
        Ok(record)
    }

    /// Assigns a user to a task.
    pub fn assign(&self, task: TaskId, user: UserId) -> Result<(), TaskServiceError> {
        self.repo.assign(task, user).map_err(Into::into)
    }

    /// Deletes a task; remaining positions in its list are compacted.
    pub fn delete_task(&self, task: TaskId) -> Result<(), TaskServiceError> {
        self.repo.delete_task(task).map_err(Into::into)
    }

    /// Tasks the user can link journal entries to.
    pub fn available_tasks(&self, user: UserId) -> Result<Vec<Task>, TaskServiceError> {
        self.repo.tasks_assigned_to(user).map_err(Into::into)
    }

    /// Builds the user's dashboard summary as of `now_ms`.
    pub fn dashboard(
        &self,
        user: UserId,
        now_ms: i64,
    ) -> Result<DashboardSummary, TaskServiceError> {
        let tasks = self.repo.tasks_assigned_to(user)?;
        let completed_tasks = tasks.iter().filter(|task| task.completed).count() as u64;
        let completed_last_week = tasks
            .iter()
            .filter(|task| {
                task.completed
                    && task
                        .completed_at
                        .is_some_and(|at| at >= now_ms - WEEK_MS)
            })
            .count() as u64;
        let open_tasks = tasks
            .iter()
            .filter(|task| !task.completed)
            .cloned()
            .collect();

        Ok(DashboardSummary {
            total_tasks: tasks.len() as u64,
            completed_tasks,
            completed_last_week,
            open_tasks,
        })
    }
}
