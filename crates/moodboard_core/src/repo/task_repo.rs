//! Task repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist tasks and their assignment links.
//! - Keep each list-of-tasks container gap-free by routing every insert,
//!   move and delete through the position engine; a cross-list move
//!   updates both containers inside one transaction.
//!
//! # Invariants
//! - Task positions within one list are exactly `{0, 1, ..., n-1}`.
//! - `update_task` never touches `list_uuid` or `position`; only
//!   `move_task` may rewrite them.
//! - Task ordering is deterministic: `position ASC, uuid ASC`.

use crate::db::DbError;
use crate::model::board::ListId;
use crate::model::task::{Complexity, Priority, Task, TaskId};
use crate::model::user::UserId;
use crate::position::{self, PositionChange, PositionError, PositionedItem};
use crate::repo::{bool_to_int, ensure_schema_ready, int_to_bool, parse_uuid, SchemaError};
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const TASK_SELECT_SQL: &str = "SELECT
    uuid,
    list_uuid,
    title,
    description,
    due_at,
    priority,
    complexity,
    position,
    completed,
    completed_at
FROM tasks";

pub type TaskRepoResult<T> = Result<T, TaskRepoError>;

/// Errors from task repository operations.
#[derive(Debug)]
pub enum TaskRepoError {
    Schema(SchemaError),
    Db(DbError),
    TaskNotFound(TaskId),
    ListNotFound(ListId),
    /// Invalid target position or unknown item, reported by the engine.
    Position(PositionError),
    InvalidData(String),
}

impl Display for TaskRepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Schema(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::TaskNotFound(id) => write!(f, "task not found: {id}"),
            Self::ListNotFound(id) => write!(f, "list not found: {id}"),
            Self::Position(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted task data: {message}"),
        }
    }
}

impl Error for TaskRepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Schema(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Position(err) => Some(err),
            _ => None,
        }
    }
}

impl From<SchemaError> for TaskRepoError {
    fn from(value: SchemaError) -> Self {
        Self::Schema(value)
    }
}

impl From<rusqlite::Error> for TaskRepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<PositionError> for TaskRepoError {
    fn from(value: PositionError) -> Self {
        Self::Position(value)
    }
}

/// Field set for creating a task; the position is assigned by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    pub list_uuid: ListId,
    pub title: String,
    pub description: String,
    pub due_at: Option<i64>,
    pub priority: Priority,
    pub complexity: Complexity,
}

/// Repository interface for task persistence and ordering.
pub trait TaskRepository {
    /// Appends one task at the end of its list.
    fn create_task(&self, draft: &TaskDraft) -> TaskRepoResult<Task>;
    /// Updates task fields other than list and position.
    fn update_task(&self, task: &Task) -> TaskRepoResult<()>;
    /// Loads one task by stable ID.
    fn get_task(&self, id: TaskId) -> TaskRepoResult<Option<Task>>;
    /// Lists a list's tasks in position order.
    fn list_tasks(&self, list: ListId) -> TaskRepoResult<Vec<Task>>;
    /// Moves one task within its list, or into `dest_list` when given.
    fn move_task(
        &self,
        task: TaskId,
        dest_list: Option<ListId>,
        new_position: i64,
    ) -> TaskRepoResult<()>;
    /// Deletes one task and compacts the remaining positions.
    fn delete_task(&self, task: TaskId) -> TaskRepoResult<()>;
    /// Assigns one user; idempotent for existing assignees.
    fn assign(&self, task: TaskId, user: UserId) -> TaskRepoResult<()>;
    /// Lists assignee ids of one task.
    fn assignees(&self, task: TaskId) -> TaskRepoResult<Vec<UserId>>;
    /// Lists tasks assigned to the user, soonest due date first.
    fn tasks_assigned_to(&self, user: UserId) -> TaskRepoResult<Vec<Task>>;
}

/// SQLite-backed task repository.
pub struct SqliteTaskRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTaskRepository<'conn> {
    /// Creates the repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> TaskRepoResult<Self> {
        ensure_schema_ready(conn, &["lists", "tasks", "task_assignees"])?;
        Ok(Self { conn })
    }

    fn ensure_list_exists(&self, list: ListId) -> TaskRepoResult<()> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM lists WHERE uuid = ?1);",
            [list.to_string()],
            |row| row.get(0),
        )?;
        if exists != 1 {
            return Err(TaskRepoError::ListNotFound(list));
        }
        Ok(())
    }
}

impl TaskRepository for SqliteTaskRepository<'_> {
    fn create_task(&self, draft: &TaskDraft) -> TaskRepoResult<Task> {
        self.ensure_list_exists(draft.list_uuid)?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let snapshot = load_task_positions(&tx, draft.list_uuid)?;
        let task = Task {
            uuid: Uuid::new_v4(),
            list_uuid: draft.list_uuid,
            title: draft.title.clone(),
            description: draft.description.clone(),
            due_at: draft.due_at,
            priority: draft.priority,
            complexity: draft.complexity,
            position: position::append_position(&snapshot),
            completed: false,
            completed_at: None,
        };
        tx.execute(
            "INSERT INTO tasks (
                uuid,
                list_uuid,
                title,
                description,
                due_at,
                priority,
                complexity,
                position,
                completed,
                completed_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 0, NULL);",
            params![
                task.uuid.to_string(),
                task.list_uuid.to_string(),
                task.title.as_str(),
                task.description.as_str(),
                task.due_at,
                priority_to_db(task.priority),
                complexity_to_db(task.complexity),
                task.position,
            ],
        )?;
        tx.commit()?;
        Ok(task)
    }

    fn update_task(&self, task: &Task) -> TaskRepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE tasks
             SET title = ?2,
                 description = ?3,
                 due_at = ?4,
                 priority = ?5,
                 complexity = ?6,
                 completed = ?7,
                 completed_at = ?8,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            params![
                task.uuid.to_string(),
                task.title.as_str(),
                task.description.as_str(),
                task.due_at,
                priority_to_db(task.priority),
                complexity_to_db(task.complexity),
                bool_to_int(task.completed),
                task.completed_at,
            ],
        )?;
        if changed == 0 {
            return Err(TaskRepoError::TaskNotFound(task.uuid));
        }
        Ok(())
    }

    fn get_task(&self, id: TaskId) -> TaskRepoResult<Option<Task>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TASK_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_task_row(row)?));
        }
        Ok(None)
    }

    fn list_tasks(&self, list: ListId) -> TaskRepoResult<Vec<Task>> {
        self.ensure_list_exists(list)?;
        let mut stmt = self.conn.prepare(&format!(
            "{TASK_SELECT_SQL}
             WHERE list_uuid = ?1
             ORDER BY position ASC, uuid ASC;"
        ))?;
        let mut rows = stmt.query([list.to_string()])?;

        let mut tasks = Vec::new();
        while let Some(row) = rows.next()? {
            tasks.push(parse_task_row(row)?);
        }
        Ok(tasks)
    }

    fn move_task(
        &self,
        task: TaskId,
        dest_list: Option<ListId>,
        new_position: i64,
    ) -> TaskRepoResult<()> {
        let current = self
            .get_task(task)?
            .ok_or(TaskRepoError::TaskNotFound(task))?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        match dest_list {
            Some(dest) if dest != current.list_uuid => {
                let dest_exists: i64 = tx.query_row(
                    "SELECT EXISTS(SELECT 1 FROM lists WHERE uuid = ?1);",
                    [dest.to_string()],
                    |row| row.get(0),
                )?;
                if dest_exists != 1 {
                    return Err(TaskRepoError::ListNotFound(dest));
                }

                let source_snapshot = load_task_positions(&tx, current.list_uuid)?;
                let dest_snapshot = load_task_positions(&tx, dest)?;
                let plan = position::move_across(&source_snapshot, &dest_snapshot, task, new_position)?;

                apply_task_positions(&tx, &plan.source_changes)?;
                apply_task_positions(&tx, &plan.dest_changes)?;
                tx.execute(
                    "UPDATE tasks
                     SET list_uuid = ?2,
                         position = ?3,
                         updated_at = (strftime('%s', 'now') * 1000)
                     WHERE uuid = ?1;",
                    params![task.to_string(), dest.to_string(), plan.moved_position],
                )?;
            }
            _ => {
                let snapshot = load_task_positions(&tx, current.list_uuid)?;
                let changes = position::move_within(&snapshot, task, new_position)?;
                apply_task_positions(&tx, &changes)?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn delete_task(&self, task: TaskId) -> TaskRepoResult<()> {
        let removed = self
            .get_task(task)?
            .ok_or(TaskRepoError::TaskNotFound(task))?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        tx.execute("DELETE FROM tasks WHERE uuid = ?1;", [task.to_string()])?;
        let remaining = load_task_positions(&tx, removed.list_uuid)?;
        let changes = position::compact_after_removal(&remaining, removed.position);
        apply_task_positions(&tx, &changes)?;
        tx.commit()?;
        Ok(())
    }

    fn assign(&self, task: TaskId, user: UserId) -> TaskRepoResult<()> {
        if self.get_task(task)?.is_none() {
            return Err(TaskRepoError::TaskNotFound(task));
        }
        self.conn.execute(
            "INSERT OR IGNORE INTO task_assignees (task_uuid, user_uuid) VALUES (?1, ?2);",
            params![task.to_string(), user.to_string()],
        )?;
        Ok(())
    }

    fn assignees(&self, task: TaskId) -> TaskRepoResult<Vec<UserId>> {
        if self.get_task(task)?.is_none() {
            return Err(TaskRepoError::TaskNotFound(task));
        }
        let mut stmt = self.conn.prepare(
            "SELECT user_uuid
             FROM task_assignees
             WHERE task_uuid = ?1
             ORDER BY user_uuid ASC;",
        )?;
        let mut rows = stmt.query([task.to_string()])?;

        let mut users = Vec::new();
        while let Some(row) = rows.next()? {
            let value: String = row.get(0)?;
            users.push(
                parse_uuid(&value, "task_assignees.user_uuid")
                    .map_err(TaskRepoError::InvalidData)?,
            );
        }
        Ok(users)
    }

    fn tasks_assigned_to(&self, user: UserId) -> TaskRepoResult<Vec<Task>> {
        let mut stmt = self.conn.prepare(&format!(
            "{TASK_SELECT_SQL}
             WHERE uuid IN (SELECT task_uuid FROM task_assignees WHERE user_uuid = ?1)
             ORDER BY due_at IS NULL, due_at ASC, uuid ASC;"
        ))?;
        let mut rows = stmt.query([user.to_string()])?;

        let mut tasks = Vec::new();
        while let Some(row) = rows.next()? {
            tasks.push(parse_task_row(row)?);
        }
        Ok(tasks)
    }
}

fn load_task_positions(conn: &Connection, list: ListId) -> TaskRepoResult<Vec<PositionedItem>> {
    let mut stmt = conn.prepare(
        "SELECT uuid, position
         FROM tasks
         WHERE list_uuid = ?1
         ORDER BY position ASC, uuid ASC;",
    )?;
    let mut rows = stmt.query([list.to_string()])?;

    let mut items = Vec::new();
    while let Some(row) = rows.next()? {
        let uuid_text: String = row.get(0)?;
        items.push(PositionedItem {
            id: parse_uuid(&uuid_text, "tasks.uuid").map_err(TaskRepoError::InvalidData)?,
            position: row.get(1)?,
        });
    }
    Ok(items)
}

fn apply_task_positions(conn: &Connection, changes: &[PositionChange]) -> TaskRepoResult<()> {
    for change in changes {
        conn.execute(
            "UPDATE tasks
             SET position = ?2,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            params![change.id.to_string(), change.position],
        )?;
    }
    Ok(())
}

fn parse_task_row(row: &Row<'_>) -> TaskRepoResult<Task> {
    let uuid_text: String = row.get("uuid")?;
    let list_text: String = row.get("list_uuid")?;

    let priority_value: i64 = row.get("priority")?;
    let priority = parse_priority(priority_value).ok_or_else(|| {
        TaskRepoError::InvalidData(format!(
            "invalid priority `{priority_value}` in tasks.priority"
        ))
    })?;
    let complexity_value: i64 = row.get("complexity")?;
    let complexity = parse_complexity(complexity_value).ok_or_else(|| {
        TaskRepoError::InvalidData(format!(
            "invalid complexity `{complexity_value}` in tasks.complexity"
        ))
    })?;

    let completed = int_to_bool(row.get("completed")?, "tasks.completed")
        .map_err(TaskRepoError::InvalidData)?;

    Ok(Task {
        uuid: parse_uuid(&uuid_text, "tasks.uuid").map_err(TaskRepoError::InvalidData)?,
        list_uuid: parse_uuid(&list_text, "tasks.list_uuid").map_err(TaskRepoError::InvalidData)?,
        title: row.get("title")?,
        description: row.get("description")?,
        due_at: row.get("due_at")?,
        priority,
        complexity,
        position: row.get("position")?,
        completed,
        completed_at: row.get("completed_at")?,
    })
}

pub(crate) fn priority_to_db(priority: Priority) -> i64 {
    match priority {
        Priority::Low => 1,
        Priority::Medium => 2,
        Priority::High => 3,
    }
}

pub(crate) fn parse_priority(value: i64) -> Option<Priority> {
    match value {
        1 => Some(Priority::Low),
        2 => Some(Priority::Medium),
        3 => Some(Priority::High),
        _ => None,
    }
}

pub(crate) fn complexity_to_db(complexity: Complexity) -> i64 {
    match complexity {
        Complexity::Easy => 1,
        Complexity::Medium => 2,
        Complexity::Hard => 3,
    }
}

pub(crate) fn parse_complexity(value: i64) -> Option<Complexity> {
    match value {
        1 => Some(Complexity::Easy),
        2 => Some(Complexity::Medium),
        3 => Some(Complexity::Hard),
        _ => None,
    }
}
