//! New-account workspace seeding.
//!
//! # Responsibility
//! - Populate a fresh user's board, lists, tasks and journal entries in
//!   one call, invoked by the (external) registration flow exactly once
//!   per account.
//!
//! # Invariants
//! - Seeded positions go through the regular repositories, so every
//!   container satisfies the gap-free invariant afterwards.
//! - One task per priority x complexity combination, each with 2..=5
//!   back-dated, signal-bearing journal entries.

use crate::model::board::{Board, TaskList};
use crate::model::task::{Complexity, Priority, Task};
use crate::model::user::User;
use crate::repo::board_repo::{BoardRepoError, BoardRepository, SqliteBoardRepository};
use crate::repo::journal_repo::{JournalRepoError, JournalRepository, SqliteJournalRepository};
use crate::repo::task_repo::{SqliteTaskRepository, TaskDraft, TaskRepoError, TaskRepository};
use crate::model::journal::{JournalEntry, Visibility};
use crate::mood::MoodSignal;
use chrono::{Duration, Utc};
use log::info;
use rand::seq::SliceRandom;
use rand::Rng;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const LIST_NAMES: [&str; 3] = ["To Do", "In Progress", "Done"];

const TASK_TITLES: [&str; 15] = [
    "Implement user authentication",
    "Design database schema",
    "Create API endpoints",
    "Write unit tests",
    "Set up CI/CD pipeline",
    "Optimize database queries",
    "Implement caching mechanism",
    "Create user dashboard",
    "Integrate third-party API",
    "Implement real-time notifications",
    "Refactor legacy code",
    "Implement data visualization",
    "Optimize front-end performance",
    "Implement search functionality",
    "Set up monitoring and logging",
];

/// Errors from workspace seeding.
#[derive(Debug)]
pub enum BootstrapError {
    Board(BoardRepoError),
    Task(TaskRepoError),
    Journal(JournalRepoError),
}

impl Display for BootstrapError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Board(err) => write!(f, "{err}"),
            Self::Task(err) => write!(f, "{err}"),
            Self::Journal(err) => write!(f, "{err}"),
        }
    }
}

impl Error for BootstrapError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Board(err) => Some(err),
            Self::Task(err) => Some(err),
            Self::Journal(err) => Some(err),
        }
    }
}

impl From<BoardRepoError> for BootstrapError {
    fn from(value: BoardRepoError) -> Self {
        Self::Board(value)
    }
}

impl From<TaskRepoError> for BootstrapError {
    fn from(value: TaskRepoError) -> Self {
        Self::Task(value)
    }
}

impl From<JournalRepoError> for BootstrapError {
    fn from(value: JournalRepoError) -> Self {
        Self::Journal(value)
    }
}

/// What a seeding run produced.
#[derive(Debug, Clone)]
pub struct BootstrapSummary {
    pub board: Board,
    pub lists: Vec<TaskList>,
    pub tasks: usize,
    pub entries: usize,
}

/// Seeds a starter workspace for a freshly created user.
pub fn bootstrap_user(conn: &Connection, user: &User) -> Result<BootstrapSummary, BootstrapError> {
    let boards = SqliteBoardRepository::try_new(conn)?;
    let tasks = SqliteTaskRepository::try_new(conn)?;
    let journal = SqliteJournalRepository::try_new(conn)?;
    let mut rng = rand::thread_rng();
    let now = Utc::now();

    let board = Board::new(format!("{}'s Board", user.username));
    boards.create_board(&board)?;
    boards.add_member(board.uuid, user.uuid)?;

    let mut lists = Vec::with_capacity(LIST_NAMES.len());
    for name in LIST_NAMES {
        lists.push(boards.create_list(board.uuid, name)?);
    }

    let mut task_count = 0;
    let mut entry_count = 0;
    for (index, (priority, complexity)) in Priority::ALL
        .into_iter()
        .flat_map(|priority| Complexity::ALL.into_iter().map(move |c| (priority, c)))
        .enumerate()
    {
        let title = TASK_TITLES[index % TASK_TITLES.len()];
        let list = lists
            .choose(&mut rng)
            .unwrap_or(&lists[0]);
        let due_at = now + Duration::days(rng.gen_range(1..=30));
        let task = tasks.create_task(&TaskDraft {
            list_uuid: list.uuid,
            title: title.to_string(),
            description: format!("Description for {title}"),
            due_at: Some(due_at.timestamp_millis()),
            priority,
            complexity,
        })?;
        tasks.assign(task.uuid, user.uuid)?;
        task_count += 1;

        for _ in 0..rng.gen_range(2..=5) {
            seed_journal_entry(&journal, user, &task, &mut rng)?;
            entry_count += 1;
        }
    }

    info!(
        "event=bootstrap module=service status=ok user={} board={} tasks={task_count} entries={entry_count}",
        user.uuid, board.uuid
    );

    Ok(BootstrapSummary {
        board,
        lists,
        tasks: task_count,
        entries: entry_count,
    })
}

fn seed_journal_entry<R: JournalRepository>(
    journal: &R,
    user: &User,
    task: &Task,
    rng: &mut impl Rng,
) -> Result<(), BootstrapError> {
    let created_at = Utc::now() - Duration::days(rng.gen_range(1..=14));
    let valence = rng.gen_range(-1.0..=1.0);
    let arousal = rng.gen_range(-1.0..=1.0);
    let visibility = *[Visibility::Private, Visibility::Shared, Visibility::Public]
        .choose(rng)
        .unwrap_or(&Visibility::Private);

    let entry = JournalEntry {
        uuid: Uuid::new_v4(),
        author: user.uuid,
        task: Some(task.uuid),
        title: format!("Update on {}", task.title),
        content: format!(
            "Working on {}. Task priority: {}, complexity: {}. Feeling {}.",
            task.title,
            task.priority.label(),
            task.complexity.label(),
            describe_mood(valence, arousal)
        ),
        created_at: created_at.timestamp_millis(),
        signal: Some(MoodSignal { valence, arousal }),
        visibility,
    };
    journal.create_entry(&entry)?;
    Ok(())
}

/// Maps a signal to the wording used in seeded entry content.
fn describe_mood(valence: f64, arousal: f64) -> &'static str {
    if valence > 0.5 {
        if arousal > 0.5 {
            "excited and positive"
        } else if arousal < -0.5 {
            "calm and content"
        } else {
            "generally good"
        }
    } else if valence < -0.5 {
        if arousal > 0.5 {
            "angry or frustrated"
        } else if arousal < -0.5 {
            "sad or depressed"
        } else {
            "generally negative"
        }
    } else if arousal > 0.5 {
        "alert but neutral"
    } else if arousal < -0.5 {
        "tired or bored"
    } else {
        "neutral"
    }
}
