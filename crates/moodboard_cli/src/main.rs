//! CLI smoke entry point.
//!
//! # Responsibility
//! - Seed a demo workspace in an in-memory database and print its
//!   dashboard and mood rollups, verifying `moodboard_core` wiring end to
//!   end without any UI runtime.

use chrono::Utc;
use moodboard_core::db::open_db_in_memory;
use moodboard_core::{
    bootstrap_user, core_version, JournalService, SqliteJournalRepository, SqliteTaskRepository,
    SqliteUserRepository, TaskService, User, UserRepository,
};
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    println!("moodboard_core version={}", core_version());

    let conn = open_db_in_memory()?;
    let users = SqliteUserRepository::try_new(&conn)?;
    let demo = User::new("demo");
    users.create_user(&demo)?;

    let summary = bootstrap_user(&conn, &demo)?;
    println!(
        "seeded `{}`: {} lists, {} tasks, {} journal entries",
        summary.board.name,
        summary.lists.len(),
        summary.tasks,
        summary.entries
    );

    let now = Utc::now();
    let tasks = TaskService::new(SqliteTaskRepository::try_new(&conn)?);
    let dashboard = tasks.dashboard(demo.uuid, now.timestamp_millis())?;
    println!(
        "dashboard: {} tasks total, {} completed, {} open",
        dashboard.total_tasks,
        dashboard.completed_tasks,
        dashboard.open_tasks.len()
    );

    let journal = JournalService::new(SqliteJournalRepository::try_new(&conn)?);
    println!("mood index, last 30 days:");
    for row in journal.mood_statistics(demo.uuid, now.date_naive(), 30)? {
        println!("  {}  mean={:.3}", row.date, row.mean_index);
    }

    println!("mood heatmap (complexity, priority):");
    for bucket in journal.heatmap(demo.uuid)? {
        let (complexity, priority) = bucket.key;
        println!(
            "  {:6} x {:6}  mean={:.3}",
            complexity.label(),
            priority.label(),
            bucket.mean_index
        );
    }

    Ok(())
}
