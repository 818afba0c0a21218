use chrono::{NaiveDate, TimeZone, Utc};
use moodboard_core::db::open_db_in_memory;
use moodboard_core::{
    BoardId, BoardService, Complexity, DateRange, EntryDraft, JournalFilter,
    JournalService, JournalServiceError, JournalValidationError, Priority, SignalError,
    SqliteBoardRepository, SqliteJournalRepository, SqliteTaskRepository, SqliteUserRepository,
    TaskDraft, TaskId, TaskRepository, User, UserRepository, Visibility,
};
use rusqlite::Connection;
use uuid::Uuid;

struct Fixture {
    conn: Connection,
    alice: User,
    bob: User,
    carol: User,
    board: BoardId,
    task: TaskId,
    hard_task: TaskId,
}

fn setup() -> Fixture {
    let conn = open_db_in_memory().unwrap();

    let users = SqliteUserRepository::try_new(&conn).unwrap();
    let alice = User::new("alice");
    let bob = User::new("bob");
    let carol = User::new("carol");
    for user in [&alice, &bob, &carol] {
        users.create_user(user).unwrap();
    }

    let boards = BoardService::new(SqliteBoardRepository::try_new(&conn).unwrap());
    let board = boards.create_board("Work", alice.uuid).unwrap();
    let list = boards.create_list(alice.uuid, board.uuid, "To Do").unwrap();

    let tasks = SqliteTaskRepository::try_new(&conn).unwrap();
    let task = tasks
        .create_task(&TaskDraft {
            list_uuid: list.uuid,
            title: "Design schema".to_string(),
            description: String::new(),
            due_at: None,
            priority: Priority::Low,
            complexity: Complexity::Easy,
        })
        .unwrap();
    let hard_task = tasks
        .create_task(&TaskDraft {
            list_uuid: list.uuid,
            title: "Refactor core".to_string(),
            description: String::new(),
            due_at: None,
            priority: Priority::High,
            complexity: Complexity::Hard,
        })
        .unwrap();

    let board = board.uuid;
    let (task, hard_task) = (task.uuid, hard_task.uuid);
    Fixture {
        conn,
        alice,
        bob,
        carol,
        board,
        task,
        hard_task,
    }
}

fn journal(fixture: &Fixture) -> JournalService<SqliteJournalRepository<'_>> {
    JournalService::new(SqliteJournalRepository::try_new(&fixture.conn).unwrap())
}

fn ms(year: i32, month: u32, day: u32) -> i64 {
    Utc.with_ymd_and_hms(year, month, day, 12, 0, 0)
        .single()
        .unwrap()
        .timestamp_millis()
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

fn signal_draft(
    author: &User,
    title: &str,
    created_at_ms: i64,
    valence: f64,
    arousal: f64,
) -> EntryDraft {
    EntryDraft {
        valence: Some(valence),
        arousal: Some(arousal),
        created_at_ms: Some(created_at_ms),
        ..EntryDraft::new(author.uuid, title)
    }
}

#[test]
fn one_sided_signals_never_persist() {
    let fixture = setup();
    let service = journal(&fixture);

    let draft = EntryDraft {
        valence: Some(0.4),
        ..EntryDraft::new(fixture.alice.uuid, "half a signal")
    };
    let err = service.create_entry(draft).unwrap_err();
    assert!(matches!(
        err,
        JournalServiceError::Validation(JournalValidationError::Signal(
            SignalError::Inconsistent
        ))
    ));

    assert!(service
        .entries_for(fixture.alice.uuid, &JournalFilter::default())
        .unwrap()
        .is_empty());
}

#[test]
fn out_of_range_signals_are_rejected() {
    let fixture = setup();
    let service = journal(&fixture);

    let draft = EntryDraft {
        valence: Some(1.2),
        arousal: Some(0.0),
        ..EntryDraft::new(fixture.alice.uuid, "too much")
    };
    assert!(matches!(
        service.create_entry(draft).unwrap_err(),
        JournalServiceError::Validation(JournalValidationError::Signal(
            SignalError::OutOfRange { .. }
        ))
    ));
}

#[test]
fn future_timestamps_are_rejected() {
    let fixture = setup();
    let service = journal(&fixture);

    let far_future = Utc::now().timestamp_millis() + 365 * 24 * 60 * 60 * 1000;
    let draft = EntryDraft {
        created_at_ms: Some(far_future),
        ..EntryDraft::new(fixture.alice.uuid, "from tomorrow")
    };
    assert!(matches!(
        service.create_entry(draft).unwrap_err(),
        JournalServiceError::CreatedAtInFuture { .. }
    ));
}

#[test]
fn linking_an_unknown_task_is_rejected() {
    let fixture = setup();
    let service = journal(&fixture);

    let draft = EntryDraft {
        task: Some(Uuid::new_v4()),
        ..EntryDraft::new(fixture.alice.uuid, "dangling link")
    };
    assert!(matches!(
        service.create_entry(draft).unwrap_err(),
        JournalServiceError::TaskNotFound(_)
    ));
}

#[test]
fn visibility_scope_covers_owner_share_target_and_public() {
    let fixture = setup();
    let service = journal(&fixture);

    service
        .create_entry(EntryDraft {
            visibility: Visibility::Private,
            ..EntryDraft::new(fixture.alice.uuid, "private thoughts")
        })
        .unwrap();
    service
        .create_entry(EntryDraft {
            visibility: Visibility::Shared,
            shared_with: vec![fixture.bob.uuid],
            ..EntryDraft::new(fixture.alice.uuid, "shared with bob")
        })
        .unwrap();
    service
        .create_entry(EntryDraft {
            visibility: Visibility::Public,
            ..EntryDraft::new(fixture.alice.uuid, "public note")
        })
        .unwrap();

    let repo = SqliteJournalRepository::try_new(&fixture.conn).unwrap();
    use moodboard_core::JournalRepository;

    let for_alice = repo
        .list_visible_to(fixture.alice.uuid, &JournalFilter::default())
        .unwrap();
    assert_eq!(for_alice.len(), 3);

    let for_bob = repo
        .list_visible_to(fixture.bob.uuid, &JournalFilter::default())
        .unwrap();
    let bob_titles: Vec<&str> = for_bob.iter().map(|entry| entry.title.as_str()).collect();
    assert_eq!(for_bob.len(), 2);
    assert!(bob_titles.contains(&"shared with bob"));
    assert!(bob_titles.contains(&"public note"));

    let for_carol = repo
        .list_visible_to(fixture.carol.uuid, &JournalFilter::default())
        .unwrap();
    assert_eq!(for_carol.len(), 1);
    assert_eq!(for_carol[0].title, "public note");
}

#[test]
fn only_the_author_may_update_or_delete() {
    let fixture = setup();
    let service = journal(&fixture);

    let entry = service
        .create_entry(EntryDraft::new(fixture.alice.uuid, "mine"))
        .unwrap();

    let mut tampered = entry.clone();
    tampered.title = "bob's now".to_string();
    assert!(matches!(
        service.update_entry(fixture.bob.uuid, &tampered, None),
        Err(JournalServiceError::NotEntryAuthor { .. })
    ));
    assert!(matches!(
        service.delete_entry(fixture.bob.uuid, entry.uuid),
        Err(JournalServiceError::NotEntryAuthor { .. })
    ));

    service.delete_entry(fixture.alice.uuid, entry.uuid).unwrap();
}

#[test]
fn leaving_shared_visibility_clears_the_share_set() {
    let fixture = setup();
    let service = journal(&fixture);
    let repo = SqliteJournalRepository::try_new(&fixture.conn).unwrap();
    use moodboard_core::JournalRepository;

    let entry = service
        .create_entry(EntryDraft {
            visibility: Visibility::Shared,
            shared_with: vec![fixture.bob.uuid],
            ..EntryDraft::new(fixture.alice.uuid, "shared for a while")
        })
        .unwrap();
    assert_eq!(repo.shared_with(entry.uuid).unwrap(), vec![fixture.bob.uuid]);

    let mut updated = entry.clone();
    updated.visibility = Visibility::Private;
    service
        .update_entry(fixture.alice.uuid, &updated, None)
        .unwrap();

    assert!(repo.shared_with(entry.uuid).unwrap().is_empty());
    assert_eq!(
        repo.list_visible_to(fixture.bob.uuid, &JournalFilter::default())
            .unwrap()
            .len(),
        0
    );
}

#[test]
fn mood_statistics_average_per_day_excluding_absent_signals() {
    let fixture = setup();
    let service = journal(&fixture);

    service
        .create_entry(signal_draft(&fixture.alice, "good day", ms(2024, 3, 1), 0.6, 0.8))
        .unwrap();
    service
        .create_entry(signal_draft(&fixture.alice, "flat day", ms(2024, 3, 1), 0.0, 0.0))
        .unwrap();
    service
        .create_entry(EntryDraft {
            created_at_ms: Some(ms(2024, 3, 2)),
            ..EntryDraft::new(fixture.alice.uuid, "no signal")
        })
        .unwrap();

    let rows = service
        .mood_statistics(fixture.alice.uuid, date(2024, 3, 5), 30)
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].date, date(2024, 3, 1));
    assert!((rows[0].mean_index - 0.5).abs() < 1e-12);
}

#[test]
fn mood_statistics_only_see_the_requesters_entries() {
    let fixture = setup();
    let service = journal(&fixture);

    service
        .create_entry(signal_draft(&fixture.alice, "alice", ms(2024, 3, 1), 0.6, 0.8))
        .unwrap();
    service
        .create_entry(EntryDraft {
            visibility: Visibility::Public,
            ..signal_draft(&fixture.bob, "bob public", ms(2024, 3, 1), 0.0, 0.0)
        })
        .unwrap();

    let rows = service
        .mood_statistics(fixture.alice.uuid, date(2024, 3, 5), 30)
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert!((rows[0].mean_index - 1.0).abs() < 1e-12);
}

#[test]
fn task_mood_statistics_respect_the_visibility_scope() {
    let fixture = setup();
    let service = journal(&fixture);

    service
        .create_entry(EntryDraft {
            task: Some(fixture.task),
            visibility: Visibility::Private,
            ..signal_draft(&fixture.alice, "alice private", ms(2024, 3, 1), 0.6, 0.8)
        })
        .unwrap();
    service
        .create_entry(EntryDraft {
            task: Some(fixture.task),
            visibility: Visibility::Public,
            ..signal_draft(&fixture.bob, "bob public", ms(2024, 3, 1), 0.0, 0.0)
        })
        .unwrap();

    let range = DateRange {
        start: Some(date(2024, 3, 1)),
        end: Some(date(2024, 3, 1)),
    };

    let for_alice = service
        .task_mood_statistics(fixture.alice.uuid, fixture.task, range)
        .unwrap();
    assert_eq!(for_alice.len(), 1);
    assert_eq!(for_alice[0].entries, 2);
    assert!((for_alice[0].mean_index - 0.5).abs() < 1e-12);
    assert!((for_alice[0].min_index - 0.0).abs() < 1e-12);
    assert!((for_alice[0].max_index - 1.0).abs() < 1e-12);

    // Carol cannot see alice's private entry, only bob's public one.
    let for_carol = service
        .task_mood_statistics(fixture.carol.uuid, fixture.task, range)
        .unwrap();
    assert_eq!(for_carol.len(), 1);
    assert_eq!(for_carol[0].entries, 1);
    assert!((for_carol[0].mean_index - 0.0).abs() < 1e-12);

    assert!(matches!(
        service.task_mood_statistics(fixture.alice.uuid, Uuid::new_v4(), range),
        Err(JournalServiceError::TaskNotFound(_))
    ));
}

#[test]
fn board_mood_overview_covers_all_board_tasks() {
    let fixture = setup();
    let service = journal(&fixture);

    service
        .create_entry(EntryDraft {
            task: Some(fixture.task),
            visibility: Visibility::Public,
            ..signal_draft(&fixture.alice, "on task", ms(2024, 3, 1), 0.6, 0.8)
        })
        .unwrap();
    service
        .create_entry(EntryDraft {
            task: Some(fixture.hard_task),
            visibility: Visibility::Public,
            ..signal_draft(&fixture.alice, "on hard task", ms(2024, 3, 2), 0.0, 0.0)
        })
        .unwrap();
    // Not linked to any task: never part of a board overview.
    service
        .create_entry(EntryDraft {
            visibility: Visibility::Public,
            ..signal_draft(&fixture.alice, "unlinked", ms(2024, 3, 1), 1.0, 0.0)
        })
        .unwrap();

    let rows = service
        .board_mood_overview(fixture.bob.uuid, fixture.board, DateRange::default())
        .unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].date, date(2024, 3, 1));
    assert!((rows[0].mean_index - 1.0).abs() < 1e-12);
    assert_eq!(rows[1].date, date(2024, 3, 2));
    assert!((rows[1].mean_index - 0.0).abs() < 1e-12);

    assert!(matches!(
        service.board_mood_overview(fixture.alice.uuid, Uuid::new_v4(), DateRange::default()),
        Err(JournalServiceError::BoardNotFound(_))
    ));
}

#[test]
fn heatmap_buckets_by_complexity_then_priority() {
    let fixture = setup();
    let service = journal(&fixture);

    service
        .create_entry(EntryDraft {
            task: Some(fixture.task),
            ..signal_draft(&fixture.alice, "easy/low", ms(2024, 3, 1), 0.6, 0.8)
        })
        .unwrap();
    service
        .create_entry(EntryDraft {
            task: Some(fixture.hard_task),
            ..signal_draft(&fixture.alice, "hard/high", ms(2024, 3, 1), 0.0, 0.0)
        })
        .unwrap();
    // Unlinked and signal-less entries stay out of the heatmap.
    service
        .create_entry(signal_draft(&fixture.alice, "unlinked", ms(2024, 3, 1), 1.0, 0.0))
        .unwrap();

    let buckets = service.heatmap(fixture.alice.uuid).unwrap();
    assert_eq!(buckets.len(), 2);
    assert_eq!(buckets[0].key, (Complexity::Easy, Priority::Low));
    assert!((buckets[0].mean_index - 1.0).abs() < 1e-12);
    assert_eq!(buckets[1].key, (Complexity::Hard, Priority::High));
    assert!((buckets[1].mean_index - 0.0).abs() < 1e-12);
}

#[test]
fn task_mood_history_is_chronological_and_scoped() {
    let fixture = setup();
    let service = journal(&fixture);

    service
        .create_entry(EntryDraft {
            task: Some(fixture.task),
            visibility: Visibility::Public,
            ..signal_draft(&fixture.alice, "second", ms(2024, 3, 2), 0.1, 0.1)
        })
        .unwrap();
    service
        .create_entry(EntryDraft {
            task: Some(fixture.task),
            visibility: Visibility::Public,
            ..signal_draft(&fixture.alice, "first", ms(2024, 3, 1), 0.2, 0.2)
        })
        .unwrap();
    service
        .create_entry(EntryDraft {
            task: Some(fixture.task),
            visibility: Visibility::Private,
            ..signal_draft(&fixture.alice, "hidden", ms(2024, 3, 3), 0.3, 0.3)
        })
        .unwrap();

    let history = service
        .task_mood_history(fixture.bob.uuid, fixture.task)
        .unwrap();
    let titles: Vec<&str> = history.iter().map(|entry| entry.title.as_str()).collect();
    assert_eq!(titles, vec!["first", "second"]);
    assert!(history[0].mood_index().is_some());
}
