use moodboard_core::db::open_db_in_memory;
use moodboard_core::{
    BoardRepoError, BoardService, BoardServiceError, PositionError, SqliteBoardRepository,
    SqliteUserRepository, User, UserRepository,
};
use rusqlite::Connection;

fn setup() -> Connection {
    open_db_in_memory().unwrap()
}

fn create_user(conn: &Connection, username: &str) -> User {
    let repo = SqliteUserRepository::try_new(conn).unwrap();
    let user = User::new(username);
    repo.create_user(&user).unwrap();
    user
}

fn board_service(conn: &Connection) -> BoardService<SqliteBoardRepository<'_>> {
    BoardService::new(SqliteBoardRepository::try_new(conn).unwrap())
}

fn assert_list_positions(service: &BoardService<SqliteBoardRepository<'_>>, owner: &User, board: moodboard_core::BoardId) {
    let lists = service.lists(owner.uuid, board).unwrap();
    let positions: Vec<i64> = lists.iter().map(|list| list.position).collect();
    let expected: Vec<i64> = (0..lists.len() as i64).collect();
    assert_eq!(positions, expected);
}

#[test]
fn created_lists_are_appended_in_order() {
    let conn = setup();
    let owner = create_user(&conn, "alice");
    let service = board_service(&conn);

    let board = service.create_board("Work", owner.uuid).unwrap();
    let todo = service.create_list(owner.uuid, board.uuid, "To Do").unwrap();
    let doing = service
        .create_list(owner.uuid, board.uuid, "In Progress")
        .unwrap();
    let done = service.create_list(owner.uuid, board.uuid, "Done").unwrap();

    assert_eq!((todo.position, doing.position, done.position), (0, 1, 2));

    let lists = service.lists(owner.uuid, board.uuid).unwrap();
    let names: Vec<&str> = lists.iter().map(|list| list.name.as_str()).collect();
    assert_eq!(names, vec!["To Do", "In Progress", "Done"]);
}

#[test]
fn moving_a_list_reindexes_its_siblings() {
    let conn = setup();
    let owner = create_user(&conn, "alice");
    let service = board_service(&conn);

    let board = service.create_board("Work", owner.uuid).unwrap();
    let a = service.create_list(owner.uuid, board.uuid, "A").unwrap();
    let b = service.create_list(owner.uuid, board.uuid, "B").unwrap();
    let c = service.create_list(owner.uuid, board.uuid, "C").unwrap();

    service.move_list(owner.uuid, c.uuid, 0).unwrap();

    let lists = service.lists(owner.uuid, board.uuid).unwrap();
    let order: Vec<_> = lists.iter().map(|list| list.uuid).collect();
    assert_eq!(order, vec![c.uuid, a.uuid, b.uuid]);
    assert_list_positions(&service, &owner, board.uuid);
}

#[test]
fn list_move_round_trip_restores_the_original_order() {
    let conn = setup();
    let owner = create_user(&conn, "alice");
    let service = board_service(&conn);

    let board = service.create_board("Work", owner.uuid).unwrap();
    for name in ["A", "B", "C", "D"] {
        service.create_list(owner.uuid, board.uuid, name).unwrap();
    }
    let before = service.lists(owner.uuid, board.uuid).unwrap();

    let moved = before[1].uuid;
    service.move_list(owner.uuid, moved, 3).unwrap();
    service.move_list(owner.uuid, moved, 1).unwrap();

    let after = service.lists(owner.uuid, board.uuid).unwrap();
    assert_eq!(before, after);
}

#[test]
fn move_past_the_end_is_invalid_and_not_clamped() {
    let conn = setup();
    let owner = create_user(&conn, "alice");
    let service = board_service(&conn);

    let board = service.create_board("Work", owner.uuid).unwrap();
    let a = service.create_list(owner.uuid, board.uuid, "A").unwrap();
    service.create_list(owner.uuid, board.uuid, "B").unwrap();

    let err = service.move_list(owner.uuid, a.uuid, 2).unwrap_err();
    assert!(matches!(
        err,
        BoardServiceError::Repo(BoardRepoError::Position(PositionError::InvalidPosition {
            requested: 2,
            container_len: 2,
        }))
    ));

    service.move_list(owner.uuid, a.uuid, 1).unwrap();
    assert_list_positions(&service, &owner, board.uuid);
}

#[test]
fn deleting_a_list_compacts_the_remaining_positions() {
    let conn = setup();
    let owner = create_user(&conn, "alice");
    let service = board_service(&conn);

    let board = service.create_board("Work", owner.uuid).unwrap();
    service.create_list(owner.uuid, board.uuid, "A").unwrap();
    let b = service.create_list(owner.uuid, board.uuid, "B").unwrap();
    let c = service.create_list(owner.uuid, board.uuid, "C").unwrap();

    service.delete_list(owner.uuid, b.uuid).unwrap();

    let lists = service.lists(owner.uuid, board.uuid).unwrap();
    assert_eq!(lists.len(), 2);
    assert_eq!(lists[1].uuid, c.uuid);
    assert_eq!(lists[1].position, 1);
    assert_list_positions(&service, &owner, board.uuid);
}

#[test]
fn non_members_cannot_touch_a_board() {
    let conn = setup();
    let owner = create_user(&conn, "alice");
    let outsider = create_user(&conn, "mallory");
    let service = board_service(&conn);

    let board = service.create_board("Work", owner.uuid).unwrap();
    let list = service.create_list(owner.uuid, board.uuid, "A").unwrap();

    let err = service
        .create_list(outsider.uuid, board.uuid, "Sneaky")
        .unwrap_err();
    assert!(matches!(err, BoardServiceError::NotAMember { .. }));

    let err = service.move_list(outsider.uuid, list.uuid, 0).unwrap_err();
    assert!(matches!(err, BoardServiceError::NotAMember { .. }));
}

#[test]
fn membership_is_granted_once() {
    let conn = setup();
    let owner = create_user(&conn, "alice");
    let buddy = create_user(&conn, "bob");
    let service = board_service(&conn);

    let board = service.create_board("Work", owner.uuid).unwrap();
    service.add_member(owner.uuid, board.uuid, buddy.uuid).unwrap();

    let err = service
        .add_member(owner.uuid, board.uuid, buddy.uuid)
        .unwrap_err();
    assert!(matches!(err, BoardServiceError::AlreadyMember { .. }));

    let detail = service.board_detail(buddy.uuid, board.uuid).unwrap();
    assert_eq!(detail.members.len(), 2);
}

#[test]
fn blank_names_are_rejected() {
    let conn = setup();
    let owner = create_user(&conn, "alice");
    let service = board_service(&conn);

    assert!(matches!(
        service.create_board("   ", owner.uuid),
        Err(BoardServiceError::BlankName)
    ));

    let board = service.create_board("Work", owner.uuid).unwrap();
    assert!(matches!(
        service.create_list(owner.uuid, board.uuid, ""),
        Err(BoardServiceError::BlankName)
    ));
}
