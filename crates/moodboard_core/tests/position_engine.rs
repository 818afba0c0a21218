use moodboard_core::{
    append_position, compact_after_removal, move_across, move_within, PositionChange,
    PositionError, PositionedItem,
};
use uuid::Uuid;

fn container(n: usize) -> Vec<PositionedItem> {
    (0..n)
        .map(|index| PositionedItem {
            id: Uuid::new_v4(),
            position: index as i64,
        })
        .collect()
}

fn apply(items: &mut [PositionedItem], changes: &[PositionChange]) {
    for change in changes {
        let item = items
            .iter_mut()
            .find(|item| item.id == change.id)
            .expect("change set only targets known items");
        item.position = change.position;
    }
}

fn assert_gap_free(items: &[PositionedItem]) {
    let mut positions: Vec<i64> = items.iter().map(|item| item.position).collect();
    positions.sort_unstable();
    let expected: Vec<i64> = (0..items.len() as i64).collect();
    assert_eq!(positions, expected);
}

fn ordered_ids(items: &[PositionedItem]) -> Vec<Uuid> {
    let mut sorted: Vec<&PositionedItem> = items.iter().collect();
    sorted.sort_by_key(|item| item.position);
    sorted.iter().map(|item| item.id).collect()
}

#[test]
fn append_assigns_zero_then_max_plus_one() {
    let mut items = Vec::new();
    for expected in 0..4 {
        let position = append_position(&items);
        assert_eq!(position, expected);
        items.push(PositionedItem {
            id: Uuid::new_v4(),
            position,
        });
    }
    assert_gap_free(&items);
}

#[test]
fn upward_move_shifts_displaced_items_toward_the_tail() {
    let mut items = container(4);
    let ids = ordered_ids(&items);

    let changes = move_within(&items, ids[3], 1).unwrap();
    apply(&mut items, &changes);

    assert_gap_free(&items);
    assert_eq!(ordered_ids(&items), vec![ids[0], ids[3], ids[1], ids[2]]);
}

#[test]
fn downward_move_shifts_displaced_items_toward_the_head() {
    let mut items = container(4);
    let ids = ordered_ids(&items);

    let changes = move_within(&items, ids[0], 2).unwrap();
    apply(&mut items, &changes);

    assert_gap_free(&items);
    assert_eq!(ordered_ids(&items), vec![ids[1], ids[2], ids[0], ids[3]]);
}

#[test]
fn move_to_current_position_returns_empty_change_set() {
    let items = container(5);
    let ids = ordered_ids(&items);
    assert!(move_within(&items, ids[2], 2).unwrap().is_empty());
}

#[test]
fn round_trip_restores_every_position() {
    let mut items = container(6);
    let original = items.clone();
    let ids = ordered_ids(&items);

    let there = move_within(&items, ids[1], 4).unwrap();
    apply(&mut items, &there);
    assert_gap_free(&items);

    let back = move_within(&items, ids[1], 1).unwrap();
    apply(&mut items, &back);

    let mut restored = items.clone();
    restored.sort_by_key(|item| item.id);
    let mut expected = original;
    expected.sort_by_key(|item| item.id);
    assert_eq!(restored, expected);
}

#[test]
fn position_equal_to_count_is_invalid_but_count_minus_one_moves_to_end() {
    let mut items = container(3);
    let ids = ordered_ids(&items);

    let err = move_within(&items, ids[0], 3).unwrap_err();
    assert_eq!(
        err,
        PositionError::InvalidPosition {
            requested: 3,
            container_len: 3,
        }
    );

    let changes = move_within(&items, ids[0], 2).unwrap();
    apply(&mut items, &changes);
    assert_gap_free(&items);
    assert_eq!(ordered_ids(&items), vec![ids[1], ids[2], ids[0]]);
}

#[test]
fn invariant_survives_a_mixed_operation_sequence() {
    let mut items = container(5);

    for (mover, target) in [(4usize, 0i64), (0, 3), (2, 2), (1, 4)] {
        let id = ordered_ids(&items)[mover];
        let changes = move_within(&items, id, target).unwrap();
        apply(&mut items, &changes);
        assert_gap_free(&items);
    }
}

#[test]
fn transfer_conserves_items_and_both_invariants() {
    let mut source = container(3);
    let mut dest = container(2);
    let moved = ordered_ids(&source)[0];

    let plan = move_across(&source, &dest, moved, 1).unwrap();
    assert_eq!(plan.moved_position, 1);

    source.retain(|item| item.id != moved);
    apply(&mut source, &plan.source_changes);
    apply(&mut dest, &plan.dest_changes);
    dest.push(PositionedItem {
        id: moved,
        position: plan.moved_position,
    });

    assert_eq!(source.len() + dest.len(), 5);
    assert_gap_free(&source);
    assert_gap_free(&dest);
    assert_eq!(ordered_ids(&dest)[1], moved);
}

#[test]
fn transfer_allows_insertion_at_the_end_but_not_past_it() {
    let source = container(2);
    let dest = container(3);
    let moved = ordered_ids(&source)[1];

    let plan = move_across(&source, &dest, moved, 3).unwrap();
    assert_eq!(plan.moved_position, 3);
    assert!(plan.dest_changes.is_empty());

    let err = move_across(&source, &dest, moved, 4).unwrap_err();
    assert_eq!(
        err,
        PositionError::InvalidPosition {
            requested: 4,
            container_len: 3,
        }
    );
}

#[test]
fn transfer_into_empty_container_lands_at_zero() {
    let source = container(1);
    let moved = ordered_ids(&source)[0];

    let plan = move_across(&source, &[], moved, 0).unwrap();
    assert_eq!(plan.moved_position, 0);
    assert!(plan.source_changes.is_empty());
    assert!(plan.dest_changes.is_empty());
}

#[test]
fn transfer_of_unknown_item_is_reported() {
    let source = container(2);
    let dest = container(2);
    let stranger = Uuid::new_v4();

    let err = move_across(&source, &dest, stranger, 0).unwrap_err();
    assert_eq!(err, PositionError::ItemNotFound(stranger));
}

#[test]
fn compaction_closes_the_gap_left_by_a_removal() {
    let mut items = container(4);
    let ids = ordered_ids(&items);

    items.retain(|item| item.id != ids[1]);
    let changes = compact_after_removal(&items, 1);
    apply(&mut items, &changes);

    assert_gap_free(&items);
    assert_eq!(ordered_ids(&items), vec![ids[0], ids[2], ids[3]]);
}

#[test]
fn compaction_after_last_item_changes_nothing() {
    let mut items = container(3);
    let ids = ordered_ids(&items);

    items.retain(|item| item.id != ids[2]);
    assert!(compact_after_removal(&items, 2).is_empty());
    assert_gap_free(&items);
}
