//! Ordered-collection position engine.
//!
//! # Responsibility
//! - Compute minimal position change sets for append, move, transfer and
//!   removal of items inside ordered containers.
//! - Stay pure: callers supply the current snapshot and persist the result.
//!
//! # Invariants
//! - Within one container, item positions form exactly `{0, 1, ..., n-1}`.
//! - A returned change set is complete: applying it atomically restores the
//!   invariant. Partial application is never valid.
//! - Callers must serialize position-mutating operations per container (or
//!   per container pair for transfers); the engine itself never locks.

use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier of a positioned item (list or task).
pub type ItemId = Uuid;

/// Result type for position engine operations.
pub type PositionResult<T> = Result<T, PositionError>;

/// One item's position as read from a container snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionedItem {
    pub id: ItemId,
    pub position: i64,
}

/// One `(item, new position)` assignment the caller must persist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionChange {
    pub id: ItemId,
    pub position: i64,
}

/// Errors from position engine operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionError {
    /// Requested position falls outside the valid range for the operation.
    InvalidPosition {
        requested: i64,
        container_len: usize,
    },
    /// The moved item is not part of the supplied snapshot.
    ItemNotFound(ItemId),
}

impl Display for PositionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidPosition {
                requested,
                container_len,
            } => write!(
                f,
                "position {requested} is invalid for a container of {container_len} items"
            ),
            Self::ItemNotFound(id) => write!(f, "positioned item not found: {id}"),
        }
    }
}

impl Error for PositionError {}

/// Change sets for a cross-container transfer.
///
/// `dest_changes` covers only the displaced destination items; the moved
/// item itself lands at `moved_position` and must additionally have its
/// container reference rewritten by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferPlan {
    /// Gap-closing shifts in the source container.
    pub source_changes: Vec<PositionChange>,
    /// Slot-opening shifts in the destination container.
    pub dest_changes: Vec<PositionChange>,
    /// Final position of the moved item inside the destination container.
    pub moved_position: i64,
}

/// Returns the append position for a new item: `max + 1`, or `0` when empty.
pub fn append_position(items: &[PositionedItem]) -> i64 {
    items
        .iter()
        .map(|item| item.position)
        .max()
        .map_or(0, |max| max + 1)
}

/// Computes the change set for moving `item` to `new_position` within one
/// container.
///
/// # Contract
/// - `new_position` must satisfy `0 <= new_position < items.len()`.
/// - Moving an item onto its current position returns an empty change set.
/// - Only items whose position actually changes appear in the result.
pub fn move_within(
    items: &[PositionedItem],
    item: ItemId,
    new_position: i64,
) -> PositionResult<Vec<PositionChange>> {
    if new_position < 0 || new_position >= items.len() as i64 {
        return Err(PositionError::InvalidPosition {
            requested: new_position,
            container_len: items.len(),
        });
    }

    let old_position = position_of(items, item)?;
    if new_position == old_position {
        return Ok(Vec::new());
    }

    let mut changes = Vec::new();
    for other in items.iter().filter(|other| other.id != item) {
        let shifted = if new_position < old_position {
            // Upward move: displaced items in [new, old) slide toward the tail.
            (new_position..old_position)
                .contains(&other.position)
                .then(|| other.position + 1)
        } else {
            // Downward move: displaced items in (old, new] slide toward the head.
            (old_position + 1..=new_position)
                .contains(&other.position)
                .then(|| other.position - 1)
        };
        if let Some(position) = shifted {
            changes.push(PositionChange {
                id: other.id,
                position,
            });
        }
    }

    changes.push(PositionChange {
        id: item,
        position: new_position,
    });
    Ok(changes)
}

/// Computes the change sets for moving `item` out of `source` and into
/// `dest` at `new_position`.
///
/// # Contract
/// - `item` must be part of `source`.
/// - `new_position` must satisfy `0 <= new_position <= dest.len()`; the
///   upper bound is inclusive because insertion at the end is valid.
/// - Applying both change sets (plus the item's container rewrite) leaves
///   each container independently gap-free.
pub fn move_across(
    source: &[PositionedItem],
    dest: &[PositionedItem],
    item: ItemId,
    new_position: i64,
) -> PositionResult<TransferPlan> {
    if new_position < 0 || new_position > dest.len() as i64 {
        return Err(PositionError::InvalidPosition {
            requested: new_position,
            container_len: dest.len(),
        });
    }

    let old_position = position_of(source, item)?;

    let source_changes = source
        .iter()
        .filter(|other| other.id != item && other.position > old_position)
        .map(|other| PositionChange {
            id: other.id,
            position: other.position - 1,
        })
        .collect();

    let dest_changes = dest
        .iter()
        .filter(|other| other.position >= new_position)
        .map(|other| PositionChange {
            id: other.id,
            position: other.position + 1,
        })
        .collect();

    Ok(TransferPlan {
        source_changes,
        dest_changes,
        moved_position: new_position,
    })
}

/// Computes the gap-closing change set after an item at `removed_position`
/// has been taken out of a container.
///
/// `remaining` is the container snapshot without the removed item.
pub fn compact_after_removal(
    remaining: &[PositionedItem],
    removed_position: i64,
) -> Vec<PositionChange> {
    remaining
        .iter()
        .filter(|item| item.position > removed_position)
        .map(|item| PositionChange {
            id: item.id,
            position: item.position - 1,
        })
        .collect()
}

fn position_of(items: &[PositionedItem], item: ItemId) -> PositionResult<i64> {
    items
        .iter()
        .find(|candidate| candidate.id == item)
        .map(|candidate| candidate.position)
        .ok_or(PositionError::ItemNotFound(item))
}
