//! Coordinate transforms between items in a composition tree.
//!
//! Every item has its own local time coordinates, anchored by its trimmed
//! range. Moving a time between two items walks up from the source to the
//! lowest common ancestor, then back down to the target, applying the offset
//! between each child's trimmed range and its position in its parent.

use cutline_time::{RationalTime, TimeRange};

use crate::composable::Composable;
use crate::composition;
use crate::error::{TimelineError, TimelineResult};

/// Where `item` sits inside its parent, in the parent's coordinates.
pub fn range_in_parent(item: &Composable) -> TimelineResult<TimeRange> {
    let parent = item.parent().ok_or_else(|| TimelineError::NoParent {
        name: item.name(),
    })?;
    let index =
        composition::container_index_of(&parent, item).ok_or(TimelineError::NotRelated)?;
    composition::range_of_child_at_index(&parent, index)
}

/// `item` and all its ancestors, nearest first.
fn chain_to_root(item: &Composable) -> Vec<Composable> {
    let mut chain = vec![item.clone()];
    let mut cursor = item.clone();
    while let Some(parent) = cursor.parent() {
        chain.push(parent.clone());
        cursor = parent;
    }
    chain
}

/// Child-local time expressed in the child's parent coordinates.
fn to_parent_time(time: RationalTime, child: &Composable) -> TimelineResult<RationalTime> {
    let trimmed = child.trimmed_range()?;
    let placed = range_in_parent(child)?;
    time.checked_sub(trimmed.start_time)?
        .checked_add(placed.start_time)
        .map_err(TimelineError::Time)
}

/// Parent-local time expressed in `child`'s coordinates.
fn to_child_time(time: RationalTime, child: &Composable) -> TimelineResult<RationalTime> {
    let trimmed = child.trimmed_range()?;
    let placed = range_in_parent(child)?;
    time.checked_sub(placed.start_time)?
        .checked_add(trimmed.start_time)
        .map_err(TimelineError::Time)
}

/// Re-express `time`, given in `from`'s local coordinates, in `to`'s local
/// coordinates.
///
/// Fails with [`TimelineError::NotRelated`] when the two items do not share
/// an ancestor.
pub fn transformed_time(
    time: RationalTime,
    from: &Composable,
    to: &Composable,
) -> TimelineResult<RationalTime> {
    if from.ptr_eq(to) {
        return Ok(time);
    }
    let to_chain = chain_to_root(to);

    // Ascend from `from` until we land on a node of the target's chain.
    let mut t = time;
    let mut cursor = from.clone();
    let lca_index = loop {
        if let Some(i) = to_chain.iter().position(|n| n.ptr_eq(&cursor)) {
            break i;
        }
        let parent = cursor.parent().ok_or(TimelineError::NotRelated)?;
        t = to_parent_time(t, &cursor)?;
        cursor = parent;
    };

    // Descend along the target's chain from just below the common ancestor.
    for node in to_chain[..lca_index].iter().rev() {
        t = to_child_time(t, node)?;
    }
    Ok(t)
}

/// Re-express `range` in `to`'s local coordinates. Transforms are pure
/// offsets, so the duration is carried over unchanged.
pub fn transformed_time_range(
    range: TimeRange,
    from: &Composable,
    to: &Composable,
) -> TimelineResult<TimeRange> {
    let start = transformed_time(range.start_time, from, to)?;
    Ok(TimeRange::new(start, range.duration))
}

impl Composable {
    /// See [`transformed_time`].
    pub fn transformed_time(
        &self,
        time: RationalTime,
        to: &Composable,
    ) -> TimelineResult<RationalTime> {
        transformed_time(time, self, to)
    }

    /// See [`transformed_time_range`].
    pub fn transformed_time_range(
        &self,
        range: TimeRange,
        to: &Composable,
    ) -> TimelineResult<TimeRange> {
        transformed_time_range(range, self, to)
    }

    /// See [`range_in_parent`].
    pub fn range_in_parent(&self) -> TimelineResult<TimeRange> {
        range_in_parent(self)
    }
}
