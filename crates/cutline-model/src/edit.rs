//! Non-destructive edit algorithms over tracks.
//!
//! Every operation validates its whole plan before the first mutation, so a
//! failed edit leaves the tree exactly as it was. Mutations touch only
//! source ranges and child lists; no node is ever freed while a handle to it
//! exists.

use cutline_time::{RationalTime, TimeRange};
use tracing::debug;

use crate::composable::{replace_children, Composable};
use crate::composition::Track;
use crate::error::{TimelineError, TimelineResult};
use crate::items::Gap;

/// One child of a track with its resolved position and trim.
struct ScanChild {
    handle: Composable,
    slot: Slot,
}

enum Slot {
    /// `range` is the child's span in track coordinates; `source` its
    /// effective trimmed range in its own coordinates.
    Item { range: TimeRange, source: TimeRange },
    /// `window` spans `[cut - in_offset, cut + out_offset)` in track
    /// coordinates.
    Transition { window: TimeRange },
}

/// Resolve every child's position in one pass. Fails if any item's duration
/// is undefined, before anything is touched.
fn scan_track(track: &Track) -> TimelineResult<(Vec<ScanChild>, RationalTime)> {
    let children = track.children();
    let mut out = Vec::with_capacity(children.len());
    let mut cursor: Option<RationalTime> = None;
    for child in children {
        if let Some(t) = child.as_transition() {
            let in_offset = t.in_offset();
            let cut = cursor.unwrap_or_else(|| RationalTime::zero(in_offset.rate));
            let window = TimeRange::new(
                cut.checked_sub(in_offset)?,
                in_offset.checked_add(t.out_offset())?,
            );
            out.push(ScanChild {
                handle: child,
                slot: Slot::Transition { window },
            });
            continue;
        }
        let source = child.trimmed_range()?;
        let duration = source.duration;
        let start = cursor.unwrap_or_else(|| RationalTime::zero(duration.rate));
        out.push(ScanChild {
            handle: child,
            slot: Slot::Item {
                range: TimeRange::new(start, duration),
                source,
            },
        });
        cursor = Some(start.checked_add(duration)?);
    }
    let end = cursor.unwrap_or_else(|| RationalTime::zero(1.0));
    Ok((out, end))
}

/// The fully validated shape of a track after an edit. Committing cannot
/// fail.
#[derive(Default)]
struct Plan {
    children: Vec<(Composable, Option<TimeRange>)>,
}

impl Plan {
    fn keep(&mut self, handle: Composable) {
        self.children.push((handle, None));
    }

    fn place(&mut self, handle: Composable, source: TimeRange) {
        if source.duration.value > 0.0 {
            self.children.push((handle, Some(source)));
        }
    }

    fn commit(self, track: &Track) {
        let mut handles = Vec::with_capacity(self.children.len());
        for (handle, source) in self.children {
            if let Some(range) = source {
                handle.set_source_range(Some(range));
            }
            handles.push(handle);
        }
        replace_children(&track.as_composable(), handles);
    }
}

fn require_placeable(item: &Composable) -> TimelineResult<()> {
    if !item.is_item() {
        return Err(TimelineError::TransitionConflict { name: item.name() });
    }
    if item.parent().is_some() {
        return Err(TimelineError::AlreadyHasParent { name: item.name() });
    }
    Ok(())
}

/// Transitions whose window strictly overlaps `range`. With
/// `remove_transitions` unset, any hit is an error.
fn conflicting_transitions(
    scan: &[ScanChild],
    range: &TimeRange,
    remove_transitions: bool,
) -> TimelineResult<Vec<usize>> {
    let mut hits = Vec::new();
    for (i, child) in scan.iter().enumerate() {
        if let Slot::Transition { window } = &child.slot {
            if window.overlaps(range) {
                if !remove_transitions {
                    return Err(TimelineError::TransitionConflict {
                        name: child.handle.name(),
                    });
                }
                hits.push(i);
            }
        }
    }
    Ok(hits)
}

/// Replace `range` of `track` with `item`.
///
/// Partially covered neighbors are trimmed; fully covered ones are removed.
/// A range starting past the end of the track appends a gap and then the
/// item. The item's duration becomes the range's duration.
pub fn overwrite(
    item: impl Into<Composable>,
    track: &Track,
    range: TimeRange,
    remove_transitions: bool,
) -> TimelineResult<()> {
    let item = item.into();
    require_placeable(&item)?;
    let (scan, end) = scan_track(track)?;
    let range_end = range.end_time_exclusive();

    let item_source_start = item
        .source_range()
        .map(|r| r.start_time)
        .unwrap_or_else(|| RationalTime::zero(range.duration.rate));
    let item_source = TimeRange::new(item_source_start, range.duration);

    debug!(track = %track.name(), item = %item.name(), %range, "overwrite");

    // Past the end: pad with a gap if needed and append.
    if scan.is_empty() || range.start_time >= end {
        let mut plan = Plan::default();
        for child in scan {
            plan.keep(child.handle);
        }
        let pad = range.start_time.checked_sub(end)?;
        if pad.value > 0.0 {
            plan.keep(Gap::new(pad).into());
        }
        plan.place(item, item_source);
        plan.commit(track);
        return Ok(());
    }

    let dropped = conflicting_transitions(&scan, &range, remove_transitions)?;

    let mut plan = Plan::default();
    let mut inserted = false;
    for (i, child) in scan.into_iter().enumerate() {
        match child.slot {
            Slot::Transition { .. } => {
                if !dropped.contains(&i) {
                    plan.keep(child.handle);
                }
            }
            Slot::Item { range: child_range, source } => {
                let cs = child_range.start_time;
                let ce = child_range.end_time_exclusive();
                if ce <= range.start_time || cs >= range_end {
                    plan.keep(child.handle);
                    continue;
                }
                // head survives to the left of the overwrite
                let head_survives = cs < range.start_time;
                let tail_survives = ce > range_end;
                if head_survives {
                    let head_duration = range.start_time.checked_sub(cs)?;
                    plan.place(
                        child.handle.clone(),
                        TimeRange::new(source.start_time, head_duration),
                    );
                }
                if !inserted {
                    plan.place(item.clone(), item_source);
                    inserted = true;
                }
                if tail_survives {
                    let cut = range_end.checked_sub(cs)?;
                    let tail = TimeRange::new(
                        source.start_time.checked_add(cut)?,
                        ce.checked_sub(range_end)?,
                    );
                    let piece = if head_survives {
                        child.handle.deep_clone()
                    } else {
                        child.handle
                    };
                    plan.place(piece, tail);
                }
            }
        }
    }
    if !inserted {
        plan.place(item, item_source);
    }
    plan.commit(track);
    Ok(())
}

/// Insert `item` at `time`, splitting whatever is there and pushing all
/// later children down by the item's duration. A time at or past the end of
/// the track appends.
pub fn insert(
    item: impl Into<Composable>,
    track: &Track,
    time: RationalTime,
    remove_transitions: bool,
) -> TimelineResult<()> {
    let item = item.into();
    require_placeable(&item)?;
    let (scan, end) = scan_track(track)?;

    debug!(track = %track.name(), item = %item.name(), %time, "insert");

    if scan.is_empty() || time >= end {
        let mut plan = Plan::default();
        for child in scan {
            plan.keep(child.handle);
        }
        plan.keep(item);
        plan.commit(track);
        return Ok(());
    }

    let point = TimeRange::new(time, RationalTime::zero(time.rate));
    let dropped = conflicting_transitions(&scan, &point, remove_transitions)?;

    let mut plan = Plan::default();
    let mut inserted = false;
    for (i, child) in scan.into_iter().enumerate() {
        match child.slot {
            Slot::Transition { .. } => {
                if !dropped.contains(&i) {
                    plan.keep(child.handle);
                }
            }
            Slot::Item { range: child_range, source } => {
                let cs = child_range.start_time;
                let ce = child_range.end_time_exclusive();
                if !inserted && time <= cs {
                    plan.keep(item.clone());
                    inserted = true;
                }
                if !inserted && time < ce {
                    // split the child around the insertion point
                    let offset = time.checked_sub(cs)?;
                    plan.place(
                        child.handle.clone(),
                        TimeRange::new(source.start_time, offset),
                    );
                    plan.keep(item.clone());
                    inserted = true;
                    plan.place(
                        child.handle.deep_clone(),
                        TimeRange::new(
                            source.start_time.checked_add(offset)?,
                            source.duration.checked_sub(offset)?,
                        ),
                    );
                    continue;
                }
                plan.keep(child.handle);
            }
        }
    }
    if !inserted {
        plan.keep(item);
    }
    plan.commit(track);
    Ok(())
}

/// Split the item under `time` into two abutting pieces. A time on an
/// existing cut, or outside the track, is a no-op.
pub fn slice(track: &Track, time: RationalTime, remove_transitions: bool) -> TimelineResult<()> {
    let (scan, _end) = scan_track(track)?;

    let point = TimeRange::new(time, RationalTime::zero(time.rate));
    let dropped = conflicting_transitions(&scan, &point, remove_transitions)?;

    let mut plan = Plan::default();
    let mut changed = !dropped.is_empty();
    for (i, child) in scan.into_iter().enumerate() {
        match child.slot {
            Slot::Transition { .. } => {
                if !dropped.contains(&i) {
                    plan.keep(child.handle);
                }
            }
            Slot::Item { range: child_range, source } => {
                let cs = child_range.start_time;
                let ce = child_range.end_time_exclusive();
                if time > cs && time < ce {
                    let offset = time.checked_sub(cs)?;
                    debug!(track = %track.name(), item = %child.handle.name(), %time, "slice");
                    plan.place(
                        child.handle.clone(),
                        TimeRange::new(source.start_time, offset),
                    );
                    plan.place(
                        child.handle.deep_clone(),
                        TimeRange::new(
                            source.start_time.checked_add(offset)?,
                            source.duration.checked_sub(offset)?,
                        ),
                    );
                    changed = true;
                } else {
                    plan.keep(child.handle);
                }
            }
        }
    }
    if changed {
        plan.commit(track);
    }
    Ok(())
}

/// Remove the item under `time`, optionally filling its span with a gap so
/// later children keep their positions. Transitions whose cut disappears
/// with the item are removed with it.
pub fn remove(track: &Track, time: RationalTime, fill_with_gap: bool) -> TimelineResult<()> {
    let (scan, _end) = scan_track(track)?;

    let target = scan
        .iter()
        .position(|c| match &c.slot {
            Slot::Item { range, .. } => range.contains(time),
            Slot::Transition { .. } => false,
        })
        .ok_or(TimelineError::IndexOutOfBounds {
            index: scan.len(),
            len: scan.len(),
        })?;

    let target_duration = match &scan[target].slot {
        Slot::Item { range, .. } => range.duration,
        Slot::Transition { .. } => unreachable!(),
    };

    debug!(track = %track.name(), item = %scan[target].handle.name(), %time, "remove");

    let neighbor_transition = |i: usize| matches!(scan.get(i).map(|c| &c.slot), Some(Slot::Transition { .. }));
    let drop_before = target > 0 && neighbor_transition(target - 1);
    let drop_after = neighbor_transition(target + 1);

    let mut plan = Plan::default();
    for (i, child) in scan.into_iter().enumerate() {
        if i == target {
            if fill_with_gap {
                plan.keep(Gap::new(target_duration).into());
            }
            continue;
        }
        if (drop_before && i + 1 == target) || (drop_after && i == target + 1) {
            continue;
        }
        plan.keep(child.handle);
    }
    plan.commit(track);
    Ok(())
}

/// Shift `item`'s trim window inside its media without moving the item in
/// the track. Fails if the shifted window leaves the available media range.
pub fn slip(item: &Composable, delta: RationalTime) -> TimelineResult<()> {
    let source = item.trimmed_range()?;
    let shifted = TimeRange::new(source.start_time.checked_add(delta)?, source.duration);

    // validate against media when the clip knows its bounds
    if let Some(clip) = item.as_clip() {
        if let Ok(available) = clip.available_range() {
            if !available.contains_range(&shifted) {
                return Err(TimelineError::OutOfAvailableRange {
                    reason: format!("slipped range {shifted} leaves available range {available}"),
                });
            }
        }
    }
    debug!(item = %item.name(), %delta, "slip");
    item.set_source_range(Some(shifted));
    Ok(())
}

/// Move `item` along its track by `delta`, growing the previous sibling and
/// shrinking the next so the track's total duration is unchanged.
pub fn slide(item: &Composable, delta: RationalTime) -> TimelineResult<()> {
    if delta.value == 0.0 {
        return Ok(());
    }
    let parent = item.parent().ok_or_else(|| TimelineError::NoParent {
        name: item.name(),
    })?;
    let track = parent
        .as_track()
        .ok_or_else(|| TimelineError::MalformedDocument {
            reason: format!("'{}' is not in a track", item.name()),
        })?;
    let (prev, next) = track.neighbors_of(item)?;
    let prev = prev.ok_or_else(|| TimelineError::NoPreviousSibling { name: item.name() })?;
    for neighbor in [Some(&prev), next.as_ref()].into_iter().flatten() {
        if !neighbor.is_item() {
            return Err(TimelineError::TransitionConflict {
                name: neighbor.name(),
            });
        }
    }

    let prev_source = prev.trimmed_range()?;
    let new_prev_duration = prev_source.duration.checked_add(delta)?;
    if new_prev_duration.value < 0.0 {
        return Err(TimelineError::InsufficientNeighborDuration {
            name: prev.name(),
            reason: format!("cannot shrink below zero by {delta}"),
        });
    }
    let next_update = match &next {
        Some(next) => {
            let source = next.trimmed_range()?;
            let duration = source.duration.checked_sub(delta)?;
            if duration.value < 0.0 {
                return Err(TimelineError::InsufficientNeighborDuration {
                    name: next.name(),
                    reason: format!("cannot shrink below zero by {delta}"),
                });
            }
            Some(TimeRange::new(source.start_time.checked_add(delta)?, duration))
        }
        None => None,
    };

    debug!(item = %item.name(), %delta, "slide");
    prev.set_source_range(Some(TimeRange::new(prev_source.start_time, new_prev_duration)));
    if let (Some(next), Some(range)) = (next, next_update) {
        next.set_source_range(Some(range));
    }
    Ok(())
}

/// Adjust `item`'s head by `delta_in` and tail by `delta_out`, inserting or
/// resizing adjacent gaps so every other child keeps its track position.
pub fn trim(item: &Composable, delta_in: RationalTime, delta_out: RationalTime) -> TimelineResult<()> {
    let parent = item.parent().ok_or_else(|| TimelineError::NoParent {
        name: item.name(),
    })?;
    let track = parent
        .as_track()
        .ok_or_else(|| TimelineError::MalformedDocument {
            reason: format!("'{}' is not in a track", item.name()),
        })?;

    let source = item.trimmed_range()?;
    let new_duration = source
        .duration
        .checked_sub(delta_in)?
        .checked_add(delta_out)?;
    if new_duration.value < 0.0 {
        return Err(TimelineError::OutOfAvailableRange {
            reason: format!("trim leaves '{}' with negative duration", item.name()),
        });
    }
    let new_source = TimeRange::new(source.start_time.checked_add(delta_in)?, new_duration);

    let (scan, _end) = scan_track(&track)?;
    let index = scan
        .iter()
        .position(|c| c.handle.ptr_eq(item))
        .ok_or(TimelineError::NotRelated)?;

    // A side's plan: grow or shrink the adjacent gap, or insert a fresh one.
    enum GapFix {
        None,
        Resize { handle: Composable, source: TimeRange },
        Drop { handle: Composable },
        InsertBefore { duration: RationalTime },
        InsertAfter { duration: RationalTime },
    }

    let gap_fix = |neighbor: Option<&ScanChild>,
                   grow: RationalTime,
                   before: bool,
                   allow_missing: bool|
     -> TimelineResult<GapFix> {
        if grow.value == 0.0 {
            return Ok(GapFix::None);
        }
        match neighbor {
            Some(child) => {
                if let Slot::Transition { .. } = child.slot {
                    return Err(TimelineError::TransitionConflict {
                        name: child.handle.name(),
                    });
                }
                let is_gap = child.handle.as_gap().is_some();
                if is_gap {
                    let gap_source = child.handle.trimmed_range()?;
                    let new_gap = gap_source.duration.checked_add(grow)?;
                    if new_gap.value < 0.0 {
                        return Err(TimelineError::InsufficientNeighborDuration {
                            name: child.handle.name(),
                            reason: format!("gap cannot absorb {grow}"),
                        });
                    }
                    if new_gap.value == 0.0 {
                        return Ok(GapFix::Drop {
                            handle: child.handle.clone(),
                        });
                    }
                    return Ok(GapFix::Resize {
                        handle: child.handle.clone(),
                        source: TimeRange::new(gap_source.start_time, new_gap),
                    });
                }
                if grow.value > 0.0 {
                    // a new gap between the neighbor and the item
                    return Ok(if before {
                        GapFix::InsertBefore { duration: grow }
                    } else {
                        GapFix::InsertAfter { duration: grow }
                    });
                }
                Err(TimelineError::InsufficientNeighborDuration {
                    name: child.handle.name(),
                    reason: format!("'{}' is not a gap", child.handle.name()),
                })
            }
            None => {
                if grow.value > 0.0 && before {
                    return Ok(GapFix::InsertBefore { duration: grow });
                }
                if allow_missing {
                    return Ok(GapFix::None);
                }
                Err(TimelineError::InsufficientNeighborDuration {
                    name: item.name(),
                    reason: "no neighbor to absorb the trim".into(),
                })
            }
        }
    };

    // head trim of delta_in grows the leading gap by the same amount; tail
    // trim of delta_out shrinks the trailing gap
    let before_fix = gap_fix(
        index.checked_sub(1).and_then(|i| scan.get(i)),
        delta_in,
        true,
        false,
    )?;
    let after_fix = gap_fix(scan.get(index + 1), delta_out.negated(), false, true)?;

    debug!(item = %item.name(), %delta_in, %delta_out, "trim");

    let mut plan = Plan::default();
    for (i, child) in scan.into_iter().enumerate() {
        if i == index {
            if let GapFix::InsertBefore { duration } = &before_fix {
                plan.keep(Gap::new(*duration).into());
            }
            plan.place(child.handle, new_source);
            if let GapFix::InsertAfter { duration } = &after_fix {
                plan.keep(Gap::new(*duration).into());
            }
            continue;
        }
        let fix = if i + 1 == index {
            Some(&before_fix)
        } else if i == index + 1 {
            Some(&after_fix)
        } else {
            None
        };
        match fix {
            Some(GapFix::Drop { handle }) if handle.ptr_eq(&child.handle) => continue,
            Some(GapFix::Resize { handle, source }) if handle.ptr_eq(&child.handle) => {
                plan.place(child.handle, *source);
            }
            _ => plan.keep(child.handle),
        }
    }
    plan.commit(&track);
    Ok(())
}

/// Adjust `item`'s head and tail in place, letting everything after it
/// ripple earlier or later. Only the item's own source range changes.
pub fn ripple(item: &Composable, delta_in: RationalTime, delta_out: RationalTime) -> TimelineResult<()> {
    let source = item.trimmed_range()?;
    let new_duration = source
        .duration
        .checked_sub(delta_in)?
        .checked_add(delta_out)?;
    if new_duration.value < 0.0 {
        return Err(TimelineError::OutOfAvailableRange {
            reason: format!("ripple leaves '{}' with negative duration", item.name()),
        });
    }
    debug!(item = %item.name(), %delta_in, %delta_out, "ripple");
    item.set_source_range(Some(TimeRange::new(
        source.start_time.checked_add(delta_in)?,
        new_duration,
    )));
    Ok(())
}

/// Move the cuts on either side of `item`, re-trimming its neighbors so the
/// track's total duration is unchanged.
pub fn roll(item: &Composable, delta_in: RationalTime, delta_out: RationalTime) -> TimelineResult<()> {
    let parent = item.parent().ok_or_else(|| TimelineError::NoParent {
        name: item.name(),
    })?;
    let track = parent
        .as_track()
        .ok_or_else(|| TimelineError::MalformedDocument {
            reason: format!("'{}' is not in a track", item.name()),
        })?;

    let source = item.trimmed_range()?;
    let new_duration = source
        .duration
        .checked_sub(delta_in)?
        .checked_add(delta_out)?;
    if new_duration.value < 0.0 {
        return Err(TimelineError::OutOfAvailableRange {
            reason: format!("roll leaves '{}' with negative duration", item.name()),
        });
    }

    let (prev, next) = track.neighbors_of(item)?;
    let mut prev_update = None;
    if delta_in.value != 0.0 {
        let prev = prev.ok_or_else(|| TimelineError::InsufficientNeighborDuration {
            name: item.name(),
            reason: "no previous item to roll against".into(),
        })?;
        if !prev.is_item() {
            return Err(TimelineError::TransitionConflict { name: prev.name() });
        }
        let prev_source = prev.trimmed_range()?;
        let duration = prev_source.duration.checked_add(delta_in)?;
        if duration.value < 0.0 {
            return Err(TimelineError::InsufficientNeighborDuration {
                name: prev.name(),
                reason: format!("cannot absorb {delta_in}"),
            });
        }
        prev_update = Some((prev, TimeRange::new(prev_source.start_time, duration)));
    }
    let mut next_update = None;
    if delta_out.value != 0.0 {
        let next = next.ok_or_else(|| TimelineError::InsufficientNeighborDuration {
            name: item.name(),
            reason: "no next item to roll against".into(),
        })?;
        if !next.is_item() {
            return Err(TimelineError::TransitionConflict { name: next.name() });
        }
        let next_source = next.trimmed_range()?;
        let duration = next_source.duration.checked_sub(delta_out)?;
        if duration.value < 0.0 {
            return Err(TimelineError::InsufficientNeighborDuration {
                name: next.name(),
                reason: format!("cannot absorb {delta_out}"),
            });
        }
        next_update = Some((
            next,
            TimeRange::new(next_source.start_time.checked_add(delta_out)?, duration),
        ));
    }

    debug!(item = %item.name(), %delta_in, %delta_out, "roll");
    item.set_source_range(Some(TimeRange::new(
        source.start_time.checked_add(delta_in)?,
        new_duration,
    )));
    if let Some((prev, range)) = prev_update {
        prev.set_source_range(Some(range));
    }
    if let Some((next, range)) = next_update {
        next.set_source_range(Some(range));
    }
    Ok(())
}

impl Track {
    /// See [`overwrite`].
    pub fn overwrite(
        &self,
        item: impl Into<Composable>,
        range: TimeRange,
        remove_transitions: bool,
    ) -> TimelineResult<()> {
        overwrite(item, self, range, remove_transitions)
    }

    /// See [`insert`].
    pub fn insert_at_time(
        &self,
        item: impl Into<Composable>,
        time: RationalTime,
        remove_transitions: bool,
    ) -> TimelineResult<()> {
        insert(item, self, time, remove_transitions)
    }

    /// See [`slice`].
    pub fn slice_at_time(&self, time: RationalTime, remove_transitions: bool) -> TimelineResult<()> {
        slice(self, time, remove_transitions)
    }

    /// See [`remove`].
    pub fn remove_at_time(&self, time: RationalTime, fill_with_gap: bool) -> TimelineResult<()> {
        remove(self, time, fill_with_gap)
    }
}

impl Composable {
    /// See [`slip`].
    pub fn slip(&self, delta: RationalTime) -> TimelineResult<()> {
        slip(self, delta)
    }

    /// See [`slide`].
    pub fn slide(&self, delta: RationalTime) -> TimelineResult<()> {
        slide(self, delta)
    }

    /// See [`trim`].
    pub fn trim(&self, delta_in: RationalTime, delta_out: RationalTime) -> TimelineResult<()> {
        trim(self, delta_in, delta_out)
    }

    /// See [`ripple`].
    pub fn ripple(&self, delta_in: RationalTime, delta_out: RationalTime) -> TimelineResult<()> {
        ripple(self, delta_in, delta_out)
    }

    /// See [`roll`].
    pub fn roll(&self, delta_in: RationalTime, delta_out: RationalTime) -> TimelineResult<()> {
        roll(self, delta_in, delta_out)
    }
}
