//! End-to-end coverage of the track edit operations.

use cutline_model::{
    Clip, ComposableKind, Gap, MediaReference, RationalTime, TimeRange, TimelineError, Track,
    Transition,
};

fn frames(n: f64) -> RationalTime {
    RationalTime::new(n, 24.0)
}

fn range(start: f64, duration: f64) -> TimeRange {
    TimeRange::new(frames(start), frames(duration))
}

/// A clip trimmed to `duration` frames out of 100 frames of media.
fn clip(name: &str, start: f64, duration: f64) -> Clip {
    let clip = Clip::with_reference(
        name,
        MediaReference::external(format!("file:///media/{name}.mov"), Some(range(0.0, 100.0))),
    );
    clip.set_source_range(Some(range(start, duration)));
    clip
}

fn names(track: &Track) -> Vec<String> {
    track.children().iter().map(|c| c.name()).collect()
}

fn durations(track: &Track) -> Vec<f64> {
    track
        .children()
        .iter()
        .filter(|c| c.is_item())
        .map(|c| c.duration().unwrap().value)
        .collect()
}

#[test]
fn overwrite_fully_inside_splits_the_clip() {
    let track = Track::video("V1");
    track.append_child(clip("long", 0.0, 20.0)).unwrap();

    track
        .overwrite(clip("new", 0.0, 10.0), range(5.0, 10.0), false)
        .unwrap();

    assert_eq!(names(&track), ["long", "new", "long"]);
    assert_eq!(durations(&track), [5.0, 10.0, 5.0]);
    assert_eq!(track.duration().unwrap(), frames(20.0));

    // the post piece resumes where the overwrite ended
    let post = track.child_at(2).unwrap();
    assert_eq!(post.source_range().unwrap(), range(15.0, 5.0));
}

#[test]
fn overwrite_trims_both_neighbors() {
    let track = Track::video("V1");
    track.append_child(clip("a", 0.0, 24.0)).unwrap();
    track.append_child(clip("b", 0.0, 24.0)).unwrap();

    // covers the last 6 frames of a and the first 6 of b
    track
        .overwrite(clip("new", 0.0, 12.0), range(18.0, 12.0), false)
        .unwrap();

    assert_eq!(names(&track), ["a", "new", "b"]);
    assert_eq!(durations(&track), [18.0, 12.0, 18.0]);
    assert_eq!(track.child_at(2).unwrap().source_range().unwrap(), range(6.0, 18.0));
    assert_eq!(track.duration().unwrap(), frames(48.0));
}

#[test]
fn overwrite_removes_fully_covered_children() {
    let track = Track::video("V1");
    track.append_child(clip("a", 0.0, 24.0)).unwrap();
    track.append_child(clip("b", 0.0, 12.0)).unwrap();
    track.append_child(clip("c", 0.0, 24.0)).unwrap();

    track
        .overwrite(clip("new", 0.0, 24.0), range(18.0, 24.0), false)
        .unwrap();

    assert_eq!(names(&track), ["a", "new", "c"]);
    assert_eq!(durations(&track), [18.0, 24.0, 18.0]);
    assert_eq!(track.duration().unwrap(), frames(60.0));
}

#[test]
fn overwrite_past_the_end_pads_with_a_gap() {
    let track = Track::video("V1");
    track.append_child(clip("a", 0.0, 24.0)).unwrap();

    track
        .overwrite(clip("late", 0.0, 12.0), range(36.0, 12.0), false)
        .unwrap();

    let kinds: Vec<ComposableKind> = track.children().iter().map(|c| c.kind()).collect();
    assert_eq!(
        kinds,
        [ComposableKind::Clip, ComposableKind::Gap, ComposableKind::Clip]
    );
    assert_eq!(durations(&track), [24.0, 12.0, 12.0]);
    assert_eq!(track.duration().unwrap(), frames(48.0));
}

#[test]
fn overwrite_failure_leaves_track_unchanged() {
    let track = Track::video("V1");
    track.append_child(clip("a", 0.0, 24.0)).unwrap();
    track
        .append_child(Transition::dissolve("mix", frames(6.0)))
        .unwrap();
    track.append_child(clip("b", 0.0, 24.0)).unwrap();

    let before = names(&track);
    let result = track.overwrite(clip("new", 0.0, 12.0), range(20.0, 12.0), false);
    assert!(matches!(result, Err(TimelineError::TransitionConflict { .. })));
    assert_eq!(names(&track), before);
    assert_eq!(track.duration().unwrap(), frames(48.0));
}

#[test]
fn overwrite_can_strip_a_transition() {
    let track = Track::video("V1");
    track.append_child(clip("a", 0.0, 24.0)).unwrap();
    track
        .append_child(Transition::dissolve("mix", frames(6.0)))
        .unwrap();
    track.append_child(clip("b", 0.0, 24.0)).unwrap();

    track
        .overwrite(clip("new", 0.0, 12.0), range(20.0, 12.0), true)
        .unwrap();

    assert_eq!(names(&track), ["a", "new", "b"]);
    assert_eq!(durations(&track), [20.0, 12.0, 16.0]);
}

#[test]
fn insert_at_boundary_then_remove_restores_the_track() {
    let track = Track::video("V1");
    track.append_child(clip("a", 0.0, 24.0)).unwrap();
    track.append_child(clip("b", 0.0, 24.0)).unwrap();

    track
        .insert_at_time(clip("mid", 0.0, 12.0), frames(24.0), false)
        .unwrap();
    assert_eq!(names(&track), ["a", "mid", "b"]);
    assert_eq!(track.duration().unwrap(), frames(60.0));

    track.remove_at_time(frames(24.0), false).unwrap();
    assert_eq!(names(&track), ["a", "b"]);
    assert_eq!(track.duration().unwrap(), frames(48.0));
}

#[test]
fn insert_mid_child_splits_it() {
    let track = Track::video("V1");
    track.append_child(clip("a", 0.0, 24.0)).unwrap();
    track.append_child(clip("b", 0.0, 24.0)).unwrap();

    track
        .insert_at_time(clip("mid", 0.0, 12.0), frames(30.0), false)
        .unwrap();

    assert_eq!(names(&track), ["a", "b", "mid", "b"]);
    assert_eq!(durations(&track), [24.0, 6.0, 12.0, 18.0]);
    assert_eq!(track.child_at(3).unwrap().source_range().unwrap(), range(6.0, 18.0));
    assert_eq!(track.duration().unwrap(), frames(60.0));
}

#[test]
fn insert_past_the_end_appends() {
    let track = Track::video("V1");
    track.append_child(clip("a", 0.0, 24.0)).unwrap();

    track
        .insert_at_time(clip("tail", 0.0, 12.0), frames(99.0), false)
        .unwrap();
    assert_eq!(names(&track), ["a", "tail"]);
    assert_eq!(track.duration().unwrap(), frames(36.0));
}

#[test]
fn insert_rejects_attached_items() {
    let track = Track::video("V1");
    let other = Track::video("V2");
    let c = clip("owned", 0.0, 24.0);
    other.append_child(c.clone()).unwrap();

    assert!(matches!(
        track.insert_at_time(c, frames(0.0), false),
        Err(TimelineError::AlreadyHasParent { .. })
    ));
}

#[test]
fn slice_partitions_the_source_range() {
    let track = Track::video("V1");
    track.append_child(clip("a", 0.0, 48.0)).unwrap();

    track.slice_at_time(frames(24.0), false).unwrap();

    assert_eq!(names(&track), ["a", "a"]);
    let first = track.child_at(0).unwrap();
    let second = track.child_at(1).unwrap();
    assert_eq!(first.source_range().unwrap(), range(0.0, 24.0));
    assert_eq!(second.source_range().unwrap(), range(24.0, 24.0));
    assert_eq!(track.duration().unwrap(), frames(48.0));
}

#[test]
fn slice_on_a_boundary_is_a_no_op() {
    let track = Track::video("V1");
    track.append_child(clip("a", 0.0, 24.0)).unwrap();
    track.append_child(clip("b", 0.0, 24.0)).unwrap();

    track.slice_at_time(frames(24.0), false).unwrap();
    assert_eq!(names(&track), ["a", "b"]);

    track.slice_at_time(frames(200.0), false).unwrap();
    assert_eq!(names(&track), ["a", "b"]);
}

#[test]
fn slice_through_a_transition_conflicts() {
    let track = Track::video("V1");
    track.append_child(clip("a", 0.0, 24.0)).unwrap();
    track
        .append_child(Transition::dissolve("mix", frames(6.0)))
        .unwrap();
    track.append_child(clip("b", 0.0, 24.0)).unwrap();

    assert!(matches!(
        track.slice_at_time(frames(20.0), false),
        Err(TimelineError::TransitionConflict { .. })
    ));

    track.slice_at_time(frames(20.0), true).unwrap();
    assert_eq!(names(&track), ["a", "a", "b"]);
    assert_eq!(durations(&track), [20.0, 4.0, 24.0]);
}

#[test]
fn remove_with_gap_preserves_positions() {
    let track = Track::video("V1");
    track.append_child(clip("a", 0.0, 24.0)).unwrap();
    track.append_child(clip("b", 0.0, 12.0)).unwrap();
    track.append_child(clip("c", 0.0, 24.0)).unwrap();

    track.remove_at_time(frames(30.0), true).unwrap();

    let kinds: Vec<ComposableKind> = track.children().iter().map(|c| c.kind()).collect();
    assert_eq!(
        kinds,
        [ComposableKind::Clip, ComposableKind::Gap, ComposableKind::Clip]
    );
    assert_eq!(track.duration().unwrap(), frames(60.0));
    // c still starts at frame 36
    let c = track.child_at(2).unwrap();
    assert_eq!(c.range_in_parent().unwrap().start_time, frames(36.0));
}

#[test]
fn remove_without_gap_shifts_later_children() {
    let track = Track::video("V1");
    track.append_child(clip("a", 0.0, 24.0)).unwrap();
    track.append_child(clip("b", 0.0, 12.0)).unwrap();
    track.append_child(clip("c", 0.0, 24.0)).unwrap();

    track.remove_at_time(frames(30.0), false).unwrap();

    assert_eq!(names(&track), ["a", "c"]);
    assert_eq!(track.duration().unwrap(), frames(48.0));
}

#[test]
fn remove_takes_adjacent_transitions_along() {
    let track = Track::video("V1");
    track.append_child(clip("a", 0.0, 24.0)).unwrap();
    track
        .append_child(Transition::dissolve("mix", frames(6.0)))
        .unwrap();
    track.append_child(clip("b", 0.0, 24.0)).unwrap();

    track.remove_at_time(frames(30.0), false).unwrap();
    assert_eq!(names(&track), ["a"]);
}

#[test]
fn remove_outside_the_track_errors() {
    let track = Track::video("V1");
    track.append_child(clip("a", 0.0, 24.0)).unwrap();

    assert!(track.remove_at_time(frames(100.0), false).is_err());
    assert_eq!(names(&track), ["a"]);
}

#[test]
fn slip_and_unslip_restore_the_source_range() {
    let c = clip("a", 10.0, 24.0);
    let handle = c.as_composable();

    handle.slip(frames(6.0)).unwrap();
    assert_eq!(c.source_range().unwrap(), range(16.0, 24.0));

    handle.slip(frames(-6.0)).unwrap();
    assert_eq!(c.source_range().unwrap(), range(10.0, 24.0));
}

#[test]
fn slip_is_bounded_by_available_media() {
    let c = clip("a", 70.0, 24.0);
    let handle = c.as_composable();

    // media is 100 frames; start 70 + duration 24 leaves 6 frames of slack
    assert!(matches!(
        handle.slip(frames(10.0)),
        Err(TimelineError::OutOfAvailableRange { .. })
    ));
    assert_eq!(c.source_range().unwrap(), range(70.0, 24.0));

    handle.slip(frames(6.0)).unwrap();
    assert_eq!(c.source_range().unwrap(), range(76.0, 24.0));
}

#[test]
fn slide_trades_duration_with_neighbors() {
    let track = Track::video("V1");
    track.append_child(clip("a", 0.0, 24.0)).unwrap();
    track.append_child(clip("b", 0.0, 24.0)).unwrap();
    track.append_child(clip("c", 0.0, 24.0)).unwrap();

    let b = track.child_at(1).unwrap();
    b.slide(frames(6.0)).unwrap();

    assert_eq!(durations(&track), [30.0, 24.0, 18.0]);
    assert_eq!(track.child_at(2).unwrap().source_range().unwrap(), range(6.0, 18.0));
    assert_eq!(track.duration().unwrap(), frames(72.0));
    assert_eq!(b.range_in_parent().unwrap().start_time, frames(30.0));
}

#[test]
fn slide_fails_at_the_track_start() {
    let track = Track::video("V1");
    track.append_child(clip("a", 0.0, 24.0)).unwrap();
    track.append_child(clip("b", 0.0, 24.0)).unwrap();

    let a = track.child_at(0).unwrap();
    assert!(matches!(
        a.slide(frames(6.0)),
        Err(TimelineError::NoPreviousSibling { .. })
    ));
}

#[test]
fn trim_adjusts_adjacent_gaps() {
    let track = Track::video("V1");
    track.append_child(Gap::new(frames(12.0))).unwrap();
    track.append_child(clip("a", 10.0, 24.0)).unwrap();
    track.append_child(Gap::new(frames(12.0))).unwrap();

    let a = track.child_at(1).unwrap();
    a.trim(frames(-6.0), frames(6.0)).unwrap();

    assert_eq!(durations(&track), [6.0, 36.0, 6.0]);
    assert_eq!(a.source_range().unwrap(), range(4.0, 36.0));
    assert_eq!(track.duration().unwrap(), frames(48.0));
    assert_eq!(a.range_in_parent().unwrap().start_time, frames(6.0));
}

#[test]
fn trim_inserts_a_gap_when_shrinking_the_head() {
    let track = Track::video("V1");
    track.append_child(clip("a", 0.0, 24.0)).unwrap();
    track.append_child(clip("b", 0.0, 24.0)).unwrap();

    let a = track.child_at(0).unwrap();
    a.trim(frames(6.0), frames(0.0)).unwrap();

    let kinds: Vec<ComposableKind> = track.children().iter().map(|c| c.kind()).collect();
    assert_eq!(
        kinds,
        [ComposableKind::Gap, ComposableKind::Clip, ComposableKind::Clip]
    );
    assert_eq!(durations(&track), [6.0, 18.0, 24.0]);
    // b has not moved
    let b = track.child_at(2).unwrap();
    assert_eq!(b.range_in_parent().unwrap().start_time, frames(24.0));
}

#[test]
fn trim_without_absorbing_gap_fails() {
    let track = Track::video("V1");
    track.append_child(clip("a", 10.0, 24.0)).unwrap();

    let a = track.child_at(0).unwrap();
    // extending the head would push the clip before the track origin
    assert!(matches!(
        a.trim(frames(-6.0), frames(0.0)),
        Err(TimelineError::InsufficientNeighborDuration { .. })
    ));
    assert_eq!(a.source_range().unwrap(), range(10.0, 24.0));
}

#[test]
fn ripple_shifts_later_siblings() {
    let track = Track::video("V1");
    track.append_child(clip("a", 0.0, 24.0)).unwrap();
    track.append_child(clip("b", 0.0, 24.0)).unwrap();

    let a = track.child_at(0).unwrap();
    a.ripple(frames(0.0), frames(6.0)).unwrap();

    assert_eq!(durations(&track), [30.0, 24.0]);
    assert_eq!(track.duration().unwrap(), frames(54.0));
    let b = track.child_at(1).unwrap();
    assert_eq!(b.range_in_parent().unwrap().start_time, frames(30.0));
}

#[test]
fn ripple_rejects_negative_durations() {
    let track = Track::video("V1");
    track.append_child(clip("a", 0.0, 24.0)).unwrap();

    let a = track.child_at(0).unwrap();
    assert!(matches!(
        a.ripple(frames(30.0), frames(0.0)),
        Err(TimelineError::OutOfAvailableRange { .. })
    ));
}

#[test]
fn roll_moves_the_cut_without_changing_total_duration() {
    let track = Track::video("V1");
    track.append_child(clip("a", 0.0, 24.0)).unwrap();
    track.append_child(clip("b", 6.0, 24.0)).unwrap();

    let b = track.child_at(1).unwrap();
    b.roll(frames(-6.0), frames(0.0)).unwrap();

    assert_eq!(durations(&track), [18.0, 30.0]);
    assert_eq!(b.source_range().unwrap(), range(0.0, 30.0));
    assert_eq!(track.duration().unwrap(), frames(48.0));
}

#[test]
fn roll_fails_when_the_neighbor_cannot_absorb() {
    let track = Track::video("V1");
    track.append_child(clip("a", 0.0, 12.0)).unwrap();
    track.append_child(clip("b", 0.0, 24.0)).unwrap();

    let b = track.child_at(1).unwrap();
    assert!(matches!(
        b.roll(frames(-18.0), frames(0.0)),
        Err(TimelineError::InsufficientNeighborDuration { .. })
    ));
    assert_eq!(durations(&track), [12.0, 24.0]);
}
