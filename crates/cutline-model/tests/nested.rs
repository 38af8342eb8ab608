//! Composition, range, and transform behavior across nested trees.

use cutline_model::{
    Clip, Gap, MediaReference, RationalTime, Stack, TimeRange, Timeline, TimelineError, Track,
};

fn frames(n: f64) -> RationalTime {
    RationalTime::new(n, 24.0)
}

fn range(start: f64, duration: f64) -> TimeRange {
    TimeRange::new(frames(start), frames(duration))
}

fn clip(name: &str, duration: f64) -> Clip {
    let clip = Clip::with_reference(
        name,
        MediaReference::external(format!("file:///media/{name}.mov"), Some(range(0.0, 100.0))),
    );
    clip.set_source_range(Some(range(0.0, duration)));
    clip
}

#[test]
fn track_of_clip_and_gap_has_the_documented_range() {
    let track = Track::video("V1");
    track.append_child(clip("a", 24.0)).unwrap();
    track.append_child(Gap::new(frames(12.0))).unwrap();

    assert_eq!(track.trimmed_range().unwrap(), range(0.0, 36.0));
    assert_eq!(track.range_of_child_at_index(1).unwrap(), range(24.0, 12.0));
}

#[test]
fn clip_time_maps_into_gap_local_coordinates() {
    let track = Track::video("V1");
    let a = clip("a", 24.0);
    let gap = Gap::new(frames(12.0));
    track.append_child(a.clone()).unwrap();
    track.append_child(gap.clone()).unwrap();

    let t = a
        .as_composable()
        .transformed_time(frames(5.0), &gap.as_composable())
        .unwrap();
    assert_eq!(t, frames(-19.0));
}

#[test]
fn nested_stack_inside_a_track_offsets_its_content() {
    // V1: [lead(24), stack[inner clip(48)]]
    let track = Track::video("V1");
    track.append_child(clip("lead", 24.0)).unwrap();
    let stack = Stack::new("nested");
    let inner_track = Track::video("inner");
    let deep = clip("deep", 48.0);
    inner_track.append_child(deep.clone()).unwrap();
    stack.append_child(inner_track).unwrap();
    track.append_child(stack).unwrap();

    assert_eq!(track.duration().unwrap(), frames(72.0));
    assert_eq!(track.range_of_child_at_index(1).unwrap(), range(24.0, 48.0));

    // frame 10 of the deep clip is frame 34 of the outer track
    let t = deep
        .as_composable()
        .transformed_time(frames(10.0), &track.as_composable())
        .unwrap();
    assert_eq!(t, frames(34.0));
}

#[test]
fn trimmed_nested_track_reports_its_source_range() {
    let inner = Track::video("inner");
    inner.append_child(clip("a", 48.0)).unwrap();
    inner.set_source_range(Some(range(12.0, 24.0)));

    let outer = Track::video("outer");
    outer.append_child(clip("lead", 24.0)).unwrap();
    outer.append_child(inner.clone()).unwrap();

    assert_eq!(inner.trimmed_range().unwrap(), range(12.0, 24.0));
    assert_eq!(outer.duration().unwrap(), frames(48.0));
    assert_eq!(outer.range_of_child_at_index(1).unwrap(), range(24.0, 24.0));
}

#[test]
fn stack_children_share_the_time_origin() {
    let stack = Stack::new("S");
    let v1 = Track::video("V1");
    v1.append_child(clip("a", 24.0)).unwrap();
    let v2 = Track::video("V2");
    v2.append_child(Gap::new(frames(12.0))).unwrap();
    v2.append_child(clip("b", 48.0)).unwrap();
    stack.append_child(v1).unwrap();
    stack.append_child(v2).unwrap();

    assert_eq!(stack.duration().unwrap(), frames(60.0));
    assert_eq!(stack.range_of_child_at_index(0).unwrap(), range(0.0, 24.0));
    assert_eq!(stack.range_of_child_at_index(1).unwrap(), range(0.0, 60.0));
}

#[test]
fn available_range_errors_are_specific() {
    let bare = Clip::new("bare");
    assert!(matches!(
        bare.available_range(),
        Err(TimelineError::NoMediaReference { .. })
    ));

    let c = clip("a", 24.0);
    c.set_media_reference(MediaReference::external("file:///media/a.mov", None));
    assert!(matches!(
        c.available_range(),
        Err(TimelineError::NoAvailableRange { .. })
    ));
    // the explicit source range still gives it a duration
    assert_eq!(c.duration().unwrap(), frames(24.0));
}

#[test]
fn range_in_parent_requires_attachment() {
    let c = clip("loose", 24.0);
    assert!(matches!(
        c.range_in_parent(),
        Err(TimelineError::NoParent { .. })
    ));
}

#[test]
fn deep_clone_is_equal_but_distinct() {
    let track = Track::video("V1");
    track.append_child(clip("a", 24.0)).unwrap();
    track.append_child(Gap::new(frames(12.0))).unwrap();

    let copy = track.as_composable().deep_clone();
    assert!(copy.content_eq(&track.as_composable()));
    assert!(!copy.ptr_eq(&track.as_composable()));
    assert!(copy.parent().is_none());

    // mutating the copy leaves the original alone
    let copy_track = copy.as_track().unwrap();
    copy_track.remove_child(1).unwrap();
    assert!(!copy.content_eq(&track.as_composable()));
    assert_eq!(track.len(), 2);
}

#[test]
fn clear_children_detaches_everything() {
    let track = Track::video("V1");
    let a = clip("a", 24.0);
    let b = clip("b", 24.0);
    track.append_child(a.clone()).unwrap();
    track.append_child(b.clone()).unwrap();

    let removed = track.clear_children();
    assert_eq!(removed.len(), 2);
    assert!(track.is_empty());
    assert!(a.parent().is_none());
    assert!(b.parent().is_none());
    assert_eq!(track.duration().unwrap().value, 0.0);
}

#[test]
fn timeline_search_spans_all_tracks() {
    let timeline = Timeline::new("cut");
    let v1 = timeline.add_video_track("V1").unwrap();
    v1.append_child(clip("a", 24.0)).unwrap();
    let a1 = timeline.add_audio_track("A1").unwrap();
    a1.append_child(clip("dialog", 24.0)).unwrap();

    let names: Vec<String> = timeline.find_clips().map(|c| c.name()).collect();
    assert_eq!(names, ["a", "dialog"]);
}

#[test]
fn cross_rate_children_sum_at_the_first_child_rate() {
    let track = Track::video("V1");
    track.append_child(clip("film", 24.0)).unwrap();
    // 30 frames at 30fps is one second
    let video = Clip::with_reference(
        "video",
        MediaReference::external(
            "file:///media/video.mov",
            Some(TimeRange::new(
                RationalTime::zero(30.0),
                RationalTime::new(300.0, 30.0),
            )),
        ),
    );
    video.set_source_range(Some(TimeRange::new(
        RationalTime::zero(30.0),
        RationalTime::new(30.0, 30.0),
    )));
    track.append_child(video).unwrap();

    // 24 frames + 1 second = 48 frames at 24fps
    assert_eq!(track.duration().unwrap(), frames(48.0));
}
