//! Compositions: tracks (sequential) and stacks (parallel).

use cutline_time::{RationalTime, TimeRange};

use crate::composable::{
    attach_child, detach_child, impl_composable_api, impl_item_api, Composable, ItemCore,
    NodeKind, StackData, TrackData,
};
use crate::error::{TimelineError, TimelineResult};
use crate::items::Clip;
use crate::search::SearchResults;

/// What a track carries. Purely informational; the composition math is
/// identical for both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackKind {
    #[default]
    Video,
    Audio,
}

impl TrackKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackKind::Video => "Video",
            TrackKind::Audio => "Audio",
        }
    }

    pub fn from_name(s: &str) -> TrackKind {
        if s.eq_ignore_ascii_case("audio") {
            TrackKind::Audio
        } else {
            TrackKind::Video
        }
    }
}

/// A sequence of items laid end to end, with no implicit gaps.
///
/// A child's position is the sum of the durations of the items before it.
/// Transitions overlap their neighbors and contribute nothing to that sum.
#[derive(Debug, Clone)]
pub struct Track {
    handle: Composable,
}

impl_composable_api!(Track);
impl_item_api!(Track);

impl Track {
    pub fn new(name: impl Into<String>, kind: TrackKind) -> Track {
        Track {
            handle: Composable::new_node(
                name.into(),
                NodeKind::Track(TrackData {
                    core: ItemCore::default(),
                    kind,
                    children: Vec::new(),
                }),
            ),
        }
    }

    pub fn video(name: impl Into<String>) -> Track {
        Track::new(name, TrackKind::Video)
    }

    pub fn audio(name: impl Into<String>) -> Track {
        Track::new(name, TrackKind::Audio)
    }

    pub fn track_kind(&self) -> TrackKind {
        let node = self.handle.node.read();
        match &node.kind {
            NodeKind::Track(d) => d.kind,
            _ => TrackKind::Video,
        }
    }

    pub fn set_track_kind(&self, kind: TrackKind) {
        let mut node = self.handle.node.write();
        if let NodeKind::Track(d) = &mut node.kind {
            d.kind = kind;
        }
    }

    pub fn children(&self) -> Vec<Composable> {
        container_children(&self.handle)
    }

    pub fn len(&self) -> usize {
        container_len(&self.handle)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn child_at(&self, index: usize) -> TimelineResult<Composable> {
        container_child_at(&self.handle, index)
    }

    pub fn index_of(&self, child: &Composable) -> Option<usize> {
        container_index_of(&self.handle, child)
    }

    /// Append `child`. Fails if it already has a parent or the attachment
    /// would close a cycle.
    pub fn append_child(&self, child: impl Into<Composable>) -> TimelineResult<()> {
        let child = child.into();
        attach_child(&self.handle, &child, self.len())
    }

    pub fn insert_child(&self, index: usize, child: impl Into<Composable>) -> TimelineResult<()> {
        let child = child.into();
        attach_child(&self.handle, &child, index)
    }

    /// Detach and return the child at `index`. Handles held elsewhere stay
    /// valid.
    pub fn remove_child(&self, index: usize) -> TimelineResult<Composable> {
        detach_child(&self.handle, index)
    }

    /// Detach every child, returning their handles in order.
    pub fn clear_children(&self) -> Vec<Composable> {
        clear_container(&self.handle)
    }

    /// Where the child at `index` sits in this track's coordinates.
    ///
    /// For a transition the range is centered on its cut, reaching
    /// `in_offset` back and `out_offset` forward.
    pub fn range_of_child_at_index(&self, index: usize) -> TimelineResult<TimeRange> {
        range_of_child_at_index(&self.handle, index)
    }

    pub fn range_of_child(&self, child: &Composable) -> TimelineResult<TimeRange> {
        let index = self
            .index_of(child)
            .ok_or(TimelineError::NotRelated)?;
        self.range_of_child_at_index(index)
    }

    /// The items immediately before and after `child`, skipping nothing.
    pub fn neighbors_of(
        &self,
        child: &Composable,
    ) -> TimelineResult<(Option<Composable>, Option<Composable>)> {
        let children = self.children();
        let index = children
            .iter()
            .position(|c| c.ptr_eq(child))
            .ok_or(TimelineError::NotRelated)?;
        let prev = index.checked_sub(1).map(|i| children[i].clone());
        let next = children.get(index + 1).cloned();
        Ok((prev, next))
    }

    /// The clips that are direct children of this track, in order.
    pub fn find_clips(&self) -> SearchResults<Clip> {
        SearchResults::new(
            self.children()
                .iter()
                .filter_map(Composable::as_clip)
                .collect(),
        )
    }
}

/// Items stacked in parallel, all starting at time zero.
///
/// A stack's duration is the longest of its children's trimmed durations.
#[derive(Debug, Clone)]
pub struct Stack {
    handle: Composable,
}

impl_composable_api!(Stack);
impl_item_api!(Stack);

impl Stack {
    pub fn new(name: impl Into<String>) -> Stack {
        Stack {
            handle: Composable::new_node(
                name.into(),
                NodeKind::Stack(StackData {
                    core: ItemCore::default(),
                    children: Vec::new(),
                }),
            ),
        }
    }

    pub fn children(&self) -> Vec<Composable> {
        container_children(&self.handle)
    }

    pub fn len(&self) -> usize {
        container_len(&self.handle)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn child_at(&self, index: usize) -> TimelineResult<Composable> {
        container_child_at(&self.handle, index)
    }

    pub fn index_of(&self, child: &Composable) -> Option<usize> {
        container_index_of(&self.handle, child)
    }

    pub fn append_child(&self, child: impl Into<Composable>) -> TimelineResult<()> {
        let child = child.into();
        attach_child(&self.handle, &child, self.len())
    }

    pub fn insert_child(&self, index: usize, child: impl Into<Composable>) -> TimelineResult<()> {
        let child = child.into();
        attach_child(&self.handle, &child, index)
    }

    pub fn remove_child(&self, index: usize) -> TimelineResult<Composable> {
        detach_child(&self.handle, index)
    }

    /// Detach every child, returning their handles in order.
    pub fn clear_children(&self) -> Vec<Composable> {
        clear_container(&self.handle)
    }

    /// Every child of a stack starts at time zero of its own duration's
    /// rate.
    pub fn range_of_child_at_index(&self, index: usize) -> TimelineResult<TimeRange> {
        range_of_child_at_index(&self.handle, index)
    }

    /// All clips beneath this stack, depth first.
    pub fn find_clips(&self) -> SearchResults<Clip> {
        crate::search::find_clips_deep(&self.handle)
    }

    /// All tracks beneath this stack, depth first.
    pub fn find_tracks(&self) -> SearchResults<Track> {
        crate::search::find_tracks_deep(&self.handle)
    }

    /// All tracks that are direct children of this stack.
    pub fn tracks(&self) -> Vec<Track> {
        self.children()
            .iter()
            .filter_map(Composable::as_track)
            .collect()
    }
}

pub(crate) fn container_children(container: &Composable) -> Vec<Composable> {
    container
        .node
        .read()
        .children()
        .map(|c| c.to_vec())
        .unwrap_or_default()
}

fn clear_container(container: &Composable) -> Vec<Composable> {
    let removed = {
        let mut node = container.node.write();
        match node.children_mut() {
            Some(children) => std::mem::take(children),
            None => return Vec::new(),
        }
    };
    for child in &removed {
        child.node.write().parent = std::sync::Weak::new();
    }
    removed
}

pub(crate) fn container_len(container: &Composable) -> usize {
    container.node.read().children().map(Vec::len).unwrap_or(0)
}

fn container_child_at(container: &Composable, index: usize) -> TimelineResult<Composable> {
    let node = container.node.read();
    let children = node.children().ok_or_else(|| TimelineError::MalformedDocument {
        reason: "composable cannot hold children".into(),
    })?;
    children
        .get(index)
        .cloned()
        .ok_or(TimelineError::IndexOutOfBounds {
            index,
            len: children.len(),
        })
}

pub(crate) fn container_index_of(container: &Composable, child: &Composable) -> Option<usize> {
    container
        .node
        .read()
        .children()
        .and_then(|cs| cs.iter().position(|c| c.ptr_eq(child)))
}

/// Position of the child at `index` in its container's coordinates.
pub(crate) fn range_of_child_at_index(
    container: &Composable,
    index: usize,
) -> TimelineResult<TimeRange> {
    let node = container.node.read();
    match &node.kind {
        NodeKind::Track(d) => {
            let len = d.children.len();
            if index >= len {
                return Err(TimelineError::IndexOutOfBounds { index, len });
            }
            let mut cursor: Option<RationalTime> = None;
            for (i, child) in d.children.iter().enumerate() {
                let cnode = child.node.read();
                if let NodeKind::Transition(t) = &cnode.kind {
                    if i == index {
                        let cut = cursor.unwrap_or_else(|| RationalTime::zero(t.in_offset.rate));
                        let start = cut.checked_sub(t.in_offset)?;
                        let duration = t.in_offset.checked_add(t.out_offset)?;
                        return Ok(TimeRange::new(start, duration));
                    }
                    continue;
                }
                let duration = cnode.duration()?;
                let start = cursor.unwrap_or_else(|| RationalTime::zero(duration.rate));
                if i == index {
                    return Ok(TimeRange::new(start, duration));
                }
                cursor = Some(start.checked_add(duration)?);
            }
            Err(TimelineError::IndexOutOfBounds { index, len })
        }
        NodeKind::Stack(d) => {
            let len = d.children.len();
            let child = d
                .children
                .get(index)
                .ok_or(TimelineError::IndexOutOfBounds { index, len })?;
            let duration = child.node.read().duration()?;
            Ok(TimeRange::new(RationalTime::zero(duration.rate), duration))
        }
        _ => Err(TimelineError::MalformedDocument {
            reason: "composable cannot hold children".into(),
        }),
    }
}
