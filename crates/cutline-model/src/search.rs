//! Searching a composition tree.
//!
//! Searches snapshot their results eagerly: the returned cursor holds
//! handles collected at call time, so mutating the tree afterwards never
//! invalidates or reorders an in-flight traversal.

use crate::composable::{Composable, NodeKind};
use crate::composition::Track;
use crate::items::Clip;

/// An eager result set with a replayable cursor.
#[derive(Debug, Clone)]
pub struct SearchResults<T> {
    items: Vec<T>,
    cursor: usize,
}

impl<T> SearchResults<T> {
    pub(crate) fn new(items: Vec<T>) -> SearchResults<T> {
        SearchResults { items, cursor: 0 }
    }

    /// Total number of results, independent of cursor position.
    pub fn count(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Rewind the cursor to the first result.
    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn into_vec(self) -> Vec<T> {
        self.items
    }
}

impl<T: Clone> Iterator for SearchResults<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        let item = self.items.get(self.cursor).cloned()?;
        self.cursor += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let rest = self.items.len() - self.cursor;
        (rest, Some(rest))
    }
}

/// All clips beneath `container`, depth first, in track order.
pub(crate) fn find_clips_deep(container: &Composable) -> SearchResults<Clip> {
    let mut clips = Vec::new();
    collect_clips(container, &mut clips);
    SearchResults::new(clips)
}

fn collect_clips(container: &Composable, out: &mut Vec<Clip>) {
    let children = {
        let node = container.node.read();
        node.children().cloned().unwrap_or_default()
    };
    for child in children {
        let is_container = {
            let node = child.node.read();
            matches!(node.kind, NodeKind::Track(_) | NodeKind::Stack(_))
        };
        if let Some(clip) = child.as_clip() {
            out.push(clip);
        } else if is_container {
            collect_clips(&child, out);
        }
    }
}

/// All tracks beneath `container`, depth first, in composition order.
pub(crate) fn find_tracks_deep(container: &Composable) -> SearchResults<Track> {
    let mut tracks = Vec::new();
    collect_tracks(container, &mut tracks);
    SearchResults::new(tracks)
}

fn collect_tracks(container: &Composable, out: &mut Vec<Track>) {
    let children = {
        let node = container.node.read();
        node.children().cloned().unwrap_or_default()
    };
    for child in children {
        let is_container = {
            let node = child.node.read();
            matches!(node.kind, NodeKind::Track(_) | NodeKind::Stack(_))
        };
        if let Some(track) = child.as_track() {
            out.push(track);
        }
        if is_container {
            collect_tracks(&child, out);
        }
    }
}

/// Every descendant of `container`, pre-order, excluding `container`
/// itself.
pub fn descendants(container: &Composable) -> SearchResults<Composable> {
    let mut all = Vec::new();
    collect_descendants(container, &mut all);
    SearchResults::new(all)
}

fn collect_descendants(container: &Composable, out: &mut Vec<Composable>) {
    let children = {
        let node = container.node.read();
        node.children().cloned().unwrap_or_default()
    };
    for child in children {
        out.push(child.clone());
        collect_descendants(&child, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composition::{Stack, Track};
    use crate::items::Gap;
    use crate::reference::MediaReference;
    use cutline_time::{RationalTime, TimeRange};

    fn frames(n: f64) -> RationalTime {
        RationalTime::new(n, 24.0)
    }

    fn clip(name: &str) -> Clip {
        let clip = Clip::with_reference(
            name,
            MediaReference::external(
                format!("file:///media/{name}.mov"),
                Some(TimeRange::new(frames(0.0), frames(24.0))),
            ),
        );
        clip.set_source_range(Some(TimeRange::new(frames(0.0), frames(24.0))));
        clip
    }

    fn sample_stack() -> Stack {
        let stack = Stack::new("S");
        let v1 = Track::video("V1");
        v1.append_child(clip("a")).unwrap();
        v1.append_child(Gap::new(frames(12.0))).unwrap();
        v1.append_child(clip("b")).unwrap();
        let nested = Stack::new("nested");
        let v2 = Track::video("V2");
        v2.append_child(clip("c")).unwrap();
        nested.append_child(v2).unwrap();
        let v3 = Track::video("V3");
        v3.append_child(nested).unwrap();
        stack.append_child(v1).unwrap();
        stack.append_child(v3).unwrap();
        stack
    }

    #[test]
    fn deep_search_finds_nested_clips() {
        let stack = sample_stack();
        let names: Vec<String> = stack.find_clips().map(|c| c.name()).collect();
        assert_eq!(names, ["a", "b", "c"]);
    }

    #[test]
    fn cursor_counts_and_resets() {
        let stack = sample_stack();
        let mut results = stack.find_clips();
        assert_eq!(SearchResults::count(&results), 3);

        let first = results.next().unwrap();
        assert_eq!(first.name(), "a");
        assert_eq!(results.next().unwrap().name(), "b");

        results.reset();
        assert_eq!(results.next().unwrap().name(), "a");
        assert_eq!(SearchResults::count(&results), 3);
    }

    #[test]
    fn results_survive_later_mutation() {
        let stack = sample_stack();
        let mut results = stack.find_clips();

        // drop V1 from the stack after the search snapshot was taken
        stack.remove_child(0).unwrap();
        assert_eq!(SearchResults::count(&results), 3);
        assert_eq!(results.next().unwrap().name(), "a");
    }

    #[test]
    fn track_search_is_direct_children_only() {
        let stack = sample_stack();
        let v3 = stack.child_at(1).unwrap().as_track().unwrap();
        // the only child of V3 is a nested stack, not a clip
        assert!(v3.find_clips().is_empty());
    }

    #[test]
    fn track_search_descends_into_nested_stacks() {
        let stack = sample_stack();
        let names: Vec<String> = stack.find_tracks().map(|t| t.name()).collect();
        assert_eq!(names, ["V1", "V3", "V2"]);
    }

    #[test]
    fn descendants_walk_pre_order() {
        let stack = sample_stack();
        let names: Vec<String> = descendants(&stack.as_composable())
            .map(|c| c.name())
            .collect();
        assert_eq!(names, ["V1", "a", "", "b", "V3", "nested", "V2", "c"]);
    }
}
