//! The shared node representation behind every composable handle.
//!
//! Every object in a composition tree is a [`Node`] owned by an
//! `Arc<RwLock<..>>`. Public handles ([`Composable`] and the typed wrappers
//! in [`crate::items`] and [`crate::composition`]) are thin clones of that
//! `Arc`, so handing a clip to a track never copies it and detaching a child
//! never invalidates handles the caller still holds. Parent links are weak:
//! dropping a timeline drops the whole tree even though children point back
//! at their parents.

use std::collections::BTreeMap;
use std::sync::{Arc, Weak};

use cutline_time::{RationalTime, TimeRange};
use parking_lot::RwLock;

use crate::effect::Effect;
use crate::error::{TimelineError, TimelineResult};
use crate::items::{Clip, Gap, Transition};
use crate::composition::{Stack, Track, TrackKind};
use crate::marker::Marker;
use crate::metadata::{Metadata, MetadataValue};
use crate::reference::MediaReference;

pub(crate) type NodePtr = Arc<RwLock<Node>>;
pub(crate) type NodeWeak = Weak<RwLock<Node>>;

/// State shared by every item kind: the trim window plus annotations.
#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) struct ItemCore {
    pub source_range: Option<TimeRange>,
    pub markers: Vec<Marker>,
    pub effects: Vec<Effect>,
}

#[derive(Debug, Clone)]
pub(crate) struct ClipData {
    pub core: ItemCore,
    pub references: BTreeMap<String, MediaReference>,
    pub active_reference_key: String,
}

#[derive(Debug, Clone)]
pub(crate) struct GapData {
    pub core: ItemCore,
}

#[derive(Debug, Clone)]
pub(crate) struct TransitionData {
    pub transition_type: String,
    pub in_offset: RationalTime,
    pub out_offset: RationalTime,
}

#[derive(Debug)]
pub(crate) struct TrackData {
    pub core: ItemCore,
    pub kind: TrackKind,
    pub children: Vec<Composable>,
}

#[derive(Debug)]
pub(crate) struct StackData {
    pub core: ItemCore,
    pub children: Vec<Composable>,
}

/// Closed set of node kinds. The composition model is not an open class
/// hierarchy; matching on this enum is exhaustive by construction.
#[derive(Debug)]
pub(crate) enum NodeKind {
    Clip(ClipData),
    Gap(GapData),
    Transition(TransitionData),
    Track(TrackData),
    Stack(StackData),
}

/// Discriminant of a composable, for callers that branch on kind without
/// downcasting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposableKind {
    Clip,
    Gap,
    Transition,
    Track,
    Stack,
}

pub(crate) struct Node {
    pub name: String,
    pub metadata: Metadata,
    pub parent: NodeWeak,
    pub kind: NodeKind,
}

impl Node {
    pub(crate) fn item_core(&self) -> Option<&ItemCore> {
        match &self.kind {
            NodeKind::Clip(d) => Some(&d.core),
            NodeKind::Gap(d) => Some(&d.core),
            NodeKind::Track(d) => Some(&d.core),
            NodeKind::Stack(d) => Some(&d.core),
            NodeKind::Transition(_) => None,
        }
    }

    pub(crate) fn item_core_mut(&mut self) -> Option<&mut ItemCore> {
        match &mut self.kind {
            NodeKind::Clip(d) => Some(&mut d.core),
            NodeKind::Gap(d) => Some(&mut d.core),
            NodeKind::Track(d) => Some(&mut d.core),
            NodeKind::Stack(d) => Some(&mut d.core),
            NodeKind::Transition(_) => None,
        }
    }

    pub(crate) fn children(&self) -> Option<&Vec<Composable>> {
        match &self.kind {
            NodeKind::Track(d) => Some(&d.children),
            NodeKind::Stack(d) => Some(&d.children),
            _ => None,
        }
    }

    pub(crate) fn children_mut(&mut self) -> Option<&mut Vec<Composable>> {
        match &mut self.kind {
            NodeKind::Track(d) => Some(&mut d.children),
            NodeKind::Stack(d) => Some(&mut d.children),
            _ => None,
        }
    }

    pub(crate) fn composable_kind(&self) -> ComposableKind {
        match &self.kind {
            NodeKind::Clip(_) => ComposableKind::Clip,
            NodeKind::Gap(_) => ComposableKind::Gap,
            NodeKind::Transition(_) => ComposableKind::Transition,
            NodeKind::Track(_) => ComposableKind::Track,
            NodeKind::Stack(_) => ComposableKind::Stack,
        }
    }

    /// The media window a clip can draw on, from its active reference.
    pub(crate) fn available_range(&self) -> TimelineResult<TimeRange> {
        match &self.kind {
            NodeKind::Clip(d) => {
                let reference = d.references.get(&d.active_reference_key).ok_or_else(|| {
                    TimelineError::NoMediaReference {
                        name: self.name.clone(),
                    }
                })?;
                reference
                    .available_range()
                    .ok_or_else(|| TimelineError::NoAvailableRange {
                        name: self.name.clone(),
                    })
            }
            _ => Err(TimelineError::NoAvailableRange {
                name: self.name.clone(),
            }),
        }
    }

    /// The range this node presents to its parent, in its own coordinates.
    ///
    /// An explicit `source_range` wins. A clip without one falls back to the
    /// full available range of its media; a track or stack without one spans
    /// `[0, content duration)`.
    pub(crate) fn trimmed_range(&self) -> TimelineResult<TimeRange> {
        if let Some(core) = self.item_core() {
            if let Some(range) = core.source_range {
                return Ok(range);
            }
        }
        match &self.kind {
            NodeKind::Clip(_) => self.available_range(),
            NodeKind::Gap(_) => Err(TimelineError::MalformedDocument {
                reason: format!("gap '{}' has no source range", self.name),
            }),
            NodeKind::Track(d) => {
                let total = sum_item_durations(&d.children)?;
                Ok(TimeRange::new(RationalTime::zero(total.rate), total))
            }
            NodeKind::Stack(d) => {
                let total = max_item_duration(&d.children)?;
                Ok(TimeRange::new(RationalTime::zero(total.rate), total))
            }
            NodeKind::Transition(t) => {
                let total = t.in_offset.checked_add(t.out_offset)?;
                Ok(TimeRange::new(RationalTime::zero(total.rate), total))
            }
        }
    }

    pub(crate) fn duration(&self) -> TimelineResult<RationalTime> {
        Ok(self.trimmed_range()?.duration)
    }
}

/// Sum of item child durations; transitions overlap their neighbors and
/// contribute nothing.
pub(crate) fn sum_item_durations(children: &[Composable]) -> TimelineResult<RationalTime> {
    let mut total: Option<RationalTime> = None;
    for child in children {
        let node = child.node.read();
        if matches!(node.kind, NodeKind::Transition(_)) {
            continue;
        }
        let d = node.duration()?;
        total = Some(match total {
            Some(acc) => acc.checked_add(d)?,
            None => d,
        });
    }
    Ok(total.unwrap_or_else(|| RationalTime::zero(1.0)))
}

pub(crate) fn max_item_duration(children: &[Composable]) -> TimelineResult<RationalTime> {
    let mut longest: Option<RationalTime> = None;
    for child in children {
        let node = child.node.read();
        if matches!(node.kind, NodeKind::Transition(_)) {
            continue;
        }
        let d = node.duration()?;
        longest = Some(match longest {
            Some(acc) if acc.compare(d)?.is_ge() => acc,
            _ => d,
        });
    }
    Ok(longest.unwrap_or_else(|| RationalTime::zero(1.0)))
}

/// A reference-counted handle to any node in a composition tree.
///
/// Cloning a `Composable` clones the handle, not the node. Use
/// [`Composable::deep_clone`] for a structural copy.
#[derive(Clone)]
pub struct Composable {
    pub(crate) node: NodePtr,
}

impl Composable {
    pub(crate) fn from_node(node: NodePtr) -> Composable {
        Composable { node }
    }

    pub(crate) fn new_node(name: String, kind: NodeKind) -> Composable {
        Composable {
            node: Arc::new(RwLock::new(Node {
                name,
                metadata: Metadata::new(),
                parent: Weak::new(),
                kind,
            })),
        }
    }

    pub fn name(&self) -> String {
        self.node.read().name.clone()
    }

    pub fn set_name(&self, name: impl Into<String>) {
        self.node.write().name = name.into();
    }

    pub fn kind(&self) -> ComposableKind {
        self.node.read().composable_kind()
    }

    /// Items occupy time in a track; transitions do not.
    pub fn is_item(&self) -> bool {
        self.kind() != ComposableKind::Transition
    }

    pub fn metadata(&self) -> Metadata {
        self.node.read().metadata.clone()
    }

    pub fn metadata_value(&self, key: &str) -> Option<MetadataValue> {
        self.node.read().metadata.get(key).cloned()
    }

    pub fn insert_metadata(&self, key: impl Into<String>, value: impl Into<MetadataValue>) {
        self.node.write().metadata.insert(key.into(), value.into());
    }

    pub fn set_metadata(&self, metadata: Metadata) {
        self.node.write().metadata = metadata;
    }

    /// The containing composition, if this node is attached to one.
    pub fn parent(&self) -> Option<Composable> {
        let weak = self.node.read().parent.clone();
        weak.upgrade().map(Composable::from_node)
    }

    /// True when both handles refer to the same node.
    pub fn ptr_eq(&self, other: &Composable) -> bool {
        Arc::ptr_eq(&self.node, &other.node)
    }

    /// The explicit trim window, if one is set. Transitions have none.
    pub fn source_range(&self) -> Option<TimeRange> {
        self.node.read().item_core().and_then(|c| c.source_range)
    }

    pub(crate) fn set_source_range(&self, range: Option<TimeRange>) {
        if let Some(core) = self.node.write().item_core_mut() {
            core.source_range = range;
        }
    }

    /// See [`Node::trimmed_range`].
    pub fn trimmed_range(&self) -> TimelineResult<TimeRange> {
        self.node.read().trimmed_range()
    }

    pub fn duration(&self) -> TimelineResult<RationalTime> {
        self.node.read().duration()
    }

    pub fn as_clip(&self) -> Option<Clip> {
        matches!(self.node.read().kind, NodeKind::Clip(_)).then(|| Clip::from_handle(self.clone()))
    }

    pub fn as_gap(&self) -> Option<Gap> {
        matches!(self.node.read().kind, NodeKind::Gap(_)).then(|| Gap::from_handle(self.clone()))
    }

    pub fn as_transition(&self) -> Option<Transition> {
        matches!(self.node.read().kind, NodeKind::Transition(_))
            .then(|| Transition::from_handle(self.clone()))
    }

    pub fn as_track(&self) -> Option<Track> {
        matches!(self.node.read().kind, NodeKind::Track(_))
            .then(|| Track::from_handle(self.clone()))
    }

    pub fn as_stack(&self) -> Option<Stack> {
        matches!(self.node.read().kind, NodeKind::Stack(_))
            .then(|| Stack::from_handle(self.clone()))
    }

    /// Structural copy of this node and everything below it. The copy has no
    /// parent and shares no state with the original.
    pub fn deep_clone(&self) -> Composable {
        let src = self.node.read();
        let name = src.name.clone();
        let metadata = src.metadata.clone();
        let kind = match &src.kind {
            NodeKind::Clip(d) => NodeKind::Clip(d.clone()),
            NodeKind::Gap(d) => NodeKind::Gap(d.clone()),
            NodeKind::Transition(d) => NodeKind::Transition(d.clone()),
            NodeKind::Track(d) => NodeKind::Track(TrackData {
                core: d.core.clone(),
                kind: d.kind,
                children: Vec::new(),
            }),
            NodeKind::Stack(d) => NodeKind::Stack(StackData {
                core: d.core.clone(),
                children: Vec::new(),
            }),
        };
        let child_clones: Vec<Composable> = src
            .children()
            .map(|cs| cs.iter().map(Composable::deep_clone).collect())
            .unwrap_or_default();
        drop(src);

        let clone = Composable {
            node: Arc::new(RwLock::new(Node {
                name,
                metadata,
                parent: Weak::new(),
                kind,
            })),
        };
        for child in &child_clones {
            child.node.write().parent = Arc::downgrade(&clone.node);
        }
        if !child_clones.is_empty() {
            let mut node = clone.node.write();
            if let Some(children) = node.children_mut() {
                *children = child_clones;
            }
        }
        clone
    }

    /// Structural equality: same kind, fields, and recursively equal
    /// children. Parent links and handle identity are ignored.
    pub fn content_eq(&self, other: &Composable) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        let a = self.node.read();
        let b = other.node.read();
        if a.name != b.name || a.metadata != b.metadata {
            return false;
        }
        match (&a.kind, &b.kind) {
            (NodeKind::Clip(x), NodeKind::Clip(y)) => {
                x.core == y.core
                    && x.references == y.references
                    && x.active_reference_key == y.active_reference_key
            }
            (NodeKind::Gap(x), NodeKind::Gap(y)) => x.core == y.core,
            (NodeKind::Transition(x), NodeKind::Transition(y)) => {
                x.transition_type == y.transition_type
                    && x.in_offset == y.in_offset
                    && x.out_offset == y.out_offset
            }
            (NodeKind::Track(x), NodeKind::Track(y)) => {
                x.core == y.core
                    && x.kind == y.kind
                    && children_content_eq(&x.children, &y.children)
            }
            (NodeKind::Stack(x), NodeKind::Stack(y)) => {
                x.core == y.core && children_content_eq(&x.children, &y.children)
            }
            _ => false,
        }
    }

    pub(crate) fn with_core<R>(&self, f: impl FnOnce(&ItemCore) -> R) -> Option<R> {
        self.node.read().item_core().map(f)
    }

    pub(crate) fn with_core_mut<R>(&self, f: impl FnOnce(&mut ItemCore) -> R) -> Option<R> {
        self.node.write().item_core_mut().map(f)
    }
}

fn children_content_eq(a: &[Composable], b: &[Composable]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.content_eq(y))
}

impl std::fmt::Debug for Composable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let node = self.node.read();
        f.debug_struct("Composable")
            .field("kind", &node.composable_kind())
            .field("name", &node.name)
            .finish()
    }
}

/// Common accessors every typed handle forwards to its inner [`Composable`].
macro_rules! impl_composable_api {
    ($ty:ty) => {
        impl $ty {
            pub(crate) fn from_handle(handle: $crate::composable::Composable) -> Self {
                Self { handle }
            }

            /// The untyped handle to the same node.
            pub fn as_composable(&self) -> $crate::composable::Composable {
                self.handle.clone()
            }

            pub fn name(&self) -> String {
                self.handle.name()
            }

            pub fn set_name(&self, name: impl Into<String>) {
                self.handle.set_name(name);
            }

            pub fn metadata(&self) -> $crate::metadata::Metadata {
                self.handle.metadata()
            }

            pub fn metadata_value(&self, key: &str) -> Option<$crate::metadata::MetadataValue> {
                self.handle.metadata_value(key)
            }

            pub fn insert_metadata(
                &self,
                key: impl Into<String>,
                value: impl Into<$crate::metadata::MetadataValue>,
            ) {
                self.handle.insert_metadata(key, value);
            }

            pub fn parent(&self) -> Option<$crate::composable::Composable> {
                self.handle.parent()
            }

            pub fn ptr_eq(&self, other: &$ty) -> bool {
                self.handle.ptr_eq(&other.handle)
            }
        }

        impl From<$ty> for $crate::composable::Composable {
            fn from(v: $ty) -> $crate::composable::Composable {
                v.handle
            }
        }
    };
}

/// Accessors shared by item handles (everything except transitions).
macro_rules! impl_item_api {
    ($ty:ty) => {
        impl $ty {
            pub fn source_range(&self) -> Option<cutline_time::TimeRange> {
                self.handle.source_range()
            }

            pub fn set_source_range(&self, range: Option<cutline_time::TimeRange>) {
                self.handle.set_source_range(range);
            }

            pub fn duration(&self) -> $crate::error::TimelineResult<cutline_time::RationalTime> {
                self.handle.duration()
            }

            pub fn trimmed_range(&self) -> $crate::error::TimelineResult<cutline_time::TimeRange> {
                self.handle.trimmed_range()
            }

            /// Where this item sits inside its parent, in parent coordinates.
            pub fn range_in_parent(&self) -> $crate::error::TimelineResult<cutline_time::TimeRange> {
                $crate::transform::range_in_parent(&self.handle)
            }

            pub fn markers(&self) -> Vec<$crate::marker::Marker> {
                self.handle
                    .with_core(|c| c.markers.clone())
                    .unwrap_or_default()
            }

            pub fn add_marker(&self, marker: $crate::marker::Marker) {
                self.handle.with_core_mut(|c| c.markers.push(marker));
            }

            pub fn set_markers(&self, markers: Vec<$crate::marker::Marker>) {
                self.handle.with_core_mut(|c| c.markers = markers);
            }

            pub fn effects(&self) -> Vec<$crate::effect::Effect> {
                self.handle
                    .with_core(|c| c.effects.clone())
                    .unwrap_or_default()
            }

            pub fn add_effect(&self, effect: $crate::effect::Effect) {
                self.handle.with_core_mut(|c| c.effects.push(effect));
            }

            pub fn set_effects(&self, effects: Vec<$crate::effect::Effect>) {
                self.handle.with_core_mut(|c| c.effects = effects);
            }
        }
    };
}

pub(crate) use impl_composable_api;
pub(crate) use impl_item_api;

/// Attach `child` at `index` of `container`'s children.
///
/// Validates before mutating: the child must be parentless, the index in
/// bounds, and the attachment must not close a cycle.
pub(crate) fn attach_child(
    container: &Composable,
    child: &Composable,
    index: usize,
) -> TimelineResult<()> {
    if child.parent().is_some() {
        return Err(TimelineError::AlreadyHasParent { name: child.name() });
    }
    // Walk up from the container; finding the child means the container
    // lives inside the tree being attached.
    let mut cursor = Some(container.clone());
    while let Some(node) = cursor {
        if node.ptr_eq(child) {
            return Err(TimelineError::CycleDetected { name: child.name() });
        }
        cursor = node.parent();
    }
    let len = container
        .node
        .read()
        .children()
        .map(Vec::len)
        .unwrap_or(0);
    if index > len {
        return Err(TimelineError::IndexOutOfBounds { index, len });
    }
    child.node.write().parent = Arc::downgrade(&container.node);
    let mut node = container.node.write();
    if let Some(children) = node.children_mut() {
        children.insert(index, child.clone());
    }
    Ok(())
}

/// Detach the child at `index`, returning its handle. The node survives as
/// long as any handle does.
pub(crate) fn detach_child(container: &Composable, index: usize) -> TimelineResult<Composable> {
    let mut node = container.node.write();
    let children = node
        .children_mut()
        .ok_or_else(|| TimelineError::MalformedDocument {
            reason: "composable cannot hold children".into(),
        })?;
    if index >= children.len() {
        return Err(TimelineError::IndexOutOfBounds {
            index,
            len: children.len(),
        });
    }
    let removed = children.remove(index);
    drop(node);
    removed.node.write().parent = Weak::new();
    Ok(removed)
}

/// Swap the entire child list of `container`, fixing parent links on both
/// the outgoing and incoming children. Used by edit commits after their
/// validation pass.
pub(crate) fn replace_children(container: &Composable, new_children: Vec<Composable>) {
    let old = {
        let mut node = container.node.write();
        match node.children_mut() {
            Some(children) => std::mem::take(children),
            None => return,
        }
    };
    for child in &old {
        child.node.write().parent = Weak::new();
    }
    for child in &new_children {
        child.node.write().parent = Arc::downgrade(&container.node);
    }
    let mut node = container.node.write();
    if let Some(children) = node.children_mut() {
        *children = new_children;
    }
}
