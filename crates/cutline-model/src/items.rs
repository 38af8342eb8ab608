//! Leaf items: clips, gaps, and transitions.

use std::collections::BTreeMap;

use cutline_time::{RationalTime, TimeRange};

use crate::composable::{
    impl_composable_api, impl_item_api, ClipData, Composable, GapData, ItemCore, NodeKind,
    TransitionData,
};
use crate::error::{TimelineError, TimelineResult};
use crate::reference::{MediaReference, DEFAULT_MEDIA_KEY};

/// A segment of media placed in a track.
///
/// A clip holds a keyed map of media references and an active key naming the
/// one in use. Most clips have a single reference under
/// [`DEFAULT_MEDIA_KEY`]; multi-reference clips model proxies and alternate
/// deliveries of the same material.
#[derive(Debug, Clone)]
pub struct Clip {
    handle: Composable,
}

impl_composable_api!(Clip);
impl_item_api!(Clip);

impl Clip {
    /// A clip with no media reference. Its duration is undefined until a
    /// source range or a reference with an available range is set.
    pub fn new(name: impl Into<String>) -> Clip {
        Clip {
            handle: Composable::new_node(
                name.into(),
                NodeKind::Clip(ClipData {
                    core: ItemCore::default(),
                    references: BTreeMap::new(),
                    active_reference_key: DEFAULT_MEDIA_KEY.to_owned(),
                }),
            ),
        }
    }

    /// A clip backed by `reference` under the default media key.
    pub fn with_reference(name: impl Into<String>, reference: MediaReference) -> Clip {
        let clip = Clip::new(name);
        clip.set_media_reference(reference);
        clip
    }

    /// The reference under the active key, if present.
    pub fn media_reference(&self) -> Option<MediaReference> {
        let node = self.handle.node.read();
        match &node.kind {
            NodeKind::Clip(d) => d.references.get(&d.active_reference_key).cloned(),
            _ => None,
        }
    }

    pub fn media_reference_for(&self, key: &str) -> Option<MediaReference> {
        let node = self.handle.node.read();
        match &node.kind {
            NodeKind::Clip(d) => d.references.get(key).cloned(),
            _ => None,
        }
    }

    /// Install `reference` under the active key.
    pub fn set_media_reference(&self, reference: MediaReference) {
        let mut node = self.handle.node.write();
        if let NodeKind::Clip(d) = &mut node.kind {
            let key = d.active_reference_key.clone();
            d.references.insert(key, reference);
        }
    }

    pub fn set_media_reference_for(&self, key: impl Into<String>, reference: MediaReference) {
        let mut node = self.handle.node.write();
        if let NodeKind::Clip(d) = &mut node.kind {
            d.references.insert(key.into(), reference);
        }
    }

    pub fn media_references(&self) -> BTreeMap<String, MediaReference> {
        let node = self.handle.node.read();
        match &node.kind {
            NodeKind::Clip(d) => d.references.clone(),
            _ => BTreeMap::new(),
        }
    }

    pub fn active_media_reference_key(&self) -> String {
        let node = self.handle.node.read();
        match &node.kind {
            NodeKind::Clip(d) => d.active_reference_key.clone(),
            _ => String::new(),
        }
    }

    /// Switch the active reference. The key must name an installed
    /// reference.
    pub fn set_active_media_reference_key(&self, key: &str) -> TimelineResult<()> {
        let mut node = self.handle.node.write();
        if let NodeKind::Clip(d) = &mut node.kind {
            if !d.references.contains_key(key) {
                return Err(TimelineError::NoMediaReference {
                    name: format!("{} (key '{}')", node.name, key),
                });
            }
            d.active_reference_key = key.to_owned();
        }
        Ok(())
    }

    /// The media window of the active reference.
    pub fn available_range(&self) -> TimelineResult<TimeRange> {
        self.handle.node.read().available_range()
    }
}

/// Empty time in a track. Gaps always carry an explicit source range.
#[derive(Debug, Clone)]
pub struct Gap {
    handle: Composable,
}

impl_composable_api!(Gap);
impl_item_api!(Gap);

impl Gap {
    /// A gap of the given duration, starting at time zero of its own rate.
    pub fn new(duration: RationalTime) -> Gap {
        Gap::named("", duration)
    }

    pub fn named(name: impl Into<String>, duration: RationalTime) -> Gap {
        Gap {
            handle: Composable::new_node(
                name.into(),
                NodeKind::Gap(GapData {
                    core: ItemCore {
                        source_range: Some(TimeRange::new(
                            RationalTime::zero(duration.rate),
                            duration,
                        )),
                        markers: Vec::new(),
                        effects: Vec::new(),
                    },
                }),
            ),
        }
    }
}

/// A cross-fade straddling the cut between two adjacent items.
///
/// A transition occupies no time of its own: `in_offset` reaches back into
/// the outgoing item and `out_offset` reaches forward into the incoming one.
#[derive(Debug, Clone)]
pub struct Transition {
    handle: Composable,
}

impl_composable_api!(Transition);

impl Transition {
    /// The conventional dissolve type name.
    pub const SMPTE_DISSOLVE: &'static str = "SMPTE_Dissolve";

    pub fn new(
        name: impl Into<String>,
        transition_type: impl Into<String>,
        in_offset: RationalTime,
        out_offset: RationalTime,
    ) -> Transition {
        Transition {
            handle: Composable::new_node(
                name.into(),
                NodeKind::Transition(TransitionData {
                    transition_type: transition_type.into(),
                    in_offset,
                    out_offset,
                }),
            ),
        }
    }

    /// A symmetric SMPTE dissolve reaching `offset` into each neighbor.
    pub fn dissolve(name: impl Into<String>, offset: RationalTime) -> Transition {
        Transition::new(name, Transition::SMPTE_DISSOLVE, offset, offset)
    }

    pub fn transition_type(&self) -> String {
        let node = self.handle.node.read();
        match &node.kind {
            NodeKind::Transition(d) => d.transition_type.clone(),
            _ => String::new(),
        }
    }

    pub fn in_offset(&self) -> RationalTime {
        let node = self.handle.node.read();
        match &node.kind {
            NodeKind::Transition(d) => d.in_offset,
            _ => RationalTime::zero(1.0),
        }
    }

    pub fn out_offset(&self) -> RationalTime {
        let node = self.handle.node.read();
        match &node.kind {
            NodeKind::Transition(d) => d.out_offset,
            _ => RationalTime::zero(1.0),
        }
    }

    pub fn set_offsets(&self, in_offset: RationalTime, out_offset: RationalTime) {
        let mut node = self.handle.node.write();
        if let NodeKind::Transition(d) = &mut node.kind {
            d.in_offset = in_offset;
            d.out_offset = out_offset;
        }
    }

    /// Total extent of the cross-fade, `in_offset + out_offset`.
    pub fn duration(&self) -> TimelineResult<RationalTime> {
        self.in_offset()
            .checked_add(self.out_offset())
            .map_err(TimelineError::Time)
    }
}
