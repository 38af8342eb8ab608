//! Fluent construction helpers for common tree shapes.

use cutline_time::{RationalTime, TimeRange};

use crate::composition::Track;
use crate::effect::Effect;
use crate::error::TimelineResult;
use crate::items::Clip;
use crate::marker::Marker;
use crate::metadata::{Metadata, MetadataValue};
use crate::reference::MediaReference;
use crate::timeline::Timeline;

/// Builds a [`Clip`] with its trim, media, and annotations in one
/// expression.
#[derive(Debug, Default)]
pub struct ClipBuilder {
    name: String,
    source_range: Option<TimeRange>,
    reference: Option<MediaReference>,
    markers: Vec<Marker>,
    effects: Vec<Effect>,
    metadata: Metadata,
}

impl ClipBuilder {
    pub fn new(name: impl Into<String>) -> ClipBuilder {
        ClipBuilder {
            name: name.into(),
            ..ClipBuilder::default()
        }
    }

    pub fn source_range(mut self, range: TimeRange) -> ClipBuilder {
        self.source_range = Some(range);
        self
    }

    pub fn reference(mut self, reference: MediaReference) -> ClipBuilder {
        self.reference = Some(reference);
        self
    }

    /// Shorthand for an external reference.
    pub fn media(
        self,
        target_url: impl Into<String>,
        available_range: Option<TimeRange>,
    ) -> ClipBuilder {
        self.reference(MediaReference::external(target_url, available_range))
    }

    pub fn marker(mut self, marker: Marker) -> ClipBuilder {
        self.markers.push(marker);
        self
    }

    pub fn effect(mut self, effect: Effect) -> ClipBuilder {
        self.effects.push(effect);
        self
    }

    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<MetadataValue>) -> ClipBuilder {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn build(self) -> Clip {
        let clip = Clip::new(self.name);
        if let Some(reference) = self.reference {
            clip.set_media_reference(reference);
        }
        clip.set_source_range(self.source_range);
        clip.set_markers(self.markers);
        clip.set_effects(self.effects);
        clip.as_composable().set_metadata(self.metadata);
        clip
    }
}

/// Builds a [`Timeline`] from tracks declared in order.
#[derive(Debug)]
pub struct TimelineBuilder {
    name: String,
    global_start_time: Option<RationalTime>,
    metadata: Metadata,
    tracks: Vec<Track>,
}

impl TimelineBuilder {
    pub fn new(name: impl Into<String>) -> TimelineBuilder {
        TimelineBuilder {
            name: name.into(),
            global_start_time: None,
            metadata: Metadata::new(),
            tracks: Vec::new(),
        }
    }

    pub fn global_start_time(mut self, time: RationalTime) -> TimelineBuilder {
        self.global_start_time = Some(time);
        self
    }

    pub fn metadata(
        mut self,
        key: impl Into<String>,
        value: impl Into<MetadataValue>,
    ) -> TimelineBuilder {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn track(mut self, track: Track) -> TimelineBuilder {
        self.tracks.push(track);
        self
    }

    /// Fails if any declared track is already attached elsewhere.
    pub fn build(self) -> TimelineResult<Timeline> {
        let mut timeline = Timeline::new(self.name);
        timeline.set_global_start_time(self.global_start_time);
        *timeline.metadata_mut() = self.metadata;
        for track in self.tracks {
            timeline.add_track(track)?;
        }
        Ok(timeline)
    }
}
