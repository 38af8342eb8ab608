//! The timeline root: one stack of tracks plus document-level fields.

use cutline_time::RationalTime;

use crate::composition::{Stack, Track, TrackKind};
use crate::error::TimelineResult;
use crate::items::Clip;
use crate::metadata::{Metadata, MetadataValue};
use crate::search::SearchResults;

/// Root of a composition document.
#[derive(Debug)]
pub struct Timeline {
    name: String,
    global_start_time: Option<RationalTime>,
    metadata: Metadata,
    tracks: Stack,
}

impl Timeline {
    pub fn new(name: impl Into<String>) -> Timeline {
        Timeline {
            name: name.into(),
            global_start_time: None,
            metadata: Metadata::new(),
            tracks: Stack::new("tracks"),
        }
    }

    pub(crate) fn from_parts(
        name: String,
        global_start_time: Option<RationalTime>,
        metadata: Metadata,
        tracks: Stack,
    ) -> Timeline {
        Timeline {
            name,
            global_start_time,
            metadata,
            tracks,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn global_start_time(&self) -> Option<RationalTime> {
        self.global_start_time
    }

    pub fn set_global_start_time(&mut self, time: Option<RationalTime>) {
        self.global_start_time = time;
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.metadata
    }

    pub fn insert_metadata(&mut self, key: impl Into<String>, value: impl Into<MetadataValue>) {
        self.metadata.insert(key.into(), value.into());
    }

    /// Handle to the root stack holding this timeline's tracks.
    pub fn tracks(&self) -> Stack {
        self.tracks.clone()
    }

    pub fn add_track(&self, track: Track) -> TimelineResult<()> {
        self.tracks.append_child(track)
    }

    /// Append a fresh video track and return its handle.
    pub fn add_video_track(&self, name: impl Into<String>) -> TimelineResult<Track> {
        let track = Track::video(name);
        self.tracks.append_child(track.clone())?;
        Ok(track)
    }

    pub fn add_audio_track(&self, name: impl Into<String>) -> TimelineResult<Track> {
        let track = Track::audio(name);
        self.tracks.append_child(track.clone())?;
        Ok(track)
    }

    pub fn video_tracks(&self) -> Vec<Track> {
        self.tracks
            .tracks()
            .into_iter()
            .filter(|t| t.track_kind() == TrackKind::Video)
            .collect()
    }

    pub fn audio_tracks(&self) -> Vec<Track> {
        self.tracks
            .tracks()
            .into_iter()
            .filter(|t| t.track_kind() == TrackKind::Audio)
            .collect()
    }

    /// Longest track's trimmed duration.
    pub fn duration(&self) -> TimelineResult<RationalTime> {
        self.tracks.duration()
    }

    /// All clips in the timeline, depth first across tracks.
    pub fn find_clips(&self) -> SearchResults<Clip> {
        self.tracks.find_clips()
    }

    /// All tracks in the timeline, including tracks inside nested stacks.
    pub fn find_tracks(&self) -> SearchResults<Track> {
        self.tracks.find_tracks()
    }

    /// Structural equality of two timelines, ignoring node identity.
    pub fn content_eq(&self, other: &Timeline) -> bool {
        self.name == other.name
            && self.global_start_time == other.global_start_time
            && self.metadata == other.metadata
            && self
                .tracks
                .as_composable()
                .content_eq(&other.tracks.as_composable())
    }
}
