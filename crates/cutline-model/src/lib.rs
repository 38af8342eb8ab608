//! In-memory editorial timeline composition model.
//!
//! A timeline is a tree: a root [`Timeline`] owns a [`Stack`] of [`Track`]s,
//! and tracks hold [`Clip`]s, [`Gap`]s, nested compositions, and
//! [`Transition`]s. Nodes are reference counted, so a handle handed to a
//! caller stays valid even after the node is detached from the tree. On top
//! of the tree sit rational-time coordinate transforms, a family of atomic
//! non-destructive edit operations, and schema-versioned JSON serialization.
//!
//! ```
//! use cutline_model::{Clip, MediaReference, RationalTime, TimeRange, Timeline};
//!
//! # fn main() -> cutline_model::TimelineResult<()> {
//! let timeline = Timeline::new("cut");
//! let track = timeline.add_video_track("V1")?;
//! let clip = Clip::with_reference(
//!     "shot",
//!     MediaReference::external(
//!         "file:///media/shot.mov",
//!         Some(TimeRange::new(
//!             RationalTime::zero(24.0),
//!             RationalTime::new(48.0, 24.0),
//!         )),
//!     ),
//! );
//! track.append_child(clip)?;
//! assert_eq!(timeline.duration()?, RationalTime::new(48.0, 24.0));
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod composable;
pub mod composition;
pub mod edit;
pub mod effect;
pub mod error;
pub mod io;
pub mod items;
pub mod marker;
pub mod metadata;
pub mod reference;
pub mod schema;
pub mod search;
pub mod timeline;
pub mod transform;

pub use builder::{ClipBuilder, TimelineBuilder};
pub use composable::{Composable, ComposableKind};
pub use composition::{Stack, Track, TrackKind};
pub use effect::{Effect, EffectKind};
pub use error::{TimelineError, TimelineResult};
pub use items::{Clip, Gap, Transition};
pub use marker::{Marker, MarkerColor};
pub use metadata::{Metadata, MetadataValue};
pub use reference::{
    GeneratorKind, ImageSequenceReference, MediaReference, MissingFramePolicy, DEFAULT_MEDIA_KEY,
};
pub use schema::{SchemaVersionMap, SCHEMA_KEY};
pub use search::SearchResults;
pub use timeline::Timeline;

pub use cutline_time::{RationalTime, TimeError, TimeRange};
