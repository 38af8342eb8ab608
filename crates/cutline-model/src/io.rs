//! File and string entry points for timeline documents.

use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::error::{TimelineError, TimelineResult};
use crate::schema::{self, SchemaVersionMap};
use crate::timeline::Timeline;

/// Serialize to a pretty-printed document string at current schema
/// versions.
pub fn to_json_string(timeline: &Timeline) -> TimelineResult<String> {
    let document = schema::encode(timeline)?;
    serde_json::to_string_pretty(&document).map_err(TimelineError::Json)
}

/// Serialize with per-schema version overrides, see
/// [`schema::encode_with_versions`].
pub fn to_json_string_with_versions(
    timeline: &Timeline,
    overrides: &SchemaVersionMap,
) -> TimelineResult<String> {
    let document = schema::encode_with_versions(timeline, overrides)?;
    serde_json::to_string_pretty(&document).map_err(TimelineError::Json)
}

/// Parse a document string back into a timeline.
pub fn from_json_string(text: &str) -> TimelineResult<Timeline> {
    let document: serde_json::Value = serde_json::from_str(text)?;
    schema::decode(&document)
}

/// Write `timeline` to `path`. The document lands via a temp file and a
/// rename, so a crash mid-write never leaves a truncated file behind.
pub fn write_to_file(timeline: &Timeline, path: impl AsRef<Path>) -> TimelineResult<()> {
    let path = path.as_ref();
    let text = to_json_string(timeline)?;
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, &text)?;
    fs::rename(&tmp, path)?;
    info!(path = %path.display(), bytes = text.len(), "wrote timeline");
    Ok(())
}

pub fn read_from_file(path: impl AsRef<Path>) -> TimelineResult<Timeline> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)?;
    debug!(path = %path.display(), bytes = text.len(), "read timeline");
    from_json_string(&text)
}
