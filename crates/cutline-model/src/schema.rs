//! Schema-tagged document encoding and decoding.
//!
//! Every node serializes as a JSON object carrying a `"SCHEMA": "Name.v"`
//! tag. Encoding accepts a per-schema version map to down-convert documents
//! for older readers; each downgrade is an explicit field-dropping rule, not
//! reflection. Decoding dispatches on the tag and accepts every version an
//! encoder can produce.

use std::collections::BTreeMap;

use cutline_time::{RationalTime, TimeRange};
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::composable::{
    ClipData, Composable, GapData, ItemCore, NodeKind, StackData, TrackData, TransitionData,
};
use crate::composition::TrackKind;
use crate::effect::{Effect, EffectKind};
use crate::error::{TimelineError, TimelineResult};
use crate::marker::{Marker, MarkerColor};
use crate::metadata::Metadata;
use crate::reference::{
    GeneratorKind, ImageSequenceReference, MediaReference, MissingFramePolicy,
};
use crate::timeline::Timeline;

/// Key under which every serialized node stores its schema tag.
pub const SCHEMA_KEY: &str = "SCHEMA";

/// Per-schema maximum versions to apply on encode, e.g. `{"Clip": 1}`.
pub type SchemaVersionMap = BTreeMap<String, u32>;

fn malformed(reason: impl Into<String>) -> TimelineError {
    TimelineError::MalformedDocument {
        reason: reason.into(),
    }
}

fn requested_version(
    overrides: &SchemaVersionMap,
    name: &str,
    current: u32,
    supported_downgrades: &[u32],
) -> TimelineResult<u32> {
    match overrides.get(name) {
        None => Ok(current),
        Some(&v) if v == current || supported_downgrades.contains(&v) => Ok(v),
        Some(&v) => Err(TimelineError::UnknownSchema {
            schema: format!("{name}.{v}"),
        }),
    }
}

// ---- encode ----------------------------------------------------------

fn encode_time(t: RationalTime) -> Value {
    json!({ "SCHEMA": "RationalTime.1", "value": t.value, "rate": t.rate })
}

fn encode_opt_time(t: Option<RationalTime>) -> Value {
    t.map(encode_time).unwrap_or(Value::Null)
}

fn encode_range(r: TimeRange) -> Value {
    json!({
        "SCHEMA": "TimeRange.1",
        "start_time": encode_time(r.start_time),
        "duration": encode_time(r.duration),
    })
}

fn encode_opt_range(r: Option<TimeRange>) -> Value {
    r.map(encode_range).unwrap_or(Value::Null)
}

fn encode_metadata(metadata: &Metadata) -> TimelineResult<Value> {
    serde_json::to_value(metadata).map_err(TimelineError::Json)
}

fn encode_marker(marker: &Marker, overrides: &SchemaVersionMap) -> TimelineResult<Value> {
    let version = requested_version(overrides, "Marker", 2, &[1])?;
    let mut map = Map::new();
    map.insert(SCHEMA_KEY.into(), json!(format!("Marker.{version}")));
    map.insert("name".into(), json!(marker.name));
    map.insert("color".into(), json!(marker.color.as_str()));
    map.insert("marked_range".into(), encode_range(marker.marked_range));
    if version >= 2 {
        map.insert("comment".into(), json!(marker.comment));
    }
    map.insert("metadata".into(), encode_metadata(&marker.metadata)?);
    Ok(Value::Object(map))
}

fn encode_effect(effect: &Effect) -> TimelineResult<Value> {
    let metadata = encode_metadata(&effect.metadata)?;
    Ok(match &effect.kind {
        EffectKind::Custom { effect_name } => json!({
            "SCHEMA": "Effect.1",
            "name": effect.name,
            "effect_name": effect_name,
            "metadata": metadata,
        }),
        EffectKind::LinearTimeWarp { time_scalar } => json!({
            "SCHEMA": "LinearTimeWarp.1",
            "name": effect.name,
            "time_scalar": time_scalar,
            "metadata": metadata,
        }),
        EffectKind::FreezeFrame => json!({
            "SCHEMA": "FreezeFrame.1",
            "name": effect.name,
            "metadata": metadata,
        }),
    })
}

fn encode_reference(reference: &MediaReference) -> TimelineResult<Value> {
    Ok(match reference {
        MediaReference::External {
            target_url,
            available_range,
            metadata,
        } => json!({
            "SCHEMA": "ExternalReference.1",
            "target_url": target_url,
            "available_range": encode_opt_range(*available_range),
            "metadata": encode_metadata(metadata)?,
        }),
        MediaReference::Missing => json!({ "SCHEMA": "MissingReference.1" }),
        MediaReference::Generator {
            generator_kind,
            available_range,
            metadata,
        } => json!({
            "SCHEMA": "GeneratorReference.1",
            "generator_kind": generator_kind.as_str(),
            "available_range": encode_opt_range(*available_range),
            "metadata": encode_metadata(metadata)?,
        }),
        MediaReference::ImageSequence(seq) => json!({
            "SCHEMA": "ImageSequenceReference.1",
            "target_url_base": seq.target_url_base,
            "name_prefix": seq.name_prefix,
            "name_suffix": seq.name_suffix,
            "start_frame": seq.start_frame,
            "frame_step": seq.frame_step,
            "rate": seq.rate,
            "frame_zero_padding": seq.frame_zero_padding,
            "missing_frame_policy": seq.missing_frame_policy.as_str(),
            "available_range": encode_opt_range(seq.available_range),
            "metadata": encode_metadata(&seq.metadata)?,
        }),
    })
}

fn encode_markers(markers: &[Marker], overrides: &SchemaVersionMap) -> TimelineResult<Value> {
    let encoded: Vec<Value> = markers
        .iter()
        .map(|m| encode_marker(m, overrides))
        .collect::<TimelineResult<_>>()?;
    Ok(Value::Array(encoded))
}

fn encode_effects(effects: &[Effect]) -> TimelineResult<Value> {
    let encoded: Vec<Value> = effects
        .iter()
        .map(encode_effect)
        .collect::<TimelineResult<_>>()?;
    Ok(Value::Array(encoded))
}

fn encode_composable(
    composable: &Composable,
    overrides: &SchemaVersionMap,
) -> TimelineResult<Value> {
    let node = composable.node.read();
    let name = node.name.clone();
    let metadata = encode_metadata(&node.metadata)?;
    match &node.kind {
        NodeKind::Clip(d) => {
            let version = requested_version(overrides, "Clip", 2, &[1])?;
            let mut map = Map::new();
            map.insert(SCHEMA_KEY.into(), json!(format!("Clip.{version}")));
            map.insert("name".into(), json!(name));
            map.insert("metadata".into(), metadata);
            map.insert("source_range".into(), encode_opt_range(d.core.source_range));
            if version >= 2 {
                let mut refs = Map::new();
                for (key, reference) in &d.references {
                    refs.insert(key.clone(), encode_reference(reference)?);
                }
                map.insert("media_references".into(), Value::Object(refs));
                map.insert(
                    "active_media_reference_key".into(),
                    json!(d.active_reference_key),
                );
            } else {
                // v1 clips know a single reference: collapse to the active one
                let active = d.references.get(&d.active_reference_key);
                map.insert(
                    "media_reference".into(),
                    match active {
                        Some(reference) => encode_reference(reference)?,
                        None => Value::Null,
                    },
                );
            }
            map.insert("markers".into(), encode_markers(&d.core.markers, overrides)?);
            map.insert("effects".into(), encode_effects(&d.core.effects)?);
            Ok(Value::Object(map))
        }
        NodeKind::Gap(d) => Ok(json!({
            "SCHEMA": "Gap.1",
            "name": name,
            "metadata": metadata,
            "source_range": encode_opt_range(d.core.source_range),
            "markers": encode_markers(&d.core.markers, overrides)?,
            "effects": encode_effects(&d.core.effects)?,
        })),
        NodeKind::Transition(d) => Ok(json!({
            "SCHEMA": "Transition.1",
            "name": name,
            "metadata": metadata,
            "transition_type": d.transition_type,
            "in_offset": encode_time(d.in_offset),
            "out_offset": encode_time(d.out_offset),
        })),
        NodeKind::Track(d) => {
            let encoded: Vec<Value> = d
                .children
                .iter()
                .map(|c| encode_composable(c, overrides))
                .collect::<TimelineResult<_>>()?;
            Ok(json!({
                "SCHEMA": "Track.1",
                "name": name,
                "metadata": metadata,
                "kind": d.kind.as_str(),
                "source_range": encode_opt_range(d.core.source_range),
                "markers": encode_markers(&d.core.markers, overrides)?,
                "effects": encode_effects(&d.core.effects)?,
                "children": encoded,
            }))
        }
        NodeKind::Stack(d) => {
            let encoded: Vec<Value> = d
                .children
                .iter()
                .map(|c| encode_composable(c, overrides))
                .collect::<TimelineResult<_>>()?;
            Ok(json!({
                "SCHEMA": "Stack.1",
                "name": name,
                "metadata": metadata,
                "source_range": encode_opt_range(d.core.source_range),
                "markers": encode_markers(&d.core.markers, overrides)?,
                "effects": encode_effects(&d.core.effects)?,
                "children": encoded,
            }))
        }
    }
}

/// Encode `timeline` at current schema versions.
pub fn encode(timeline: &Timeline) -> TimelineResult<Value> {
    encode_with_versions(timeline, &SchemaVersionMap::new())
}

/// Encode `timeline`, down-converting any schema named in `overrides`.
pub fn encode_with_versions(
    timeline: &Timeline,
    overrides: &SchemaVersionMap,
) -> TimelineResult<Value> {
    requested_version(overrides, "Timeline", 1, &[])?;
    let tracks = encode_composable(&timeline.tracks().as_composable(), overrides)?;
    debug!(timeline = %timeline.name(), "encoded document");
    Ok(json!({
        "SCHEMA": "Timeline.1",
        "name": timeline.name(),
        "metadata": serde_json::to_value(timeline.metadata())?,
        "global_start_time": encode_opt_time(timeline.global_start_time()),
        "tracks": tracks,
    }))
}

// ---- decode ----------------------------------------------------------

fn as_object(value: &Value) -> TimelineResult<&Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| malformed("expected a JSON object"))
}

fn schema_tag(map: &Map<String, Value>) -> TimelineResult<(String, u32)> {
    let tag = map
        .get(SCHEMA_KEY)
        .and_then(Value::as_str)
        .ok_or_else(|| malformed("missing schema tag"))?;
    let (name, version) = tag
        .rsplit_once('.')
        .ok_or_else(|| malformed(format!("schema tag '{tag}' is not Name.version")))?;
    let version = version
        .parse()
        .map_err(|_| malformed(format!("schema tag '{tag}' has a non-numeric version")))?;
    Ok((name.to_owned(), version))
}

fn str_field(map: &Map<String, Value>, key: &str) -> TimelineResult<String> {
    map.get(key)
        .and_then(Value::as_str)
        .map(str::to_owned)
        .ok_or_else(|| malformed(format!("missing string field '{key}'")))
}

fn f64_field(map: &Map<String, Value>, key: &str) -> TimelineResult<f64> {
    map.get(key)
        .and_then(Value::as_f64)
        .ok_or_else(|| malformed(format!("missing numeric field '{key}'")))
}

fn i64_field(map: &Map<String, Value>, key: &str) -> TimelineResult<i64> {
    map.get(key)
        .and_then(Value::as_i64)
        .ok_or_else(|| malformed(format!("missing integer field '{key}'")))
}

fn decode_metadata(map: &Map<String, Value>) -> TimelineResult<Metadata> {
    match map.get("metadata") {
        None | Some(Value::Null) => Ok(Metadata::new()),
        Some(value) => serde_json::from_value(value.clone()).map_err(TimelineError::Json),
    }
}

fn decode_time(value: &Value) -> TimelineResult<RationalTime> {
    let map = as_object(value)?;
    let (name, version) = schema_tag(map)?;
    if name != "RationalTime" || version != 1 {
        return Err(TimelineError::UnknownSchema {
            schema: format!("{name}.{version}"),
        });
    }
    Ok(RationalTime::new(
        f64_field(map, "value")?,
        f64_field(map, "rate")?,
    ))
}

fn decode_opt_time(value: Option<&Value>) -> TimelineResult<Option<RationalTime>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(v) => decode_time(v).map(Some),
    }
}

fn decode_range(value: &Value) -> TimelineResult<TimeRange> {
    let map = as_object(value)?;
    let (name, version) = schema_tag(map)?;
    if name != "TimeRange" || version != 1 {
        return Err(TimelineError::UnknownSchema {
            schema: format!("{name}.{version}"),
        });
    }
    let start_time = decode_time(
        map.get("start_time")
            .ok_or_else(|| malformed("time range missing 'start_time'"))?,
    )?;
    let duration = decode_time(
        map.get("duration")
            .ok_or_else(|| malformed("time range missing 'duration'"))?,
    )?;
    Ok(TimeRange::new(start_time, duration))
}

fn decode_opt_range(value: Option<&Value>) -> TimelineResult<Option<TimeRange>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(v) => decode_range(v).map(Some),
    }
}

fn decode_marker(value: &Value) -> TimelineResult<Marker> {
    let map = as_object(value)?;
    let (name, version) = schema_tag(map)?;
    if name != "Marker" || !(1..=2).contains(&version) {
        return Err(TimelineError::UnknownSchema {
            schema: format!("{name}.{version}"),
        });
    }
    let color_name = str_field(map, "color")?;
    let color = MarkerColor::from_str_loose(&color_name)
        .ok_or_else(|| malformed(format!("unknown marker color '{color_name}'")))?;
    let marked_range = decode_range(
        map.get("marked_range")
            .ok_or_else(|| malformed("marker missing 'marked_range'"))?,
    )?;
    // v1 markers predate the comment field
    let comment = if version >= 2 {
        map.get("comment")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned()
    } else {
        String::new()
    };
    Ok(Marker {
        name: str_field(map, "name")?,
        color,
        marked_range,
        comment,
        metadata: decode_metadata(map)?,
    })
}

fn decode_effect(value: &Value) -> TimelineResult<Effect> {
    let map = as_object(value)?;
    let (name, version) = schema_tag(map)?;
    let kind = match (name.as_str(), version) {
        ("Effect", 1) => EffectKind::Custom {
            effect_name: str_field(map, "effect_name")?,
        },
        ("LinearTimeWarp", 1) => EffectKind::LinearTimeWarp {
            time_scalar: f64_field(map, "time_scalar")?,
        },
        ("FreezeFrame", 1) => EffectKind::FreezeFrame,
        _ => {
            return Err(TimelineError::UnknownSchema {
                schema: format!("{name}.{version}"),
            })
        }
    };
    Ok(Effect {
        name: str_field(map, "name")?,
        kind,
        metadata: decode_metadata(map)?,
    })
}

fn decode_reference(value: &Value) -> TimelineResult<MediaReference> {
    let map = as_object(value)?;
    let (name, version) = schema_tag(map)?;
    match (name.as_str(), version) {
        ("ExternalReference", 1) => Ok(MediaReference::External {
            target_url: str_field(map, "target_url")?,
            available_range: decode_opt_range(map.get("available_range"))?,
            metadata: decode_metadata(map)?,
        }),
        ("MissingReference", 1) => Ok(MediaReference::Missing),
        ("GeneratorReference", 1) => Ok(MediaReference::Generator {
            generator_kind: GeneratorKind::from_name(&str_field(map, "generator_kind")?),
            available_range: decode_opt_range(map.get("available_range"))?,
            metadata: decode_metadata(map)?,
        }),
        ("ImageSequenceReference", 1) => {
            let policy_name = str_field(map, "missing_frame_policy")?;
            let missing_frame_policy = MissingFramePolicy::from_str_loose(&policy_name)
                .ok_or_else(|| malformed(format!("unknown frame policy '{policy_name}'")))?;
            Ok(MediaReference::ImageSequence(ImageSequenceReference {
                target_url_base: str_field(map, "target_url_base")?,
                name_prefix: str_field(map, "name_prefix")?,
                name_suffix: str_field(map, "name_suffix")?,
                start_frame: i64_field(map, "start_frame")?,
                frame_step: i64_field(map, "frame_step")?,
                rate: f64_field(map, "rate")?,
                frame_zero_padding: i64_field(map, "frame_zero_padding")? as u32,
                missing_frame_policy,
                available_range: decode_opt_range(map.get("available_range"))?,
                metadata: decode_metadata(map)?,
            }))
        }
        _ => Err(TimelineError::UnknownSchema {
            schema: format!("{name}.{version}"),
        }),
    }
}

fn decode_markers(map: &Map<String, Value>) -> TimelineResult<Vec<Marker>> {
    match map.get("markers") {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items.iter().map(decode_marker).collect(),
        Some(_) => Err(malformed("'markers' must be an array")),
    }
}

fn decode_effects(map: &Map<String, Value>) -> TimelineResult<Vec<Effect>> {
    match map.get("effects") {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items.iter().map(decode_effect).collect(),
        Some(_) => Err(malformed("'effects' must be an array")),
    }
}

fn decode_item_core(map: &Map<String, Value>) -> TimelineResult<ItemCore> {
    Ok(ItemCore {
        source_range: decode_opt_range(map.get("source_range"))?,
        markers: decode_markers(map)?,
        effects: decode_effects(map)?,
    })
}

fn decode_children(map: &Map<String, Value>) -> TimelineResult<Vec<Composable>> {
    match map.get("children") {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items.iter().map(decode_composable).collect(),
        Some(_) => Err(malformed("'children' must be an array")),
    }
}

fn attach_decoded(container: Composable, children: Vec<Composable>) -> TimelineResult<Composable> {
    for (i, child) in children.into_iter().enumerate() {
        crate::composable::attach_child(&container, &child, i)?;
    }
    Ok(container)
}

fn decode_composable(value: &Value) -> TimelineResult<Composable> {
    let map = as_object(value)?;
    let (schema_name, version) = schema_tag(map)?;
    let name = str_field(map, "name").unwrap_or_default();
    match (schema_name.as_str(), version) {
        ("Clip", 1 | 2) => {
            let core = decode_item_core(map)?;
            let mut references = BTreeMap::new();
            let mut active_reference_key = crate::reference::DEFAULT_MEDIA_KEY.to_owned();
            if version >= 2 {
                let refs = map
                    .get("media_references")
                    .and_then(Value::as_object)
                    .ok_or_else(|| malformed("clip missing 'media_references'"))?;
                for (key, reference) in refs {
                    references.insert(key.clone(), decode_reference(reference)?);
                }
                active_reference_key = str_field(map, "active_media_reference_key")?;
                if !references.is_empty() && !references.contains_key(&active_reference_key) {
                    return Err(malformed(format!(
                        "active reference key '{active_reference_key}' not in reference map"
                    )));
                }
            } else {
                match map.get("media_reference") {
                    None | Some(Value::Null) => {}
                    Some(reference) => {
                        references
                            .insert(active_reference_key.clone(), decode_reference(reference)?);
                    }
                }
            }
            let node = Composable::new_node(
                name,
                NodeKind::Clip(ClipData {
                    core,
                    references,
                    active_reference_key,
                }),
            );
            node.set_metadata(decode_metadata(map)?);
            Ok(node)
        }
        ("Gap", 1) => {
            let core = decode_item_core(map)?;
            if core.source_range.is_none() {
                return Err(malformed("gap missing 'source_range'"));
            }
            let node = Composable::new_node(name, NodeKind::Gap(GapData { core }));
            node.set_metadata(decode_metadata(map)?);
            Ok(node)
        }
        ("Transition", 1) => {
            let node = Composable::new_node(
                name,
                NodeKind::Transition(TransitionData {
                    transition_type: str_field(map, "transition_type")?,
                    in_offset: decode_time(
                        map.get("in_offset")
                            .ok_or_else(|| malformed("transition missing 'in_offset'"))?,
                    )?,
                    out_offset: decode_time(
                        map.get("out_offset")
                            .ok_or_else(|| malformed("transition missing 'out_offset'"))?,
                    )?,
                }),
            );
            node.set_metadata(decode_metadata(map)?);
            Ok(node)
        }
        ("Track", 1) => {
            let node = Composable::new_node(
                name,
                NodeKind::Track(TrackData {
                    core: decode_item_core(map)?,
                    kind: TrackKind::from_name(&str_field(map, "kind")?),
                    children: Vec::new(),
                }),
            );
            node.set_metadata(decode_metadata(map)?);
            attach_decoded(node, decode_children(map)?)
        }
        ("Stack", 1) => {
            let node = Composable::new_node(
                name,
                NodeKind::Stack(StackData {
                    core: decode_item_core(map)?,
                    children: Vec::new(),
                }),
            );
            node.set_metadata(decode_metadata(map)?);
            attach_decoded(node, decode_children(map)?)
        }
        _ => Err(TimelineError::UnknownSchema {
            schema: format!("{schema_name}.{version}"),
        }),
    }
}

/// Reconstruct a timeline from a document produced by [`encode`].
pub fn decode(document: &Value) -> TimelineResult<Timeline> {
    let map = as_object(document)?;
    let (name, version) = schema_tag(map)?;
    if name != "Timeline" || version != 1 {
        return Err(TimelineError::UnknownSchema {
            schema: format!("{name}.{version}"),
        });
    }
    let tracks_value = map
        .get("tracks")
        .ok_or_else(|| malformed("timeline missing 'tracks'"))?;
    let tracks = decode_composable(tracks_value)?
        .as_stack()
        .ok_or_else(|| malformed("timeline 'tracks' is not a stack"))?;
    let timeline = Timeline::from_parts(
        str_field(map, "name")?,
        decode_opt_time(map.get("global_start_time"))?,
        decode_metadata(map)?,
        tracks,
    );
    debug!(timeline = %timeline.name(), "decoded document");
    Ok(timeline)
}
