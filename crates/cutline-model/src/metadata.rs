//! Schemaless metadata attached to composables and media references.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A sorted string-keyed metadata dictionary.
///
/// Sorted keys keep serialized documents deterministic, which matters for
/// diffing interchange files.
pub type Metadata = BTreeMap<String, MetadataValue>;

/// A metadata value: a scalar or a nested dictionary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Bool(bool),
    Number(f64),
    String(String),
    Map(Metadata),
}

impl From<bool> for MetadataValue {
    fn from(v: bool) -> Self {
        MetadataValue::Bool(v)
    }
}

impl From<f64> for MetadataValue {
    fn from(v: f64) -> Self {
        MetadataValue::Number(v)
    }
}

impl From<i64> for MetadataValue {
    fn from(v: i64) -> Self {
        MetadataValue::Number(v as f64)
    }
}

impl From<&str> for MetadataValue {
    fn from(v: &str) -> Self {
        MetadataValue::String(v.to_owned())
    }
}

impl From<String> for MetadataValue {
    fn from(v: String) -> Self {
        MetadataValue::String(v)
    }
}

impl From<Metadata> for MetadataValue {
    fn from(v: Metadata) -> Self {
        MetadataValue::Map(v)
    }
}
