use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::hash::{Hash, Hasher};
use tracing::warn;

/// Structured cache key: a resource name followed by parameters.
///
/// Parameters are stored as JSON values. Maps serialize with sorted keys, so
/// two structurally equal parameter objects always give the same key.
#[derive(Debug, Clone)]
pub struct QueryKey {
    segments: Vec<Value>,
    canonical: String,
}

impl QueryKey {
    pub fn new(resource: &str) -> Self {
        Self::from_segments(vec![Value::String(resource.to_string())])
    }

    /// Append one parameter segment
    pub fn with<T: Serialize>(self, part: T) -> Self {
        let value = serde_json::to_value(part).unwrap_or_else(|e| {
            warn!("Query key segment failed to serialize: {}", e);
            Value::Null
        });
        let mut segments = self.segments;
        segments.push(value);
        Self::from_segments(segments)
    }

    fn from_segments(segments: Vec<Value>) -> Self {
        let canonical = Value::Array(segments.clone()).to_string();
        Self {
            segments,
            canonical,
        }
    }

    /// Segment-wise prefix test used by invalidation
    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        prefix.segments.len() <= self.segments.len()
            && prefix
                .segments
                .iter()
                .zip(&self.segments)
                .all(|(a, b)| a == b)
    }

    pub fn resource(&self) -> &str {
        self.segments
            .first()
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    pub fn canonical(&self) -> &str {
        &self.canonical
    }
}

impl PartialEq for QueryKey {
    fn eq(&self, other: &Self) -> bool {
        self.canonical == other.canonical
    }
}

impl Eq for QueryKey {}

impl Hash for QueryKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical.hash(state);
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical)
    }
}
