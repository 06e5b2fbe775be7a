//! Flat metadata records and their values.

use std::collections::btree_map;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::format::tiff::TagValue;

// =============================================================================
// MetadataValue
// =============================================================================

/// A single metadata value.
///
/// [`MetadataValue::Absent`] marks a key whose tag was not found in the
/// source. It is distinct from an empty string and serializes as JSON `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    /// The tag was not found in the source
    Absent,

    Text(String),

    Bool(bool),

    Integer(i64),

    /// Unsigned values that do not fit in `i64`
    Unsigned(u64),

    Float(f64),
}

impl MetadataValue {
    pub fn is_absent(&self) -> bool {
        matches!(self, MetadataValue::Absent)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            MetadataValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Value for the first element of a decoded tag, `Absent` when there is
    /// none.
    pub fn from_tag_values(values: &[TagValue]) -> Self {
        values.first().map(Self::from).unwrap_or(MetadataValue::Absent)
    }
}

impl From<&TagValue> for MetadataValue {
    fn from(value: &TagValue) -> Self {
        match value {
            TagValue::Unsigned(v) => match i64::try_from(*v) {
                Ok(v) => MetadataValue::Integer(v),
                Err(_) => MetadataValue::Unsigned(*v),
            },
            TagValue::Signed(v) => MetadataValue::Integer(*v),
            TagValue::Rational(num, den) => ratio(*num as f64, *den as f64, || format!("{num}/{den}")),
            TagValue::SRational(num, den) => ratio(*num as f64, *den as f64, || format!("{num}/{den}")),
            TagValue::Float(v) => float(*v),
            TagValue::Ascii(s) => MetadataValue::Text(s.clone()),
            TagValue::Undefined(bytes) => {
                let end = bytes.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
                MetadataValue::Text(String::from_utf8_lossy(&bytes[..end]).into_owned())
            }
        }
    }
}

fn ratio(num: f64, den: f64, as_text: impl FnOnce() -> String) -> MetadataValue {
    if den == 0.0 {
        MetadataValue::Text(as_text())
    } else {
        float(num / den)
    }
}

// JSON has no NaN or infinity
fn float(v: f64) -> MetadataValue {
    if v.is_finite() {
        MetadataValue::Float(v)
    } else {
        MetadataValue::Text(v.to_string())
    }
}

impl From<&str> for MetadataValue {
    fn from(s: &str) -> Self {
        MetadataValue::Text(s.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(s: String) -> Self {
        MetadataValue::Text(s)
    }
}

impl From<i64> for MetadataValue {
    fn from(v: i64) -> Self {
        MetadataValue::Integer(v)
    }
}

impl From<f64> for MetadataValue {
    fn from(v: f64) -> Self {
        float(v)
    }
}

impl From<bool> for MetadataValue {
    fn from(v: bool) -> Self {
        MetadataValue::Bool(v)
    }
}

// =============================================================================
// MetadataRecord
// =============================================================================

/// Key to value mapping, ordered by key so artifacts diff cleanly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetadataRecord {
    entries: BTreeMap<String, MetadataValue>,
}

impl MetadataRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, returning the one it replaced.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<MetadataValue>,
    ) -> Option<MetadataValue> {
        self.entries.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&MetadataValue> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<MetadataValue> {
        self.entries.remove(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, MetadataValue> {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of keys holding something other than the absence marker.
    pub fn present_count(&self) -> usize {
        self.entries.values().filter(|v| !v.is_absent()).count()
    }

    /// Compact single-line JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// JSON indented by two spaces.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

impl<K: Into<String>> FromIterator<(K, MetadataValue)> for MetadataRecord {
    fn from_iter<I: IntoIterator<Item = (K, MetadataValue)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

impl<K: Into<String>> Extend<(K, MetadataValue)> for MetadataRecord {
    fn extend<I: IntoIterator<Item = (K, MetadataValue)>>(&mut self, iter: I) {
        self.entries
            .extend(iter.into_iter().map(|(k, v)| (k.into(), v)));
    }
}

impl IntoIterator for MetadataRecord {
    type Item = (String, MetadataValue);
    type IntoIter = btree_map::IntoIter<String, MetadataValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a MetadataRecord {
    type Item = (&'a String, &'a MetadataValue);
    type IntoIter = btree_map::Iter<'a, String, MetadataValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
