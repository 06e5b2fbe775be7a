//! Standard-Tag Resolver.
//!
//! Cross-references the raw tags of an image against a [`TagRegistry`] and
//! produces a record with one key per registry name. Names whose id is not
//! in the image, or whose payload could not be decoded, map to
//! [`MetadataValue::Absent`].

use tracing::{debug, warn};

use crate::format::tiff::TagRegistry;
use crate::format::{RawTagMap, TagPayload};

use super::record::{MetadataRecord, MetadataValue};

/// Registry names that never appear in a resolved record.
///
/// `ColorMap` holds a palette table, not metadata.
pub const EXCLUDED_NAMES: &[&str] = &["ColorMap"];

/// Resolve every registry name against `tags`.
pub fn resolve_standard_tags(tags: &RawTagMap, registry: &TagRegistry) -> MetadataRecord {
    let mut record = MetadataRecord::new();

    for (name, id) in registry.entries() {
        if EXCLUDED_NAMES.contains(&name) {
            continue;
        }

        let value = match tags.get(id) {
            None => MetadataValue::Absent,
            Some(TagPayload::Values(values)) => MetadataValue::from_tag_values(values),
            Some(TagPayload::Undecodable(reason)) => {
                warn!(tag = name, id, %reason, "Tag could not be decoded, treating as absent");
                MetadataValue::Absent
            }
        };
        record.insert(name, value);
    }

    debug!(
        names = record.len(),
        found = record.present_count(),
        "Resolved standard tags"
    );
    record
}
