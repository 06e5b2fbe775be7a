//! Normalizer: merge the two sub-records and canonicalize values.
//!
//! Every text value is rewritten to `"<number> <unit>"` when it contains an
//! unsigned decimal followed by a unit token, e.g. `"AP_WD =  3.18 mm"`
//! becomes `"3.18 mm"`. Anything else, including signed numbers,
//! thousands-separated numbers and scientific notation, is kept verbatim.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use super::record::{MetadataRecord, MetadataValue};

/// Number, optional whitespace, unit. The unit may contain the Greek mu (U+03BC).
static VALUE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d+(?:\.\d+)?)\s*([A-Za-zμ]+)").expect("value pattern should compile")
});

/// Canonical `"<number> <unit>"` form of `text`, or `None` when it does not
/// hold an unsigned number followed by a unit.
pub fn canonical_quantity(text: &str) -> Option<String> {
    let captures = VALUE_PATTERN.captures(text)?;
    let (number, unit) = (captures.get(1)?, captures.get(2)?);

    let preceding = text[..number.start()].chars().next_back();
    if matches!(preceding, Some('+' | '-' | '.' | ',')) || preceding.is_some_and(|c| c.is_ascii_digit()) {
        return None;
    }

    if is_exponent(text, number.end(), unit.start(), unit.as_str()) {
        return None;
    }

    Some(format!("{} {}", number.as_str(), unit.as_str()))
}

// `1e-5`, `2.5E3`: the "unit" is really an exponent marker
fn is_exponent(text: &str, number_end: usize, unit_start: usize, unit: &str) -> bool {
    if number_end != unit_start || !unit.starts_with(['e', 'E']) {
        return false;
    }
    text[unit_start + 1..]
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_digit() || c == '+' || c == '-')
}

/// Clean one value. Text is canonicalized when possible; every other value,
/// including the absence marker, is returned unchanged.
pub fn clean_value(value: &MetadataValue) -> MetadataValue {
    match value {
        MetadataValue::Text(text) => match canonical_quantity(text) {
            Some(cleaned) => MetadataValue::Text(cleaned),
            None => value.clone(),
        },
        other => other.clone(),
    }
}

/// Clean a whole record: absent keys are dropped, text values canonicalized.
pub fn clean_record(record: &MetadataRecord) -> MetadataRecord {
    let mut cleaned = MetadataRecord::new();
    let mut dropped = 0usize;

    for (key, value) in record {
        match value {
            MetadataValue::Absent => dropped += 1,
            MetadataValue::Text(text) => {
                let value = match canonical_quantity(text) {
                    Some(quantity) => MetadataValue::Text(quantity),
                    None => {
                        debug!(key = %key, value = %text, "Value is not a quantity, keeping it verbatim");
                        value.clone()
                    }
                };
                cleaned.insert(key.as_str(), value);
            }
            other => {
                cleaned.insert(key.as_str(), other.clone());
            }
        }
    }

    debug!(kept = cleaned.len(), dropped, "Cleaned record");
    cleaned
}

/// Merge the standard-tag record with the instrument record. Instrument
/// keys win on collision.
pub fn merge_records(standard: MetadataRecord, instrument: MetadataRecord) -> MetadataRecord {
    let mut merged = standard;
    merged.extend(instrument);
    merged
}
