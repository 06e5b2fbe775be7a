//! Instrument-Block Parser.
//!
//! SEM vendors store their instrument state as one text payload under a
//! private tag. The payload is CRLF-delimited: a fixed-size header of
//! boilerplate lines, then alternating key and value lines.
//!
//! ```text
//! <35 header lines>
//! AP_WD
//! WD = 3.18 mm
//! AP_BEAM_TIME
//! Beam Time = 1 s
//! ```
//!
//! The parser never fails a run. A missing tag is an empty record, and a
//! malformed payload is logged and also yields an empty record.

use tracing::{debug, warn};

use crate::error::InstrumentError;
use crate::format::tiff::{TagValue, TiffTag};
use crate::format::{RawTagMap, TagPayload};

use super::record::{MetadataRecord, MetadataValue};

/// Tag holding the instrument block.
pub const INSTRUMENT_TAG: u16 = TiffTag::InstrumentBlock.as_u16();

/// Boilerplate lines at the start of the block that carry no pairs.
pub const HEADER_LINES: usize = 35;

/// Line separator inside the block.
pub const LINE_SEPARATOR: &str = "\r\n";

// =============================================================================
// Pairing
// =============================================================================

/// Result of pairing a line sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pairing<'a> {
    /// `(key, value)` in input order
    pub pairs: Vec<(&'a str, &'a str)>,

    /// Trailing key with no value line, dropped from `pairs`
    pub unpaired: Option<&'a str>,
}

/// Pair lines as key, value, key, value, ...
///
/// Even positions are keys, odd positions their values. With an odd number
/// of lines the last key has no value and is returned in `unpaired`.
pub fn pair_alternating<'a>(lines: &[&'a str]) -> Pairing<'a> {
    let mut chunks = lines.chunks_exact(2);
    let pairs = chunks.by_ref().map(|pair| (pair[0], pair[1])).collect();
    let unpaired = chunks.remainder().first().copied();
    Pairing { pairs, unpaired }
}

// =============================================================================
// InstrumentBlockParser
// =============================================================================

/// Extracts key/value pairs from the instrument block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstrumentBlockParser {
    tag_id: u16,
    header_lines: usize,
}

impl Default for InstrumentBlockParser {
    fn default() -> Self {
        Self {
            tag_id: INSTRUMENT_TAG,
            header_lines: HEADER_LINES,
        }
    }
}

impl InstrumentBlockParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the number of header lines skipped.
    pub fn with_header_lines(mut self, header_lines: usize) -> Self {
        self.header_lines = header_lines;
        self
    }

    pub fn tag_id(&self) -> u16 {
        self.tag_id
    }

    pub fn header_lines(&self) -> usize {
        self.header_lines
    }

    /// Parse the block, degrading any failure to an empty record.
    pub fn parse(&self, tags: &RawTagMap) -> MetadataRecord {
        match self.try_parse(tags) {
            Ok(record) => record,
            Err(e) => {
                warn!(tag = self.tag_id, error = %e, "Ignoring malformed instrument block");
                MetadataRecord::new()
            }
        }
    }

    /// Parse the block.
    ///
    /// A missing tag is not an error and yields an empty record.
    pub fn try_parse(&self, tags: &RawTagMap) -> Result<MetadataRecord, InstrumentError> {
        let Some(payload) = tags.get(self.tag_id) else {
            debug!(tag = self.tag_id, "No instrument block");
            return Ok(MetadataRecord::new());
        };

        let text = block_text(payload)?;
        Ok(self.parse_text(text))
    }

    /// Parse the decoded text of a block.
    pub fn parse_text(&self, text: &str) -> MetadataRecord {
        let lines: Vec<&str> = text.split(LINE_SEPARATOR).skip(self.header_lines).collect();
        let pairing = pair_alternating(&lines);

        if let Some(key) = pairing.unpaired {
            warn!(key, "Instrument block ends with a key that has no value, dropping it");
        }

        let mut record = MetadataRecord::new();
        for (key, value) in pairing.pairs {
            if let Some(previous) = record.insert(key, MetadataValue::Text(value.to_string())) {
                debug!(key, ?previous, "Duplicate instrument key, keeping the later value");
            }
        }

        debug!(pairs = record.len(), "Parsed instrument block");
        record
    }
}

fn block_text(payload: &TagPayload) -> Result<&str, InstrumentError> {
    let values = match payload {
        TagPayload::Values(values) => values,
        TagPayload::Undecodable(reason) => return Err(InstrumentError::Undecodable(reason.clone())),
    };

    match values.first() {
        None => Err(InstrumentError::Empty),
        Some(TagValue::Ascii(text)) => Ok(text.as_str()),
        Some(other) => Err(InstrumentError::NotText { found: other.kind() }),
    }
}

// =============================================================================
// Tests
// =============================================================================
