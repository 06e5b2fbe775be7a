//! Metadata records and the stages that build them.
//!
//! - [`resolver`]: standard tags of the image, one key per registry name
//! - [`instrument`]: key/value pairs from the vendor instrument block
//! - [`normalize`]: merge, drop absent keys, canonicalize quantities

pub mod instrument;
pub mod normalize;
pub mod record;
pub mod resolver;

pub use instrument::{pair_alternating, InstrumentBlockParser, Pairing, HEADER_LINES, INSTRUMENT_TAG};
pub use normalize::{canonical_quantity, clean_record, clean_value, merge_records};
pub use record::{MetadataRecord, MetadataValue};
pub use resolver::{resolve_standard_tags, EXCLUDED_NAMES};
