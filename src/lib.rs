//! # semmeta
//!
//! Metadata extraction for scanning electron microscope (SEM) TIFF images.
//!
//! A run takes one image through four stages:
//!
//! 1. **Image Gate**: checks the extension, opens the file and decodes the
//!    tags of its primary image.
//! 2. **Standard-Tag Resolver**: maps every name of the standard tag
//!    registry to its value, or to an explicit absence marker.
//! 3. **Instrument-Block Parser**: reads the key/value pairs the vendor
//!    stores as one text block under tag 34118.
//! 4. **Normalizer**: merges both records, drops absent keys and rewrites
//!    quantities to `"<number> <unit>"`.
//!
//! The merged record and the cleaned record are written as
//! `<stem>_raw.json` and `<stem>_cleaned.json`.
//!
//! ## Architecture
//!
//! - [`io`] - Byte-range readers over local files and memory
//! - [`mod@format`] - TIFF decoding, the tag registry and the Image Gate
//! - [`metadata`] - Records, resolver, instrument parser and normalizer
//! - [`pipeline`] - Orchestration and artifact persistence
//! - [`render`] - Metadata table and figure output
//! - [`config`] - CLI and configuration types
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use semmeta::{Pipeline, PipelineConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), semmeta::PipelineError> {
//!     let pipeline = Pipeline::new(PipelineConfig::new("output"));
//!     let output = pipeline.run(Path::new("sample.tif")).await?;
//!     println!("cleaned metadata in {}", output.cleaned_path.display());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod format;
pub mod io;
pub mod metadata;
pub mod pipeline;
pub mod render;

// Re-export commonly used types
pub use config::Config;
pub use error::{InstrumentError, IoError, PipelineError, RegistryError, RenderError, TiffError};
pub use format::tiff::{
    ByteOrder, CollisionPolicy, FieldType, Ifd, IfdEntry, TagCollision, TagRegistry, TagValue,
    TiffHeader, TiffTag, ValueReader, STANDARD_TAGS,
};
pub use format::{ImageGate, RawTagMap, SemImage, TagPayload};
pub use io::{FileRangeReader, MemoryRangeReader, RangeReader};
pub use metadata::{
    clean_record, clean_value, merge_records, pair_alternating, resolve_standard_tags,
    InstrumentBlockParser, MetadataRecord, MetadataValue, HEADER_LINES, INSTRUMENT_TAG,
};
pub use pipeline::{Pipeline, PipelineConfig, PipelineOutput};
pub use render::{FigureRenderer, MetadataTable, Renderer};
