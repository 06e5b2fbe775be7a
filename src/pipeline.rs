//! One image in, two JSON artifacts out.
//!
//! ```text
//! ImageGate ──► resolve_standard_tags ──┐
//!           └─► InstrumentBlockParser ──┴─► merge ──► <stem>_raw.json
//!                                              └─► clean ──► <stem>_cleaned.json
//! ```
//!
//! Every step is awaited in order; nothing runs concurrently.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::PipelineError;
use crate::format::tiff::TagRegistry;
use crate::format::ImageGate;
use crate::metadata::{
    clean_record, merge_records, resolve_standard_tags, InstrumentBlockParser, MetadataRecord,
    HEADER_LINES,
};

/// Default directory for artifacts.
pub const DEFAULT_OUTPUT_DIR: &str = "output";

/// Extensions accepted by default. Matching is case-sensitive.
pub const DEFAULT_EXTENSIONS: &[&str] = &["tif", "TIF"];

/// [`DEFAULT_EXTENSIONS`] as owned strings.
pub fn default_extensions() -> Vec<String> {
    DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect()
}

/// Suffix of the merged, pre-clean artifact.
pub const RAW_SUFFIX: &str = "_raw.json";

/// Suffix of the cleaned artifact.
pub const CLEANED_SUFFIX: &str = "_cleaned.json";

// =============================================================================
// Configuration
// =============================================================================

/// Settings for a [`Pipeline`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Directory the artifacts are written to. Must exist.
    pub output_dir: PathBuf,

    /// Accepted file extensions, without the dot
    pub extensions: Vec<String>,

    /// Header lines skipped at the start of the instrument block
    pub header_lines: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            extensions: default_extensions(),
            header_lines: HEADER_LINES,
        }
    }
}

impl PipelineConfig {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            ..Self::default()
        }
    }
}

/// Summary of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOutput {
    /// Path of `<stem>_raw.json`
    pub raw_path: PathBuf,

    /// Path of `<stem>_cleaned.json`
    pub cleaned_path: PathBuf,

    /// Registry names found in the image
    pub standard_tags_found: usize,

    /// Key/value pairs read from the instrument block
    pub instrument_pairs: usize,

    /// Keys in the cleaned artifact
    pub cleaned_keys: usize,
}

// =============================================================================
// Pipeline
// =============================================================================

/// Extraction pipeline for one image at a time.
#[derive(Debug, Clone)]
pub struct Pipeline {
    gate: ImageGate,
    registry: TagRegistry,
    instrument: InstrumentBlockParser,
    output_dir: PathBuf,
}

impl Pipeline {
    /// Pipeline using the standard tag registry.
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            gate: ImageGate::new(config.extensions),
            registry: TagRegistry::standard(),
            instrument: InstrumentBlockParser::new().with_header_lines(config.header_lines),
            output_dir: config.output_dir,
        }
    }

    /// Replace the tag registry.
    pub fn with_registry(mut self, registry: TagRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn registry(&self) -> &TagRegistry {
        &self.registry
    }

    /// Raw and cleaned artifact paths for `image`.
    pub fn artifact_paths(&self, image: &Path) -> (PathBuf, PathBuf) {
        let stem = image
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        (
            self.output_dir.join(format!("{stem}{RAW_SUFFIX}")),
            self.output_dir.join(format!("{stem}{CLEANED_SUFFIX}")),
        )
    }

    /// Process one image.
    ///
    /// Fails only when the image is rejected, cannot be decoded, or an
    /// artifact cannot be written. Nothing is written on the first two.
    pub async fn run(&self, image: &Path) -> Result<PipelineOutput, PipelineError> {
        let sem_image = self.gate.open(image).await?;
        let tags = sem_image.tags();

        let standard = resolve_standard_tags(tags, &self.registry);
        let standard_tags_found = standard.present_count();
        info!(
            names = standard.len(),
            found = standard_tags_found,
            "Resolved standard tags"
        );

        let instrument = self.instrument.parse(tags);
        let instrument_pairs = instrument.len();
        info!(pairs = instrument_pairs, "Parsed instrument block");

        let merged = merge_records(standard, instrument);
        let cleaned = clean_record(&merged);

        let (raw_path, cleaned_path) = self.artifact_paths(image);
        write_artifact(&raw_path, &merged, false).await?;
        write_artifact(&cleaned_path, &cleaned, true).await?;

        info!(
            raw = %raw_path.display(),
            cleaned = %cleaned_path.display(),
            keys = cleaned.len(),
            "Wrote metadata artifacts"
        );

        Ok(PipelineOutput {
            raw_path,
            cleaned_path,
            standard_tags_found,
            instrument_pairs,
            cleaned_keys: cleaned.len(),
        })
    }
}

async fn write_artifact(
    path: &Path,
    record: &MetadataRecord,
    pretty: bool,
) -> Result<(), PipelineError> {
    let output_error = |reason: String| PipelineError::Output {
        path: path.to_path_buf(),
        reason,
    };

    let json = if pretty {
        record.to_json_pretty()
    } else {
        record.to_json()
    }
    .map_err(|e| output_error(e.to_string()))?;

    tokio::fs::write(path, json)
        .await
        .map_err(|e| output_error(e.to_string()))
}
