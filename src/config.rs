//! Command-line configuration for semmeta.
//!
//! Every option can also be set through an environment variable with the
//! `SEMMETA_` prefix:
//!
//! - `SEMMETA_OUTPUT_DIR` - Artifact directory (default: output)
//! - `SEMMETA_EXTENSIONS` - Accepted extensions, comma-separated (default: tif,TIF)
//! - `SEMMETA_HEADER_LINES` - Instrument block header lines to skip (default: 35)

use std::path::PathBuf;

use clap::Parser;

use crate::metadata::HEADER_LINES;
use crate::pipeline::{default_extensions, PipelineConfig, DEFAULT_OUTPUT_DIR};

/// semmeta - SEM TIFF metadata extraction.
///
/// Reads the standard tags and the vendor instrument block of a scanning
/// electron microscope TIFF, writes the merged record and a cleaned copy
/// as JSON, then renders a metadata table next to the image.
#[derive(Parser, Debug, Clone)]
#[command(name = "semmeta")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Path of the SEM image to process.
    pub image: PathBuf,

    /// Directory the artifacts are written to. Created if missing.
    #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR, env = "SEMMETA_OUTPUT_DIR")]
    pub output_dir: PathBuf,

    /// Accepted file extensions (comma-separated, case-sensitive).
    #[arg(
        long,
        default_values_t = default_extensions(),
        env = "SEMMETA_EXTENSIONS",
        value_delimiter = ','
    )]
    pub extensions: Vec<String>,

    /// Boilerplate lines at the start of the instrument block.
    #[arg(long, default_value_t = HEADER_LINES, env = "SEMMETA_HEADER_LINES")]
    pub header_lines: usize,

    /// Skip rendering the metadata table and figure.
    #[arg(long, default_value_t = false)]
    pub no_render: bool,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl Config {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.extensions.iter().all(|e| e.trim().is_empty()) {
            return Err(
                "At least one extension is required. Set --extensions or SEMMETA_EXTENSIONS"
                    .to_string(),
            );
        }

        if self.output_dir.as_os_str().is_empty() {
            return Err("Output directory must not be empty".to_string());
        }

        Ok(())
    }

    /// Settings for the extraction pipeline.
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            output_dir: self.output_dir.clone(),
            extensions: self
                .extensions
                .iter()
                .map(|e| e.trim().trim_start_matches('.').to_string())
                .filter(|e| !e.is_empty())
                .collect(),
            header_lines: self.header_lines,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
