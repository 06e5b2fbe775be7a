//! Renderer boundary.
//!
//! A renderer consumes the cleaned artifact and the source image and
//! produces display files. It only reads the cleaned record, so a failing
//! renderer never affects artifacts that were already written.

mod figure;
mod table;

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::RenderError;

pub use figure::FigureRenderer;
pub use table::{split_quantity, MetadataTable, TableRow, DISPLAY_VARIABLES, NOT_AVAILABLE};

/// Produces display output from a cleaned record and its source image.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Render and return the paths of the files written.
    async fn render(&self, cleaned_json: &Path, image: &Path) -> Result<Vec<PathBuf>, RenderError>;
}
