use std::io::Cursor;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, ImageReader};
use tracing::{info, warn};

use super::table::MetadataTable;
use super::Renderer;
use crate::error::RenderError;
use crate::metadata::MetadataRecord;

/// Writes `<stem>_table.txt` and a grayscale `<stem>.png` of the image.
///
/// If the image cannot be decoded, only the table is written.
#[derive(Debug, Clone)]
pub struct FigureRenderer {
    output_dir: PathBuf,
}

impl FigureRenderer {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

#[async_trait]
impl Renderer for FigureRenderer {
    async fn render(&self, cleaned_json: &Path, image: &Path) -> Result<Vec<PathBuf>, RenderError> {
        let metadata_error = |reason: String| RenderError::Metadata {
            path: cleaned_json.to_path_buf(),
            reason,
        };
        let json = tokio::fs::read_to_string(cleaned_json)
            .await
            .map_err(|e| metadata_error(e.to_string()))?;
        let record = MetadataRecord::from_json(&json).map_err(|e| metadata_error(e.to_string()))?;

        let stem = image
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut written = Vec::with_capacity(2);

        let table_path = self.output_dir.join(format!("{stem}_table.txt"));
        let table = MetadataTable::from_record(&record);
        write_output(&table_path, table.to_string().into_bytes()).await?;
        written.push(table_path);

        match grayscale_png(image) {
            Ok(png) => {
                let figure_path = self.output_dir.join(format!("{stem}.png"));
                write_output(&figure_path, png).await?;
                written.push(figure_path);
            }
            Err(reason) => {
                warn!(image = %image.display(), %reason, "Cannot decode image, writing table only");
            }
        }

        info!(files = written.len(), "Rendered metadata figure");
        Ok(written)
    }
}

fn grayscale_png(image: &Path) -> Result<Vec<u8>, String> {
    let decoded = ImageReader::open(image)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(|e| e.to_string())?
        .decode()
        .map_err(|e| e.to_string())?;

    let gray = DynamicImage::ImageLuma8(decoded.to_luma8());
    let mut png = Vec::new();
    gray.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| e.to_string())?;
    Ok(png)
}

async fn write_output(path: &Path, contents: Vec<u8>) -> Result<(), RenderError> {
    tokio::fs::write(path, contents)
        .await
        .map_err(|e| RenderError::Output {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}
