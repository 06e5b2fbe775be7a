//! Image Gate: extension check, open, and raw tag extraction.
//!
//! The gate is the only place that touches the file's TIFF structure. It
//! produces a [`SemImage`] handle that owns the reader and the
//! [`RawTagMap`] of the first IFD. Per-tag decode failures are kept inside
//! the map as [`TagPayload::Undecodable`] so downstream stages can degrade
//! one key at a time; only structural failures halt the run.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::{debug, info};

use crate::error::{PipelineError, TiffError};
use crate::io::{FileRangeReader, RangeReader};

use super::tiff::{Ifd, TagValue, TiffHeader, TiffTag, ValueReader, BIGTIFF_HEADER_SIZE};

// =============================================================================
// RawTagMap
// =============================================================================

/// Payload stored under one tag id.
#[derive(Debug, Clone, PartialEq)]
pub enum TagPayload {
    /// Decoded values, in file order
    Values(Vec<TagValue>),

    /// The entry exists but its value could not be decoded
    Undecodable(String),
}

impl TagPayload {
    /// First decoded value, if any.
    pub fn first(&self) -> Option<&TagValue> {
        match self {
            TagPayload::Values(values) => values.first(),
            TagPayload::Undecodable(_) => None,
        }
    }
}

/// Tag id to payload for the primary image.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTagMap {
    entries: BTreeMap<u16, TagPayload>,
}

impl RawTagMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a payload. An id already present is kept.
    pub fn insert(&mut self, tag_id: u16, payload: TagPayload) {
        self.entries.entry(tag_id).or_insert(payload);
    }

    pub fn get(&self, tag_id: u16) -> Option<&TagPayload> {
        self.entries.get(&tag_id)
    }

    pub fn contains(&self, tag_id: u16) -> bool {
        self.entries.contains_key(&tag_id)
    }

    /// Entries in ascending tag id order.
    pub fn iter(&self) -> impl Iterator<Item = (u16, &TagPayload)> {
        self.entries.iter().map(|(&id, payload)| (id, payload))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn first_unsigned(&self, tag: TiffTag) -> Option<u64> {
        match self.get(tag.as_u16())?.first()? {
            TagValue::Unsigned(v) => Some(*v),
            _ => None,
        }
    }
}

impl FromIterator<(u16, TagPayload)> for RawTagMap {
    fn from_iter<I: IntoIterator<Item = (u16, TagPayload)>>(iter: I) -> Self {
        let mut map = RawTagMap::new();
        for (id, payload) in iter {
            map.insert(id, payload);
        }
        map
    }
}

// =============================================================================
// SemImage
// =============================================================================

/// An opened image: its reader, TIFF header and the raw tags of its first IFD.
#[derive(Debug)]
pub struct SemImage<R> {
    reader: R,
    header: TiffHeader,
    tags: RawTagMap,
}

impl<R: RangeReader> SemImage<R> {
    /// Read the header and first IFD from `reader` and decode every tag.
    pub async fn decode(reader: R) -> Result<Self, TiffError> {
        let header_len = reader.size().min(BIGTIFF_HEADER_SIZE as u64) as usize;
        let header_bytes = reader.read_exact_at(0, header_len).await?;
        let header = TiffHeader::parse(&header_bytes, reader.size())?;

        let ifd = read_first_ifd(&reader, &header).await?;
        let tags = read_tags(&reader, &header, &ifd).await;

        Ok(Self {
            reader,
            header,
            tags,
        })
    }

    /// Identifier of the underlying source, as used in logs.
    pub fn identifier(&self) -> &str {
        self.reader.identifier()
    }
}

impl<R> SemImage<R> {
    pub fn header(&self) -> &TiffHeader {
        &self.header
    }

    pub fn tags(&self) -> &RawTagMap {
        &self.tags
    }

    /// Width and height from the primary image's tags.
    pub fn dimensions(&self) -> Option<(u64, u64)> {
        let width = self.tags.first_unsigned(TiffTag::ImageWidth)?;
        let height = self.tags.first_unsigned(TiffTag::ImageLength)?;
        Some((width, height))
    }
}

async fn read_first_ifd<R: RangeReader>(reader: &R, header: &TiffHeader) -> Result<Ifd, TiffError> {
    let offset = header.first_ifd_offset;
    let count_size = header.ifd_count_size();
    if offset.saturating_add(count_size as u64) > reader.size() {
        return Err(TiffError::InvalidIfdOffset(offset));
    }

    let count_bytes = reader.read_exact_at(offset, count_size).await?;
    let entry_count = header.read_entry_count(&count_bytes)?;

    let ifd_size = Ifd::calculate_size(entry_count, header);
    let available = reader.size() - offset;
    if ifd_size as u64 > available {
        return Err(TiffError::FileTooSmall {
            required: offset + ifd_size as u64,
            actual: reader.size(),
        });
    }

    let ifd_bytes = reader.read_exact_at(offset, ifd_size).await?;
    Ifd::parse(&ifd_bytes, header)
}

async fn read_tags<R: RangeReader>(reader: &R, header: &TiffHeader, ifd: &Ifd) -> RawTagMap {
    let value_reader = ValueReader::new(reader, header);
    let mut tags = RawTagMap::new();

    for entry in ifd.iter() {
        if tags.contains(entry.tag_id) {
            continue;
        }
        let payload = match value_reader.read_values(entry).await {
            Ok(values) => TagPayload::Values(values),
            Err(e) => {
                debug!(tag = entry.tag_id, error = %e, "Tag value could not be decoded");
                TagPayload::Undecodable(e.to_string())
            }
        };
        tags.insert(entry.tag_id, payload);
    }

    tags
}

// =============================================================================
// ImageGate
// =============================================================================

/// Accepts or rejects a path by extension, then opens it.
#[derive(Debug, Clone)]
pub struct ImageGate {
    extensions: Vec<String>,
}

impl ImageGate {
    /// Gate accepting exactly these extensions (case-sensitive, no dot).
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            extensions: extensions.into_iter().map(Into::into).collect(),
        }
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// Check the extension of `path` without touching the file.
    pub fn check_extension(&self, path: &Path) -> Result<(), PipelineError> {
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_default();

        if self.extensions.iter().any(|accepted| *accepted == extension) {
            Ok(())
        } else {
            Err(PipelineError::UnsupportedFormat {
                path: path.to_path_buf(),
                extension,
                accepted: self.extensions.clone(),
            })
        }
    }

    /// Validate the extension, open the file and extract its raw tags.
    pub async fn open(&self, path: &Path) -> Result<SemImage<FileRangeReader>, PipelineError> {
        self.check_extension(path)?;

        let corrupt = |reason: String| PipelineError::CorruptOrUnreadable {
            path: path.to_path_buf(),
            reason,
        };

        let reader = FileRangeReader::open(path)
            .await
            .map_err(|e| corrupt(e.to_string()))?;
        let image = SemImage::decode(reader)
            .await
            .map_err(|e| corrupt(e.to_string()))?;

        match image.dimensions() {
            Some((width, height)) => info!(
                path = image.identifier(),
                width,
                height,
                tags = image.tags().len(),
                "Opened image"
            ),
            None => info!(
                path = image.identifier(),
                tags = image.tags().len(),
                "Opened image without dimensions"
            ),
        }

        Ok(image)
    }
}

// =============================================================================
// Tests
// =============================================================================
