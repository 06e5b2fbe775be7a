//! Test utilities for integration tests.
//!
//! Provides a request-tracking range reader and a builder for small SEM
//! TIFF files: single IFD, arbitrary tags, an optional instrument block and
//! optional 8-bit grayscale strip data.

use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use semmeta::error::IoError;
use semmeta::io::RangeReader;

// =============================================================================
// Mock Range Reader with Request Tracking
// =============================================================================

/// A range reader over memory that records every read request.
///
/// Clones share the request log, so a test can keep a handle after moving
/// the reader into a decoder.
#[derive(Clone)]
pub struct TrackingMockReader {
    data: Bytes,
    identifier: String,
    request_count: Arc<AtomicUsize>,
    requests: Arc<RwLock<Vec<(u64, usize)>>>,
}

impl TrackingMockReader {
    pub fn new(data: Vec<u8>, identifier: impl Into<String>) -> Self {
        Self {
            data: Bytes::from(data),
            identifier: identifier.into(),
            request_count: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    pub async fn get_requests(&self) -> Vec<(u64, usize)> {
        self.requests.read().await.clone()
    }
}

#[async_trait]
impl RangeReader for TrackingMockReader {
    async fn read_exact_at(&self, offset: u64, len: usize) -> Result<Bytes, IoError> {
        self.request_count.fetch_add(1, Ordering::SeqCst);
        self.requests.write().await.push((offset, len));

        let start = offset as usize;
        let end = start + len;
        if end > self.data.len() {
            return Err(IoError::RangeOutOfBounds {
                offset,
                requested: len as u64,
                size: self.data.len() as u64,
            });
        }
        Ok(self.data.slice(start..end))
    }

    fn size(&self) -> u64 {
        self.data.len() as u64
    }

    fn identifier(&self) -> &str {
        &self.identifier
    }
}

// =============================================================================
// SEM TIFF Builder
// =============================================================================

#[derive(Clone, Copy, Debug)]
pub enum ByteOrderType {
    LittleEndian,
    BigEndian,
}

struct TagEntry {
    tag: u16,
    field_type: u16,
    count: u64,
    /// Value bytes, already in the file's byte order
    data: Vec<u8>,
}

/// Builder for single-IFD SEM TIFF files.
pub struct SemTiffBuilder {
    byte_order: ByteOrderType,
    is_bigtiff: bool,
    entries: Vec<TagEntry>,
    strip: Option<Vec<u8>>,
}

const STRIP_OFFSETS: u16 = 273;

impl SemTiffBuilder {
    pub fn new() -> Self {
        Self {
            byte_order: ByteOrderType::LittleEndian,
            is_bigtiff: false,
            entries: Vec::new(),
            strip: None,
        }
    }

    pub fn with_byte_order(mut self, order: ByteOrderType) -> Self {
        self.byte_order = order;
        self
    }

    pub fn with_bigtiff(mut self, is_bigtiff: bool) -> Self {
        self.is_bigtiff = is_bigtiff;
        self
    }

    /// Add a tag with pre-encoded value bytes.
    pub fn raw(mut self, tag: u16, field_type: u16, count: u64, data: Vec<u8>) -> Self {
        self.entries.retain(|e| e.tag != tag);
        self.entries.push(TagEntry {
            tag,
            field_type,
            count,
            data,
        });
        self
    }

    /// ASCII tag, NUL-terminated.
    pub fn ascii(self, tag: u16, text: &str) -> Self {
        self.ascii_bytes(tag, text.as_bytes())
    }

    /// ASCII tag from raw bytes (e.g. Latin-1), NUL-terminated.
    pub fn ascii_bytes(self, tag: u16, bytes: &[u8]) -> Self {
        let mut data = bytes.to_vec();
        data.push(0);
        let count = data.len() as u64;
        self.raw(tag, 2, count, data)
    }

    pub fn short(self, tag: u16, values: &[u16]) -> Self {
        let order = self.byte_order;
        let data = values.iter().flat_map(|v| encode(order, *v as u64, 2)).collect();
        self.raw(tag, 3, values.len() as u64, data)
    }

    pub fn long(self, tag: u16, values: &[u32]) -> Self {
        let order = self.byte_order;
        let data = values.iter().flat_map(|v| encode(order, *v as u64, 4)).collect();
        self.raw(tag, 4, values.len() as u64, data)
    }

    pub fn rational(self, tag: u16, values: &[(u32, u32)]) -> Self {
        let order = self.byte_order;
        let data = values
            .iter()
            .flat_map(|(n, d)| {
                let mut bytes = encode(order, *n as u64, 4);
                bytes.extend(encode(order, *d as u64, 4));
                bytes
            })
            .collect();
        self.raw(tag, 5, values.len() as u64, data)
    }

    pub fn double(self, tag: u16, value: f64) -> Self {
        let order = self.byte_order;
        self.raw(tag, 12, 1, encode(order, value.to_bits(), 8))
    }

    /// Vendor instrument block (tag 34118) from its lines, CRLF-joined.
    pub fn instrument_block(self, lines: &[&str]) -> Self {
        self.ascii(34118, &lines.join("\r\n"))
    }

    /// Uncompressed 8-bit grayscale image in a single strip.
    pub fn grayscale_image(self, width: u32, height: u32) -> Self {
        let pixels: Vec<u8> = (0..width * height)
            .map(|i| ((i % width) * 255 / width.max(1)) as u8)
            .collect();

        let mut builder = self
            .long(256, &[width])
            .long(257, &[height])
            .short(258, &[8])
            .short(259, &[1])
            .short(262, &[1])
            .long(STRIP_OFFSETS, &[0])
            .short(277, &[1])
            .long(278, &[height])
            .long(279, &[width * height]);
        builder.strip = Some(pixels);
        builder
    }

    /// Build the file.
    ///
    /// Layout: header, IFD, out-of-line values, strip data.
    pub fn build(mut self) -> Vec<u8> {
        self.entries.sort_by_key(|e| e.tag);

        let header_size: u64 = if self.is_bigtiff { 16 } else { 8 };
        let entry_size: u64 = if self.is_bigtiff { 20 } else { 12 };
        let count_size: u64 = if self.is_bigtiff { 8 } else { 2 };
        let offset_size: usize = if self.is_bigtiff { 8 } else { 4 };

        let ifd_size = count_size + self.entries.len() as u64 * entry_size + offset_size as u64;
        let mut next_free = header_size + ifd_size;

        // Assign offsets to out-of-line values, word aligned
        let mut value_offsets = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            if entry.data.len() > offset_size {
                next_free += next_free % 2;
                value_offsets.push(Some(next_free));
                next_free += entry.data.len() as u64;
            } else {
                value_offsets.push(None);
            }
        }
        next_free += next_free % 2;
        let strip_offset = next_free;

        if self.strip.is_some() {
            let order = self.byte_order;
            if let Some(entry) = self.entries.iter_mut().find(|e| e.tag == STRIP_OFFSETS) {
                entry.data = encode(order, strip_offset, 4);
            }
        }

        let order = self.byte_order;
        let mut data = Vec::new();

        // Header
        match order {
            ByteOrderType::LittleEndian => data.extend_from_slice(b"II"),
            ByteOrderType::BigEndian => data.extend_from_slice(b"MM"),
        }
        if self.is_bigtiff {
            data.extend(encode(order, 43, 2));
            data.extend(encode(order, 8, 2));
            data.extend(encode(order, 0, 2));
            data.extend(encode(order, header_size, 8));
        } else {
            data.extend(encode(order, 42, 2));
            data.extend(encode(order, header_size, 4));
        }

        // IFD
        data.extend(encode(order, self.entries.len() as u64, count_size as usize));
        for (entry, offset) in self.entries.iter().zip(&value_offsets) {
            data.extend(encode(order, entry.tag as u64, 2));
            data.extend(encode(order, entry.field_type as u64, 2));
            data.extend(encode(order, entry.count, if self.is_bigtiff { 8 } else { 4 }));
            match offset {
                Some(offset) => data.extend(encode(order, *offset, offset_size)),
                None => {
                    let mut inline = entry.data.clone();
                    inline.resize(offset_size, 0);
                    data.extend(inline);
                }
            }
        }
        data.extend(encode(order, 0, offset_size));

        // Out-of-line values
        for (entry, offset) in self.entries.iter().zip(&value_offsets) {
            if let Some(offset) = offset {
                data.resize(*offset as usize, 0);
                data.extend_from_slice(&entry.data);
            }
        }

        if let Some(strip) = self.strip {
            data.resize(strip_offset as usize, 0);
            data.extend(strip);
        }

        data
    }
}

impl Default for SemTiffBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn encode(order: ByteOrderType, value: u64, size: usize) -> Vec<u8> {
    match order {
        ByteOrderType::LittleEndian => value.to_le_bytes()[..size].to_vec(),
        ByteOrderType::BigEndian => value.to_be_bytes()[8 - size..].to_vec(),
    }
}

// =============================================================================
// Fixtures
// =============================================================================

/// Header lines the instrument parser skips.
pub const INSTRUMENT_HEADER_LINES: usize = 35;

/// Instrument block lines: boilerplate header followed by `pairs`.
pub fn instrument_lines(pairs: &[(&str, &str)]) -> Vec<String> {
    let mut lines: Vec<String> = (0..INSTRUMENT_HEADER_LINES)
        .map(|i| format!("SV_HEADER_{i}"))
        .collect();
    for (key, value) in pairs {
        lines.push(key.to_string());
        lines.push(value.to_string());
    }
    lines
}

/// A typical SEM image: standard tags, an instrument block and pixels.
pub fn create_sem_tiff(byte_order: ByteOrderType) -> Vec<u8> {
    let lines = instrument_lines(&[
        ("AP_WD", "WD =  3.18 mm"),
        ("AP_BEAM_TIME", "Beam Time = 1 s"),
        ("AP_IMAGE_PIXEL_SIZE", "Image Pixel Size = 2.5 nm"),
        ("AP_HOLDER_HEIGHT", "Holder Height = 10 mm"),
        ("AP_BEAM_CURRENT", "Beam Current = 100 pA"),
        ("AP_HOLDER_DIAMETER", "Holder Diameter = 12.5 mm"),
        ("AP_STAGE_AT_T", "Stage at T = -12.5 deg"),
        ("SV_USER_NAME", "User Name = operator"),
    ]);
    let lines: Vec<&str> = lines.iter().map(String::as_str).collect();

    SemTiffBuilder::new()
        .with_byte_order(byte_order)
        .grayscale_image(16, 8)
        .ascii(271, "Carl Zeiss")
        .ascii(272, "SEM")
        .ascii(305, "SmartSEM")
        .rational(282, &[(72, 1)])
        .rational(283, &[(72, 1)])
        .short(296, &[2])
        .instrument_block(&lines)
        .build()
}

/// Write `data` to `dir/name` and return the path.
pub fn write_file(dir: &Path, name: &str, data: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, data).unwrap();
    path
}

/// Check for the classic TIFF magic in either byte order.
pub fn is_tiff_magic(data: &[u8]) -> bool {
    data.len() >= 4 && (data[0..4] == [b'I', b'I', 42, 0] || data[0..4] == [b'M', b'M', 0, 42])
}

/// Check for the BigTIFF magic in either byte order.
pub fn is_bigtiff_magic(data: &[u8]) -> bool {
    data.len() >= 4 && (data[0..4] == [b'I', b'I', 43, 0] || data[0..4] == [b'M', b'M', 0, 43])
}
