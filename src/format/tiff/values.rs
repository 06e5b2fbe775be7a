//! TIFF tag value reading.
//!
//! Values are stored either inline in the IFD entry (when they fit in the
//! value/offset field) or at an offset in the file. [`ValueReader`] hides
//! the difference and decodes every field type into [`TagValue`]s.

use bytes::Bytes;

use crate::error::TiffError;
use crate::io::RangeReader;

use super::parser::{ByteOrder, IfdEntry, TiffHeader};
use super::tags::FieldType;

// =============================================================================
// TagValue
// =============================================================================

/// One decoded value of a tag.
///
/// Numeric types decode to one value per element. ASCII decodes to a single
/// [`TagValue::Ascii`] and UNDEFINED to a single [`TagValue::Undefined`]
/// blob, mirroring how image libraries expose those tags.
#[derive(Debug, Clone, PartialEq)]
pub enum TagValue {
    /// BYTE, SHORT, LONG, LONG8, IFD, IFD8
    Unsigned(u64),

    /// SBYTE, SSHORT, SLONG, SLONG8
    Signed(i64),

    /// RATIONAL
    Rational(u32, u32),

    /// SRATIONAL
    SRational(i32, i32),

    /// FLOAT, DOUBLE
    Float(f64),

    /// ASCII text with trailing NULs stripped
    Ascii(String),

    /// UNDEFINED payload
    Undefined(Bytes),
}

impl TagValue {
    /// Name of the value kind, used in diagnostics.
    pub const fn kind(&self) -> &'static str {
        match self {
            TagValue::Unsigned(_) => "unsigned",
            TagValue::Signed(_) => "signed",
            TagValue::Rational(_, _) => "rational",
            TagValue::SRational(_, _) => "srational",
            TagValue::Float(_) => "float",
            TagValue::Ascii(_) => "ascii",
            TagValue::Undefined(_) => "undefined",
        }
    }

    /// Borrow the text of an ASCII value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            TagValue::Ascii(s) => Some(s),
            _ => None,
        }
    }
}

// =============================================================================
// ValueReader
// =============================================================================

/// Reads tag values from a TIFF file.
///
/// Combines a RangeReader with the TIFF header so values are read with the
/// file's byte order and offset width.
pub struct ValueReader<'a, R: RangeReader> {
    reader: &'a R,
    header: &'a TiffHeader,
}

impl<'a, R: RangeReader> ValueReader<'a, R> {
    /// Create a new ValueReader.
    pub fn new(reader: &'a R, header: &'a TiffHeader) -> Self {
        Self { reader, header }
    }

    /// Get the byte order from the header.
    #[inline]
    pub fn byte_order(&self) -> ByteOrder {
        self.header.byte_order
    }

    /// Read raw bytes for an IFD entry's value.
    ///
    /// For inline values, returns the bytes from the entry.
    /// For offset values, fetches the bytes from the file.
    pub async fn read_bytes(&self, entry: &IfdEntry) -> Result<Bytes, TiffError> {
        let size = entry
            .value_byte_size()
            .ok_or(TiffError::UnknownFieldType(entry.field_type_raw))?;

        if entry.is_inline {
            return Ok(Bytes::copy_from_slice(
                &entry.value_offset_bytes[..size as usize],
            ));
        }

        let offset = entry.value_offset(self.header.byte_order);
        if offset.saturating_add(size) > self.reader.size() {
            return Err(TiffError::InvalidTagValue {
                tag: entry.tag_id,
                message: format!(
                    "value of {} bytes at offset {} extends past end of file",
                    size, offset
                ),
            });
        }

        let len = usize::try_from(size).map_err(|_| TiffError::InvalidTagValue {
            tag: entry.tag_id,
            message: format!("value size {} does not fit in memory", size),
        })?;

        Ok(self.reader.read_exact_at(offset, len).await?)
    }

    /// Read and decode every value of an entry.
    pub async fn read_values(&self, entry: &IfdEntry) -> Result<Vec<TagValue>, TiffError> {
        let field_type = entry
            .field_type
            .ok_or(TiffError::UnknownFieldType(entry.field_type_raw))?;

        if entry.count == 0 {
            return Ok(Vec::new());
        }

        let bytes = self.read_bytes(entry).await?;
        Ok(decode_values(&bytes, field_type, self.byte_order()))
    }
}

// =============================================================================
// Decoding from bytes
// =============================================================================

/// Decode raw value bytes into tag values.
///
/// Trailing bytes that do not form a whole element are ignored.
pub fn decode_values(bytes: &[u8], field_type: FieldType, byte_order: ByteOrder) -> Vec<TagValue> {
    let size = field_type.size_in_bytes();
    let elements = bytes.chunks_exact(size);

    match field_type {
        FieldType::Ascii => vec![TagValue::Ascii(decode_ascii(bytes))],
        FieldType::Undefined => vec![TagValue::Undefined(Bytes::copy_from_slice(bytes))],
        FieldType::Byte => bytes.iter().map(|&b| TagValue::Unsigned(b as u64)).collect(),
        FieldType::SByte => bytes
            .iter()
            .map(|&b| TagValue::Signed(b as i8 as i64))
            .collect(),
        FieldType::Short => elements
            .map(|c| TagValue::Unsigned(byte_order.read_u16(c) as u64))
            .collect(),
        FieldType::SShort => elements
            .map(|c| TagValue::Signed(byte_order.read_u16(c) as i16 as i64))
            .collect(),
        FieldType::Long | FieldType::Ifd => elements
            .map(|c| TagValue::Unsigned(byte_order.read_u32(c) as u64))
            .collect(),
        FieldType::SLong => elements
            .map(|c| TagValue::Signed(byte_order.read_u32(c) as i32 as i64))
            .collect(),
        FieldType::Long8 | FieldType::Ifd8 => elements
            .map(|c| TagValue::Unsigned(byte_order.read_u64(c)))
            .collect(),
        FieldType::SLong8 => elements
            .map(|c| TagValue::Signed(byte_order.read_u64(c) as i64))
            .collect(),
        FieldType::Rational => elements
            .map(|c| TagValue::Rational(byte_order.read_u32(c), byte_order.read_u32(&c[4..])))
            .collect(),
        FieldType::SRational => elements
            .map(|c| {
                TagValue::SRational(
                    byte_order.read_u32(c) as i32,
                    byte_order.read_u32(&c[4..]) as i32,
                )
            })
            .collect(),
        FieldType::Float => elements
            .map(|c| TagValue::Float(f32::from_bits(byte_order.read_u32(c)) as f64))
            .collect(),
        FieldType::Double => elements
            .map(|c| TagValue::Float(f64::from_bits(byte_order.read_u64(c))))
            .collect(),
    }
}

/// Decode an ASCII payload.
///
/// Everything after the first NUL is dropped. SEM vendors write Latin-1
/// (the micro sign in particular), so bytes that are not valid UTF-8 are
/// decoded as Latin-1 instead of being replaced.
pub fn decode_ascii(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    let bytes = &bytes[..end];

    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_owned(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

// =============================================================================
// Tests
// =============================================================================
