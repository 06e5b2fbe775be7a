//! TIFF structure decoding for SEM images.
//!
//! Only what metadata extraction needs: the header, the first IFD and the
//! decoded values of its tags. Pixel data is never touched here.
//!
//! # Key Concepts
//!
//! - **Byte order**: TIFF files declare their endianness (II = little-endian, MM = big-endian)
//!   in the header. All multi-byte values must be read respecting this order.
//!
//! - **Classic TIFF vs BigTIFF**: Classic TIFF uses 32-bit offsets, BigTIFF uses 64-bit
//!   offsets. The parser handles both transparently.
//!
//! - **Inline vs offset values**: Small values are stored inline in the IFD entry,
//!   larger values (such as the instrument block) at an offset pointed to by the entry.
//!
//! - **Registry**: the standard name table used to turn numeric ids into metadata keys.

mod parser;
mod registry;
mod tags;
mod values;

pub use parser::{
    ByteOrder, Ifd, IfdEntry, TiffHeader, BIGTIFF_HEADER_SIZE, MAX_IFD_ENTRIES, TIFF_HEADER_SIZE,
};
pub use registry::{CollisionPolicy, TagCollision, TagRegistry, STANDARD_TAGS};
pub use tags::{FieldType, TiffTag};
pub use values::{decode_ascii, decode_values, TagValue, ValueReader};
