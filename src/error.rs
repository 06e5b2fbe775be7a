use std::path::PathBuf;

use thiserror::Error;

/// I/O errors that can occur when reading from the source image
#[derive(Debug, Clone, Error)]
pub enum IoError {
    /// Error from the local filesystem
    #[error("File error: {0}")]
    File(String),

    /// Requested range exceeds resource bounds
    #[error("Range out of bounds: requested {requested} bytes at offset {offset}, size is {size}")]
    RangeOutOfBounds {
        offset: u64,
        requested: u64,
        size: u64,
    },

    /// File not found
    #[error("File not found: {0}")]
    NotFound(String),
}

impl From<std::io::Error> for IoError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => IoError::NotFound(err.to_string()),
            _ => IoError::File(err.to_string()),
        }
    }
}

/// Errors that can occur when parsing TIFF files
#[derive(Debug, Clone, Error)]
pub enum TiffError {
    /// I/O error while reading the file
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// Invalid TIFF magic bytes (not II or MM)
    #[error("Invalid TIFF magic bytes: expected 0x4949 (II) or 0x4D4D (MM), got 0x{0:04X}")]
    InvalidMagic(u16),

    /// Invalid TIFF version number
    #[error("Invalid TIFF version: expected 42 (TIFF) or 43 (BigTIFF), got {0}")]
    InvalidVersion(u16),

    /// Invalid BigTIFF offset byte size (must be 8)
    #[error("Invalid BigTIFF offset byte size: expected 8, got {0}")]
    InvalidBigTiffOffsetSize(u16),

    /// File is too small to contain a valid TIFF header
    #[error("File too small: need at least {required} bytes, got {actual}")]
    FileTooSmall { required: u64, actual: u64 },

    /// Invalid IFD offset (points outside file or to invalid location)
    #[error("Invalid IFD offset: {0}")]
    InvalidIfdOffset(u64),

    /// IFD declares more entries than any sane image carries
    #[error("Too many IFD entries: {0}")]
    TooManyEntries(u64),

    /// Tag has unexpected type or count
    #[error("Invalid tag value for {tag}: {message}")]
    InvalidTagValue { tag: u16, message: String },

    /// Unknown field type in IFD entry
    #[error("Unknown field type: {0}")]
    UnknownFieldType(u16),
}

/// Errors raised while building a tag registry
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Two ids map to the same name under [`CollisionPolicy::Reject`](crate::format::tiff::CollisionPolicy)
    #[error("Tag name {name} is claimed by both {first} and {second}")]
    NameCollision {
        name: String,
        first: u16,
        second: u16,
    },
}

/// Structural problems inside the vendor instrument block.
///
/// These never halt a pipeline run: the parser logs them and yields an
/// empty record.
#[derive(Debug, Clone, Error)]
pub enum InstrumentError {
    /// The instrument tag holds something other than a text payload
    #[error("Instrument block is not text (found {found})")]
    NotText { found: &'static str },

    /// The instrument tag has no values at all
    #[error("Instrument block is empty")]
    Empty,

    /// The instrument tag could not be decoded from the file
    #[error("Instrument block could not be decoded: {0}")]
    Undecodable(String),
}

/// Errors that halt a pipeline run
#[derive(Debug, Clone, Error)]
pub enum PipelineError {
    /// The file extension is not in the accepted set
    #[error("{}: unsupported format (extension {extension:?} is not one of {accepted:?})", path.display())]
    UnsupportedFormat {
        path: PathBuf,
        extension: String,
        accepted: Vec<String>,
    },

    /// The file could not be opened or its TIFF structure could not be decoded
    #[error("{}: corrupt or unreadable image ({reason})", path.display())]
    CorruptOrUnreadable { path: PathBuf, reason: String },

    /// An artifact could not be written
    #[error("{}: failed to write artifact ({reason})", path.display())]
    Output { path: PathBuf, reason: String },
}

/// Errors raised by the renderer boundary
#[derive(Debug, Clone, Error)]
pub enum RenderError {
    /// The cleaned record could not be read back
    #[error("{}: cannot read cleaned metadata ({reason})", path.display())]
    Metadata { path: PathBuf, reason: String },

    /// A rendered file could not be written
    #[error("{}: failed to write rendered output ({reason})", path.display())]
    Output { path: PathBuf, reason: String },
}
