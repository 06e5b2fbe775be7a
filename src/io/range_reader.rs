use async_trait::async_trait;
use bytes::Bytes;

use crate::error::IoError;

/// Trait for reading byte ranges from an image source.
///
/// The TIFF decoder only ever asks for the header, the first IFD and the
/// payloads that IFD points at, so sources never need to be loaded whole.
#[async_trait]
pub trait RangeReader: Send + Sync {
    /// Read exactly `len` bytes starting at `offset`.
    ///
    /// Returns an error if the range is out of bounds or if the read fails.
    async fn read_exact_at(&self, offset: u64, len: usize) -> Result<Bytes, IoError>;

    /// Get the total size of the resource in bytes.
    fn size(&self) -> u64;

    /// Get an identifier for this resource (used in logs and diagnostics).
    ///
    /// For local files this is the path as given on the command line.
    fn identifier(&self) -> &str;
}
