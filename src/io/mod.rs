mod local;
mod range_reader;

pub use local::{FileRangeReader, MemoryRangeReader};
pub use range_reader::RangeReader;
