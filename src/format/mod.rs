//! File formats: TIFF structure decoding and the Image Gate.

pub mod gate;
pub mod tiff;

pub use gate::{ImageGate, RawTagMap, SemImage, TagPayload};
