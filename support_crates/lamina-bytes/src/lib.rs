//! Alignment-guaranteed byte buffers used by the lamina value stores.

pub mod buffer;

pub use buffer::AlignedByteVec;
