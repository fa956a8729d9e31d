//! Error type for packing and reading MeshPack containers.

use std::io;

/// Error produced while packing or reading a container.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    /// The leading magic tag did not match. Nothing after it is trusted.
    #[error("Format verification failed: expected magic 0x{expected:04X}, found 0x{found:04X}")]
    BadMagic { expected: u16, found: u16 },

    #[error("Unexpected end of data reading {context}: needed {needed} bytes, {available} available")]
    UnexpectedEof {
        context: &'static str,
        needed: usize,
        available: usize,
    },

    #[error("Model has {vertex_count} vertices, exceeding the 16-bit index limit of {max}")]
    IndexOverflow { vertex_count: usize, max: usize },

    #[error("Malformed topology: {0}")]
    MalformedTopology(String),

    #[error("Normal count {normal_count} must be 0 or equal to vertex count {vertex_count}")]
    InvalidNormalCount {
        normal_count: usize,
        vertex_count: usize,
    },

    #[error("Model has no instances")]
    NoInstances,

    #[error("Container data exceeds the 32-bit offset range")]
    TooLarge,

    #[error("Object {index} out of range (container holds {count})")]
    ObjectOutOfRange { index: usize, count: usize },

    #[error("Offset table entry {index} points to {offset}, beyond the {len}-byte data region")]
    OffsetOutOfBounds { index: usize, offset: u32, len: usize },

    #[error(transparent)]
    Io(#[from] io::Error),
}
