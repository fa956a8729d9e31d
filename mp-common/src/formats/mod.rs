//! MeshPack binary container (.mp)
//!
//! Positional, little-endian format holding every deduplicated model of a scene
//! together with its instance transforms. An offset table after the header allows
//! seeking to a single object without parsing the ones before it.
//!
//! All headers implement the [`BinarySerializable`] trait for consistent
//! serialization/deserialization.

mod container;
mod reader;
mod serialization;
mod writer;

#[cfg(test)]
mod tests;

pub use container::*;
pub use reader::{ContainerView, OffsetMismatch, load_container, read_container};
pub use serialization::BinarySerializable;
pub use writer::{compute_offsets, pack_container, save_container, write_container};
