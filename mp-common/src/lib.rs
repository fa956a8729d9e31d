//! Shared types for the MeshPack container
//!
//! This crate is used by:
//! - `mp-export` (asset pipeline, writes `.mp` containers)
//! - renderers and tools that load `.mp` containers
//!
//! # Modules
//!
//! - [`model`] - Deduplicated geometry with its instance transforms
//! - [`formats`] - Binary container layout, packer and reader
//! - [`error`] - Format error type

pub mod error;
pub mod formats;
pub mod model;

pub use error::FormatError;
pub use model::{IDENTITY, MAX_VERTEX_COUNT, Model, RowMajorMatrix};

pub use formats::{
    BinarySerializable,
    ContainerHeader,
    ContainerView,
    // Constants
    INDEX_SIZE,
    INSTANCE_SIZE,
    MP_EXTENSION,
    MP_MAGIC,
    NORMAL_SIZE,
    ObjectHeader,
    OffsetMismatch,
    VERTEX_SIZE,
    // Packing / reading
    compute_offsets,
    load_container,
    pack_container,
    read_container,
    save_container,
    write_container,
};
