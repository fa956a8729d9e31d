//! mp-export library
//!
//! Turns scene mesh primitives into deduplicated, instanced models and packs
//! them into a MeshPack container. Used by the `mp-export` binary and by tools
//! that want to drive the pipeline directly.

pub mod dump;
pub mod error;
pub mod inspect;
pub mod manifest;
pub mod normals;
pub mod pipeline;
pub mod primitive;
pub mod registry;
pub mod scene;
pub mod triangulate;

// Re-export the container format from mp-common
pub use mp_common::{
    ContainerView, FormatError, IDENTITY, MAX_VERTEX_COUNT, MP_EXTENSION, MP_MAGIC, Model,
    RowMajorMatrix, load_container, pack_container, read_container, save_container,
};

pub use error::{ExportError, TopologyError};
pub use pipeline::{ExportOptions, ExportStats, Exporter, collect_scene, convert_scene};
pub use primitive::{MeshPrimitive, NormalPrimvar, Purpose};
pub use registry::{Geometry, KeyStrategy, ModelKey, ModelRegistry, Registration};
pub use scene::{SceneSource, open_scene};
