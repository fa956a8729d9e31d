//! Export error types

use std::io;
use std::path::PathBuf;

use mp_common::FormatError;

/// Topology problem found by the triangulator or normal resolver.
///
/// Carries no primitive identity; the pipeline attaches it when converting to
/// [`ExportError::MalformedTopology`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct TopologyError(pub String);

/// Error produced while converting a scene.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Malformed topology in '{primitive}': {reason}")]
    MalformedTopology { primitive: String, reason: String },

    #[error("'{primitive}' has {vertex_count} vertices, exceeding the 16-bit index limit of {max}")]
    IndexOverflow {
        primitive: String,
        vertex_count: usize,
        max: usize,
    },

    #[error("Failed to read scene {path:?}: {message}")]
    Scene { path: PathBuf, message: String },

    #[error("Unsupported scene format: {0:?} (use .gltf, .glb, .obj or .json)")]
    UnsupportedInput(PathBuf),

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl ExportError {
    pub fn malformed(primitive: &str, err: TopologyError) -> Self {
        Self::MalformedTopology {
            primitive: primitive.to_string(),
            reason: err.0,
        }
    }

    pub fn scene(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Scene {
            path: path.into(),
            message: message.into(),
        }
    }
}
