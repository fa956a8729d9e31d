//! Mesh primitive as handed over by a scene adapter

use mp_common::{IDENTITY, RowMajorMatrix};
use serde::{Deserialize, Serialize};

/// Imageable purpose of a scene node. `Guide` geometry is never exported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Purpose {
    #[default]
    Default,
    Render,
    Proxy,
    Guide,
}

/// Authored normals, optionally indexed per face corner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalPrimvar {
    pub values: Vec<[f32; 3]>,
    #[serde(default)]
    pub indices: Option<Vec<u32>>,
}

/// One renderable mesh occurrence in the traversed scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshPrimitive {
    /// Scene path, `/`-separated. The last segment is the primitive's name.
    pub path: String,
    /// Raw, unscaled positions
    pub points: Vec<[f32; 3]>,
    /// Corner count per polygon
    pub face_vertex_counts: Vec<u32>,
    /// Point index per polygon corner
    pub face_vertex_indices: Vec<u32>,
    #[serde(default)]
    pub normals: Option<NormalPrimvar>,
    /// Evaluated world transform, row-major with translation in row 3
    #[serde(default = "identity")]
    pub world_transform: RowMajorMatrix,
    #[serde(default)]
    pub purpose: Purpose,
    /// Bound to a skeleton; such primitives are skipped
    #[serde(default)]
    pub skinned: bool,
}

fn identity() -> RowMajorMatrix {
    IDENTITY
}

impl MeshPrimitive {
    pub fn new(
        path: impl Into<String>,
        points: Vec<[f32; 3]>,
        face_vertex_counts: Vec<u32>,
        face_vertex_indices: Vec<u32>,
    ) -> Self {
        Self {
            path: path.into(),
            points,
            face_vertex_counts,
            face_vertex_indices,
            normals: None,
            world_transform: IDENTITY,
            purpose: Purpose::Default,
            skinned: false,
        }
    }

    pub fn with_normals(mut self, values: Vec<[f32; 3]>, indices: Option<Vec<u32>>) -> Self {
        self.normals = Some(NormalPrimvar { values, indices });
        self
    }

    pub fn with_transform(mut self, transform: RowMajorMatrix) -> Self {
        self.world_transform = transform;
        self
    }

    /// Last segment of the path
    pub fn name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    pub fn is_guide(&self) -> bool {
        self.purpose == Purpose::Guide
    }

    /// Whether the path falls under `prefix` (segment-wise, so `/a` does not match `/ab`).
    pub fn is_under(&self, prefix: &str) -> bool {
        let prefix = prefix.trim_end_matches('/');
        if prefix.is_empty() {
            return true;
        }
        match self.path.strip_prefix(prefix) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }
}
