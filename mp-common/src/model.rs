//! Canonical geometry for one structurally unique mesh.

use serde::{Deserialize, Serialize};

use crate::error::FormatError;
use crate::formats::ObjectHeader;

/// 4×4 transform stored as rows. The translation lives in row 3.
pub type RowMajorMatrix = [[f32; 4]; 4];

/// Identity transform
pub const IDENTITY: RowMajorMatrix = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0, 1.0],
];

/// Maximum vertices addressable by u16 indices
pub const MAX_VERTEX_COUNT: usize = u16::MAX as usize;

/// Triangulated geometry plus every placement of it in the scene.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Model {
    /// Positions, already scaled
    pub vertices: Vec<[f32; 3]>,
    /// Triangle list
    pub indices: Vec<u16>,
    /// Empty, or exactly one per vertex
    pub normals: Vec<[f32; 3]>,
    /// World transforms, one per instance
    pub instances: Vec<RowMajorMatrix>,
}

impl Model {
    pub fn new(
        vertices: Vec<[f32; 3]>,
        indices: Vec<u16>,
        normals: Vec<[f32; 3]>,
        transform: RowMajorMatrix,
    ) -> Self {
        Self {
            vertices,
            indices,
            normals,
            instances: vec![transform],
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    pub fn normal_count(&self) -> usize {
        self.normals.len()
    }

    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Header describing this model's counts.
    ///
    /// Call [`Model::validate`] first; counts above `u32::MAX` are not representable.
    pub fn header(&self) -> ObjectHeader {
        ObjectHeader::new(
            self.vertex_count() as u32,
            self.index_count() as u32,
            self.normal_count() as u32,
            self.instance_count() as u32,
        )
    }

    /// Number of bytes this model occupies in a container
    pub fn packed_size(&self) -> u64 {
        self.header().packed_size()
    }

    /// Check the invariants the packer relies on.
    pub fn validate(&self) -> Result<(), FormatError> {
        let vertex_count = self.vertex_count();
        if vertex_count > MAX_VERTEX_COUNT {
            return Err(FormatError::IndexOverflow {
                vertex_count,
                max: MAX_VERTEX_COUNT,
            });
        }
        if self.indices.len() % 3 != 0 {
            return Err(FormatError::MalformedTopology(format!(
                "index count {} is not a multiple of 3",
                self.indices.len()
            )));
        }
        if let Some((position, &index)) = self
            .indices
            .iter()
            .enumerate()
            .find(|&(_, &i)| i as usize >= vertex_count)
        {
            return Err(FormatError::MalformedTopology(format!(
                "index {index} at position {position} is out of range for {vertex_count} vertices"
            )));
        }
        if !self.normals.is_empty() && self.normals.len() != vertex_count {
            return Err(FormatError::InvalidNormalCount {
                normal_count: self.normals.len(),
                vertex_count,
            });
        }
        if self.instances.is_empty() {
            return Err(FormatError::NoInstances);
        }
        Ok(())
    }
}
