//! Per-vertex normal resolution
//!
//! Normals come from the first source that applies:
//!
//! 1. **Indexed** authored normals: value array plus a per-corner index array,
//!    walked in the original (pre-triangulation) face-vertex order.
//! 2. **Unindexed** authored normals: value `i` belongs to entry `i` of the
//!    triangulated index stream.
//! 3. **Face normals**: no authored normals, so each triangle's unit face
//!    normal is accumulated onto its three corners.
//!
//! Every tier averages the contributions per vertex (sum / count). Averages
//! are not renormalized unless asked for, so tiers 1 and 2 can yield
//! non-unit normals.

use glam::Vec3;

use crate::error::TopologyError;
use crate::primitive::NormalPrimvar;
use crate::triangulate::{check_counts, triangle_count, triangulate, triangulate_with};

/// Where a primitive's normals come from
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NormalSource<'a> {
    Indexed {
        values: &'a [[f32; 3]],
        indices: &'a [u32],
    },
    Unindexed {
        values: &'a [[f32; 3]],
    },
    None,
}

impl<'a> NormalSource<'a> {
    pub fn select(primvar: Option<&'a NormalPrimvar>) -> Self {
        match primvar {
            Some(NormalPrimvar {
                values,
                indices: Some(indices),
            }) => Self::Indexed { values, indices },
            Some(NormalPrimvar {
                values,
                indices: None,
            }) => Self::Unindexed { values },
            None => Self::None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Indexed { .. } => "indexed",
            Self::Unindexed { .. } => "unindexed",
            Self::None => "face",
        }
    }
}

/// Triangulated indices plus the resolved normals
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedMesh {
    pub indices: Vec<u32>,
    pub normals: Vec<[f32; 3]>,
}

/// Options for [`resolve`]
#[derive(Debug, Clone, Copy)]
pub struct NormalOptions {
    /// Compute face normals when nothing is authored
    pub compute_missing: bool,
    /// Scale averaged normals back to unit length
    pub renormalize: bool,
}

impl Default for NormalOptions {
    fn default() -> Self {
        Self {
            compute_missing: true,
            renormalize: false,
        }
    }
}

/// Triangulate a primitive and resolve its normals in the same step.
///
/// `points` must be the unscaled positions. Face vertex indices are expected to
/// be in range for `points`.
pub fn resolve(
    source: NormalSource<'_>,
    counts: &[u32],
    face_vertex_indices: &[u32],
    points: &[[f32; 3]],
    options: NormalOptions,
) -> Result<ResolvedMesh, TopologyError> {
    let vertex_count = points.len();

    let (indices, mut normals) = match source {
        NormalSource::Indexed { values, indices } => {
            let triangulated = triangulate(counts, face_vertex_indices)?;
            let normals = indexed_normals(face_vertex_indices, values, indices, vertex_count)?;
            (triangulated, normals)
        }
        NormalSource::Unindexed { values } => {
            let triangulated = triangulate(counts, face_vertex_indices)?;
            let normals = unindexed_normals(&triangulated, values, vertex_count)?;
            (triangulated, normals)
        }
        NormalSource::None if options.compute_missing => {
            face_normals(counts, face_vertex_indices, points)?
        }
        NormalSource::None => (triangulate(counts, face_vertex_indices)?, Vec::new()),
    };

    if options.renormalize {
        for n in &mut normals {
            *n = Vec3::from_array(*n).normalize_or_zero().to_array();
        }
    }

    Ok(ResolvedMesh { indices, normals })
}

/// Tier 1: average `values[normal_indices[i]]` onto `face_vertex_indices[i]`.
pub fn indexed_normals(
    face_vertex_indices: &[u32],
    values: &[[f32; 3]],
    normal_indices: &[u32],
    vertex_count: usize,
) -> Result<Vec<[f32; 3]>, TopologyError> {
    if normal_indices.len() != face_vertex_indices.len() {
        return Err(TopologyError(format!(
            "normal index array has {} entries but there are {} face vertices",
            normal_indices.len(),
            face_vertex_indices.len()
        )));
    }

    let mut acc = NormalAccumulator::new(vertex_count);
    for (&vertex, &normal_index) in face_vertex_indices.iter().zip(normal_indices) {
        let value = values.get(normal_index as usize).ok_or_else(|| {
            TopologyError(format!(
                "normal index {normal_index} out of range for {} normal values",
                values.len()
            ))
        })?;
        acc.add(vertex, Vec3::from_array(*value))?;
    }
    Ok(acc.average())
}

/// Tier 2: value `i` belongs to `triangulated[i]`; the lengths must match.
pub fn unindexed_normals(
    triangulated: &[u32],
    values: &[[f32; 3]],
    vertex_count: usize,
) -> Result<Vec<[f32; 3]>, TopologyError> {
    if values.len() != triangulated.len() {
        return Err(TopologyError(format!(
            "{} normal values do not match {} triangulated indices",
            values.len(),
            triangulated.len()
        )));
    }

    let mut acc = NormalAccumulator::new(vertex_count);
    for (&vertex, value) in triangulated.iter().zip(values) {
        acc.add(vertex, Vec3::from_array(*value))?;
    }
    Ok(acc.average())
}

/// Tier 3: triangulate and accumulate unit face normals in one pass.
///
/// Returns the triangulated indices alongside the averaged normals.
pub fn face_normals(
    counts: &[u32],
    face_vertex_indices: &[u32],
    points: &[[f32; 3]],
) -> Result<(Vec<u32>, Vec<[f32; 3]>), TopologyError> {
    check_counts(counts, face_vertex_indices)?;
    let mut acc = NormalAccumulator::new(points.len());
    let mut indices = Vec::with_capacity(triangle_count(counts) * 3);
    let mut failure = None;

    triangulate_with(counts, face_vertex_indices, |tri| {
        indices.extend_from_slice(&tri);
        if failure.is_some() {
            return;
        }
        let corner = |i: u32| points.get(i as usize).map(|p| Vec3::from_array(*p));
        let (Some(a), Some(b), Some(c)) = (corner(tri[0]), corner(tri[1]), corner(tri[2])) else {
            failure = Some(TopologyError(format!(
                "triangle {tri:?} references a point outside {} points",
                points.len()
            )));
            return;
        };
        // Zero-area triangles contribute a zero vector but still count
        let normal = (b - a).cross(c - a).normalize_or_zero();
        for &v in &tri {
            if let Err(e) = acc.add(v, normal) {
                failure = Some(e);
                return;
            }
        }
    })?;

    match failure {
        Some(e) => Err(e),
        None => Ok((indices, acc.average())),
    }
}

/// Running sum and contribution count per vertex
struct NormalAccumulator {
    sums: Vec<Vec3>,
    counts: Vec<u32>,
}

impl NormalAccumulator {
    fn new(vertex_count: usize) -> Self {
        Self {
            sums: vec![Vec3::ZERO; vertex_count],
            counts: vec![0; vertex_count],
        }
    }

    fn add(&mut self, vertex: u32, normal: Vec3) -> Result<(), TopologyError> {
        let i = vertex as usize;
        let (Some(sum), Some(count)) = (self.sums.get_mut(i), self.counts.get_mut(i)) else {
            return Err(TopologyError(format!(
                "vertex index {vertex} out of range for {} points",
                self.counts.len()
            )));
        };
        *sum += normal;
        *count += 1;
        Ok(())
    }

    /// One normal per vertex in index order; unreferenced vertices get zero.
    fn average(self) -> Vec<[f32; 3]> {
        self.sums
            .into_iter()
            .zip(self.counts)
            .map(|(sum, count)| match count {
                0 => [0.0; 3],
                n => (sum / n as f32).to_array(),
            })
            .collect()
    }
}
