//! Scene → registry → container pipeline
//!
//! [`Exporter`] owns the registry for one conversion. Scene adapters feed it
//! primitives one at a time; filtering, key derivation, triangulation, normal
//! resolution and scaling all happen here.

use std::path::Path;

use mp_common::{MAX_VERTEX_COUNT, RowMajorMatrix, pack_container, save_container};
use serde::Deserialize;

use crate::error::{ExportError, TopologyError};
use crate::normals::{self, NormalOptions, NormalSource};
use crate::primitive::MeshPrimitive;
use crate::registry::{Geometry, KeyStrategy, ModelRegistry, Registration};
use crate::scene::{self, SceneSource};

/// Conversion options, shared by the CLI and the manifest `[options]` table
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    /// Uniform scale applied to positions and instance translations
    pub scale: f32,
    /// How primitives are matched for instancing
    pub key: KeyStrategy,
    /// Rescale averaged normals to unit length
    pub renormalize_normals: bool,
    /// Compute face normals for primitives without authored normals
    pub compute_missing_normals: bool,
    /// Only export primitives under these scene paths (empty = everything)
    pub include: Vec<String>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            scale: 1.0,
            key: KeyStrategy::Structural,
            renormalize_normals: false,
            compute_missing_normals: true,
            include: Vec::new(),
        }
    }
}

impl ExportOptions {
    fn normal_options(&self) -> NormalOptions {
        NormalOptions {
            compute_missing: self.compute_missing_normals,
            renormalize: self.renormalize_normals,
        }
    }

    fn includes(&self, prim: &MeshPrimitive) -> bool {
        self.include.is_empty() || self.include.iter().any(|prefix| prim.is_under(prefix))
    }
}

/// Counters collected while converting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportStats {
    pub primitives: usize,
    pub skipped_guide: usize,
    pub skipped_skinned: usize,
    pub skipped_filtered: usize,
    pub models: usize,
    pub instances: usize,
    pub triangles: usize,
    pub bytes_written: u64,
}

impl ExportStats {
    pub fn skipped(&self) -> usize {
        self.skipped_guide + self.skipped_skinned + self.skipped_filtered
    }
}

/// Builds a [`ModelRegistry`] from a stream of primitives
#[derive(Debug, Default)]
pub struct Exporter {
    options: ExportOptions,
    registry: ModelRegistry,
    stats: ExportStats,
}

impl Exporter {
    pub fn new(options: ExportOptions) -> Self {
        Self {
            options,
            registry: ModelRegistry::new(),
            stats: ExportStats::default(),
        }
    }

    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub fn stats(&self) -> ExportStats {
        self.stats
    }

    /// Feed one primitive.
    ///
    /// Returns `None` when the primitive was skipped (guide purpose, skinned,
    /// or outside the include prefixes).
    pub fn add_primitive(
        &mut self,
        prim: MeshPrimitive,
    ) -> Result<Option<Registration>, ExportError> {
        self.stats.primitives += 1;

        if prim.is_guide() {
            tracing::debug!("Skipping guide primitive {}", prim.path);
            self.stats.skipped_guide += 1;
            return Ok(None);
        }
        if prim.skinned {
            tracing::debug!("Skipping skinned primitive {}", prim.path);
            self.stats.skipped_skinned += 1;
            return Ok(None);
        }
        if !self.options.includes(&prim) {
            self.stats.skipped_filtered += 1;
            return Ok(None);
        }

        let key = self.options.key.key_for(&prim);
        let transform = scale_transform(&prim.world_transform, self.options.scale);
        let options = &self.options;
        let registration = self
            .registry
            .register(key, || build_geometry(&prim, options), transform)?;

        match registration {
            Registration::Created(index) => {
                let model = &self.registry.models()[index];
                self.stats.models += 1;
                self.stats.triangles += model.triangle_count();
                tracing::debug!(
                    "New model #{} from {}: {} vertices, {} triangles, {} normals",
                    index,
                    prim.path,
                    model.vertex_count(),
                    model.triangle_count(),
                    model.normal_count()
                );
            }
            Registration::Instanced {
                index,
                instance_count,
            } => {
                tracing::debug!(
                    "Instanced model #{} from {} ({} instances)",
                    index,
                    prim.path,
                    instance_count
                );
            }
        }
        self.stats.instances += 1;

        Ok(Some(registration))
    }

    /// Feed every primitive a scene source yields.
    pub fn add_scene(&mut self, source: &mut dyn SceneSource) -> Result<(), ExportError> {
        source.visit(&mut |prim| self.add_primitive(prim).map(|_| ()))
    }

    /// Pack the registry into container bytes.
    pub fn pack(&self) -> Result<Vec<u8>, ExportError> {
        Ok(pack_container(self.registry.models())?)
    }

    pub fn finish(self) -> (ModelRegistry, ExportStats) {
        (self.registry, self.stats)
    }
}

/// Triangulate, resolve normals and scale one primitive.
///
/// Normals are computed from the unscaled points.
pub fn build_geometry(
    prim: &MeshPrimitive,
    options: &ExportOptions,
) -> Result<Geometry, ExportError> {
    let vertex_count = prim.points.len();
    if vertex_count > MAX_VERTEX_COUNT {
        return Err(ExportError::IndexOverflow {
            primitive: prim.path.clone(),
            vertex_count,
            max: MAX_VERTEX_COUNT,
        });
    }
    if let Some((position, &index)) = prim
        .face_vertex_indices
        .iter()
        .enumerate()
        .find(|&(_, &i)| i as usize >= vertex_count)
    {
        return Err(ExportError::malformed(
            &prim.path,
            TopologyError(format!(
                "face vertex index {index} at position {position} is out of range for {vertex_count} points"
            )),
        ));
    }

    let source = NormalSource::select(prim.normals.as_ref());
    let resolved = normals::resolve(
        source,
        &prim.face_vertex_counts,
        &prim.face_vertex_indices,
        &prim.points,
        options.normal_options(),
    )
    .map_err(|e| ExportError::malformed(&prim.path, e))?;

    tracing::trace!("{}: {} normals", prim.path, source.label());

    let scale = options.scale;
    let vertices = prim
        .points
        .iter()
        .map(|&[x, y, z]| [x * scale, y * scale, z * scale])
        .collect();

    // Bounds were checked above, so every index fits in u16
    let indices = resolved.indices.iter().map(|&i| i as u16).collect();

    Ok(Geometry {
        vertices,
        indices,
        normals: resolved.normals,
    })
}

/// Scale the translation row (row 3, columns 0..3) of a row-major transform.
pub fn scale_transform(transform: &RowMajorMatrix, scale: f32) -> RowMajorMatrix {
    let mut out = *transform;
    for value in &mut out[3][..3] {
        *value *= scale;
    }
    out
}

/// Read a scene and run it through an [`Exporter`].
pub fn collect_scene(input: &Path, options: &ExportOptions) -> Result<Exporter, ExportError> {
    let mut source = scene::open_scene(input)?;
    let mut exporter = Exporter::new(options.clone());
    exporter.add_scene(source.as_mut())?;
    Ok(exporter)
}

/// Convert a scene file into a container file.
pub fn convert_scene(
    input: &Path,
    output: &Path,
    options: &ExportOptions,
) -> Result<ExportStats, ExportError> {
    let exporter = collect_scene(input, options)?;
    let (registry, mut stats) = exporter.finish();

    stats.bytes_written = save_container(output, registry.models())?;

    tracing::info!(
        "Packed {} models ({} instances, {} triangles) into {:?}, {} bytes",
        stats.models,
        stats.instances,
        stats.triangles,
        output,
        stats.bytes_written
    );
    if stats.skipped() > 0 {
        tracing::info!(
            "Skipped {} primitives ({} guide, {} skinned, {} filtered)",
            stats.skipped(),
            stats.skipped_guide,
            stats.skipped_skinned,
            stats.skipped_filtered
        );
    }

    Ok(stats)
}
