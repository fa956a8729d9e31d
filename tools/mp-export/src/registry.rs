//! Model registry: deduplicates geometry and collects instances
//!
//! The first primitive seen for a key pays for triangulation and normal
//! resolution; every later one only appends its transform. Insertion order is
//! kept and becomes the container's object order.

use std::fmt;
use std::hash::Hasher;

use hashbrown::HashMap;
use mp_common::{Model, RowMajorMatrix};
use serde::Deserialize;
use xxhash_rust::xxh3::Xxh3;

use crate::primitive::MeshPrimitive;

/// Quantization step for content keys (positions are snapped to 1/QUANTIZE)
const QUANTIZE: f64 = 1.0e4;

/// Snap a coordinate to the content-key grid; saturates only past the i64
/// range (about 9.2e14 units).
fn quantize(c: f32) -> i64 {
    (c as f64 * QUANTIZE).round() as i64
}

/// Identity used to decide whether two primitives share geometry
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ModelKey {
    /// Name + raw point count + raw face-vertex-index count. Cheap, but distinct
    /// meshes that agree on all three collide.
    Structural {
        name: String,
        point_count: usize,
        index_count: usize,
    },
    /// xxh3 over quantized positions, topology and authored normals
    Content(u64),
}

impl fmt::Display for ModelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Structural {
                name,
                point_count,
                index_count,
            } => write!(f, "{name}_{point_count}_{index_count}"),
            Self::Content(hash) => write!(f, "xxh3_{hash:016x}"),
        }
    }
}

/// How [`ModelKey`]s are derived from primitives
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum KeyStrategy {
    #[default]
    Structural,
    Content,
}

impl KeyStrategy {
    pub fn key_for(self, prim: &MeshPrimitive) -> ModelKey {
        match self {
            Self::Structural => ModelKey::Structural {
                name: prim.name().to_string(),
                point_count: prim.points.len(),
                index_count: prim.face_vertex_indices.len(),
            },
            Self::Content => ModelKey::Content(content_hash(prim)),
        }
    }
}

fn content_hash(prim: &MeshPrimitive) -> u64 {
    let mut hasher = Xxh3::new();

    hasher.write_usize(prim.points.len());
    for p in &prim.points {
        for &c in p {
            hasher.write_i64(quantize(c));
        }
    }

    hasher.write_usize(prim.face_vertex_counts.len());
    for &n in &prim.face_vertex_counts {
        hasher.write_u32(n);
    }
    hasher.write_usize(prim.face_vertex_indices.len());
    for &i in &prim.face_vertex_indices {
        hasher.write_u32(i);
    }

    match &prim.normals {
        Some(normals) => {
            hasher.write_u8(1);
            for n in &normals.values {
                for &c in n {
                    hasher.write_i64(quantize(c));
                }
            }
            if let Some(indices) = &normals.indices {
                hasher.write_u8(1);
                for &i in indices {
                    hasher.write_u32(i);
                }
            }
        }
        None => hasher.write_u8(0),
    }

    hasher.finish()
}

/// Geometry produced by a registry builder; instances are added by the registry
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Geometry {
    pub vertices: Vec<[f32; 3]>,
    pub indices: Vec<u16>,
    pub normals: Vec<[f32; 3]>,
}

/// Outcome of [`ModelRegistry::register`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// New model built at this registry index
    Created(usize),
    /// Existing model gained an instance
    Instanced { index: usize, instance_count: usize },
}

/// Owned key → model table, in insertion order
#[derive(Debug, Default)]
pub struct ModelRegistry {
    keys: Vec<ModelKey>,
    models: Vec<Model>,
    lookup: HashMap<ModelKey, usize>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one occurrence of `key` placed at `transform`.
    ///
    /// `build` runs only when the key is new. If it fails the registry is left
    /// untouched and the error is returned.
    pub fn register<F, E>(
        &mut self,
        key: ModelKey,
        build: F,
        transform: RowMajorMatrix,
    ) -> Result<Registration, E>
    where
        F: FnOnce() -> Result<Geometry, E>,
    {
        if let Some(&index) = self.lookup.get(&key) {
            let model = &mut self.models[index];
            model.instances.push(transform);
            return Ok(Registration::Instanced {
                index,
                instance_count: model.instances.len(),
            });
        }

        let geometry = build()?;
        let index = self.models.len();
        self.models.push(Model::new(
            geometry.vertices,
            geometry.indices,
            geometry.normals,
            transform,
        ));
        self.keys.push(key.clone());
        self.lookup.insert(key, index);
        Ok(Registration::Created(index))
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn contains(&self, key: &ModelKey) -> bool {
        self.lookup.contains_key(key)
    }

    pub fn get(&self, key: &ModelKey) -> Option<&Model> {
        self.lookup.get(key).map(|&i| &self.models[i])
    }

    /// Models in insertion order
    pub fn models(&self) -> &[Model] {
        &self.models
    }

    /// Keys in insertion order
    pub fn keys(&self) -> &[ModelKey] {
        &self.keys
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ModelKey, &Model)> {
        self.keys.iter().zip(&self.models)
    }

    pub fn total_instances(&self) -> usize {
        self.models.iter().map(Model::instance_count).sum()
    }

    pub fn into_models(self) -> Vec<Model> {
        self.models
    }
}
