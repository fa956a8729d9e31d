//! JSON export of a model registry, for debugging conversions

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use mp_common::RowMajorMatrix;
use serde::Serialize;

use crate::pipeline::{ExportOptions, collect_scene};
use crate::registry::ModelRegistry;

#[derive(Debug, Serialize)]
pub struct ModelDump<'a> {
    pub key: String,
    pub vertices: &'a [[f32; 3]],
    pub indices: &'a [u16],
    pub normals: &'a [[f32; 3]],
    pub instance_count: usize,
    pub instances: &'a [RowMajorMatrix],
}

/// Registry contents in insertion order
#[derive(Debug, Serialize)]
pub struct RegistryDump<'a> {
    pub models: Vec<ModelDump<'a>>,
}

impl<'a> RegistryDump<'a> {
    pub fn new(registry: &'a ModelRegistry) -> Self {
        let models = registry
            .iter()
            .map(|(key, model)| ModelDump {
                key: key.to_string(),
                vertices: &model.vertices,
                indices: &model.indices,
                normals: &model.normals,
                instance_count: model.instance_count(),
                instances: &model.instances,
            })
            .collect();
        Self { models }
    }
}

/// Pretty-printed JSON for a registry
pub fn registry_to_json(registry: &ModelRegistry) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&RegistryDump::new(registry))
}

/// Convert a scene and write its registry as JSON instead of a container.
///
/// Returns the number of models written.
pub fn dump_scene(input: &Path, output: &Path, options: &ExportOptions) -> Result<usize> {
    let exporter = collect_scene(input, options)
        .with_context(|| format!("Failed to convert scene {:?}", input))?;
    let registry = exporter.registry();

    let file =
        File::create(output).with_context(|| format!("Failed to create output: {:?}", output))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &RegistryDump::new(registry))
        .context("Failed to serialize registry")?;
    writer.flush()?;

    tracing::info!("Wrote {} models to {:?}", registry.len(), output);
    Ok(registry.len())
}
