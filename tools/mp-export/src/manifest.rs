//! Manifest parsing and batch conversion
//!
//! Parses a `meshpack.toml` and converts every listed scene into a container.
//!
//! ```toml
//! [output]
//! dir = "build/"
//!
//! [options]
//! scale = 0.01
//! key = "structural"
//!
//! [scenes]
//! hotel = "scenes/hotel.glb"
//! props = { path = "scenes/props.obj", scale = 1.0, include = ["/props/chairs"] }
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use mp_common::MP_EXTENSION;
use serde::Deserialize;

use crate::pipeline::{ExportOptions, ExportStats, convert_scene};
use crate::registry::KeyStrategy;

/// Root manifest structure
#[derive(Debug, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub options: ExportOptions,
    #[serde(default)]
    pub scenes: BTreeMap<String, SceneEntry>,
    /// Directory the manifest was loaded from; relative paths resolve against it
    #[serde(skip)]
    pub base_dir: PathBuf,
}

#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("build/")
}

/// Per-scene settings that override `[options]`
#[derive(Debug, Default, Deserialize)]
pub struct SceneOverrides {
    pub scale: Option<f32>,
    pub key: Option<KeyStrategy>,
    pub renormalize_normals: Option<bool>,
    pub compute_missing_normals: Option<bool>,
    pub include: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum SceneEntry {
    Simple(PathBuf),
    Detailed {
        path: PathBuf,
        #[serde(flatten)]
        overrides: SceneOverrides,
    },
}

impl SceneEntry {
    pub fn path(&self) -> &Path {
        match self {
            SceneEntry::Simple(p) => p,
            SceneEntry::Detailed { path, .. } => path,
        }
    }

    /// Manifest-wide options with this entry's overrides applied
    pub fn options(&self, base: &ExportOptions) -> ExportOptions {
        let mut options = base.clone();
        if let SceneEntry::Detailed { overrides, .. } = self {
            if let Some(scale) = overrides.scale {
                options.scale = scale;
            }
            if let Some(key) = overrides.key {
                options.key = key;
            }
            if let Some(renormalize) = overrides.renormalize_normals {
                options.renormalize_normals = renormalize;
            }
            if let Some(compute) = overrides.compute_missing_normals {
                options.compute_missing_normals = compute;
            }
            if let Some(include) = &overrides.include {
                options.include = include.clone();
            }
        }
        options
    }
}

impl Manifest {
    /// Source path of an entry, resolved against the manifest directory
    pub fn source_path(&self, entry: &SceneEntry) -> PathBuf {
        self.base_dir.join(entry.path())
    }

    pub fn output_dir(&self) -> PathBuf {
        self.base_dir.join(&self.output.dir)
    }
}

/// Load and parse a manifest file
pub fn load_manifest(path: &Path) -> Result<Manifest> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read manifest: {:?}", path))?;
    let mut manifest: Manifest = toml::from_str(&content)
        .with_context(|| format!("Failed to parse manifest: {:?}", path))?;
    manifest.base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
    Ok(manifest)
}

/// Validate a manifest without building
pub fn validate(manifest: &Manifest) -> Result<()> {
    if manifest.scenes.is_empty() {
        tracing::warn!("Manifest lists no scenes");
    }
    for (name, entry) in &manifest.scenes {
        let source = manifest.source_path(entry);
        if !source.exists() {
            anyhow::bail!("Scene '{}' source not found: {:?}", name, source);
        }
        let options = entry.options(&manifest.options);
        if !(options.scale.is_finite() && options.scale > 0.0) {
            anyhow::bail!("Scene '{}' has invalid scale {}", name, options.scale);
        }
    }
    Ok(())
}

/// Convert every scene in the manifest
///
/// Returns per-scene stats in manifest (name) order.
pub fn build_all(
    manifest: &Manifest,
    output_override: Option<&Path>,
) -> Result<Vec<(String, ExportStats)>> {
    validate(manifest)?;

    let output_dir = match output_override {
        Some(dir) => dir.to_path_buf(),
        None => manifest.output_dir(),
    };
    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create output directory: {:?}", output_dir))?;

    let mut results = Vec::with_capacity(manifest.scenes.len());
    for (name, entry) in &manifest.scenes {
        let input = manifest.source_path(entry);
        let output = output_dir.join(format!("{}.{}", name, MP_EXTENSION));
        tracing::info!("Converting scene: {} -> {:?}", name, output);

        let options = entry.options(&manifest.options);
        let stats = convert_scene(&input, &output, &options)
            .with_context(|| format!("Failed to convert scene '{}'", name))?;
        results.push((name.clone(), stats));
    }

    Ok(results)
}
