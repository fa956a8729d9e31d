//! glTF / GLB scene adapter
//!
//! Walks the default scene's node hierarchy, composing parent and local
//! transforms. Every triangle-list primitive of every mesh-bearing node is
//! yielded, so a mesh referenced by several nodes arrives once per node.

use std::path::Path;

use glam::Mat4;
use gltf::mesh::Mode;

use super::SceneSource;
use crate::error::ExportError;
use crate::primitive::MeshPrimitive;

pub struct GltfScene {
    document: gltf::Document,
    buffers: Vec<gltf::buffer::Data>,
}

impl GltfScene {
    pub fn open(path: &Path) -> Result<Self, ExportError> {
        let (document, buffers, _images) = gltf::import(path)
            .map_err(|e| ExportError::scene(path, format!("Failed to load glTF: {e}")))?;

        tracing::debug!(
            "Loaded glTF {:?}: {} nodes, {} meshes",
            path,
            document.nodes().len(),
            document.meshes().len()
        );
        Ok(Self { document, buffers })
    }

    fn visit_node(
        &self,
        node: gltf::Node<'_>,
        parent: Mat4,
        parent_path: &str,
        f: &mut dyn FnMut(MeshPrimitive) -> Result<(), ExportError>,
    ) -> Result<(), ExportError> {
        let local = Mat4::from_cols_array_2d(&node.transform().matrix());
        let world = parent * local;
        let path = format!("{parent_path}/{}", node_name(&node));

        if let Some(mesh) = node.mesh() {
            let mesh_name = mesh
                .name()
                .map(sanitize)
                .unwrap_or_else(|| format!("mesh_{}", mesh.index()));
            let skinned_node = node.skin().is_some();

            for primitive in mesh.primitives() {
                let prim_path = format!("{path}/{mesh_name}_{}", primitive.index());
                if primitive.mode() != Mode::Triangles {
                    tracing::warn!(
                        "Unsupported primitive mode {:?} in {}, skipping",
                        primitive.mode(),
                        prim_path
                    );
                    continue;
                }

                let reader = primitive.reader(|buffer| Some(&self.buffers[buffer.index()]));

                let Some(positions) = reader.read_positions() else {
                    tracing::warn!("Primitive {} has no positions, skipping", prim_path);
                    continue;
                };
                let points: Vec<[f32; 3]> = positions.collect();

                let indices: Vec<u32> = match reader.read_indices() {
                    Some(iter) => iter.into_u32().collect(),
                    None => (0..points.len() as u32).collect(),
                };
                let counts = vec![3u32; indices.len() / 3];

                let normals: Option<Vec<[f32; 3]>> = reader.read_normals().map(|n| n.collect());
                let skinned = skinned_node || reader.read_joints(0).is_some();

                let mut prim = MeshPrimitive::new(prim_path, points, counts, indices.clone())
                    .with_transform(world.to_cols_array_2d());
                if let Some(values) = normals {
                    // glTF normals are per vertex, so the corner → normal map is the index buffer
                    prim = prim.with_normals(values, Some(indices));
                }
                prim.skinned = skinned;

                f(prim)?;
            }
        }

        for child in node.children() {
            self.visit_node(child, world, &path, f)?;
        }
        Ok(())
    }
}

impl SceneSource for GltfScene {
    fn visit(
        &mut self,
        f: &mut dyn FnMut(MeshPrimitive) -> Result<(), ExportError>,
    ) -> Result<(), ExportError> {
        let Some(scene) = self
            .document
            .default_scene()
            .or_else(|| self.document.scenes().next())
        else {
            tracing::warn!("glTF document has no scenes, nothing to export");
            return Ok(());
        };

        for node in scene.nodes() {
            self.visit_node(node, Mat4::IDENTITY, "", f)?;
        }
        Ok(())
    }
}

fn node_name(node: &gltf::Node<'_>) -> String {
    node.name()
        .map(sanitize)
        .unwrap_or_else(|| format!("node_{}", node.index()))
}

/// Path separators inside names would split segments
fn sanitize(name: &str) -> String {
    name.replace('/', "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize("Chair/Leg"), "Chair_Leg");
        assert_eq!(sanitize("plain"), "plain");
    }

    #[test]
    fn test_column_major_to_row_major_translation() {
        let m = Mat4::from_translation(glam::Vec3::new(1.0, 2.0, 3.0));
        let rows = m.to_cols_array_2d();
        assert_eq!(rows[3], [1.0, 2.0, 3.0, 1.0]);
    }

    #[test]
    fn test_missing_file() {
        let err = GltfScene::open(Path::new("/nonexistent/scene.gltf")).err().unwrap();
        assert!(matches!(err, ExportError::Scene { .. }));
    }
}
