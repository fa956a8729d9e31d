//! Scene adapters
//!
//! Each adapter reads one scene format and yields [`MeshPrimitive`]s in
//! traversal order.

pub mod gltf;
pub mod json;
pub mod obj;

use std::path::Path;

use crate::error::ExportError;
use crate::primitive::MeshPrimitive;

pub use self::gltf::GltfScene;
pub use self::json::JsonScene;
pub use self::obj::ObjScene;

/// A traversable source of mesh primitives
pub trait SceneSource {
    /// Hand every primitive to `f`, stopping at the first error.
    fn visit(
        &mut self,
        f: &mut dyn FnMut(MeshPrimitive) -> Result<(), ExportError>,
    ) -> Result<(), ExportError>;
}

/// Open a scene file, choosing the adapter by extension.
pub fn open_scene(path: &Path) -> Result<Box<dyn SceneSource>, ExportError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|s| s.to_lowercase())
        .unwrap_or_default();

    tracing::debug!("Opening {:?} scene {:?}", ext, path);

    match ext.as_str() {
        "gltf" | "glb" => Ok(Box::new(GltfScene::open(path)?)),
        "obj" => Ok(Box::new(ObjScene::open(path)?)),
        "json" => Ok(Box::new(JsonScene::open(path)?)),
        _ => Err(ExportError::UnsupportedInput(path.to_path_buf())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_extension() {
        let err = open_scene(Path::new("scene.usda")).err().unwrap();
        assert!(matches!(err, ExportError::UnsupportedInput(_)));

        let err = open_scene(Path::new("no_extension")).err().unwrap();
        assert!(matches!(err, ExportError::UnsupportedInput(_)));
    }

    #[test]
    fn test_missing_file_is_scene_error() {
        let err = open_scene(Path::new("/nonexistent/dir/scene.OBJ")).err().unwrap();
        assert!(matches!(err, ExportError::Scene { .. }));
    }
}
