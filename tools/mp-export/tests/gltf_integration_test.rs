//! glTF integration tests
//!
//! Writes a small .gltf + .bin pair in which one mesh is referenced by two
//! nodes under a translated parent, then converts it.

use std::path::{Path, PathBuf};

use mp_export::{ExportOptions, load_container, read_container};
use tempfile::tempdir;

const POSITIONS: [[f32; 3]; 4] = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]];
const INDICES: [u16; 6] = [0, 1, 2, 0, 2, 3];

const GLTF: &str = r#"{
    "asset": { "version": "2.0" },
    "scene": 0,
    "scenes": [ { "nodes": [0] } ],
    "nodes": [
        { "name": "World", "translation": [0.0, 2.0, 0.0], "children": [1, 2, 3] },
        { "name": "A", "mesh": 0, "translation": [1.0, 0.0, 0.0] },
        { "name": "B", "mesh": 0, "translation": [0.0, 0.0, 5.0] },
        { "name": "Lines", "mesh": 1 }
    ],
    "meshes": [
        {
            "name": "Crate",
            "primitives": [ { "attributes": { "POSITION": 0, "NORMAL": 1 }, "indices": 2 } ]
        },
        {
            "name": "Wire",
            "primitives": [ { "attributes": { "POSITION": 0 }, "mode": 1 } ]
        }
    ],
    "buffers": [ { "uri": "scene.bin", "byteLength": 108 } ],
    "bufferViews": [
        { "buffer": 0, "byteOffset": 0, "byteLength": 48, "target": 34962 },
        { "buffer": 0, "byteOffset": 48, "byteLength": 48, "target": 34962 },
        { "buffer": 0, "byteOffset": 96, "byteLength": 12, "target": 34963 }
    ],
    "accessors": [
        { "bufferView": 0, "componentType": 5126, "count": 4, "type": "VEC3",
          "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0] },
        { "bufferView": 1, "componentType": 5126, "count": 4, "type": "VEC3" },
        { "bufferView": 2, "componentType": 5123, "count": 6, "type": "SCALAR" }
    ]
}"#;

fn write_scene(dir: &Path) -> PathBuf {
    let mut bin = Vec::with_capacity(108);
    for p in POSITIONS {
        for c in p {
            bin.extend_from_slice(&c.to_le_bytes());
        }
    }
    for _ in 0..4 {
        for c in [0.0f32, 0.0, 1.0] {
            bin.extend_from_slice(&c.to_le_bytes());
        }
    }
    for i in INDICES {
        bin.extend_from_slice(&i.to_le_bytes());
    }
    assert_eq!(bin.len(), 108);

    std::fs::write(dir.join("scene.bin"), bin).expect("Failed to write buffer");
    let path = dir.join("scene.gltf");
    std::fs::write(&path, GLTF).expect("Failed to write glTF");
    path
}

/// One mesh on two nodes becomes one model with two composed transforms
#[test]
fn test_gltf_shared_mesh_is_instanced() {
    let dir = tempdir().expect("Failed to create temp dir");
    let input = write_scene(dir.path());
    let output = dir.path().join("scene.mp");

    let stats = mp_export::convert_scene(&input, &output, &ExportOptions::default())
        .expect("Conversion failed");
    assert_eq!(stats.models, 1);
    assert_eq!(stats.instances, 2);

    let models = load_container(&output).unwrap();
    assert_eq!(models.len(), 1);

    let model = &models[0];
    assert_eq!(model.vertices, POSITIONS.to_vec());
    assert_eq!(model.indices, INDICES.to_vec());
    assert_eq!(model.normals, vec![[0.0, 0.0, 1.0]; 4]);

    // Parent translation composed with each child's, in row 3
    assert_eq!(model.instances[0][3], [1.0, 2.0, 0.0, 1.0]);
    assert_eq!(model.instances[1][3], [0.0, 2.0, 5.0, 1.0]);
    assert_eq!(model.instances[0][0], [1.0, 0.0, 0.0, 0.0]);
}

/// Primitive paths follow the node hierarchy
#[test]
fn test_gltf_primitive_paths() {
    let dir = tempdir().expect("Failed to create temp dir");
    let input = write_scene(dir.path());

    let mut source = mp_export::open_scene(&input).unwrap();
    let mut paths = Vec::new();
    source
        .visit(&mut |prim| {
            paths.push(prim.path);
            Ok(())
        })
        .unwrap();

    // The line-list primitive on "Lines" is skipped
    assert_eq!(paths, vec!["/World/A/Crate_0", "/World/B/Crate_0"]);
}

/// Scale reaches vertices and translations through the glTF path
#[test]
fn test_gltf_scaled_export() {
    let dir = tempdir().expect("Failed to create temp dir");
    let input = write_scene(dir.path());

    let options = ExportOptions {
        scale: 0.5,
        ..Default::default()
    };
    let exporter = mp_export::collect_scene(&input, &options).unwrap();
    let models = read_container(&exporter.pack().unwrap()).unwrap();

    assert_eq!(models[0].vertices[2], [0.5, 0.5, 0.0]);
    assert_eq!(models[0].instances[1][3], [0.0, 1.0, 2.5, 1.0]);
}

/// CLI end-to-end on a glTF input
#[test]
fn test_cli_convert_gltf() {
    let dir = tempdir().expect("Failed to create temp dir");
    let input = write_scene(dir.path());
    let output = dir.path().join("out.mp");

    let status = std::process::Command::new(env!("CARGO_BIN_EXE_mp-export"))
        .args([
            "convert",
            input.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
            "--include",
            "/World/A",
        ])
        .status()
        .expect("Failed to run mp-export");
    assert!(status.success(), "mp-export convert command failed");

    let models = load_container(&output).unwrap();
    assert_eq!(models.len(), 1);
    assert_eq!(models[0].instances.len(), 1);
}
