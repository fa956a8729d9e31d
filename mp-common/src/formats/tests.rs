//! Tests for the container packer and reader

use super::*;
use crate::error::FormatError;
use crate::model::{IDENTITY, MAX_VERTEX_COUNT, Model, RowMajorMatrix};

fn translation(x: f32, y: f32, z: f32) -> RowMajorMatrix {
    let mut m = IDENTITY;
    m[3] = [x, y, z, 1.0];
    m
}

fn quad_model() -> Model {
    let mut model = Model::new(
        vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
        ],
        vec![0, 1, 2, 0, 2, 3],
        vec![[0.0, 0.0, 1.0]; 4],
        IDENTITY,
    );
    model.instances.push(translation(5.0, 0.0, -2.5));
    model
}

fn triangle_model() -> Model {
    Model::new(
        vec![[-0.5, 0.0, 0.0], [0.5, 0.0, 0.0], [0.0, 1.0, 0.1]],
        vec![0, 1, 2],
        Vec::new(),
        translation(0.0, 3.0, 0.0),
    )
}

#[test]
fn test_empty_container_is_six_bytes() {
    let bytes = pack_container(&[]).unwrap();
    assert_eq!(bytes, vec![0x50, 0x4D, 0, 0, 0, 0]);

    let models = read_container(&bytes).unwrap();
    assert!(models.is_empty());
}

#[test]
fn test_roundtrip_is_bit_exact() {
    let mut odd = triangle_model();
    odd.vertices[0] = [f32::MIN_POSITIVE, -0.0, 1.0e-38];
    odd.instances[0][1][2] = f32::EPSILON;

    let models = vec![quad_model(), odd, triangle_model()];
    let bytes = pack_container(&models).unwrap();
    let parsed = read_container(&bytes).unwrap();

    assert_eq!(parsed.len(), models.len());
    for (a, b) in models.iter().zip(&parsed) {
        assert_eq!(a.header(), b.header());
        assert_eq!(a.indices, b.indices);
        let bits = |v: &[[f32; 3]]| v.iter().flatten().map(|f| f.to_bits()).collect::<Vec<_>>();
        assert_eq!(bits(&a.vertices), bits(&b.vertices));
        assert_eq!(bits(&a.normals), bits(&b.normals));
        assert_eq!(a.instances, b.instances);
    }
}

#[test]
fn test_object_layout() {
    let bytes = pack_container(&[triangle_model()]).unwrap();

    assert_eq!(&bytes[0..2], &MP_MAGIC.to_le_bytes());
    assert_eq!(&bytes[2..6], &1u32.to_le_bytes());
    assert_eq!(&bytes[6..10], &0u32.to_le_bytes());

    let object = &bytes[10..];
    assert_eq!(&object[0..4], &3u32.to_le_bytes()); // vertices
    assert_eq!(&object[4..8], &3u32.to_le_bytes()); // indices
    assert_eq!(&object[8..12], &0u32.to_le_bytes()); // normals
    assert_eq!(&object[12..16], &1u32.to_le_bytes()); // instances
    assert_eq!(&object[16..20], &(-0.5f32).to_le_bytes());

    // indices follow the 9 vertex floats
    let idx = 16 + 36;
    assert_eq!(&object[idx..idx + 6], &[0, 0, 1, 0, 2, 0]);

    // row-major matrix: translation y sits at float 13
    let m = idx + 6;
    assert_eq!(&object[m + 13 * 4..m + 14 * 4], &3.0f32.to_le_bytes());
    assert_eq!(object.len(), m + 64);
}

#[test]
fn test_offsets_are_prefix_sums() {
    let models = vec![quad_model(), triangle_model(), quad_model()];
    let offsets = compute_offsets(&models).unwrap();

    let quad = quad_model().packed_size() as u32;
    let tri = triangle_model().packed_size() as u32;
    assert_eq!(offsets, vec![0, quad, quad + tri]);
    assert!(offsets.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn test_view_random_access() {
    let models = vec![quad_model(), triangle_model()];
    let bytes = pack_container(&models).unwrap();
    let view = ContainerView::parse(&bytes).unwrap();

    assert_eq!(view.object_count(), 2);
    assert_eq!(view.object(1).unwrap(), models[1]);
    assert_eq!(view.object(0).unwrap(), models[0]);
    assert_eq!(view.object_header(0).unwrap().instance_count, 2);
    assert!(view.check_offsets().unwrap().is_empty());
    assert!(matches!(
        view.object(2),
        Err(FormatError::ObjectOutOfRange { index: 2, count: 2 })
    ));
}

#[test]
fn test_reader_ignores_offset_table_when_streaming() {
    let models = vec![quad_model(), triangle_model()];
    let mut bytes = pack_container(&models).unwrap();

    // Corrupt the second offset; sequential reading still uses the counts
    bytes[10..14].copy_from_slice(&7u32.to_le_bytes());
    assert_eq!(read_container(&bytes).unwrap(), models);

    let view = ContainerView::parse(&bytes).unwrap();
    let mismatches = view.check_offsets().unwrap();
    assert_eq!(mismatches.len(), 1);
    assert_eq!(mismatches[0].index, 1);
    assert_eq!(mismatches[0].recorded, 7);
}

#[test]
fn test_bad_magic_rejected() {
    let mut bytes = pack_container(&[triangle_model()]).unwrap();
    bytes[0] = 0x00;

    match read_container(&bytes) {
        Err(FormatError::BadMagic { expected, found }) => {
            assert_eq!(expected, MP_MAGIC);
            assert_eq!(found, 0x4D00);
        }
        other => panic!("expected BadMagic, got {other:?}"),
    }
}

#[test]
fn test_truncated_container_rejected() {
    let bytes = pack_container(&[quad_model()]).unwrap();

    assert!(matches!(
        read_container(&bytes[..1]),
        Err(FormatError::UnexpectedEof { context: "magic", .. })
    ));
    assert!(matches!(
        read_container(&bytes[..bytes.len() - 1]),
        Err(FormatError::UnexpectedEof { context: "instances", .. })
    ));
}

#[test]
fn test_packer_rejects_index_overflow() {
    let big = Model::new(
        vec![[0.0; 3]; MAX_VERTEX_COUNT + 1],
        vec![0, 1, 2],
        Vec::new(),
        IDENTITY,
    );
    assert!(matches!(
        pack_container(&[triangle_model(), big]),
        Err(FormatError::IndexOverflow { .. })
    ));
}

#[test]
fn test_packer_accepts_vertex_ceiling() {
    let at_limit = Model::new(
        vec![[0.0; 3]; MAX_VERTEX_COUNT],
        vec![0, 1, (MAX_VERTEX_COUNT - 1) as u16],
        Vec::new(),
        IDENTITY,
    );
    let bytes = pack_container(std::slice::from_ref(&at_limit)).unwrap();
    let parsed = read_container(&bytes).unwrap();
    assert_eq!(parsed[0].vertex_count(), MAX_VERTEX_COUNT);
}

#[test]
fn test_save_and_load_container() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scene.mp");
    let models = vec![quad_model(), triangle_model()];

    let written = save_container(&path, &models).unwrap();
    assert_eq!(written, std::fs::metadata(&path).unwrap().len());
    assert!(!dir.path().join("scene.mp.tmp").exists());
    assert_eq!(load_container(&path).unwrap(), models);
}

#[test]
fn test_failed_save_leaves_no_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.mp");
    let mut bad = triangle_model();
    bad.instances.clear();

    assert!(matches!(
        save_container(&path, &[bad]),
        Err(FormatError::NoInstances)
    ));
    assert!(!path.exists());
    assert!(!dir.path().join("broken.mp.tmp").exists());
}
