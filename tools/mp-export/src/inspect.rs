//! Human-readable container inspection

use std::path::Path;

use anyhow::{Context, Result};
use mp_common::{ContainerView, FormatError, ObjectHeader, OffsetMismatch};

/// One object as seen through the offset table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectSummary {
    pub index: usize,
    pub offset: u32,
    pub header: ObjectHeader,
}

impl ObjectSummary {
    pub fn size(&self) -> u64 {
        self.header.packed_size()
    }
}

/// Counts for a whole container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSummary {
    pub file_size: usize,
    pub objects: Vec<ObjectSummary>,
    pub offset_mismatches: Vec<OffsetMismatch>,
}

impl ContainerSummary {
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    pub fn total_instances(&self) -> u64 {
        self.objects
            .iter()
            .map(|o| u64::from(o.header.instance_count))
            .sum()
    }

    pub fn total_triangles(&self) -> u64 {
        self.objects
            .iter()
            .map(|o| u64::from(o.header.index_count / 3))
            .sum()
    }

    pub fn offsets_ok(&self) -> bool {
        self.offset_mismatches.is_empty()
    }
}

/// Summarize container bytes without decoding vertex data.
pub fn summarize(bytes: &[u8]) -> Result<ContainerSummary, FormatError> {
    let view = ContainerView::parse(bytes)?;
    let offset_mismatches = view.check_offsets()?;

    let mut objects = Vec::with_capacity(view.object_count());
    for (index, &offset) in view.offsets().iter().enumerate() {
        // A bad table entry must not hide the object; read it sequentially instead
        let header = match offset_mismatches.iter().find(|m| m.index == index) {
            Some(mismatch) => sequential_header(&view, mismatch.actual)?,
            None => view.object_header(index)?,
        };
        objects.push(ObjectSummary {
            index,
            offset,
            header,
        });
    }

    Ok(ContainerSummary {
        file_size: bytes.len(),
        objects,
        offset_mismatches,
    })
}

fn sequential_header(view: &ContainerView<'_>, position: u64) -> Result<ObjectHeader, FormatError> {
    let data = view.data();
    let start = position as usize;
    data.get(start..)
        .and_then(ObjectHeader::from_bytes)
        .ok_or(FormatError::UnexpectedEof {
            context: "object header",
            needed: ObjectHeader::SIZE,
            available: data.len().saturating_sub(start),
        })
}

/// Log a container summary; with `verbose`, also every object's arrays.
pub fn inspect_file(path: &Path, verbose: bool) -> Result<ContainerSummary> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read {:?}", path))?;
    let summary =
        summarize(&bytes).with_context(|| format!("Failed to parse container {:?}", path))?;

    tracing::info!(
        "{:?}: {} bytes, {} objects, {} instances, {} triangles",
        path,
        summary.file_size,
        summary.object_count(),
        summary.total_instances(),
        summary.total_triangles()
    );

    for object in &summary.objects {
        let h = object.header;
        tracing::info!(
            "  [{}] @{}: {} vertices, {} indices, {} normals, {} instances ({} bytes)",
            object.index,
            object.offset,
            h.vertex_count,
            h.index_count,
            h.normal_count,
            h.instance_count,
            object.size()
        );
    }

    if summary.offsets_ok() {
        tracing::info!("Offset table OK");
    } else {
        for m in &summary.offset_mismatches {
            tracing::warn!(
                "Offset table entry {} records {} but the object starts at {}",
                m.index,
                m.recorded,
                m.actual
            );
        }
    }

    if verbose {
        let models = mp_common::read_container(&bytes)?;
        for (index, model) in models.iter().enumerate() {
            tracing::info!("Object {}", index);
            tracing::info!("  vertices:  {:?}", model.vertices);
            tracing::info!("  indices:   {:?}", model.indices);
            tracing::info!("  normals:   {:?}", model.normals);
            for (i, m) in model.instances.iter().enumerate() {
                tracing::info!("  instance {}: {:?}", i, m);
            }
        }
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mp_common::{IDENTITY, Model, pack_container};

    fn models() -> Vec<Model> {
        let tri = Model::new(
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            vec![0, 1, 2],
            vec![[0.0, 0.0, 1.0]; 3],
            IDENTITY,
        );
        let mut quad = Model::new(
            vec![[0.0; 3]; 4],
            vec![0, 1, 2, 0, 2, 3],
            Vec::new(),
            IDENTITY,
        );
        quad.instances.push(IDENTITY);
        vec![tri, quad]
    }

    #[test]
    fn test_summary_counts() {
        let bytes = pack_container(&models()).unwrap();
        let summary = summarize(&bytes).unwrap();

        assert_eq!(summary.object_count(), 2);
        assert_eq!(summary.total_instances(), 3);
        assert_eq!(summary.total_triangles(), 3);
        assert!(summary.offsets_ok());

        // 16 + 36 + 6 + 36 + 64
        assert_eq!(summary.objects[0].size(), 158);
        assert_eq!(summary.objects[1].offset, 158);
        assert_eq!(summary.file_size, 6 + 8 + 158 + (16 + 48 + 12 + 128));
    }

    #[test]
    fn test_summary_reports_bad_offset() {
        let mut bytes = pack_container(&models()).unwrap();
        // Second offset entry lives at bytes 10..14
        bytes[10..14].copy_from_slice(&999u32.to_le_bytes());

        let summary = summarize(&bytes).unwrap();
        assert!(!summary.offsets_ok());
        assert_eq!(summary.offset_mismatches[0].index, 1);
        assert_eq!(summary.objects[1].header.index_count, 6);
    }

    #[test]
    fn test_summary_rejects_bad_magic() {
        let mut bytes = pack_container(&models()).unwrap();
        bytes[0] = 0;
        assert!(matches!(summarize(&bytes), Err(FormatError::BadMagic { .. })));
    }
}
