//! Container reader
//!
//! The magic tag is checked before anything else is trusted. Each object's
//! length is rebuilt from its own counts; the offset table is only used to
//! seek ([`ContainerView::object`]).

use std::path::Path;

use super::{
    BinarySerializable, ContainerHeader, INDEX_SIZE, INSTANCE_SIZE, MP_MAGIC, OFFSET_SIZE,
    ObjectHeader, VERTEX_SIZE,
};
use crate::error::FormatError;
use crate::model::{Model, RowMajorMatrix};

/// Parse every object of a container, sequentially.
pub fn read_container(bytes: &[u8]) -> Result<Vec<Model>, FormatError> {
    let view = ContainerView::parse(bytes)?;
    let mut cursor = Cursor::new(view.data());
    let mut models = Vec::with_capacity(view.object_count());
    for _ in 0..view.object_count() {
        models.push(cursor.read_object()?);
    }
    Ok(models)
}

/// Read and parse a container file
pub fn load_container(path: &Path) -> Result<Vec<Model>, FormatError> {
    let bytes = std::fs::read(path)?;
    read_container(&bytes)
}

/// Random-access view over a container held in memory.
#[derive(Debug)]
pub struct ContainerView<'a> {
    header: ContainerHeader,
    offsets: Vec<u32>,
    data: &'a [u8],
}

impl<'a> ContainerView<'a> {
    /// Verify the magic tag and read the object count and offset table.
    pub fn parse(bytes: &'a [u8]) -> Result<Self, FormatError> {
        let mut cursor = Cursor::new(bytes);

        let magic = cursor.read_u16("magic")?;
        if magic != MP_MAGIC {
            return Err(FormatError::BadMagic {
                expected: MP_MAGIC,
                found: magic,
            });
        }

        let object_count = cursor.read_u32("object count")?;
        let header = ContainerHeader {
            magic,
            object_count,
        };

        let table = cursor.take(checked_len(object_count as usize, OFFSET_SIZE)?, "offset table")?;
        let offsets = table
            .chunks_exact(OFFSET_SIZE)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();

        Ok(Self {
            header,
            offsets,
            data: cursor.remaining(),
        })
    }

    pub fn header(&self) -> ContainerHeader {
        self.header
    }

    pub fn object_count(&self) -> usize {
        self.header.object_count as usize
    }

    /// Offsets relative to the start of the object data region
    pub fn offsets(&self) -> &[u32] {
        &self.offsets
    }

    /// Object data region
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Seek to object `index` through the offset table and parse it.
    pub fn object(&self, index: usize) -> Result<Model, FormatError> {
        let start = self.seek(index)?;
        Cursor::new(&self.data[start..]).read_object()
    }

    /// Read only the counts of object `index`.
    pub fn object_header(&self, index: usize) -> Result<ObjectHeader, FormatError> {
        let start = self.seek(index)?;
        Cursor::new(&self.data[start..]).read_header()
    }

    /// Walk the objects using their counts and check that the offset table
    /// agrees with the sizes found.
    pub fn check_offsets(&self) -> Result<Vec<OffsetMismatch>, FormatError> {
        let mut cursor = Cursor::new(self.data);
        let mut mismatches = Vec::new();

        for (index, &recorded) in self.offsets.iter().enumerate() {
            let actual = cursor.position() as u64;
            if u64::from(recorded) != actual {
                mismatches.push(OffsetMismatch {
                    index,
                    recorded,
                    actual,
                });
            }
            let header = cursor.read_header()?;
            cursor.skip(header.body_size(), "object body")?;
        }

        Ok(mismatches)
    }

    fn seek(&self, index: usize) -> Result<usize, FormatError> {
        let offset = *self
            .offsets
            .get(index)
            .ok_or(FormatError::ObjectOutOfRange {
                index,
                count: self.offsets.len(),
            })?;
        let start = offset as usize;
        if start > self.data.len() {
            return Err(FormatError::OffsetOutOfBounds {
                index,
                offset,
                len: self.data.len(),
            });
        }
        Ok(start)
    }
}

/// Offset table entry that disagrees with the object sizes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OffsetMismatch {
    pub index: usize,
    pub recorded: u32,
    pub actual: u64,
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn position(&self) -> usize {
        self.pos
    }

    fn remaining(&self) -> &'a [u8] {
        &self.bytes[self.pos..]
    }

    fn take(&mut self, len: usize, context: &'static str) -> Result<&'a [u8], FormatError> {
        let available = self.bytes.len() - self.pos;
        if len > available {
            return Err(FormatError::UnexpectedEof {
                context,
                needed: len,
                available,
            });
        }
        let slice = &self.bytes[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    fn skip(&mut self, len: u64, context: &'static str) -> Result<(), FormatError> {
        let len = usize::try_from(len).map_err(|_| FormatError::TooLarge)?;
        self.take(len, context).map(|_| ())
    }

    fn read_u16(&mut self, context: &'static str) -> Result<u16, FormatError> {
        let b = self.take(2, context)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    fn read_u32(&mut self, context: &'static str) -> Result<u32, FormatError> {
        let b = self.take(4, context)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn read_header(&mut self) -> Result<ObjectHeader, FormatError> {
        let bytes = self.take(ObjectHeader::SIZE, "object header")?;
        // Length checked by take()
        ObjectHeader::deserialize(bytes).ok_or(FormatError::UnexpectedEof {
            context: "object header",
            needed: ObjectHeader::SIZE,
            available: bytes.len(),
        })
    }

    fn read_f32s(&mut self, count: usize, context: &'static str) -> Result<Vec<f32>, FormatError> {
        let bytes = self.take(checked_len(count, 4)?, context)?;
        Ok(bytes
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect())
    }

    fn read_vec3s(&mut self, count: usize, context: &'static str) -> Result<Vec<[f32; 3]>, FormatError> {
        let bytes = self.take(checked_len(count, VERTEX_SIZE as usize)?, context)?;
        Ok(bytes
            .chunks_exact(VERTEX_SIZE as usize)
            .map(|c| {
                let f = |i: usize| f32::from_le_bytes([c[i], c[i + 1], c[i + 2], c[i + 3]]);
                [f(0), f(4), f(8)]
            })
            .collect())
    }

    fn read_object(&mut self) -> Result<Model, FormatError> {
        let header = self.read_header()?;

        let vertices = self.read_vec3s(header.vertex_count as usize, "vertices")?;

        let index_bytes = self.take(
            checked_len(header.index_count as usize, INDEX_SIZE as usize)?,
            "indices",
        )?;
        let indices = index_bytes
            .chunks_exact(INDEX_SIZE as usize)
            .map(|c| u16::from_le_bytes([c[0], c[1]]))
            .collect();

        let normals = self.read_vec3s(header.normal_count as usize, "normals")?;

        let matrix_floats = self.read_f32s(
            checked_len(header.instance_count as usize, (INSTANCE_SIZE / 4) as usize)?,
            "instances",
        )?;
        let instances = matrix_floats
            .chunks_exact(16)
            .map(|m| {
                let mut matrix: RowMajorMatrix = [[0.0; 4]; 4];
                for (row, values) in matrix.iter_mut().zip(m.chunks_exact(4)) {
                    row.copy_from_slice(values);
                }
                matrix
            })
            .collect();

        Ok(Model {
            vertices,
            indices,
            normals,
            instances,
        })
    }
}

fn checked_len(count: usize, size: usize) -> Result<usize, FormatError> {
    count.checked_mul(size).ok_or(FormatError::TooLarge)
}
