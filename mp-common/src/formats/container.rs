//! Container and object headers
//!
//! # Layout
//! ```text
//! 0x00: magic u16 (0x4D50)
//! 0x02: object_count u32
//! 0x06: offsets u32[object_count]   (relative to start of object data)
//! var:  object data
//!
//! Object
//! 0x00: vertex_count u32
//! 0x04: index_count u32
//! 0x08: normal_count u32
//! 0x0C: instance_count u32
//! 0x10: vertices   (vertex_count × 3 × f32)
//! var:  indices    (index_count × u16)
//! var:  normals    (normal_count × 3 × f32)
//! var:  instances  (instance_count × 16 × f32, row-major)
//! ```
//!
//! All values are little-endian.

/// Magic tag at the start of every container
pub const MP_MAGIC: u16 = 0x4D50;

/// File extension for packed containers
pub const MP_EXTENSION: &str = "mp";

/// Bytes per vertex position (3 × f32)
pub const VERTEX_SIZE: u64 = 12;

/// Bytes per triangle index (u16)
pub const INDEX_SIZE: u64 = 2;

/// Bytes per normal (3 × f32)
pub const NORMAL_SIZE: u64 = 12;

/// Bytes per instance matrix (16 × f32)
pub const INSTANCE_SIZE: u64 = 64;

/// Bytes per offset table entry
pub const OFFSET_SIZE: usize = 4;

/// Container header (6 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerHeader {
    pub magic: u16,
    pub object_count: u32,
}

impl ContainerHeader {
    pub const SIZE: usize = 6;

    pub fn new(object_count: u32) -> Self {
        Self {
            magic: MP_MAGIC,
            object_count,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.magic == MP_MAGIC
    }

    /// Byte position where object data begins
    pub fn data_start(&self) -> usize {
        Self::SIZE + self.object_count as usize * OFFSET_SIZE
    }

    /// Write header to bytes
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..2].copy_from_slice(&self.magic.to_le_bytes());
        bytes[2..6].copy_from_slice(&self.object_count.to_le_bytes());
        bytes
    }

    /// Read header from bytes (does not check the magic)
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::SIZE {
            return None;
        }
        Some(Self {
            magic: u16::from_le_bytes([bytes[0], bytes[1]]),
            object_count: u32::from_le_bytes([bytes[2], bytes[3], bytes[4], bytes[5]]),
        })
    }
}

/// Per-object counts (16 bytes). These are the source of truth for how many
/// bytes an object occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectHeader {
    pub vertex_count: u32,
    pub index_count: u32,
    pub normal_count: u32,
    pub instance_count: u32,
}

impl ObjectHeader {
    pub const SIZE: usize = 16;

    pub fn new(vertex_count: u32, index_count: u32, normal_count: u32, instance_count: u32) -> Self {
        Self {
            vertex_count,
            index_count,
            normal_count,
            instance_count,
        }
    }

    /// Size of the data following the header
    pub fn body_size(&self) -> u64 {
        VERTEX_SIZE * self.vertex_count as u64
            + INDEX_SIZE * self.index_count as u64
            + NORMAL_SIZE * self.normal_count as u64
            + INSTANCE_SIZE * self.instance_count as u64
    }

    /// Size of header plus data
    pub fn packed_size(&self) -> u64 {
        Self::SIZE as u64 + self.body_size()
    }

    /// Write header to bytes
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..4].copy_from_slice(&self.vertex_count.to_le_bytes());
        bytes[4..8].copy_from_slice(&self.index_count.to_le_bytes());
        bytes[8..12].copy_from_slice(&self.normal_count.to_le_bytes());
        bytes[12..16].copy_from_slice(&self.instance_count.to_le_bytes());
        bytes
    }

    /// Read header from bytes
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::SIZE {
            return None;
        }
        let word = |i: usize| u32::from_le_bytes([bytes[i], bytes[i + 1], bytes[i + 2], bytes[i + 3]]);
        Some(Self {
            vertex_count: word(0),
            index_count: word(4),
            normal_count: word(8),
            instance_count: word(12),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_header_layout() {
        let header = ContainerHeader::new(3);
        let bytes = header.to_bytes();
        assert_eq!(bytes, [0x50, 0x4D, 3, 0, 0, 0]);
        assert_eq!(header.data_start(), 6 + 12);
    }

    #[test]
    fn test_container_header_from_short_bytes() {
        assert!(ContainerHeader::from_bytes(&[0x50, 0x4D, 0]).is_none());
    }

    #[test]
    fn test_object_header_sizes() {
        let header = ObjectHeader::new(4, 6, 4, 2);
        assert_eq!(header.body_size(), 4 * 12 + 6 * 2 + 4 * 12 + 2 * 64);
        assert_eq!(header.packed_size(), 16 + header.body_size());

        let parsed = ObjectHeader::from_bytes(&header.to_bytes()).unwrap();
        assert_eq!(parsed, header);
    }
}
