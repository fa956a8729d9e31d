//! Binary serialization trait for format headers.
//!
//! Both container headers implement `BinarySerializable` so generic code
//! (the reader's cursor, tests) can handle them uniformly while each type keeps
//! its fixed-size `to_bytes()`.

/// Trait for binary-serializable format headers.
///
/// Uses `Vec<u8>` for the return type because associated consts cannot size a
/// return array (`[u8; Self::SIZE]`) on stable Rust.
///
/// # Example
///
/// ```
/// use mp_common::formats::{BinarySerializable, ObjectHeader};
///
/// let header = ObjectHeader::new(3, 3, 0, 1);
/// let bytes = header.serialize();
/// let parsed = ObjectHeader::deserialize(&bytes).unwrap();
/// assert_eq!(parsed, header);
/// ```
pub trait BinarySerializable: Sized {
    /// Size of the serialized header in bytes.
    const SIZE: usize;

    /// Serialize to bytes.
    fn serialize(&self) -> Vec<u8>;

    /// Deserialize from bytes.
    ///
    /// Returns `None` if the byte slice is too short.
    fn deserialize(bytes: &[u8]) -> Option<Self>;
}

impl BinarySerializable for super::ContainerHeader {
    const SIZE: usize = Self::SIZE;

    fn serialize(&self) -> Vec<u8> {
        self.to_bytes().to_vec()
    }

    fn deserialize(bytes: &[u8]) -> Option<Self> {
        Self::from_bytes(bytes)
    }
}

impl BinarySerializable for super::ObjectHeader {
    const SIZE: usize = Self::SIZE;

    fn serialize(&self) -> Vec<u8> {
        self.to_bytes().to_vec()
    }

    fn deserialize(bytes: &[u8]) -> Option<Self> {
        Self::from_bytes(bytes)
    }
}
