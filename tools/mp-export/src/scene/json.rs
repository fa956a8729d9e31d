//! JSON scene adapter
//!
//! Reads `{ "primitives": [ ... ] }` where each entry is a serialized
//! [`MeshPrimitive`]. Useful for feeding pre-traversed scenes from other tools.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::SceneSource;
use crate::error::ExportError;
use crate::primitive::MeshPrimitive;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct JsonScene {
    pub primitives: Vec<MeshPrimitive>,
}

impl JsonScene {
    pub fn open(path: &Path) -> Result<Self, ExportError> {
        let file = File::open(path).map_err(|e| ExportError::scene(path, e.to_string()))?;
        Self::from_reader(BufReader::new(file)).map_err(|e| ExportError::scene(path, e.to_string()))
    }

    pub fn from_reader(reader: impl Read) -> Result<Self, serde_json::Error> {
        serde_json::from_reader(reader)
    }
}

impl SceneSource for JsonScene {
    fn visit(
        &mut self,
        f: &mut dyn FnMut(MeshPrimitive) -> Result<(), ExportError>,
    ) -> Result<(), ExportError> {
        for prim in std::mem::take(&mut self.primitives) {
            f(prim)?;
        }
        Ok(())
    }
}
