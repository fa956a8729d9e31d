//! Wavefront OBJ scene adapter
//!
//! `o` and `g` statements start a new primitive. Global `v`/`vn` pools are
//! remapped to per-primitive arrays in first-use order, and faces keep their
//! corner counts so N-gons reach the triangulator untouched.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use hashbrown::HashMap;

use super::SceneSource;
use crate::error::ExportError;
use crate::primitive::MeshPrimitive;

#[derive(Debug, Default)]
pub struct ObjScene {
    primitives: Vec<MeshPrimitive>,
}

impl ObjScene {
    pub fn open(path: &Path) -> Result<Self, ExportError> {
        let file = File::open(path).map_err(|e| ExportError::scene(path, e.to_string()))?;
        let root = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("obj")
            .to_string();
        let primitives = parse_obj(BufReader::new(file), &root)
            .map_err(|message| ExportError::scene(path, message))?;

        tracing::debug!("Parsed {} OBJ groups from {:?}", primitives.len(), path);
        Ok(Self { primitives })
    }

    pub fn primitives(&self) -> &[MeshPrimitive] {
        &self.primitives
    }
}

impl SceneSource for ObjScene {
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

/// One face corner: global position index and optional global normal index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Corner {
    position: usize,
    normal: Option<usize>,
}

/// Primitive under construction
#[derive(Default)]
struct Group {
    name: String,
    points: Vec<[f32; 3]>,
    counts: Vec<u32>,
    indices: Vec<u32>,
    normal_values: Vec<[f32; 3]>,
    normal_indices: Vec<u32>,
    corners_without_normal: usize,
    point_remap: HashMap<usize, u32>,
    normal_remap: HashMap<usize, u32>,
}

impl Group {
    fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    fn add_face(&mut self, corners: &[Corner], positions: &[[f32; 3]], normals: &[[f32; 3]]) {
        self.counts.push(corners.len() as u32);
        for corner in corners {
            let next = self.points.len() as u32;
            let local = *self.point_remap.entry(corner.position).or_insert_with(|| {
                self.points.push(positions[corner.position]);
                next
            });
            self.indices.push(local);

            match corner.normal {
                Some(global) => {
                    let next = self.normal_values.len() as u32;
                    let local = *self.normal_remap.entry(global).or_insert_with(|| {
                        self.normal_values.push(normals[global]);
                        next
                    });
                    self.normal_indices.push(local);
                }
                None => self.corners_without_normal += 1,
            }
        }
    }

    fn finish(self, root: &str) -> Option<MeshPrimitive> {
        if self.counts.is_empty() {
            return None;
        }
        let path = format!("/{root}/{}", self.name);
        let mut prim = MeshPrimitive::new(path, self.points, self.counts, self.indices);

        if !self.normal_indices.is_empty() {
            if self.corners_without_normal == 0 {
                prim = prim.with_normals(self.normal_values, Some(self.normal_indices));
            } else {
                tracing::warn!(
                    "OBJ group '{}': {} corners lack normals, computing face normals instead",
                    self.name,
                    self.corners_without_normal
                );
            }
        }
        Some(prim)
    }
}

/// Parse OBJ text into one primitive per `o`/`g` group.
///
/// Primitive paths are `/<root>/<group name>`; geometry before any group
/// statement lands in a group called `default`.
pub fn parse_obj(reader: impl BufRead, root: &str) -> Result<Vec<MeshPrimitive>, String> {
    let mut positions: Vec<[f32; 3]> = Vec::new();
    let mut normals: Vec<[f32; 3]> = Vec::new();
    let mut primitives = Vec::new();
    let mut group = Group::named("default");

    for (line_no, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| e.to_string())?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        let line_no = line_no + 1;

        match parts[0] {
            "v" => positions.push(parse_vec3(&parts[1..], line_no)?),
            "vn" => normals.push(parse_vec3(&parts[1..], line_no)?),
            "o" | "g" => {
                let name = if parts.len() > 1 {
                    parts[1..].join("_")
                } else {
                    "default".to_string()
                };
                let previous = std::mem::replace(&mut group, Group::named(&name));
                primitives.extend(previous.finish(root));
            }
            "f" => {
                let corners = parts[1..]
                    .iter()
                    .map(|s| parse_obj_corner(s, positions.len(), normals.len()))
                    .collect::<Option<Vec<_>>>()
                    .ok_or_else(|| format!("line {line_no}: invalid face '{line}'"))?;
                group.add_face(&corners, &positions, &normals);
            }
            // vt, s, usemtl, mtllib and friends carry nothing we export
            _ => {}
        }
    }

    primitives.extend(group.finish(root));
    Ok(primitives)
}

fn parse_vec3(parts: &[&str], line_no: usize) -> Result<[f32; 3], String> {
    let mut out = [0.0f32; 3];
    for (i, value) in out.iter_mut().enumerate() {
        let token = parts
            .get(i)
            .ok_or_else(|| format!("line {line_no}: expected 3 components"))?;
        *value = token
            .parse()
            .map_err(|_| format!("line {line_no}: invalid number '{token}'"))?;
    }
    Ok(out)
}

/// Resolve a 1-based (or negative, relative) OBJ index against a pool length.
fn resolve_index(token: &str, len: usize) -> Option<usize> {
    let value: i64 = token.parse().ok()?;
    let index = match value {
        0 => return None,
        v if v > 0 => (v - 1) as usize,
        v => len.checked_sub(v.unsigned_abs() as usize)?,
    };
    (index < len).then_some(index)
}

/// Parse `v`, `v/vt`, `v//vn` or `v/vt/vn`; texture coordinates are ignored.
fn parse_obj_corner(s: &str, position_count: usize, normal_count: usize) -> Option<Corner> {
    let parts: Vec<&str> = s.split('/').collect();

    let position = resolve_index(parts.first()?, position_count)?;

    let normal = match parts.get(2).filter(|s| !s.is_empty()) {
        Some(token) => Some(resolve_index(token, normal_count)?),
        None => None,
    };

    Some(Corner { position, normal })
}
