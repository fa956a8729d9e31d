//! Container packer

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use super::ContainerHeader;
use crate::error::FormatError;
use crate::model::Model;

/// Compute the offset table: prefix sums of object sizes, first entry 0.
///
/// Validates every model, so a model over the 16-bit vertex limit is reported
/// here before any bytes are written.
pub fn compute_offsets(models: &[Model]) -> Result<Vec<u32>, FormatError> {
    let mut offsets = Vec::with_capacity(models.len());
    let mut cursor: u64 = 0;

    for model in models {
        model.validate()?;
        offsets.push(u32::try_from(cursor).map_err(|_| FormatError::TooLarge)?);
        cursor += model.packed_size();
    }

    // The last object must also end inside the addressable range
    u32::try_from(cursor).map_err(|_| FormatError::TooLarge)?;

    Ok(offsets)
}

/// Write a complete container for `models`, in the given order.
///
/// Returns the number of bytes written.
pub fn write_container<W: Write>(w: &mut W, models: &[Model]) -> Result<u64, FormatError> {
    let offsets = compute_offsets(models)?;
    let header = ContainerHeader::new(models.len() as u32);
    let total = header.data_start() as u64 + models.iter().map(Model::packed_size).sum::<u64>();

    w.write_all(&header.to_bytes())?;

    for offset in &offsets {
        w.write_all(&offset.to_le_bytes())?;
    }

    for model in models {
        write_object(w, model)?;
    }

    Ok(total)
}

/// Pack a container into memory
pub fn pack_container(models: &[Model]) -> Result<Vec<u8>, FormatError> {
    let mut bytes = Vec::new();
    write_container(&mut bytes, models)?;
    Ok(bytes)
}

/// Write a container to `path` via a temporary file and rename, so a failed
/// pack never leaves a complete-looking file behind.
///
/// Returns the container size in bytes.
pub fn save_container(path: &Path, models: &[Model]) -> Result<u64, FormatError> {
    let tmp_path = temp_path_for(path);

    let result = (|| {
        let file = File::create(&tmp_path)?;
        let mut writer = BufWriter::new(file);
        let written = write_container(&mut writer, models)?;
        let file = writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
        Ok::<u64, FormatError>(written)
    })();

    let written = match result {
        Ok(written) => written,
        Err(err) => {
            let _ = fs::remove_file(&tmp_path);
            return Err(err);
        }
    };

    #[cfg(windows)]
    {
        if path.exists() {
            // Windows rename fails if destination exists.
            fs::remove_file(path)?;
        }
    }

    fs::rename(&tmp_path, path)?;

    tracing::debug!(
        "Wrote container {} ({} objects, {} bytes)",
        path.display(),
        models.len(),
        written
    );
    Ok(written)
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

fn write_object<W: Write>(w: &mut W, model: &Model) -> Result<(), FormatError> {
    w.write_all(&model.header().to_bytes())?;
    write_f32s(w, model.vertices.as_flattened())?;
    write_u16s(w, &model.indices)?;
    write_f32s(w, model.normals.as_flattened())?;

    for matrix in &model.instances {
        write_f32s(w, matrix.as_flattened())?;
    }
    Ok(())
}

#[cfg(target_endian = "little")]
fn write_f32s<W: Write>(w: &mut W, values: &[f32]) -> Result<(), FormatError> {
    w.write_all(bytemuck::cast_slice(values))?;
    Ok(())
}

#[cfg(not(target_endian = "little"))]
fn write_f32s<W: Write>(w: &mut W, values: &[f32]) -> Result<(), FormatError> {
    for v in values {
        w.write_all(&v.to_le_bytes())?;
    }
    Ok(())
}

#[cfg(target_endian = "little")]
fn write_u16s<W: Write>(w: &mut W, values: &[u16]) -> Result<(), FormatError> {
    w.write_all(bytemuck::cast_slice(values))?;
    Ok(())
}

#[cfg(not(target_endian = "little"))]
fn write_u16s<W: Write>(w: &mut W, values: &[u16]) -> Result<(), FormatError> {
    for v in values {
        w.write_all(&v.to_le_bytes())?;
    }
    Ok(())
}
