//! Per-codimension index dump: `<path>.cd<codim>`.
//!
//! ASCII, one file per codimension. The first line holds the entry count,
//! followed by one index per line in entity discovery order. No header
//! versioning.

use crate::mesh_error::MeshIndexError;
use crate::topology::entity::Codim;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

/// File holding the indices of one codimension: `<base>.cd<codim>`.
pub fn codim_path(base: &Path, codim: Codim) -> PathBuf {
    let mut name = base.as_os_str().to_owned();
    name.push(format!(".cd{codim}"));
    PathBuf::from(name)
}

/// Serialize one codimension's indices to `writer`.
pub fn write_indices<W: Write>(mut writer: W, indices: &[usize]) -> Result<(), MeshIndexError> {
    writeln!(writer, "{}", indices.len())?;
    for index in indices {
        writeln!(writer, "{index}")?;
    }
    writer.flush()?;
    Ok(())
}

/// Parse one codimension's indices from `reader`.
///
/// Checks syntax and that the body length matches the count line; semantic
/// checks against a mesh are left to the caller.
pub fn read_indices<R: Read>(mut reader: R) -> Result<Vec<usize>, MeshIndexError> {
    let mut contents = String::new();
    reader.read_to_string(&mut contents)?;
    let mut lines = contents.lines().map(str::trim).filter(|l| !l.is_empty());

    let count_line = lines
        .next()
        .ok_or_else(|| MeshIndexError::IndexFileParse("missing entry count".into()))?;
    let count = count_line
        .parse::<usize>()
        .map_err(|_| MeshIndexError::IndexFileParse(format!("invalid entry count: {count_line}")))?;

    let mut indices = Vec::with_capacity(count);
    for line in lines {
        let index = line
            .parse::<usize>()
            .map_err(|_| MeshIndexError::IndexFileParse(format!("invalid index: {line}")))?;
        indices.push(index);
    }
    if indices.len() != count {
        return Err(MeshIndexError::IndexFileParse(format!(
            "count line says {count}, body holds {}",
            indices.len()
        )));
    }
    Ok(indices)
}

/// Write `indices` to `<base>.cd<codim>`.
pub fn write_index_dump(base: &Path, codim: Codim, indices: &[usize]) -> Result<(), MeshIndexError> {
    let path = codim_path(base, codim);
    let file = File::create(&path)?;
    write_indices(BufWriter::new(file), indices)?;
    log::debug!("wrote {} indices to {}", indices.len(), path.display());
    Ok(())
}

/// Read `<base>.cd<codim>`.
pub fn read_index_dump(base: &Path, codim: Codim) -> Result<Vec<usize>, MeshIndexError> {
    let path = codim_path(base, codim);
    let file = File::open(&path)?;
    let indices = read_indices(BufReader::new(file))?;
    log::debug!("read {} indices from {}", indices.len(), path.display());
    Ok(indices)
}
