//! Backing file codec for the record store.
//!
//! The file is a single JSON object keyed by student id. Reading and writing
//! always move the whole map; there is no incremental update.

use std::collections::BTreeMap;
use std::io::{ErrorKind, Write};
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::record::Record;

/// Records keyed by student id.
pub type RecordMap = BTreeMap<String, Record>;

/// How the backing file is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOptions {
    /// Write to a temporary file beside the target and rename it into place.
    pub atomic: bool,
    /// Indent the JSON with two spaces.
    pub pretty: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            atomic: true,
            pretty: true,
        }
    }
}

/// Read every record from `path`.
///
/// A missing file is an empty map. Each record's `id` is taken from its key.
///
/// # Errors
///
/// Returns [`Error::CorruptData`] if the file is not a JSON object of records,
/// or [`Error::FileRead`] if it exists but cannot be read.
pub fn read_records(path: &Path) -> Result<RecordMap> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            debug!("No data file at {}, starting empty", path.display());
            return Ok(RecordMap::new());
        }
        Err(source) => {
            return Err(Error::FileRead {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let mut records: RecordMap =
        serde_json::from_slice(&bytes).map_err(|source| Error::corrupt_data(path, source))?;
    for (id, record) in &mut records {
        record.id.clone_from(id);
    }

    trace!("Read {} bytes from {}", bytes.len(), path.display());
    Ok(records)
}

/// Replace the contents of `path` with `records`.
///
/// Atomic writes resolve symlinks first and give the new file the old file's
/// permissions, so the replacement is indistinguishable from an overwrite.
///
/// # Errors
///
/// Returns [`Error::Json`] if serialization fails, or [`Error::FileWrite`] if
/// the file (or its temporary sibling) cannot be written.
pub fn write_records(path: &Path, records: &RecordMap, options: WriteOptions) -> Result<()> {
    let mut bytes = if options.pretty {
        serde_json::to_vec_pretty(records)?
    } else {
        serde_json::to_vec(records)?
    };
    bytes.push(b'\n');

    let write_error = |source| Error::FileWrite {
        path: path.to_path_buf(),
        source,
    };

    if options.atomic {
        // Rename over the file a symlink points at, not the link itself.
        let target = match std::fs::canonicalize(path) {
            Ok(resolved) => resolved,
            Err(err) if err.kind() == ErrorKind::NotFound => path.to_path_buf(),
            Err(source) => return Err(write_error(source)),
        };
        let dir = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut tmp = NamedTempFile::new_in(dir).map_err(write_error)?;
        if let Ok(existing) = std::fs::metadata(&target) {
            tmp.as_file()
                .set_permissions(existing.permissions())
                .map_err(write_error)?;
        }
        tmp.write_all(&bytes).map_err(write_error)?;
        tmp.as_file().sync_all().map_err(write_error)?;
        tmp.persist(&target).map_err(|err| write_error(err.error))?;
    } else {
        std::fs::write(path, &bytes).map_err(write_error)?;
    }

    trace!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}
