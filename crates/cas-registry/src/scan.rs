//! Registry scanning.
//!
//! The registry directory is the only source of truth: there is no index, so
//! every lookup reads every descriptor file.

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde_json::Value;
use tracing::debug;

use crate::{error, Error};

/// A parsable file found in the registry.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct RegistryEntry {
    /// The descriptor file.
    pub path: PathBuf,
    /// String form of its `id` field.
    pub id: String,
}

/// Whether any descriptor directly under `dir` has the id `candidate`.
pub fn has_collision(dir: &Path, candidate: &str) -> Result<bool, Error> {
    Ok(find_id(dir, candidate)?.is_some())
}

/// Path of the first descriptor directly under `dir` whose id is `candidate`.
pub fn find_id(dir: &Path, candidate: &str) -> Result<Option<PathBuf>, Error> {
    for path in regular_files(dir)? {
        if read_id(&path)?.as_deref() == Some(candidate) {
            return Ok(Some(path));
        }
    }

    Ok(None)
}

/// All parsable descriptors directly under `dir`, sorted by path.
pub fn entries(dir: &Path) -> Result<Vec<RegistryEntry>, Error> {
    let mut entries = vec![];
    for path in regular_files(dir)? {
        if let Some(id) = read_id(&path)? {
            entries.push(RegistryEntry { path, id });
        }
    }

    entries.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(entries)
}

/// Regular files directly under `dir`, following symbolic links.
fn regular_files(dir: &Path) -> Result<Vec<PathBuf>, Error> {
    let metadata = fs::metadata(dir).map_err(error::io(dir))?;
    if !metadata.is_dir() {
        return Err(Error::NotADirectory(dir.to_path_buf()));
    }

    let mut files = vec![];
    for entry in fs::read_dir(dir).map_err(error::io(dir))? {
        let path = entry.map_err(error::io(dir))?.path();
        match fs::metadata(&path) {
            Ok(metadata) if metadata.is_file() => files.push(path),
            Ok(_) => {}
            // dangling symlink
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => return Err(error::io(&path)(err)),
        }
    }

    Ok(files)
}

/// The id of the descriptor in `path`, or `None` when the file isn't a JSON
/// object with an `id`.
fn read_id(path: &Path) -> Result<Option<String>, Error> {
    let bytes = fs::read(path).map_err(error::io(path))?;

    let value: Value = match serde_json::from_slice(&bytes) {
        Ok(value) => value,
        Err(err) => {
            debug!(path = %path.display(), %err, "skipping unparsable registry file");
            return Ok(None);
        }
    };

    Ok(match value.get("id") {
        Some(Value::String(id)) => Some(id.clone()),
        Some(Value::Number(id)) => Some(id.to_string()),
        _ => None,
    })
}
