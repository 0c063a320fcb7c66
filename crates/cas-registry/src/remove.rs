//! Deletion of descriptors and registry trees.

use std::{
    fmt::Display,
    fs,
    io,
    path::{Path, PathBuf},
};

use tracing::{debug, info};

use crate::{error, Error};

/// What was found at the target path, decided once per removal.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PathState {
    /// Nothing there.
    Absent,
    /// Regular file, symbolic link or other non-directory entry.
    Entry,
    /// Directory with no entries.
    EmptyDirectory,
    /// Directory with at least one entry.
    PopulatedDirectory,
}

/// How a removal was carried out.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RemovalKind {
    /// The target did not exist.
    NothingToDo,
    /// A single file or link was unlinked.
    Unlinked,
    /// An empty directory was removed.
    EmptyDirectory,
    /// A directory and all its contents were removed.
    Recursive,
}

/// Outcome of a removal.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Removed {
    /// The target path.
    pub path: PathBuf,
    /// The strategy used.
    pub kind: RemovalKind,
}

impl Removed {
    /// Whether anything was deleted.
    pub fn changed(&self) -> bool {
        self.kind != RemovalKind::NothingToDo
    }
}

impl Display for Removed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let path = self.path.display();
        match self.kind {
            RemovalKind::NothingToDo => write!(f, "Path does not exist: {path}"),
            RemovalKind::Unlinked => write!(f, "Deleted Service Registry File: {path}"),
            RemovalKind::EmptyDirectory => write!(f, "Deleted empty directory: {path}"),
            RemovalKind::Recursive => {
                write!(f, "Deleted non-empty directory and its contents: {path}")
            }
        }
    }
}

/// Inspect `path` without following a final symbolic link.
pub fn observe(path: &Path) -> Result<PathState, Error> {
    let metadata = match fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(PathState::Absent),
        Err(err) => return Err(error::io(path)(err)),
    };

    if !metadata.is_dir() {
        return Ok(PathState::Entry);
    }

    let mut entries = fs::read_dir(path).map_err(error::io(path))?;
    Ok(match entries.next() {
        None => PathState::EmptyDirectory,
        Some(_) => PathState::PopulatedDirectory,
    })
}

/// Remove whatever is at `path`.
///
/// A missing path is not an error. A symbolic link is removed itself, never
/// its target. There is no re-inspection if deletion fails halfway through a
/// directory tree.
pub fn remove(path: &Path) -> Result<Removed, Error> {
    let state = observe(path)?;
    debug!(path = %path.display(), ?state, "removing");

    let kind = match state {
        PathState::Absent => RemovalKind::NothingToDo,
        PathState::Entry => {
            fs::remove_file(path).map_err(error::io(path))?;
            RemovalKind::Unlinked
        }
        PathState::EmptyDirectory => {
            fs::remove_dir(path).map_err(error::io(path))?;
            RemovalKind::EmptyDirectory
        }
        PathState::PopulatedDirectory => {
            fs::remove_dir_all(path).map_err(error::io(path))?;
            RemovalKind::Recursive
        }
    };

    let removed = Removed {
        path: path.to_path_buf(),
        kind,
    };
    if removed.changed() {
        info!(path = %path.display(), ?kind, "removed");
    }

    Ok(removed)
}
