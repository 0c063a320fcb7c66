use std::{
    io,
    path::{Path, PathBuf},
};

use cas_registry_common::{id::ServiceId, ValidationError};

/// Errors that can happen while creating or removing registry entries.
///
/// Every error is fatal to the invocation that produced it. Nothing is retried
/// and nothing is rolled back.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Missing or mistyped input.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// The service id is already used by a descriptor in the registry.
    #[error("Service ID {id} is already in use in {}.", .path.display())]
    Collision {
        /// The requested id.
        id: ServiceId,
        /// The descriptor file already holding it.
        path: PathBuf,
    },

    /// The registry path exists but is not a directory.
    #[error("{} exists but is not a directory.", .0.display())]
    NotADirectory(PathBuf),

    /// The filesystem denied the operation.
    #[error("Permission denied: unable to modify {}", .0.display())]
    PermissionDenied(PathBuf),

    /// Any other I/O failure.
    #[error("filesystem error at {}: {cause}", .path.display())]
    Filesystem {
        /// The path being operated on.
        path: PathBuf,
        /// The underlying failure.
        cause: anyhow::Error,
    },
}

impl Error {
    /// The path the error is about, if it concerns one.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Validation(_) => None,
            Self::Collision { path, .. }
            | Self::NotADirectory(path)
            | Self::PermissionDenied(path)
            | Self::Filesystem { path, .. } => Some(path),
        }
    }
}

/// Classify an I/O error on `path`.
pub(crate) fn io(path: &Path) -> impl FnOnce(io::Error) -> Error + '_ {
    move |err| match err.kind() {
        io::ErrorKind::PermissionDenied => Error::PermissionDenied(path.to_path_buf()),
        _ => Error::Filesystem {
            path: path.to_path_buf(),
            cause: anyhow::Error::from(err),
        },
    }
}

pub(crate) fn unclassified(
    path: &Path,
) -> impl FnOnce(serde_json::Error) -> Error + '_ {
    move |err| Error::Filesystem {
        path: path.to_path_buf(),
        cause: anyhow::Error::from(err),
    }
}
