//! `cas-registry` reconciles a CAS JSON service registry on the local filesystem.
//!
//! The registry is a plain directory of descriptor files, one per registered
//! service. It is shared with other processes and is the only source of truth:
//! uniqueness of ids is checked by scanning every file, and new descriptors are
//! moved into place with create-exclusive semantics so two writers can never
//! both claim the same file name.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::{
    fmt::Display,
    fs,
    path::{Path, PathBuf},
};

use builder::RegistryBuilder;
use cas_registry_common::{descriptor, id::IdAllocator, id::ServiceId, input::DescriptorInput};
use tracing::info;
use writer::FileWriter;

pub use cas_registry_common as common;
pub use error::Error;
pub use remove::{RemovalKind, Removed};
pub use scan::RegistryEntry;

/// Registry configuration.
pub mod builder;

pub mod remove;
pub mod scan;

/// Descriptor file writing.
pub mod writer;

mod error;

/// The operations a host exposes to its callers.
///
/// Parameter parsing and result reporting stay on the host side; implementations
/// only see typed input and return typed results.
pub trait ServiceRegistry {
    /// Create a new descriptor. Never overwrites an existing one.
    fn create(&self, input: &DescriptorInput) -> Result<Created, Error>;

    /// Remove a descriptor file, a link, or a whole directory tree.
    fn remove(&self, target: &Path) -> Result<Removed, Error>;
}

/// A successfully created descriptor.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Created {
    /// The new descriptor file.
    pub path: PathBuf,
    /// The id it was created with.
    pub id: ServiceId,
}

impl Display for Created {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Service configuration {} created at {}.",
            self.id,
            self.path.display()
        )
    }
}

/// A service registry directory.
pub struct FsRegistry {
    dir: PathBuf,
    ids: IdAllocator,
    writer: FileWriter,
}

impl FsRegistry {
    /// Registry at `dir` with default settings.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            ids: IdAllocator::default(),
            writer: FileWriter::default(),
        }
    }

    /// Construct a new builder.
    pub fn builder(dir: impl Into<PathBuf>) -> RegistryBuilder {
        RegistryBuilder::new(dir.into())
    }

    /// The registry directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// All parsable descriptors in the registry, sorted by path.
    pub fn entries(&self) -> Result<Vec<RegistryEntry>, Error> {
        scan::entries(&self.dir)
    }

    /// Remove the descriptor file of `id`, as named by this registry.
    pub fn remove_service(&self, id: &ServiceId) -> Result<Removed, Error> {
        remove::remove(&self.dir.join(self.writer.file_name(id)))
    }

    /// Create the registry directory if it is missing.
    ///
    /// The directory is left in place even if the create that needed it fails.
    fn ensure_dir(&self) -> Result<(), Error> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir).map_err(error::io(&self.dir))?;
        }

        let metadata = fs::metadata(&self.dir).map_err(error::io(&self.dir))?;
        if !metadata.is_dir() {
            return Err(Error::NotADirectory(self.dir.clone()));
        }

        Ok(())
    }
}

impl ServiceRegistry for FsRegistry {
    fn create(&self, input: &DescriptorInput) -> Result<Created, Error> {
        let id = self.ids.resolve_id(input.id())?;
        let descriptor = descriptor::build(input, id.clone())?;

        self.ensure_dir()?;

        if let Some(path) = scan::find_id(&self.dir, id.as_str())? {
            return Err(Error::Collision { id, path });
        }

        let path = self.writer.write(&self.dir, &id, &descriptor)?;
        info!(%id, path = %path.display(), service = descriptor.service_id(), "created service");

        Ok(Created { path, id })
    }

    fn remove(&self, target: &Path) -> Result<Removed, Error> {
        remove::remove(target)
    }
}

/// Create a descriptor in the registry at `registry` with default settings.
pub fn create(registry: impl Into<PathBuf>, input: &DescriptorInput) -> Result<Created, Error> {
    FsRegistry::new(registry).create(input)
}

/// Remove whatever is at `target`.
pub fn remove(target: impl AsRef<Path>) -> Result<Removed, Error> {
    remove::remove(target.as_ref())
}
