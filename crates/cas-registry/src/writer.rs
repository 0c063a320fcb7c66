use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use cas_registry_common::{descriptor::ServiceDescriptor, id::ServiceId};
use tracing::debug;

use crate::{error, Error};

/// Default descriptor file name prefix, as used by the CAS JSON service registry.
pub const DEFAULT_FILE_PREFIX: &str = "service_";

/// Writes descriptor files named `<prefix><id>.json`.
///
/// The content goes to a temporary file in the registry directory first and is
/// then moved into place without replacing anything: an existing target
/// surfaces as [Error::Collision], and a failed write leaves no partial file.
#[derive(Clone, Debug)]
pub struct FileWriter {
    prefix: String,
}

impl FileWriter {
    pub(crate) fn new(prefix: String) -> Self {
        Self { prefix }
    }

    /// The file name used for `id`.
    pub fn file_name(&self, id: &ServiceId) -> String {
        format!("{}{id}.json", self.prefix)
    }

    /// Persist `descriptor` into `dir`, returning the new file's path.
    pub fn write(
        &self,
        dir: &Path,
        id: &ServiceId,
        descriptor: &ServiceDescriptor,
    ) -> Result<PathBuf, Error> {
        let target = dir.join(self.file_name(id));

        let tmp = tempfile::Builder::new()
            .prefix(".cas-service-")
            .suffix(".tmp")
            .tempfile_in(dir)
            .map_err(error::io(dir))?;

        write_contents(tmp.as_file(), tmp.path(), descriptor)?;

        debug!(tmp = %tmp.path().display(), target = %target.display(), "moving descriptor into place");

        tmp.persist_noclobber(&target).map_err(|err| {
            if err.error.kind() == io::ErrorKind::AlreadyExists {
                Error::Collision {
                    id: id.clone(),
                    path: target.clone(),
                }
            } else {
                error::io(&target)(err.error)
            }
        })?;

        Ok(target)
    }
}

/// Write and fsync `descriptor` to `file`, reporting failures against `path`.
fn write_contents(file: &File, path: &Path, descriptor: &ServiceDescriptor) -> Result<(), Error> {
    let mut out = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut out, descriptor).map_err(error::unclassified(path))?;
    out.flush().map_err(error::io(path))?;
    file.sync_all().map_err(error::io(path))
}

impl Default for FileWriter {
    fn default() -> Self {
        Self::new(DEFAULT_FILE_PREFIX.to_string())
    }
}
