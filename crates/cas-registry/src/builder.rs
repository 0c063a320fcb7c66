use std::{ops::RangeInclusive, path::PathBuf};

use cas_registry_common::{
    id::{IdAllocator, IdSource, RandomIdSource, DEFAULT_ID_RANGE},
    ValidationError,
};

use crate::{writer::FileWriter, writer::DEFAULT_FILE_PREFIX, Error, FsRegistry};

/// A builder for configuring a [FsRegistry].
pub struct RegistryBuilder {
    pub(crate) dir: PathBuf,
    pub(crate) id_range: RangeInclusive<i64>,
    pub(crate) id_source: Box<dyn IdSource>,
    pub(crate) file_prefix: String,
}

impl RegistryBuilder {
    pub(crate) fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            id_range: DEFAULT_ID_RANGE,
            id_source: Box::new(RandomIdSource),
            file_prefix: DEFAULT_FILE_PREFIX.to_string(),
        }
    }

    /// Draw synthesized ids from `range` (default 1000..=9999).
    pub fn with_id_range(mut self, range: RangeInclusive<i64>) -> Self {
        self.id_range = range;
        self
    }

    /// Override where synthesized ids come from.
    pub fn with_id_source(mut self, source: impl IdSource + 'static) -> Self {
        self.id_source = Box::new(source);
        self
    }

    /// Override the descriptor file name prefix (default `service_`).
    pub fn with_file_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.file_prefix = prefix.into();
        self
    }

    /// Validate the configuration and build the registry handle.
    ///
    /// Nothing is touched on disk until the first operation.
    pub fn build(self) -> Result<FsRegistry, Error> {
        if self.file_prefix.contains(['/', '\\']) {
            return Err(ValidationError::Config("file prefix must not contain a path separator").into());
        }

        Ok(FsRegistry {
            dir: self.dir,
            ids: IdAllocator::new(self.id_range, self.id_source)?,
            writer: FileWriter::new(self.file_prefix),
        })
    }
}
