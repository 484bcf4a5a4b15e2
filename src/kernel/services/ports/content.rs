//! Content Store port: byte-level access to local or remote resources.
//!
//! Implementations are called from background workers, never from the control
//! thread, so every method may block.

use crate::kernel::Locator;
use std::io;

pub type Result<T> = std::result::Result<T, ContentError>;

#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("{} was not found", .0.display_name())]
    NotFound(Locator),
    #[error("{} already exists", .0.display_name())]
    AlreadyExists(Locator),
    #[error("{} is not a file", .0.display_name())]
    NotAFile(Locator),
    #[error("{operation} is not supported for {locator}")]
    Unsupported {
        operation: &'static str,
        locator: Locator,
    },
    #[error("{}: {source}", .locator.display_name())]
    Io {
        locator: Locator,
        #[source]
        source: io::Error,
    },
}

impl ContentError {
    pub fn io(locator: &Locator, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            return Self::NotFound(locator.clone());
        }
        if source.kind() == io::ErrorKind::AlreadyExists {
            return Self::AlreadyExists(locator.clone());
        }
        Self::Io {
            locator: locator.clone(),
            source,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOptions {
    pub atomic: bool,
    pub overwrite: bool,
}

impl WriteOptions {
    /// What a tab save uses.
    pub const SAVE: Self = Self {
        atomic: true,
        overwrite: true,
    };
}

pub trait ContentStore: Send + Sync {
    fn read(&self, locator: &Locator) -> Result<Vec<u8>>;

    fn write(&self, locator: &Locator, bytes: &[u8], options: WriteOptions) -> Result<()>;

    fn copy(&self, from: &Locator, to: &Locator) -> Result<()>;

    fn remove(&self, locator: &Locator) -> Result<()>;

    fn create_directory(&self, locator: &Locator, recursive: bool) -> Result<()>;

    fn rename(&self, from: &Locator, to: &Locator) -> Result<()>;

    fn exists(&self, locator: &Locator) -> bool;

    /// Starts fetching a cloud placeholder; completion is observed through the
    /// workspace watcher, not through this call.
    fn request_download(&self, locator: &Locator) -> Result<()> {
        Err(ContentError::Unsupported {
            operation: "download",
            locator: locator.clone(),
        })
    }
}
