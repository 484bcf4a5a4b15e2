//! Local filesystem Content Store.
//!
//! Only `file://` locators without an authority are served; anything else is
//! `Unsupported`.

use crate::kernel::services::ports::content::{ContentError, ContentStore, Result, WriteOptions};
use crate::kernel::Locator;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

pub struct LocalContentStore {
    temp_counter: AtomicU64,
}

impl LocalContentStore {
    pub fn new() -> Self {
        Self {
            temp_counter: AtomicU64::new(0),
        }
    }

    fn temp_sibling(&self, path: &Path) -> Option<PathBuf> {
        let parent = path.parent()?;
        let name = path.file_name()?.to_string_lossy();
        let n = self.temp_counter.fetch_add(1, Ordering::Relaxed);
        Some(parent.join(format!(".{name}.{}.{n}.tmp", std::process::id())))
    }
}

impl Default for LocalContentStore {
    fn default() -> Self {
        Self::new()
    }
}

fn local_path(locator: &Locator, operation: &'static str) -> Result<PathBuf> {
    locator
        .to_file_path()
        .ok_or_else(|| ContentError::Unsupported {
            operation,
            locator: locator.clone(),
        })
}

fn copy_recursive(from: &Path, to: &Path) -> std::io::Result<()> {
    if from.is_dir() {
        fs::create_dir(to)?;
        for entry in fs::read_dir(from)? {
            let entry = entry?;
            copy_recursive(&entry.path(), &to.join(entry.file_name()))?;
        }
        Ok(())
    } else {
        fs::copy(from, to).map(|_| ())
    }
}

impl ContentStore for LocalContentStore {
    fn read(&self, locator: &Locator) -> Result<Vec<u8>> {
        let path = local_path(locator, "read")?;
        if !path.exists() {
            return Err(ContentError::NotFound(locator.clone()));
        }
        if !path.is_file() {
            return Err(ContentError::NotAFile(locator.clone()));
        }
        fs::read(&path).map_err(|e| ContentError::io(locator, e))
    }

    fn write(&self, locator: &Locator, bytes: &[u8], options: WriteOptions) -> Result<()> {
        let path = local_path(locator, "write")?;
        if path.is_dir() {
            return Err(ContentError::NotAFile(locator.clone()));
        }
        if !options.overwrite && path.exists() {
            return Err(ContentError::AlreadyExists(locator.clone()));
        }
        // The parent vanishing means the resource itself is gone.
        if path.parent().is_some_and(|parent| !parent.is_dir()) {
            return Err(ContentError::NotFound(locator.clone()));
        }

        if !options.atomic {
            return fs::write(&path, bytes).map_err(|e| ContentError::io(locator, e));
        }

        let Some(temp) = self.temp_sibling(&path) else {
            return fs::write(&path, bytes).map_err(|e| ContentError::io(locator, e));
        };
        if let Err(e) = fs::write(&temp, bytes) {
            let _ = fs::remove_file(&temp);
            return Err(ContentError::io(locator, e));
        }
        fs::rename(&temp, &path).map_err(|e| {
            let _ = fs::remove_file(&temp);
            ContentError::io(locator, e)
        })
    }

    fn copy(&self, from: &Locator, to: &Locator) -> Result<()> {
        let src = local_path(from, "copy")?;
        let dst = local_path(to, "copy")?;
        if !src.exists() {
            return Err(ContentError::NotFound(from.clone()));
        }
        if dst.exists() {
            return Err(ContentError::AlreadyExists(to.clone()));
        }
        copy_recursive(&src, &dst).map_err(|e| ContentError::io(to, e))
    }

    fn remove(&self, locator: &Locator) -> Result<()> {
        let path = local_path(locator, "remove")?;
        if !path.exists() {
            return Err(ContentError::NotFound(locator.clone()));
        }
        let result = if path.is_dir() {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };
        result.map_err(|e| ContentError::io(locator, e))
    }

    fn create_directory(&self, locator: &Locator, recursive: bool) -> Result<()> {
        let path = local_path(locator, "create directory")?;
        if path.exists() {
            return Err(ContentError::AlreadyExists(locator.clone()));
        }
        let result = if recursive {
            fs::create_dir_all(&path)
        } else {
            fs::create_dir(&path)
        };
        result.map_err(|e| ContentError::io(locator, e))
    }

    fn rename(&self, from: &Locator, to: &Locator) -> Result<()> {
        let src = local_path(from, "rename")?;
        let dst = local_path(to, "rename")?;
        if !src.exists() {
            return Err(ContentError::NotFound(from.clone()));
        }
        if dst.exists() {
            return Err(ContentError::AlreadyExists(to.clone()));
        }
        fs::rename(&src, &dst).map_err(|e| ContentError::io(from, e))
    }

    fn exists(&self, locator: &Locator) -> bool {
        locator.to_file_path().is_some_and(|path| path.exists())
    }
}

#[cfg(test)]
#[path = "../../../../../tests/unit/kernel/services/adapters/file/local.rs"]
mod tests;
