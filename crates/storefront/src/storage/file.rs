//! File-backed key-value store.
//!
//! # Layout
//!
//! ```text
//! {root}/
//! ├── barbaro-cart-storage.json
//! └── barbaro-cart-storage={token}.json
//! ```
//!
//! `:` in keys is written as `=`, which keys may not contain, so every file
//! name maps back to exactly one key. Each write goes to its own temporary
//! file in the same directory and is renamed into place, so readers never
//! observe a partially written value and concurrent writers to one key do
//! not trip over each other.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use super::{KeyValueStore, Result, validate_key};

const EXTENSION: &str = ".json";

/// Stand-in for `:` in file names.
const SEPARATOR: &str = "=";

/// Durable storage rooted at a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Directory holding the stored values.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        let file_name = format!("{}{EXTENSION}", key.replace(':', SEPARATOR));
        Ok(self.root.join(file_name))
    }
}

/// Recover the key a file name was written for.
///
/// Temporary files and anything not produced by [`FileStore::set`] yield `None`.
fn key_for(file_name: &str) -> Option<String> {
    let key = file_name
        .strip_suffix(EXTENSION)?
        .replace(SEPARATOR, ":");
    validate_key(&key).ok()?;
    Some(key)
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;

        let mut tmp = NamedTempFile::new_in(&self.root)?;
        tmp.write_all(value.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| e.error)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }

    fn keys(&self, prefix: &str) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let Some(key) = entry.file_name().to_str().and_then(key_for) else {
                continue;
            };
            if key.starts_with(prefix) {
                keys.push(key);
            }
        }
        keys.sort_unstable();
        Ok(keys)
    }
}
