//! Durable key-value storage for persisted carts.
//!
//! The cart store writes its full serialized state under a single key after
//! every mutation. Backends implement [`KeyValueStore`]:
//!
//! - [`MemoryStore`] - process-local map, used in tests and when no cart
//!   directory is configured
//! - [`FileStore`] - one file per key inside a directory, written atomically
//!
//! Keys are restricted to ASCII letters, digits, and `_ . : -` so they map
//! safely onto file names. Namespaces are separated by `:`, and
//! [`KeyValueStore::keys`] lists a namespace for cleanup jobs.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use thiserror::Error;

/// Errors that can occur in a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Underlying I/O failed.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Key contains characters the backend cannot represent.
    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),

    /// Backend is not usable (e.g., a poisoned lock).
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Result type alias for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// A string-to-string durable store.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is invalid or the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is invalid or the backend cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete the value under `key`. Deleting a missing key succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is invalid or the backend cannot be written.
    fn remove(&self, key: &str) -> Result<()>;

    /// List stored keys starting with `prefix`, in ascending order.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be enumerated.
    fn keys(&self, prefix: &str) -> Result<Vec<String>>;
}

/// Check that a key only uses characters every backend can represent.
///
/// # Errors
///
/// Returns [`StorageError::InvalidKey`] for empty keys or keys containing
/// anything other than ASCII alphanumerics and `_ . : -`.
pub fn validate_key(key: &str) -> Result<()> {
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | ':' | '-'));

    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}
