//! Session middleware configuration.
//!
//! Sessions only carry the visitor's cart token. Records are stored in the
//! same [`KeyValueStore`] as the carts, so a file-backed deployment keeps both
//! the token and the cart across restarts.
//!
//! A session owns its cart: when an expired record is dropped, either lazily
//! on load or by the [`ExpiredDeletion`] sweep, the cart it points at goes
//! with it.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tower_sessions::cookie::time::OffsetDateTime;
use tower_sessions::session::{Id, Record};
use tower_sessions::session_store::{self, ExpiredDeletion, SessionStore};
use tower_sessions::{Expiry, SessionManagerLayer};

use crate::cart::CartToken;
use crate::config::StorefrontConfig;
use crate::models::session_keys;
use crate::storage::{self, KeyValueStore, StorageError};

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "barbaro_session";

/// Session expiry time in seconds (30 days).
const SESSION_EXPIRY_SECONDS: i64 = 30 * 24 * 60 * 60;

/// Storage key prefix for session records.
const SESSION_NAMESPACE: &str = "barbaro-session";

/// How often the background sweep looks for expired sessions.
pub const EXPIRED_SWEEP_INTERVAL: std::time::Duration = std::time::Duration::from_secs(60 * 60);

/// Session store backed by a [`KeyValueStore`].
#[derive(Clone)]
pub struct KvSessionStore {
    storage: Arc<dyn KeyValueStore>,
}

impl fmt::Debug for KvSessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KvSessionStore").finish_non_exhaustive()
    }
}

impl KvSessionStore {
    /// Create a session store over `storage`.
    #[must_use]
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self { storage }
    }

    fn key(id: &Id) -> String {
        format!("{SESSION_NAMESPACE}:{id}")
    }

    /// Run a blocking storage call off the async runtime.
    async fn blocking<T, F>(&self, f: F) -> session_store::Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&dyn KeyValueStore) -> session_store::Result<T> + Send + 'static,
    {
        let storage = Arc::clone(&self.storage);
        tokio::task::spawn_blocking(move || f(storage.as_ref()))
            .await
            .map_err(|e| session_store::Error::Backend(e.to_string()))?
    }
}

fn backend(err: StorageError) -> session_store::Error {
    session_store::Error::Backend(err.to_string())
}

/// Storage key of the cart a session record points at, if any.
fn cart_key(record: &Record) -> Option<String> {
    let token = record.data.get(session_keys::CART_TOKEN)?;
    serde_json::from_value::<CartToken>(token.clone())
        .ok()
        .map(|token| token.storage_key())
}

/// Delete a session record together with its cart.
fn purge(storage: &dyn KeyValueStore, key: &str, record: &Record) -> storage::Result<()> {
    if let Some(cart) = cart_key(record) {
        storage.remove(&cart)?;
    }
    storage.remove(key)
}

/// Purge every session record that expired at or before `now`.
///
/// Unreadable records and per-key failures are logged and skipped so one bad
/// entry cannot stall the sweep. Returns how many sessions were removed.
fn sweep_expired(storage: &dyn KeyValueStore, now: OffsetDateTime) -> storage::Result<usize> {
    let mut removed = 0;

    for key in storage.keys(&format!("{SESSION_NAMESPACE}:"))? {
        let raw = match storage.get(&key) {
            Ok(Some(raw)) => raw,
            Ok(None) => continue,
            Err(e) => {
                tracing::warn!(%key, "Failed to read session record: {e}");
                continue;
            }
        };

        let record: Record = match serde_json::from_str(&raw) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(%key, "Skipping unreadable session record: {e}");
                continue;
            }
        };

        if record.expiry_date > now {
            continue;
        }

        match purge(storage, &key, &record) {
            Ok(()) => removed += 1,
            Err(e) => tracing::warn!(%key, "Failed to delete expired session: {e}"),
        }
    }

    Ok(removed)
}

#[async_trait]
impl SessionStore for KvSessionStore {
    async fn save(&self, record: &Record) -> session_store::Result<()> {
        let key = Self::key(&record.id);
        let raw = serde_json::to_string(record)
            .map_err(|e| session_store::Error::Encode(e.to_string()))?;

        self.blocking(move |storage| storage.set(&key, &raw).map_err(backend))
            .await
    }

    async fn load(&self, session_id: &Id) -> session_store::Result<Option<Record>> {
        let key = Self::key(session_id);
        let lookup = key.clone();
        let raw = self
            .blocking(move |storage| storage.get(&lookup).map_err(backend))
            .await?;

        let Some(raw) = raw else {
            return Ok(None);
        };

        let record: Record = serde_json::from_str(&raw)
            .map_err(|e| session_store::Error::Decode(e.to_string()))?;

        if record.expiry_date <= OffsetDateTime::now_utc() {
            self.blocking(move |storage| purge(storage, &key, &record).map_err(backend))
                .await?;
            return Ok(None);
        }

        Ok(Some(record))
    }

    async fn delete(&self, session_id: &Id) -> session_store::Result<()> {
        let key = Self::key(session_id);
        self.blocking(move |storage| storage.remove(&key).map_err(backend))
            .await
    }
}

#[async_trait]
impl ExpiredDeletion for KvSessionStore {
    async fn delete_expired(&self) -> session_store::Result<()> {
        let removed = self
            .blocking(|storage| {
                sweep_expired(storage, OffsetDateTime::now_utc()).map_err(backend)
            })
            .await?;

        if removed > 0 {
            tracing::info!(removed, "Deleted expired sessions and their carts");
        } else {
            tracing::debug!("No expired sessions");
        }
        Ok(())
    }
}

/// Create the session layer over the cart storage backend.
///
/// # Arguments
///
/// * `storage` - Backend shared with the cart store
/// * `config` - Storefront configuration (for cookie security)
#[must_use]
pub fn create_session_layer(
    storage: Arc<dyn KeyValueStore>,
    config: &StorefrontConfig,
) -> SessionManagerLayer<KvSessionStore> {
    SessionManagerLayer::new(KvSessionStore::new(storage))
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_secure())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use tower_sessions::cookie::time::Duration;

    use super::*;
    use crate::storage::MemoryStore;

    fn record_with_cart(expires_in: Duration) -> (Record, String) {
        let token = CartToken::generate();
        let mut data = HashMap::new();
        data.insert(
            session_keys::CART_TOKEN.to_string(),
            serde_json::to_value(token).unwrap(),
        );
        let record = Record {
            id: Id::default(),
            data,
            expiry_date: OffsetDateTime::now_utc() + expires_in,
        };
        (record, token.storage_key())
    }

    fn record(expires_in: Duration) -> Record {
        let mut data = HashMap::new();
        data.insert("cart_token".to_string(), serde_json::json!("abc"));
        Record {
            id: Id::default(),
            data,
            expiry_date: OffsetDateTime::now_utc() + expires_in,
        }
    }

    #[tokio::test]
    async fn test_save_and_load_round_trip() {
        let store = KvSessionStore::new(Arc::new(MemoryStore::new()));
        let record = record(Duration::hours(1));

        store.save(&record).await.unwrap();
        let loaded = store.load(&record.id).await.unwrap().unwrap();
        assert_eq!(loaded.data.get("cart_token"), record.data.get("cart_token"));
    }

    #[tokio::test]
    async fn test_expired_record_is_dropped_with_its_cart() {
        let storage = Arc::new(MemoryStore::new());
        let store = KvSessionStore::new(storage.clone());
        let (record, cart) = record_with_cart(Duration::hours(-1));
        storage.set(&cart, "{\"items\":[]}").unwrap();

        store.save(&record).await.unwrap();
        assert!(store.load(&record.id).await.unwrap().is_none());
        assert!(storage.is_empty());
    }

    #[tokio::test]
    async fn test_delete_expired_removes_sessions_and_carts() {
        let storage = Arc::new(MemoryStore::new());
        let store = KvSessionStore::new(storage.clone());

        let (expired, expired_cart) = record_with_cart(Duration::hours(-1));
        let (live, live_cart) = record_with_cart(Duration::hours(1));
        storage.set(&expired_cart, "{\"items\":[]}").unwrap();
        storage.set(&live_cart, "{\"items\":[]}").unwrap();
        store.save(&expired).await.unwrap();
        store.save(&live).await.unwrap();
        assert_eq!(storage.len(), 4);

        store.delete_expired().await.unwrap();

        assert_eq!(storage.get(&KvSessionStore::key(&expired.id)).unwrap(), None);
        assert_eq!(storage.get(&expired_cart).unwrap(), None);
        assert!(storage.get(&KvSessionStore::key(&live.id)).unwrap().is_some());
        assert!(storage.get(&live_cart).unwrap().is_some());
        assert_eq!(storage.len(), 2);
    }

    #[tokio::test]
    async fn test_delete_expired_skips_unreadable_records() {
        let storage = Arc::new(MemoryStore::new());
        let store = KvSessionStore::new(storage.clone());
        storage.set("barbaro-session:garbage", "not json").unwrap();
        let (expired, _) = record_with_cart(Duration::minutes(-5));
        store.save(&expired).await.unwrap();

        store.delete_expired().await.unwrap();

        assert_eq!(storage.keys("barbaro-session:").unwrap(), ["barbaro-session:garbage"]);
    }

    #[tokio::test]
    async fn test_delete_removes_record() {
        let store = KvSessionStore::new(Arc::new(MemoryStore::new()));
        let record = record(Duration::hours(1));

        store.save(&record).await.unwrap();
        store.delete(&record.id).await.unwrap();
        assert!(store.load(&record.id).await.unwrap().is_none());
    }
}
