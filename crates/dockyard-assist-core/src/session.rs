//! Durable mirror of the search overlay session.
//!
//! The overlay's `(query, is_active)` pair is stored as two string entries
//! in a [`KeyValueStorage`]:
//!
//! | Key | Value |
//! |-----|-------|
//! | `<namespace>-search-query` | the raw query text |
//! | `<namespace>-show-results` | the literal `"true"` |
//!
//! Both keys exist exactly when the session is active with a non-empty
//! query; otherwise both are absent. [`SessionRepository`] is the seam the
//! overlay talks to, so tests can swap in [`MemoryStorage`].

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use anyhow::{anyhow, Result};

use crate::models::SearchSession;

/// Value stored under the "show results" key while a session is active.
pub const ACTIVE_FLAG: &str = "true";

/// Synchronous string key-value store.
pub trait KeyValueStorage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

impl<S: KeyValueStorage + ?Sized> KeyValueStorage for Arc<S> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
}

/// In-memory storage for tests and embedders without a durable store.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RwLock<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keys currently present, in sorted order.
    pub fn keys(&self) -> Vec<String> {
        self.entries
            .read()
            .map(|e| e.keys().cloned().collect())
            .unwrap_or_default()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| anyhow!("memory storage lock poisoned"))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| anyhow!("memory storage lock poisoned"))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| anyhow!("memory storage lock poisoned"))?;
        entries.remove(key);
        Ok(())
    }
}

/// Load/save/clear access to the persisted search session.
pub trait SessionRepository: Send + Sync {
    /// The persisted session, if a restorable one exists.
    fn load(&self) -> Result<Option<SearchSession>>;

    /// Mirrors `session`. A session that should not persist clears instead.
    fn save(&self, session: &SearchSession) -> Result<()>;

    /// Removes every persisted entry.
    fn clear(&self) -> Result<()>;
}

/// [`SessionRepository`] over two namespaced keys in a [`KeyValueStorage`].
#[derive(Debug)]
pub struct KeyedSessionRepository<S> {
    storage: S,
    query_key: String,
    active_key: String,
}

impl<S: KeyValueStorage> KeyedSessionRepository<S> {
    pub fn new(storage: S, namespace: &str) -> Self {
        Self {
            storage,
            query_key: format!("{}-search-query", namespace),
            active_key: format!("{}-show-results", namespace),
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn query_key(&self) -> &str {
        &self.query_key
    }

    pub fn active_key(&self) -> &str {
        &self.active_key
    }
}

impl<S: KeyValueStorage> SessionRepository for KeyedSessionRepository<S> {
    fn load(&self) -> Result<Option<SearchSession>> {
        let query = self.storage.get(&self.query_key)?;
        let active = self.storage.get(&self.active_key)?;
        Ok(match (query, active) {
            (Some(query), Some(active)) if !query.is_empty() && active == ACTIVE_FLAG => {
                Some(SearchSession::active(query))
            }
            _ => None,
        })
    }

    fn save(&self, session: &SearchSession) -> Result<()> {
        if !session.should_persist() {
            return self.clear();
        }
        self.storage.set(&self.query_key, &session.query)?;
        self.storage.set(&self.active_key, ACTIVE_FLAG)
    }

    fn clear(&self) -> Result<()> {
        self.storage.remove(&self.query_key)?;
        self.storage.remove(&self.active_key)
    }
}
