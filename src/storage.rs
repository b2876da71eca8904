//! Scoped string persistence consumed by the history store.
//!
//! `Database` is the production backend; `MemoryStore` is an in-process map
//! used by tests and by callers that do not want anything on disk.

use std::{
    collections::HashMap,
    future::Future,
    sync::{Arc, Mutex},
};

use anyhow::{anyhow, bail, Result};

use crate::db::Database;

pub trait KeyValueStore: Send + Sync + 'static {
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>>> + Send;

    /// Replace the whole value under `key`. A failed write must leave the previous value intact.
    fn set(&self, key: &str, value: String) -> impl Future<Output = Result<()>> + Send;
}

impl KeyValueStore for Database {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.get_value(key).await
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        self.set_value(key, value).await
    }
}

/// Shared in-memory map. Clones see the same entries.
///
/// An optional byte quota makes `set` fail the way a full browser storage
/// area does, which is how persistence warnings are exercised.
#[derive(Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
    quota_bytes: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            entries: Arc::default(),
            quota_bytes: Some(quota_bytes),
        }
    }

    /// Write without quota checks, e.g. to plant corrupt content.
    pub fn insert_raw(&self, key: &str, value: &str) {
        let mut guard = match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.insert(key.to_string(), value.to_string());
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        let guard = match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.get(key).cloned()
    }
}

impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let guard = self
            .entries
            .lock()
            .map_err(|_| anyhow!("memory store lock poisoned"))?;
        Ok(guard.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|_| anyhow!("memory store lock poisoned"))?;

        if let Some(quota) = self.quota_bytes {
            let others: usize = guard
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            let needed = others + key.len() + value.len();
            if needed > quota {
                bail!("storage quota exceeded ({needed} > {quota} bytes)");
            }
        }

        guard.insert(key.to_string(), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_store_clones_share_entries() {
        let store = MemoryStore::new();
        let other = store.clone();

        store.set("k", "v".into()).await.unwrap();

        assert_eq!(other.get("k").await.unwrap().as_deref(), Some("v"));
        assert_eq!(other.get("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn quota_rejects_write_and_keeps_old_value() {
        let store = MemoryStore::with_quota(8);
        store.set("k", "small".into()).await.unwrap();

        let err = store.set("k", "much too large".into()).await.unwrap_err();

        assert!(err.to_string().contains("quota exceeded"));
        assert_eq!(store.raw("k").as_deref(), Some("small"));
    }
}
