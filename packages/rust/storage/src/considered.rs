//! Previously-considered company tracking.
//!
//! The database table is the source of truth; an in-memory set mirrors it so
//! a run's filter checks don't hit the database per name. Keys are lowercased
//! for case-insensitive matching.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

use partnerscout_shared::Result;

use crate::Storage;

/// Read-through cached view of the `previously_considered` table.
pub struct ConsideredSet {
    storage: Arc<Storage>,
    cache: RwLock<Option<HashSet<String>>>,
}

impl ConsideredSet {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self {
            storage,
            cache: RwLock::new(None),
        }
    }

    /// Load the cache from the database if it hasn't been loaded yet.
    async fn ensure_loaded(&self) -> Result<()> {
        {
            let cache = self.cache.read().await;
            if cache.is_some() {
                return Ok(());
            }
        }

        let keys: HashSet<String> = self.storage.considered_keys().await?.into_iter().collect();
        debug!(count = keys.len(), "loaded considered set");
        *self.cache.write().await = Some(keys);
        Ok(())
    }

    /// Whether a company name has been considered before (case-insensitive).
    pub async fn contains(&self, name: &str) -> Result<bool> {
        self.ensure_loaded().await?;
        let cache = self.cache.read().await;
        Ok(cache
            .as_ref()
            .is_some_and(|keys| keys.contains(&name.to_lowercase())))
    }

    /// Mark names as considered, in both the database and the cache.
    pub async fn add_all(&self, names: &[String]) -> Result<()> {
        if names.is_empty() {
            return Ok(());
        }
        self.ensure_loaded().await?;
        self.storage.add_considered(names).await?;

        let mut cache = self.cache.write().await;
        if let Some(keys) = cache.as_mut() {
            for name in names {
                keys.insert(name.to_lowercase());
            }
        }
        Ok(())
    }

    /// Drop the in-memory mirror; the next read reloads from the database.
    pub async fn invalidate(&self) {
        *self.cache.write().await = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::test_storage;

    #[tokio::test]
    async fn contains_after_add_without_reload() {
        let set = ConsideredSet::new(Arc::new(test_storage().await));

        assert!(!set.contains("Acme").await.unwrap());
        set.add_all(&["Acme".into()]).await.unwrap();
        assert!(set.contains("acme").await.unwrap());
        assert!(set.contains("ACME").await.unwrap());
        assert!(!set.contains("RivalCo").await.unwrap());
    }

    #[tokio::test]
    async fn survives_cache_invalidation() {
        let storage = Arc::new(test_storage().await);
        let set = ConsideredSet::new(storage.clone());

        set.add_all(&["Acme".into()]).await.unwrap();
        set.invalidate().await;
        // Reloads from the database.
        assert!(set.contains("Acme").await.unwrap());
    }

    #[tokio::test]
    async fn reset_empties_store_and_cache() {
        let storage = Arc::new(test_storage().await);
        let set = ConsideredSet::new(storage.clone());

        set.add_all(&["Acme".into(), "RivalCo".into()]).await.unwrap();
        storage.clear_all().await.unwrap();
        set.invalidate().await;

        assert!(!set.contains("Acme").await.unwrap());
        assert!(storage.considered_keys().await.unwrap().is_empty());
    }
}
