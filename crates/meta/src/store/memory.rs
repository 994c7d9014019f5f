//! In-memory metadata store for testing.

use crate::bag::MetaBag;
use crate::error::{ErrorKind, Result};
use crate::holder::Holder;
use crate::store::MetaStore;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;

/// In-memory metadata store for testing.
///
/// Bags are kept in a `HashMap` behind a [`RwLock`]. Writes to keys
/// registered with [`fail_writes_for`](Self::fail_writes_for) are rejected,
/// which lets tests exercise partially applied multi-key updates.
///
/// ```
/// use yomu_meta::{Holder, MetaStore, MemoryStore, app_key};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryStore::with_metas([(Holder::Global, app_key("pageGap"), "4")]);
/// let bag = store.metas(&Holder::Global).await.map_err(|e| e.to_string())?;
/// assert_eq!(bag.get("pageGap"), Some("4"));
/// # Ok(())
/// # }
/// ```
pub struct MemoryStore {
    name: String,
    bags: RwLock<HashMap<Holder, MetaBag>>,
    failing: HashSet<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_metas(Vec::<(Holder, String, String)>::new())
    }

    /// Create a store pre-populated with `(holder, stored key, value)` entries.
    pub fn with_metas(entries: impl IntoIterator<Item = (Holder, impl Into<String>, impl Into<String>)>) -> Self {
        let mut bags: HashMap<Holder, MetaBag> = HashMap::new();
        for (holder, key, value) in entries {
            bags.entry(holder).or_default().insert_raw(key, value);
        }
        Self {
            name: "memory".to_string(),
            bags: RwLock::new(bags),
            failing: HashSet::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Reject every write (set or delete) of the given stored key.
    pub fn fail_writes_for(mut self, key: impl Into<String>) -> Self {
        self.failing.insert(key.into());
        self
    }

    fn check_writable(&self, key: &str) -> Result<()> {
        if self.failing.contains(key) {
            exn::bail!(ErrorKind::Rejected(format!("write of {key} refused")));
        }
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MetaStore for MemoryStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn metas(&self, holder: &Holder) -> Result<MetaBag> {
        Ok(self.bags.read().await.get(holder).cloned().unwrap_or_default())
    }

    async fn set(&self, holder: &Holder, key: &str, value: &str) -> Result<MetaBag> {
        self.check_writable(key)?;
        let mut bags = self.bags.write().await;
        let bag = bags.entry(holder.clone()).or_default();
        bag.insert_raw(key, value);
        Ok(bag.clone())
    }

    async fn delete(&self, holder: &Holder, key: &str) -> Result<MetaBag> {
        self.check_writable(key)?;
        let mut bags = self.bags.write().await;
        let bag = bags.entry(holder.clone()).or_default();
        bag.remove_raw(key);
        Ok(bag.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app_key;
    use crate::store::write_metas;

    #[tokio::test]
    async fn test_partial_write_keeps_successful_keys() {
        let store = MemoryStore::new().fail_writes_for(app_key("pageGap"));
        let holder = Holder::Manga(3);
        let err = write_metas(
            &store,
            &holder,
            [
                (app_key("pageGap"), Some("4".to_string())),
                (app_key("isStaticNav"), Some("true".to_string())),
            ],
        )
        .await
        .unwrap_err();
        match &*err {
            ErrorKind::PartialWrite { failed, written } => {
                assert_eq!(failed, &vec![app_key("pageGap")]);
                assert_eq!(written, &vec![app_key("isStaticNav")]);
            },
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.is_retryable());
        // No rollback: the successful key stays written.
        let bag = store.metas(&holder).await.unwrap();
        assert_eq!(bag.get("isStaticNav"), Some("true"));
        assert!(!bag.contains("pageGap"));
    }

    #[tokio::test]
    async fn test_unknown_holder_is_empty() {
        let store = MemoryStore::new();
        assert!(store.metas(&Holder::Chapter(99)).await.unwrap().is_empty());
    }
}
