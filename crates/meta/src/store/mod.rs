//! Metadata store trait and implementations.
//!
//! A [`MetaStore`] is the only way the rest of the workspace reads or writes
//! metadata. The backend (a GraphQL server, a local SQLite database, or an
//! in-memory map in tests) is picked once at startup and shared as a
//! [`StoreHandle`].

#[cfg(feature = "graphql")]
mod graphql;
#[cfg(any(test, feature = "mock"))]
mod memory;
mod sqlite;

#[cfg(feature = "graphql")]
pub use self::graphql::GraphqlStore;
#[cfg(any(test, feature = "mock"))]
pub use self::memory::MemoryStore;
pub use self::sqlite::SqliteStore;
use crate::bag::MetaBag;
use crate::error::{ErrorKind, Result};
use crate::holder::Holder;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::instrument;

pub type StoreHandle = Arc<dyn MetaStore>;

/// Unified interface for metadata backends.
///
/// Keys passed to this trait are stored keys, already carrying
/// [`APP_KEY_PREFIX`](crate::APP_KEY_PREFIX) where applicable (see
/// [`app_key`](crate::app_key)). Each `(holder, key)` pair has at most one
/// value; writing again replaces it.
#[async_trait]
pub trait MetaStore: Send + Sync {
    /// Name of the backend, used for logging only.
    fn name(&self) -> &str;

    /// All metadata of `holder`. Unknown holders have an empty bag.
    async fn metas(&self, holder: &Holder) -> Result<MetaBag>;

    /// Set one key, returning the holder's metadata after the write.
    async fn set(&self, holder: &Holder, key: &str, value: &str) -> Result<MetaBag>;

    /// Remove one key so resolution falls back to the next layer, returning
    /// the holder's metadata after the delete. Deleting a missing key is not
    /// an error.
    async fn delete(&self, holder: &Holder, key: &str) -> Result<MetaBag>;
}

/// Apply several key changes to one holder: `Some(value)` writes, `None` deletes.
///
/// Every key is written by its own request, all in flight at once. There is
/// no transaction: when some writes fail the others stay applied, and
/// [`ErrorKind::PartialWrite`] lists which keys made it. On success the
/// holder's metadata is re-read and returned.
#[instrument(skip(store, changes), fields(store = store.name(), %holder))]
pub async fn write_metas(
    store: &dyn MetaStore,
    holder: &Holder,
    changes: impl IntoIterator<Item = (String, Option<String>)>,
) -> Result<MetaBag> {
    let changes: Vec<_> = changes.into_iter().collect();
    let writes = changes.iter().map(|(key, value)| async move {
        let outcome = match value {
            Some(value) => store.set(holder, key, value).await,
            None => store.delete(holder, key).await,
        };
        (key.as_str(), outcome)
    });
    let (mut written, mut failed) = (Vec::new(), Vec::new());
    for (key, outcome) in futures::future::join_all(writes).await {
        match outcome {
            Ok(_) => written.push(key.to_string()),
            Err(e) => {
                tracing::warn!(key, error = ?e, "metadata write failed");
                failed.push(key.to_string());
            },
        }
    }
    if !failed.is_empty() {
        exn::bail!(ErrorKind::PartialWrite { failed, written });
    }
    tracing::debug!(count = written.len(), "metadata written");
    store.metas(holder).await
}
