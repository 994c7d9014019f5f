//! Key/value metadata attached to library entities.
//!
//! Every setting the reader persists lives in string metadata attached to a
//! [`Holder`]: the global scope, a manga, a chapter, a category or a source.
//! This crate owns the storage side of that model. Interpreting the values
//! (defaults, layering, migrations) belongs to `yomu-settings`.
//!
//! # Architecture
//! - **[`MetaBag`]**: one holder's complete metadata, as stored. Keys owned by
//!   this application carry [`APP_KEY_PREFIX`]; foreign keys are kept but
//!   never interpreted.
//! - **[`MetaStore`]**: the backend trait. [`SqliteStore`] keeps metadata in
//!   a local [`Database`]; `GraphqlStore` (feature `graphql`) talks to the
//!   reader server; `MemoryStore` (feature `mock`) is for tests.
//! - **[`value`]**: the string codec shared by every backend.

mod bag;
mod db;
pub mod error;
mod holder;
mod store;
pub mod value;

pub use crate::bag::{APP_KEY_PREFIX, MetaBag, app_key};
pub use crate::db::{Database, Location};
pub use crate::holder::{Holder, HolderKind};
#[cfg(feature = "graphql")]
pub use crate::store::GraphqlStore;
#[cfg(any(test, feature = "mock"))]
pub use crate::store::MemoryStore;
pub use crate::store::{MetaStore, SqliteStore, StoreHandle, write_metas};
