use crate::Database;
use crate::bag::MetaBag;
use crate::error::{ErrorKind, Result};
use crate::holder::{Holder, HolderKind};
use crate::store::MetaStore;
use async_trait::async_trait;
use exn::ResultExt;
use sqlx::SqlitePool;
use time::UtcDateTime;

#[derive(sqlx::FromRow)]
struct MetaRow {
    key: String,
    value: String,
}

#[derive(sqlx::FromRow)]
struct HolderRow {
    holder_type: String,
    holder_id: String,
}

/// Metadata stored in a local SQLite [`Database`].
///
/// With `dry_run` enabled, writes are computed but not persisted: the
/// returned bag shows what the holder's metadata would have become.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
    dry_run: bool,
}
impl From<&Database> for SqliteStore {
    fn from(db: &Database) -> Self {
        Self { pool: db.pool().clone(), dry_run: false }
    }
}
impl SqliteStore {
    pub fn new(pool: SqlitePool, dry_run: bool) -> Self {
        Self { pool, dry_run }
    }

    /// Every holder that currently has at least one metadata entry.
    pub async fn holders(&self) -> Result<Vec<Holder>> {
        let rows: Vec<HolderRow> = sqlx::query_as(include_str!("../../queries/list_holders.sql"))
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        rows.into_iter()
            .map(|row| {
                let kind = row.holder_type.parse::<HolderKind>().or_raise(|| ErrorKind::InvalidData("holder type"))?;
                Holder::from_parts(kind, &row.holder_id).or_raise(|| ErrorKind::InvalidData("holder id"))
            })
            .collect()
    }
}

#[async_trait]
impl MetaStore for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn metas(&self, holder: &Holder) -> Result<MetaBag> {
        let rows: Vec<MetaRow> = sqlx::query_as(include_str!("../../queries/select_metas.sql"))
            .bind(holder.kind().as_str())
            .bind(holder.id())
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(rows.into_iter().map(|row| (row.key, row.value)).collect())
    }

    async fn set(&self, holder: &Holder, key: &str, value: &str) -> Result<MetaBag> {
        if self.dry_run {
            let mut bag = self.metas(holder).await?;
            bag.insert_raw(key, value);
            tracing::info!(%holder, key, value, "dry run: metadata not written");
            return Ok(bag);
        }
        sqlx::query(include_str!("../../queries/upsert_meta.sql"))
            .bind(holder.kind().as_str())
            .bind(holder.id())
            .bind(key)
            .bind(value)
            .bind(UtcDateTime::now().unix_timestamp())
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        self.metas(holder).await
    }

    async fn delete(&self, holder: &Holder, key: &str) -> Result<MetaBag> {
        if self.dry_run {
            let mut bag = self.metas(holder).await?;
            bag.remove_raw(key);
            tracing::info!(%holder, key, "dry run: metadata not deleted");
            return Ok(bag);
        }
        sqlx::query(include_str!("../../queries/delete_meta.sql"))
            .bind(holder.kind().as_str())
            .bind(holder.id())
            .bind(key)
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        self.metas(holder).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app_key;
    use crate::store::write_metas;

    async fn store() -> SqliteStore {
        SqliteStore::from(&Database::connect_in_memory().await.unwrap())
    }

    #[tokio::test]
    async fn test_set_and_read_back() {
        let store = store().await;
        let holder = Holder::Manga(12);
        let bag = store.set(&holder, &app_key("pageGap"), "8").await.unwrap();
        assert_eq!(bag.get("pageGap"), Some("8"));
        // Holders are isolated from each other.
        assert!(store.metas(&Holder::Manga(13)).await.unwrap().is_empty());
        assert!(store.metas(&Holder::Global).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_last_write_wins() {
        let store = store().await;
        let holder = Holder::Global;
        store.set(&holder, &app_key("readingMode"), "SINGLE_PAGE").await.unwrap();
        let bag = store.set(&holder, &app_key("readingMode"), "WEBTOON").await.unwrap();
        assert_eq!(bag.len(), 1);
        assert_eq!(bag.get("readingMode"), Some("WEBTOON"));
    }

    #[tokio::test]
    async fn test_delete_removes_key() {
        let store = store().await;
        let holder = Holder::Source("2499283573021220255".to_string());
        store.set(&holder, &app_key("a"), "1").await.unwrap();
        store.set(&holder, &app_key("b"), "2").await.unwrap();
        let bag = store.delete(&holder, &app_key("a")).await.unwrap();
        assert!(!bag.contains("a"));
        assert_eq!(bag.get("b"), Some("2"));
        // Deleting again is fine.
        store.delete(&holder, &app_key("a")).await.unwrap();
    }

    #[tokio::test]
    async fn test_dry_run_does_not_persist() {
        let db = Database::connect_in_memory().await.unwrap();
        let store = SqliteStore::new(db.pool().clone(), true);
        let bag = store.set(&Holder::Category(1), &app_key("showUnreadBadge"), "false").await.unwrap();
        assert_eq!(bag.get("showUnreadBadge"), Some("false"));
        assert!(store.metas(&Holder::Category(1)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_write_metas_applies_every_change() {
        let store = store().await;
        let holder = Holder::Manga(1);
        store.set(&holder, &app_key("stale"), "x").await.unwrap();
        let bag = write_metas(
            &store,
            &holder,
            [
                (app_key("pageGap"), Some("4".to_string())),
                (app_key("isStaticNav"), Some("true".to_string())),
                (app_key("stale"), None),
            ],
        )
        .await
        .unwrap();
        assert_eq!(bag.get("pageGap"), Some("4"));
        assert_eq!(bag.get("isStaticNav"), Some("true"));
        assert!(!bag.contains("stale"));
    }

    #[tokio::test]
    async fn test_list_holders() {
        let store = store().await;
        store.set(&Holder::Global, &app_key("a"), "1").await.unwrap();
        store.set(&Holder::Manga(5), &app_key("a"), "1").await.unwrap();
        store.set(&Holder::Manga(5), &app_key("b"), "1").await.unwrap();
        let holders = store.holders().await.unwrap();
        assert_eq!(holders, vec![Holder::Global, Holder::Manga(5)]);
    }
}
