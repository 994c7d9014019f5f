use crate::download::DownloadSettings;
use crate::error::{Error, ErrorKind, Result};
use crate::options::{ChapterListOptions, LibraryOptions};
use crate::profile::{profile_key, resolve_reader_settings};
use crate::reader::{ReaderSettings, ReadingMode};
use crate::resolve::{MetaLayer, MetaSettings, SettingsResolver, WithDefaultFlags};
use exn::ResultExt;
use futures::future::join;
use serde_json::{Map, Value};
use std::str::FromStr;
use tracing::instrument;
use yomu_meta::value::encode;
use yomu_meta::{Holder, MetaBag, MetaStore, StoreHandle, app_key, write_metas};

/// Settings domains that can be loaded generically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsDomain {
    Reader,
    Download,
    ChapterList,
    Library,
}

impl FromStr for SettingsDomain {
    type Err = Error;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().replace('-', "_").to_ascii_lowercase().as_str() {
            "reader" => Ok(Self::Reader),
            "download" | "downloads" => Ok(Self::Download),
            "chapter_list" | "chapters" => Ok(Self::ChapterList),
            "library" => Ok(Self::Library),
            _ => exn::bail!(ErrorKind::Unknown(format!("settings domain {s:?}"))),
        }
    }
}

/// Reads and writes typed settings through a metadata store.
///
/// Reads have no side effects: migrated values are only persisted when the
/// caller saves.
#[derive(Clone)]
pub struct SettingsService {
    store: StoreHandle,
}

impl SettingsService {
    pub fn new(store: StoreHandle) -> Self {
        Self { store }
    }

    async fn bag(&self, holder: &Holder) -> Result<MetaBag> {
        self.store.metas(holder).await.or_raise(|| ErrorKind::Store)
    }

    /// Settings of a single holder over the domain defaults.
    #[instrument(skip(self), fields(store = self.store.name()))]
    pub async fn load<T: MetaSettings>(&self, holder: &Holder) -> Result<WithDefaultFlags<T>> {
        let bag = self.bag(holder).await?;
        Ok(SettingsResolver::<T>::default().layer(MetaLayer::from_bag(&bag)).resolve_with_flags())
    }

    /// Settings of `holder` with the global settings as fallback layer.
    /// For the global holder itself this is the same as [`load`](Self::load).
    #[instrument(skip(self), fields(store = self.store.name()))]
    pub async fn load_inherited<T: MetaSettings>(&self, holder: &Holder) -> Result<WithDefaultFlags<T>> {
        if *holder == Holder::Global {
            return self.load(holder).await;
        }
        let (global, own) = join(self.bag(&Holder::Global), self.bag(holder)).await;
        Ok(SettingsResolver::<T>::default()
            .layer(MetaLayer::from_bag(&global?))
            .layer(MetaLayer::from_bag(&own?))
            .resolve_with_flags())
    }

    /// Fully resolved reader settings of a manga.
    #[instrument(skip(self, genres), fields(store = self.store.name()))]
    pub async fn load_reader(&self, manga_id: i64, genres: &[String]) -> Result<WithDefaultFlags<ReaderSettings>> {
        let (global, manga) = join(self.bag(&Holder::Global), self.bag(&Holder::Manga(manga_id))).await;
        Ok(resolve_reader_settings(&global?, &manga?, genres))
    }

    /// Any domain as `{ key: { value, isDefault } }` JSON.
    ///
    /// Reader settings exist globally and per manga; a manga's go through
    /// the same layers as [`load_reader`](Self::load_reader), without genres.
    pub async fn load_json(&self, domain: SettingsDomain, holder: &Holder) -> Result<Value> {
        Ok(match domain {
            SettingsDomain::Reader => match holder {
                Holder::Global => self.load::<ReaderSettings>(holder).await?.to_json(),
                Holder::Manga(id) => self.load_reader(*id, &[]).await?.to_json(),
                other => exn::bail!(ErrorKind::InvalidValue(format!("{} holders have no reader settings", other.kind()))),
            },
            SettingsDomain::Download => self.load::<DownloadSettings>(holder).await?.to_json(),
            SettingsDomain::ChapterList => self.load::<ChapterListOptions>(holder).await?.to_json(),
            SettingsDomain::Library => self.load_inherited::<LibraryOptions>(holder).await?.to_json(),
        })
    }

    /// Persist the keys whose value differs between `old` and `new`, one
    /// write per key. Returns the holder's metadata after the writes.
    #[instrument(skip(self, old, new), fields(store = self.store.name()))]
    pub async fn save<T: MetaSettings>(&self, holder: &Holder, old: &T, new: &T) -> Result<MetaBag> {
        let changes = changed_keys(old, new)?;
        if changes.is_empty() {
            tracing::debug!("no settings changed");
            return self.bag(holder).await;
        }
        let changes = changes.into_iter().map(|(key, value)| (app_key(key), Some(encode(&value))));
        write_metas(self.store.as_ref(), holder, changes).await.or_raise(|| ErrorKind::Store)
    }

    /// Set one key. The value is encoded with the shared metadata codec.
    #[instrument(skip(self), fields(store = self.store.name()))]
    pub async fn set(&self, holder: &Holder, key: &str, value: &Value) -> Result<MetaBag> {
        self.store.set(holder, &app_key(key), &encode(value)).await.or_raise(|| ErrorKind::Store)
    }

    /// Set one reader setting of a reading-mode profile.
    pub async fn save_profile(&self, mode: ReadingMode, key: &str, value: &Value) -> Result<MetaBag> {
        if key == "readingMode" {
            exn::bail!(ErrorKind::InvalidValue("profiles cannot change the reading mode".to_string()));
        }
        self.set(&Holder::Global, &profile_key(mode, key), value).await
    }

    /// Delete one key so resolution falls back to the next layer.
    #[instrument(skip(self), fields(store = self.store.name()))]
    pub async fn reset(&self, holder: &Holder, key: &str) -> Result<MetaBag> {
        self.store.delete(holder, &app_key(key)).await.or_raise(|| ErrorKind::Store)
    }
}

/// Top-level keys whose serialized value differs.
fn changed_keys<T: MetaSettings>(old: &T, new: &T) -> Result<Vec<(String, Value)>> {
    let (old, new) = (to_map(old)?, to_map(new)?);
    Ok(new.into_iter().filter(|(key, value)| old.get(key) != Some(value)).collect())
}

fn to_map<T: MetaSettings>(settings: &T) -> Result<Map<String, Value>> {
    match serde_json::to_value(settings) {
        Ok(Value::Object(map)) => Ok(map),
        _ => exn::bail!(ErrorKind::InvalidValue("settings must serialize to an object".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;
    use yomu_meta::MemoryStore;

    fn service(store: MemoryStore) -> (SettingsService, StoreHandle) {
        let store: StoreHandle = Arc::new(store);
        (SettingsService::new(store.clone()), store)
    }

    #[tokio::test]
    async fn test_load_reader_layers_global_profile_and_manga() {
        let (service, _) = service(MemoryStore::with_metas([
            (Holder::Global, app_key("pageGap"), "10"),
            (Holder::Global, app_key("readerProfile_webtoon_pageGap"), "0"),
            (Holder::Manga(7), app_key("readingMode"), "WEBTOON"),
        ]));
        let resolved = service.load_reader(7, &[]).await.unwrap();
        assert_eq!(resolved.value.reading_mode, ReadingMode::Webtoon);
        assert_eq!(resolved.value.page_gap, 0);
        assert!(!resolved.is_default("readingMode"));
        let other = service.load_reader(8, &[]).await.unwrap();
        assert_eq!(other.value.page_gap, 10);
    }

    #[tokio::test]
    async fn test_reads_do_not_persist_migrations() {
        let (service, store) = service(MemoryStore::with_metas([(Holder::Global, app_key("chapterToDelete"), "true")]));
        let loaded = service.load::<DownloadSettings>(&Holder::Global).await.unwrap();
        assert_eq!(loaded.value.delete_chapters_while_reading, 1);
        let bag = store.metas(&Holder::Global).await.unwrap();
        assert_eq!(bag.get("chapterToDelete"), Some("true"));
        assert!(!bag.contains("deleteChaptersWhileReading"));
    }

    #[tokio::test]
    async fn test_save_writes_only_changed_keys() {
        let (service, store) = service(MemoryStore::new());
        let old = ChapterListOptions::default();
        let new = ChapterListOptions {
            excluded_scanlators: vec!["Foo".to_string()],
            unread: Some(true),
            ..old.clone()
        };
        let bag = service.save(&Holder::Manga(1), &old, &new).await.unwrap();
        assert_eq!(bag.len(), 2);
        assert_eq!(bag.get("excludedScanlators"), Some(r#"["Foo"]"#));
        assert_eq!(bag.get("unread"), Some("true"));
        // Round-trip through the resolver.
        let loaded = service.load::<ChapterListOptions>(&Holder::Manga(1)).await.unwrap();
        assert_eq!(loaded.value, new);
        assert!(loaded.is_default("sortBy"));
        assert!(store.metas(&Holder::Manga(2)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_reports_partial_failure() {
        let (service, store) = service(MemoryStore::new().fail_writes_for(app_key("pageGap")));
        let old = ReaderSettings::default();
        let new = ReaderSettings { page_gap: 0, is_static_nav: true, ..old.clone() };
        let err = service.save(&Holder::Global, &old, &new).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Store));
        let bag = store.metas(&Holder::Global).await.unwrap();
        assert_eq!(bag.get("isStaticNav"), Some("true"));
        assert!(!bag.contains("pageGap"));
    }

    #[tokio::test]
    async fn test_reset_falls_back_to_next_layer() {
        let (service, _) = service(MemoryStore::with_metas([
            (Holder::Global, app_key("gridLayout"), "LIST"),
            (Holder::Category(3), app_key("gridLayout"), "COMPACT"),
        ]));
        let before = service.load_inherited::<LibraryOptions>(&Holder::Category(3)).await.unwrap();
        assert_eq!(before.value.grid_layout, crate::options::GridLayout::Compact);
        service.reset(&Holder::Category(3), "gridLayout").await.unwrap();
        let after = service.load_inherited::<LibraryOptions>(&Holder::Category(3)).await.unwrap();
        assert_eq!(after.value.grid_layout, crate::options::GridLayout::List);
        assert!(after.is_default("gridLayout"));
    }

    #[tokio::test]
    async fn test_save_profile() {
        let (service, _) = service(MemoryStore::new());
        let bag = service.save_profile(ReadingMode::DoublePage, "pageGap", &json!(2)).await.unwrap();
        assert_eq!(bag.get("readerProfile_double_page_pageGap"), Some("2"));
        let err = service.save_profile(ReadingMode::DoublePage, "readingMode", &json!("WEBTOON")).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidValue(_)));
    }

    #[tokio::test]
    async fn test_load_json_shape() {
        let (service, _) = service(MemoryStore::with_metas([(Holder::Global, app_key("downloadAheadLimit"), "5")]));
        let json = service.load_json(SettingsDomain::Download, &Holder::Global).await.unwrap();
        assert_eq!(json["downloadAheadLimit"], json!({ "value": 5, "isDefault": false }));
        assert_eq!(json["deleteChaptersWithBookmark"], json!({ "value": false, "isDefault": true }));
    }

    #[tokio::test]
    async fn test_load_json_reader_matches_load_reader() {
        let (service, _) = service(MemoryStore::with_metas([
            (Holder::Global, app_key("pageGap"), "10"),
            (Holder::Global, app_key("readerProfile_double_page_pageGap"), "2"),
            (Holder::Manga(5), app_key("readingMode"), "DOUBLE_PAGE"),
        ]));
        let json = service.load_json(SettingsDomain::Reader, &Holder::Manga(5)).await.unwrap();
        assert_eq!(json["pageGap"], json!({ "value": 2, "isDefault": true }));
        assert_eq!(json["readingMode"], json!({ "value": "DOUBLE_PAGE", "isDefault": false }));
        assert_eq!(json, service.load_reader(5, &[]).await.unwrap().to_json());

        let global = service.load_json(SettingsDomain::Reader, &Holder::Global).await.unwrap();
        assert_eq!(global["pageGap"], json!({ "value": 10, "isDefault": false }));

        let err = service.load_json(SettingsDomain::Reader, &Holder::Category(1)).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidValue(_)));
    }

    #[test]
    fn test_parse_domain() {
        assert_eq!("chapter-list".parse::<SettingsDomain>().unwrap(), SettingsDomain::ChapterList);
        assert!("theme".parse::<SettingsDomain>().is_err());
    }
}
