use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::btree_map;

/// Prefix shared by every key this application owns. Metadata written by
/// other clients of the same backend (without the prefix) is left alone.
pub const APP_KEY_PREFIX: &str = "webUI_";

/// Build the stored key for an application setting.
///
/// ```
/// assert_eq!(yomu_meta::app_key("readingMode"), "webUI_readingMode");
/// ```
pub fn app_key(key: impl AsRef<str>) -> String {
    format!("{APP_KEY_PREFIX}{}", key.as_ref())
}

/// The complete metadata of one holder, as stored: `key → value` strings.
///
/// Lookups by setting name go through [`get`](Self::get)/[`contains`](Self::contains),
/// which apply [`APP_KEY_PREFIX`]; the `*_raw` methods use stored keys verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetaBag {
    entries: BTreeMap<String, String>,
}

impl MetaBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.get_raw(&app_key(key))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(&app_key(key))
    }

    pub fn get_raw(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Insert or replace a value. Last write wins.
    pub fn insert_raw(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.entries.insert(key.into(), value.into())
    }

    pub fn remove_raw(&mut self, key: &str) -> Option<String> {
        self.entries.remove(key)
    }

    /// Application-owned entries, with [`APP_KEY_PREFIX`] stripped.
    pub fn app_entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.scoped("")
    }

    /// Application-owned entries whose (unprefixed) key starts with `scope`,
    /// with both the application prefix and `scope` stripped.
    pub fn scoped<'a>(&'a self, scope: &'a str) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        self.entries.iter().filter_map(move |(key, value)| {
            let key = key.strip_prefix(APP_KEY_PREFIX)?.strip_prefix(scope)?;
            Some((key, value.as_str()))
        })
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, String> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MetaBag {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}
impl IntoIterator for MetaBag {
    type Item = (String, String);
    type IntoIter = btree_map::IntoIter<String, String>;
    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
