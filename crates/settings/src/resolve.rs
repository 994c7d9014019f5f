//! Layered resolution of typed settings from metadata.
//!
//! A settings object starts from its defaults. Each [`MetaLayer`] then
//! overrides the keys it explicitly sets, in the order the layers were added,
//! so the last layer has the final word. Stored values go through three
//! filters before they are accepted:
//!
//! 1. the domain's [`MetaSettings::migrate`] hook, which rewrites legacy
//!    shapes in place (read time only, nothing is written back);
//! 2. a JSON kind check against the default (a string default also accepts
//!    the raw stored text, an object default is shallow-merged, a `null`
//!    default accepts anything);
//! 3. typed deserialization of the settings object with the value in place.
//!
//! A value failing any filter is skipped with a warning and the previous
//! layer's value stays in effect, so the output is always fully populated.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use yomu_meta::MetaBag;
use yomu_meta::value::decode;

/// A settings domain stored as metadata, one key per top-level field.
pub trait MetaSettings: Serialize + DeserializeOwned + Default + Clone {
    /// Rewrite legacy value shapes of one layer before it is applied.
    fn migrate(_values: &mut Map<String, Value>) {}
}

/// The decoded settings keys of one metadata holder (or one scope of it).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetaLayer {
    values: Map<String, Value>,
    raw: BTreeMap<String, String>,
}

impl MetaLayer {
    /// Every application key of `bag`.
    pub fn from_bag(bag: &MetaBag) -> Self {
        Self::scoped(bag, "")
    }

    /// Application keys of `bag` starting with `scope`, with the scope stripped.
    pub fn scoped(bag: &MetaBag, scope: &str) -> Self {
        let mut layer = Self::default();
        for (key, raw) in bag.scoped(scope) {
            layer.values.insert(key.to_string(), decode(raw));
            layer.raw.insert(key.to_string(), raw.to_string());
        }
        layer
    }

    /// A layer of already decoded values.
    pub fn from_values(values: Map<String, Value>) -> Self {
        Self { values, raw: BTreeMap::new() }
    }

    /// This layer without `key`.
    pub fn without(mut self, key: &str) -> Self {
        self.values.remove(key);
        self.raw.remove(key);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Decoded values after the domain's migration hook.
    pub(crate) fn migrated<T: MetaSettings>(&self) -> Map<String, Value> {
        let mut values = self.values.clone();
        T::migrate(&mut values);
        values
    }
}

/// A resolved settings object, plus for every field whether its value came
/// from a fallback (defaults or an inherited layer) rather than the holder's
/// own metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct WithDefaultFlags<T> {
    pub value: T,
    pub flags: BTreeMap<String, bool>,
}

impl<T: Serialize> WithDefaultFlags<T> {
    /// `true` unless `key` is present in the holder's own metadata.
    pub fn is_default(&self, key: &str) -> bool {
        self.flags.get(key).copied().unwrap_or(true)
    }

    /// `{ "<key>": { "value": ..., "isDefault": ... }, ... }`
    pub fn to_json(&self) -> Value {
        let Ok(Value::Object(values)) = serde_json::to_value(&self.value) else {
            return Value::Null;
        };
        let entries = values.into_iter().map(|(key, value)| {
            let is_default = self.is_default(&key);
            (key, serde_json::json!({ "value": value, "isDefault": is_default }))
        });
        Value::Object(entries.collect())
    }
}

/// Resolves a [`MetaSettings`] domain from its defaults and metadata layers.
#[derive(Debug, Clone)]
pub struct SettingsResolver<T> {
    defaults: T,
    layers: Vec<MetaLayer>,
}

impl<T: MetaSettings> Default for SettingsResolver<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: MetaSettings> SettingsResolver<T> {
    pub fn new(defaults: T) -> Self {
        Self { defaults, layers: Vec::new() }
    }

    /// Add a layer overriding every layer added before it.
    pub fn layer(mut self, layer: MetaLayer) -> Self {
        self.layers.push(layer);
        self
    }

    /// The fully populated settings object.
    pub fn resolve(&self) -> T {
        let Ok(Value::Object(defaults)) = serde_json::to_value(&self.defaults) else {
            return self.defaults.clone();
        };
        let mut merged = defaults.clone();
        for layer in &self.layers {
            let values = layer.migrated::<T>();
            for (key, default) in &defaults {
                let Some(stored) = values.get(key) else { continue };
                let Some(candidate) = coerce(default, &merged[key], stored, layer.raw.get(key)) else {
                    tracing::warn!(%key, value = %stored, "ignoring setting of the wrong kind");
                    continue;
                };
                let previous = merged.insert(key.clone(), candidate);
                if serde_json::from_value::<T>(Value::Object(merged.clone())).is_err() {
                    tracing::warn!(%key, value = %stored, "ignoring invalid setting");
                    if let Some(previous) = previous {
                        merged.insert(key.clone(), previous);
                    }
                }
            }
        }
        serde_json::from_value(Value::Object(merged)).unwrap_or_else(|_| self.defaults.clone())
    }

    /// Resolve, flagging as non-default every key present in the last layer
    /// (the holder's own metadata). Presence counts, not value equality.
    pub fn resolve_with_flags(&self) -> WithDefaultFlags<T> {
        let value = self.resolve();
        let own = self.layers.last().map(MetaLayer::migrated::<T>).unwrap_or_default();
        let flags = match serde_json::to_value(&self.defaults) {
            Ok(Value::Object(defaults)) => defaults.keys().map(|key| (key.clone(), !own.contains_key(key))).collect(),
            _ => BTreeMap::new(),
        };
        WithDefaultFlags { value, flags }
    }
}

/// Check a stored value against the default's JSON kind, producing the value
/// to try. `current` is the value resolved so far for the same key.
fn coerce(default: &Value, current: &Value, stored: &Value, raw: Option<&String>) -> Option<Value> {
    match (default, stored) {
        (Value::Null, stored) => Some(stored.clone()),
        (Value::String(_), Value::String(_)) => Some(stored.clone()),
        (Value::String(_), _) => raw.map(|raw| Value::String(raw.clone())),
        (Value::Bool(_), Value::Bool(_)) | (Value::Number(_), Value::Number(_)) | (Value::Array(_), Value::Array(_)) => {
            Some(stored.clone())
        },
        (Value::Object(_), Value::Object(stored)) => {
            let mut object = current.as_object().cloned().unwrap_or_default();
            object.extend(stored.iter().map(|(k, v)| (k.clone(), v.clone())));
            Some(Value::Object(object))
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;
    use yomu_meta::app_key;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Sample {
        title: String,
        count: u32,
        enabled: bool,
        tags: Vec<String>,
        nested: Nested,
        filter: Option<bool>,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Nested {
        a: u32,
        b: u32,
    }

    impl Default for Sample {
        fn default() -> Self {
            Self {
                title: "untitled".to_string(),
                count: 3,
                enabled: false,
                tags: vec![],
                nested: Nested { a: 1, b: 2 },
                filter: None,
            }
        }
    }

    impl MetaSettings for Sample {
        fn migrate(values: &mut Map<String, Value>) {
            if let Some(Value::Bool(legacy)) = values.get("count") {
                let count = u32::from(*legacy);
                values.insert("count".to_string(), json!(count));
            }
        }
    }

    fn layer(entries: &[(&str, &str)]) -> MetaLayer {
        MetaLayer::from_bag(&entries.iter().map(|(k, v)| (app_key(k), *v)).collect())
    }

    #[test]
    fn test_empty_layers_resolve_to_defaults() {
        let resolved = SettingsResolver::<Sample>::default().layer(MetaLayer::default()).resolve();
        assert_eq!(resolved, Sample::default());
    }

    #[test]
    fn test_present_keys_decode_stored_values() {
        let resolved = SettingsResolver::<Sample>::default()
            .layer(layer(&[("count", "7"), ("enabled", "true"), ("tags", r#"["Foo","Bar"]"#)]))
            .resolve();
        assert_eq!(resolved.count, 7);
        assert!(resolved.enabled);
        assert_eq!(resolved.tags, vec!["Foo", "Bar"]);
        assert_eq!(resolved.title, "untitled");
    }

    #[test]
    fn test_string_default_accepts_raw_text() {
        let resolved = SettingsResolver::<Sample>::default().layer(layer(&[("title", "42")])).resolve();
        assert_eq!(resolved.title, "42");
    }

    #[test]
    fn test_objects_are_shallow_merged() {
        let resolved = SettingsResolver::<Sample>::default()
            .layer(layer(&[("nested", r#"{"a":5}"#)]))
            .layer(layer(&[("nested", r#"{"b":9}"#)]))
            .resolve();
        assert_eq!(resolved.nested, Nested { a: 5, b: 9 });
    }

    #[test]
    fn test_wrong_kind_falls_back_to_previous_layer() {
        let resolved = SettingsResolver::<Sample>::default()
            .layer(layer(&[("count", "5")]))
            .layer(layer(&[("count", "many"), ("enabled", "1"), ("filter", "maybe")]))
            .resolve();
        assert_eq!(resolved.count, 5);
        assert!(!resolved.enabled);
        assert_eq!(resolved.filter, None);
    }

    #[test]
    fn test_invalid_value_of_right_kind_is_ignored() {
        // Fits the JSON kind but not the field type.
        let resolved = SettingsResolver::<Sample>::default().layer(layer(&[("count", "-1")])).resolve();
        assert_eq!(resolved.count, 3);
    }

    #[test]
    fn test_null_default_accepts_any_valid_value() {
        let resolved = SettingsResolver::<Sample>::default().layer(layer(&[("filter", "true")])).resolve();
        assert_eq!(resolved.filter, Some(true));
    }

    #[test]
    fn test_migration_applies_per_layer() {
        let resolved = SettingsResolver::<Sample>::default().layer(layer(&[("count", "true")])).resolve();
        assert_eq!(resolved.count, 1);
    }

    #[test]
    fn test_last_layer_wins() {
        let resolved = SettingsResolver::<Sample>::default()
            .layer(layer(&[("count", "5"), ("enabled", "true")]))
            .layer(layer(&[("count", "6")]))
            .resolve();
        assert_eq!(resolved.count, 6);
        assert!(resolved.enabled);
    }

    #[test]
    fn test_default_flags_track_presence_in_own_layer() {
        let resolved = SettingsResolver::<Sample>::default()
            .layer(layer(&[("enabled", "true")]))
            .layer(layer(&[("count", "3")]))
            .resolve_with_flags();
        // Equal to the default, but explicitly set.
        assert!(!resolved.is_default("count"));
        // Inherited from an earlier layer.
        assert!(resolved.is_default("enabled"));
        assert!(resolved.value.enabled);
        assert!(resolved.is_default("title"));
        assert_eq!(resolved.to_json()["count"], json!({ "value": 3, "isDefault": false }));
    }

    #[test]
    fn test_scoped_layer_and_without() {
        let bag: MetaBag = [(app_key("p_x_count"), "9"), (app_key("count"), "1"), (app_key("p_x_enabled"), "true")]
            .into_iter()
            .collect();
        let scoped = MetaLayer::scoped(&bag, "p_x_").without("enabled");
        assert_eq!(scoped.get("count"), Some(&json!(9)));
        assert!(!scoped.contains("enabled"));
    }
}
