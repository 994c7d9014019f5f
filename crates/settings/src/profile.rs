//! Reading-mode profiles and reader settings resolution.
//!
//! Reader settings resolve through three layers, each supplying only the keys
//! it explicitly stores:
//!
//! ```text
//! defaults → global → profile(effective reading mode) → manga
//! ```
//!
//! Profiles live on the global holder under `readerProfile_<mode>_<key>`.
//! A profile never changes the reading mode itself: the mode is what selects
//! the profile.

use crate::reader::{ReaderSettings, ReadingMode};
use crate::resolve::{MetaLayer, SettingsResolver, WithDefaultFlags};
use yomu_meta::MetaBag;

const READING_MODE: &str = "readingMode";
const WEBTOON_GENRES: [&str; 4] = ["long strip", "webtoon", "manhwa", "manhua"];

/// Key scope of a reading mode's profile, relative to the application prefix.
pub fn profile_scope(mode: ReadingMode) -> String {
    format!("readerProfile_{}_", mode.profile_name())
}

/// Unprefixed key of one profile setting.
pub fn profile_key(mode: ReadingMode, key: &str) -> String {
    format!("{}{key}", profile_scope(mode))
}

/// Whether the manga's genres suggest a vertically scrolled comic.
pub fn looks_like_webtoon(genres: &[String]) -> bool {
    genres.iter().any(|genre| {
        let genre = genre.trim().to_lowercase();
        WEBTOON_GENRES.contains(&genre.as_str())
    })
}

/// The reading mode a layer sets, legacy `readerType` included.
fn stored_mode(layer: &MetaLayer) -> Option<ReadingMode> {
    let mut values = layer.migrated::<ReaderSettings>();
    values.remove(READING_MODE).and_then(|value| serde_json::from_value(value).ok())
}

/// The reading mode a manga opens in: its own setting, else the webtoon
/// heuristic, else the global setting, else the default.
pub fn effective_reading_mode(global: &MetaBag, manga: &MetaBag, genres: &[String]) -> ReadingMode {
    if let Some(mode) = stored_mode(&MetaLayer::from_bag(manga)) {
        return mode;
    }
    if looks_like_webtoon(genres) {
        return ReadingMode::Webtoon;
    }
    stored_mode(&MetaLayer::from_bag(global)).unwrap_or_default()
}

/// Resolve the reader settings of one manga.
///
/// Default flags refer to the manga's own metadata: a value inherited from
/// the global settings or a profile is reported as default.
pub fn resolve_reader_settings(global: &MetaBag, manga: &MetaBag, genres: &[String]) -> WithDefaultFlags<ReaderSettings> {
    let mode = effective_reading_mode(global, manga, genres);
    let profile = MetaLayer::scoped(global, &profile_scope(mode)).without(READING_MODE);
    let mut resolved = SettingsResolver::<ReaderSettings>::default()
        .layer(MetaLayer::from_bag(global))
        .layer(profile)
        .layer(MetaLayer::from_bag(manga))
        .resolve_with_flags();
    resolved.value.reading_mode = mode;
    tracing::debug!(%mode, "resolved reader settings");
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::ReadingDirection;
    use rstest::rstest;
    use yomu_meta::app_key;

    fn bag(entries: &[(&str, &str)]) -> MetaBag {
        entries.iter().map(|(k, v)| (app_key(k), *v)).collect()
    }

    fn genres(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[rstest]
    #[case(&["Action", "Long Strip"], true)]
    #[case(&["MANHWA"], true)]
    #[case(&["Romance", "Comedy"], false)]
    #[case(&[], false)]
    fn test_webtoon_heuristic(#[case] names: &[&str], #[case] expected: bool) {
        assert_eq!(looks_like_webtoon(&genres(names)), expected);
    }

    #[test]
    fn test_mode_precedence() {
        let global = bag(&[("readingMode", "DOUBLE_PAGE")]);
        let manga = bag(&[("readingMode", "CONTINUOUS_VERTICAL")]);
        let webtoon = genres(&["Webtoon"]);
        assert_eq!(effective_reading_mode(&global, &manga, &webtoon), ReadingMode::ContinuousVertical);
        assert_eq!(effective_reading_mode(&global, &MetaBag::new(), &webtoon), ReadingMode::Webtoon);
        assert_eq!(effective_reading_mode(&global, &MetaBag::new(), &[]), ReadingMode::DoublePage);
        assert_eq!(effective_reading_mode(&MetaBag::new(), &MetaBag::new(), &[]), ReadingMode::SinglePage);
    }

    #[test]
    fn test_layers_resolve_in_override_order() {
        let global = bag(&[
            ("readingMode", "WEBTOON"),
            ("pageGap", "10"),
            ("isStaticNav", "true"),
            ("readingDirection", "RTL"),
            ("readerProfile_webtoon_pageGap", "0"),
            ("readerProfile_webtoon_isStaticNav", "false"),
            ("readerProfile_single_page_pageGap", "99"),
        ]);
        let manga = bag(&[("isStaticNav", "true")]);
        let resolved = resolve_reader_settings(&global, &manga, &[]);
        assert_eq!(resolved.value.reading_mode, ReadingMode::Webtoon);
        // Profile over global.
        assert_eq!(resolved.value.page_gap, 0);
        // Manga over profile.
        assert!(resolved.value.is_static_nav);
        // Global when the profile is silent.
        assert_eq!(resolved.value.reading_direction, ReadingDirection::Rtl);
        assert!(!resolved.is_default("isStaticNav"));
        assert!(resolved.is_default("pageGap"));
        assert!(resolved.is_default("readingMode"));
    }

    #[test]
    fn test_profile_never_sets_reading_mode() {
        let global = bag(&[("readerProfile_single_page_readingMode", "WEBTOON")]);
        let resolved = resolve_reader_settings(&global, &MetaBag::new(), &[]);
        assert_eq!(resolved.value.reading_mode, ReadingMode::SinglePage);
    }

    #[test]
    fn test_heuristic_mode_selects_webtoon_profile() {
        let global = bag(&[("readerProfile_webtoon_pageGap", "0")]);
        let resolved = resolve_reader_settings(&global, &MetaBag::new(), &genres(&["Manhua"]));
        assert_eq!(resolved.value.reading_mode, ReadingMode::Webtoon);
        assert_eq!(resolved.value.page_gap, 0);
    }

    #[test]
    fn test_legacy_manga_reader_type_selects_mode() {
        let global = bag(&[("readingMode", "DOUBLE_PAGE"), ("readerProfile_webtoon_pageGap", "0")]);
        let manga = bag(&[("readerType", "Webtoon")]);
        let resolved = resolve_reader_settings(&global, &manga, &[]);
        assert_eq!(resolved.value.reading_mode, ReadingMode::Webtoon);
        assert_eq!(resolved.value.page_gap, 0);
        assert!(!resolved.is_default("readingMode"));
    }

    #[test]
    fn test_legacy_global_reader_type_selects_mode() {
        let global = bag(&[("readerType", "SingleRTL"), ("readerProfile_single_page_pageGap", "7")]);
        let resolved = resolve_reader_settings(&global, &MetaBag::new(), &[]);
        assert_eq!(resolved.value.reading_mode, ReadingMode::SinglePage);
        assert_eq!(resolved.value.reading_direction, ReadingDirection::Rtl);
        assert_eq!(resolved.value.page_gap, 7);
        assert!(resolved.is_default("readingMode"));

        let global = bag(&[("readerType", "ContinuesVertical")]);
        let resolved = resolve_reader_settings(&global, &MetaBag::new(), &[]);
        assert_eq!(resolved.value.reading_mode, ReadingMode::ContinuousVertical);
    }

    #[test]
    fn test_profile_key() {
        assert_eq!(profile_key(ReadingMode::DoublePage, "pageGap"), "readerProfile_double_page_pageGap");
    }
}
