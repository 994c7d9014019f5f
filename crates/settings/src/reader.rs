use crate::error::{Error, ErrorKind};
use crate::resolve::MetaSettings;
use derive_more::Display;
use exn::OptionExt;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::str::FromStr;

#[derive(Debug, Display, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReadingMode {
    #[default]
    #[display("single page")]
    SinglePage,
    #[display("double page")]
    DoublePage,
    #[display("continuous vertical")]
    ContinuousVertical,
    #[display("continuous horizontal")]
    ContinuousHorizontal,
    #[display("webtoon")]
    Webtoon,
}

impl ReadingMode {
    pub const ALL: [Self; 5] = [
        Self::SinglePage,
        Self::DoublePage,
        Self::ContinuousVertical,
        Self::ContinuousHorizontal,
        Self::Webtoon,
    ];

    /// Name used in profile keys (`readerProfile_<name>_<key>`).
    pub fn profile_name(&self) -> &'static str {
        match self {
            Self::SinglePage => "single_page",
            Self::DoublePage => "double_page",
            Self::ContinuousVertical => "continuous_vertical",
            Self::ContinuousHorizontal => "continuous_horizontal",
            Self::Webtoon => "webtoon",
        }
    }

    pub fn is_continuous(&self) -> bool {
        matches!(self, Self::ContinuousVertical | Self::ContinuousHorizontal | Self::Webtoon)
    }
}

impl FromStr for ReadingMode {
    type Err = Error;
    /// Accepts profile names (`single_page`), stored names (`SINGLE_PAGE`)
    /// and kebab-case (`single-page`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().replace('-', "_").to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|mode| mode.profile_name() == normalized)
            .ok_or_raise(|| ErrorKind::Unknown(format!("reading mode {s:?}")))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReadingDirection {
    #[default]
    Ltr,
    Rtl,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TapZoneLayout {
    #[default]
    LShaped,
    Kindle,
    Edge,
    RightLeft,
    Disabled,
}

impl FromStr for TapZoneLayout {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().replace('-', "_").to_ascii_lowercase().as_str() {
            "l_shaped" | "l" => Ok(Self::LShaped),
            "kindle" => Ok(Self::Kindle),
            "edge" => Ok(Self::Edge),
            "right_left" => Ok(Self::RightLeft),
            "disabled" => Ok(Self::Disabled),
            _ => exn::bail!(ErrorKind::Unknown(format!("tap zone layout {s:?}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TapZoneInvert {
    pub horizontal: bool,
    pub vertical: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PageScaleMode {
    Original,
    Width,
    #[default]
    Height,
    Screen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReaderWidth {
    pub enabled: bool,
    /// Percentage of the viewport width.
    pub value: u32,
}

impl Default for ReaderWidth {
    fn default() -> Self {
        Self { enabled: false, value: 100 }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BackgroundColor {
    #[default]
    Theme,
    Black,
    Gray,
    White,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProgressBarType {
    Hidden,
    #[default]
    Standard,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProgressBarPosition {
    Left,
    Right,
    #[default]
    Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoScroll {
    /// Milliseconds per page (paged modes) or per screen (continuous modes).
    pub value: u32,
    pub smooth: bool,
}

impl Default for AutoScroll {
    fn default() -> Self {
        Self { value: 5000, smooth: true }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExitMode {
    Previous,
    #[default]
    Series,
}

/// Reader settings. Stored on the global holder, on reading-mode profiles
/// and on individual manga.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReaderSettings {
    pub reading_mode: ReadingMode,
    pub reading_direction: ReadingDirection,
    pub tap_zone_layout: TapZoneLayout,
    pub tap_zone_invert_mode: TapZoneInvert,
    pub page_scale_mode: PageScaleMode,
    pub should_stretch_page: bool,
    pub should_offset_double_spreads: bool,
    /// Pixels between pages in continuous modes.
    pub page_gap: u32,
    pub reader_width: ReaderWidth,
    pub background_color: BackgroundColor,
    pub progress_bar_type: ProgressBarType,
    pub progress_bar_position: ProgressBarPosition,
    pub progress_bar_size: u32,
    pub is_static_nav: bool,
    pub should_show_page_number: bool,
    pub should_skip_dup_chapters: bool,
    pub should_skip_filtered_chapters: bool,
    pub auto_scroll: AutoScroll,
    pub image_pre_load_amount: u32,
    pub exit_mode: ExitMode,
}

impl Default for ReaderSettings {
    fn default() -> Self {
        Self {
            reading_mode: ReadingMode::default(),
            reading_direction: ReadingDirection::default(),
            tap_zone_layout: TapZoneLayout::default(),
            tap_zone_invert_mode: TapZoneInvert::default(),
            page_scale_mode: PageScaleMode::default(),
            should_stretch_page: false,
            should_offset_double_spreads: false,
            page_gap: 4,
            reader_width: ReaderWidth::default(),
            background_color: BackgroundColor::default(),
            progress_bar_type: ProgressBarType::default(),
            progress_bar_position: ProgressBarPosition::default(),
            progress_bar_size: 4,
            is_static_nav: false,
            should_show_page_number: true,
            should_skip_dup_chapters: true,
            should_skip_filtered_chapters: true,
            auto_scroll: AutoScroll::default(),
            image_pre_load_amount: 5,
            exit_mode: ExitMode::default(),
        }
    }
}

const LEGACY_READER_TYPE: &str = "readerType";

/// Reading mode and direction encoded by a legacy `readerType` value.
fn legacy_reader_type(reader_type: &str) -> Option<(ReadingMode, ReadingDirection)> {
    use ReadingDirection::{Ltr, Rtl};
    use ReadingMode::*;
    Some(match reader_type {
        "SingleVertical" | "SingleLTR" => (SinglePage, Ltr),
        "SingleRTL" => (SinglePage, Rtl),
        "DoubleVertical" | "DoubleLTR" => (DoublePage, Ltr),
        "DoubleRTL" => (DoublePage, Rtl),
        "ContinuesVertical" => (ContinuousVertical, Ltr),
        "ContinuesHorizontalLTR" => (ContinuousHorizontal, Ltr),
        "ContinuesHorizontalRTL" => (ContinuousHorizontal, Rtl),
        "Webtoon" => (Webtoon, Ltr),
        _ => return None,
    })
}

impl MetaSettings for ReaderSettings {
    fn migrate(values: &mut Map<String, Value>) {
        let Some(Value::String(reader_type)) = values.remove(LEGACY_READER_TYPE) else {
            return;
        };
        let Some((mode, direction)) = legacy_reader_type(&reader_type) else {
            tracing::warn!(%reader_type, "unknown legacy reader type");
            return;
        };
        values.entry("readingMode").or_insert_with(|| json!(mode));
        values.entry("readingDirection").or_insert_with(|| json!(direction));
    }
}
