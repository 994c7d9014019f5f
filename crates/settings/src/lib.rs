//! Typed settings resolved from layered metadata.
//!
//! Each settings domain is a plain serde struct implementing
//! [`MetaSettings`]; one top-level field is one metadata key. Values are
//! resolved by [`SettingsResolver`] from the domain defaults and any number
//! of [`MetaLayer`]s, and persisted through [`SettingsService`].
//!
//! Reader settings get an extra layer, the reading-mode profile (see
//! [`profile`]), plus the display helpers that depend on them: [`tapzone`]
//! and [`spread`].

mod download;
pub mod error;
mod options;
pub mod profile;
mod reader;
mod resolve;
mod service;
pub mod spread;
pub mod tapzone;

pub use crate::download::{DownloadSettings, normalize_delete_while_reading};
pub use crate::options::{ChapterListOptions, ChapterSort, GridLayout, LibraryOptions, LibrarySort};
pub use crate::reader::{
    AutoScroll, BackgroundColor, ExitMode, PageScaleMode, ProgressBarPosition, ProgressBarType, ReaderSettings,
    ReaderWidth, ReadingDirection, ReadingMode, TapZoneInvert, TapZoneLayout,
};
pub use crate::resolve::{MetaLayer, MetaSettings, SettingsResolver, WithDefaultFlags};
pub use crate::service::{SettingsDomain, SettingsService};
