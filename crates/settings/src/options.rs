//! Chapter list and library display options.
//!
//! Filters are tri-state: `None` shows everything, `Some(true)` only matching
//! entries, `Some(false)` only non-matching ones.

use crate::resolve::MetaSettings;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChapterSort {
    #[default]
    Source,
    ChapterNumber,
    UploadDate,
    FetchedDate,
}

/// Per-manga chapter list options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterListOptions {
    pub unread: Option<bool>,
    pub downloaded: Option<bool>,
    pub bookmarked: Option<bool>,
    /// Scanlator names whose chapters are hidden.
    pub excluded_scanlators: Vec<String>,
    pub sort_by: ChapterSort,
    pub reverse: bool,
    pub show_chapter_number: bool,
}

impl Default for ChapterListOptions {
    fn default() -> Self {
        Self {
            unread: None,
            downloaded: None,
            bookmarked: None,
            excluded_scanlators: Vec::new(),
            sort_by: ChapterSort::default(),
            reverse: true,
            show_chapter_number: false,
        }
    }
}

impl MetaSettings for ChapterListOptions {}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GridLayout {
    #[default]
    Comfortable,
    Compact,
    List,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LibrarySort {
    #[default]
    Title,
    DateAdded,
    LastRead,
    UnreadChapters,
}

/// Library options, stored per category with the global holder as fallback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryOptions {
    pub unread: Option<bool>,
    pub downloaded: Option<bool>,
    pub bookmarked: Option<bool>,
    pub sort_by: LibrarySort,
    pub sort_desc: bool,
    pub grid_layout: GridLayout,
    /// `None` picks a column count from the viewport width.
    pub items_per_row: Option<u32>,
    pub show_unread_badge: bool,
    pub show_download_badge: bool,
}

impl Default for LibraryOptions {
    fn default() -> Self {
        Self {
            unread: None,
            downloaded: None,
            bookmarked: None,
            sort_by: LibrarySort::default(),
            sort_desc: false,
            grid_layout: GridLayout::default(),
            items_per_row: None,
            show_unread_badge: true,
            show_download_badge: true,
        }
    }
}

impl MetaSettings for LibraryOptions {}
