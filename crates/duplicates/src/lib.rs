//! Duplicate manga detection.
//!
//! Entries are compared by [cleaned](clean_title) title. The fast path only
//! looks at main titles; the slow path also compares alternative titles
//! (explicit, or listed in the description) and fans the work out over a
//! [`yomu_queue::Queue`] in chunks.

pub mod error;
mod finder;
mod group;
mod manga;
mod title;

pub use crate::finder::{DEFAULT_CHUNK_SIZE, DuplicateEvent, DuplicateFinder};
pub use crate::group::{DuplicateGroup, find_duplicates_in, group_by_title, merge_chunks};
pub use crate::manga::Manga;
pub use crate::title::{clean_title, description_alt_titles};
