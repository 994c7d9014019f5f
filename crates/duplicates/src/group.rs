use crate::manga::Manga;
use crate::title::clean_title;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Entries considered duplicates of each other, under the original (not
/// cleaned) title of the entry that formed the group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateGroup {
    pub title: String,
    pub mangas: Vec<Manga>,
}

/// Group entries by cleaned main title. Entries with a unique title are in
/// no group. Groups are ordered by first appearance; a group's title is the
/// original title of its first entry.
pub fn group_by_title(mangas: &[Manga]) -> Vec<DuplicateGroup> {
    let mut order: Vec<String> = Vec::new();
    let mut buckets: HashMap<String, Vec<&Manga>> = HashMap::new();
    for manga in mangas {
        let cleaned = clean_title(&manga.title);
        let bucket = buckets.entry(cleaned.clone()).or_insert_with(|| {
            order.push(cleaned);
            Vec::new()
        });
        bucket.push(manga);
    }
    order
        .into_iter()
        .filter_map(|cleaned| buckets.remove(&cleaned))
        .filter(|bucket| bucket.len() > 1)
        .map(|bucket| DuplicateGroup {
            title: bucket[0].title.clone(),
            mangas: bucket.into_iter().cloned().collect(),
        })
        .collect()
}

/// Find the duplicates of one chunk against the whole collection, comparing
/// every cleaned title (main, alternative and description-listed).
///
/// Each entry of `chunk` not yet placed in a group by this call forms a group
/// with every entry of `all` sharing any cleaned title with it. Members keep
/// the order of `all`.
pub fn find_duplicates_in(all: &[Manga], chunk: &[Manga]) -> Vec<DuplicateGroup> {
    let titles: Vec<Vec<String>> = all.iter().map(Manga::cleaned_titles).collect();
    let mut index: HashMap<&str, Vec<usize>> = HashMap::new();
    for (position, cleaned) in titles.iter().enumerate() {
        for title in cleaned {
            index.entry(title.as_str()).or_default().push(position);
        }
    }

    let mut grouped: HashSet<i64> = HashSet::new();
    let mut groups = Vec::new();
    for manga in chunk {
        if grouped.contains(&manga.id) {
            continue;
        }
        let mut members: Vec<usize> = manga
            .cleaned_titles()
            .iter()
            .filter_map(|title| index.get(title.as_str()))
            .flatten()
            .copied()
            .collect();
        members.sort_unstable();
        members.dedup();
        if members.len() < 2 {
            continue;
        }
        grouped.extend(members.iter().map(|&position| all[position].id));
        groups.push(DuplicateGroup {
            title: manga.title.clone(),
            mangas: members.into_iter().map(|position| all[position].clone()).collect(),
        });
    }
    groups
}

/// Merge per-chunk results in chunk order. The first group whose title
/// cleans to a given form wins; later groups with the same cleaned title are
/// dropped whole, even when they list other entries.
pub fn merge_chunks(chunks: impl IntoIterator<Item = Vec<DuplicateGroup>>) -> Vec<DuplicateGroup> {
    let mut seen = HashSet::new();
    chunks.into_iter().flatten().filter(|group| seen.insert(clean_title(&group.title))).collect()
}
