use crate::error::{ErrorKind, Result};
use crate::group::{DuplicateGroup, find_duplicates_in, group_by_title, merge_chunks};
use crate::manga::Manga;
use async_stream::stream;
use exn::ResultExt;
use futures::stream::FuturesUnordered;
use futures::{Stream, StreamExt};
use std::ops::Range;
use std::pin::pin;
use std::sync::Arc;
use yomu_queue::{Priority, Queue};

pub const DEFAULT_CHUNK_SIZE: usize = 200;

/// Progress events emitted by [`DuplicateFinder::find_stream`].
///
/// Events follow a strict ordering:
/// 1. [`Started`](Self::Started): exactly once.
/// 2. [`Dispatched`](Self::Dispatched): once, with the chunk count, only
///    when alternative titles are checked.
/// 3. [`ChunkChecked`](Self::ChunkChecked): once per chunk, in completion
///    order.
/// 4. [`Complete`](Self::Complete): exactly once, with the merged groups.
///
/// A failed chunk ends the stream with an error instead of
/// [`Complete`](Self::Complete).
#[derive(Debug, Clone, PartialEq)]
pub enum DuplicateEvent {
    Started,
    Dispatched(usize),
    ChunkChecked { index: usize, groups: usize },
    Complete(Vec<DuplicateGroup>),
}

/// Finds duplicate entries in a manga collection.
///
/// The fast path groups by cleaned main title on the caller's task. Checking
/// alternative titles compares every entry against the whole collection, so
/// the collection is split into chunks that run as [`Queue`] tasks on the
/// blocking thread pool. Chunk results are merged in chunk order, whatever
/// order they finish in.
#[derive(Clone)]
pub struct DuplicateFinder {
    queue: Queue,
    chunk_size: usize,
}

impl DuplicateFinder {
    pub fn new(queue: Queue) -> Self {
        Self { queue, chunk_size: DEFAULT_CHUNK_SIZE }
    }

    /// Minimum 1.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Run to completion and return the merged groups.
    pub async fn find(&self, mangas: Vec<Manga>, check_alternative_titles: bool) -> Result<Vec<DuplicateGroup>> {
        let mut events = pin!(self.find_stream(mangas, check_alternative_titles));
        let mut groups = Vec::new();
        while let Some(event) = events.next().await {
            if let DuplicateEvent::Complete(complete) = event? {
                groups = complete;
            }
        }
        Ok(groups)
    }

    /// Stream [`DuplicateEvent`]s while checking `mangas`.
    pub fn find_stream(
        &self,
        mangas: Vec<Manga>,
        check_alternative_titles: bool,
    ) -> impl Stream<Item = Result<DuplicateEvent>> + '_ {
        stream!({
            yield Ok(DuplicateEvent::Started);
            if !check_alternative_titles {
                let groups = group_by_title(&mangas);
                tracing::debug!(entries = mangas.len(), groups = groups.len(), "grouped by title");
                yield Ok(DuplicateEvent::Complete(groups));
                return;
            }

            let ranges = chunk_ranges(mangas.len(), self.chunk_size);
            let all = Arc::new(mangas);
            yield Ok(DuplicateEvent::Dispatched(ranges.len()));

            let mut checking: FuturesUnordered<_> = ranges
                .into_iter()
                .enumerate()
                .map(|(index, range)| {
                    let all = Arc::clone(&all);
                    let handle = self.queue.enqueue("duplicates_chunk", Priority::NORMAL, move || async move {
                        tokio::task::spawn_blocking(move || find_duplicates_in(&all, &all[range])).await
                    });
                    async move { (index, handle.await) }
                })
                .collect();

            let mut results: Vec<Option<Vec<DuplicateGroup>>> = vec![None; checking.len()];
            while let Some((index, outcome)) = checking.next().await {
                let groups = match outcome.or_raise(|| ErrorKind::Cancelled(index)) {
                    Ok(Ok(groups)) => groups,
                    Ok(Err(e)) => {
                        tracing::error!(chunk = index, error = %e, "duplicate worker failed");
                        yield Err::<DuplicateEvent, _>(e).or_raise(|| ErrorKind::Worker(index));
                        return;
                    },
                    Err(e) => {
                        yield Err(e);
                        return;
                    },
                };
                tracing::debug!(chunk = index, groups = groups.len(), "chunk checked");
                yield Ok(DuplicateEvent::ChunkChecked { index, groups: groups.len() });
                results[index] = Some(groups);
            }

            yield Ok(DuplicateEvent::Complete(merge_chunks(results.into_iter().flatten())));
        })
    }
}

/// Split `len` entries into consecutive ranges of at most `size`.
fn chunk_ranges(len: usize, size: usize) -> Vec<Range<usize>> {
    (0..len).step_by(size.max(1)).map(|start| start..(start + size).min(len)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(450, 200, vec![0..200, 200..400, 400..450])]
    #[case(400, 200, vec![0..200, 200..400])]
    #[case(3, 200, vec![0..3])]
    #[case(0, 200, vec![])]
    fn test_chunk_ranges(#[case] len: usize, #[case] size: usize, #[case] expected: Vec<Range<usize>>) {
        assert_eq!(chunk_ranges(len, size), expected);
    }

    /// 450 entries forming 225 pairs: entry `i` and entry `i + 225` share a title.
    fn paired_collection() -> Vec<Manga> {
        (0..450).map(|i| Manga::new(i, format!("Series {}", i % 225))).collect()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_every_entry_appears_exactly_once() {
        let finder = DuplicateFinder::new(Queue::new(3));
        let mut events = Vec::new();
        let mut stream = pin!(finder.find_stream(paired_collection(), true));
        while let Some(event) = stream.next().await {
            events.push(event.unwrap());
        }
        assert_eq!(events[0], DuplicateEvent::Started);
        assert_eq!(events[1], DuplicateEvent::Dispatched(3));
        let mut checked: Vec<usize> = events
            .iter()
            .filter_map(|event| match event {
                DuplicateEvent::ChunkChecked { index, .. } => Some(*index),
                _ => None,
            })
            .collect();
        checked.sort_unstable();
        assert_eq!(checked, vec![0, 1, 2]);

        let Some(DuplicateEvent::Complete(groups)) = events.last() else {
            panic!("stream did not complete");
        };
        assert_eq!(groups.len(), 225);
        let mut ids: Vec<i64> = groups.iter().flat_map(|g| g.mangas.iter().map(|m| m.id)).collect();
        ids.sort_unstable();
        assert_eq!(ids, (0..450).collect::<Vec<_>>());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_merge_precedence_follows_chunk_order() {
        // Chunk 1's "BERSERK" group also catches entry 4 through an
        // alternative title, but chunk 0 already claimed "berserk".
        let mangas = vec![
            Manga::new(1, "Berserk"),
            Manga::new(2, "Berserk!"),
            Manga::new(3, "BERSERK").with_alternative_titles(["Golden Age"]),
            Manga::new(4, "Golden Age"),
        ];
        let groups = DuplicateFinder::new(Queue::new(2)).with_chunk_size(2).find(mangas, true).await.unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].title, "Berserk");
        assert_eq!(groups[0].mangas.iter().map(|m| m.id).collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_fast_path_skips_workers() {
        let mangas = vec![Manga::new(1, "Monster"), Manga::new(2, "monster"), Manga::new(3, "Pluto")];
        let finder = DuplicateFinder::new(Queue::new(1));
        let events: Vec<_> = finder.find_stream(mangas, false).map(|e| e.unwrap()).collect().await;
        assert_eq!(events.len(), 2);
        let DuplicateEvent::Complete(groups) = &events[1] else {
            panic!("expected completion");
        };
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].mangas.len(), 2);
    }

    #[tokio::test]
    async fn test_empty_collection() {
        let finder = DuplicateFinder::new(Queue::new(1));
        assert!(finder.find(vec![], true).await.unwrap().is_empty());
    }
}
