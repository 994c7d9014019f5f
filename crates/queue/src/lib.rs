//! Bounded-concurrency priority task queue.
//!
//! A [`Queue`] runs asynchronous tasks on the current Tokio runtime, never
//! more than its configured concurrency at a time. Every call to
//! [`Queue::enqueue`] schedules one "process" unit behind a semaphore; when a
//! unit gets a slot it takes whichever pending task currently has the
//! highest [`Priority`] (earliest enqueued first among equals) and runs it.
//!
//! ```
//! use yomu_queue::{Priority, Queue};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let queue = Queue::new(2);
//! let handle = queue.enqueue("thumbnail", Priority::HIGH, || async { 40 + 2 });
//! assert!(handle.key().starts_with("thumbnail_"));
//! assert_eq!(handle.await.unwrap(), 42);
//! # }
//! ```

pub mod error;
mod handle;
mod priority;

pub use crate::handle::QueueHandle;
pub use crate::priority::Priority;
use futures::FutureExt;
use futures::channel::oneshot;
use futures::future::BoxFuture;
use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::Semaphore;

type Job = Box<dyn FnOnce() -> BoxFuture<'static, ()> + Send>;

/// Ordering key of a pending task: highest priority first, then insertion order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct Slot {
    priority: Reverse<Priority>,
    sequence: u64,
}

struct Pending {
    key: String,
    job: Job,
}

#[derive(Default)]
struct State {
    counter: u64,
    pending: BTreeMap<Slot, Pending>,
    slots: HashMap<String, Slot>,
}
impl State {
    fn take_next(&mut self) -> Option<Pending> {
        let (_, pending) = self.pending.pop_first()?;
        self.slots.remove(&pending.key);
        Some(pending)
    }
}

struct Inner {
    limiter: Semaphore,
    state: Mutex<State>,
}
impl Inner {
    fn state(&self) -> MutexGuard<'_, State> {
        // Bookkeeping is only ever mutated in short, non-panicking sections.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Runs at most `concurrency` tasks at once, picking the next task by priority.
///
/// Cloning a `Queue` is cheap and yields another handle to the same queue.
///
/// All methods that schedule work must be called from within a Tokio runtime.
#[derive(Clone)]
pub struct Queue {
    inner: Arc<Inner>,
    concurrency: usize,
}

impl Queue {
    /// Create a queue running at most `concurrency` tasks at once (minimum 1).
    pub fn new(concurrency: usize) -> Self {
        let concurrency = concurrency.max(1);
        Self {
            inner: Arc::new(Inner {
                limiter: Semaphore::new(concurrency),
                state: Mutex::new(State::default()),
            }),
            concurrency,
        }
    }

    /// Create a queue sized to leave one hardware thread free for the caller.
    pub fn with_available_parallelism() -> Self {
        Self::new(default_concurrency())
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Register `task` under a uniquified `key` and schedule it.
    ///
    /// The returned [`QueueHandle`] resolves with the task's output. Errors
    /// are the task's own business: return a `Result` from the task to
    /// propagate them, they never affect sibling tasks.
    pub fn enqueue<F, Fut, T>(&self, key: impl AsRef<str>, priority: Priority, task: F) -> QueueHandle<T>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let (sender, receiver) = oneshot::channel();
        let job: Job = Box::new(move || {
            async move {
                let output = task().await;
                // Nobody listening is fine, the handle was dropped.
                _ = sender.send(output);
            }
            .boxed()
        });
        let key = {
            let mut state = self.inner.state();
            state.counter += 1;
            let sequence = state.counter;
            let key = format!("{}_{}", key.as_ref(), sequence);
            let slot = Slot { priority: Reverse(priority), sequence };
            state.slots.insert(key.clone(), slot);
            state.pending.insert(slot, Pending { key: key.clone(), job });
            key
        };
        tracing::trace!(%key, priority = priority.value(), "task enqueued");
        self.schedule();
        QueueHandle::new(key, receiver)
    }

    /// Spawn one process unit: wait for a free slot, then run the best pending task.
    fn schedule(&self) {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            // The semaphore is never closed, so this only fails in theory.
            let Ok(_permit) = inner.limiter.acquire().await else {
                return;
            };
            let next = inner.state().take_next();
            // Nothing left means the queue was cleared after this unit was scheduled.
            let Some(Pending { key, job }) = next else {
                return;
            };
            tracing::trace!(%key, "task started");
            job().await;
            tracing::trace!(%key, "task settled");
        });
    }

    /// Reject every task that has not started yet.
    ///
    /// Their handles resolve to [`ErrorKind::Cancelled`](crate::error::ErrorKind::Cancelled).
    /// Running tasks are unaffected. Returns the number of rejected tasks.
    pub fn clear(&self) -> usize {
        let cleared = {
            let mut state = self.inner.state();
            state.slots.clear();
            std::mem::take(&mut state.pending)
        };
        let count = cleared.len();
        // Dropping the jobs drops their senders, which settles the handles.
        drop(cleared);
        tracing::debug!(count, "cleared pending tasks");
        count
    }

    /// `true` once the task registered under `key` has been taken off the
    /// pending list (it is running or already settled), including keys this
    /// queue never handed out.
    pub fn is_processing(&self, key: impl AsRef<str>) -> bool {
        !self.inner.state().slots.contains_key(key.as_ref())
    }

    /// Number of tasks waiting for a slot.
    pub fn pending(&self) -> usize {
        self.inner.state().pending.len()
    }
}

/// Hardware threads minus one, never less than one.
pub fn default_concurrency() -> usize {
    std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1).saturating_sub(1).max(1)
}
