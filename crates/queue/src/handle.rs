use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use futures::channel::oneshot;
use pin_project_lite::pin_project;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

pin_project! {
    /// Completion handle for a task registered with [`Queue::enqueue`](crate::Queue::enqueue).
    ///
    /// Resolves to the task's output once it has run, or to
    /// [`ErrorKind::Cancelled`] if the task was cleared before starting (or
    /// panicked). Dropping the handle does not cancel the task.
    pub struct QueueHandle<T> {
        key: String,
        #[pin]
        receiver: oneshot::Receiver<T>,
    }
}

impl<T> QueueHandle<T> {
    pub(crate) fn new(key: String, receiver: oneshot::Receiver<T>) -> Self {
        Self { key, receiver }
    }

    /// The uniquified key (`<key>_<counter>`) the task was registered under.
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl<T> Future for QueueHandle<T> {
    type Output = Result<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        let key = this.key;
        this.receiver.poll(cx).map(|settled| settled.or_raise(|| ErrorKind::Cancelled(key.clone())))
    }
}
