//! Ready-or-deferred futures with a synchronous fast path.
//!
//! A [`LazyFuture`] either already holds its value or wraps deferred work.
//! Callers that can tolerate waiting simply `.await` it; callers that must
//! not suspend probe it with [`LazyFuture::now`], which polls deferred work
//! exactly once with a no-op waker and hands the future back if it is not
//! finished. [`collect_all`] gathers a batch, staying synchronous when every
//! element resolves synchronously.
//!
//! The layer adds no threads and never blocks: deferred work runs on
//! whichever executor the caller awaits from, and dropping a `LazyFuture`
//! abandons its pending work.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll, Waker};

/// A boxed, sendable future.
pub type BoxedFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

/// A future that may already hold its result.
pub struct LazyFuture<T> {
    inner: Inner<T>,
}

enum Inner<T> {
    Ready(Option<T>),
    Deferred(BoxedFuture<T>),
}

impl<T: Send + 'static> LazyFuture<T> {
    /// A future that is already complete.
    pub fn ready(value: T) -> Self {
        Self {
            inner: Inner::Ready(Some(value)),
        }
    }

    /// A future wrapping deferred work.
    pub fn deferred<F>(future: F) -> Self
    where
        F: Future<Output = T> + Send + 'static,
    {
        Self {
            inner: Inner::Deferred(Box::pin(future)),
        }
    }

    /// Returns `true` if the value is available without polling.
    pub fn is_ready(&self) -> bool {
        matches!(self.inner, Inner::Ready(Some(_)))
    }

    /// Resolve synchronously if possible.
    ///
    /// Deferred work is polled once with a no-op waker; if it is still
    /// pending the future is handed back unchanged and remains awaitable.
    /// Never blocks.
    pub fn now(mut self) -> Result<T, Self> {
        match &mut self.inner {
            Inner::Ready(slot) => Ok(slot.take().expect("LazyFuture polled after completion")),
            Inner::Deferred(future) => match probe(future) {
                Poll::Ready(value) => Ok(value),
                Poll::Pending => Err(self),
            },
        }
    }

    /// Transform the eventual value.
    ///
    /// A ready future stays ready: `f` runs immediately. A deferred future
    /// gets `f` chained onto its work.
    pub fn map<U, F>(self, f: F) -> LazyFuture<U>
    where
        U: Send + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        match self.inner {
            Inner::Ready(Some(value)) => LazyFuture::ready(f(value)),
            Inner::Ready(None) => panic!("LazyFuture polled after completion"),
            Inner::Deferred(future) => LazyFuture::deferred(async move { f(future.await) }),
        }
    }
}

impl<T> fmt::Debug for LazyFuture<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &self.inner {
            Inner::Ready(Some(_)) => "ready",
            Inner::Ready(None) => "taken",
            Inner::Deferred(_) => "deferred",
        };
        f.debug_tuple("LazyFuture").field(&state).finish()
    }
}

impl<T> Unpin for LazyFuture<T> {}

impl<T> Future for LazyFuture<T> {
    type Output = T;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<T> {
        let this = self.get_mut();
        match &mut this.inner {
            Inner::Ready(slot) => {
                Poll::Ready(slot.take().expect("LazyFuture polled after completion"))
            }
            Inner::Deferred(future) => future.as_mut().poll(cx),
        }
    }
}

fn probe<T>(future: &mut BoxedFuture<T>) -> Poll<T> {
    let mut cx = Context::from_waker(Waker::noop());
    future.as_mut().poll(&mut cx)
}

/// Gather a batch of futures into one, preserving input order.
///
/// Every element is probed up front, so the result is ready exactly when all
/// elements resolve synchronously. Otherwise the remaining futures are polled
/// concurrently by a single joined future.
pub fn collect_all<T: Send + 'static>(futures: Vec<LazyFuture<T>>) -> LazyFuture<Vec<T>> {
    let mut results: Vec<Option<T>> = Vec::with_capacity(futures.len());
    results.resize_with(futures.len(), || None);
    let mut pending: Vec<(usize, BoxedFuture<T>)> = Vec::new();

    for (index, future) in futures.into_iter().enumerate() {
        match future.inner {
            Inner::Ready(Some(value)) => results[index] = Some(value),
            Inner::Ready(None) => panic!("LazyFuture polled after completion"),
            Inner::Deferred(mut boxed) => match probe(&mut boxed) {
                Poll::Ready(value) => results[index] = Some(value),
                Poll::Pending => pending.push((index, boxed)),
            },
        }
    }

    if pending.is_empty() {
        return LazyFuture::ready(results.into_iter().flatten().collect());
    }
    LazyFuture::deferred(JoinAll { pending, results })
}

struct JoinAll<T> {
    pending: Vec<(usize, BoxedFuture<T>)>,
    results: Vec<Option<T>>,
}

impl<T> Unpin for JoinAll<T> {}

impl<T> Future for JoinAll<T> {
    type Output = Vec<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Vec<T>> {
        let this = self.get_mut();
        let mut i = 0;
        while i < this.pending.len() {
            let (slot, future) = &mut this.pending[i];
            match future.as_mut().poll(cx) {
                Poll::Ready(value) => {
                    this.results[*slot] = Some(value);
                    this.pending.swap_remove(i);
                }
                Poll::Pending => i += 1,
            }
        }
        if this.pending.is_empty() {
            Poll::Ready(this.results.iter_mut().filter_map(Option::take).collect())
        } else {
            Poll::Pending
        }
    }
}
