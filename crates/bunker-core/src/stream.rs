// ── Reactive record streams ──
//
// Subscription type for consuming cache changes.

use std::pin::Pin;
use std::task::{Context, Poll};

use bunker_api::Resource;
use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::store::Snapshot;

/// A subscription to one resource cache.
///
/// Provides both point-in-time snapshot access and reactive change
/// notification via the `changed()` method or by converting to a `Stream`.
pub struct RecordStream<R: Resource> {
    current: Snapshot<R>,
    receiver: watch::Receiver<Snapshot<R>>,
}

impl<R: Resource> RecordStream<R> {
    pub(crate) fn new(mut receiver: watch::Receiver<Snapshot<R>>) -> Self {
        let current = receiver.borrow_and_update().clone();
        Self { current, receiver }
    }

    /// Get the snapshot captured at creation time (or at the last `changed()`).
    pub fn current(&self) -> &Snapshot<R> {
        &self.current
    }

    /// Get the latest snapshot (may have changed since creation).
    pub fn latest(&self) -> Snapshot<R> {
        self.receiver.borrow().clone()
    }

    /// Wait for the next change, returning the new snapshot.
    /// Returns `None` if the cache has been dropped.
    pub async fn changed(&mut self) -> Option<Snapshot<R>> {
        self.receiver.changed().await.ok()?;
        let snap = self.receiver.borrow_and_update().clone();
        self.current = snap.clone();
        Some(snap)
    }

    /// Convert into a `Stream` for use with `StreamExt` combinators.
    ///
    /// The first item is the current snapshot.
    pub fn into_stream(self) -> RecordWatchStream<R> {
        RecordWatchStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` adapter backed by a `watch::Receiver`.
///
/// Yields a new snapshot each time the underlying collection is mutated.
pub struct RecordWatchStream<R: Resource> {
    inner: WatchStream<Snapshot<R>>,
}

impl<R: Resource> Stream for RecordWatchStream<R> {
    type Item = Snapshot<R>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        // Snapshot<R> is an Arc, so WatchStream is Unpin.
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
