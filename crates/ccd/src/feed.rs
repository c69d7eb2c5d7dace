//! Shared, cached polling of one telephony query.
//!
//! Several screens usually want the same live data (agent states, campaign
//! counters). A [`Feed`] owns that query: concurrent readers share one
//! in-flight request, recent results are served from cache, and at most one
//! background polling loop runs per feed. Every result gets a sequence
//! number, so subscribers can never observe an older snapshot after a newer
//! one.

use std::{
    fmt,
    sync::{
        Arc, Mutex, PoisonError, Weak,
        atomic::{AtomicU64, Ordering},
    },
    time::{Duration, Instant},
};

use futures::future::BoxFuture;
use tokio::{sync::watch, task::JoinHandle, time::MissedTickBehavior};
use tracing::{debug, info};

use crate::dialer::Sourced;

/// Shortest interval accepted by [`Feed::spawn_polling`].
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(50);

type FetchFn<T> = dyn Fn() -> BoxFuture<'static, Sourced<T>> + Send + Sync;

/// One fetched value.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot<T> {
    /// Position of this snapshot in the feed, starting at 1.
    pub seq: u64,
    pub fetched_at: Instant,
    pub value: Sourced<T>,
}

struct Inner<T> {
    name: String,
    ttl: Duration,
    fetch: Box<FetchFn<T>>,
    /// Held for the whole fetch; this is what makes requests single-flight.
    current: tokio::sync::Mutex<Option<Arc<Snapshot<T>>>>,
    seq: AtomicU64,
    tx: watch::Sender<Option<Arc<Snapshot<T>>>>,
    poller: Mutex<Weak<PollTask>>,
}

/// A cached, single-flight view over one fetch operation.
///
/// Cheap to clone; clones share the cache, the subscribers and the polling
/// loop.
pub struct Feed<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for Feed<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for Feed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Feed")
            .field("name", &self.inner.name)
            .field("ttl", &self.inner.ttl)
            .field("seq", &self.inner.seq.load(Ordering::Acquire))
            .finish_non_exhaustive()
    }
}

impl<T: Send + Sync + 'static> Feed<T> {
    /// Creates a feed over `fetch`.
    ///
    /// Results younger than `ttl` are served from cache. A zero `ttl`
    /// disables caching but keeps concurrent callers on one request.
    pub fn new<F>(name: impl Into<String>, ttl: Duration, fetch: F) -> Self
    where
        F: Fn() -> BoxFuture<'static, Sourced<T>> + Send + Sync + 'static,
    {
        let (tx, _rx) = watch::channel(None);
        Self {
            inner: Arc::new(Inner {
                name: name.into(),
                ttl,
                fetch: Box::new(fetch),
                current: tokio::sync::Mutex::new(None),
                seq: AtomicU64::new(0),
                tx,
                poller: Mutex::new(Weak::new()),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Returns a snapshot no older than the TTL, fetching one if needed.
    ///
    /// Callers that arrive while a fetch is in flight wait for it and share
    /// its result.
    pub async fn get(&self) -> Arc<Snapshot<T>> {
        let seen = self.inner.seq.load(Ordering::Acquire);
        let mut current = self.inner.current.lock().await;

        let fresh = current.as_ref().filter(|snapshot| {
            snapshot.seq > seen || snapshot.fetched_at.elapsed() < self.inner.ttl
        });
        if let Some(snapshot) = fresh {
            return Arc::clone(snapshot);
        }

        self.fetch_locked(&mut current).await
    }

    /// Fetches a new snapshot regardless of the TTL.
    ///
    /// Callers that arrive while a fetch is in flight share its result.
    pub async fn refresh(&self) -> Arc<Snapshot<T>> {
        let seen = self.inner.seq.load(Ordering::Acquire);
        let mut current = self.inner.current.lock().await;

        if let Some(snapshot) = current.as_ref().filter(|snapshot| snapshot.seq > seen) {
            return Arc::clone(snapshot);
        }

        self.fetch_locked(&mut current).await
    }

    async fn fetch_locked(&self, current: &mut Option<Arc<Snapshot<T>>>) -> Arc<Snapshot<T>> {
        let value = (self.inner.fetch)().await;
        let seq = self.inner.seq.fetch_add(1, Ordering::AcqRel) + 1;
        let snapshot = Arc::new(Snapshot {
            seq,
            fetched_at: Instant::now(),
            value,
        });

        *current = Some(Arc::clone(&snapshot));
        self.inner.tx.send_replace(Some(Arc::clone(&snapshot)));
        debug!(feed = %self.inner.name, seq, source = snapshot.value.source.as_str(), "feed updated");
        snapshot
    }

    /// The most recent snapshot, without fetching.
    pub fn latest(&self) -> Option<Arc<Snapshot<T>>> {
        self.inner.tx.borrow().clone()
    }

    /// Receives every new snapshot. Starts at the current one, `None` if
    /// nothing has been fetched yet.
    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<Snapshot<T>>>> {
        self.inner.tx.subscribe()
    }

    /// Starts refreshing the feed every `interval` in the background.
    ///
    /// Only one loop runs per feed: while one is running, further calls
    /// return a handle to it and their `interval` is ignored. The loop stops
    /// when the last handle is dropped.
    pub fn spawn_polling(&self, interval: Duration) -> PollHandle {
        let mut poller = self
            .inner
            .poller
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(task) = poller.upgrade() {
            debug!(feed = %self.inner.name, "joining running poll loop");
            return PollHandle { task };
        }

        let interval = interval.max(MIN_POLL_INTERVAL);
        let feed = self.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                feed.refresh().await;
            }
        });
        info!(feed = %self.inner.name, ?interval, "started polling");

        let task = Arc::new(PollTask {
            name: self.inner.name.clone(),
            handle,
        });
        *poller = Arc::downgrade(&task);
        PollHandle { task }
    }
}

struct PollTask {
    name: String,
    handle: JoinHandle<()>,
}

impl Drop for PollTask {
    fn drop(&mut self) {
        self.handle.abort();
        info!(feed = %self.name, "stopped polling");
    }
}

/// Keeps a feed's polling loop alive.
///
/// Handles from the same feed share one loop, which is aborted together
/// with any in-flight request when the last handle is dropped.
#[must_use = "polling stops when the handle is dropped"]
pub struct PollHandle {
    task: Arc<PollTask>,
}

impl PollHandle {
    /// Releases this handle. Same as dropping it.
    pub fn stop(self) {
        drop(self);
    }

    /// Returns `true` while the polling loop is running.
    pub fn is_running(&self) -> bool {
        !self.task.handle.is_finished()
    }
}

impl fmt::Debug for PollHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PollHandle")
            .field("feed", &self.task.name)
            .field("running", &self.is_running())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use futures::FutureExt;

    use super::*;

    /// A feed whose fetch counts calls and takes `delay` to answer.
    fn counting_feed(ttl: Duration, delay: Duration) -> (Feed<usize>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let feed = Feed::new("test", ttl, move || {
            let counter = Arc::clone(&counter);
            async move {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                tokio::time::sleep(delay).await;
                Sourced::live(n)
            }
            .boxed()
        });
        (feed, calls)
    }

    #[tokio::test]
    async fn test_concurrent_gets_share_one_fetch() {
        let (feed, calls) = counting_feed(Duration::ZERO, Duration::from_millis(50));

        let (a, b, c) = tokio::join!(feed.get(), feed.get(), feed.get());

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(a.seq, 1);
        assert!(Arc::ptr_eq(&a, &b));
        assert!(Arc::ptr_eq(&b, &c));
    }

    #[tokio::test]
    async fn test_get_serves_cache_within_ttl() {
        let (feed, calls) = counting_feed(Duration::from_secs(60), Duration::ZERO);

        let first = feed.get().await;
        let second = feed.get().await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(first.seq, second.seq);
        assert_eq!(second.value, Sourced::live(1));
    }

    #[tokio::test]
    async fn test_zero_ttl_refetches_with_increasing_seq() {
        let (feed, calls) = counting_feed(Duration::ZERO, Duration::ZERO);

        let first = feed.get().await;
        let second = feed.get().await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(first.seq, 1);
        assert_eq!(second.seq, 2);
        assert_eq!(second.value.data, 2);
    }

    #[tokio::test]
    async fn test_refresh_ignores_ttl() {
        let (feed, calls) = counting_feed(Duration::from_secs(60), Duration::ZERO);

        feed.get().await;
        let refreshed = feed.refresh().await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(refreshed.seq, 2);
        assert_eq!(feed.latest().map(|s| s.seq), Some(2));
    }

    #[tokio::test]
    async fn test_subscriber_sees_new_snapshots() {
        let (feed, _calls) = counting_feed(Duration::ZERO, Duration::ZERO);
        let mut rx = feed.subscribe();
        assert!(rx.borrow().is_none());

        feed.refresh().await;
        rx.changed().await.unwrap();

        let seq = rx.borrow_and_update().as_ref().map(|s| s.seq);
        assert_eq!(seq, Some(1));
    }

    #[tokio::test]
    async fn test_polling_publishes_in_order_and_stops_on_drop() {
        let (feed, calls) = counting_feed(Duration::ZERO, Duration::ZERO);
        let mut rx = feed.subscribe();

        let handle = feed.spawn_polling(Duration::from_millis(50));
        assert!(handle.is_running());

        let mut last = 0;
        for _ in 0..3 {
            tokio::time::timeout(Duration::from_secs(5), rx.changed())
                .await
                .unwrap()
                .unwrap();
            let seq = rx.borrow_and_update().as_ref().unwrap().seq;
            assert!(seq > last);
            last = seq;
        }

        handle.stop();
        tokio::time::sleep(Duration::from_millis(20)).await;
        let stopped_at = calls.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert_eq!(calls.load(Ordering::SeqCst), stopped_at);
    }

    #[tokio::test]
    async fn test_second_spawn_joins_running_loop() {
        let (feed, _calls) = counting_feed(Duration::ZERO, Duration::ZERO);

        let first = feed.spawn_polling(Duration::from_millis(50));
        let second = feed.spawn_polling(Duration::from_secs(3600));
        assert!(Arc::ptr_eq(&first.task, &second.task));

        drop(first);
        assert!(second.is_running());

        let weak = Arc::downgrade(&second.task);
        drop(second);
        assert!(weak.upgrade().is_none());

        let third = feed.spawn_polling(Duration::from_millis(50));
        assert!(third.is_running());
    }
}
