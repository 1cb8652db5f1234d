/// Image cache and preload queue
///
/// Bounded-concurrency scheduler for image loads with request coalescing and
/// a capacity-bounded cache. All state lives on the UI loop: callers request
/// images and receive an `ImageFuture`, the queue hands `LoadTicket`s to a
/// `LoadSink` to actually start work, and the UI loop reports each finished
/// load back through `complete`. No locks are involved because nothing here
/// is touched off the UI loop.
///
/// Scheduling:
/// - At most `max_concurrent` loads are active at once.
/// - Higher priority starts first; equal priorities start in request order.
/// - At most one load per URL is ever in flight.
/// - Every completion (success or failure) immediately re-pumps the queue.
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;
use tracing::{debug, trace, warn};

use crate::loader::{ImageHandle, ImageLoadError, LoadResult};

pub type Priority = u32;

/// Photo currently shown in the viewer
pub const PRIORITY_CURRENT: Priority = 100;
/// Photos adjacent to the current one in the gallery sequence
pub const PRIORITY_NEIGHBOR: Priority = 50;
/// Leading photos of the previous/next team
pub const PRIORITY_ADJACENT_TEAM: Priority = 30;
/// Grid thumbnails scrolled into view
pub const PRIORITY_THUMBNAIL: Priority = 10;

pub const DEFAULT_MAX_CONCURRENT: usize = 6;
pub const DEFAULT_MAX_CACHE_ENTRIES: usize = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueConfig {
    pub max_concurrent: usize,
    pub max_cache_entries: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            max_cache_entries: DEFAULT_MAX_CACHE_ENTRIES,
        }
    }
}

/// Identifies one started load; handed back to `complete` when it finishes
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LoadTicket {
    pub url: String,
    pub load_id: u64,
}

/// Starts the actual work for a load ticket
pub trait LoadSink {
    fn start(&mut self, ticket: LoadTicket);
}

/// Resolves with the result of a requested image load
///
/// Dropping the future does not cancel the load; the result is simply not
/// delivered to this caller.
pub struct ImageFuture {
    url: String,
    rx: oneshot::Receiver<LoadResult>,
}

impl ImageFuture {
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Future for ImageFuture {
    type Output = LoadResult;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match Pin::new(&mut this.rx).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(_)) => Poll::Ready(Err(ImageLoadError::Abandoned(this.url.clone()))),
            Poll::Pending => Poll::Pending,
        }
    }
}

#[derive(Debug, Clone)]
pub enum CacheStatus {
    Pending,
    Loaded(ImageHandle),
    Failed(ImageLoadError),
}

impl CacheStatus {
    fn is_settled(&self) -> bool {
        !matches!(self, CacheStatus::Pending)
    }
}

#[derive(Debug)]
struct CacheEntry {
    status: CacheStatus,
    last_used: u64,
}

type Waiter = oneshot::Sender<LoadResult>;

struct PendingLoad {
    url: String,
    priority: Priority,
    seq: u64,
    waiters: Vec<Waiter>,
}

struct ActiveLoad {
    load_id: u64,
    /// Set by `refresh`: the result goes to existing waiters but is not cached
    superseded: bool,
    waiters: Vec<Waiter>,
}

pub struct PreloadQueue<S: LoadSink> {
    config: QueueConfig,
    sink: S,
    cache: HashMap<String, CacheEntry>,
    pending: Vec<PendingLoad>,
    active: HashMap<String, ActiveLoad>,
    priority_set: HashSet<String>,
    current: Option<String>,
    next_seq: u64,
    next_load_id: u64,
    tick: u64,
}

impl<S: LoadSink> PreloadQueue<S> {
    pub fn new(config: QueueConfig, sink: S) -> Self {
        Self {
            config: QueueConfig {
                max_concurrent: config.max_concurrent.max(1),
                max_cache_entries: config.max_cache_entries.max(1),
            },
            sink,
            cache: HashMap::new(),
            pending: Vec::new(),
            active: HashMap::new(),
            priority_set: HashSet::new(),
            current: None,
            next_seq: 0,
            next_load_id: 0,
            tick: 0,
        }
    }

    pub fn config(&self) -> QueueConfig {
        self.config
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn is_active(&self, url: &str) -> bool {
        self.active.contains_key(url)
    }

    /// Number of settled (loaded or failed) cache entries
    pub fn cached_count(&self) -> usize {
        self.cache.values().filter(|e| e.status.is_settled()).count()
    }

    pub fn status(&self, url: &str) -> Option<&CacheStatus> {
        self.cache.get(url).map(|e| &e.status)
    }

    /// Request one image
    pub fn request(&mut self, url: &str, priority: Priority) -> ImageFuture {
        let future = self.request_without_pump(url, priority);
        self.pump();
        future
    }

    /// Request several images as one batch
    ///
    /// All requests are queued before any load starts, so the batch is
    /// dispatched in priority order rather than request order.
    pub fn request_many<I>(&mut self, requests: I) -> Vec<ImageFuture>
    where
        I: IntoIterator<Item = (String, Priority)>,
    {
        let futures = requests
            .into_iter()
            .map(|(url, priority)| self.request_without_pump(&url, priority))
            .collect();
        self.pump();
        futures
    }

    fn request_without_pump(&mut self, url: &str, priority: Priority) -> ImageFuture {
        let (tx, rx) = oneshot::channel();
        let future = ImageFuture {
            url: url.to_string(),
            rx,
        };

        self.tick += 1;
        if let Some(entry) = self.cache.get_mut(url) {
            match &entry.status {
                CacheStatus::Loaded(handle) => {
                    trace!("QUEUE: Cache hit for {}", url);
                    entry.last_used = self.tick;
                    let _ = tx.send(Ok(handle.clone()));
                    return future;
                }
                CacheStatus::Failed(error) => {
                    trace!("QUEUE: Cached failure for {}", url);
                    entry.last_used = self.tick;
                    let _ = tx.send(Err(error.clone()));
                    return future;
                }
                CacheStatus::Pending => {}
            }
        }

        if let Some(active) = self.active.get_mut(url) {
            if !active.superseded {
                trace!("QUEUE: Attaching to in-flight load of {}", url);
                active.waiters.push(tx);
                return future;
            }
        }

        self.attach_pending(url, priority, tx);
        future
    }

    /// Drop any cached entry for `url` and load it again
    ///
    /// A load already in flight keeps running for its existing waiters but
    /// its result is not cached; the fresh load starts once it finishes.
    pub fn refresh(&mut self, url: &str, priority: Priority) -> ImageFuture {
        let (tx, rx) = oneshot::channel();
        let future = ImageFuture {
            url: url.to_string(),
            rx,
        };

        if self.cache.remove(url).is_some() {
            debug!("QUEUE: Invalidated cached entry for {}", url);
        }
        if let Some(active) = self.active.get_mut(url) {
            debug!("QUEUE: Superseding in-flight load of {}", url);
            active.superseded = true;
        }

        self.attach_pending(url, priority, tx);
        self.pump();
        future
    }

    fn attach_pending(&mut self, url: &str, priority: Priority, waiter: Waiter) {
        if let Some(pending) = self.pending.iter_mut().find(|p| p.url == url) {
            if priority > pending.priority {
                trace!("QUEUE: Raising priority of {} to {}", url, priority);
                pending.priority = priority;
            }
            pending.waiters.push(waiter);
            return;
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        self.pending.push(PendingLoad {
            url: url.to_string(),
            priority,
            seq,
            waiters: vec![waiter],
        });
        self.cache
            .entry(url.to_string())
            .or_insert(CacheEntry {
                status: CacheStatus::Pending,
                last_used: self.tick,
            })
            .status = CacheStatus::Pending;
        trace!("QUEUE: Queued {} at priority {} ({} pending)", url, priority, self.pending.len());
    }

    /// Index of the next pending load to start: highest priority, then oldest
    fn next_pending_index(&self) -> Option<usize> {
        self.pending
            .iter()
            .enumerate()
            .filter(|(_, p)| !self.active.contains_key(&p.url))
            .max_by(|(_, a), (_, b)| {
                a.priority
                    .cmp(&b.priority)
                    .then_with(|| b.seq.cmp(&a.seq))
            })
            .map(|(idx, _)| idx)
    }

    /// Start pending loads until the concurrency limit is reached
    fn pump(&mut self) {
        while self.active.len() < self.config.max_concurrent {
            let Some(idx) = self.next_pending_index() else {
                break;
            };
            let load = self.pending.swap_remove(idx);
            let load_id = self.next_load_id;
            self.next_load_id += 1;

            debug!(
                "QUEUE: Starting load {} of {} (priority {}, {} active)",
                load_id,
                load.url,
                load.priority,
                self.active.len() + 1
            );
            self.active.insert(
                load.url.clone(),
                ActiveLoad {
                    load_id,
                    superseded: false,
                    waiters: load.waiters,
                },
            );
            self.sink.start(LoadTicket {
                url: load.url,
                load_id,
            });
        }
    }

    /// Record the outcome of a started load and keep the queue saturated
    pub fn complete(&mut self, ticket: &LoadTicket, result: LoadResult) {
        let matches = self
            .active
            .get(&ticket.url)
            .map(|a| a.load_id == ticket.load_id)
            .unwrap_or(false);
        if !matches {
            warn!("QUEUE: Completion for unknown load {} of {}", ticket.load_id, ticket.url);
            return;
        }
        let Some(active) = self.active.remove(&ticket.url) else {
            return;
        };

        match &result {
            Ok(handle) => debug!("QUEUE: Loaded {} ({} bytes)", ticket.url, handle.len()),
            Err(e) => debug!("QUEUE: Failed {}: {}", ticket.url, e),
        }

        for waiter in active.waiters {
            let _ = waiter.send(result.clone());
        }

        if active.superseded {
            debug!("QUEUE: Not caching superseded result for {}", ticket.url);
        } else {
            self.tick += 1;
            let status = match result {
                Ok(handle) => CacheStatus::Loaded(handle),
                Err(error) => CacheStatus::Failed(error),
            };
            self.cache.insert(
                ticket.url.clone(),
                CacheEntry {
                    status,
                    last_used: self.tick,
                },
            );
            self.evict();
        }

        self.pump();
    }

    /// Replace the set of URLs protected from eviction
    pub fn set_priority_set<I>(&mut self, current: Option<String>, urls: I)
    where
        I: IntoIterator<Item = String>,
    {
        self.priority_set = urls.into_iter().collect();
        if let Some(url) = &current {
            self.priority_set.insert(url.clone());
        }
        self.current = current;
        self.evict();
    }

    /// Evict least-recently-used settled entries outside the priority set
    fn evict(&mut self) {
        let mut settled = self.cached_count();
        while settled > self.config.max_cache_entries {
            let victim = self
                .cache
                .iter()
                .filter(|(url, e)| {
                    e.status.is_settled()
                        && !self.priority_set.contains(*url)
                        && self.current.as_deref() != Some(url.as_str())
                })
                .min_by(|(url_a, a), (url_b, b)| {
                    a.last_used.cmp(&b.last_used).then_with(|| url_a.cmp(url_b))
                })
                .map(|(url, _)| url.clone());

            match victim {
                Some(url) => {
                    trace!("QUEUE: Evicting {}", url);
                    self.cache.remove(&url);
                    settled -= 1;
                }
                None => {
                    debug!("QUEUE: Cache over capacity but every entry is protected");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;

    #[derive(Default)]
    struct RecordingSink {
        started: Vec<LoadTicket>,
    }

    impl LoadSink for RecordingSink {
        fn start(&mut self, ticket: LoadTicket) {
            self.started.push(ticket);
        }
    }

    fn queue(max_concurrent: usize, max_cache_entries: usize) -> PreloadQueue<RecordingSink> {
        PreloadQueue::new(
            QueueConfig {
                max_concurrent,
                max_cache_entries,
            },
            RecordingSink::default(),
        )
    }

    fn started_urls(q: &PreloadQueue<RecordingSink>) -> Vec<&str> {
        q.sink().started.iter().map(|t| t.url.as_str()).collect()
    }

    fn ticket_for(q: &PreloadQueue<RecordingSink>, url: &str) -> LoadTicket {
        q.sink()
            .started
            .iter()
            .rev()
            .find(|t| t.url == url)
            .cloned()
            .expect("load was started")
    }

    fn finish(q: &mut PreloadQueue<RecordingSink>, url: &str) -> ImageHandle {
        let ticket = ticket_for(q, url);
        let handle = ImageHandle::new(url, url.as_bytes().to_vec());
        q.complete(&ticket, Ok(handle.clone()));
        handle
    }

    #[test]
    fn test_batch_starts_highest_priorities_first() {
        let mut q = queue(2, 10);
        let _futures = q.request_many(vec![
            ("a".to_string(), 5),
            ("b".to_string(), 10),
            ("c".to_string(), 1),
        ]);

        assert_eq!(started_urls(&q), vec!["b", "a"]);
        assert_eq!(q.pending_count(), 1);

        finish(&mut q, "b");
        assert_eq!(started_urls(&q), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_third_request_waits_for_free_slot() {
        let mut q = queue(2, 10);
        let _a = q.request("a", 5);
        let _b = q.request("b", 10);
        let _c = q.request("c", 1);

        assert_eq!(q.active_count(), 2);
        assert!(!q.is_active("c"));

        let ticket = ticket_for(&q, "a");
        q.complete(&ticket, Err(ImageLoadError::NotFound("a".to_string())));

        assert!(q.is_active("c"));
        assert_eq!(q.active_count(), 2);
    }

    #[test]
    fn test_equal_priority_is_fifo() {
        let mut q = queue(1, 10);
        let _blocker = q.request("blocker", 100);
        let _futures = q.request_many(vec![
            ("first".to_string(), 7),
            ("second".to_string(), 7),
            ("third".to_string(), 7),
        ]);

        finish(&mut q, "blocker");
        finish(&mut q, "first");
        finish(&mut q, "second");

        assert_eq!(started_urls(&q), vec!["blocker", "first", "second", "third"]);
    }

    #[tokio::test]
    async fn test_concurrent_requests_coalesce() {
        let mut q = queue(6, 10);
        let first = q.request("same.jpg", 10);
        let second = q.request("same.jpg", 50);

        assert_eq!(q.sink().started.len(), 1);

        let handle = finish(&mut q, "same.jpg");
        let a = first.await.unwrap();
        let b = second.await.unwrap();

        assert!(a.same_as(&handle));
        assert!(b.same_as(&handle));
        assert_eq!(q.sink().started.len(), 1);
    }

    #[test]
    fn test_cached_request_resolves_immediately() {
        let mut q = queue(2, 10);
        let _ = q.request("a", 1);
        let handle = finish(&mut q, "a");

        let result = q.request("a", 1).now_or_never().expect("ready");
        assert!(result.unwrap().same_as(&handle));
        assert_eq!(q.sink().started.len(), 1);
    }

    #[test]
    fn test_queued_request_priority_is_raised() {
        let mut q = queue(1, 10);
        let _blocker = q.request("blocker", 100);
        let _low = q.request("low", 1);
        let _mid = q.request("mid", 5);
        let _again = q.request("low", 9);

        finish(&mut q, "blocker");
        assert_eq!(started_urls(&q), vec!["blocker", "low"]);
    }

    #[test]
    fn test_failure_is_cached_and_does_not_block_queue() {
        let mut q = queue(1, 10);
        let _a = q.request("bad", 10);
        let _b = q.request("good", 5);

        let ticket = ticket_for(&q, "bad");
        q.complete(&ticket, Err(ImageLoadError::NotFound("bad".to_string())));

        assert!(q.is_active("good"));
        assert!(matches!(q.status("bad"), Some(CacheStatus::Failed(_))));

        let again = q.request("bad", 10).now_or_never().expect("ready");
        assert!(again.is_err());
        assert_eq!(started_urls(&q), vec!["bad", "good"]);
    }

    #[test]
    fn test_refresh_reloads_cached_entry() {
        let mut q = queue(2, 10);
        let _ = q.request("a", 1);
        let old = finish(&mut q, "a");

        let fresh = q.refresh("a", PRIORITY_CURRENT);
        assert_eq!(q.sink().started.len(), 2);

        let new = finish(&mut q, "a");
        let result = fresh.now_or_never().expect("ready").unwrap();
        assert!(result.same_as(&new));
        assert!(!result.same_as(&old));
    }

    #[test]
    fn test_refresh_while_in_flight_waits_and_skips_stale_cache() {
        let mut q = queue(4, 10);
        let stale_waiter = q.request("a", 1);
        let fresh_waiter = q.refresh("a", PRIORITY_CURRENT);

        // never two loads for one URL
        assert_eq!(q.sink().started.len(), 1);

        let stale = finish(&mut q, "a");
        assert!(stale_waiter.now_or_never().unwrap().unwrap().same_as(&stale));
        assert!(matches!(q.status("a"), Some(CacheStatus::Pending)));
        assert_eq!(q.sink().started.len(), 2);

        let fresh = finish(&mut q, "a");
        assert!(fresh_waiter.now_or_never().unwrap().unwrap().same_as(&fresh));
        assert!(matches!(q.status("a"), Some(CacheStatus::Loaded(_))));
    }

    #[test]
    fn test_eviction_preserves_priority_set() {
        let mut q = queue(1, 2);
        q.set_priority_set(Some("current".to_string()), vec!["next".to_string()]);

        for url in ["current", "next", "old1", "old2"] {
            let _ = q.request(url, 1);
            finish(&mut q, url);
        }

        assert!(q.status("current").is_some());
        assert!(q.status("next").is_some());
        assert!(q.status("old1").is_none());
        assert!(q.status("old2").is_none());
        assert_eq!(q.cached_count(), 2);
    }

    #[test]
    fn test_eviction_is_lru() {
        let mut q = queue(1, 2);
        for url in ["a", "b"] {
            let _ = q.request(url, 1);
            finish(&mut q, url);
        }
        // touch a so b becomes the oldest
        let _ = q.request("a", 1);
        let _ = q.request("c", 1);
        finish(&mut q, "c");

        assert!(q.status("a").is_some());
        assert!(q.status("b").is_none());
        assert!(q.status("c").is_some());
    }

    #[test]
    fn test_unknown_completion_is_ignored() {
        let mut q = queue(1, 2);
        let _ = q.request("a", 1);
        q.complete(
            &LoadTicket {
                url: "a".to_string(),
                load_id: 99,
            },
            Err(ImageLoadError::NotFound("a".to_string())),
        );
        assert!(q.is_active("a"));
    }

    #[tokio::test]
    async fn test_dropped_queue_abandons_waiters() {
        let mut q = queue(1, 2);
        let future = q.request("a", 1);
        drop(q);
        assert!(matches!(future.await, Err(ImageLoadError::Abandoned(_))));
    }
}
