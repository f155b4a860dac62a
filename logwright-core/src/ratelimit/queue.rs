use super::{RateLimitError, TokenBucket};
use crate::event::LogEvent;
use crate::sync::{lock, panic_message};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// What to do with an item that does not fit in the queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Wait for space up to the admission timeout.
    #[default]
    Block,
    /// Evict from the head until the new item fits.
    DropOldest,
    /// Reject the new item.
    DropNewest,
}

/// Items that can be buffered by a [`QueuedRateLimiter`].
pub trait QueueItem: Send + 'static {
    /// Approximate bytes held by the item, checked against the byte budget.
    fn estimated_size(&self) -> usize {
        std::mem::size_of_val(self)
    }
}

impl QueueItem for LogEvent {
    fn estimated_size(&self) -> usize {
        LogEvent::estimated_size(self)
    }
}

impl QueueItem for String {
    fn estimated_size(&self) -> usize {
        std::mem::size_of::<String>() + self.len()
    }
}

impl QueueItem for u64 {}
impl QueueItem for usize {}
impl QueueItem for (usize, usize) {}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueueConfig {
    pub capacity: f64,
    pub refill_rate: f64,
    pub max_queue_size: usize,
    pub max_bytes: Option<usize>,
    pub policy: OverflowPolicy,
}

impl QueueConfig {
    pub fn new(capacity: f64, refill_rate: f64, max_queue_size: usize) -> Self {
        Self {
            capacity,
            refill_rate,
            max_queue_size,
            max_bytes: None,
            policy: OverflowPolicy::Block,
        }
    }

    pub fn with_policy(mut self, policy: OverflowPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = Some(max_bytes);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueueStats {
    pub queue_size: usize,
    pub max_queue_size: usize,
    pub queued_bytes: usize,
    pub max_bytes: Option<usize>,
    pub tokens_available: f64,
    pub capacity: f64,
    pub refill_rate: f64,
    pub total_queued: u64,
    pub total_dropped: u64,
    pub total_processed: u64,
    pub discarded_on_stop: u64,
    pub overflow_policy: OverflowPolicy,
    pub running: bool,
}

struct QueueState<T> {
    items: VecDeque<(T, usize)>,
    bytes: usize,
    running: bool,
    total_queued: u64,
    total_dropped: u64,
    total_processed: u64,
    discarded_on_stop: u64,
}

type Deliver<T> = Box<dyn Fn(T) + Send + Sync>;

struct Shared<T> {
    bucket: TokenBucket,
    config: QueueConfig,
    state: Mutex<QueueState<T>>,
    /// Signalled when an item is pushed or the limiter stops.
    not_empty: Condvar,
    /// Signalled when an item is popped or the limiter stops.
    not_full: Condvar,
    deliver: Deliver<T>,
}

impl<T> Shared<T> {
    fn fits(&self, state: &QueueState<T>, size: usize) -> bool {
        state.items.len() < self.config.max_queue_size
            && self
                .config
                .max_bytes
                .is_none_or(|max| state.bytes + size <= max)
    }
}

/// Queue-mode limiter: overflow is buffered and drained by a dedicated worker
/// thread at the refill rate, in FIFO order.
pub struct QueuedRateLimiter<T: QueueItem> {
    shared: Arc<Shared<T>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl<T: QueueItem> QueuedRateLimiter<T> {
    /// Validate the config and start the drain worker.
    pub fn spawn(
        config: QueueConfig,
        deliver: impl Fn(T) + Send + Sync + 'static,
    ) -> Result<Self, RateLimitError> {
        if config.max_queue_size == 0 {
            return Err(RateLimitError::InvalidQueueSize);
        }
        let bucket = TokenBucket::new(config.capacity, config.refill_rate)?;

        let shared = Arc::new(Shared {
            bucket,
            config,
            state: Mutex::new(QueueState {
                items: VecDeque::new(),
                bytes: 0,
                running: true,
                total_queued: 0,
                total_dropped: 0,
                total_processed: 0,
                discarded_on_stop: 0,
            }),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            deliver: Box::new(deliver),
        });

        let worker_shared = Arc::clone(&shared);
        let handle = thread::Builder::new()
            .name("logwright-ratelimit-drain".to_string())
            .spawn(move || drain(worker_shared))
            .map_err(|e| RateLimitError::WorkerSpawn(e.to_string()))?;

        Ok(Self {
            shared,
            worker: Mutex::new(Some(handle)),
        })
    }

    /// Non-blocking admission; equivalent to `admit_blocking(item, Duration::ZERO)`.
    pub fn admit(&self, item: T) -> bool {
        self.admit_blocking(item, Duration::ZERO)
    }

    /// Enqueue `item` for eventual delivery.
    ///
    /// Returns false if the limiter is stopped, the item can never fit the byte
    /// budget, or (under [`OverflowPolicy::Block`]) no space frees up before
    /// `timeout` elapses.
    pub fn admit_blocking(&self, item: T, timeout: Duration) -> bool {
        self.offer(item, timeout).is_ok()
    }

    /// Like [`admit_blocking`](Self::admit_blocking), but a rejected item is
    /// handed back.
    pub fn offer(&self, item: T, timeout: Duration) -> Result<(), T> {
        let shared = &*self.shared;
        let size = item.estimated_size();
        // None means the timeout is too large to represent: wait without a deadline.
        let deadline = Instant::now().checked_add(timeout);

        let mut state = lock(&shared.state);
        if !state.running {
            return Err(item);
        }

        if shared.config.max_bytes.is_some_and(|max| size > max) {
            state.total_dropped += 1;
            return Err(item);
        }

        loop {
            if shared.fits(&state, size) {
                state.items.push_back((item, size));
                state.bytes += size;
                state.total_queued += 1;
                shared.not_empty.notify_one();
                return Ok(());
            }

            match shared.config.policy {
                OverflowPolicy::DropNewest => {
                    state.total_dropped += 1;
                    return Err(item);
                }
                OverflowPolicy::DropOldest => {
                    if let Some((_, evicted)) = state.items.pop_front() {
                        state.bytes -= evicted;
                        state.total_dropped += 1;
                    }
                }
                OverflowPolicy::Block => {
                    state = match deadline {
                        Some(deadline) => {
                            let now = Instant::now();
                            if now >= deadline {
                                state.total_dropped += 1;
                                return Err(item);
                            }
                            shared
                                .not_full
                                .wait_timeout(state, deadline - now)
                                .unwrap_or_else(|e| e.into_inner())
                                .0
                        }
                        None => shared
                            .not_full
                            .wait(state)
                            .unwrap_or_else(|e| e.into_inner()),
                    };

                    if !state.running {
                        return Err(item);
                    }
                }
            }
        }
    }

    /// Stop the worker and discard anything still queued.
    ///
    /// Blocked producers wake up and return false. Safe to call more than once
    /// and from any thread.
    pub fn stop(&self) {
        {
            let mut state = lock(&self.shared.state);
            if state.running {
                state.running = false;
                state.discarded_on_stop += state.items.len() as u64;
                state.items.clear();
                state.bytes = 0;
            }
        }
        self.shared.not_empty.notify_all();
        self.shared.not_full.notify_all();

        let handle = lock(&self.worker).take();
        if let Some(handle) = handle {
            // The delivery callback may itself call stop().
            if handle.thread().id() != thread::current().id() {
                let _ = handle.join();
            }
        }
    }

    pub fn is_running(&self) -> bool {
        lock(&self.shared.state).running
    }

    pub fn stats(&self) -> QueueStats {
        let shared = &*self.shared;
        let state = lock(&shared.state);
        QueueStats {
            queue_size: state.items.len(),
            max_queue_size: shared.config.max_queue_size,
            queued_bytes: state.bytes,
            max_bytes: shared.config.max_bytes,
            tokens_available: shared.bucket.available(),
            capacity: shared.bucket.capacity(),
            refill_rate: shared.bucket.refill_rate(),
            total_queued: state.total_queued,
            total_dropped: state.total_dropped,
            total_processed: state.total_processed,
            discarded_on_stop: state.discarded_on_stop,
            overflow_policy: shared.config.policy,
            running: state.running,
        }
    }
}

impl<T: QueueItem> Drop for QueuedRateLimiter<T> {
    fn drop(&mut self) {
        self.stop();
    }
}

impl<T: QueueItem> std::fmt::Debug for QueuedRateLimiter<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueuedRateLimiter")
            .field("config", &self.shared.config)
            .finish_non_exhaustive()
    }
}

fn drain<T>(shared: Arc<Shared<T>>) {
    loop {
        let item = {
            let mut state = lock(&shared.state);

            while state.running && state.items.is_empty() {
                state = shared
                    .not_empty
                    .wait(state)
                    .unwrap_or_else(|e| e.into_inner());
            }
            if !state.running {
                return;
            }

            if !shared.bucket.try_acquire() {
                // Sleep until a token is due; stop() cuts the wait short.
                let wait = shared.bucket.time_until_available();
                let _ = shared
                    .not_empty
                    .wait_timeout(state, wait)
                    .unwrap_or_else(|e| e.into_inner());
                continue;
            }

            let Some((item, size)) = state.items.pop_front() else {
                continue;
            };
            state.bytes -= size;
            state.total_processed += 1;
            shared.not_full.notify_one();
            item
        };

        if let Err(payload) = catch_unwind(AssertUnwindSafe(|| (shared.deliver)(item))) {
            tracing::warn!(
                event = "ratelimit_delivery_panicked",
                message = %panic_message(payload.as_ref()),
            );
        }
    }
}
