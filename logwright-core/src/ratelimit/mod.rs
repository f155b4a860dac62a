//! Event throughput limiting.
//!
//! ```text
//!   admit(logger)                admit_blocking(item, timeout)
//!        │                                 │
//!        ▼                                 ▼
//!   ┌──────────────┐               ┌──────────────────┐
//!   │ per-logger   │               │ bounded FIFO     │
//!   │ bucket?      │               │ (overflow policy)│
//!   └──────┬───────┘               └────────┬─────────┘
//!          ▼                                ▼
//!   ┌──────────────┐               ┌──────────────────┐
//!   │ global bucket│               │ drain worker     │──► deliver(item)
//!   └──────────────┘               │ (token per item) │
//!                                  └──────────────────┘
//! ```
//!
//! Nothing here knows about log events beyond [`QueueItem`] sizing.

mod bucket;
mod limiter;
mod queue;

pub use bucket::TokenBucket;
pub use limiter::{RateLimiter, RateLimiterStats};
pub use queue::{OverflowPolicy, QueueConfig, QueueItem, QueueStats, QueuedRateLimiter};

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RateLimitError {
    #[error("capacity must be positive, got {0}")]
    InvalidCapacity(f64),

    #[error("refill rate must be positive, got {0}")]
    InvalidRefillRate(f64),

    #[error("max queue size must be positive")]
    InvalidQueueSize,

    #[error("failed to spawn drain worker: {0}")]
    WorkerSpawn(String),
}

#[cfg(test)]
mod tests;
