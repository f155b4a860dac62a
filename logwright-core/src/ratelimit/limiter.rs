use super::{RateLimitError, TokenBucket};
use crate::config::RateLimitConfig;
use crate::sync::lock;
use dashmap::DashMap;
use serde::Serialize;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::SystemTime;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateLimiterStats {
    pub total_allowed: u64,
    pub total_denied: u64,
    pub last_denied_time: Option<SystemTime>,
    pub global_tokens_available: Option<f64>,
    pub per_logger_buckets: usize,
    pub stopped: bool,
}

/// Drop-mode limiter: admission either succeeds immediately or the event is discarded.
#[derive(Debug)]
pub struct RateLimiter {
    global: Option<TokenBucket>,

    /// Exact logger-name overrides. Checked before the global bucket, which
    /// must also admit.
    per_logger: DashMap<String, TokenBucket>,

    stopped: AtomicBool,
    allowed: AtomicU64,
    denied: AtomicU64,
    last_denied: Mutex<Option<SystemTime>>,
}

impl RateLimiter {
    pub fn new(global: Option<TokenBucket>) -> Self {
        Self {
            global,
            per_logger: DashMap::new(),
            stopped: AtomicBool::new(false),
            allowed: AtomicU64::new(0),
            denied: AtomicU64::new(0),
            last_denied: Mutex::new(None),
        }
    }

    /// Global rate and burst shorthand.
    pub fn with_global(rate: f64, capacity: f64) -> Result<Self, RateLimitError> {
        Ok(Self::new(Some(TokenBucket::new(capacity, rate)?)))
    }

    /// Build from config. `include_global` is false when the global rate is
    /// enforced by a queue instead.
    pub fn from_config(cfg: &RateLimitConfig, include_global: bool) -> Result<Self, RateLimitError> {
        let global = match (include_global, cfg.global_rate) {
            (true, Some(rate)) => Some(TokenBucket::new(cfg.global_capacity.unwrap_or(rate), rate)?),
            _ => None,
        };

        let limiter = Self::new(global);
        for (name, limit) in &cfg.per_logger {
            limiter.set_logger_limit(name, limit.rate, limit.capacity)?;
        }
        Ok(limiter)
    }

    /// Install or replace the override bucket for one logger name.
    pub fn set_logger_limit(&self, logger_name: &str, rate: f64, capacity: f64) -> Result<(), RateLimitError> {
        let bucket = TokenBucket::new(capacity, rate)?;
        self.per_logger.insert(logger_name.to_string(), bucket);
        Ok(())
    }

    pub fn admit(&self, logger_name: &str) -> bool {
        if self.stopped.load(Ordering::Acquire) {
            return false;
        }

        // An override narrows a logger's budget; the global bucket still caps
        // the total.
        let logger_ok = self
            .per_logger
            .get(logger_name)
            .is_none_or(|bucket| bucket.try_acquire());
        let admitted = logger_ok && self.global.as_ref().is_none_or(TokenBucket::try_acquire);

        if admitted {
            self.allowed.fetch_add(1, Ordering::Relaxed);
        } else {
            self.denied.fetch_add(1, Ordering::Relaxed);
            *lock(&self.last_denied) = Some(SystemTime::now());
        }

        admitted
    }

    /// Every later `admit` returns false.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    pub fn stats(&self) -> RateLimiterStats {
        RateLimiterStats {
            total_allowed: self.allowed.load(Ordering::Relaxed),
            total_denied: self.denied.load(Ordering::Relaxed),
            last_denied_time: *lock(&self.last_denied),
            global_tokens_available: self.global.as_ref().map(TokenBucket::available),
            per_logger_buckets: self.per_logger.len(),
            stopped: self.is_stopped(),
        }
    }
}
