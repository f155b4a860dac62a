use super::RateLimitError;
use crate::sync::lock;
use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug)]
struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

/// Token bucket with a capped reservoir refilled continuously.
///
/// All token arithmetic happens under one mutex so concurrent callers never
/// lose or double-count a token.
#[derive(Debug)]
pub struct TokenBucket {
    capacity: f64,
    refill_rate: f64,
    state: Mutex<BucketState>,
}

impl TokenBucket {
    /// A full bucket holding `capacity` tokens, refilled at `refill_rate` per second.
    pub fn new(capacity: f64, refill_rate: f64) -> Result<Self, RateLimitError> {
        if capacity.is_nan() || capacity <= 0.0 {
            return Err(RateLimitError::InvalidCapacity(capacity));
        }
        if refill_rate.is_nan() || refill_rate <= 0.0 {
            return Err(RateLimitError::InvalidRefillRate(refill_rate));
        }

        Ok(Self {
            capacity,
            refill_rate,
            state: Mutex::new(BucketState {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
        })
    }

    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    pub fn refill_rate(&self) -> f64 {
        self.refill_rate
    }

    pub fn try_acquire(&self) -> bool {
        self.try_acquire_at(Instant::now())
    }

    /// Take one token as of `now`.
    ///
    /// An instant earlier than the last refill adds nothing.
    pub fn try_acquire_at(&self, now: Instant) -> bool {
        let mut state = lock(&self.state);
        self.refill(&mut state, now);

        if state.tokens >= 1.0 {
            state.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    pub fn available(&self) -> f64 {
        let mut state = lock(&self.state);
        self.refill(&mut state, Instant::now());
        state.tokens
    }

    /// How long until one whole token is available.
    pub fn time_until_available(&self) -> Duration {
        let mut state = lock(&self.state);
        self.refill(&mut state, Instant::now());

        if state.tokens >= 1.0 {
            Duration::ZERO
        } else {
            Duration::from_secs_f64((1.0 - state.tokens) / self.refill_rate)
        }
    }

    fn refill(&self, state: &mut BucketState, now: Instant) {
        let elapsed = now.saturating_duration_since(state.last_refill);
        if elapsed.is_zero() {
            return;
        }

        state.tokens = (state.tokens + elapsed.as_secs_f64() * self.refill_rate).min(self.capacity);
        state.last_refill = now;
    }
}
