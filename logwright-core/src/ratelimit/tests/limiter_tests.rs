use crate::config::{LoggerRateLimit, RateLimitConfig};
use crate::ratelimit::{RateLimitError, RateLimiter, TokenBucket};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

#[test]
fn burst_then_reject_then_one_after_refill_interval() {
    // Arrange: refill_rate=10, burst=5
    let bucket = TokenBucket::new(5.0, 10.0).unwrap();
    let t0 = Instant::now();

    // Act
    let results: Vec<bool> = (0..6).map(|_| bucket.try_acquire_at(t0)).collect();

    // Assert
    assert_eq!(results, vec![true, true, true, true, true, false]);

    // 1/R seconds later exactly one more token is available.
    let later = t0 + Duration::from_millis(100);
    assert!(bucket.try_acquire_at(later));
    assert!(!bucket.try_acquire_at(later));
}

#[test]
fn limiter_admit_matches_bucket_semantics() {
    let limiter = RateLimiter::with_global(10.0, 5.0).unwrap();

    let results: Vec<bool> = (0..6).map(|_| limiter.admit("app")).collect();
    assert_eq!(results, vec![true, true, true, true, true, false]);

    let stats = limiter.stats();
    assert_eq!(stats.total_allowed, 5);
    assert_eq!(stats.total_denied, 1);
    assert!(stats.last_denied_time.is_some());
}

#[test]
fn refill_after_sleep_admits_again() {
    let limiter = RateLimiter::with_global(10.0, 1.0).unwrap();
    assert!(limiter.admit("app"));
    assert!(!limiter.admit("app"));

    thread::sleep(Duration::from_millis(120));

    assert!(limiter.admit("app"));
}

#[test]
fn per_logger_override_is_consulted_before_global() {
    let limiter = RateLimiter::with_global(1000.0, 1000.0).unwrap();
    limiter.set_logger_limit("noisy.worker", 0.1, 1.0).unwrap();

    assert!(limiter.admit("noisy.worker"));
    assert!(!limiter.admit("noisy.worker"));

    // Other loggers still use the generous global bucket.
    assert!(limiter.admit("quiet"));
    assert!(limiter.admit("noisy"));
}

#[test]
fn per_logger_admission_still_spends_global_tokens() {
    // Arrange
    let limiter = RateLimiter::with_global(0.001, 1.0).unwrap();
    limiter.set_logger_limit("hot", 1000.0, 1000.0).unwrap();

    // Act
    let results: Vec<bool> = (0..5).map(|_| limiter.admit("hot")).collect();

    // Assert
    assert_eq!(results, vec![true, false, false, false, false]);
    assert!(!limiter.admit("other"));
}

#[test]
fn per_logger_rejection_leaves_global_tokens() {
    let limiter = RateLimiter::with_global(0.001, 2.0).unwrap();
    limiter.set_logger_limit("noisy", 0.001, 1.0).unwrap();

    assert!(limiter.admit("noisy"));
    assert!(!limiter.admit("noisy"));

    // The rejected call did not spend the second global token.
    assert!(limiter.admit("quiet"));
    assert!(!limiter.admit("quiet"));
}

#[test]
fn no_global_bucket_admits_unlisted_loggers() {
    let cfg = RateLimitConfig {
        enabled: true,
        per_logger: [(
            "db".to_string(),
            LoggerRateLimit {
                rate: 0.1,
                capacity: 1.0,
            },
        )]
        .into_iter()
        .collect(),
        ..RateLimitConfig::default()
    };
    let limiter = RateLimiter::from_config(&cfg, true).unwrap();

    assert!(limiter.admit("db"));
    assert!(!limiter.admit("db"));
    for _ in 0..100 {
        assert!(limiter.admit("web"));
    }
}

#[test]
fn invalid_override_is_rejected() {
    let limiter = RateLimiter::new(None);
    assert_eq!(
        limiter.set_logger_limit("x", 0.0, 1.0),
        Err(RateLimitError::InvalidRefillRate(0.0))
    );
}

#[test]
fn admit_after_stop_is_always_false() {
    let limiter = RateLimiter::new(None);
    assert!(limiter.admit("anything"));

    limiter.stop();

    assert!(limiter.is_stopped());
    assert!(!limiter.admit("anything"));
}

#[test]
fn concurrent_admissions_never_exceed_capacity() {
    // Refill is negligible over the test window.
    let limiter = Arc::new(RateLimiter::with_global(0.001, 100.0).unwrap());
    let admitted = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let limiter = Arc::clone(&limiter);
            let admitted = Arc::clone(&admitted);
            thread::spawn(move || {
                for _ in 0..50 {
                    if limiter.admit("shared") {
                        admitted.fetch_add(1, Ordering::Relaxed);
                    }
                }
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }

    let stats = limiter.stats();
    assert_eq!(admitted.load(Ordering::Relaxed), 100);
    assert_eq!(stats.total_allowed, 100);
    assert_eq!(stats.total_denied, 300);
}
