use super::ready::{Published, ReadySetup, SetupDeps};
use crate::config::{ConfigError, TelemetryConfig};
use crate::sync::{lock, panic_message};
use arc_swap::ArcSwapOption;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SetupState {
    Uninitialized = 0,
    Initializing = 1,
    Ready = 2,
    Error = 3,
}

impl SetupState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => SetupState::Initializing,
            2 => SetupState::Ready,
            3 => SetupState::Error,
            _ => SetupState::Uninitialized,
        }
    }
}

/// Builds the logging setup at most once between resets.
///
/// Readers take the fast path: one atomic flag check plus one pointer load.
/// The first caller to find the flag clear takes the setup lock and builds;
/// concurrent callers wait on the same lock and then see the published
/// result. Failures publish an emergency payload instead, so the read path
/// never errors.
pub struct SetupCoordinator {
    deps: SetupDeps,

    /// Set once a payload (ready or emergency) is published.
    done: AtomicBool,
    state: AtomicU8,
    setup_lock: Mutex<()>,
    published: ArcSwapOption<Published>,

    last_error: ArcSwapOption<ConfigError>,
    constructions: AtomicUsize,
}

impl SetupCoordinator {
    pub fn new(deps: SetupDeps) -> Self {
        Self {
            deps,
            done: AtomicBool::new(false),
            state: AtomicU8::new(SetupState::Uninitialized as u8),
            setup_lock: Mutex::new(()),
            published: ArcSwapOption::empty(),
            last_error: ArcSwapOption::empty(),
            constructions: AtomicUsize::new(0),
        }
    }

    pub fn deps(&self) -> &SetupDeps {
        &self.deps
    }

    /// Return the published payload, building it first if needed.
    ///
    /// `explicit` is only consulted by the call that actually builds; once a
    /// payload is published this is a no-op until [`reset`](Self::reset).
    pub fn ensure_ready(&self, explicit: Option<&TelemetryConfig>) -> Arc<Published> {
        if self.done.load(Ordering::Acquire)
            && let Some(published) = self.published.load_full()
        {
            return published;
        }

        let _guard = lock(&self.setup_lock);
        if self.done.load(Ordering::Acquire)
            && let Some(published) = self.published.load_full()
        {
            return published;
        }
        self.publish_locked(explicit)
    }

    /// Discard the current payload and build a new one from `config`
    /// without letting another thread build in between.
    pub fn reinitialize(&self, config: &TelemetryConfig) -> Arc<Published> {
        let _guard = lock(&self.setup_lock);
        self.clear_locked("reinitialize");
        self.publish_locked(Some(config))
    }

    /// Drop the current payload and return to `Uninitialized`.
    ///
    /// The old queue worker is stopped. Emissions already holding the old
    /// payload finish against it (queued ones inline); the next emission
    /// builds a new one.
    pub fn reset(&self) {
        let _guard = lock(&self.setup_lock);
        self.clear_locked("reset");
    }

    /// The published payload, without triggering setup.
    pub fn current(&self) -> Option<Arc<Published>> {
        self.published.load_full()
    }

    pub fn state(&self) -> SetupState {
        SetupState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn last_error(&self) -> Option<Arc<ConfigError>> {
        self.last_error.load_full()
    }

    /// How many times a setup has been built (successfully or not).
    pub fn construction_count(&self) -> usize {
        self.constructions.load(Ordering::Acquire)
    }

    /// Check a config eagerly, without publishing anything.
    pub fn validate(config: &TelemetryConfig) -> Result<(), ConfigError> {
        config.validate()
    }

    fn publish_locked(&self, explicit: Option<&TelemetryConfig>) -> Arc<Published> {
        self.transition(SetupState::Initializing, "setup_started");
        self.constructions.fetch_add(1, Ordering::AcqRel);

        let outcome = catch_unwind(AssertUnwindSafe(|| {
            let config = match explicit {
                Some(cfg) => cfg.clone(),
                None => self.deps.defaults.load()?,
            };
            ReadySetup::build(config, &self.deps)
        }))
        .unwrap_or_else(|payload| {
            Err(ConfigError::SetupPanicked {
                message: panic_message(payload.as_ref()),
            })
        });

        let published = match outcome {
            Ok(ready) => {
                self.last_error.store(None);
                self.transition(SetupState::Ready, "setup_complete");
                Published::Ready(ready)
            }
            Err(err) => {
                let err = Arc::new(err);
                tracing::error!(event = "setup_failed", error = %err);
                self.deps
                    .emergency
                    .report(&format!("logging setup failed, using emergency output: {err}"));
                self.last_error.store(Some(Arc::clone(&err)));
                self.transition(SetupState::Error, "setup_failed");
                Published::Emergency(err)
            }
        };

        let published = Arc::new(published);
        self.published.store(Some(Arc::clone(&published)));
        self.done.store(true, Ordering::Release);
        published
    }

    fn clear_locked(&self, reason: &'static str) {
        self.done.store(false, Ordering::Release);
        let old = self.published.swap(None);
        self.last_error.store(None);
        self.transition(SetupState::Uninitialized, reason);

        if let Some(old) = old
            && let Published::Ready(ready) = &*old
        {
            ready.shutdown();
        }
    }

    fn transition(&self, to: SetupState, reason: &'static str) {
        let from = SetupState::from_u8(self.state.swap(to as u8, Ordering::AcqRel));
        if from != to {
            tracing::info!(event = "setup_transition", from = ?from, to = ?to, reason = reason);
        }
    }
}

impl Drop for SetupCoordinator {
    fn drop(&mut self) {
        if let Some(old) = self.published.swap(None)
            && let Published::Ready(ready) = &*old
        {
            ready.shutdown();
        }
    }
}

impl std::fmt::Debug for SetupCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SetupCoordinator")
            .field("state", &self.state())
            .field("constructions", &self.construction_count())
            .finish_non_exhaustive()
    }
}
