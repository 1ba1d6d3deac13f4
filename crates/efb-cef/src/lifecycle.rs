//! Browser creation, the close handshake and one-time engine bootstrap.

use crate::engine::BrowserEngine;
use crate::error::{BrowserError, Result};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionLifecycleState {
    #[default]
    Uninitialized,
    Creating,
    Live,
    Closing,
    Destroyed,
}

/// Monotonic time source, so shutdown can be tested without waiting.
pub trait Clock {
    /// Time elapsed since an arbitrary fixed point.
    fn now(&self) -> Duration;
    fn sleep(&self, duration: Duration);
}

/// [`Clock`] backed by [`Instant`].
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Bounds of the close spin-wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShutdownTiming {
    /// Give up waiting for the close confirmation after this long.
    pub ceiling: Duration,
    /// Keep pumping this long after confirmation so teardown tasks finish.
    pub grace: Duration,
    /// Pause between pump iterations.
    pub poll_interval: Duration,
}

impl ShutdownTiming {
    /// Spin `pump_once` until it reports the close confirmed and the grace
    /// period has passed, or the ceiling is reached.
    pub fn wait_for_close(
        &self,
        clock: &dyn Clock,
        mut pump_once: impl FnMut() -> bool,
    ) -> ShutdownOutcome {
        let deadline = clock.now() + self.ceiling;
        let mut closed_at: Option<Duration> = None;

        loop {
            let closed = pump_once();
            let now = clock.now();

            match closed_at {
                None if closed => {
                    log::debug!("browser close confirmed, waiting {:?}", self.grace);
                    closed_at = Some(now);
                }
                Some(at) if now.saturating_sub(at) >= self.grace => {
                    return ShutdownOutcome::Closed;
                }
                _ => {}
            }

            if closed_at.is_none() && now >= deadline {
                log::warn!(
                    "browser did not confirm close within {:?}, tearing down anyway",
                    self.ceiling
                );
                return ShutdownOutcome::TimedOut;
            }

            clock.sleep(self.poll_interval);
        }
    }
}

impl Default for ShutdownTiming {
    fn default() -> Self {
        Self {
            ceiling: Duration::from_secs(99),
            grace: Duration::from_millis(500),
            poll_interval: Duration::from_millis(10),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownOutcome {
    /// The engine confirmed the close.
    Closed,
    /// No confirmation within the ceiling; torn down anyway.
    TimedOut,
    /// There was no browser to close.
    NotLive,
}

/// Everything the engine needs to create a windowless browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateRequest {
    pub url: String,
    pub width: u32,
    pub height: u32,
    pub frame_rate: u32,
    pub cache_dir: PathBuf,
    /// `Accept-Language` list, if the locale is known.
    pub accept_language: Option<String>,
    pub windowless: bool,
    /// Page background before the first paint, ARGB.
    pub background_color: u32,
}

/// Drives [`SessionLifecycleState`].
#[derive(Debug, Clone, Default)]
pub struct LifecycleController {
    state: SessionLifecycleState,
    before_create: SessionLifecycleState,
    close_confirmed: bool,
    timing: ShutdownTiming,
}

impl LifecycleController {
    pub fn new(timing: ShutdownTiming) -> Self {
        Self {
            timing,
            ..Self::default()
        }
    }

    pub fn state(&self) -> SessionLifecycleState {
        self.state
    }

    pub fn timing(&self) -> ShutdownTiming {
        self.timing
    }

    pub fn is_live(&self) -> bool {
        self.state == SessionLifecycleState::Live
    }

    /// Whether the engine should be pumped for this session.
    pub fn is_active(&self) -> bool {
        matches!(
            self.state,
            SessionLifecycleState::Creating | SessionLifecycleState::Live
        )
    }

    /// Enter `Creating`, unless a browser already exists or is on its way.
    pub fn begin_create(&mut self) -> Result<()> {
        if self.is_active() {
            return Err(BrowserError::AlreadyCreated);
        }
        self.before_create = self.state;
        self.state = SessionLifecycleState::Creating;
        self.close_confirmed = false;
        Ok(())
    }

    /// The engine refused; go back to where we were.
    pub fn creation_failed(&mut self) {
        if self.state == SessionLifecycleState::Creating {
            self.state = self.before_create;
        }
    }

    pub fn on_after_created(&mut self) {
        if self.state == SessionLifecycleState::Creating {
            self.state = SessionLifecycleState::Live;
        } else {
            log::warn!("browser created while {:?}", self.state);
        }
    }

    /// Enter `Closing`. Returns false if there is nothing to close.
    pub fn begin_close(&mut self) -> bool {
        if !self.is_active() {
            return false;
        }
        self.state = SessionLifecycleState::Closing;
        true
    }

    /// The engine confirmed the browser is gone.
    pub fn on_closed(&mut self) {
        self.close_confirmed = true;
        if self.state != SessionLifecycleState::Closing {
            // Closed by the engine on its own.
            self.state = SessionLifecycleState::Destroyed;
        }
    }

    pub fn close_confirmed(&self) -> bool {
        self.close_confirmed
    }

    pub fn finish(&mut self) {
        self.state = SessionLifecycleState::Destroyed;
    }
}

/// Create the persistent cache directory if needed.
pub fn prepare_cache_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
        log::info!("created browser cache at {}", path.display());
    }
    Ok(())
}

/// Bootstrap the engine unless the host already runs one.
///
/// Engines report `is_running` once bootstrapped, so this never repeats,
/// and nothing in this crate ever shuts an engine down.
pub fn ensure_engine_running<E: BrowserEngine + ?Sized>(engine: &mut E, cache_dir: &Path) -> Result<()> {
    if engine.is_running() {
        return Ok(());
    }
    log::info!("no running engine found, bootstrapping one");
    engine.bootstrap(cache_dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct FakeClock {
        now: Cell<Duration>,
    }

    impl FakeClock {
        fn new() -> Self {
            Self {
                now: Cell::new(Duration::ZERO),
            }
        }
    }

    impl Clock for FakeClock {
        fn now(&self) -> Duration {
            self.now.get()
        }

        fn sleep(&self, duration: Duration) {
            self.now.set(self.now.get() + duration);
        }
    }

    #[test]
    fn create_fails_fast_while_live_or_creating() {
        let mut lifecycle = LifecycleController::default();
        lifecycle.begin_create().unwrap();
        assert!(matches!(lifecycle.begin_create(), Err(BrowserError::AlreadyCreated)));

        lifecycle.on_after_created();
        assert_eq!(lifecycle.state(), SessionLifecycleState::Live);
        assert!(matches!(lifecycle.begin_create(), Err(BrowserError::AlreadyCreated)));
    }

    #[test]
    fn failed_creation_restores_previous_state() {
        let mut lifecycle = LifecycleController::default();
        lifecycle.begin_create().unwrap();
        lifecycle.creation_failed();
        assert_eq!(lifecycle.state(), SessionLifecycleState::Uninitialized);

        lifecycle.finish();
        lifecycle.begin_create().unwrap();
        lifecycle.creation_failed();
        assert_eq!(lifecycle.state(), SessionLifecycleState::Destroyed);
    }

    #[test]
    fn close_waits_for_grace_after_confirmation() {
        let timing = ShutdownTiming::default();
        let clock = FakeClock::new();
        let mut pumps = 0;

        let outcome = timing.wait_for_close(&clock, || {
            pumps += 1;
            pumps >= 3
        });

        assert_eq!(outcome, ShutdownOutcome::Closed);
        // Confirmed after two polls, then pumped through the grace period.
        assert!(clock.now() >= timing.poll_interval * 2 + timing.grace);
        assert!(clock.now() < timing.ceiling);
    }

    #[test]
    fn close_gives_up_at_ceiling() {
        let timing = ShutdownTiming {
            ceiling: Duration::from_secs(2),
            grace: Duration::from_millis(500),
            poll_interval: Duration::from_millis(10),
        };
        let clock = FakeClock::new();

        let outcome = timing.wait_for_close(&clock, || false);

        assert_eq!(outcome, ShutdownOutcome::TimedOut);
        assert!(clock.now() >= timing.ceiling);
        assert!(clock.now() <= timing.ceiling + timing.poll_interval);
    }

    #[test]
    fn cache_dir_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let cache = dir.path().join("cache").join("nested");
        prepare_cache_dir(&cache).unwrap();
        assert!(cache.is_dir());
        prepare_cache_dir(&cache).unwrap();
    }
}
