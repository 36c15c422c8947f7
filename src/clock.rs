use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Time source for rounds, countdowns and replays
pub trait Clock {
    /// Monotonic reading measured from an arbitrary origin
    fn now(&self) -> Duration;

    /// Wall-clock milliseconds since the unix epoch
    fn epoch_millis(&self) -> i64;

    fn now_secs(&self) -> f64 {
        self.now().as_secs_f64()
    }
}

/// Production clock backed by `Instant` and the system wall clock
#[derive(Clone, Copy, Debug)]
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

    fn epoch_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Hand-driven clock for tests and headless drivers.
///
/// Clones share the same reading, so a test can keep one handle and give
/// another to a `Session`.
#[derive(Clone, Debug)]
pub struct ManualClock {
    nanos: Arc<AtomicU64>,
    epoch_base: i64,
}

impl ManualClock {
    pub const DEFAULT_EPOCH_BASE: i64 = 1_700_000_000_000;

    pub fn new() -> Self {
        Self::with_epoch_base(Self::DEFAULT_EPOCH_BASE)
    }

    pub fn with_epoch_base(epoch_base: i64) -> Self {
        Self {
            nanos: Arc::new(AtomicU64::new(0)),
            epoch_base,
        }
    }

    pub fn advance(&self, by: Duration) {
        self.nanos.fetch_add(by.as_nanos() as u64, Ordering::SeqCst);
    }

    pub fn advance_secs(&self, secs: f64) {
        self.advance(Duration::from_secs_f64(secs));
    }

    pub fn set(&self, at: Duration) {
        self.nanos.store(at.as_nanos() as u64, Ordering::SeqCst);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_nanos(self.nanos.load(Ordering::SeqCst))
    }

    fn epoch_millis(&self) -> i64 {
        self.epoch_base + self.now().as_millis() as i64
    }
}
