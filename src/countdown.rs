use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Shared flag that stops a recurring timer on its next poll
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownStep {
    /// Not due yet
    Waiting,
    /// A tick elapsed; this many remain before `go`
    Tick(u32),
    /// The last tick elapsed
    Go,
    /// The timer was cancelled or its round went away
    Stopped,
}

/// Recurring countdown bound to one round.
///
/// `poll` must be given the id and countdown status of the round currently
/// live; any mismatch stops the timer for good.
#[derive(Debug)]
pub struct CountdownTimer {
    round_id: i64,
    ticks_left: u32,
    interval: Duration,
    next_due: Duration,
    token: CancelToken,
}

impl CountdownTimer {
    pub fn start(round_id: i64, ticks: u32, interval: Duration, now: Duration) -> Self {
        Self {
            round_id,
            ticks_left: ticks.max(1),
            interval,
            next_due: now + interval,
            token: CancelToken::new(),
        }
    }

    pub fn round_id(&self) -> i64 {
        self.round_id
    }

    pub fn ticks_left(&self) -> u32 {
        self.ticks_left
    }

    pub fn token(&self) -> CancelToken {
        self.token.clone()
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Advance by at most one tick.
    ///
    /// `live` is `(id, still_counting_down)` for the live round, or `None`
    /// when there is none.
    pub fn poll(&mut self, now: Duration, live: Option<(i64, bool)>) -> CountdownStep {
        if self.token.is_cancelled() {
            return CountdownStep::Stopped;
        }
        match live {
            Some((id, true)) if id == self.round_id => {}
            _ => {
                self.token.cancel();
                return CountdownStep::Stopped;
            }
        }
        if now < self.next_due {
            return CountdownStep::Waiting;
        }

        self.ticks_left = self.ticks_left.saturating_sub(1);
        self.next_due += self.interval;
        if self.ticks_left == 0 {
            // fires once; further polls report Stopped
            self.token.cancel();
            CountdownStep::Go
        } else {
            CountdownStep::Tick(self.ticks_left)
        }
    }
}
