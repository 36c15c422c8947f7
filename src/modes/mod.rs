//! Per-mode hit handlers.
//!
//! Every handler is a deterministic function of the live round, the
//! normalized hit and the clock reading; it mutates the round and appends
//! its events, and reports what happened so the session can finalize.

pub mod bullseye;
pub mod draw_dual;
pub mod intruder;
pub mod tic_tac_toe;

use crate::event_log::EventKind;
use crate::round::{Mode, Round, RoundState};

/// What a hit did to the round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitResult {
    /// Dropped without touching the round
    Ignored,
    /// Scored, round still running
    Recorded,
    /// Logged as `invalid_hit`, nothing else changed
    Invalid,
    /// Logged as `hit_after_finish` on an already decided round
    AfterFinish,
    /// This hit decided the round
    Finished,
}

impl Mode {
    /// Reflex modes keep logging hits that land after the outcome is decided
    pub fn records_late_hits(self) -> bool {
        matches!(self, Mode::DrawDual | Mode::Intruder)
    }
}

/// Dispatch a hit to the handler for the round's mode.
///
/// Only active rounds are scored; finished reflex rounds log the hit as
/// `hit_after_finish`. Everything else is ignored.
pub fn apply_hit(round: &mut Round, x: f64, y: f64, now: f64) -> HitResult {
    match round.state {
        RoundState::Active => {}
        RoundState::Finished if round.mode.records_late_hits() => {}
        _ => return HitResult::Ignored,
    }

    match round.mode {
        Mode::Bullseye => bullseye::on_hit(round, x, y, now),
        Mode::TicTacToe => tic_tac_toe::on_hit(round, x, y, now),
        Mode::DrawDual => draw_dual::on_hit(round, x, y, now),
        Mode::Intruder => intruder::on_hit(round, x, y, now),
    }
}

pub(crate) fn finish(round: &mut Round, kind: EventKind, now: f64) -> HitResult {
    round.advance(RoundState::Finished);
    round.add_event(kind, now);
    HitResult::Finished
}

/// Seconds since `go`, if the round ever went live
pub(crate) fn reaction_time(round: &Round, now: f64) -> Option<f64> {
    round.go_time.map(|go| (now - go).max(0.0))
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::round::{Mode, Round, RoundState};

    /// An active round whose `go` happened at `go_time`
    pub fn active_round(mode: Mode, shots_goal: u32, go_time: f64) -> Round {
        let mut round = Round::new(1, mode, shots_goal, 7, 0.0);
        round.advance(RoundState::Countdown);
        round.advance(RoundState::Active);
        round.go_time = Some(go_time);
        round
    }
}
