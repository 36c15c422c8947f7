use std::time::Duration;

use crate::clock::Clock;
use crate::countdown::{CancelToken, CountdownStep, CountdownTimer};
use crate::event_log::EventKind;
use crate::history::{Namespace, RoundHistory, RoundRecord};
use crate::modes::{self, HitResult};
use crate::replay::Replay;
use crate::round::{Mode, Player, Round, RoundState, StartZone, Winner};
use crate::store::{KeyValueStore, MemoryStore};

#[derive(Debug, Clone, PartialEq)]
pub struct SessionSettings {
    pub countdown_ticks: u32,
    pub countdown_interval: Duration,
    pub start_zone: StartZone,
    pub replay_speed: f64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            countdown_ticks: 3,
            countdown_interval: Duration::from_millis(700),
            start_zone: StartZone::default(),
            replay_speed: 1.0,
        }
    }
}

/// How `record_hit` handled a hit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitResponse {
    NoRound,
    Ignored,
    CountdownStarted,
    Recorded,
    Invalid,
    AfterFinish,
    Finished,
}

impl From<HitResult> for HitResponse {
    fn from(result: HitResult) -> Self {
        match result {
            HitResult::Ignored => HitResponse::Ignored,
            HitResult::Recorded => HitResponse::Recorded,
            HitResult::Invalid => HitResponse::Invalid,
            HitResult::AfterFinish => HitResponse::AfterFinish,
            HitResult::Finished => HitResponse::Finished,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// No countdown pending
    Idle,
    Waiting,
    /// Ticks still to go before `go`
    Tick(u32),
    Go,
    /// The pending countdown noticed it no longer applies and stopped
    Cancelled,
}

/// Read-only view of the live round for rendering
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoundSnapshot {
    pub id: i64,
    pub mode: Mode,
    pub state: RoundState,
    pub yards: u32,
    pub shots: u32,
    pub shots_goal: u32,
    pub winner: Option<Winner>,
    pub current_player: Player,
    pub countdown_remaining: Option<u32>,
}

/// Owns the single live round and everything that happens to it
pub struct Session<C: Clock> {
    clock: C,
    settings: SessionSettings,
    current: Option<Round>,
    countdown: Option<CountdownTimer>,
    history: RoundHistory,
    store: Box<dyn KeyValueStore>,
    namespace: Namespace,
    last_id: i64,
}

impl<C: Clock> Session<C> {
    /// Create a session and load its history from `store`
    pub fn new(
        clock: C,
        store: Box<dyn KeyValueStore>,
        namespace: Namespace,
        settings: SessionSettings,
    ) -> Self {
        let history = RoundHistory::load(store.as_ref(), namespace.key());
        let last_id = history.records().iter().map(|r| r.id).max().unwrap_or(0);
        log::debug!("loaded {} rounds from {}", history.len(), namespace.key());

        Self {
            clock,
            settings,
            current: None,
            countdown: None,
            history,
            store,
            namespace,
            last_id,
        }
    }

    /// Session with default settings and a throwaway in-memory store
    pub fn ephemeral(clock: C) -> Self {
        Self::new(
            clock,
            Box::new(MemoryStore::new()),
            Namespace::Pointer,
            SessionSettings::default(),
        )
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// Replace the live round with a fresh armed one.
    ///
    /// Any pending countdown is cancelled; an unfinished previous round is
    /// dropped without being recorded.
    pub fn start_round(&mut self, mode: Mode, shots_goal: u32, yards: u32) -> &Round {
        if let Some(timer) = self.countdown.take() {
            timer.cancel();
        }
        if let Some(previous) = &self.current {
            if !previous.is_finished() {
                log::debug!("discarding unfinished round {}", previous.id);
            }
        }

        let id = self.clock.epoch_millis().max(self.last_id.saturating_add(1));
        self.last_id = id;

        let round = Round::new(id, mode, shots_goal, yards, self.clock.now_secs());
        log::debug!(
            "round {} armed: mode={} shots_goal={} yards={}",
            round.id,
            round.mode,
            round.shots_goal,
            round.yards
        );
        self.current.insert(round)
    }

    /// Feed one normalized hit into the live round
    pub fn record_hit(&mut self, x: f64, y: f64) -> HitResponse {
        let now = self.clock.now_secs();
        let Some(round) = self.current.as_mut() else {
            return HitResponse::NoRound;
        };

        if round.state == RoundState::Armed {
            if self.settings.start_zone.contains(x, y) {
                self.begin_countdown();
                return HitResponse::CountdownStarted;
            }
            return HitResponse::Ignored;
        }

        let result = modes::apply_hit(round, x, y, now);
        if result == HitResult::Finished {
            self.finalize();
        }
        result.into()
    }

    /// Manually end the live round. Returns false when there was nothing to stop.
    pub fn stop(&mut self) -> bool {
        let now = self.clock.now_secs();
        let Some(round) = self.current.as_mut() else {
            return false;
        };
        if round.is_finished() {
            return false;
        }

        if let Some(timer) = self.countdown.take() {
            timer.cancel();
        }
        round.advance(RoundState::Finished);
        round.add_event(EventKind::manual_finish(), now);
        log::debug!("round {} stopped manually", round.id);

        self.finalize();
        true
    }

    /// Drive the countdown; call on every runtime tick
    pub fn on_tick(&mut self) -> TickOutcome {
        let live = self
            .current
            .as_ref()
            .map(|r| (r.id, r.state == RoundState::Countdown));
        let now = self.clock.now();

        let Some(timer) = self.countdown.as_mut() else {
            return TickOutcome::Idle;
        };

        match timer.poll(now, live) {
            CountdownStep::Waiting => TickOutcome::Waiting,
            CountdownStep::Tick(remaining) => TickOutcome::Tick(remaining),
            CountdownStep::Go => {
                self.countdown = None;
                if let Some(round) = self.current.as_mut() {
                    let now = now.as_secs_f64();
                    round.advance(RoundState::Active);
                    round.go_time = Some(now);
                    round.add_event(EventKind::Go, now);
                    log::debug!("round {} active", round.id);
                }
                TickOutcome::Go
            }
            CountdownStep::Stopped => {
                self.countdown = None;
                TickOutcome::Cancelled
            }
        }
    }

    pub fn current(&self) -> Option<&Round> {
        self.current.as_ref()
    }

    pub fn snapshot(&self) -> Option<RoundSnapshot> {
        self.current.as_ref().map(|round| RoundSnapshot {
            id: round.id,
            mode: round.mode,
            state: round.state,
            yards: round.yards,
            shots: round.shots,
            shots_goal: round.shots_goal,
            winner: round.winner,
            current_player: round.current_player,
            countdown_remaining: self
                .countdown
                .as_ref()
                .filter(|t| t.round_id() == round.id && !t.is_stopped())
                .map(CountdownTimer::ticks_left),
        })
    }

    pub fn current_hits(&self) -> Vec<(f64, f64)> {
        self.current
            .as_ref()
            .map(Round::hit_points)
            .unwrap_or_default()
    }

    /// Cancel token of the pending countdown, if one is running
    pub fn countdown_token(&self) -> Option<CancelToken> {
        self.countdown.as_ref().map(CountdownTimer::token)
    }

    pub fn history(&self) -> &RoundHistory {
        &self.history
    }

    pub fn replay(&self, id: i64) -> Option<Replay> {
        self.history
            .get(id)
            .and_then(Replay::from_record)
            .map(|r| r.with_speed(self.settings.replay_speed))
    }

    pub fn replay_last(&self) -> Option<Replay> {
        self.history
            .last()
            .and_then(Replay::from_record)
            .map(|r| r.with_speed(self.settings.replay_speed))
    }

    fn begin_countdown(&mut self) {
        let now = self.clock.now();
        let Some(round) = self.current.as_mut() else {
            return;
        };
        if !round.advance(RoundState::Countdown) {
            return;
        }

        round.add_event(EventKind::CountdownStart, now.as_secs_f64());
        self.countdown = Some(CountdownTimer::start(
            round.id,
            self.settings.countdown_ticks,
            self.settings.countdown_interval,
            now,
        ));
        log::debug!("round {} counting down", round.id);
    }

    fn finalize(&mut self) {
        let Some(round) = self.current.as_ref() else {
            return;
        };

        let record = RoundRecord::from_round(round, self.clock.epoch_millis());
        log::info!(
            "round {} finished: mode={} shots={}/{} winner={}",
            record.id,
            record.mode,
            record.shots,
            record.shots_goal,
            record
                .winner
                .map(|w| w.to_string())
                .unwrap_or_else(|| "-".to_string())
        );

        self.history.push(record);
        if let Err(e) = self.history.save(self.store.as_ref(), self.namespace.key()) {
            log::warn!("could not save round history: {e:#}");
        }
    }
}
