//! Animated playback of a finished round's hits.
//!
//! A replay drives a virtual clock from the first hit's timestamp and reveals
//! every hit whose timestamp the clock has reached, holding the final state
//! for [`TRAILING_HOLD`] seconds after the last hit.

use std::time::Duration;

use crate::countdown::CancelToken;
use crate::event_log::{Event, HitRef};
use crate::history::RoundRecord;

/// Seconds the last hit stays on screen before playback ends
pub const TRAILING_HOLD: f64 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReplayHit {
    pub timestamp: f64,
    pub x: f64,
    pub y: f64,
}

/// Snapshot of playback at one instant; `visible` hits are a prefix of
/// [`Replay::hits`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReplayFrame {
    pub virtual_time: f64,
    pub visible: usize,
    pub done: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Replay {
    hits: Vec<ReplayHit>,
    speed: f64,
}

impl Replay {
    /// Build from an event log. `None` means the round has no hits to show.
    pub fn from_events(events: &[Event]) -> Option<Self> {
        let mut hits: Vec<ReplayHit> = events
            .iter()
            .filter_map(HitRef::from_event)
            .map(|h| ReplayHit {
                timestamp: h.timestamp,
                x: h.x,
                y: h.y,
            })
            .collect();

        if hits.is_empty() {
            return None;
        }
        // logs are ordered already; loaded data may not be
        hits.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));

        Some(Self { hits, speed: 1.0 })
    }

    pub fn from_record(record: &RoundRecord) -> Option<Self> {
        Self::from_events(&record.events)
    }

    /// Playback rate; non-positive or non-finite rates fall back to 1.0
    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = if speed.is_finite() && speed > 0.0 {
            speed
        } else {
            1.0
        };
        self
    }

    pub fn hits(&self) -> &[ReplayHit] {
        &self.hits
    }

    pub fn visible(&self, frame: &ReplayFrame) -> &[ReplayHit] {
        &self.hits[..frame.visible.min(self.hits.len())]
    }

    pub fn first_ts(&self) -> f64 {
        self.hits[0].timestamp
    }

    pub fn last_ts(&self) -> f64 {
        self.hits[self.hits.len() - 1].timestamp
    }

    /// Virtual time at which playback ends
    pub fn end_ts(&self) -> f64 {
        self.last_ts() + TRAILING_HOLD
    }

    /// Real time needed to play the whole replay
    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(((self.end_ts() - self.first_ts()) / self.speed).max(0.0))
    }

    pub fn frame_at(&self, elapsed: Duration) -> ReplayFrame {
        let virtual_time = self.first_ts() + elapsed.as_secs_f64() * self.speed;
        let visible = self.hits.partition_point(|h| h.timestamp <= virtual_time);
        ReplayFrame {
            virtual_time,
            visible,
            done: virtual_time >= self.end_ts(),
        }
    }

    /// Frames every `step` of real time, ending with the first `done` frame
    pub fn frames(&self, step: Duration) -> Frames<'_> {
        Frames {
            replay: self,
            step: step.max(Duration::from_millis(1)),
            index: 0,
            finished: false,
        }
    }
}

/// Lazy, finite frame sequence produced by [`Replay::frames`]
#[derive(Debug, Clone)]
pub struct Frames<'a> {
    replay: &'a Replay,
    step: Duration,
    index: u32,
    finished: bool,
}

impl Iterator for Frames<'_> {
    type Item = ReplayFrame;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let frame = self.replay.frame_at(self.step * self.index);
        self.index = self.index.saturating_add(1);
        if frame.done || self.index == u32::MAX {
            self.finished = true;
        }
        Some(frame)
    }
}

/// Real-time playback of a replay, stopped by its cancel token
#[derive(Debug)]
pub struct ReplayPlayer {
    replay: Replay,
    started_at: Duration,
    token: CancelToken,
    finished: bool,
    last: Option<ReplayFrame>,
}

impl ReplayPlayer {
    pub fn start(replay: Replay, now: Duration) -> Self {
        Self {
            replay,
            started_at: now,
            token: CancelToken::new(),
            finished: false,
            last: None,
        }
    }

    /// Begin again from the first hit
    pub fn restart(&mut self, now: Duration) {
        self.started_at = now;
        self.finished = false;
        self.last = None;
        self.token = CancelToken::new();
    }

    pub fn replay(&self) -> &Replay {
        &self.replay
    }

    pub fn token(&self) -> CancelToken {
        self.token.clone()
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// True once cancelled or after the final frame was handed out
    pub fn is_stopped(&self) -> bool {
        self.finished || self.token.is_cancelled()
    }

    /// Most recent frame handed out, kept for redraws after playback ends
    pub fn last_frame(&self) -> Option<ReplayFrame> {
        self.last
    }

    /// Next frame to draw, or `None` when playback is over or cancelled
    pub fn poll(&mut self, now: Duration) -> Option<ReplayFrame> {
        if self.is_stopped() {
            return None;
        }
        let frame = self
            .replay
            .frame_at(now.saturating_sub(self.started_at));
        if frame.done {
            self.finished = true;
        }
        self.last = Some(frame);
        Some(frame)
    }

    pub fn visible(&self) -> &[ReplayHit] {
        match &self.last {
            Some(frame) => self.replay.visible(frame),
            None => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_log::{EventKind, EventLog, HitDetail};
    use crate::round::Lane;

    fn hit(x: f64, y: f64) -> EventKind {
        EventKind::Hit {
            x,
            y,
            detail: HitDetail::Bullseye { score: 0, shot: 1 },
        }
    }

    fn log_with_hits(times: &[f64]) -> EventLog {
        let mut log = EventLog::default();
        log.push(0.0, EventKind::Armed);
        for (i, t) in times.iter().enumerate() {
            log.push(*t, hit(0.1 * i as f64, 0.5));
        }
        log.push(times.last().copied().unwrap_or(0.0), EventKind::finish());
        log
    }

    #[test]
    fn no_hits_means_no_data() {
        let mut log = EventLog::default();
        log.push(0.0, EventKind::Armed);
        log.push(1.0, EventKind::HitAfterFinish { x: 0.5, y: 0.5 });
        assert!(Replay::from_events(log.as_slice()).is_none());
    }

    #[test]
    fn reveals_hits_as_virtual_clock_passes() {
        let log = log_with_hits(&[2.0, 2.5, 4.0]);
        let replay = Replay::from_events(log.as_slice()).unwrap();

        assert_eq!(replay.first_ts(), 2.0);
        assert_eq!(replay.last_ts(), 4.0);

        let at = |secs: f64| replay.frame_at(Duration::from_secs_f64(secs));
        assert_eq!(at(0.0).visible, 1);
        assert_eq!(at(0.49).visible, 1);
        assert_eq!(at(0.5).visible, 2);
        assert_eq!(at(2.0).visible, 3);
        assert!(!at(2.6).done);
        assert!(at(2.75).done);
    }

    #[test]
    fn frames_are_monotonic_and_finite() {
        let log = log_with_hits(&[1.0, 1.3, 2.0]);
        let replay = Replay::from_events(log.as_slice()).unwrap();
        let frames: Vec<ReplayFrame> = replay.frames(Duration::from_millis(100)).collect();

        assert!(frames.windows(2).all(|w| w[0].visible <= w[1].visible));
        assert!(frames.windows(2).all(|w| w[0].virtual_time < w[1].virtual_time));
        let last = frames.last().unwrap();
        assert!(last.done);
        assert_eq!(last.visible, 3);
        assert_eq!(frames.iter().filter(|f| f.done).count(), 1);
        // 1.0 .. 2.7 in 0.1 steps
        assert!((18..=19).contains(&frames.len()));
    }

    #[test]
    fn replay_twice_gives_same_final_set() {
        let log = log_with_hits(&[0.3, 0.9, 1.1, 3.0]);
        let replay = Replay::from_events(log.as_slice()).unwrap();

        let a = replay.frames(Duration::from_millis(16)).last().unwrap();
        let b = replay.frames(Duration::from_millis(16)).last().unwrap();
        assert_eq!(a, b);
        assert_eq!(replay.visible(&a), replay.hits());
    }

    #[test]
    fn single_hit_holds_then_ends() {
        let mut log = EventLog::default();
        log.push(
            0.25,
            EventKind::Hit {
                x: 0.3,
                y: 0.5,
                detail: HitDetail::DrawDual {
                    lane: Lane::A,
                    reaction: Some(0.25),
                },
            },
        );
        let replay = Replay::from_events(log.as_slice()).unwrap();
        let first = replay.frame_at(Duration::ZERO);
        assert_eq!(first.visible, 1);
        assert!(!first.done);
        assert!((replay.duration().as_secs_f64() - TRAILING_HOLD).abs() < 1e-9);
    }

    #[test]
    fn speed_scales_virtual_time() {
        let log = log_with_hits(&[1.0, 3.0]);
        let replay = Replay::from_events(log.as_slice()).unwrap().with_speed(2.0);
        assert_eq!(replay.frame_at(Duration::from_secs(1)).visible, 2);
        assert!((replay.duration().as_secs_f64() - 1.35).abs() < 1e-9);

        let fallback = Replay::from_events(log.as_slice()).unwrap().with_speed(-1.0);
        assert_eq!(fallback.frame_at(Duration::from_secs(1)).visible, 1);
    }

    #[test]
    fn zero_step_still_terminates() {
        let log = log_with_hits(&[0.0]);
        let replay = Replay::from_events(log.as_slice()).unwrap();
        let count = replay.frames(Duration::ZERO).count();
        assert!((700..=702).contains(&count));
    }

    #[test]
    fn player_stops_after_done_frame() {
        let log = log_with_hits(&[1.0, 2.0]);
        let replay = Replay::from_events(log.as_slice()).unwrap();
        let start = Duration::from_secs(10);
        let mut player = ReplayPlayer::start(replay, start);

        let frame = player.poll(start).unwrap();
        assert_eq!(frame.visible, 1);
        assert_eq!(player.visible().len(), 1);

        let frame = player.poll(start + Duration::from_secs(2)).unwrap();
        assert!(frame.done);
        assert_eq!(frame.visible, 2);
        assert!(player.poll(start + Duration::from_secs(3)).is_none());
        assert!(player.is_stopped());
        assert_eq!(player.last_frame(), Some(frame));
    }

    #[test]
    fn cancelled_player_yields_nothing() {
        let log = log_with_hits(&[1.0]);
        let replay = Replay::from_events(log.as_slice()).unwrap();
        let mut player = ReplayPlayer::start(replay, Duration::ZERO);
        player.token().cancel();
        assert!(player.poll(Duration::from_millis(10)).is_none());

        player.restart(Duration::from_secs(1));
        assert!(player.poll(Duration::from_secs(1)).is_some());
    }
}
