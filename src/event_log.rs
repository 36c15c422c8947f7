use serde::{Deserialize, Serialize};

use crate::round::{Lane, Player, Winner};

/// Mode-specific payload carried by a `hit` event
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum HitDetail {
    Bullseye {
        score: u8,
        shot: u32,
    },
    TicTacToe {
        row: usize,
        col: usize,
        player: Player,
    },
    DrawDual {
        lane: Lane,
        reaction: Option<f64>,
    },
    Intruder {
        reaction: Option<f64>,
    },
}

impl HitDetail {
    pub fn score(&self) -> Option<u8> {
        match self {
            HitDetail::Bullseye { score, .. } => Some(*score),
            _ => None,
        }
    }

    pub fn reaction(&self) -> Option<f64> {
        match self {
            HitDetail::DrawDual { reaction, .. } | HitDetail::Intruder { reaction } => *reaction,
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventKind {
    Armed,
    CountdownStart,
    Go,
    Hit {
        x: f64,
        y: f64,
        detail: HitDetail,
    },
    InvalidHit {
        x: f64,
        y: f64,
        row: usize,
        col: usize,
    },
    HitAfterFinish {
        x: f64,
        y: f64,
    },
    Finish {
        #[serde(default)]
        manual: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        winner: Option<Winner>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reaction: Option<f64>,
    },
}

impl EventKind {
    pub fn finish() -> Self {
        EventKind::Finish {
            manual: false,
            winner: None,
            reaction: None,
        }
    }

    pub fn manual_finish() -> Self {
        EventKind::Finish {
            manual: true,
            winner: None,
            reaction: None,
        }
    }

    pub fn is_hit(&self) -> bool {
        matches!(self, EventKind::Hit { .. })
    }
}

/// Immutable record in a round's log; `timestamp` is seconds since round start
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub timestamp: f64,
    #[serde(flatten)]
    pub kind: EventKind,
}

/// Borrowed view of a `hit` event
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitRef<'a> {
    pub timestamp: f64,
    pub x: f64,
    pub y: f64,
    pub detail: &'a HitDetail,
}

impl<'a> HitRef<'a> {
    pub fn from_event(event: &'a Event) -> Option<Self> {
        match &event.kind {
            EventKind::Hit { x, y, detail } => Some(HitRef {
                timestamp: event.timestamp,
                x: *x,
                y: *y,
                detail,
            }),
            _ => None,
        }
    }
}

/// Append-only, timestamp-ordered event sequence
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    /// Append an event. A timestamp earlier than the last entry is raised to
    /// it so the log stays ordered.
    pub fn push(&mut self, timestamp: f64, kind: EventKind) {
        let floor = self.last_timestamp().unwrap_or(0.0);
        let timestamp = if timestamp.is_nan() {
            floor
        } else {
            timestamp.max(floor)
        };
        self.events.push(Event { timestamp, kind });
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Event> {
        self.events.iter()
    }

    pub fn as_slice(&self) -> &[Event] {
        &self.events
    }

    pub fn last(&self) -> Option<&Event> {
        self.events.last()
    }

    pub fn last_timestamp(&self) -> Option<f64> {
        self.events.last().map(|e| e.timestamp)
    }

    pub fn hits(&self) -> impl Iterator<Item = HitRef<'_>> + '_ {
        self.events.iter().filter_map(HitRef::from_event)
    }

    pub fn count_kind(&self, pred: impl Fn(&EventKind) -> bool) -> usize {
        self.events.iter().filter(|e| pred(&e.kind)).count()
    }
}

impl<'a> IntoIterator for &'a EventLog {
    type Item = &'a Event;
    type IntoIter = std::slice::Iter<'a, Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}
