use serde::{Deserialize, Serialize};

use crate::event_log::{Event, EventKind, EventLog};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    clap::ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Mode {
    Bullseye,
    #[value(alias = "tic_tac_toe")]
    TicTacToe,
    #[value(alias = "draw_dual")]
    DrawDual,
    Intruder,
}

impl Mode {
    pub const ALL: [Mode; 4] = [
        Mode::Bullseye,
        Mode::TicTacToe,
        Mode::DrawDual,
        Mode::Intruder,
    ];

    /// Next mode in selection order, wrapping around
    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|m| *m == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    /// Only bullseye rounds take more than one shot
    pub fn uses_shots_goal(self) -> bool {
        matches!(self, Mode::Bullseye)
    }
}

/// Lifecycle of a round: armed -> countdown -> active -> finished.
/// The derived ordering is the transition order.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum_macros::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RoundState {
    Armed,
    Countdown,
    Active,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display)]
pub enum Player {
    X,
    O,
}

impl Player {
    pub fn other(self) -> Self {
        match self {
            Player::X => Player::O,
            Player::O => Player::X,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display)]
pub enum Lane {
    A,
    B,
}

impl Lane {
    pub fn from_x(x: f64) -> Self {
        if x < 0.5 {
            Lane::A
        } else {
            Lane::B
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display)]
pub enum Winner {
    X,
    O,
    #[serde(rename = "draw")]
    #[strum(serialize = "draw")]
    Draw,
    A,
    B,
    #[serde(rename = "user")]
    #[strum(serialize = "user")]
    User,
}

impl From<Player> for Winner {
    fn from(p: Player) -> Self {
        match p {
            Player::X => Winner::X,
            Player::O => Winner::O,
        }
    }
}

impl From<Lane> for Winner {
    fn from(l: Lane) -> Self {
        match l {
            Lane::A => Winner::A,
            Lane::B => Winner::B,
        }
    }
}

const LINES: [[(usize, usize); 3]; 8] = [
    [(0, 0), (0, 1), (0, 2)],
    [(1, 0), (1, 1), (1, 2)],
    [(2, 0), (2, 1), (2, 2)],
    [(0, 0), (1, 0), (2, 0)],
    [(0, 1), (1, 1), (2, 1)],
    [(0, 2), (1, 2), (2, 2)],
    [(0, 0), (1, 1), (2, 2)],
    [(0, 2), (1, 1), (2, 0)],
];

/// 3x3 tic-tac-toe grid, indexed `[row][col]`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board(pub [[Option<Player>; 3]; 3]);

impl Board {
    /// Map a normalized hit to its `(row, col)`, clamping anything outside the grid
    pub fn cell_for(x: f64, y: f64) -> (usize, usize) {
        (axis_cell(y), axis_cell(x))
    }

    pub fn get(&self, row: usize, col: usize) -> Option<Player> {
        self.0[row][col]
    }

    pub fn set(&mut self, row: usize, col: usize, player: Player) {
        self.0[row][col] = Some(player);
    }

    pub fn is_full(&self) -> bool {
        self.0.iter().flatten().all(Option::is_some)
    }

    /// The mark holding three in a row, if any
    pub fn line_winner(&self) -> Option<Player> {
        LINES.iter().find_map(|&line| {
            let [first, second, third] = line.map(|(row, col)| self.0[row][col]);
            match (first, second, third) {
                (Some(a), Some(b), Some(c)) if a == b && b == c => Some(a),
                _ => None,
            }
        })
    }

    pub fn marks(&self) -> impl Iterator<Item = (usize, usize, Player)> + '_ {
        self.0.iter().enumerate().flat_map(|(r, row)| {
            row.iter()
                .enumerate()
                .filter_map(move |(c, cell)| cell.map(|p| (r, c, p)))
        })
    }
}

fn axis_cell(v: f64) -> usize {
    let cell = (v * 3.0).floor();
    if cell.is_nan() || cell < 0.0 {
        0
    } else {
        (cell as usize).min(2)
    }
}

/// Normalized rectangle that arms the countdown, bounds inclusive
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StartZone {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

pub const START_ZONE: StartZone = StartZone {
    x: 0.4,
    y: 0.85,
    w: 0.2,
    h: 0.1,
};

impl StartZone {
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x && x <= self.x + self.w && y >= self.y && y <= self.y + self.h
    }
}

impl Default for StartZone {
    fn default() -> Self {
        START_ZONE
    }
}

/// One play session, owned and mutated by `Session` only while live
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Round {
    pub id: i64,
    pub mode: Mode,
    pub yards: u32,
    pub shots_goal: u32,
    pub state: RoundState,
    pub start_time: f64,
    pub go_time: Option<f64>,
    pub events: EventLog,
    pub shots: u32,
    pub winner: Option<Winner>,
    pub board: Board,
    pub current_player: Player,
}

impl Round {
    /// Build an armed round and log the `armed` event.
    ///
    /// Non-bullseye modes always take a single shot; bullseye takes at least one.
    pub fn new(id: i64, mode: Mode, shots_goal: u32, yards: u32, now: f64) -> Self {
        let shots_goal = if mode.uses_shots_goal() {
            shots_goal.max(1)
        } else {
            1
        };

        let mut round = Self {
            id,
            mode,
            yards,
            shots_goal,
            state: RoundState::Armed,
            start_time: now,
            go_time: None,
            events: EventLog::default(),
            shots: 0,
            winner: None,
            board: Board::default(),
            current_player: Player::X,
        };
        round.add_event(EventKind::Armed, now);
        round
    }

    pub fn add_event(&mut self, kind: EventKind, now: f64) {
        let relative = (now - self.start_time).max(0.0);
        self.events.push(relative, kind);
    }

    /// Move forward to `to`; returns false (and changes nothing) for a
    /// backwards or repeated transition
    pub fn advance(&mut self, to: RoundState) -> bool {
        if to <= self.state {
            return false;
        }
        self.state = to;
        true
    }

    pub fn is_finished(&self) -> bool {
        self.state == RoundState::Finished
    }

    pub fn events(&self) -> &[Event] {
        self.events.as_slice()
    }

    pub fn hit_points(&self) -> Vec<(f64, f64)> {
        self.events.hits().map(|h| (h.x, h.y)).collect()
    }
}
