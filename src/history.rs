use anyhow::{Context, Result};
use chrono::{Local, TimeZone};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;

use crate::event_log::{Event, EventKind};
use crate::round::{Board, Mode, Round, Winner};
use crate::store::KeyValueStore;
use crate::util::{mean, std_dev};

/// Storage key for a history, one per input variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Namespace {
    /// Mouse / pointer input
    Pointer,
    /// Camera-observed laser input
    Laser,
}

impl Namespace {
    pub fn key(self) -> &'static str {
        match self {
            Namespace::Pointer => "defenderProRoundsFull",
            Namespace::Laser => "defenderProRoundsLaser",
        }
    }
}

/// Finalized, read-only snapshot of a round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundRecord {
    pub id: i64,
    pub mode: Mode,
    pub yards: u32,
    pub shots_goal: u32,
    pub shots: u32,
    pub winner: Option<Winner>,
    pub board: Board,
    pub events: Vec<Event>,
    #[serde(default)]
    pub finished_at: Option<i64>,
}

impl RoundRecord {
    pub fn from_round(round: &Round, finished_at: i64) -> Self {
        Self {
            id: round.id,
            mode: round.mode,
            yards: round.yards,
            shots_goal: round.shots_goal,
            shots: round.shots,
            winner: round.winner,
            board: round.board,
            events: round.events().to_vec(),
            finished_at: Some(finished_at),
        }
    }

    /// Sum of bullseye scores; zero for other modes
    pub fn total_score(&self) -> u32 {
        self.events
            .iter()
            .filter_map(|e| match &e.kind {
                EventKind::Hit { detail, .. } => detail.score(),
                _ => None,
            })
            .map(u32::from)
            .sum()
    }

    /// Reaction time reported by the deciding hit
    pub fn reaction(&self) -> Option<f64> {
        self.events.iter().find_map(|e| match &e.kind {
            EventKind::Hit { detail, .. } => detail.reaction(),
            _ => None,
        })
    }

    pub fn was_stopped(&self) -> bool {
        self.events
            .iter()
            .any(|e| matches!(e.kind, EventKind::Finish { manual: true, .. }))
    }

    pub fn hit_count(&self) -> usize {
        self.events.iter().filter(|e| e.kind.is_hit()).count()
    }
}

/// Ordered list of finished rounds, oldest first
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoundHistory {
    rounds: Vec<RoundRecord>,
}

impl RoundHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from the store; a missing or unreadable blob yields an empty history
    pub fn load<S: KeyValueStore + ?Sized>(store: &S, key: &str) -> Self {
        match store.load(key) {
            Ok(Some(raw)) => match serde_json::from_str::<RoundHistory>(&raw) {
                Ok(history) => history,
                Err(e) => {
                    log::warn!("discarding unreadable round history under {key}: {e}");
                    Self::default()
                }
            },
            Ok(None) => Self::default(),
            Err(e) => {
                log::warn!("could not load round history: {e:#}");
                Self::default()
            }
        }
    }

    pub fn save<S: KeyValueStore + ?Sized>(&self, store: &S, key: &str) -> Result<()> {
        let raw = serde_json::to_string(self).context("serializing round history")?;
        store.save(key, &raw)
    }

    pub(crate) fn push(&mut self, record: RoundRecord) {
        self.rounds.push(record);
    }

    pub fn records(&self) -> &[RoundRecord] {
        &self.rounds
    }

    pub fn newest_first(&self) -> impl Iterator<Item = &RoundRecord> + '_ {
        self.rounds.iter().rev()
    }

    pub fn last(&self) -> Option<&RoundRecord> {
        self.rounds.last()
    }

    pub fn get(&self, id: i64) -> Option<&RoundRecord> {
        self.rounds.iter().find(|r| r.id == id)
    }

    pub fn len(&self) -> usize {
        self.rounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rounds.is_empty()
    }

    pub fn summaries(&self) -> Vec<RoundSummary> {
        self.newest_first().map(RoundSummary::from).collect()
    }
}

/// One line of the history list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoundSummary {
    pub id: i64,
    pub when: String,
    pub mode: Mode,
    pub yards: u32,
    pub shots: u32,
    pub shots_goal: u32,
    pub winner: Option<Winner>,
    pub total_score: u32,
    pub reaction: Option<f64>,
    pub stopped: bool,
}

impl From<&RoundRecord> for RoundSummary {
    fn from(record: &RoundRecord) -> Self {
        Self {
            id: record.id,
            when: local_time(record.id),
            mode: record.mode,
            yards: record.yards,
            shots: record.shots,
            shots_goal: record.shots_goal,
            winner: record.winner,
            total_score: record.total_score(),
            reaction: record.reaction(),
            stopped: record.was_stopped(),
        }
    }
}

impl RoundSummary {
    pub fn label(&self) -> String {
        let mut label = format!(
            "[{}] {} | yards {} | shots {}",
            self.when, self.mode, self.yards, self.shots
        );
        if let Some(winner) = self.winner {
            label.push_str(&format!(" | winner {winner}"));
        }
        label
    }
}

fn local_time(epoch_millis: i64) -> String {
    Local
        .timestamp_millis_opt(epoch_millis)
        .single()
        .map(|t| t.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "--:--:--".to_string())
}

/// Aggregates over the whole history
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryStats {
    pub rounds: usize,
    pub per_mode: BTreeMap<String, usize>,
    pub best_bullseye: Option<u32>,
    pub mean_bullseye: Option<f64>,
    pub mean_reaction: Option<f64>,
    pub reaction_std_dev: Option<f64>,
}

impl HistoryStats {
    pub fn from_records(records: &[RoundRecord]) -> Self {
        let per_mode = records
            .iter()
            .counts_by(|r| r.mode.to_string())
            .into_iter()
            .collect::<BTreeMap<_, _>>();

        let bullseye_totals: Vec<u32> = records
            .iter()
            .filter(|r| r.mode == Mode::Bullseye && !r.was_stopped())
            .map(RoundRecord::total_score)
            .collect();
        let bullseye_f64: Vec<f64> = bullseye_totals.iter().map(|t| *t as f64).collect();

        let reactions: Vec<f64> = records.iter().filter_map(RoundRecord::reaction).collect();

        Self {
            rounds: records.len(),
            per_mode,
            best_bullseye: bullseye_totals.iter().copied().max(),
            mean_bullseye: mean(&bullseye_f64),
            mean_reaction: mean(&reactions),
            reaction_std_dev: std_dev(&reactions),
        }
    }
}

#[derive(Serialize)]
struct CsvRow<'a> {
    id: i64,
    when: &'a str,
    mode: String,
    yards: u32,
    shots: u32,
    shots_goal: u32,
    winner: String,
    total_score: u32,
    reaction: Option<f64>,
    stopped: bool,
}

/// Write one CSV row per round, oldest first
pub fn export_csv<W: Write>(records: &[RoundRecord], out: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    for record in records {
        let summary = RoundSummary::from(record);
        writer.serialize(CsvRow {
            id: summary.id,
            when: &summary.when,
            mode: summary.mode.to_string(),
            yards: summary.yards,
            shots: summary.shots,
            shots_goal: summary.shots_goal,
            winner: summary.winner.map(|w| w.to_string()).unwrap_or_default(),
            total_score: summary.total_score,
            reaction: summary.reaction,
            stopped: summary.stopped,
        })?;
    }
    writer.flush().context("flushing csv output")?;
    Ok(())
}
