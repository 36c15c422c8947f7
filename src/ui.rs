pub mod screen;
pub mod target;

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, View};
use crate::clock::Clock;
use crate::history::{HistoryStats, RoundSummary};
use crate::round::{Mode, RoundState};
use crate::util::format_secs;
use screen::current_screen;
use target::{render_target, TargetView};

const SIDE_PANEL_WIDTH: u16 = 42;
const RECENT_ROUNDS: usize = 12;

/// Draw whatever the current view is
pub fn draw<C: Clock + 'static>(app: &mut App<C>, f: &mut Frame) {
    current_screen::<C>(app.view).render(app, f);
}

/// Split into body (target | side panel) and a one line help footer
fn frame_layout(area: Rect) -> (Rect, Rect, Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(area);
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(10), Constraint::Length(SIDE_PANEL_WIDTH)])
        .split(rows[0]);
    (cols[0], cols[1], rows[1])
}

fn help_line(view: View) -> Paragraph<'static> {
    let text = match view {
        View::Play => "(s)tart (x) stop (m)ode (+/-) shots (h)istory (r)eplay last (q)uit",
        View::History => "↑/↓ select | enter replay | (r)eplay last | (h)/esc back | (q)uit",
        View::Replay => "(r) restart | esc close | (q)uit",
    };
    Paragraph::new(text)
        .style(Style::default().fg(Color::Gray).add_modifier(Modifier::ITALIC))
        .alignment(Alignment::Center)
}

fn history_items(summaries: &[RoundSummary]) -> Vec<ListItem<'static>> {
    summaries
        .iter()
        .map(|s| {
            let style = if s.stopped {
                Style::default().add_modifier(Modifier::DIM)
            } else {
                Style::default()
            };
            ListItem::new(s.label()).style(style)
        })
        .collect()
}

fn field(name: &'static str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{name:<10}"), Style::default().fg(Color::Gray)),
        Span::raw(value),
    ])
}

fn round_lines<C: Clock>(app: &App<C>) -> Vec<Line<'static>> {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let mut lines = Vec::new();

    match app.session.snapshot() {
        Some(snap) => {
            let state_style = match snap.state {
                RoundState::Armed => Style::default().fg(Color::Green),
                RoundState::Countdown => Style::default().fg(Color::Yellow),
                RoundState::Active => Style::default().fg(Color::Red).patch(bold),
                RoundState::Finished => Style::default().fg(Color::Cyan),
            };
            lines.push(field("mode", snap.mode.to_string()));
            lines.push(Line::from(vec![
                Span::styled(format!("{:<10}", "state"), Style::default().fg(Color::Gray)),
                Span::styled(snap.state.to_string(), state_style),
            ]));
            lines.push(field("yards", snap.yards.to_string()));
            if snap.mode.uses_shots_goal() {
                lines.push(field("shots", format!("{}/{}", snap.shots, snap.shots_goal)));
            }
            if snap.mode == Mode::TicTacToe && snap.state != RoundState::Finished {
                lines.push(field("turn", snap.current_player.to_string()));
            }
            if let Some(remaining) = snap.countdown_remaining {
                lines.push(field("countdown", remaining.to_string()));
            }
            if let Some(winner) = snap.winner {
                lines.push(field("winner", winner.to_string()));
            }
        }
        None => lines.push(Line::from("no round yet")),
    }

    lines.push(Line::from(""));
    lines.push(field(
        "next",
        if app.mode.uses_shots_goal() {
            format!("{} x{} @ {} yd", app.mode, app.shots_goal, app.yards)
        } else {
            format!("{} @ {} yd", app.mode, app.yards)
        },
    ));
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(app.status.clone(), bold)));
    lines
}

pub(crate) fn render_play<C: Clock>(app: &mut App<C>, f: &mut Frame) {
    let (target_area, side, footer) = frame_layout(f.area());

    let round = app.session.current();
    let mode = round.map_or(app.mode, |r| r.mode);
    let yards = round.map_or(app.yards, |r| r.yards);
    let armed = round.is_some_and(|r| r.state == RoundState::Armed);
    let hits = app.session.current_hits();

    let view = TargetView {
        title: format!(" {mode} | {yards} yd "),
        mode,
        board: round.map(|r| &r.board),
        hits: &hits,
        start_zone: armed.then_some(app.session.settings().start_zone),
    };
    let inner = render_target(f, target_area, &view);
    app.target_area = inner;

    let panels = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(13), Constraint::Min(0)])
        .split(side);

    let status = Paragraph::new(round_lines(app))
        .block(Block::default().borders(Borders::ALL).title("Round"))
        .wrap(Wrap { trim: true });
    f.render_widget(status, panels[0]);

    let summaries: Vec<RoundSummary> = app
        .session
        .history()
        .summaries()
        .into_iter()
        .take(RECENT_ROUNDS)
        .collect();
    let recent = if summaries.is_empty() {
        List::new(vec![ListItem::new("No rounds yet.")])
    } else {
        List::new(history_items(&summaries))
    };
    f.render_widget(
        recent.block(Block::default().borders(Borders::ALL).title("Recent")),
        panels[1],
    );

    f.render_widget(help_line(View::Play), footer);
}

fn stats_lines(stats: &HistoryStats) -> Vec<Line<'static>> {
    let mut lines = vec![field("rounds", stats.rounds.to_string())];
    for (mode, count) in &stats.per_mode {
        lines.push(field("", format!("{mode}: {count}")));
    }
    lines.push(field(
        "best",
        stats
            .best_bullseye
            .map_or_else(|| "-".to_string(), |b| b.to_string()),
    ));
    lines.push(field(
        "mean",
        stats
            .mean_bullseye
            .map_or_else(|| "-".to_string(), |m| format!("{m:.1}")),
    ));
    lines.push(field("reaction", format_secs(stats.mean_reaction)));
    lines.push(field("std dev", format_secs(stats.reaction_std_dev)));
    lines
}

pub(crate) fn render_history<C: Clock>(app: &mut App<C>, f: &mut Frame) {
    let (list_area, side, footer) = frame_layout(f.area());
    let summaries = app.session.history().summaries();

    if summaries.is_empty() {
        let empty = Paragraph::new("No rounds yet.\nPress h to go back and s to start one.")
            .block(Block::default().borders(Borders::ALL).title("History"))
            .style(Style::default().fg(Color::Gray))
            .alignment(Alignment::Center);
        f.render_widget(empty, list_area);
    } else {
        app.selected = app.selected.min(summaries.len() - 1);
        let list = List::new(history_items(&summaries))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!("History ({})", summaries.len())),
            )
            .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
            .highlight_symbol("> ");
        let mut state = ListState::default().with_selected(Some(app.selected));
        f.render_stateful_widget(list, list_area, &mut state);
    }

    let stats = HistoryStats::from_records(app.session.history().records());
    let mut lines = stats_lines(&stats);
    if let Some(record) = app.selected_record() {
        let summary = RoundSummary::from(record);
        lines.push(Line::from(""));
        lines.push(field("selected", summary.id.to_string()));
        lines.push(field("score", summary.total_score.to_string()));
        lines.push(field("reaction", format_secs(summary.reaction)));
        lines.push(field("hits", record.hit_count().to_string()));
    }
    let panel = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Stats"))
        .wrap(Wrap { trim: true });
    f.render_widget(panel, side);

    f.render_widget(help_line(View::History), footer);
}

pub(crate) fn render_replay<C: Clock>(app: &mut App<C>, f: &mut Frame) {
    let (target_area, side, footer) = frame_layout(f.area());

    let record = app.replayed_record();
    let mode = record.map_or(app.mode, |r| r.mode);
    let title = record.map_or_else(
        || " replay ".to_string(),
        |r| format!(" replay: {} | {} yd ", r.mode, r.yards),
    );
    let label = record.map(|r| RoundSummary::from(r).label());

    let (hits, frame, total, length) = match &app.replay {
        Some(player) => (
            player
                .visible()
                .iter()
                .map(|h| (h.x, h.y))
                .collect::<Vec<_>>(),
            player.last_frame(),
            player.replay().hits().len(),
            Some(player.replay().duration().as_secs_f64()),
        ),
        None => (Vec::new(), None, 0, None),
    };

    let view = TargetView {
        title,
        mode,
        board: None,
        hits: &hits,
        start_zone: None,
    };
    app.target_area = render_target(f, target_area, &view);

    let mut lines = Vec::new();
    if let Some(label) = label {
        lines.push(Line::from(label));
        lines.push(Line::from(""));
    }
    lines.push(field("hits", format!("{}/{}", hits.len(), total)));
    lines.push(field("length", format_secs(length)));
    if let Some(frame) = frame {
        lines.push(field("t", format!("{:.2}s", frame.virtual_time)));
        if frame.done {
            lines.push(field("", "done".to_string()));
        }
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        app.status.clone(),
        Style::default().add_modifier(Modifier::BOLD),
    )));
    let panel = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Replay"))
        .wrap(Wrap { trim: true });
    f.render_widget(panel, side);

    f.render_widget(help_line(View::Replay), footer);
}
