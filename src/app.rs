use crossterm::event::{
    KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEvent, MouseEventKind,
};
use ratatui::{backend::Backend, layout::Rect, Terminal};

use crate::clock::Clock;
use crate::config::Config;
use crate::history::RoundRecord;
use crate::input::{normalize, HitFilter};
use crate::replay::ReplayPlayer;
use crate::round::Mode;
use crate::runtime::{DefenderEvent, DefenderEventSource, Runner, Ticker};
use crate::session::{HitResponse, Session, TickOutcome};
use crate::ui;

const MAX_SHOTS_GOAL: u32 = 99;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Play,
    History,
    Replay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppAction {
    Continue,
    Quit,
}

/// Terminal front end state wrapped around a [`Session`]
pub struct App<C: Clock> {
    pub session: Session<C>,
    pub view: View,
    /// Settings for the next round; the live round keeps its own
    pub mode: Mode,
    pub shots_goal: u32,
    pub yards: u32,
    /// Index into the newest-first history list
    pub selected: usize,
    pub replay: Option<ReplayPlayer>,
    /// History id of the round being replayed
    pub replay_of: Option<i64>,
    /// Where the target was last drawn, in terminal cells
    pub target_area: Rect,
    pub status: String,
    filter: HitFilter,
}

impl<C: Clock> App<C> {
    pub fn new(session: Session<C>, cfg: &Config) -> Self {
        Self {
            session,
            view: View::Play,
            mode: cfg.mode,
            shots_goal: cfg.shots_goal.clamp(1, MAX_SHOTS_GOAL),
            yards: cfg.yards,
            selected: 0,
            replay: None,
            replay_of: None,
            target_area: Rect::default(),
            status: "press s to arm a round".to_string(),
            filter: HitFilter::new(cfg.cooldown()),
        }
    }

    pub fn start_round(&mut self) {
        self.close_replay();
        self.filter.reset();
        let round = self.session.start_round(self.mode, self.shots_goal, self.yards);
        self.status = format!("{} armed: shoot PLAY to start", round.mode);
        self.view = View::Play;
    }

    pub fn handle(&mut self, event: DefenderEvent) -> AppAction {
        match event {
            DefenderEvent::Tick => self.on_tick(),
            DefenderEvent::Resize => {}
            DefenderEvent::Mouse(mouse) => {
                self.on_mouse(mouse);
            }
            DefenderEvent::Key(key) if key.kind != KeyEventKind::Release => {
                return self.on_key(key)
            }
            DefenderEvent::Key(_) => {}
        }
        AppAction::Continue
    }

    pub fn on_key(&mut self, key: KeyEvent) -> AppAction {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return AppAction::Quit;
        }

        match (self.view, key.code) {
            (_, KeyCode::Char('q')) => return AppAction::Quit,
            (View::Replay, KeyCode::Esc) => self.close_replay(),
            (View::Replay, KeyCode::Char('r')) => {
                let now = self.session.clock().now();
                if let Some(player) = self.replay.as_mut() {
                    player.restart(now);
                }
            }
            (View::Replay, _) => {}
            (View::History, KeyCode::Esc) | (View::History, KeyCode::Char('h')) => {
                self.view = View::Play
            }
            (View::Play, KeyCode::Esc) => return AppAction::Quit,
            (View::Play, KeyCode::Char('h')) => {
                self.selected = 0;
                self.view = View::History;
            }
            (View::History, KeyCode::Up) => self.selected = self.selected.saturating_sub(1),
            (View::History, KeyCode::Down) => {
                let len = self.session.history().len();
                if self.selected + 1 < len {
                    self.selected += 1;
                }
            }
            (View::History, KeyCode::Enter) => {
                let id = self.selected_record().map(|r| r.id);
                self.open_replay(id);
            }
            (_, KeyCode::Char('r')) => {
                let id = self.session.history().last().map(|r| r.id);
                self.open_replay(id);
            }
            (_, KeyCode::Char('s')) => self.start_round(),
            (_, KeyCode::Char('x')) => {
                if self.session.stop() {
                    self.status = "round stopped".to_string();
                }
            }
            (_, KeyCode::Char('m')) => {
                self.mode = self.mode.next();
                self.status = format!("next round: {}", self.mode);
            }
            (_, KeyCode::Char('+')) | (_, KeyCode::Char('=')) => {
                self.shots_goal = (self.shots_goal + 1).min(MAX_SHOTS_GOAL);
            }
            (_, KeyCode::Char('-')) => {
                self.shots_goal = self.shots_goal.saturating_sub(1).max(1);
            }
            _ => {}
        }
        AppAction::Continue
    }

    /// A click on the terminal; only clicks on the drawn target count
    pub fn on_mouse(&mut self, mouse: MouseEvent) -> Option<HitResponse> {
        if self.view != View::Play || !matches!(mouse.kind, MouseEventKind::Down(_)) {
            return None;
        }
        let (x, y) = normalize(self.target_area, mouse.column, mouse.row)?;
        Some(self.shoot(x, y))
    }

    /// Feed a normalized hit through the cooldown filter into the session
    pub fn shoot(&mut self, x: f64, y: f64) -> HitResponse {
        if !self.filter.accept(self.session.clock().now()) {
            log::trace!("hit at ({x:.3}, {y:.3}) inside cooldown");
            return HitResponse::Ignored;
        }

        let response = self.session.record_hit(x, y);
        match response {
            HitResponse::CountdownStarted => self.status = "get ready".to_string(),
            HitResponse::Invalid => self.status = "cell taken".to_string(),
            HitResponse::Finished => self.status = self.finished_status(),
            _ => {}
        }
        response
    }

    pub fn on_tick(&mut self) {
        match self.session.on_tick() {
            TickOutcome::Tick(remaining) => self.status = format!("{remaining}..."),
            TickOutcome::Go => self.status = "GO!".to_string(),
            TickOutcome::Cancelled => log::debug!("stale countdown dropped"),
            TickOutcome::Idle | TickOutcome::Waiting => {}
        }

        let now = self.session.clock().now();
        if let Some(player) = self.replay.as_mut() {
            if let Some(frame) = player.poll(now) {
                if frame.done {
                    self.status = "replay finished: r to watch again, esc to close".to_string();
                }
            }
        }
    }

    /// Start playing back the history round `id`
    pub fn open_replay(&mut self, id: Option<i64>) {
        let Some((id, replay)) = id.and_then(|id| self.session.replay(id).map(|r| (id, r))) else {
            self.status = "No hits in this round.".to_string();
            return;
        };
        self.close_replay();
        self.replay = Some(ReplayPlayer::start(replay, self.session.clock().now()));
        self.replay_of = Some(id);
        self.view = View::Replay;
        self.status = "replaying".to_string();
    }

    pub fn close_replay(&mut self) {
        if let Some(player) = self.replay.take() {
            player.cancel();
            self.replay_of = None;
            self.view = View::Play;
        }
    }

    pub fn selected_record(&self) -> Option<&RoundRecord> {
        self.session.history().newest_first().nth(self.selected)
    }

    pub fn replayed_record(&self) -> Option<&RoundRecord> {
        self.replay_of.and_then(|id| self.session.history().get(id))
    }

    fn finished_status(&self) -> String {
        match self.session.history().last() {
            Some(record) => match record.winner {
                Some(winner) => format!("winner: {winner}"),
                None => format!("finished: {} points", record.total_score()),
            },
            None => "finished".to_string(),
        }
    }
}

/// Draw, wait for the next event or tick, repeat until the user quits
pub fn run<B, C, E, T>(
    terminal: &mut Terminal<B>,
    app: &mut App<C>,
    runner: &Runner<E, T>,
) -> anyhow::Result<()>
where
    B: Backend,
    C: Clock + 'static,
    E: DefenderEventSource,
    T: Ticker,
{
    loop {
        terminal.draw(|f| ui::draw(app, f))?;
        if app.handle(runner.step()) == AppAction::Quit {
            log::debug!("quit requested");
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::round::RoundState;
    use crossterm::event::{KeyEventState, MouseButton};
    use std::time::Duration;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn click(column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    fn app(cfg: Config) -> (App<ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        let mut app = App::new(Session::ephemeral(clock.clone()), &cfg);
        app.target_area = Rect::new(0, 0, 20, 20);
        (app, clock)
    }

    fn run_countdown(app: &mut App<ManualClock>, clock: &ManualClock) {
        for _ in 0..3 {
            clock.advance(Duration::from_millis(700));
            app.on_tick();
        }
    }

    #[test]
    fn quit_keys() {
        let (mut app, _) = app(Config::default());
        assert_eq!(app.on_key(key(KeyCode::Char('q'))), AppAction::Quit);
        assert_eq!(app.on_key(key(KeyCode::Esc)), AppAction::Quit);
        let ctrl_c = KeyEvent {
            modifiers: KeyModifiers::CONTROL,
            ..key(KeyCode::Char('c'))
        };
        assert_eq!(app.on_key(ctrl_c), AppAction::Quit);
    }

    #[test]
    fn mode_and_goal_keys_shape_next_round() {
        let (mut app, _) = app(Config::default());
        app.on_key(key(KeyCode::Char('m')));
        assert_eq!(app.mode, Mode::TicTacToe);
        app.on_key(key(KeyCode::Char('m')));
        app.on_key(key(KeyCode::Char('m')));
        app.on_key(key(KeyCode::Char('m')));
        assert_eq!(app.mode, Mode::Bullseye);

        app.on_key(key(KeyCode::Char('+')));
        assert_eq!(app.shots_goal, 6);
        for _ in 0..10 {
            app.on_key(key(KeyCode::Char('-')));
        }
        assert_eq!(app.shots_goal, 1);

        app.on_key(key(KeyCode::Char('s')));
        let round = app.session.current().unwrap();
        assert_eq!(round.mode, Mode::Bullseye);
        assert_eq!(round.shots_goal, 1);
    }

    #[test]
    fn clicks_drive_a_round() {
        let (mut app, clock) = app(Config {
            mode: Mode::Intruder,
            ..Config::default()
        });
        app.on_key(key(KeyCode::Char('s')));

        // outside the drawn target
        assert_eq!(app.on_mouse(click(40, 5)), None);
        // row 18 of 20 -> y = 0.925, column 10 -> x = 0.525
        assert_eq!(
            app.on_mouse(click(10, 18)),
            Some(HitResponse::CountdownStarted)
        );
        run_countdown(&mut app, &clock);
        assert_eq!(app.status, "GO!");

        assert_eq!(app.on_mouse(click(3, 3)), Some(HitResponse::Finished));
        assert_eq!(app.status, "winner: user");
        assert_eq!(app.session.history().len(), 1);
    }

    #[test]
    fn only_button_presses_shoot() {
        let (mut app, clock) = app(Config {
            shots_goal: 3,
            ..Config::default()
        });
        app.on_key(key(KeyCode::Char('s')));
        app.on_mouse(click(10, 18));
        run_countdown(&mut app, &clock);

        let press = click(10, 10);
        for kind in [
            MouseEventKind::Up(MouseButton::Left),
            MouseEventKind::Drag(MouseButton::Left),
            MouseEventKind::Moved,
            MouseEventKind::ScrollDown,
        ] {
            assert_eq!(app.on_mouse(MouseEvent { kind, ..press }), None);
        }
        assert_eq!(app.on_mouse(press), Some(HitResponse::Recorded));
        assert_eq!(
            app.handle(DefenderEvent::Mouse(MouseEvent {
                kind: MouseEventKind::Up(MouseButton::Left),
                ..press
            })),
            AppAction::Continue
        );
        assert_eq!(app.session.current().unwrap().shots, 1);
    }

    #[test]
    fn cooldown_drops_rapid_clicks() {
        let (mut app, clock) = app(Config {
            cooldown_ms: 200,
            shots_goal: 3,
            ..Config::default()
        });
        app.on_key(key(KeyCode::Char('s')));
        app.shoot(0.5, 0.9);
        run_countdown(&mut app, &clock);

        assert_eq!(app.shoot(0.5, 0.5), HitResponse::Recorded);
        assert_eq!(app.shoot(0.5, 0.5), HitResponse::Ignored);
        clock.advance(Duration::from_millis(250));
        assert_eq!(app.shoot(0.5, 0.5), HitResponse::Recorded);
        assert_eq!(app.session.current().unwrap().shots, 2);
    }

    #[test]
    fn history_navigation_and_replay() {
        let (mut app, clock) = app(Config {
            mode: Mode::Intruder,
            ..Config::default()
        });
        for _ in 0..2 {
            app.on_key(key(KeyCode::Char('s')));
            app.shoot(0.5, 0.9);
            run_countdown(&mut app, &clock);
            app.shoot(0.2, 0.2);
        }

        app.on_key(key(KeyCode::Char('h')));
        assert_eq!(app.view, View::History);
        app.on_key(key(KeyCode::Down));
        app.on_key(key(KeyCode::Down));
        assert_eq!(app.selected, 1);
        let oldest = app.session.history().records()[0].id;
        assert_eq!(app.selected_record().map(|r| r.id), Some(oldest));

        app.on_key(key(KeyCode::Enter));
        assert_eq!(app.view, View::Replay);
        assert_eq!(app.replayed_record().map(|r| r.id), Some(oldest));
        let token = app.replay.as_ref().unwrap().token();

        clock.advance_secs(1.0);
        app.on_tick();
        assert!(app.replay.as_ref().unwrap().is_stopped());
        assert_eq!(app.replay.as_ref().unwrap().visible().len(), 1);

        app.on_key(key(KeyCode::Esc));
        assert_eq!(app.view, View::Play);
        assert!(app.replay.is_none());
        assert!(token.is_cancelled());
        assert_eq!(app.replay_of, None);
    }

    #[test]
    fn replay_without_data_stays_put() {
        let (mut app, _) = app(Config::default());
        app.on_key(key(KeyCode::Char('r')));
        assert_eq!(app.view, View::Play);
        assert_eq!(app.status, "No hits in this round.");
    }

    #[test]
    fn starting_a_round_cancels_replay() {
        let (mut app, clock) = app(Config {
            mode: Mode::DrawDual,
            ..Config::default()
        });
        app.on_key(key(KeyCode::Char('s')));
        app.shoot(0.5, 0.9);
        run_countdown(&mut app, &clock);
        app.shoot(0.7, 0.5);

        app.on_key(key(KeyCode::Char('r')));
        let token = app.replay.as_ref().unwrap().token();
        // replay swallows play keys
        app.on_key(key(KeyCode::Char('s')));
        assert_eq!(app.view, View::Replay);

        app.on_key(key(KeyCode::Esc));
        app.on_key(key(KeyCode::Char('s')));
        assert!(token.is_cancelled());
        assert_eq!(app.session.current().unwrap().state, RoundState::Armed);
    }

    #[test]
    fn key_releases_are_ignored() {
        let (mut app, _) = app(Config::default());
        let release = KeyEvent {
            kind: KeyEventKind::Release,
            ..key(KeyCode::Char('q'))
        };
        assert_eq!(app.handle(DefenderEvent::Key(release)), AppAction::Continue);
        assert_eq!(
            app.handle(DefenderEvent::Key(key(KeyCode::Char('q')))),
            AppAction::Quit
        );
    }

    #[test]
    fn stop_key_ends_live_round() {
        let (mut app, _) = app(Config::default());
        app.on_key(key(KeyCode::Char('s')));
        app.on_key(key(KeyCode::Char('x')));
        assert_eq!(app.status, "round stopped");
        assert_eq!(app.session.history().len(), 1);
        assert!(app.session.history().last().unwrap().was_stopped());
    }
}
