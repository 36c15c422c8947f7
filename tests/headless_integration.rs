use std::sync::mpsc;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use defender::app::{self, App, AppAction, View};
use defender::config::Config;
use defender::runtime::{DefenderEvent, FixedTicker, Runner, TestEventSource};
use defender::{ManualClock, Mode, RoundState, Session, Winner};
use ratatui::{backend::TestBackend, layout::Rect, Terminal};

fn key(c: char) -> DefenderEvent {
    DefenderEvent::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE))
}

/// Click the terminal cell that covers normalized `(x, y)` of the target
fn click(area: Rect, x: f64, y: f64) -> DefenderEvent {
    DefenderEvent::Mouse(MouseEvent {
        kind: MouseEventKind::Down(MouseButton::Left),
        column: area.x + (x * area.width as f64) as u16,
        row: area.y + (y * area.height as f64) as u16,
        modifiers: KeyModifiers::NONE,
    })
}

fn new_app(cfg: &Config) -> (App<ManualClock>, ManualClock) {
    let clock = ManualClock::new();
    (App::new(Session::ephemeral(clock.clone()), cfg), clock)
}

fn draw(terminal: &mut Terminal<TestBackend>, app: &mut App<ManualClock>) {
    terminal
        .draw(|f| defender::ui::draw(app, f))
        .expect("draw to test backend");
}

// Headless flow using the runtime + App without a TTY: mouse clicks on the
// drawn target arm, count down and score a bullseye round.
#[test]
fn headless_bullseye_round_via_mouse() {
    let cfg = Config {
        shots_goal: 2,
        ..Config::default()
    };
    let (mut app, clock) = new_app(&cfg);
    let mut terminal = Terminal::new(TestBackend::new(100, 32)).unwrap();

    let (tx, rx) = mpsc::channel();
    let runner = Runner::new(
        TestEventSource::new(rx),
        FixedTicker::new(Duration::from_millis(2)),
    );

    tx.send(key('s')).unwrap();
    assert_eq!(app.handle(runner.step()), AppAction::Continue);
    draw(&mut terminal, &mut app);
    let area = app.target_area;
    assert!(area.height >= 10, "target too small: {area:?}");

    tx.send(click(area, 0.5, 0.9)).unwrap();
    app.handle(runner.step());
    assert_eq!(
        app.session.current().map(|r| r.state),
        Some(RoundState::Countdown)
    );

    // ticks arrive on timeout; move the clock past each countdown step
    for _ in 0..3 {
        clock.advance(Duration::from_millis(700));
        app.handle(runner.step());
    }
    assert_eq!(app.session.current().map(|r| r.state), Some(RoundState::Active));

    tx.send(click(area, 0.5, 0.5)).unwrap();
    tx.send(click(area, 0.98, 0.02)).unwrap();
    app.handle(runner.step());
    app.handle(runner.step());

    let record = app.session.history().last().expect("round recorded");
    assert_eq!(record.shots, 2);
    assert_eq!(record.total_score(), 10);
    assert_eq!(app.status, "finished: 10 points");

    draw(&mut terminal, &mut app);
    let content: String = terminal
        .backend()
        .buffer()
        .content
        .iter()
        .map(|c| c.symbol())
        .collect();
    assert!(content.contains("finished"));
}

#[test]
fn headless_tic_tac_toe_and_replay() {
    let cfg = Config {
        mode: Mode::TicTacToe,
        ..Config::default()
    };
    let (mut app, clock) = new_app(&cfg);

    app.start_round();
    app.shoot(0.5, 0.9);
    for _ in 0..3 {
        clock.advance(Duration::from_millis(700));
        app.on_tick();
    }

    for (x, y) in [(0.1, 0.1), (0.5, 0.1), (0.1, 0.5), (0.5, 0.5), (0.1, 0.9)] {
        clock.advance(Duration::from_millis(300));
        app.shoot(x, y);
    }
    assert_eq!(app.session.snapshot().unwrap().winner, Some(Winner::X));

    app.on_key(KeyEvent::new(KeyCode::Char('r'), KeyModifiers::NONE));
    assert_eq!(app.view, View::Replay);

    let mut seen = Vec::new();
    for _ in 0..40 {
        clock.advance(Duration::from_millis(100));
        app.on_tick();
        let player = app.replay.as_ref().unwrap();
        seen.push(player.visible().len());
        if player.is_stopped() {
            break;
        }
    }
    assert!(seen.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(seen.last(), Some(&5));
    assert!(app.replay.as_ref().unwrap().is_stopped());
}

#[test]
fn run_loop_quits_on_q() {
    let (mut app, _clock) = new_app(&Config::default());
    let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();

    let (tx, rx) = mpsc::channel();
    tx.send(key('m')).unwrap();
    tx.send(key('s')).unwrap();
    tx.send(DefenderEvent::Resize).unwrap();
    tx.send(key('q')).unwrap();
    let runner = Runner::new(
        TestEventSource::new(rx),
        FixedTicker::new(Duration::from_millis(2)),
    );

    app::run(&mut terminal, &mut app, &runner).unwrap();

    let round = app.session.current().expect("round armed before quitting");
    assert_eq!(round.mode, Mode::TicTacToe);
    assert_eq!(round.state, RoundState::Armed);
}
