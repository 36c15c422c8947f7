// Drives the `history` and `export` subcommands against a throwaway state dir.

use std::path::Path;
use std::time::Duration;

use assert_cmd::Command;
use defender::history::Namespace;
use defender::store::SqliteStore;
use defender::{ManualClock, Mode, Session, SessionSettings};

/// Play one intruder round and one stopped bullseye round into `dir`
fn seed(dir: &Path) {
    let clock = ManualClock::new();
    let store = SqliteStore::open(dir.join("defender.db")).unwrap();
    let mut session = Session::new(
        clock.clone(),
        Box::new(store),
        Namespace::Pointer,
        SessionSettings::default(),
    );

    session.start_round(Mode::Intruder, 1, 9);
    session.record_hit(0.5, 0.9);
    for _ in 0..3 {
        clock.advance(Duration::from_millis(700));
        session.on_tick();
    }
    clock.advance(Duration::from_millis(320));
    session.record_hit(0.4, 0.4);

    session.start_round(Mode::Bullseye, 5, 9);
    session.stop();
}

fn defender() -> Command {
    Command::cargo_bin("defender").unwrap()
}

#[test]
fn history_on_empty_state_dir() {
    let dir = tempfile::tempdir().unwrap();
    let output = defender()
        .args(["history", "--state-dir"])
        .arg(dir.path())
        .output()
        .unwrap();

    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "No rounds yet.\n");
    assert!(dir.path().join("defender.log").exists());
}

#[test]
fn history_lists_newest_first_with_stats() {
    let dir = tempfile::tempdir().unwrap();
    seed(dir.path());

    let output = defender()
        .args(["history", "--stats", "--state-dir"])
        .arg(dir.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert!(lines[0].contains("bullseye | yards 9 | shots 0"));
    assert!(lines[0].ends_with("| stopped"));
    assert!(lines[1].contains("intruder | yards 9 | shots 0 | winner user"));
    assert!(lines[1].contains("reaction 0.320s"));
    assert!(stdout.contains("rounds: 2"));
    assert!(stdout.contains("  intruder: 1"));
}

#[test]
fn export_writes_csv() {
    let dir = tempfile::tempdir().unwrap();
    seed(dir.path());
    let out = dir.path().join("rounds.csv");

    let output = defender()
        .arg("export")
        .arg(&out)
        .arg("--state-dir")
        .arg(dir.path())
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("exported 2 rounds"));

    let csv = std::fs::read_to_string(&out).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(
        lines[0],
        "id,when,mode,yards,shots,shots_goal,winner,total_score,reaction,stopped"
    );
    assert!(lines[1].contains(",intruder,9,0,1,user,0,"));
    assert!(lines[2].contains(",bullseye,9,0,5,,0,,true"));
}

#[test]
fn unknown_subcommand_fails() {
    let output = defender().arg("launch").output().unwrap();
    assert!(!output.status.success());
}
