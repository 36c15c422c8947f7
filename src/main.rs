use anyhow::{Context, Result};
use clap::{error::ErrorKind, Args, CommandFactory, Parser, Subcommand};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use defender::{
    app::{self, App},
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore},
    history::{export_csv, HistoryStats, Namespace, RoundHistory},
    round::Mode,
    runtime::{CrosstermEventSource, FixedTicker, Runner},
    store::{KeyValueStore, MemoryStore, SqliteStore},
    util::format_secs,
    Session, SessionSettings, SystemClock,
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{
    fs::{self, File, OpenOptions},
    io::{self, stdin, Write},
    path::{Path, PathBuf},
    time::Duration,
};

const TICK_RATE_MS: u64 = 50;

/// target practice in the terminal: bullseye, tic-tac-toe, quick-draw duels and intruder drills
#[derive(Parser, Debug, Clone)]
#[command(
    version,
    about,
    args_conflicts_with_subcommands = true,
    long_about = "Shoot the target with the mouse (or anything that clicks). Rounds are armed, counted down and scored locally; finished rounds can be replayed and exported."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    play: PlayArgs,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
enum Command {
    /// play rounds in the terminal (default)
    Play(PlayArgs),
    /// list stored rounds, newest first
    History {
        /// print aggregate stats after the list
        #[arg(long)]
        stats: bool,

        /// directory holding the round database
        #[arg(long)]
        state_dir: Option<PathBuf>,
    },
    /// write stored rounds to a csv file
    Export {
        /// destination csv file
        out: PathBuf,

        /// directory holding the round database
        #[arg(long)]
        state_dir: Option<PathBuf>,
    },
}

#[derive(Args, Debug, Clone, Default, PartialEq)]
struct PlayArgs {
    /// game mode for new rounds
    #[arg(short, long, value_enum)]
    mode: Option<Mode>,

    /// shots per bullseye round
    #[arg(short = 'n', long = "shots")]
    shots: Option<u32>,

    /// distance to the screen, kept with each round
    #[arg(short, long)]
    yards: Option<u32>,

    /// drop hits arriving within this many milliseconds of the last one
    #[arg(long)]
    cooldown_ms: Option<u64>,

    /// keep rounds in memory only
    #[arg(long)]
    ephemeral: bool,

    /// directory holding the round database, log and config
    #[arg(long)]
    state_dir: Option<PathBuf>,
}

impl PlayArgs {
    /// Overlay the flags that were given onto `cfg`
    fn apply(&self, cfg: &mut Config) {
        if let Some(mode) = self.mode {
            cfg.mode = mode;
        }
        if let Some(shots) = self.shots {
            cfg.shots_goal = shots.max(1);
        }
        if let Some(yards) = self.yards {
            cfg.yards = yards;
        }
        if let Some(cooldown_ms) = self.cooldown_ms {
            cfg.cooldown_ms = cooldown_ms;
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Command::Play(cli.play)) {
        Command::Play(args) => play(args),
        Command::History { stats, state_dir } => {
            let dirs = resolve_dirs(state_dir.as_deref())?;
            init_logging(&dirs)?;
            let history = load_history(&dirs)?;
            print_history(&history, stats, &mut io::stdout().lock())
        }
        Command::Export { out, state_dir } => {
            let dirs = resolve_dirs(state_dir.as_deref())?;
            init_logging(&dirs)?;
            let history = load_history(&dirs)?;
            let file =
                File::create(&out).with_context(|| format!("creating {}", out.display()))?;
            export_csv(history.records(), file)?;
            println!("exported {} rounds to {}", history.len(), out.display());
            Ok(())
        }
    }
}

fn resolve_dirs(state_dir: Option<&Path>) -> Result<AppDirs> {
    AppDirs::resolve(state_dir).context("could not determine a state directory")
}

/// Log to `<state_dir>/defender.log`; the terminal belongs to the UI
fn init_logging(dirs: &AppDirs) -> Result<()> {
    fs::create_dir_all(dirs.state_dir())
        .with_context(|| format!("creating {}", dirs.state_dir().display()))?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(dirs.log_path())
        .with_context(|| format!("opening {}", dirs.log_path().display()))?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .try_init()?;
    Ok(())
}

fn load_history(dirs: &AppDirs) -> Result<RoundHistory> {
    let store = SqliteStore::open(dirs.db_path())?;
    Ok(RoundHistory::load(&store, Namespace::Pointer.key()))
}

fn print_history<W: Write>(history: &RoundHistory, stats: bool, out: &mut W) -> Result<()> {
    if history.is_empty() {
        writeln!(out, "No rounds yet.")?;
        return Ok(());
    }

    for summary in history.summaries() {
        let mut line = summary.label();
        if summary.total_score > 0 {
            line.push_str(&format!(" | score {}", summary.total_score));
        }
        if let Some(reaction) = summary.reaction {
            line.push_str(&format!(" | reaction {}", format_secs(Some(reaction))));
        }
        if summary.stopped {
            line.push_str(" | stopped");
        }
        writeln!(out, "{line}")?;
    }

    if stats {
        let stats = HistoryStats::from_records(history.records());
        writeln!(out)?;
        writeln!(out, "rounds: {}", stats.rounds)?;
        for (mode, count) in &stats.per_mode {
            writeln!(out, "  {mode}: {count}")?;
        }
        if let Some(best) = stats.best_bullseye {
            writeln!(out, "best bullseye: {best}")?;
        }
        if let Some(mean) = stats.mean_bullseye {
            writeln!(out, "mean bullseye: {mean:.1}")?;
        }
        writeln!(
            out,
            "reaction: {} (std dev {})",
            format_secs(stats.mean_reaction),
            format_secs(stats.reaction_std_dev)
        )?;
    }
    Ok(())
}

fn config_store(args: &PlayArgs, dirs: &AppDirs) -> FileConfigStore {
    match &args.state_dir {
        Some(_) => FileConfigStore::with_path(dirs.state_dir().join("config.json")),
        None => FileConfigStore::new(),
    }
}

fn play(args: PlayArgs) -> Result<()> {
    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let dirs = resolve_dirs(args.state_dir.as_deref())?;
    init_logging(&dirs)?;

    let config_store = config_store(&args, &dirs);
    let mut cfg = config_store.load();
    args.apply(&mut cfg);
    if let Err(e) = config_store.save(&cfg) {
        log::warn!("could not save config: {e}");
    }

    let store: Box<dyn KeyValueStore> = if args.ephemeral {
        Box::new(MemoryStore::new())
    } else {
        Box::new(SqliteStore::open(dirs.db_path())?)
    };
    let session = Session::new(
        SystemClock::new(),
        store,
        Namespace::Pointer,
        SessionSettings::from(&cfg),
    );
    let mut app = App::new(session, &cfg);
    log::info!("starting play: {cfg:?}");

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );
    let result = app::run(&mut terminal, &mut app, &runner);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}
