use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::round::Mode;
use crate::session::SessionSettings;

/// Persisted play preferences; CLI flags override and are saved back
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub mode: Mode,
    pub shots_goal: u32,
    pub yards: u32,
    pub countdown_ticks: u32,
    pub countdown_interval_ms: u64,
    pub cooldown_ms: u64,
    pub replay_speed: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: Mode::Bullseye,
            shots_goal: 5,
            yards: 7,
            countdown_ticks: 3,
            countdown_interval_ms: 700,
            cooldown_ms: 0,
            replay_speed: 1.0,
        }
    }
}

impl Config {
    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }
}

impl From<&Config> for SessionSettings {
    fn from(cfg: &Config) -> Self {
        Self {
            countdown_ticks: cfg.countdown_ticks.max(1),
            countdown_interval: Duration::from_millis(cfg.countdown_interval_ms),
            replay_speed: cfg.replay_speed,
            ..SessionSettings::default()
        }
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "defender") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("defender_config.json")
        };
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        let Ok(bytes) = fs::read(&self.path) else {
            return Config::default();
        };
        match serde_json::from_slice::<Config>(&bytes) {
            Ok(cfg) => cfg,
            Err(e) => {
                log::warn!("ignoring unreadable config {}: {e}", self.path.display());
                Config::default()
            }
        }
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)
    }
}
