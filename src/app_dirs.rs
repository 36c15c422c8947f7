use directories::ProjectDirs;
use std::path::{Path, PathBuf};

const APP_NAME: &str = "defender";

/// Centralized application directory resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppDirs {
    state_dir: PathBuf,
}

impl AppDirs {
    /// `override_dir` wins, then `$HOME/.local/state/defender`, then the
    /// platform data dir
    pub fn resolve(override_dir: Option<&Path>) -> Option<Self> {
        if let Some(dir) = override_dir {
            return Some(Self::at(dir));
        }
        if let Ok(home) = std::env::var("HOME") {
            let state_dir = PathBuf::from(home)
                .join(".local")
                .join("state")
                .join(APP_NAME);
            return Some(Self { state_dir });
        }
        ProjectDirs::from("", "", APP_NAME).map(|proj_dirs| Self {
            state_dir: proj_dirs.data_local_dir().to_path_buf(),
        })
    }

    pub fn at<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            state_dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn state_dir(&self) -> &Path {
        &self.state_dir
    }

    pub fn db_path(&self) -> PathBuf {
        self.state_dir.join("defender.db")
    }

    pub fn log_path(&self) -> PathBuf {
        self.state_dir.join("defender.log")
    }
}
