//! SH-017: Settings — where games, caches, configs, and journals live.
//!
//! `settings.toml` under the config directory. A missing file means
//! defaults; a partial file fills the rest from defaults. Defaults follow
//! the XDG base directories.

use super::types::is_valid_slug;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

const APP_DIR: &str = "stagehand";
const SETTINGS_FILE: &str = "settings.toml";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("cannot access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid settings {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("cannot encode settings: {0}")]
    Encode(String),

    #[error("invalid settings: {0}")]
    Invalid(String),

    #[error("game slug '{0}' is not a single path component")]
    InvalidSlug(String),
}

/// User settings (TOML).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Each game installs into `<games_dir>/<game_slug>`
    pub games_dir: PathBuf,

    /// Downloads, per game under `<cache_dir>/<game_slug>`
    pub cache_dir: PathBuf,

    /// Game entries written by `write_config`
    pub config_dir: PathBuf,

    /// Install journals
    pub state_dir: PathBuf,

    pub library_path: PathBuf,

    /// Privilege wrapper for runner installs; empty runs the package manager directly.
    pub elevate: String,

    /// Append install events to `<state_dir>/<game_slug>/events.jsonl`
    pub journal: bool,
}

impl Default for Settings {
    fn default() -> Self {
        BaseDirs::from_env().settings()
    }
}

impl Settings {
    /// Every directory under one root. Used for portable installs and tests.
    pub fn rooted(root: &Path) -> Self {
        BaseDirs {
            data: root.join("data"),
            config: root.join("config"),
            cache: root.join("cache"),
        }
        .settings()
    }

    /// `$XDG_CONFIG_HOME/stagehand/settings.toml`
    pub fn default_path() -> PathBuf {
        BaseDirs::from_env().config.join(APP_DIR).join(SETTINGS_FILE)
    }

    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path).map_err(|e| SettingsError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let settings: Settings = toml::from_str(&content).map_err(|e| SettingsError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        settings.validate()?;
        Ok(settings)
    }

    /// Defaults when `path` does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load(path)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        let dirs = [
            ("games_dir", &self.games_dir),
            ("cache_dir", &self.cache_dir),
            ("config_dir", &self.config_dir),
            ("state_dir", &self.state_dir),
            ("library_path", &self.library_path),
        ];
        for (key, dir) in dirs {
            if dir.as_os_str().is_empty() {
                return Err(SettingsError::Invalid(format!("{} must not be empty", key)));
            }
        }
        Ok(())
    }

    /// Atomically write settings (temp file + rename).
    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        self.validate()?;
        let io_err = |p: &Path, e: std::io::Error| SettingsError::Io {
            path: p.to_path_buf(),
            source: e,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
        }
        let mut buf =
            toml::to_string_pretty(self).map_err(|e| SettingsError::Encode(e.to_string()))?;
        buf.push('\n');
        let tmp_path = path.with_extension("toml.tmp");
        std::fs::write(&tmp_path, buf).map_err(|e| io_err(&tmp_path, e))?;
        std::fs::rename(&tmp_path, path).map_err(|e| io_err(path, e))
    }

    /// `<games_dir>/<slug>`. Slugs that could leave `games_dir` are refused.
    pub fn game_dir(&self, slug: &str) -> Result<PathBuf, SettingsError> {
        check_slug(slug).map(|()| self.games_dir.join(slug))
    }

    pub fn game_cache(&self, slug: &str) -> Result<PathBuf, SettingsError> {
        check_slug(slug).map(|()| self.cache_dir.join(slug))
    }

    /// `None` when runner installs should not be elevated.
    pub fn elevate_command(&self) -> Option<String> {
        let trimmed = self.elevate.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }
}

fn check_slug(slug: &str) -> Result<(), SettingsError> {
    if is_valid_slug(slug) {
        Ok(())
    } else {
        Err(SettingsError::InvalidSlug(slug.to_string()))
    }
}

/// XDG base directories.
#[derive(Debug, Clone, PartialEq, Eq)]
struct BaseDirs {
    data: PathBuf,
    config: PathBuf,
    cache: PathBuf,
}

impl BaseDirs {
    fn from_env() -> Self {
        Self::resolve(|key| std::env::var(key).ok())
    }

    /// XDG variable if set and absolute, else the `$HOME` fallback.
    fn resolve(var: impl Fn(&str) -> Option<String>) -> Self {
        let home = var("HOME").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));
        let pick = |key: &str, fallback: &[&str]| {
            var(key)
                .map(PathBuf::from)
                .filter(|p| p.is_absolute())
                .unwrap_or_else(|| fallback.iter().fold(home.clone(), |acc, part| acc.join(part)))
        };
        Self {
            data: pick("XDG_DATA_HOME", &[".local", "share"]),
            config: pick("XDG_CONFIG_HOME", &[".config"]),
            cache: pick("XDG_CACHE_HOME", &[".cache"]),
        }
    }

    fn settings(&self) -> Settings {
        let data = self.data.join(APP_DIR);
        Settings {
            games_dir: data.join("games"),
            cache_dir: self.cache.join(APP_DIR),
            config_dir: self.config.join(APP_DIR),
            state_dir: data.join("state"),
            library_path: data.join("library.db"),
            elevate: "pkexec".to_string(),
            journal: true,
        }
    }
}
