//! SH-013: Game configuration store — `<config_dir>/games/<id>.yml`.

use crate::core::types::is_valid_slug;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// What the launcher needs to start an installed game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameEntry {
    /// Directory holding the executable
    pub path: PathBuf,

    #[serde(rename = "exe")]
    pub executable: String,

    #[serde(rename = "realname")]
    pub display_name: String,

    #[serde(rename = "runner")]
    pub runner_name: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct GameConfigFile {
    main: GameEntry,
}

#[derive(Debug, Error)]
pub enum ConfigStoreError {
    #[error("invalid game id '{0}'")]
    InvalidId(String),

    #[error("cannot write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid game config {}: {message}", path.display())]
    Format { path: PathBuf, message: String },
}

/// Where `write_config` persists game entries.
pub trait ConfigStore {
    fn write(&self, game_id: &str, entry: &GameEntry) -> Result<(), ConfigStoreError>;
}

/// YAML file per game under a config directory.
#[derive(Debug, Clone)]
pub struct YamlConfigStore {
    root: PathBuf,
}

impl YamlConfigStore {
    pub fn new(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            root: config_dir.into(),
        }
    }

    pub fn entry_path(&self, game_id: &str) -> PathBuf {
        self.root.join("games").join(format!("{}.yml", game_id))
    }

    /// Load an entry. Returns None if the game has no config yet.
    pub fn load(&self, game_id: &str) -> Result<Option<GameEntry>, ConfigStoreError> {
        check_id(game_id)?;
        let path = self.entry_path(game_id);
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigStoreError::Io {
            path: path.clone(),
            source: e,
        })?;
        let file: GameConfigFile =
            serde_yaml_ng::from_str(&content).map_err(|e| ConfigStoreError::Format {
                path: path.clone(),
                message: e.to_string(),
            })?;
        Ok(Some(file.main))
    }
}

impl ConfigStore for YamlConfigStore {
    fn write(&self, game_id: &str, entry: &GameEntry) -> Result<(), ConfigStoreError> {
        check_id(game_id)?;
        let path = self.entry_path(game_id);
        write_atomic(&path, entry)
    }
}

/// Ids become file names; reject anything that could escape the directory.
fn check_id(game_id: &str) -> Result<(), ConfigStoreError> {
    if is_valid_slug(game_id) {
        Ok(())
    } else {
        Err(ConfigStoreError::InvalidId(game_id.to_string()))
    }
}

fn write_atomic(path: &Path, entry: &GameEntry) -> Result<(), ConfigStoreError> {
    let io_err = |p: &Path| {
        let p = p.to_path_buf();
        move |e: std::io::Error| ConfigStoreError::Io { path: p, source: e }
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_err(parent))?;
    }
    let file = GameConfigFile { main: entry.clone() };
    let yaml = serde_yaml_ng::to_string(&file).map_err(|e| ConfigStoreError::Format {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    // Temp file + rename
    let tmp_path = path.with_extension("yml.tmp");
    std::fs::write(&tmp_path, yaml).map_err(io_err(&tmp_path))?;
    std::fs::rename(&tmp_path, path).map_err(io_err(path))?;
    Ok(())
}
