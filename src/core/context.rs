//! SH-006: Install context — where and against what a recipe installs.
//!
//! The context is owned by the caller and borrowed by the interpreter for
//! one run. It carries the target paths, the environment for spawned
//! programs, and the three collaborators operations act through.

use super::substitute::Variables;
use super::types::Recipe;
use crate::collaborators::config_store::ConfigStore;
use crate::collaborators::fs::Filesystem;
use crate::collaborators::runner::Runner;
use indexmap::IndexMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Caller-owned working context for an install attempt.
pub struct InstallContext<'a> {
    /// Final install location of the game
    pub game_dir: PathBuf,

    /// Downloaded installers and archives
    pub cache_dir: PathBuf,

    /// Working directory for `execute` steps
    pub working_dir: PathBuf,

    /// Extra environment for spawned programs (also usable as `$VAR`)
    pub env: IndexMap<String, String>,

    /// Where to append the install journal, if anywhere
    pub journal_dir: Option<PathBuf>,

    cancel: Option<Arc<AtomicBool>>,
    fs: &'a dyn Filesystem,
    runner: &'a dyn Runner,
    store: &'a dyn ConfigStore,
}

impl<'a> InstallContext<'a> {
    pub fn new(
        game_dir: impl Into<PathBuf>,
        fs: &'a dyn Filesystem,
        runner: &'a dyn Runner,
        store: &'a dyn ConfigStore,
    ) -> Self {
        let game_dir = game_dir.into();
        Self {
            cache_dir: game_dir.join(".cache"),
            working_dir: game_dir.clone(),
            game_dir,
            env: IndexMap::new(),
            journal_dir: None,
            cancel: None,
            fs,
            runner,
            store,
        }
    }

    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = dir.into();
        self
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = dir.into();
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn with_journal(mut self, dir: impl Into<PathBuf>) -> Self {
        self.journal_dir = Some(dir.into());
        self
    }

    /// Share a flag the caller sets to abandon the run between steps.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }

    pub fn fs(&self) -> &dyn Filesystem {
        self.fs
    }

    pub fn runner(&self) -> &dyn Runner {
        self.runner
    }

    pub fn store(&self) -> &dyn ConfigStore {
        self.store
    }
}

/// The game a recipe installs, as named by its metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameIdentity {
    pub slug: String,
    pub name: String,
    pub runner: String,
}

impl GameIdentity {
    pub fn from_recipe(recipe: &Recipe) -> Self {
        Self {
            slug: recipe.game_slug().unwrap_or_default(),
            name: recipe.name().unwrap_or_default(),
            runner: recipe.runner().unwrap_or_default(),
        }
    }
}

/// Per-run values shared by every operation.
#[derive(Debug, Clone)]
pub struct Scope {
    pub game: GameIdentity,
    pub vars: Variables,
}

impl Scope {
    pub fn new(game: GameIdentity, ctx: &InstallContext) -> Self {
        let mut vars = Variables::new();
        if let Ok(home) = std::env::var("HOME") {
            vars.set("HOME", home);
        }
        for (key, value) in &ctx.env {
            vars.set(key, value.clone());
        }
        vars.set("GAMEDIR", path_string(&ctx.game_dir));
        vars.set("CACHE", path_string(&ctx.cache_dir));
        vars.set("GAME_SLUG", game.slug.clone());
        vars.set("NAME", game.name.clone());
        vars.set("RUNNER", game.runner.clone());
        Self { game, vars }
    }

    /// Substitute variables and return a path.
    pub(crate) fn path(&self, raw: &str) -> PathBuf {
        PathBuf::from(self.vars.substitute(raw))
    }

    pub(crate) fn text(&self, raw: &str) -> String {
        self.vars.substitute(raw)
    }
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().to_string()
}
