//! In-memory collaborators for unit tests.

use crate::collaborators::archive::ArchiveFormat;
use crate::collaborators::config_store::{ConfigStore, ConfigStoreError, GameEntry};
use crate::collaborators::fs::{Filesystem, FsError};
use crate::collaborators::runner::{Runner, RunnerError};
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet};
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Tracks which paths exist and logs every mutating call.
#[derive(Debug, Default)]
pub(crate) struct FakeFilesystem {
    paths: RefCell<BTreeSet<PathBuf>>,
    contents: RefCell<BTreeMap<PathBuf, Vec<u8>>>,
    calls: RefCell<Vec<String>>,
    cancel_on_call: Option<Arc<AtomicBool>>,
}

impl FakeFilesystem {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_file(self, path: &str, content: &[u8]) -> Self {
        self.paths.borrow_mut().insert(PathBuf::from(path));
        self.contents
            .borrow_mut()
            .insert(PathBuf::from(path), content.to_vec());
        self
    }

    pub(crate) fn with_dir(self, path: &str) -> Self {
        self.paths.borrow_mut().insert(PathBuf::from(path));
        self
    }

    /// Raise `flag` on the first mutating call, as a user cancelling mid-install would.
    pub(crate) fn cancelling(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel_on_call = Some(flag);
        self
    }

    /// Mutating calls in the order they happened, successful or not.
    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    fn log(&self, call: String) {
        self.calls.borrow_mut().push(call);
        if let Some(flag) = &self.cancel_on_call {
            flag.store(true, Ordering::SeqCst);
        }
    }

    fn require(&self, path: &Path) -> Result<(), FsError> {
        if self.paths.borrow().contains(path) {
            Ok(())
        } else {
            Err(FsError::NotFound(path.to_path_buf()))
        }
    }
}

impl Filesystem for FakeFilesystem {
    fn exists(&self, path: &Path) -> bool {
        self.paths.borrow().contains(path)
    }

    fn move_path(&self, src: &Path, dst: &Path) -> Result<(), FsError> {
        self.log(format!("move {} -> {}", src.display(), dst.display()));
        self.require(src)?;
        if self.exists(dst) {
            return Err(FsError::AlreadyExists(dst.to_path_buf()));
        }
        self.paths.borrow_mut().remove(src);
        self.paths.borrow_mut().insert(dst.to_path_buf());
        let moved = self.contents.borrow_mut().remove(src);
        if let Some(data) = moved {
            self.contents.borrow_mut().insert(dst.to_path_buf(), data);
        }
        Ok(())
    }

    fn copy_tree(&self, src: &Path, dst: &Path) -> Result<(), FsError> {
        self.log(format!("copy {} -> {}", src.display(), dst.display()));
        self.require(src)?;
        self.paths.borrow_mut().insert(dst.to_path_buf());
        let copied = self.contents.borrow().get(src).cloned();
        if let Some(data) = copied {
            self.contents.borrow_mut().insert(dst.to_path_buf(), data);
        }
        Ok(())
    }

    fn create_dir(&self, path: &Path) -> Result<(), FsError> {
        self.log(format!("mkdir {}", path.display()));
        if self.exists(path) {
            return Err(FsError::AlreadyExists(path.to_path_buf()));
        }
        self.paths.borrow_mut().insert(path.to_path_buf());
        Ok(())
    }

    fn extract(&self, archive: &Path, dst: &Path, format: ArchiveFormat) -> Result<(), FsError> {
        self.log(format!(
            "extract {} -> {} ({})",
            archive.display(),
            dst.display(),
            format
        ));
        self.require(archive)?;
        self.paths.borrow_mut().insert(dst.to_path_buf());
        Ok(())
    }

    fn open(&self, path: &Path) -> Result<Box<dyn Read>, FsError> {
        match self.contents.borrow().get(path) {
            Some(data) => Ok(Box::new(Cursor::new(data.clone()))),
            None => Err(FsError::NotFound(path.to_path_buf())),
        }
    }
}

/// A runner whose installed state flips when `install` succeeds.
#[derive(Debug)]
pub(crate) struct FakeRunner {
    name: String,
    installed: Cell<bool>,
    installable: bool,
    installs: Cell<usize>,
    dependency: Option<Box<FakeRunner>>,
}

impl FakeRunner {
    fn build(name: &str, installed: bool, installable: bool) -> Self {
        Self {
            name: name.to_string(),
            installed: Cell::new(installed),
            installable,
            installs: Cell::new(0),
            dependency: None,
        }
    }

    pub(crate) fn installed(name: &str) -> Self {
        Self::build(name, true, true)
    }

    pub(crate) fn missing(name: &str) -> Self {
        Self::build(name, false, true)
    }

    /// Missing, and installing it fails.
    pub(crate) fn broken(name: &str) -> Self {
        Self::build(name, false, false)
    }

    pub(crate) fn with_dependency(mut self, dependency: FakeRunner) -> Self {
        self.dependency = Some(Box::new(dependency));
        self
    }

    pub(crate) fn install_count(&self) -> usize {
        self.installs.get()
    }
}

impl Runner for FakeRunner {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_installed(&self) -> bool {
        self.installed.get()
    }

    fn install(&self) -> Result<(), RunnerError> {
        if !self.installable {
            return Err(RunnerError::NoPackage(self.name.clone()));
        }
        self.installs.set(self.installs.get() + 1);
        self.installed.set(true);
        Ok(())
    }

    fn depends(&self) -> Option<&dyn Runner> {
        self.dependency.as_deref().map(|r| r as &dyn Runner)
    }
}

/// Records every write; optionally refuses them.
#[derive(Debug, Default)]
pub(crate) struct MemoryStore {
    writes: RefCell<Vec<(String, GameEntry)>>,
    fail: bool,
}

impl MemoryStore {
    pub(crate) fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub(crate) fn writes(&self) -> Vec<(String, GameEntry)> {
        self.writes.borrow().clone()
    }
}

impl ConfigStore for MemoryStore {
    fn write(&self, game_id: &str, entry: &GameEntry) -> Result<(), ConfigStoreError> {
        if self.fail {
            return Err(ConfigStoreError::InvalidId(game_id.to_string()));
        }
        self.writes
            .borrow_mut()
            .push((game_id.to_string(), entry.clone()));
        Ok(())
    }
}
