//! SH-012: Runners — the program a game is played through (wine, dosbox, ...).
//!
//! A runner is installed when its executable is on `PATH`. Missing runners
//! are installed through the distribution package manager, elevated with
//! `pkexec` unless configured otherwise. A runner may name a PPA that is
//! added before its package is installed on apt-based systems.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use thiserror::Error;
use tracing::{debug, info, warn};

const OS_RELEASE: &str = "/etc/os-release";

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("runner '{0}' has no package and cannot be installed automatically")]
    NoPackage(String),

    #[error("unsupported distribution; install '{0}' manually")]
    UnsupportedDistribution(String),

    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("installing '{runner}' failed (exit {code}): {stderr}")]
    InstallFailed {
        runner: String,
        code: i32,
        stderr: String,
    },
}

/// Something a game can be run through.
pub trait Runner {
    fn name(&self) -> &str;

    fn is_installed(&self) -> bool;

    /// Install the runner if it is missing.
    fn install(&self) -> Result<(), RunnerError>;

    /// Another runner this one needs first.
    fn depends(&self) -> Option<&dyn Runner> {
        None
    }
}

/// Supported package managers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageManager {
    Apt,
    Dnf,
}

impl PackageManager {
    /// Pick a package manager from `/etc/os-release` content.
    pub fn from_os_release(content: &str) -> Option<Self> {
        let mut ids = Vec::new();
        for line in content.lines() {
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            if key == "ID" || key == "ID_LIKE" {
                let value = value.trim().trim_matches('"');
                ids.extend(value.split_whitespace().map(str::to_ascii_lowercase));
            }
        }
        ids.iter().find_map(|id| match id.as_str() {
            "debian" | "ubuntu" => Some(Self::Apt),
            "fedora" | "rhel" | "centos" => Some(Self::Dnf),
            _ => None,
        })
    }

    pub fn detect() -> Option<Self> {
        let content = std::fs::read_to_string(OS_RELEASE).ok()?;
        Self::from_os_release(&content)
    }

    /// Program and arguments that install `package` non-interactively.
    pub fn install_command(self, package: &str) -> (&'static str, Vec<String>) {
        match self {
            Self::Apt => (
                "apt-get",
                vec!["-y".into(), "install".into(), package.to_string()],
            ),
            Self::Dnf => ("dnf", vec!["-y".into(), "install".into(), package.to_string()]),
        }
    }

    /// Commands that add `ppa` and refresh the package index. `None` where
    /// PPAs do not exist.
    pub fn repository_commands(self, ppa: &str) -> Option<Vec<(&'static str, Vec<String>)>> {
        match self {
            Self::Apt => Some(vec![
                ("add-apt-repository", vec!["-y".into(), ppa.to_string()]),
                ("apt-get", vec!["update".into()]),
            ]),
            Self::Dnf => None,
        }
    }
}

/// A runner found on the host system.
#[derive(Debug, Clone)]
pub struct SystemRunner {
    name: String,
    executable: Option<String>,
    package: Option<String>,
    ppa: Option<String>,
    dependency: Option<Box<SystemRunner>>,
    elevate: Option<String>,
    manager: Option<PackageManager>,
}

impl SystemRunner {
    /// A runner whose executable and package share its name.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            executable: Some(name.to_string()),
            package: None,
            ppa: None,
            dependency: None,
            elevate: Some("pkexec".to_string()),
            manager: None,
        }
    }

    /// Runners known out of the box. Unknown names get `None`.
    pub fn builtin(name: &str) -> Option<Self> {
        let (executable, package, depends) = match name {
            "linux" => (None, None, None),
            "wine" => (Some("wine"), Some("wine"), None),
            "winesteam" => (None, None, Some("wine")),
            "dosbox" => (Some("dosbox"), Some("dosbox"), None),
            "scummvm" => (Some("scummvm"), Some("scummvm"), None),
            "mednafen" => (Some("mednafen"), Some("mednafen"), None),
            _ => return None,
        };
        let mut runner = Self::new(name);
        runner.executable = executable.map(str::to_string);
        runner.package = package.map(str::to_string);
        runner.dependency = depends.and_then(Self::builtin).map(Box::new);
        Some(runner)
    }

    /// The builtin runner, or a bare one that is looked up on `PATH` by name.
    pub fn lookup(name: &str) -> Self {
        Self::builtin(name).unwrap_or_else(|| Self::new(name))
    }

    pub fn with_package(mut self, package: &str) -> Self {
        self.package = Some(package.to_string());
        self
    }

    /// Repository to add before installing, e.g. `ppa:lutris-team/lutris`.
    pub fn with_ppa(mut self, ppa: &str) -> Self {
        self.ppa = Some(ppa.to_string());
        self
    }

    /// Privilege escalation wrapper; `None` runs the package manager directly.
    pub fn with_elevate(mut self, elevate: Option<String>) -> Self {
        self.elevate = elevate;
        if let Some(dep) = self.dependency.as_mut() {
            dep.elevate = self.elevate.clone();
        }
        self
    }

    pub fn with_package_manager(mut self, manager: PackageManager) -> Self {
        self.manager = Some(manager);
        if let Some(dep) = self.dependency.as_mut() {
            dep.manager = Some(manager);
        }
        self
    }
}

impl SystemRunner {
    fn command(&self, program: &str, args: &[String]) -> Command {
        let mut cmd = match &self.elevate {
            Some(wrapper) => {
                let mut c = Command::new(wrapper);
                c.arg(program);
                c
            }
            None => Command::new(program),
        };
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd
    }

    fn run_elevated(&self, program: &str, args: &[String]) -> Result<(), RunnerError> {
        let output = self
            .command(program, args)
            .output()
            .map_err(|e| RunnerError::Spawn {
                program: program.to_string(),
                source: e,
            })?;
        if !output.status.success() {
            return Err(RunnerError::InstallFailed {
                runner: self.name.clone(),
                code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

impl Runner for SystemRunner {
    fn name(&self) -> &str {
        &self.name
    }

    /// A runner without an executable needs nothing on the host.
    fn is_installed(&self) -> bool {
        match &self.executable {
            Some(exe) => find_executable(exe).is_some(),
            None => true,
        }
    }

    fn install(&self) -> Result<(), RunnerError> {
        if self.is_installed() {
            return Ok(());
        }
        let package = self
            .package
            .as_deref()
            .ok_or_else(|| RunnerError::NoPackage(self.name.clone()))?;
        let manager = self
            .manager
            .or_else(PackageManager::detect)
            .ok_or_else(|| RunnerError::UnsupportedDistribution(package.to_string()))?;

        if let Some(ppa) = &self.ppa {
            match manager.repository_commands(ppa) {
                Some(commands) => {
                    info!(runner = %self.name, ppa, "adding package repository");
                    for (program, args) in commands {
                        self.run_elevated(program, &args)?;
                    }
                }
                None => warn!(runner = %self.name, ppa, "PPAs need apt; skipping"),
            }
        }

        let (program, args) = manager.install_command(package);
        info!(runner = %self.name, package, "installing runner");
        self.run_elevated(program, &args)
    }

    fn depends(&self) -> Option<&dyn Runner> {
        self.dependency.as_deref().map(|r| r as &dyn Runner)
    }
}

/// Find `name` on `PATH`. Names containing a separator are checked as paths.
pub fn find_executable(name: &str) -> Option<PathBuf> {
    if name.contains('/') {
        let path = Path::new(name);
        return path.is_file().then(|| path.to_path_buf());
    }
    let paths = std::env::var_os("PATH")?;
    let found = std::env::split_paths(&paths)
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_file());
    debug!(name, found = ?found, "executable lookup");
    found
}
