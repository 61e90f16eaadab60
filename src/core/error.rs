//! SH-002: Error taxonomy for parsing, validation, resolution, and execution.
//!
//! Every error the interpreter produces is one of four structured kinds.
//! `InstallError` wraps them so a single collector can hold the full audit
//! trail of an install attempt.

use crate::collaborators::fs::FsError;
use std::fmt;
use thiserror::Error;

/// How an error affects the phase that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Collected; the phase continues.
    Advisory,
    /// Stops the current phase immediately.
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Advisory => write!(f, "advisory"),
            Self::Fatal => write!(f, "fatal"),
        }
    }
}

/// The recipe is not structurally a recipe.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ParseError {
    pub message: String,
}

impl ParseError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Expected metadata is missing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    pub message: String,
    pub field: Option<String>,
}

impl ValidationError {
    pub fn missing_field(field: &str) -> Self {
        Self {
            message: format!("missing required field '{}'", field),
            field: Some(field.to_string()),
        }
    }

    pub fn invalid_slug(slug: &str) -> Self {
        Self {
            message: format!(
                "game_slug '{}' must be letters, digits, '-', '_' or '.' and not start with '.'",
                slug
            ),
            field: Some("game_slug".to_string()),
        }
    }
}

/// A step cannot be turned into an operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ScriptingError {
    pub message: String,
    pub step: Option<usize>,
    pub command: Option<String>,
}

impl ScriptingError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            step: None,
            command: None,
        }
    }

    /// The one message for every name that is not in the command table.
    /// Leading underscores of internal names are not echoed back.
    pub fn unknown_command(name: &str) -> Self {
        Self {
            message: format!(
                "The command {} does not exists",
                name.trim_start_matches('_')
            ),
            step: None,
            command: Some(name.to_string()),
        }
    }

    /// Attach the step position and command name.
    pub fn at_step(mut self, index: usize, command: &str) -> Self {
        self.step = Some(index);
        self.command = Some(command.to_string());
        self
    }
}

/// Why an operation failed against the environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    NotFound,
    PermissionDenied,
    AlreadyExists,
    Io,
    Process,
    Checksum,
    Runner,
    Config,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NotFound => "not-found",
            Self::PermissionDenied => "permission-denied",
            Self::AlreadyExists => "already-exists",
            Self::Io => "io",
            Self::Process => "process",
            Self::Checksum => "checksum",
            Self::Runner => "runner",
            Self::Config => "config",
        };
        write!(f, "{}", s)
    }
}

/// An operation failed while running.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ExecutionError {
    pub message: String,
    pub kind: FailureKind,
    pub step: Option<usize>,
    pub command: Option<String>,
}

impl ExecutionError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind,
            step: None,
            command: None,
        }
    }

    pub fn at_step(mut self, index: usize, command: &str) -> Self {
        self.step = Some(index);
        self.command = Some(command.to_string());
        self
    }

    /// An existing target is advisory; everything else stops the run.
    pub fn severity(&self) -> Severity {
        match self.kind {
            FailureKind::AlreadyExists => Severity::Advisory,
            _ => Severity::Fatal,
        }
    }
}

impl From<FsError> for ExecutionError {
    fn from(err: FsError) -> Self {
        let kind = match &err {
            FsError::NotFound(_) => FailureKind::NotFound,
            FsError::PermissionDenied(_) => FailureKind::PermissionDenied,
            FsError::AlreadyExists(_) => FailureKind::AlreadyExists,
            FsError::Unsupported(_) | FsError::Io { .. } => FailureKind::Io,
        };
        Self::new(kind, err.to_string())
    }
}

/// Any error recorded during an install attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InstallError {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
    #[error("scripting error: {0}")]
    Scripting(#[from] ScriptingError),
    #[error("execution error: {0}")]
    Execution(#[from] ExecutionError),
}

impl InstallError {
    pub fn severity(&self) -> Severity {
        match self {
            Self::Validation(_) => Severity::Advisory,
            Self::Execution(e) => e.severity(),
            Self::Parse(_) | Self::Scripting(_) => Severity::Fatal,
        }
    }

    /// Step position, when the error belongs to a step.
    pub fn step(&self) -> Option<usize> {
        match self {
            Self::Scripting(e) => e.step,
            Self::Execution(e) => e.step,
            Self::Parse(_) | Self::Validation(_) => None,
        }
    }

    /// Bare message without the kind prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::Parse(e) => &e.message,
            Self::Validation(e) => &e.message,
            Self::Scripting(e) => &e.message,
            Self::Execution(e) => &e.message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_sh002_unknown_command_message() {
        let e = ScriptingError::unknown_command("teleport");
        assert_eq!(e.to_string(), "The command teleport does not exists");
        assert_eq!(e.command.as_deref(), Some("teleport"));
    }

    #[test]
    fn test_sh002_internal_name_marker_stripped() {
        let e = ScriptingError::unknown_command("__substitute");
        assert_eq!(e.to_string(), "The command substitute does not exists");
        assert_eq!(e.command.as_deref(), Some("__substitute"));
    }

    #[test]
    fn test_sh002_invalid_slug_names_field() {
        let e = ValidationError::invalid_slug("../x");
        assert!(e.message.contains("../x"));
        assert_eq!(e.field.as_deref(), Some("game_slug"));
    }

    #[test]
    fn test_sh002_missing_field_names_field() {
        let e = ValidationError::missing_field("game_slug");
        assert!(e.message.contains("game_slug"));
        assert_eq!(e.field.as_deref(), Some("game_slug"));
    }

    #[test]
    fn test_sh002_severity_by_kind() {
        let advisory: InstallError = ValidationError::missing_field("name").into();
        assert_eq!(advisory.severity(), Severity::Advisory);

        let fatal: InstallError = ScriptingError::new("bad").into();
        assert_eq!(fatal.severity(), Severity::Fatal);

        let exists: InstallError =
            ExecutionError::new(FailureKind::AlreadyExists, "exists").into();
        assert_eq!(exists.severity(), Severity::Advisory);

        let missing: InstallError = ExecutionError::new(FailureKind::NotFound, "gone").into();
        assert_eq!(missing.severity(), Severity::Fatal);
    }

    #[test]
    fn test_sh002_fs_error_classification() {
        let e: ExecutionError = FsError::NotFound(PathBuf::from("/tmp/a")).into();
        assert_eq!(e.kind, FailureKind::NotFound);
        let e: ExecutionError = FsError::PermissionDenied(PathBuf::from("/root")).into();
        assert_eq!(e.kind, FailureKind::PermissionDenied);
        let e: ExecutionError = FsError::AlreadyExists(PathBuf::from("/tmp/b")).into();
        assert_eq!(e.kind, FailureKind::AlreadyExists);
    }

    #[test]
    fn test_sh002_step_attached() {
        let e: InstallError = ScriptingError::new("x").at_step(3, "move").into();
        assert_eq!(e.step(), Some(3));
        assert_eq!(e.message(), "x");
    }
}
