//! SH-023: `execute` — run an installer or script and wait for it.
//!
//! The program runs in the context's working directory with the context
//! environment added and stdin closed. A non-zero exit fails the step.

use crate::core::context::{InstallContext, Scope};
use crate::core::error::{ExecutionError, FailureKind};
use schemars::JsonSchema;
use serde::Deserialize;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ExecuteParams {
    /// Program name on `PATH`, or a path
    pub file: String,

    #[serde(default)]
    pub args: Vec<String>,
}

/// `execute: <file>` or `execute: {file, args}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum ExecuteSpec {
    Program(String),
    Full(ExecuteParams),
}

impl From<ExecuteSpec> for ExecuteParams {
    fn from(spec: ExecuteSpec) -> Self {
        match spec {
            ExecuteSpec::Program(file) => ExecuteParams {
                file,
                args: Vec::new(),
            },
            ExecuteSpec::Full(p) => p,
        }
    }
}

/// Bare names are looked up on `PATH`; relative paths are under the working directory.
fn program_path(raw: &str, ctx: &InstallContext) -> PathBuf {
    let path = PathBuf::from(raw);
    if raw.contains('/') && path.is_relative() {
        ctx.working_dir.join(path)
    } else {
        path
    }
}

pub(crate) fn apply(
    p: &ExecuteParams,
    scope: &Scope,
    ctx: &InstallContext,
) -> Result<(), ExecutionError> {
    let program = program_path(&scope.text(&p.file), ctx);
    let args: Vec<String> = p.args.iter().map(|a| scope.text(a)).collect();
    info!(program = %program.display(), ?args, "execute");

    let output = Command::new(&program)
        .args(&args)
        .current_dir(&ctx.working_dir)
        .envs(&ctx.env)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| {
            let kind = match e.kind() {
                std::io::ErrorKind::NotFound => FailureKind::NotFound,
                std::io::ErrorKind::PermissionDenied => FailureKind::PermissionDenied,
                _ => FailureKind::Process,
            };
            ExecutionError::new(
                kind,
                format!("failed to run {}: {}", program.display(), e),
            )
        })?;

    debug!(
        stdout = %String::from_utf8_lossy(&output.stdout).trim(),
        "execute output"
    );
    if output.status.success() {
        return Ok(());
    }
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    Err(ExecutionError::new(
        FailureKind::Process,
        format!(
            "{} exited with code {}: {}",
            program.display(),
            output.status.code().unwrap_or(-1),
            stderr
        ),
    ))
}
