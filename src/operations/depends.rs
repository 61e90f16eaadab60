//! SH-025: `check_depends` — make sure the runner and its dependency are installed.

use crate::collaborators::runner::Runner;
use crate::core::context::InstallContext;
use crate::core::error::{ExecutionError, FailureKind};
use tracing::info;

pub(crate) fn apply(ctx: &InstallContext) -> Result<(), ExecutionError> {
    let runner = ctx.runner();
    if let Some(dependency) = runner.depends() {
        ensure_installed(dependency)?;
    }
    ensure_installed(runner)
}

fn ensure_installed(runner: &dyn Runner) -> Result<(), ExecutionError> {
    if runner.is_installed() {
        return Ok(());
    }
    info!(runner = runner.name(), "runner missing, installing");
    runner.install().map_err(|e| {
        ExecutionError::new(
            FailureKind::Runner,
            format!("cannot install runner '{}': {}", runner.name(), e),
        )
    })
}
