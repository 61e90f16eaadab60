//! SH-021: `move`, `copy`, and `mkdir`.

use super::{input_path, target_path};
use crate::core::context::{InstallContext, Scope};
use crate::core::error::{ExecutionError, ScriptingError};
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::debug;

/// `{src, dst}` for `move` and `copy`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct TransferParams {
    /// Source path; relative paths are under the cache directory
    pub src: String,
    /// Destination path; relative paths are under the game directory
    pub dst: String,
}

impl TransferParams {
    /// Both paths must be non-blank.
    pub fn check(&self, command: &str) -> Result<(), ScriptingError> {
        for (field, value) in [("src", &self.src), ("dst", &self.dst)] {
            if value.trim().is_empty() {
                return Err(ScriptingError::new(format!(
                    "invalid parameters for '{}': '{}' must not be empty",
                    command, field
                )));
            }
        }
        Ok(())
    }
}

/// A single directory path.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct DirParams(pub String);

pub(crate) fn apply_move(
    p: &TransferParams,
    scope: &Scope,
    ctx: &InstallContext,
) -> Result<(), ExecutionError> {
    let src = input_path(&p.src, scope, ctx);
    let dst = target_path(&p.dst, scope, ctx);
    debug!(src = %src.display(), dst = %dst.display(), "move");
    ctx.fs().move_path(&src, &dst)?;
    Ok(())
}

pub(crate) fn apply_copy(
    p: &TransferParams,
    scope: &Scope,
    ctx: &InstallContext,
) -> Result<(), ExecutionError> {
    let src = input_path(&p.src, scope, ctx);
    let dst = target_path(&p.dst, scope, ctx);
    debug!(src = %src.display(), dst = %dst.display(), "copy");
    ctx.fs().copy_tree(&src, &dst)?;
    Ok(())
}

pub(crate) fn apply_mkdir(
    p: &DirParams,
    scope: &Scope,
    ctx: &InstallContext,
) -> Result<(), ExecutionError> {
    let dir = target_path(&p.0, scope, ctx);
    debug!(dir = %dir.display(), "mkdir");
    ctx.fs().create_dir(&dir)?;
    Ok(())
}
