//! SH-026: `write_config` — persist the game entry the launcher starts from.

use super::target_path;
use crate::collaborators::config_store::GameEntry;
use crate::core::context::{InstallContext, Scope};
use crate::core::error::{ExecutionError, FailureKind};
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::info;

const FILE_URL_PREFIX: &str = "file://";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct WriteConfigParams {
    /// Full path of the game executable
    pub file: String,
}

/// `write_config: <path>` or `write_config: {file}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum WriteConfigSpec {
    Path(String),
    Full(WriteConfigParams),
}

impl From<WriteConfigSpec> for WriteConfigParams {
    fn from(spec: WriteConfigSpec) -> Self {
        match spec {
            WriteConfigSpec::Path(file) => WriteConfigParams { file },
            WriteConfigSpec::Full(p) => p,
        }
    }
}

pub(crate) fn apply(
    p: &WriteConfigParams,
    scope: &Scope,
    ctx: &InstallContext,
) -> Result<(), ExecutionError> {
    let raw = scope.text(&p.file);
    let stripped = raw.strip_prefix(FILE_URL_PREFIX).unwrap_or(&raw);
    let full = target_path(stripped, scope, ctx);

    let (dir, exe) = match (full.parent(), full.file_name()) {
        (Some(dir), Some(exe)) => (dir.to_path_buf(), exe.to_string_lossy().to_string()),
        _ => {
            return Err(ExecutionError::new(
                FailureKind::Config,
                format!("'{}' does not name an executable", full.display()),
            ))
        }
    };

    let entry = GameEntry {
        path: dir,
        executable: exe,
        display_name: scope.game.name.clone(),
        runner_name: scope.game.runner.clone(),
    };
    info!(game = %scope.game.slug, exe = %entry.executable, "write config");
    ctx.store().write(&scope.game.slug, &entry).map_err(|e| {
        ExecutionError::new(
            FailureKind::Config,
            format!("cannot save config for '{}': {}", scope.game.slug, e),
        )
    })
}
