//! SH-022: `extract` — unpack an archive into the game directory.

use super::{input_path, target_path};
use crate::collaborators::archive::{detect_format, ArchiveFormat};
use crate::collaborators::fs::FsError;
use crate::core::context::{InstallContext, Scope};
use crate::core::error::ExecutionError;
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ExtractParams {
    /// Archive path; relative paths are under the cache directory
    pub file: String,

    /// Destination, defaults to the game directory
    #[serde(default)]
    pub dst: Option<String>,

    /// Archive format, detected from the file name when omitted
    #[serde(default)]
    pub format: Option<ArchiveFormat>,
}

pub(crate) fn apply(
    p: &ExtractParams,
    scope: &Scope,
    ctx: &InstallContext,
) -> Result<(), ExecutionError> {
    let archive = input_path(&p.file, scope, ctx);
    let dst = match &p.dst {
        Some(d) => target_path(d, scope, ctx),
        None => ctx.game_dir.clone(),
    };
    let format = match p.format.or_else(|| detect_format(&archive)) {
        Some(f) => f,
        None => return Err(FsError::Unsupported(archive).into()),
    };
    debug!(archive = %archive.display(), dst = %dst.display(), %format, "extract");
    ctx.fs().extract(&archive, &dst, format)?;
    Ok(())
}
