//! SH-020: Operations — the typed, bound form of a step.
//!
//! `Command::bind` turns raw parameters into an `Operation`; `apply` performs
//! its effect through the install context's collaborators. Every path in a
//! parameter is variable-substituted at apply time.

pub mod checksum;
pub mod config;
pub mod depends;
pub mod execute;
pub mod extract;
pub mod transfer;

use crate::core::context::{InstallContext, Scope};
use crate::core::error::ExecutionError;
use crate::core::registry::Command;
use std::path::PathBuf;

/// A step whose parameters matched its command's shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Move(transfer::TransferParams),
    Copy(transfer::TransferParams),
    Mkdir(transfer::DirParams),
    Extract(extract::ExtractParams),
    Execute(execute::ExecuteParams),
    Checksum(checksum::ChecksumCheck),
    CheckDepends,
    WriteConfig(config::WriteConfigParams),
}

impl Operation {
    pub fn command(&self) -> Command {
        match self {
            Self::Move(_) => Command::Move,
            Self::Copy(_) => Command::Copy,
            Self::Mkdir(_) => Command::Mkdir,
            Self::Extract(_) => Command::Extract,
            Self::Execute(_) => Command::Execute,
            Self::Checksum(_) => Command::Checksum,
            Self::CheckDepends => Command::CheckDepends,
            Self::WriteConfig(_) => Command::WriteConfig,
        }
    }

    /// Perform the operation's effect.
    pub fn apply(&self, scope: &Scope, ctx: &InstallContext) -> Result<(), ExecutionError> {
        match self {
            Self::Move(p) => transfer::apply_move(p, scope, ctx),
            Self::Copy(p) => transfer::apply_copy(p, scope, ctx),
            Self::Mkdir(p) => transfer::apply_mkdir(p, scope, ctx),
            Self::Extract(p) => extract::apply(p, scope, ctx),
            Self::Execute(p) => execute::apply(p, scope, ctx),
            Self::Checksum(c) => checksum::apply(c, scope, ctx),
            Self::CheckDepends => depends::apply(ctx),
            Self::WriteConfig(p) => config::apply(p, scope, ctx),
        }
    }
}

/// Downloaded inputs: relative paths resolve against the cache directory.
pub(crate) fn input_path(raw: &str, scope: &Scope, ctx: &InstallContext) -> PathBuf {
    let path = scope.path(raw);
    if path.is_relative() {
        ctx.cache_dir.join(path)
    } else {
        path
    }
}

/// Install targets: relative paths resolve against the game directory.
pub(crate) fn target_path(raw: &str, scope: &Scope, ctx: &InstallContext) -> PathBuf {
    let path = scope.path(raw);
    if path.is_relative() {
        ctx.game_dir.join(path)
    } else {
        path
    }
}
