//! SH-004: Command table — resolves step command names to typed operations.
//!
//! The table is a fixed, statically declared set of public commands built
//! once per interpreter. Lookup is an exact, case-sensitive match. Internal
//! helpers are never entries, so `_substitute` fails exactly like any other
//! unknown name.

use super::error::ScriptingError;
use crate::operations::checksum::{ChecksumCheck, ChecksumParams};
use crate::operations::config::{WriteConfigParams, WriteConfigSpec};
use crate::operations::execute::{ExecuteParams, ExecuteSpec};
use crate::operations::extract::ExtractParams;
use crate::operations::transfer::{DirParams, TransferParams};
use crate::operations::Operation;
use rustc_hash::FxHashMap;
use schemars::schema::RootSchema;
use schemars::schema_for;
use serde::de::DeserializeOwned;
use serde_yaml_ng::Value;
use std::fmt;

/// Every command a recipe step may name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Move,
    Copy,
    Mkdir,
    Extract,
    Execute,
    Checksum,
    CheckDepends,
    WriteConfig,
}

impl Command {
    pub const ALL: [Command; 8] = [
        Command::Move,
        Command::Copy,
        Command::Mkdir,
        Command::Extract,
        Command::Execute,
        Command::Checksum,
        Command::CheckDepends,
        Command::WriteConfig,
    ];

    /// The name a recipe uses for this command.
    pub fn name(self) -> &'static str {
        match self {
            Self::Move => "move",
            Self::Copy => "copy",
            Self::Mkdir => "mkdir",
            Self::Extract => "extract",
            Self::Execute => "execute",
            Self::Checksum => "checksum",
            Self::CheckDepends => "check_depends",
            Self::WriteConfig => "write_config",
        }
    }

    /// One-line help for `stagehand commands`.
    pub fn summary(self) -> &'static str {
        match self {
            Self::Move => "move a file or directory: {src, dst}",
            Self::Copy => "copy and merge a file or directory tree: {src, dst}",
            Self::Mkdir => "create a directory and its parents: <path>",
            Self::Extract => "unpack a tar/zip archive: {file, dst?, format?}",
            Self::Execute => "run a program: <file> or {file, args?}",
            Self::Checksum => "verify a file digest: {file, hash: sha256:<hex>|blake3:<hex>|md5:<hex>}",
            Self::CheckDepends => "install the runner and its dependency if missing",
            Self::WriteConfig => "save the game entry: <executable> or {file}",
        }
    }

    /// Check `params` against this command's declared shape.
    pub fn bind(self, params: &Value) -> Result<Operation, ScriptingError> {
        match self {
            Self::Move => {
                let p: TransferParams = from_params(self, params)?;
                p.check(self.name())?;
                Ok(Operation::Move(p))
            }
            Self::Copy => {
                let p: TransferParams = from_params(self, params)?;
                p.check(self.name())?;
                Ok(Operation::Copy(p))
            }
            Self::Mkdir => from_params::<DirParams>(self, params).map(Operation::Mkdir),
            Self::Extract => from_params::<ExtractParams>(self, params).map(Operation::Extract),
            Self::Execute => {
                from_params::<ExecuteSpec>(self, params).map(|s| Operation::Execute(s.into()))
            }
            Self::Checksum => {
                let p: ChecksumParams = from_params(self, params)?;
                ChecksumCheck::try_from(p)
                    .map(Operation::Checksum)
                    .map_err(|e| invalid(self, e))
            }
            Self::CheckDepends => match params {
                Value::Null => Ok(Operation::CheckDepends),
                Value::Mapping(m) if m.is_empty() => Ok(Operation::CheckDepends),
                _ => Err(invalid(self, "takes no parameters")),
            },
            Self::WriteConfig => from_params::<WriteConfigSpec>(self, params)
                .map(|s| Operation::WriteConfig(s.into())),
        }
    }

    /// JSON schema of the parameters this command accepts.
    pub fn params_schema(self) -> RootSchema {
        match self {
            Self::Move | Self::Copy => schema_for!(TransferParams),
            Self::Mkdir => schema_for!(DirParams),
            Self::Extract => schema_for!(ExtractParams),
            Self::Execute => schema_for!(ExecuteSpec),
            Self::Checksum => schema_for!(ChecksumParams),
            Self::CheckDepends => schema_for!(()),
            Self::WriteConfig => schema_for!(WriteConfigSpec),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

fn from_params<T: DeserializeOwned>(command: Command, params: &Value) -> Result<T, ScriptingError> {
    serde_yaml_ng::from_value(params.clone()).map_err(|e| invalid(command, e))
}

fn invalid(command: Command, detail: impl fmt::Display) -> ScriptingError {
    ScriptingError::new(format!(
        "invalid parameters for '{}': {}",
        command.name(),
        detail
    ))
}

/// Name → command lookup table.
#[derive(Debug, Clone)]
pub struct CommandRegistry {
    table: FxHashMap<&'static str, Command>,
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRegistry {
    pub fn new() -> Self {
        let table = Command::ALL.iter().map(|c| (c.name(), *c)).collect();
        Self { table }
    }

    /// Look up a command by its exact name.
    pub fn resolve(&self, name: &str) -> Result<Command, ScriptingError> {
        self.table
            .get(name)
            .copied()
            .ok_or_else(|| ScriptingError::unknown_command(name))
    }

    /// Public command names, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.table.keys().copied().collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}
