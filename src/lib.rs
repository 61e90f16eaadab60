//! Stagehand — declarative game installer.
//!
//! Recipes are YAML: metadata plus an ordered list of steps, each naming one
//! command from a closed set. Validate first, then execute in order, stopping
//! at the first fatal error.

pub mod cli;
pub mod collaborators;
pub mod core;
pub mod journal;
pub mod logging;
pub mod operations;

#[cfg(test)]
mod testing;
