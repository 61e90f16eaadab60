//! SH-009: Script interpreter — one install attempt of one recipe.
//!
//! Owns the recipe, the command table, and the error collector. Borrows the
//! caller's context only for the duration of `run` or `install`.

use super::collector::ErrorCollector;
use super::context::{GameIdentity, InstallContext};
use super::error::{InstallError, ParseError};
use super::executor;
use super::parser;
use super::registry::CommandRegistry;
use super::types::{Recipe, RunResult, Validation};
use super::validator;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct ScriptInterpreter {
    recipe: Recipe,
    registry: CommandRegistry,
    errors: ErrorCollector,
}

impl ScriptInterpreter {
    pub fn new(recipe: Recipe) -> Self {
        Self {
            recipe,
            registry: CommandRegistry::new(),
            errors: ErrorCollector::new(),
        }
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, ParseError> {
        parser::parse_recipe(yaml).map(Self::new)
    }

    pub fn from_file(path: &Path) -> Result<Self, ParseError> {
        parser::parse_recipe_file(path).map(Self::new)
    }

    pub fn recipe(&self) -> &Recipe {
        &self.recipe
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Everything recorded so far in this attempt, in order.
    pub fn errors(&self) -> &[InstallError] {
        self.errors.as_slice()
    }

    pub fn game(&self) -> GameIdentity {
        GameIdentity::from_recipe(&self.recipe)
    }

    /// Check metadata (required fields, slug shape) and step shapes,
    /// recording every error found.
    pub fn validate(&mut self) -> Validation {
        let missing = validator::metadata_errors(&self.recipe);
        for error in &missing {
            self.errors.push(error.clone());
        }
        if let Err(fatal) = validator::check_steps(&self.recipe, &self.registry) {
            self.errors.push(fatal.clone());
            return Validation::Aborted(fatal);
        }
        if missing.is_empty() {
            Validation::Valid
        } else {
            Validation::Invalid(missing)
        }
    }

    /// Execute the steps without validating first.
    pub fn run(&mut self, ctx: &InstallContext) -> RunResult {
        let game = self.game();
        executor::run(
            &self.recipe.steps,
            &game,
            &self.registry,
            ctx,
            &mut self.errors,
        )
    }

    /// Validate, then run only a valid recipe.
    pub fn install(&mut self, ctx: &InstallContext) -> RunResult {
        self.reset();
        let validation = self.validate();
        if !validation.is_valid() {
            debug!(errors = self.errors.len(), "recipe rejected");
            return RunResult::Rejected(validation);
        }
        let result = self.run(ctx);
        if matches!(result, RunResult::Abandoned { .. }) {
            self.reset();
        }
        result
    }

    /// Discard the collected errors.
    pub fn reset(&mut self) {
        self.errors.clear();
    }
}
