//! SH-003: Validator — required metadata (advisory) and step shapes (fatal).
//!
//! A `game_slug` must be a single path component, since it names the game's
//! directories and config file.
//!
//! Pure: no filesystem or network access. Steps naming an unknown command
//! are left for the executor, which fails them at resolution time.

use super::error::{ScriptingError, ValidationError};
use super::registry::CommandRegistry;
use super::types::{is_valid_slug, Recipe, REQUIRED_FIELDS};

/// One advisory error per missing required field, in `REQUIRED_FIELDS` order.
pub fn missing_fields(recipe: &Recipe) -> Vec<ValidationError> {
    REQUIRED_FIELDS
        .iter()
        .filter(|field| recipe.field(field).is_none())
        .map(|field| ValidationError::missing_field(field))
        .collect()
}

/// Missing fields, then a `game_slug` that is not a single path component.
pub fn metadata_errors(recipe: &Recipe) -> Vec<ValidationError> {
    let mut errors = missing_fields(recipe);
    if let Some(slug) = recipe.game_slug() {
        if !is_valid_slug(&slug) {
            errors.push(ValidationError::invalid_slug(&slug));
        }
    }
    errors
}

/// Bind every resolvable step; the first mismatch aborts.
pub fn check_steps(recipe: &Recipe, registry: &CommandRegistry) -> Result<(), ScriptingError> {
    for step in &recipe.steps {
        let Ok(command) = registry.resolve(&step.command) else {
            continue;
        };
        command
            .bind(&step.params)
            .map_err(|e| e.at_step(step.index, &step.command))?;
    }
    Ok(())
}

/// Both checks. A fatal step error takes precedence over missing fields.
pub fn validate(
    recipe: &Recipe,
    registry: &CommandRegistry,
) -> Result<Vec<ValidationError>, ScriptingError> {
    let errors = metadata_errors(recipe);
    check_steps(recipe, registry)?;
    Ok(errors)
}
