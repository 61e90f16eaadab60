//! SH-003: Recipe parsing — raw YAML mapping into the recipe model.
//!
//! Parsing is structural only:
//! - The document must be a mapping with string keys
//! - Steps come from `steps`, or from `installer` when it holds a sequence
//! - Each step is a single-key mapping `{command: params}`
//!
//! Completeness of metadata and parameter shapes are the validator's job.

use super::error::ParseError;
use super::types::{Recipe, Step};
use indexmap::IndexMap;
use serde_yaml_ng::Value;
use std::path::Path;

/// Key holding the step list.
const STEPS_KEY: &str = "steps";

/// Older recipes keep their step list under `installer`.
const LEGACY_STEPS_KEY: &str = "installer";

/// Parse a recipe file from disk.
pub fn parse_recipe_file(path: &Path) -> Result<Recipe, ParseError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| ParseError::new(format!("failed to read {}: {}", path.display(), e)))?;
    parse_recipe(&content)
}

/// Parse a recipe from YAML text.
pub fn parse_recipe(yaml: &str) -> Result<Recipe, ParseError> {
    let raw: Value = serde_yaml_ng::from_str(yaml)
        .map_err(|e| ParseError::new(format!("YAML parse error: {}", e)))?;
    recipe_from_value(&raw)
}

/// Build a recipe from an already-parsed YAML value.
pub fn recipe_from_value(raw: &Value) -> Result<Recipe, ParseError> {
    let mapping = match raw {
        Value::Mapping(m) => m,
        other => {
            return Err(ParseError::new(format!(
                "recipe must be a mapping, got {}",
                value_kind(other)
            )))
        }
    };

    let steps_key = if mapping.contains_key(STEPS_KEY) {
        Some(STEPS_KEY)
    } else if matches!(mapping.get(LEGACY_STEPS_KEY), Some(Value::Sequence(_))) {
        Some(LEGACY_STEPS_KEY)
    } else {
        None
    };

    let mut metadata = IndexMap::new();
    let mut steps = Vec::new();

    for (key, value) in mapping {
        let key = match key {
            Value::String(s) => s.as_str(),
            other => {
                return Err(ParseError::new(format!(
                    "recipe keys must be strings, got {}",
                    value_kind(other)
                )))
            }
        };

        if Some(key) == steps_key {
            steps = parse_steps(key, value)?;
        } else {
            metadata.insert(key.to_string(), value.clone());
        }
    }

    Ok(Recipe { metadata, steps })
}

fn parse_steps(key: &str, value: &Value) -> Result<Vec<Step>, ParseError> {
    let entries = match value {
        Value::Sequence(seq) => seq,
        Value::Null => return Ok(Vec::new()),
        other => {
            return Err(ParseError::new(format!(
                "'{}' must be a list of steps, got {}",
                key,
                value_kind(other)
            )))
        }
    };

    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| parse_step(index, entry))
        .collect()
}

fn parse_step(index: usize, entry: &Value) -> Result<Step, ParseError> {
    let mapping = match entry {
        Value::Mapping(m) => m,
        other => {
            return Err(ParseError::new(format!(
                "step {} must be a mapping of one command to its parameters, got {}",
                index + 1,
                value_kind(other)
            )))
        }
    };

    if mapping.len() != 1 {
        return Err(ParseError::new(format!(
            "step {} must name exactly one command, found {}",
            index + 1,
            mapping.len()
        )));
    }

    let Some((command, params)) = mapping.iter().next() else {
        return Err(ParseError::new(format!("step {} is empty", index + 1)));
    };

    let command = match command {
        Value::String(s) => s.clone(),
        other => {
            return Err(ParseError::new(format!(
                "step {} command name must be a string, got {}",
                index + 1,
                value_kind(other)
            )))
        }
    };

    Ok(Step {
        index,
        command,
        params: params.clone(),
    })
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a list",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}
