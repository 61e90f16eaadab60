//! SH-001: Recipe model, phase results, and journal event types.
//!
//! A recipe is an order-preserving metadata mapping plus an ordered list of
//! steps. Step parameters stay raw here; each command binds them to its own
//! typed shape (see `registry`).

use super::error::{InstallError, ScriptingError, ValidationError};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Metadata keys every recipe must carry, in reporting order.
pub const REQUIRED_FIELDS: [&str; 3] = ["runner", "name", "game_slug"];

/// A slug names a directory and a file under several roots, so it is a
/// single path component: ASCII letters, digits, `-`, `_`, and `.`, not
/// starting with `.`.
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && !slug.starts_with('.')
        && slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
}

// ============================================================================
// Recipe
// ============================================================================

/// A parsed install recipe.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recipe {
    /// Every top-level key except the step list, in authored order
    pub metadata: IndexMap<String, serde_yaml_ng::Value>,

    /// Install steps in authored order
    pub steps: Vec<Step>,
}

impl Recipe {
    /// A scalar metadata value as a string. Missing, null, and blank values are `None`.
    pub fn field(&self, key: &str) -> Option<String> {
        let value = self.metadata.get(key)?;
        match value {
            serde_yaml_ng::Value::String(_)
            | serde_yaml_ng::Value::Number(_)
            | serde_yaml_ng::Value::Bool(_) => {
                let s = yaml_value_to_string(value);
                if s.trim().is_empty() {
                    None
                } else {
                    Some(s)
                }
            }
            _ => None,
        }
    }

    pub fn runner(&self) -> Option<String> {
        self.field("runner")
    }

    pub fn name(&self) -> Option<String> {
        self.field("name")
    }

    pub fn game_slug(&self) -> Option<String> {
        self.field("game_slug")
    }
}

/// One install step: a command name and its raw parameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Step {
    /// Zero-based position in the authored list
    pub index: usize,

    /// Command name, matched exactly
    pub command: String,

    /// Scalar, list, mapping, or null
    pub params: serde_yaml_ng::Value,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "step {} ({})", self.index + 1, self.command)
    }
}

// ============================================================================
// Phase results
// ============================================================================

/// Outcome of validating a recipe.
#[derive(Debug, Clone, PartialEq)]
pub enum Validation {
    /// No errors.
    Valid,
    /// Advisory errors on required metadata.
    Invalid(Vec<ValidationError>),
    /// A step's parameters do not match its command's shape.
    Aborted(ScriptingError),
}

impl Validation {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

/// Outcome of executing the steps of a recipe.
#[derive(Debug, Clone, PartialEq)]
pub enum RunResult {
    /// Every step completed.
    Succeeded { steps: usize },
    /// A fatal error stopped the run; `errors` is the full collector.
    Failed {
        error: InstallError,
        errors: Vec<InstallError>,
    },
    /// The caller cancelled between steps.
    Abandoned { completed: usize },
    /// Validation failed; no step was attempted.
    Rejected(Validation),
}

impl RunResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }
}

// ============================================================================
// Journal events
// ============================================================================

/// Install event for the JSONL journal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum InstallEvent {
    InstallStarted {
        game: String,
        run_id: String,
        steps: usize,
        stagehand_version: String,
    },
    StepStarted {
        game: String,
        step: usize,
        command: String,
    },
    StepCompleted {
        game: String,
        step: usize,
        command: String,
        duration_seconds: f64,
    },
    StepFailed {
        game: String,
        step: usize,
        command: String,
        error: String,
        fatal: bool,
    },
    InstallCompleted {
        game: String,
        run_id: String,
        steps_completed: usize,
        total_seconds: f64,
    },
    InstallAbandoned {
        game: String,
        run_id: String,
        steps_completed: usize,
    },
}

/// Timestamped event wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimestampedEvent {
    pub ts: String,
    #[serde(flatten)]
    pub event: InstallEvent,
}

// ============================================================================
// Helpers
// ============================================================================

/// Convert a serde_yaml_ng::Value scalar to a string.
pub fn yaml_value_to_string(val: &serde_yaml_ng::Value) -> String {
    match val {
        serde_yaml_ng::Value::String(s) => s.clone(),
        serde_yaml_ng::Value::Number(n) => n.to_string(),
        serde_yaml_ng::Value::Bool(b) => b.to_string(),
        serde_yaml_ng::Value::Null => String::new(),
        other => format!("{:?}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recipe_with(pairs: &[(&str, serde_yaml_ng::Value)]) -> Recipe {
        Recipe {
            metadata: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
            steps: vec![],
        }
    }

    #[test]
    fn test_sh001_field_string() {
        let r = recipe_with(&[("runner", serde_yaml_ng::Value::String("wine".into()))]);
        assert_eq!(r.runner().as_deref(), Some("wine"));
    }

    #[test]
    fn test_sh001_field_blank_is_missing() {
        let r = recipe_with(&[
            ("name", serde_yaml_ng::Value::String("   ".into())),
            ("runner", serde_yaml_ng::Value::Null),
        ]);
        assert!(r.name().is_none());
        assert!(r.runner().is_none());
        assert!(r.game_slug().is_none());
    }

    #[test]
    fn test_sh001_field_number_is_stringified() {
        let r = recipe_with(&[(
            "name",
            serde_yaml_ng::Value::Number(serde_yaml_ng::Number::from(1942)),
        )]);
        assert_eq!(r.name().as_deref(), Some("1942"));
    }

    #[test]
    fn test_sh001_field_mapping_is_not_scalar() {
        let r = recipe_with(&[(
            "installer",
            serde_yaml_ng::Value::Mapping(serde_yaml_ng::Mapping::new()),
        )]);
        assert!(r.field("installer").is_none());
    }

    #[test]
    fn test_sh001_step_display() {
        let s = Step {
            index: 0,
            command: "move".into(),
            params: serde_yaml_ng::Value::Null,
        };
        assert_eq!(s.to_string(), "step 1 (move)");
    }

    #[test]
    fn test_sh001_validation_is_valid() {
        assert!(Validation::Valid.is_valid());
        assert!(!Validation::Invalid(vec![]).is_valid());
        assert!(!Validation::Aborted(ScriptingError::new("x")).is_valid());
    }

    #[test]
    fn test_sh001_event_serde() {
        let event = InstallEvent::StepFailed {
            game: "baz".into(),
            step: 2,
            command: "move".into(),
            error: "gone".into(),
            fatal: true,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"event\":\"step_failed\""));
        assert!(json.contains("\"fatal\":true"));
    }

    #[test]
    fn test_sh001_yaml_value_to_string() {
        assert_eq!(
            yaml_value_to_string(&serde_yaml_ng::Value::String("hello".into())),
            "hello"
        );
        assert_eq!(yaml_value_to_string(&serde_yaml_ng::Value::Bool(true)), "true");
        assert_eq!(yaml_value_to_string(&serde_yaml_ng::Value::Null), "");
    }
}
