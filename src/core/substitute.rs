//! SH-007: Variable substitution in step parameters.
//!
//! `$GAMEDIR`, `$CACHE`, `$HOME`, `$GAME_SLUG`, `$NAME`, `$RUNNER`, plus any
//! variable in the install context's environment. Unknown variables are
//! left as written. This is an internal helper of the operations; it is not
//! part of the command table.

use regex::{Captures, Regex};
use std::collections::HashMap;
use std::sync::OnceLock;

const VARIABLE_PATTERN: &str = r"\$([A-Z_][A-Z0-9_]*)";

fn variable_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(VARIABLE_PATTERN).expect("variable pattern is valid"))
}

/// Values available to `$NAME` references during one install.
#[derive(Debug, Clone, Default)]
pub struct Variables {
    values: HashMap<String, String>,
}

impl Variables {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn set(&mut self, name: &str, value: impl Into<String>) {
        self.values.insert(name.to_string(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Expand every known `$VAR` in `input`.
    pub(crate) fn substitute(&self, input: &str) -> String {
        if !input.contains('$') {
            return input.to_string();
        }
        variable_regex()
            .replace_all(input, |caps: &Captures| match self.values.get(&caps[1]) {
                Some(value) => value.clone(),
                None => caps[0].to_string(),
            })
            .into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn vars() -> Variables {
        let mut v = Variables::new();
        v.set("GAMEDIR", "/games/baz");
        v.set("CACHE", "/cache/baz");
        v
    }

    #[test]
    fn test_sh007_substitute_known() {
        assert_eq!(vars().substitute("$GAMEDIR/bin/baz"), "/games/baz/bin/baz");
    }

    #[test]
    fn test_sh007_substitute_multiple() {
        assert_eq!(
            vars().substitute("$CACHE/setup.exe -> $GAMEDIR"),
            "/cache/baz/setup.exe -> /games/baz"
        );
    }

    #[test]
    fn test_sh007_unknown_left_literal() {
        assert_eq!(vars().substitute("$NOPE/file"), "$NOPE/file");
    }

    #[test]
    fn test_sh007_longest_identifier() {
        // $GAMEDIR_OLD is its own (unknown) variable, not $GAMEDIR + "_OLD"
        assert_eq!(vars().substitute("$GAMEDIR_OLD"), "$GAMEDIR_OLD");
    }

    #[test]
    fn test_sh007_lowercase_not_a_variable() {
        assert_eq!(vars().substitute("$gamedir"), "$gamedir");
    }

    #[test]
    fn test_sh007_get() {
        assert_eq!(vars().get("CACHE"), Some("/cache/baz"));
        assert_eq!(vars().get("HOME"), None);
    }

    proptest! {
        #[test]
        fn prop_sh007_no_dollar_is_identity(s in "[^$]*") {
            prop_assert_eq!(vars().substitute(&s), s);
        }
    }
}
