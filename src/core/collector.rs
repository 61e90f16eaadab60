//! SH-008: Per-attempt error collector.

use super::error::{InstallError, Severity};

/// Append-only, ordered record of every error in one install attempt.
/// Identical errors are all kept.
#[derive(Debug, Clone, Default)]
pub struct ErrorCollector {
    errors: Vec<InstallError>,
}

impl ErrorCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: impl Into<InstallError>) {
        self.errors.push(error.into());
    }

    pub fn as_slice(&self) -> &[InstallError] {
        &self.errors
    }

    pub fn to_vec(&self) -> Vec<InstallError> {
        self.errors.clone()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_fatal(&self) -> bool {
        self.errors.iter().any(|e| e.severity() == Severity::Fatal)
    }

    /// Only the interpreter discards a collector, when an attempt is abandoned or reset.
    pub(crate) fn clear(&mut self) {
        self.errors.clear();
    }
}
