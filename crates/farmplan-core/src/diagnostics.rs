//! Unified diagnostics infrastructure for tracking issues during validation
//! and solving.
//!
//! This module provides a common interface for collecting warnings and
//! errors while validating a [`crate::model::Plan`] or interpreting a
//! stage's solver outcome. It supports:
//!
//! - Severity levels (Warning, Error)
//! - Categories for grouping issues (e.g. "reference", "window", "capacity")
//! - Optional entity references (e.g. "land L1", "event E3")
//! - Serialization for JSON output, matching the `constraint_hints[]` surface
//!   of the optimization result payload
//!
//! # Example
//!
//! ```
//! use farmplan_core::diagnostics::{Diagnostics, Severity};
//!
//! let mut diag = Diagnostics::new();
//!
//! diag.add_warning("validation", "plan has no fixed areas");
//! diag.add_error_with_entity("reference", "event references unknown crop", "E3");
//!
//! assert_eq!(diag.warning_count(), 1);
//! assert_eq!(diag.error_count(), 1);
//! ```

use serde::Serialize;

/// Severity level for diagnostic issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Unusual but validation continued (e.g. an event with no possible days).
    Warning,
    /// The plan cannot be used as-is.
    Error,
}

/// A single diagnostic issue encountered during an operation
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticIssue {
    /// Severity of the issue
    pub severity: Severity,
    /// Category for grouping (e.g. "reference", "window", "capacity")
    pub category: String,
    /// Human-readable description of the issue
    pub message: String,
    /// Optional line number (for file-based operations)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    /// Optional entity reference (e.g. "land L1", "event E3")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
}

impl DiagnosticIssue {
    /// Create a new diagnostic issue
    pub fn new(
        severity: Severity,
        category: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            category: category.into(),
            message: message.into(),
            line: None,
            entity: None,
        }
    }

    /// Add line number to the issue
    pub fn with_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    /// Add entity reference to the issue
    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }
}

impl std::fmt::Display for DiagnosticIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let severity = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };

        write!(f, "[{}:{}] {}", severity, self.category, self.message)?;

        if let Some(entity) = &self.entity {
            write!(f, " ({})", entity)?;
        }
        if let Some(line) = self.line {
            write!(f, " at line {}", line)?;
        }

        Ok(())
    }
}

/// Collection of diagnostic issues for an operation
///
/// This is the primary container for tracking warnings and errors during
/// validation and infeasibility analysis.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Diagnostics {
    /// All collected issues
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<DiagnosticIssue>,
}

impl Diagnostics {
    /// Create new empty diagnostics
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a raw issue directly
    pub fn add(&mut self, issue: DiagnosticIssue) {
        self.issues.push(issue);
    }

    // =========================================================================
    // Warning Methods
    // =========================================================================

    /// Add a warning with category and message
    pub fn add_warning(&mut self, category: &str, message: &str) {
        self.issues
            .push(DiagnosticIssue::new(Severity::Warning, category, message));
    }

    /// Add a warning with entity reference
    pub fn add_warning_with_entity(&mut self, category: &str, message: &str, entity: &str) {
        self.issues
            .push(DiagnosticIssue::new(Severity::Warning, category, message).with_entity(entity));
    }

    /// Add a validation warning (convenience method with "validation" category)
    pub fn add_validation_warning(&mut self, entity: &str, message: &str) {
        self.issues.push(
            DiagnosticIssue::new(Severity::Warning, "validation", message).with_entity(entity),
        );
    }

    // =========================================================================
    // Error Methods
    // =========================================================================

    /// Add an error with category and message
    pub fn add_error(&mut self, category: &str, message: &str) {
        self.issues
            .push(DiagnosticIssue::new(Severity::Error, category, message));
    }

    /// Add an error with entity reference
    pub fn add_error_with_entity(&mut self, category: &str, message: &str, entity: &str) {
        self.issues
            .push(DiagnosticIssue::new(Severity::Error, category, message).with_entity(entity));
    }

    // =========================================================================
    // Query Methods
    // =========================================================================

    /// Count warning issues
    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
            .count()
    }

    /// Count error issues
    pub fn error_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
            .count()
    }

    /// Check if there are any issues
    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }

    /// Check if there are any errors
    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Error)
    }

    /// Check if there are any warnings
    pub fn has_warnings(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Warning)
    }

    /// Get issues filtered by category
    pub fn issues_by_category<'a>(
        &'a self,
        category: &'a str,
    ) -> impl Iterator<Item = &'a DiagnosticIssue> {
        self.issues.iter().filter(move |i| i.category == category)
    }

    /// Get only error issues
    pub fn errors(&self) -> impl Iterator<Item = &DiagnosticIssue> {
        self.issues.iter().filter(|i| i.severity == Severity::Error)
    }

    /// Get only warning issues
    pub fn warnings(&self) -> impl Iterator<Item = &DiagnosticIssue> {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
    }

    // =========================================================================
    // Utility Methods
    // =========================================================================

    /// Merge another diagnostics into this one
    pub fn merge(&mut self, other: Diagnostics) {
        self.issues.extend(other.issues);
    }

    /// Clear all issues
    pub fn clear(&mut self) {
        self.issues.clear();
    }

    /// Render `issues` as the flat `constraint_hints[]` string list used by
    /// the external optimization result payload.
    pub fn as_hints(&self) -> Vec<String> {
        self.issues.iter().map(|i| i.to_string()).collect()
    }

    /// Get summary string
    pub fn summary(&self) -> String {
        let warnings = self.warning_count();
        let errors = self.error_count();

        match (warnings, errors) {
            (0, 0) => "No issues".to_string(),
            (w, 0) => format!("{} warning{}", w, if w == 1 { "" } else { "s" }),
            (0, e) => format!("{} error{}", e, if e == 1 { "" } else { "s" }),
            (w, e) => format!(
                "{} warning{}, {} error{}",
                w,
                if w == 1 { "" } else { "s" },
                e,
                if e == 1 { "" } else { "s" }
            ),
        }
    }
}

impl std::fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Diagnostics: {}", self.summary())?;
        for issue in &self.issues {
            writeln!(f, "  {}", issue)?;
        }
        Ok(())
    }
}
