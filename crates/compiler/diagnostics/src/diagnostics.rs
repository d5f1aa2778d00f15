//! # Diagnostic System for Schema Compilation
//!
//! This module provides the diagnostic infrastructure for reporting structural
//! errors, resolution warnings, and hints while a schema document is parsed and
//! resolved.

use ariadne::ReportKind;
use chumsky::span::SimpleSpan;
use std::fmt;

/// Where in the source a diagnostic or error applies.
///
/// Lines are 1-based. `text` is the raw line as it appeared in the source and
/// `span` is its byte range, used to label rendered reports.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceLocation {
    pub line: usize,
    pub text: String,
    pub span: SimpleSpan<usize>,
}

impl SourceLocation {
    pub fn new(line: usize, text: impl Into<String>, span: SimpleSpan<usize>) -> Self {
        Self {
            line,
            text: text.into(),
            span,
        }
    }

    /// A location that does not point at any source line.
    pub fn unknown() -> Self {
        Self {
            line: 0,
            text: String::new(),
            span: SimpleSpan::from(0..0),
        }
    }
}

impl Default for SourceLocation {
    fn default() -> Self {
        Self::unknown()
    }
}

/// A diagnostic message produced while compiling a schema document
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Diagnostic {
    pub severity: DiagnosticSeverity,
    pub code: DiagnosticCode,
    pub message: String,
    /// Source line where this diagnostic applies
    pub location: SourceLocation,
    /// Optional related locations for additional context
    pub related: Vec<(SourceLocation, String)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DiagnosticSeverity {
    Error,
    Warning,
    Info,
    Hint,
}

impl From<ReportKind<'static>> for DiagnosticSeverity {
    fn from(kind: ReportKind<'static>) -> Self {
        match kind {
            ReportKind::Error => Self::Error,
            ReportKind::Warning => Self::Warning,
            ReportKind::Advice => Self::Info,
            ReportKind::Custom(_, _) => Self::Info,
        }
    }
}

impl From<DiagnosticSeverity> for ReportKind<'static> {
    fn from(severity: DiagnosticSeverity) -> Self {
        match severity {
            DiagnosticSeverity::Error => ReportKind::Error,
            DiagnosticSeverity::Warning => ReportKind::Warning,
            DiagnosticSeverity::Info => ReportKind::Advice,
            DiagnosticSeverity::Hint => ReportKind::Advice,
        }
    }
}

impl fmt::Display for DiagnosticSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Info => write!(f, "info"),
            Self::Hint => write!(f, "hint"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticCode {
    // Structural errors (0-999)
    StructuralParseError,
    UnterminatedDelimiter,
    MissingType,
    InvalidLength,
    UnknownSection,

    // Name-table errors (1000-1999)
    DuplicateEntity,
    DuplicateField,
    UnknownReference,
    UnknownRelationTarget,
    UnknownIndexField,
    UnknownForeignKeyTarget,

    // Inheritance errors (2000-2999)
    CycleDetected,
    DuplicateDefaultEntity,
    InvalidInheritance,

    // Attribute errors (3000-3999)
    InvalidAttributeArguments,
}

impl From<DiagnosticCode> for u32 {
    fn from(code: DiagnosticCode) -> Self {
        match code {
            DiagnosticCode::StructuralParseError => 1,
            DiagnosticCode::UnterminatedDelimiter => 2,
            DiagnosticCode::MissingType => 3,
            DiagnosticCode::InvalidLength => 4,
            DiagnosticCode::UnknownSection => 5,
            DiagnosticCode::DuplicateEntity => 1001,
            DiagnosticCode::DuplicateField => 1002,
            DiagnosticCode::UnknownReference => 1003,
            DiagnosticCode::UnknownRelationTarget => 1004,
            DiagnosticCode::UnknownIndexField => 1005,
            DiagnosticCode::UnknownForeignKeyTarget => 1006,
            DiagnosticCode::CycleDetected => 2001,
            DiagnosticCode::DuplicateDefaultEntity => 2002,
            DiagnosticCode::InvalidInheritance => 2003,
            DiagnosticCode::InvalidAttributeArguments => 3001,
        }
    }
}

impl Diagnostic {
    /// Create an error diagnostic
    pub fn error(code: DiagnosticCode, message: String) -> Self {
        Self {
            severity: DiagnosticSeverity::Error,
            code,
            message,
            location: SourceLocation::unknown(),
            related: Vec::new(),
        }
    }

    /// Create a warning diagnostic
    pub fn warning(code: DiagnosticCode, message: String) -> Self {
        Self {
            severity: DiagnosticSeverity::Warning,
            code,
            message,
            location: SourceLocation::unknown(),
            related: Vec::new(),
        }
    }

    /// Create an info diagnostic
    pub fn info(code: DiagnosticCode, message: String) -> Self {
        Self {
            severity: DiagnosticSeverity::Info,
            code,
            message,
            location: SourceLocation::unknown(),
            related: Vec::new(),
        }
    }

    /// Add location information to this diagnostic
    pub fn with_location(mut self, location: SourceLocation) -> Self {
        self.location = location;
        self
    }

    /// Add a related location with context message
    pub fn with_related(mut self, location: SourceLocation, message: String) -> Self {
        self.related.push((location, message));
        self
    }

    /// Convenience method for an inheritance cycle that was broken automatically
    pub fn cycle_detected(entity: &str, removed_parent: &str, location: SourceLocation) -> Self {
        Self::warning(
            DiagnosticCode::CycleDetected,
            format!(
                "Inheritance cycle detected: removed '{removed_parent}' from the parents of '{entity}'"
            ),
        )
        .with_location(location)
    }

    /// Convenience method for a relation pointing at an unknown entity
    pub fn unknown_relation_target(
        entity: &str,
        target: &str,
        location: SourceLocation,
    ) -> Self {
        Self::warning(
            DiagnosticCode::UnknownRelationTarget,
            format!("Relation on '{entity}' targets unknown entity '{target}'"),
        )
        .with_location(location)
    }

    /// Convenience method for an index naming a field the entity does not have
    pub fn unknown_index_field(
        entity: &str,
        index: &str,
        field: &str,
        location: SourceLocation,
    ) -> Self {
        Self::warning(
            DiagnosticCode::UnknownIndexField,
            format!("Index '{index}' on '{entity}' references unknown field '{field}'"),
        )
        .with_location(location)
    }

    /// Convenience method for an explicit foreign key whose target is unknown
    pub fn unknown_foreign_key_target(
        field: &str,
        target: &str,
        location: SourceLocation,
    ) -> Self {
        Self::warning(
            DiagnosticCode::UnknownForeignKeyTarget,
            format!("Foreign key '{field}' references unknown entity '{target}'"),
        )
        .with_location(location)
    }

    /// Convenience method for malformed framework-attribute arguments
    pub fn invalid_attribute_arguments(
        attribute: &str,
        reason: &str,
        location: SourceLocation,
    ) -> Self {
        Self::warning(
            DiagnosticCode::InvalidAttributeArguments,
            format!("Invalid arguments for attribute '{attribute}': {reason}"),
        )
        .with_location(location)
    }

    /// Convenience method for a section header the parser does not understand
    pub fn unknown_section(section: &str, location: SourceLocation) -> Self {
        Self::warning(
            DiagnosticCode::UnknownSection,
            format!("Unknown section '{section}', its lines are ignored"),
        )
        .with_location(location)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity, self.message)?;
        write!(f, " (at line {})", self.location.line)?;
        for (location, message) in &self.related {
            write!(f, "\n  note: {} (at line {})", message, location.line)?;
        }
        Ok(())
    }
}

/// Collection of diagnostics gathered during one compilation
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DiagnosticCollection {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a diagnostic to the collection
    pub fn add(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Add multiple diagnostics
    pub fn extend(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        self.diagnostics.extend(diagnostics);
    }

    pub fn all(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Get only error diagnostics
    pub fn errors(&self) -> Vec<&Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == DiagnosticSeverity::Error)
            .collect()
    }

    /// Get only warning diagnostics
    pub fn warnings(&self) -> Vec<&Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == DiagnosticSeverity::Warning)
            .collect()
    }

    /// Check if there are any errors
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == DiagnosticSeverity::Error)
    }

    /// Check for any diagnostic carrying the given code
    pub fn contains_code(&self, code: DiagnosticCode) -> bool {
        self.diagnostics.iter().any(|d| d.code == code)
    }

    pub const fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub const fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Sort diagnostics by severity (errors first), then by line
    pub fn sort(&mut self) {
        self.diagnostics.sort_by(|a, b| {
            a.severity
                .cmp(&b.severity)
                .then(a.location.line.cmp(&b.location.line))
        });
    }

    /// Get summary statistics
    pub fn summary(&self) -> String {
        let errors = self.errors().len();
        let warnings = self.warnings().len();

        if self.diagnostics.is_empty() {
            "No issues found".to_string()
        } else {
            format!("{errors} errors, {warnings} warnings")
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.diagnostics.iter()
    }
}

impl From<Vec<Diagnostic>> for DiagnosticCollection {
    fn from(diagnostics: Vec<Diagnostic>) -> Self {
        Self { diagnostics }
    }
}

impl IntoIterator for DiagnosticCollection {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.diagnostics.into_iter()
    }
}

impl<'a> IntoIterator for &'a DiagnosticCollection {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.diagnostics.iter()
    }
}
