//! Fatal errors that abandon a schema document.
//!
//! A `SchemaError` aborts the compilation of the current source file: no partial
//! document is handed out once one of these has been raised. Non-fatal findings
//! are reported as warning [`Diagnostic`]s instead.

use thiserror::Error;

use crate::{Diagnostic, DiagnosticCode, SourceLocation};

pub type SchemaResult<T> = Result<T, SchemaError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// A header, field or directive line matches no supported grammar form
    #[error("line {}: {message}", .location.line)]
    Structural {
        code: DiagnosticCode,
        message: String,
        location: SourceLocation,
    },

    /// An explicit inheritance name does not resolve to any entity
    #[error("line {}: '{entity}' inherits from unknown entity '{name}'", .location.line)]
    UnknownReference {
        entity: String,
        name: String,
        location: SourceLocation,
    },

    /// An inheritance edge that no dialect allows (interface from model, anything from enum)
    #[error("line {}: {message}", .location.line)]
    InvalidInheritance {
        message: String,
        location: SourceLocation,
    },

    #[error("line {}: entity '{name}' is declared more than once", .location.line)]
    DuplicateEntity {
        name: String,
        location: SourceLocation,
        first: SourceLocation,
    },

    #[error("line {}: field '{field}' is declared more than once on '{entity}'", .location.line)]
    DuplicateField {
        entity: String,
        field: String,
        location: SourceLocation,
    },

    #[error(
        "line {}: '{second}' is marked @default but '{first}' already is",
        .location.line
    )]
    DuplicateDefaultEntity {
        first: String,
        second: String,
        location: SourceLocation,
    },
}

impl SchemaError {
    /// Build a structural parse error for the given line.
    pub fn structural(message: impl Into<String>, location: SourceLocation) -> Self {
        Self::Structural {
            code: DiagnosticCode::StructuralParseError,
            message: message.into(),
            location,
        }
    }

    /// Build a structural parse error carrying a more specific code.
    pub fn structural_with_code(
        code: DiagnosticCode,
        message: impl Into<String>,
        location: SourceLocation,
    ) -> Self {
        Self::Structural {
            code,
            message: message.into(),
            location,
        }
    }

    pub const fn location(&self) -> &SourceLocation {
        match self {
            Self::Structural { location, .. }
            | Self::UnknownReference { location, .. }
            | Self::InvalidInheritance { location, .. }
            | Self::DuplicateEntity { location, .. }
            | Self::DuplicateField { location, .. }
            | Self::DuplicateDefaultEntity { location, .. } => location,
        }
    }

    pub const fn code(&self) -> DiagnosticCode {
        match self {
            Self::Structural { code, .. } => *code,
            Self::UnknownReference { .. } => DiagnosticCode::UnknownReference,
            Self::InvalidInheritance { .. } => DiagnosticCode::InvalidInheritance,
            Self::DuplicateEntity { .. } => DiagnosticCode::DuplicateEntity,
            Self::DuplicateField { .. } => DiagnosticCode::DuplicateField,
            Self::DuplicateDefaultEntity { .. } => DiagnosticCode::DuplicateDefaultEntity,
        }
    }

    /// Convert into an error diagnostic so fatal and non-fatal findings render alike.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let message = match self {
            Self::Structural { message, .. } | Self::InvalidInheritance { message, .. } => {
                message.clone()
            }
            Self::UnknownReference { entity, name, .. } => {
                format!("'{entity}' inherits from unknown entity '{name}'")
            }
            Self::DuplicateEntity { name, .. } => {
                format!("Entity '{name}' is declared more than once")
            }
            Self::DuplicateField { entity, field, .. } => {
                format!("Field '{field}' is declared more than once on '{entity}'")
            }
            Self::DuplicateDefaultEntity { first, second, .. } => {
                format!("'{second}' is marked @default but '{first}' already is")
            }
        };
        let diagnostic = Diagnostic::error(self.code(), message).with_location(self.location().clone());
        match self {
            Self::DuplicateEntity { first, .. } => {
                diagnostic.with_related(first.clone(), "first declared here".to_string())
            }
            _ => diagnostic,
        }
    }
}

impl From<SchemaError> for Diagnostic {
    fn from(error: SchemaError) -> Self {
        error.to_diagnostic()
    }
}
