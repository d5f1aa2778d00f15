//! Diagnostics shared by every stage of the schema compiler.

mod diagnostics;
mod errors;
mod reporting;

pub use diagnostics::{
    Diagnostic, DiagnosticCode, DiagnosticCollection, DiagnosticSeverity, SourceLocation,
};
pub use errors::{SchemaError, SchemaResult};
pub use reporting::{build_diagnostic_message, build_diagnostic_messages};
