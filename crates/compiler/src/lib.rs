//! Modelmark compiler library
//!
//! Runs the whole frontend over one schema source: parsing, inheritance
//! resolution, attribute classification and reference validation. The result
//! is a read-only [`Document`] ready to be handed to generators.

pub mod config;

use std::sync::Arc;

pub use config::{CompilerConfig, DialectSetting};
use modelmark_compiler_diagnostics::{build_diagnostic_messages, Diagnostic, DiagnosticCollection};
pub use modelmark_compiler_parser::{DialectSelection, Document, Entity};
use modelmark_compiler_parser::{parse_document, ParseOptions};
use thiserror::Error;
use tracing::info;

/// Result type for compilation operations
pub type Result<T> = std::result::Result<T, CompilerError>;

/// Errors that can occur during compilation
#[derive(Debug, Clone, Error)]
pub enum CompilerError {
    /// The source could not be assembled into a document
    #[error("Parse errors: {} errors found", .0.len())]
    ParseErrors(Vec<Diagnostic>),
    /// The document was assembled but could not be resolved
    #[error("Semantic errors: {} errors found", .0.len())]
    SemanticErrors(Vec<Diagnostic>),
    /// Warnings were raised and `fail_on_warnings` is set
    #[error("Compilation produced {} warnings", .0.len())]
    Warnings(Vec<Diagnostic>),
}

impl CompilerError {
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            Self::ParseErrors(diagnostics)
            | Self::SemanticErrors(diagnostics)
            | Self::Warnings(diagnostics) => diagnostics,
        }
    }
}

/// Options for compilation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerOptions {
    pub dialect: DialectSelection,
    /// Mark `Owner_id`-style fields as foreign keys when `Owner` is a model
    pub infer_foreign_keys: bool,
    /// Treat any warning as a failed compilation
    pub fail_on_warnings: bool,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            dialect: DialectSelection::Auto,
            infer_foreign_keys: true,
            fail_on_warnings: false,
        }
    }
}

impl CompilerOptions {
    fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            dialect: self.dialect,
            infer_foreign_keys: self.infer_foreign_keys,
        }
    }
}

/// Compilation output including the resolved document and any diagnostics
#[derive(Debug, Clone)]
pub struct CompilerOutput {
    /// The resolved document; shared read-only from here on
    pub document: Arc<Document>,
    /// Warnings from parsing and semantic analysis, in the order they were raised
    pub warnings: DiagnosticCollection,
}

/// Compiles one schema source
///
/// # Returns
/// * `Ok(CompilerOutput)` - The resolved document with any warnings
/// * `Err(CompilerError)` - Compilation failed; no partial document is returned
pub fn compile_schema(source: &str, options: &CompilerOptions) -> Result<CompilerOutput> {
    let parsed = parse_document(source, &options.parse_options())
        .map_err(|err| CompilerError::ParseErrors(vec![err.to_diagnostic()]))?;
    info!(
        "parsed {} entities ({} dialect)",
        parsed.document.len(),
        parsed.document.dialect
    );

    let mut document = parsed.document;
    let mut warnings = parsed.diagnostics;
    let semantic = modelmark_compiler_semantic::analyze(&mut document)
        .map_err(|err| CompilerError::SemanticErrors(vec![err.to_diagnostic()]))?;
    warnings.extend(semantic.iter().cloned());

    if warnings.has_errors() {
        let errors = warnings.errors().into_iter().cloned().collect();
        return Err(CompilerError::SemanticErrors(errors));
    }
    if options.fail_on_warnings && !warnings.is_empty() {
        return Err(CompilerError::Warnings(warnings.all().to_vec()));
    }

    info!("compilation finished: {}", warnings.summary());
    Ok(CompilerOutput {
        document: Arc::new(document),
        warnings,
    })
}

/// Formats diagnostics for display
pub fn format_diagnostics(
    source_text: &str,
    diagnostics: &[Diagnostic],
    use_color: bool,
) -> String {
    build_diagnostic_messages(source_text, diagnostics, use_color)
}

/// One line describing an entity: kind, name and merged field (or value) count.
pub fn entity_summary(entity: &Entity) -> String {
    match entity {
        Entity::Model(model) => {
            let mut line = format!(
                "{} {}: {} fields",
                entity.kind(),
                model.name,
                model.full_fields.len()
            );
            if !model.resolved_parents.is_empty() {
                line.push_str(&format!(" (inherits {})", model.resolved_parents.join(", ")));
            }
            line
        }
        Entity::Enum(enum_def) => {
            format!("{} {}: {} values", entity.kind(), enum_def.name, enum_def.values.len())
        }
    }
}
