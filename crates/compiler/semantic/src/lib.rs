//! # Schema Semantic Analysis
//!
//! Takes the unresolved [`Document`] produced by the parser and makes it ready
//! for generators:
//!
//! 1. **Inheritance**: builds the inheritance graph, repairs cycles, applies the
//!    default-entity fallback and merges fields into `full_fields`
//! 2. **Classification**: turns raw attribute tokens into typed field state
//! 3. **Validation**: warns about references that point nowhere
//!
//! Fatal problems abort with a `SchemaError`; everything else is collected as
//! warning diagnostics. After [`analyze`] returns the document is not written
//! to again.

pub mod classify;
pub mod graph;
pub mod resolver;
pub mod validation;

pub use classify::{create_default_attribute_registry, AttributeHandler, AttributeRegistry};
pub use graph::{CycleRepair, EntityId, InheritanceGraph};
pub use resolver::resolve_inheritance;
pub use validation::{create_default_registry, Validator, ValidatorRegistry};

use modelmark_compiler_diagnostics::{DiagnosticCollection, SchemaResult};
use modelmark_compiler_parser::Document;
use tracing::debug;

/// Resolve, classify and validate with the built-in registries.
pub fn analyze(document: &mut Document) -> SchemaResult<DiagnosticCollection> {
    analyze_with(
        document,
        &create_default_attribute_registry(),
        &create_default_registry(),
    )
}

pub fn analyze_with(
    document: &mut Document,
    attributes: &AttributeRegistry,
    validators: &ValidatorRegistry,
) -> SchemaResult<DiagnosticCollection> {
    let mut diagnostics = DiagnosticCollection::new();
    resolve_inheritance(document, &mut diagnostics)?;
    attributes.classify_document(document, &mut diagnostics);
    diagnostics.extend(validators.validate_all(document).iter().cloned());
    debug!("semantic analysis finished: {}", diagnostics.summary());
    Ok(diagnostics)
}
