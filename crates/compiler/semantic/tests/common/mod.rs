//! Common test utilities for semantic analysis tests

use std::fmt::Write;

use modelmark_compiler_diagnostics::{
    build_diagnostic_message, DiagnosticCode, DiagnosticCollection, SchemaError, SchemaResult,
};
use modelmark_compiler_parser::{
    parse_document, Document, EntityKind, Field, ModelDef, ParseOptions,
};
use modelmark_compiler_semantic::analyze;

/// A document after parsing and semantic analysis, with every warning raised on the way.
#[derive(Debug, Clone)]
pub struct Analyzed {
    pub document: Document,
    pub diagnostics: DiagnosticCollection,
}

impl Analyzed {
    #[track_caller]
    pub fn model(&self, name: &str) -> &ModelDef {
        self.document
            .model(name)
            .unwrap_or_else(|| panic!("no model or interface named '{name}'"))
    }

    pub fn warning_codes(&self) -> Vec<DiagnosticCode> {
        self.diagnostics.iter().map(|d| d.code).collect()
    }
}

pub fn analyze_source(source: &str) -> SchemaResult<Analyzed> {
    let parsed = parse_document(source, &ParseOptions::default())?;
    let mut document = parsed.document;
    let mut diagnostics = parsed.diagnostics;
    diagnostics.extend(analyze(&mut document)?.iter().cloned());
    Ok(Analyzed {
        document,
        diagnostics,
    })
}

#[track_caller]
pub fn assert_semantic_ok_impl(source: &str, test_name: &str) -> Analyzed {
    match analyze_source(source) {
        Ok(analyzed) => analyzed,
        Err(err) => panic!(
            "{test_name}: expected the document to resolve, got:\n{}",
            build_diagnostic_message(source, &err.to_diagnostic(), false)
        ),
    }
}

#[track_caller]
pub fn assert_semantic_err_impl(source: &str, test_name: &str) -> SchemaError {
    match analyze_source(source) {
        Ok(analyzed) => panic!(
            "{test_name}: expected a fatal error, got {} entities and {}",
            analyzed.document.len(),
            analyzed.diagnostics.summary()
        ),
        Err(err) => err,
    }
}

/// Names of an entity's merged fields, in order.
pub fn full_names(model: &ModelDef) -> Vec<&str> {
    model.full_fields.iter().map(|f| f.name.as_str()).collect()
}

/// One line per model and merged field, for compact snapshots.
pub fn merged_outline(document: &Document) -> String {
    let mut out = String::new();
    for model in document.model_defs() {
        write!(out, "{} {}", EntityKind::from(model.kind), model.name).unwrap();
        if model.is_abstract {
            out.push_str(" (abstract)");
        }
        if !model.resolved_parents.is_empty() {
            write!(out, " <- {}", model.resolved_parents.join(", ")).unwrap();
        }
        out.push('\n');
        for field in &model.full_fields {
            write!(out, "  {}", field_summary(field)).unwrap();
            if field.declared_in != model.name {
                write!(out, " (from {})", field.declared_in).unwrap();
            }
            out.push('\n');
        }
    }
    out
}

/// `Name: type(len)? [flags]`
pub fn field_summary(field: &Field) -> String {
    let mut summary = format!("{}: {}", field.name, field.field_type);
    if let Some(length) = &field.length {
        write!(summary, "({length})").unwrap();
    }
    if field.nullable {
        summary.push('?');
    }

    let mut flags = Vec::new();
    if field.is_primary_key() {
        flags.push("pk".to_string());
    }
    if field.is_foreign_key() {
        match &field.reference_target {
            Some(target) => flags.push(format!("fk->{target}")),
            None => flags.push("fk".to_string()),
        }
    }
    for (set, name) in [
        (field.is_unique(), "unique"),
        (field.is_indexed(), "indexed"),
        (field.is_required(), "required"),
        (field.is_excluded(), "excluded"),
        (field.is_json_ignored(), "json-ignore"),
    ] {
        if set {
            flags.push(name.to_string());
        }
    }
    if !flags.is_empty() {
        write!(summary, " [{}]", flags.join(", ")).unwrap();
    }
    summary
}
