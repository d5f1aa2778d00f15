//! Shared helpers for parser tests.

use std::fmt::Write;

use modelmark_compiler_diagnostics::{build_diagnostic_message, SchemaError};
pub use modelmark_compiler_parser::{
    parse_document, Document, Entity, Field, ParseOptions, ParsedDocument,
};

#[track_caller]
pub fn assert_parses_ok_impl(source: &str, options: &ParseOptions, test_name: &str) -> ParsedDocument {
    match parse_document(source, options) {
        Ok(parsed) => parsed,
        Err(err) => panic!(
            "{test_name}: expected a successful parse, got:\n{}",
            build_diagnostic_message(source, &err.to_diagnostic(), false)
        ),
    }
}

#[track_caller]
pub fn assert_parses_err_impl(source: &str, test_name: &str) -> SchemaError {
    match parse_document(source, &ParseOptions::default()) {
        Ok(parsed) => panic!(
            "{test_name}: expected a parse error, got a document with {} entities",
            parsed.document.len()
        ),
        Err(err) => err,
    }
}

/// One line per entity and member, for compact snapshots.
pub fn outline(document: &Document) -> String {
    let mut out = String::new();
    for entity in document.entities() {
        match entity {
            Entity::Model(model) => {
                write!(out, "{} {}", entity.kind(), model.name).unwrap();
                if !model.inherits.is_empty() {
                    write!(out, " : {}", model.inherits.join(", ")).unwrap();
                }
                out.push('\n');
                for field in &model.fields {
                    writeln!(out, "  - {}", field_signature(field)).unwrap();
                }
                for relation in &model.relations {
                    writeln!(
                        out,
                        "  > {} {} {}",
                        relation.name, relation.kind, relation.target
                    )
                    .unwrap();
                }
                for index in &model.indexes {
                    let unique = if index.is_unique { " unique" } else { "" };
                    writeln!(out, "  # {} ({}){unique}", index.name, index.fields.join(", ")).unwrap();
                }
            }
            Entity::Enum(enum_def) => {
                writeln!(out, "enum {}", enum_def.name).unwrap();
                for value in &enum_def.values {
                    write!(out, "  - {}", value.name).unwrap();
                    if let Some(v) = &value.value {
                        write!(out, " = {v}").unwrap();
                    }
                    if let Some(group) = &value.group {
                        write!(out, " [{group}]").unwrap();
                    }
                    out.push('\n');
                }
            }
        }
    }
    out
}

pub fn field_signature(field: &Field) -> String {
    let mut signature = format!("{}: {}", field.name, field.field_type);
    if let Some(length) = &field.length {
        write!(signature, "({length})").unwrap();
    }
    if field.nullable {
        signature.push('?');
    }
    if let Some(default) = &field.default_value {
        write!(signature, " = {}", default.value).unwrap();
    }
    if let Some(target) = &field.reference_target {
        write!(signature, " -> {target}").unwrap();
    }
    signature
}
