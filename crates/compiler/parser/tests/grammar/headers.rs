use modelmark_compiler_diagnostics::DiagnosticCode;
use modelmark_compiler_parser::{EntityKind, ModelKind};

use crate::{assert_parses_err, assert_parses_ok};

#[test]
fn header_parts_reach_the_model() {
    let parsed = assert_parses_ok!(
        "## Base\n## Customer(Client) : Base @table(customers) @abstract #People who buy\n- Name: string"
    );
    let customer = parsed.document.model("Customer").unwrap();
    assert_eq!(customer.label.as_deref(), Some("Client"));
    assert_eq!(customer.inherits, vec!["Base"]);
    assert_eq!(customer.description.as_deref(), Some("People who buy"));
    assert!(customer.is_abstract);
    assert!(!customer.is_default);
    let raw: Vec<_> = customer.attributes.iter().map(|a| a.raw.as_str()).collect();
    assert_eq!(raw, vec!["table(customers)", "abstract"]);
}

#[test]
fn kinds_from_markers() {
    let parsed = assert_parses_ok!(
        "## IEntity ::interface @default\n- _id: guid\n## Status ::enum\n- Active\n## Thing\n"
    );
    let kinds: Vec<_> = parsed.document.entities().map(|e| e.kind()).collect();
    assert_eq!(
        kinds,
        vec![EntityKind::Interface, EntityKind::Enum, EntityKind::Model]
    );
    let entity = parsed.document.model("IEntity").unwrap();
    assert_eq!(entity.kind, ModelKind::Interface);
    assert!(entity.is_default);
}

#[test]
fn quote_lines_extend_the_description() {
    let parsed = assert_parses_ok!("## Order #Placed orders\n> Immutable once paid.\n- Total: money");
    assert_eq!(
        parsed.document.model("Order").unwrap().description.as_deref(),
        Some("Placed orders\nImmutable once paid.")
    );
}

#[test]
fn malformed_headers_are_fatal() {
    let err = assert_parses_err!("## Order Line\n- x: string");
    assert_eq!(err.code(), DiagnosticCode::StructuralParseError);
    assert_eq!(err.location().line, 1);
    assert_eq!(err.location().text, "## Order Line");

    let err = assert_parses_err!("## Order @index(Total\n");
    assert_eq!(err.code(), DiagnosticCode::UnterminatedDelimiter);
}
