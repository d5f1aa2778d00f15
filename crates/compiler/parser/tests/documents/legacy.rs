use modelmark_compiler_diagnostics::DiagnosticCode;
use modelmark_compiler_parser::{
    DialectSelection, Dialect, EntityKind, ParseOptions,
};
use modelmark_test_utils::read_fixture;

use crate::{assert_parses_ok, outline};

#[test]
fn crm_outline() {
    let source = read_fixture("legacy/crm.md");
    let parsed = assert_parses_ok!(&source);
    assert_eq!(parsed.document.dialect, Dialect::Legacy);
    assert!(parsed.document.namespace.is_none());
    insta::assert_snapshot!(outline(&parsed.document), @r"
    interface IAuditable
      - CreatedOn: datetime
      - CreatedBy: string(50)
    model BaseEntity
      - Id: guid
    model Region : BaseEntity
      - Name: string(100)
    model Account : BaseEntity, IAuditable
      - Name: string(200)
      - RegionId: guid -> Region
      - OwnerKey: string(20)
      - Kind: enum = Person
    model Contact : BaseEntity
      - AccountId: guid -> Account
      - Email: string(200)
      # IX_Email (Email)
    ");
}

#[test]
fn crm_abstract_base() {
    let source = read_fixture("legacy/crm.md");
    let parsed = assert_parses_ok!(&source);
    let base = parsed.document.model("BaseEntity").unwrap();
    assert!(base.is_abstract);
    assert_eq!(base.field("Id").unwrap().framework_attributes[0].name, "Key");
    assert_eq!(
        parsed.document.get("IAuditable").map(|e| e.kind()),
        Some(EntityKind::Interface)
    );
}

#[test]
fn forced_dialect_overrides_detection() {
    let source = "## Order\n- CustomerId: guid\n## Customer\n";
    let parsed = assert_parses_ok!(source);
    assert!(!parsed.document.model("Order").unwrap().field("CustomerId").unwrap().is_foreign_key());

    let options = ParseOptions {
        dialect: DialectSelection::Legacy,
        ..ParseOptions::default()
    };
    let parsed = assert_parses_ok!(source, &options);
    assert_eq!(parsed.document.dialect, Dialect::Legacy);
    let field = parsed.document.model("Order").unwrap().field("CustomerId").unwrap().clone();
    assert_eq!(field.reference_target.as_deref(), Some("Customer"));
}

#[test]
fn legacy_markers_and_interface_constraints_are_rejected() {
    let options = ParseOptions {
        dialect: DialectSelection::Legacy,
        ..ParseOptions::default()
    };

    let err = modelmark_compiler_parser::parse_document("# Status ::enum\n- Active\n", &options)
        .unwrap_err();
    assert_eq!(err.code(), DiagnosticCode::StructuralParseError);

    let err = modelmark_compiler_parser::parse_document(
        "# IAuditable @index(CreatedOn)\n- CreatedOn: datetime\n",
        &options,
    )
    .unwrap_err();
    assert_eq!(err.code(), DiagnosticCode::StructuralParseError);
    assert_eq!(err.location().line, 1);
}
