use modelmark_compiler_diagnostics::DiagnosticCode;

use crate::{assert_semantic_err, assert_semantic_ok, full_names};

#[test]
fn default_interface_supplies_primary_key() {
    let analyzed = assert_semantic_ok!(
        "## IEntity ::interface @default\n- _id: guid [PK]\n\n## Customer\n- Name: string\n"
    );
    let customer = analyzed.model("Customer");
    assert_eq!(customer.resolved_parents, vec!["IEntity"]);
    assert!(customer.inherits.is_empty());

    let id = customer.full_field("_id").unwrap();
    assert!(id.is_primary_key());
    assert!(!id.nullable);
    assert_eq!(id.declared_in, "IEntity");
    assert_eq!(customer.primary_keys().count(), 1);
}

#[test]
fn fallback_exemptions() {
    let analyzed = assert_semantic_ok!(
        "## Root @default\n- Id: guid [PK]\n## IAudit ::interface\n- By: string\n## Base @abstract\n- Code: string\n## Child : Base\n## Audited : IAudit\n"
    );
    assert!(analyzed.model("Root").resolved_parents.is_empty());
    assert!(analyzed.model("IAudit").resolved_parents.is_empty());
    assert!(analyzed.model("Base").resolved_parents.is_empty());
    assert_eq!(analyzed.model("Child").resolved_parents, vec!["Base"]);
    assert_eq!(analyzed.model("Audited").resolved_parents, vec!["IAudit", "Root"]);
    assert_eq!(full_names(analyzed.model("Audited")), vec!["By", "Id"]);
    assert_eq!(full_names(analyzed.model("Child")), vec!["Code"]);
}

#[test]
fn default_never_becomes_its_own_ancestor() {
    let analyzed = assert_semantic_ok!(
        "## Root\n- r: string\n## Base : Root @default\n- b: string\n## Leaf\n- l: string\n"
    );
    assert!(analyzed.diagnostics.is_empty());
    assert!(analyzed.model("Root").resolved_parents.is_empty());
    assert_eq!(full_names(analyzed.model("Leaf")), vec!["r", "b", "l"]);
}

#[test]
fn second_default_is_fatal() {
    let err = assert_semantic_err!("## A @default\n## B\n## C ::interface @default\n");
    assert_eq!(err.code(), DiagnosticCode::DuplicateDefaultEntity);
    assert_eq!(err.location().line, 3);
}
