use modelmark_compiler_diagnostics::DiagnosticCode;
use modelmark_compiler_semantic::analyze;

use crate::{assert_semantic_err, assert_semantic_ok, full_names, merged_outline};

#[test]
fn fields_flow_down_a_chain() {
    let analyzed = assert_semantic_ok!(
        "## A\n- x: string\n- onlyA: integer\n## B : A\n- y: string\n## C : B\n- z: string\n"
    );
    assert!(analyzed.diagnostics.is_empty());
    assert_eq!(full_names(analyzed.model("C")), vec!["x", "onlyA", "y", "z"]);

    let declared = analyzed.model("A").field("x").unwrap();
    let inherited = analyzed.model("C").full_field("x").unwrap();
    assert_eq!(declared, inherited);
    assert!(!std::ptr::eq(declared, inherited));
    assert_eq!(
        analyzed.model("C").full_fields.iter().filter(|f| f.name == "x").count(),
        1
    );
}

#[test]
fn closest_declaration_shadows() {
    let analyzed = assert_semantic_ok!(
        "## A\n- x: string\n## B : A\n- x: string(10)\n## C : B\n"
    );
    let c = analyzed.model("C");
    assert_eq!(full_names(c), vec!["x"]);
    assert_eq!(c.full_field("x").unwrap().declared_in, "B");
}

#[test]
fn siblings_get_independent_copies() {
    let mut analyzed = assert_semantic_ok!(
        "## Base\n- Code: string\n## Left : Base\n## Right : Base\n"
    );
    let left = analyzed.document.model_mut("Left").unwrap();
    left.full_fields[0].description = Some("changed through Left".to_string());

    assert!(analyzed.model("Right").full_fields[0].description.is_none());
    assert!(analyzed.model("Base").fields[0].description.is_none());
}

#[test]
fn interfaces_merge_with_models() {
    let analyzed = assert_semantic_ok!(
        "## IHasName ::interface\n- Name: string\n## ITagged ::interface : IHasName\n- Tag: string\n## Thing : ITagged\n- Size: integer\n"
    );
    insta::assert_snapshot!(merged_outline(&analyzed.document), @r"
    interface IHasName
      Name: string
    interface ITagged <- IHasName
      Name: string (from IHasName)
      Tag: string
    model Thing <- ITagged
      Name: string (from IHasName)
      Tag: string (from ITagged)
      Size: integer
    ");
}

#[test]
fn resolving_twice_changes_nothing() {
    let mut analyzed = assert_semantic_ok!(
        "## IEntity ::interface @default\n- _id: guid [PK]\n## A : B\n- a: string [MaxLength(5)]\n## B : A\n- b: string\n## C\n"
    );
    let first = analyzed.document.clone();
    let diagnostics = analyze(&mut analyzed.document).unwrap();
    assert_eq!(analyzed.document, first);
    assert!(!diagnostics.contains_code(DiagnosticCode::CycleDetected));
}

#[test]
fn dangling_parent_is_fatal() {
    let err = assert_semantic_err!("## A\n- x: string\n## B : A, Missing\n");
    assert_eq!(err.code(), DiagnosticCode::UnknownReference);
    assert_eq!(err.location().line, 3);
    assert_eq!(err.location().text, "## B : A, Missing");
}

#[test]
fn illegal_edges_are_fatal() {
    let err = assert_semantic_err!("## Base\n## IThing ::interface : Base\n");
    assert_eq!(err.code(), DiagnosticCode::InvalidInheritance);

    let err = assert_semantic_err!("## Kind ::enum\n- A\n## Thing : Kind\n");
    assert_eq!(err.code(), DiagnosticCode::InvalidInheritance);
    assert_eq!(err.location().line, 3);
}
