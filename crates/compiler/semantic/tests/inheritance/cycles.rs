use modelmark_compiler_diagnostics::DiagnosticCode;
use modelmark_compiler_semantic::InheritanceGraph;

use crate::{assert_semantic_ok, full_names, Analyzed};

fn assert_acyclic(analyzed: &Analyzed) {
    let graph = InheritanceGraph::build(&analyzed.document).unwrap();
    for id in graph.ids() {
        for parent in graph.parents(id) {
            assert!(
                !graph.reaches(*parent, id),
                "'{}' still inherits from itself",
                graph.name(id)
            );
        }
    }
}

#[test]
fn two_entity_cycle() {
    let analyzed = assert_semantic_ok!("## A : B\n- a: string\n## B : A\n- b: string\n");
    assert_eq!(analyzed.warning_codes(), vec![DiagnosticCode::CycleDetected]);
    let warning = &analyzed.diagnostics.all()[0];
    assert_eq!(warning.location.line, 3);
    assert!(warning.related.is_empty());

    assert!(analyzed.model("B").inherits.is_empty());
    assert_eq!(full_names(analyzed.model("A")), vec!["b", "a"]);
    assert_eq!(full_names(analyzed.model("B")), vec!["b"]);
    assert_acyclic(&analyzed);
}

#[test]
fn every_cycle_is_repaired() {
    let analyzed = assert_semantic_ok!(
        "## X : Y\n## Y : X\n## P : Q\n## Q : R\n## R : P\n## Self : Self\n- s: string\n"
    );
    assert_eq!(
        analyzed.warning_codes(),
        vec![DiagnosticCode::CycleDetected; 3]
    );
    assert_eq!(full_names(analyzed.model("Self")), vec!["s"]);
    assert_acyclic(&analyzed);
}

#[test]
fn repaired_entity_falls_back_to_default() {
    let analyzed = assert_semantic_ok!(
        "## IEntity ::interface @default\n- _id: guid [PK]\n## A : B\n- a: string\n## B : A\n- b: string\n"
    );
    let warning = &analyzed.diagnostics.all()[0];
    assert_eq!(warning.code, DiagnosticCode::CycleDetected);
    assert_eq!(warning.related.len(), 1);
    assert_eq!(warning.related[0].0.line, 1);

    assert_eq!(analyzed.model("B").resolved_parents, vec!["IEntity"]);
    assert_eq!(analyzed.model("A").resolved_parents, vec!["B"]);
    assert_eq!(full_names(analyzed.model("A")), vec!["_id", "b", "a"]);
    assert_acyclic(&analyzed);
}

#[test]
fn cycle_through_interfaces() {
    let analyzed = assert_semantic_ok!(
        "## IA ::interface : IB\n- a: string\n## IB ::interface : IA\n- b: string\n## M : IA\n"
    );
    assert_eq!(analyzed.warning_codes(), vec![DiagnosticCode::CycleDetected]);
    assert_eq!(full_names(analyzed.model("M")), vec!["b", "a"]);
    assert_acyclic(&analyzed);
}
