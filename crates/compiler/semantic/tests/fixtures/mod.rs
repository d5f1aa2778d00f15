//! Whole documents from `test_data/`.

use modelmark_compiler_diagnostics::DiagnosticCode;
use modelmark_test_utils::{list_fixtures, read_fixture};

use crate::{analyze_source, full_names, merged_outline};

#[test]
fn shop_resolves_cleanly() {
    let analyzed = analyze_source(&read_fixture("current/shop.md")).unwrap();
    assert!(analyzed.diagnostics.is_empty(), "{:?}", analyzed.diagnostics);

    let customer = analyzed.model("Customer");
    assert_eq!(customer.resolved_parents, vec!["IAuditable", "IEntity"]);
    assert_eq!(
        full_names(customer),
        vec![
            "CreatedBy",
            "ModifiedBy",
            "_id",
            "CreatedAt",
            "UpdatedAt",
            "Name",
            "Email",
            "Tenant_id",
            "Status",
            "Notes",
        ]
    );
    let email = customer.full_field("Email").unwrap();
    assert!(email.is_unique());
    assert_eq!(email.max_length, Some(320));

    for name in ["Order", "OrderLine", "Product"] {
        let model = analyzed.model(name);
        assert_eq!(model.resolved_parents, vec!["IEntity"], "{name}");
        let keys: Vec<_> = model.primary_keys().map(|f| f.name.as_str()).collect();
        assert_eq!(keys, vec!["_id"], "{name}");
    }

    let order = analyzed.model("Order");
    assert!(order.full_field("PlacedAt").unwrap().is_indexed());
    assert!(order.full_field("PaymentToken").unwrap().is_json_ignored());
    assert_eq!(
        order.full_field("UpdatedAt").unwrap().update_expression.as_deref(),
        Some("CURRENT_TIMESTAMP")
    );

    let product = analyzed.model("Product");
    assert!(product.full_field("InStock").unwrap().is_excluded());
    assert_eq!(
        product.full_field("Price").unwrap().column_type.as_deref(),
        Some("decimal(18,2)")
    );
}

#[test]
fn crm_merged_fields() {
    let analyzed = analyze_source(&read_fixture("legacy/crm.md")).unwrap();
    assert!(analyzed.diagnostics.is_empty());
    insta::assert_snapshot!(merged_outline(&analyzed.document), @r"
    interface IAuditable
      CreatedOn: datetime
      CreatedBy: string(50)
    model BaseEntity (abstract)
      Id: guid [pk]
    model Region <- BaseEntity
      Id: guid [pk] (from BaseEntity)
      Name: string(100) [required]
    model Account <- BaseEntity, IAuditable
      Id: guid [pk] (from BaseEntity)
      CreatedOn: datetime (from IAuditable)
      CreatedBy: string(50) (from IAuditable)
      Name: string(200)
      RegionId: guid [fk->Region]
      OwnerKey: string(20)
      Kind: enum
    model Contact <- BaseEntity
      Id: guid [pk] (from BaseEntity)
      AccountId: guid [fk->Account]
      Email: string(200)
    ");
}

#[test]
fn cycles_fixture_is_repaired() {
    let analyzed = analyze_source(&read_fixture("current/cycles.md")).unwrap();
    assert_eq!(analyzed.warning_codes(), vec![DiagnosticCode::CycleDetected]);
    assert_eq!(analyzed.diagnostics.all()[0].location.line, 9);

    assert_eq!(analyzed.model("B").resolved_parents, vec!["Base"]);
    assert_eq!(full_names(analyzed.model("A")), vec!["Id", "b", "c", "a"]);
    assert!(analyzed.model("A").full_field("Id").unwrap().is_primary_key());
}

#[test]
fn invalid_fixtures_fail() {
    let fixtures = list_fixtures("invalid");
    assert_eq!(fixtures, vec!["two_defaults.md", "unknown_parent.md"]);

    let expected = [
        (DiagnosticCode::DuplicateDefaultEntity, 4),
        (DiagnosticCode::UnknownReference, 1),
    ];
    for (fixture, (code, line)) in fixtures.iter().zip(expected) {
        let err = analyze_source(&read_fixture(&format!("invalid/{fixture}"))).unwrap_err();
        assert_eq!(err.code(), code, "{fixture}");
        assert_eq!(err.location().line, line, "{fixture}");
    }
}
