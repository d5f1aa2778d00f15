use modelmark_compiler_diagnostics::DiagnosticCode;
use modelmark_compiler_parser::{ReferentialAction, RelationKind};

use crate::{assert_parses_err, assert_parses_ok, outline};

#[test]
fn entity_level_unique_directive() {
    let parsed = assert_parses_ok!("## User\n- Email: string\n- Tenant_id: guid\n- @unique(Email, Tenant_id)\n");
    let user = parsed.document.model("User").unwrap();
    assert_eq!(user.indexes.len(), 1);
    let index = &user.indexes[0];
    assert!(index.is_unique);
    assert_eq!(index.fields, vec!["Email", "Tenant_id"]);
    assert_eq!(index.name, "UK_Email_Tenant_id");
}

#[test]
fn relations_section() {
    let parsed = assert_parses_ok!(
        r#"## Customer
## Order
- Customer_id: guid

### Relations
- >Customer "Who placed it"
  -- from: Customer_id
  -- onDelete: Restrict
- <OrderLine as Lines #line items
- @relation(billing, ->Customer, from: Customer_id, onUpdate: Cascade)

## OrderLine
"#
    );
    let order = parsed.document.model("Order").unwrap();
    assert_eq!(order.relations.len(), 3);

    let customer = &order.relations[0];
    assert_eq!(customer.kind, RelationKind::ToOne);
    assert_eq!(customer.description.as_deref(), Some("Who placed it"));
    assert_eq!(customer.from_field.as_deref(), Some("Customer_id"));
    assert_eq!(customer.on_delete, Some(ReferentialAction::Restrict));

    assert_eq!(order.relations[1].name, "Lines");
    assert_eq!(order.relations[1].kind, RelationKind::ToMany);
    assert_eq!(order.relations[2].name, "billing");
    assert_eq!(order.relations[2].on_update, Some(ReferentialAction::Cascade));
}

#[test]
fn indexes_and_metadata_sections() {
    let parsed = assert_parses_ok!(
        "## Product
- Sku: string(32)
- Name: string(100)
- Category: string(50)

### Indexes
- BySku: Sku @unique #lookups
- Name, Category
  -- unique: true

### metadata
- table: products
- schema: \"catalog\"
"
    );
    let product = parsed.document.model("Product").unwrap();
    assert_eq!(product.indexes[0].name, "BySku");
    assert!(product.indexes[0].is_unique);
    assert_eq!(product.indexes[1].name, "UK_Name_Category");
    assert_eq!(product.metadata.get("table").map(String::as_str), Some("products"));
    assert_eq!(product.metadata.get("schema").map(String::as_str), Some("catalog"));
}

#[test]
fn unknown_action_is_structural() {
    let err = assert_parses_err!("## A\n## B\n### Relations\n- >A\n  -- onDelete: Explode\n");
    assert_eq!(err.code(), DiagnosticCode::StructuralParseError);
    assert_eq!(err.location().line, 5);
}

#[test]
fn enum_blocks_with_groups() {
    let parsed = assert_parses_ok!(
        r#"## OrderStatus ::enum
### Open
- Pending = 0 "Waiting for payment"
- Paid = 1
### Closed
- Shipped(Sent) = 2 @group(Fulfilled)
  -- description: Left the warehouse
- Cancelled = 3
"#
    );
    insta::assert_snapshot!(outline(&parsed.document), @r"
    enum OrderStatus
      - Pending = 0 [Open]
      - Paid = 1 [Open]
      - Shipped = 2 [Fulfilled]
      - Cancelled = 3 [Closed]
    ");
    let status = parsed.document.enum_def("OrderStatus").unwrap();
    assert_eq!(status.values[0].description.as_deref(), Some("Waiting for payment"));
    assert_eq!(status.values[2].label.as_deref(), Some("Sent"));
    assert_eq!(status.values[2].description.as_deref(), Some("Left the warehouse"));
}

#[test]
fn unknown_sections_warn() {
    let parsed = assert_parses_ok!("## A\n- x: string\n### Triggers\n- whatever goes here\n  -- and here\n");
    assert_eq!(parsed.document.model("A").unwrap().fields.len(), 1);
    let warnings = parsed.diagnostics.warnings();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].code, DiagnosticCode::UnknownSection);
    assert_eq!(warnings[0].location.line, 3);
}
