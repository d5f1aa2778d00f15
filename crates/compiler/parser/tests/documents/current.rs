use modelmark_compiler_parser::{Dialect, EntityKind, ModelKind, ReferentialAction, RelationKind};
use modelmark_test_utils::read_fixture;

use crate::{assert_parses_ok, field_signature};

#[test]
fn shop_document_shape() {
    let source = read_fixture("current/shop.md");
    let parsed = assert_parses_ok!(&source);
    let document = &parsed.document;

    assert_eq!(document.dialect, Dialect::Current);
    assert_eq!(document.namespace.as_deref(), Some("shop"));
    assert!(parsed.diagnostics.is_empty());
    assert_eq!(
        document.names().collect::<Vec<_>>(),
        vec![
            "IEntity",
            "IAuditable",
            "Customer",
            "Order",
            "OrderLine",
            "Product",
            "OrderStatus"
        ]
    );
    assert!(document.get("NotAnEntity").is_none());
    assert_eq!(document.get("OrderStatus").map(|e| e.kind()), Some(EntityKind::Enum));

    let entity = document.default_entity().unwrap();
    assert_eq!(entity.name, "IEntity");
    assert_eq!(entity.kind, ModelKind::Interface);
    assert_eq!(
        entity.description.as_deref(),
        Some("Columns carried by every persisted row.")
    );
}

#[test]
fn shop_foreign_keys_are_inferred_in_any_order() {
    let source = read_fixture("current/shop.md");
    let parsed = assert_parses_ok!(&source);
    let line = parsed.document.model("OrderLine").unwrap();
    let signatures: Vec<_> = line.fields.iter().map(field_signature).collect();
    assert_eq!(
        signatures,
        vec![
            "Order_id: guid -> Order",
            "Product_id: guid -> Product",
            "Quantity: integer = 1",
        ]
    );

    let customer = parsed.document.model("Customer").unwrap();
    assert!(!customer.field("Tenant_id").unwrap().is_foreign_key());
    assert!(!parsed.document.model("IEntity").unwrap().field("_id").unwrap().is_foreign_key());
}

#[test]
fn shop_constraints() {
    let source = read_fixture("current/shop.md");
    let parsed = assert_parses_ok!(&source);

    let customer = parsed.document.model("Customer").unwrap();
    assert_eq!(customer.label.as_deref(), Some("Client"));
    assert_eq!(customer.indexes[0].name, "UK_Email_Tenant_id");
    assert_eq!(customer.relations[0].name, "Orders");
    assert_eq!(customer.relations[0].kind, RelationKind::ToMany);
    assert_eq!(
        customer.relations[0].description.as_deref(),
        Some("Orders placed by this customer")
    );

    let order = parsed.document.model("Order").unwrap();
    let relation = &order.relations[0];
    assert_eq!(relation.name, "customer");
    assert_eq!(relation.target, "Customer");
    assert_eq!(relation.from_field.as_deref(), Some("Customer_id"));
    assert_eq!(relation.on_delete, Some(ReferentialAction::Cascade));
    assert_eq!(order.indexes[0].name, "ByPlacedAt");
    assert_eq!(order.indexes[0].fields, vec!["PlacedAt", "Total"]);
    assert_eq!(order.indexes[0].description.as_deref(), Some("reporting"));
    assert_eq!(order.metadata.get("table").map(String::as_str), Some("orders"));
}

#[test]
fn shop_enums() {
    let source = read_fixture("current/shop.md");
    let parsed = assert_parses_ok!(&source);

    let channel = parsed.document.model("Order").unwrap().field("Channel").unwrap();
    assert!(channel.is_enum());
    let options: Vec<_> = channel
        .enum_options
        .iter()
        .map(|o| (o.name.as_str(), o.value.as_deref()))
        .collect();
    assert_eq!(options, vec![("Web", Some("1")), ("Store", Some("2"))]);
    assert_eq!(channel.description.as_deref(), Some("Where the order came from"));

    let status = parsed.document.enum_def("OrderStatus").unwrap();
    assert_eq!(status.description.as_deref(), Some("Lifecycle of an order"));
    let groups: Vec<_> = status.values.iter().map(|v| v.group.as_deref()).collect();
    assert_eq!(
        groups,
        vec![Some("Open"), Some("Open"), Some("Fulfilled"), Some("Closed")]
    );
    assert_eq!(
        status.values[3].description.as_deref(),
        Some("Cancelled by the customer")
    );
}

#[test]
fn cycle_fixture_parses_unresolved() {
    let source = read_fixture("current/cycles.md");
    let parsed = assert_parses_ok!(&source);
    let inherits: Vec<_> = parsed
        .document
        .models()
        .map(|m| (m.name.as_str(), m.inherits.join(",")))
        .collect();
    assert_eq!(
        inherits,
        vec![
            ("Base", String::new()),
            ("A", "C".to_string()),
            ("B", "A".to_string()),
            ("C", "B".to_string()),
        ]
    );
    assert!(parsed.document.models().all(|m| m.full_fields.is_empty()));
}
