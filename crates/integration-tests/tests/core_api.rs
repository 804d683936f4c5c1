//! Tests of the public `green-aura-core` API as other crates use it.
//!
//! No server or database is needed.

#![allow(clippy::unwrap_used)]

use rust_decimal::Decimal;

use green_aura_core::{
    Access, Cart, CartLine, Email, MergeOutcome, OrderStatus, OrganizationId, Pincode, Price,
    ProductId, Role, decide,
};

fn line(org: OrganizationId, price: i64, qty: u32) -> CartLine {
    CartLine {
        product_id: ProductId::random(),
        organization_id: org,
        name: "Tomatoes".to_string(),
        unit: "kg".to_string(),
        unit_price: Decimal::new(price, 0),
        image_url: None,
        quantity: qty,
    }
}

// =============================================================================
// Order Status Tests
// =============================================================================

#[test]
fn test_status_chain_walks_to_delivered() {
    let mut status = OrderStatus::Pending;
    let mut seen = vec![status];
    while let Some(next) = status.next() {
        assert!(status.can_transition_to(next));
        status = next;
        seen.push(status);
    }
    assert_eq!(
        seen,
        [
            OrderStatus::Pending,
            OrderStatus::Confirmed,
            OrderStatus::OutForDelivery,
            OrderStatus::Delivered,
        ]
    );
    assert!(status.is_terminal());
}

#[test]
fn test_status_only_moves_one_step_forward() {
    for from in [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::OutForDelivery,
        OrderStatus::Delivered,
    ] {
        for to in [
            OrderStatus::Pending,
            OrderStatus::Confirmed,
            OrderStatus::OutForDelivery,
            OrderStatus::Delivered,
        ] {
            assert_eq!(
                from.can_transition_to(to),
                from.next() == Some(to),
                "{from} -> {to}"
            );
        }
    }
}

#[test]
fn test_status_wire_names() {
    let json = serde_json::to_string(&OrderStatus::OutForDelivery).unwrap();
    assert_eq!(json, "\"out_for_delivery\"");
    assert_eq!("delivered".parse::<OrderStatus>().unwrap(), OrderStatus::Delivered);
    assert!("shipped".parse::<OrderStatus>().is_err());
}

// =============================================================================
// Cart Tests
// =============================================================================

#[test]
fn test_cart_subtotal_and_grouping() {
    let (a, b) = (OrganizationId::random(), OrganizationId::random());
    let cart = Cart::from_lines(vec![line(a, 40, 2), line(b, 25, 1), line(a, 10, 3)]);

    assert_eq!(cart.item_count(), 6);
    assert_eq!(cart.subtotal(), Decimal::new(135, 0));

    let groups = cart.group_by_organization();
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].0, a);
    assert_eq!(groups[0].1.len(), 2);
}

#[test]
fn test_cart_merge_prefers_saved_cart() {
    let org = OrganizationId::random();
    let session = Cart::from_lines(vec![line(org, 10, 1)]);
    let saved = vec![line(org, 20, 2)];

    assert_eq!(
        session.merge_with_server(saved.clone()),
        MergeOutcome::UseServer(saved)
    );
    assert_eq!(
        session.merge_with_server(Vec::new()),
        MergeOutcome::PushLocal(session.lines().to_vec())
    );
}

#[test]
fn test_cart_round_trips_through_session_json() {
    let cart = Cart::from_lines(vec![line(OrganizationId::random(), 99, 4)]);
    let json = serde_json::to_value(&cart).unwrap();
    let back: Cart = serde_json::from_value(json).unwrap();
    assert_eq!(back, cart);
}

// =============================================================================
// Route Guard Tests
// =============================================================================

#[test]
fn test_guard_table() {
    let customer = Some(Some(Role::Customer));
    let organization = Some(Some(Role::Organization));

    assert_eq!(decide("/products", None), Access::Allow);
    assert_eq!(decide("/checkout", None), Access::Login);
    assert_eq!(decide("/owner/products/1", None), Access::Login);
    assert_eq!(decide("/cart", organization), Access::Redirect("/owner"));
    assert_eq!(decide("/owner", customer), Access::Redirect("/"));
    assert_eq!(decide("/auth/login", organization), Access::Redirect("/owner"));
    assert_eq!(decide("/auth/logout", customer), Access::Allow);
    assert_eq!(decide("/owner", organization), Access::Allow);
}

// =============================================================================
// Value Type Tests
// =============================================================================

#[test]
fn test_email_and_pincode_validation() {
    assert_eq!(
        Email::parse(" Farmer@Example.COM ").unwrap().as_str(),
        "farmer@example.com"
    );
    assert!(Email::parse("farmer@localhost").is_err());

    assert_eq!(Pincode::parse("560001").unwrap().as_str(), "560001");
    assert!(Pincode::parse("060001").is_err());
    assert!(Pincode::parse("5600").is_err());
}

#[test]
fn test_price_display_in_rupees() {
    let price = Price::inr(Decimal::new(4050, 2));
    assert_eq!(price.display(), "₹40.50");
    assert_eq!(price.line_total(3).display(), "₹121.50");
}
