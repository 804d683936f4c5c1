//! Cart route handlers.
//!
//! The cart lives in the session. For signed-in customers every change is
//! mirrored to `cart_items` so it follows them to the next device.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use green_aura_core::{Cart, CartLine, ProductId};

use crate::error::Result;
use crate::middleware::RequireCustomer;
use crate::services::cart::CartService;
use crate::state::AppState;

/// Cart contents with totals.
#[derive(Debug, Serialize)]
pub struct CartView {
    pub lines: Vec<CartLine>,
    pub item_count: u32,
    pub subtotal: Decimal,
    pub subtotal_display: String,
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        Self {
            lines: cart.lines().to_vec(),
            item_count: cart.item_count(),
            subtotal: cart.subtotal(),
            subtotal_display: cart.subtotal_price().display(),
        }
    }
}

/// Body of `POST /cart/items`.
#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub product_id: ProductId,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

const fn default_quantity() -> u32 {
    1
}

/// Body of `PATCH /cart/items/{product_id}`.
#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub quantity: u32,
}

/// GET /cart
#[instrument(skip(state, session, user), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    RequireCustomer(user): RequireCustomer,
) -> Result<Json<CartView>> {
    let cart = CartService::new(state.pool(), &session, Some(user.id))
        .load()
        .await?;
    Ok(Json(CartView::from(&cart)))
}

/// POST /cart/items
#[instrument(skip(state, session, user), fields(user_id = %user.id))]
pub async fn add_item(
    State(state): State<AppState>,
    session: Session,
    RequireCustomer(user): RequireCustomer,
    Json(req): Json<AddItemRequest>,
) -> Result<Json<CartView>> {
    let cart = CartService::new(state.pool(), &session, Some(user.id))
        .add(req.product_id, req.quantity)
        .await?;
    Ok(Json(CartView::from(&cart)))
}

/// PATCH /cart/items/{product_id}
///
/// A quantity of zero removes the line.
#[instrument(skip(state, session, user), fields(user_id = %user.id))]
pub async fn update_item(
    State(state): State<AppState>,
    session: Session,
    RequireCustomer(user): RequireCustomer,
    Path(product_id): Path<ProductId>,
    Json(req): Json<UpdateItemRequest>,
) -> Result<Json<CartView>> {
    let cart = CartService::new(state.pool(), &session, Some(user.id))
        .set_quantity(product_id, req.quantity)
        .await?;
    Ok(Json(CartView::from(&cart)))
}

/// DELETE /cart/items/{product_id}
#[instrument(skip(state, session, user), fields(user_id = %user.id))]
pub async fn remove_item(
    State(state): State<AppState>,
    session: Session,
    RequireCustomer(user): RequireCustomer,
    Path(product_id): Path<ProductId>,
) -> Result<Json<CartView>> {
    let cart = CartService::new(state.pool(), &session, Some(user.id))
        .remove(product_id)
        .await?;
    Ok(Json(CartView::from(&cart)))
}

/// DELETE /cart
#[instrument(skip(state, session, user), fields(user_id = %user.id))]
pub async fn clear(
    State(state): State<AppState>,
    session: Session,
    RequireCustomer(user): RequireCustomer,
) -> Result<StatusCode> {
    CartService::new(state.pool(), &session, Some(user.id))
        .clear()
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use green_aura_core::OrganizationId;

    use super::*;

    #[test]
    fn test_cart_view_totals() {
        let cart = Cart::from_lines(vec![CartLine {
            product_id: ProductId::random(),
            organization_id: OrganizationId::random(),
            name: "Spinach".to_owned(),
            unit: "bunch".to_owned(),
            unit_price: Decimal::new(2500, 2),
            image_url: None,
            quantity: 2,
        }]);
        let view = CartView::from(&cart);
        assert_eq!(view.item_count, 2);
        assert_eq!(view.subtotal, Decimal::new(50, 0));
        assert_eq!(view.lines.len(), 1);
    }

    #[test]
    fn test_add_item_quantity_defaults_to_one() {
        let id = ProductId::random();
        let req: AddItemRequest =
            serde_json::from_str(&format!(r#"{{"product_id":"{id}"}}"#)).unwrap();
        assert_eq!(req.quantity, 1);
        assert_eq!(req.product_id, id);
    }
}
