//! Orders, order items and payments.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use green_aura_core::{
    AddressId, OrderId, OrderItemId, OrderStatus, OrganizationId, PaymentId, PaymentStatus,
    ProductId, UserId,
};

use super::{Address, Organization};

/// How orders are paid for. Online payment is not wired up, so every
/// order is collected on delivery.
pub const PAYMENT_METHOD_COD: &str = "cash_on_delivery";

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub organization_id: OrganizationId,
    pub delivery_address_id: AddressId,
    pub status: OrderStatus,
    pub delivery_charge: Decimal,
    pub total_amount: Decimal,
    pub order_date: DateTime<Utc>,
    pub expected_delivery_time: Option<DateTime<Utc>>,
}

/// A row in an order history or owner order list.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OrderSummary {
    pub id: OrderId,
    pub user_id: UserId,
    pub organization_id: OrganizationId,
    pub organization_name: String,
    pub status: OrderStatus,
    pub total_amount: Decimal,
    pub order_date: DateTime<Utc>,
    pub item_count: i64,
}

/// A purchased line with the product details joined in.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub product_name: String,
    pub unit: String,
    pub image_url: Option<String>,
    pub quantity: i32,
    pub price_at_order: Decimal,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Payment {
    pub id: PaymentId,
    pub order_id: OrderId,
    pub amount: Decimal,
    pub payment_method: String,
    pub status: PaymentStatus,
    pub transaction_id: Option<String>,
    pub gateway_response: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

/// Contact details of the customer, shown to the fulfilling farm.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OrderCustomer {
    pub full_name: Option<String>,
    pub email: String,
    pub phone_number: Option<String>,
}

/// Everything needed to show one order.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub address: Address,
    pub organization: Organization,
    pub payment: Option<Payment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer: Option<OrderCustomer>,
    pub next_status: Option<OrderStatus>,
}
