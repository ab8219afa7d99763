// storefront/app/src/models/order.rs

use super::order_item::OrderItem;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Order row without its line items, as listed by `GET /orders`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
  pub id: i64,
  pub order_number: String,
  pub customer_name: String,
  pub customer_email: String,
  pub total_cents: i64,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Order {
  pub id: i64,
  pub order_number: String,
  pub customer_name: String,
  pub customer_email: String,
  pub total_cents: i64,
  pub created_at: DateTime<Utc>,
  #[sqlx(skip)]
  pub items: Vec<OrderItem>,
}

impl Order {
  pub fn summary(&self) -> OrderSummary {
    OrderSummary {
      id: self.id,
      order_number: self.order_number.clone(),
      customer_name: self.customer_name.clone(),
      customer_email: self.customer_email.clone(),
      total_cents: self.total_cents,
      created_at: self.created_at,
    }
  }

  /// Sum of `price_at_purchase_cents * quantity` over the items; `None` on overflow.
  pub fn items_total_cents(&self) -> Option<i64> {
    self
      .items
      .iter()
      .try_fold(0i64, |acc, item| acc.checked_add(item.line_total_cents()?))
  }
}

/// Body of `POST /orders`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderRequest {
  pub customer_name: String,
  pub customer_email: String,
  pub items: Vec<OrderLineRequest>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineRequest {
  pub product_id: i64,
  pub quantity: i32,
}
