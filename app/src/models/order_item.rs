// storefront/app/src/models/order_item.rs

use serde::Serialize;
use sqlx::FromRow;

/// One line of a placed order. `price_at_purchase_cents` is the product price
/// observed under the row lock when the order was placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
  pub id: i64,
  #[serde(skip)]
  pub order_id: i64,
  pub product_id: i64,
  pub product_name: String,
  pub quantity: i32,
  pub price_at_purchase_cents: i64,
}

impl OrderItem {
  pub fn line_total_cents(&self) -> Option<i64> {
    self.price_at_purchase_cents.checked_mul(i64::from(self.quantity))
  }
}
