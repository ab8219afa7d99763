// storefront/app/src/store/mod.rs

//! Persistence ports and their adapters.
//!
//! Handlers and pipelines only see the traits below. `postgres` backs them
//! with sqlx; `memory` keeps everything in-process with the same locking
//! behaviour and is used by tests and by `STORE_BACKEND=memory`.

pub mod memory;
pub mod postgres;

use crate::errors::Result;
use crate::models::{NewProduct, Order, OrderItem, OrderSummary, Product, ProductPatch};
use async_trait::async_trait;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Product row as read under an exclusive lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockedProduct {
  pub id: i64,
  pub name: String,
  pub price_cents: i64,
  pub stock_quantity: i32,
}

/// Order header written at the end of a placement.
#[derive(Debug, Clone)]
pub struct NewOrder {
  pub order_number: String,
  pub customer_name: String,
  pub customer_email: String,
  pub total_cents: i64,
}

/// A line whose stock has been decremented, priced at the locked price.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservedLine {
  pub product_id: i64,
  pub product_name: String,
  pub quantity: i32,
  pub price_at_purchase_cents: i64,
}

#[async_trait]
pub trait CatalogRepository: Send + Sync {
  /// All products, newest first.
  async fn list_products(&self) -> Result<Vec<Product>>;

  async fn get_product(&self, id: i64) -> Result<Option<Product>>;

  async fn create_product(&self, product: &NewProduct) -> Result<Product>;

  /// Applies a partial update. `None` when the product does not exist.
  async fn update_product(&self, id: i64, patch: &ProductPatch) -> Result<Option<Product>>;

  /// `false` when the product does not exist. Fails with `Conflict` while
  /// order items still reference it.
  async fn delete_product(&self, id: i64) -> Result<bool>;

  /// Number of products, used to decide whether to seed.
  async fn count_products(&self) -> Result<i64>;
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
  /// Order headers, newest first.
  async fn list_orders(&self) -> Result<Vec<OrderSummary>>;

  /// Oldest order carrying `order_number`, with its items.
  async fn find_by_order_number(&self, order_number: &str) -> Result<Option<Order>>;

  /// Opens a transaction for placing one order.
  async fn begin(&self) -> Result<Box<dyn OrderTransaction>>;
}

/// One order placement in flight.
///
/// Row locks taken by `lock_product` are held until `commit` or `rollback`.
/// Dropping the transaction without committing rolls it back.
#[async_trait]
pub trait OrderTransaction: Send {
  /// Locks the product row exclusively and returns its current state, or
  /// `None` when no such product exists.
  async fn lock_product(&mut self, product_id: i64) -> Result<Option<LockedProduct>>;

  async fn decrement_stock(&mut self, product_id: i64, quantity: i32) -> Result<()>;

  async fn insert_order(&mut self, order: &NewOrder) -> Result<OrderSummary>;

  async fn insert_order_item(&mut self, order_id: i64, line: &ReservedLine) -> Result<OrderItem>;

  async fn commit(self: Box<Self>) -> Result<()>;

  async fn rollback(self: Box<Self>) -> Result<()>;
}
