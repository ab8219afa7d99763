// storefront/app/src/store/memory.rs

use super::{CatalogRepository, LockedProduct, NewOrder, OrderRepository, OrderTransaction, ReservedLine};
use crate::errors::{AppError, Result};
use crate::models::{NewProduct, Order, OrderItem, OrderSummary, Product, ProductPatch};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex as RowLock, OwnedMutexGuard};
use tracing::{debug, instrument, warn};

/// In-process store with the same row-locking behaviour as `PgStore`.
///
/// Every product has an async row lock. An order transaction keeps the lock of
/// every product it touched until it commits or rolls back; admin updates and
/// deletes wait on the same lock. Orders become visible only on commit.
#[derive(Clone, Default)]
pub struct MemoryStore {
  inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
  products: Mutex<BTreeMap<i64, Product>>,
  row_locks: Mutex<HashMap<i64, Arc<RowLock<()>>>>,
  orders: Mutex<Vec<Order>>,
  product_seq: AtomicI64,
  order_seq: AtomicI64,
  item_seq: AtomicI64,
}

impl Inner {
  fn row_lock(&self, product_id: i64) -> Arc<RowLock<()>> {
    self.row_locks.lock().entry(product_id).or_default().clone()
  }

  fn next_id(seq: &AtomicI64) -> i64 {
    seq.fetch_add(1, Ordering::SeqCst) + 1
  }
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Current stock of a product, bypassing row locks.
  pub fn stock_of(&self, product_id: i64) -> Option<i32> {
    self.inner.products.lock().get(&product_id).map(|p| p.stock_quantity)
  }

  /// Every committed order with its items, oldest first.
  pub fn committed_orders(&self) -> Vec<Order> {
    self.inner.orders.lock().clone()
  }

  fn with_current_names(&self, mut order: Order) -> Order {
    let products = self.inner.products.lock();
    for item in &mut order.items {
      if let Some(product) = products.get(&item.product_id) {
        item.product_name = product.name.clone();
      }
    }
    order
  }
}

#[async_trait]
impl CatalogRepository for MemoryStore {
  async fn list_products(&self) -> Result<Vec<Product>> {
    let mut products: Vec<Product> = self.inner.products.lock().values().cloned().collect();
    products.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    Ok(products)
  }

  async fn get_product(&self, id: i64) -> Result<Option<Product>> {
    Ok(self.inner.products.lock().get(&id).cloned())
  }

  #[instrument(name = "memory::create_product", skip(self, product), fields(name = %product.name))]
  async fn create_product(&self, product: &NewProduct) -> Result<Product> {
    let created = Product {
      id: Inner::next_id(&self.inner.product_seq),
      name: product.name.clone(),
      description: product.description.clone(),
      price_cents: product.price_cents,
      stock_quantity: product.stock_quantity,
      image_url: product.image_url.clone(),
      created_at: Utc::now(),
    };
    self.inner.products.lock().insert(created.id, created.clone());
    Ok(created)
  }

  #[instrument(name = "memory::update_product", skip(self, patch))]
  async fn update_product(&self, id: i64, patch: &ProductPatch) -> Result<Option<Product>> {
    let row_lock = self.inner.row_lock(id);
    let _row = row_lock.lock().await;

    let mut products = self.inner.products.lock();
    Ok(products.get_mut(&id).map(|product| {
      patch.apply_to(product);
      product.clone()
    }))
  }

  #[instrument(name = "memory::delete_product", skip(self))]
  async fn delete_product(&self, id: i64) -> Result<bool> {
    let row_lock = self.inner.row_lock(id);
    let _row = row_lock.lock().await;

    let referenced = self
      .inner
      .orders
      .lock()
      .iter()
      .any(|order| order.items.iter().any(|item| item.product_id == id));
    if referenced {
      return Err(AppError::Conflict("product is referenced by existing orders".to_string()));
    }
    let removed = self.inner.products.lock().remove(&id).is_some();
    if removed {
      // Ids are never reused; later lockers see the product gone.
      self.inner.row_locks.lock().remove(&id);
    }
    Ok(removed)
  }

  async fn count_products(&self) -> Result<i64> {
    Ok(self.inner.products.lock().len() as i64)
  }
}

#[async_trait]
impl OrderRepository for MemoryStore {
  async fn list_orders(&self) -> Result<Vec<OrderSummary>> {
    let mut orders: Vec<OrderSummary> = self.inner.orders.lock().iter().map(Order::summary).collect();
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    Ok(orders)
  }

  async fn find_by_order_number(&self, order_number: &str) -> Result<Option<Order>> {
    let found = self
      .inner
      .orders
      .lock()
      .iter()
      .filter(|order| order.order_number == order_number)
      .min_by_key(|order| order.id)
      .cloned();
    Ok(found.map(|order| self.with_current_names(order)))
  }

  async fn begin(&self) -> Result<Box<dyn OrderTransaction>> {
    Ok(Box::new(MemoryOrderTransaction {
      store: Arc::clone(&self.inner),
      held: BTreeMap::new(),
      stock_undo: Vec::new(),
      staged: Vec::new(),
    }))
  }
}

/// Transaction over a `MemoryStore`.
///
/// Stock decrements are applied immediately (the row lock keeps other
/// placements from seeing them) and undone on rollback or drop.
pub struct MemoryOrderTransaction {
  store: Arc<Inner>,
  held: BTreeMap<i64, OwnedMutexGuard<()>>,
  stock_undo: Vec<(i64, i32)>,
  staged: Vec<Order>,
}

impl MemoryOrderTransaction {
  fn undo_stock(&mut self) {
    if self.stock_undo.is_empty() {
      return;
    }
    let mut products = self.store.products.lock();
    for (product_id, quantity) in self.stock_undo.drain(..).rev() {
      if let Some(product) = products.get_mut(&product_id) {
        product.stock_quantity += quantity;
      }
    }
  }
}

impl Drop for MemoryOrderTransaction {
  fn drop(&mut self) {
    if !self.stock_undo.is_empty() {
      warn!(locked = self.held.len(), "Order transaction dropped without commit; rolling back.");
    }
    self.undo_stock();
  }
}

#[async_trait]
impl OrderTransaction for MemoryOrderTransaction {
  async fn lock_product(&mut self, product_id: i64) -> Result<Option<LockedProduct>> {
    if !self.held.contains_key(&product_id) {
      if !self.store.products.lock().contains_key(&product_id) {
        return Ok(None);
      }
      let guard = self.store.row_lock(product_id).lock_owned().await;
      self.held.insert(product_id, guard);
      debug!(product_id, "Product row locked.");
    }

    // The product may have been deleted while we waited for its lock.
    Ok(self.store.products.lock().get(&product_id).map(|p| LockedProduct {
      id: p.id,
      name: p.name.clone(),
      price_cents: p.price_cents,
      stock_quantity: p.stock_quantity,
    }))
  }

  async fn decrement_stock(&mut self, product_id: i64, quantity: i32) -> Result<()> {
    if !self.held.contains_key(&product_id) {
      return Err(AppError::Internal(format!(
        "stock decrement for product {} without holding its row lock",
        product_id
      )));
    }
    let mut products = self.store.products.lock();
    let product = products
      .get_mut(&product_id)
      .ok_or_else(|| AppError::Internal(format!("locked product {} disappeared", product_id)))?;
    if product.stock_quantity < quantity {
      return Err(AppError::Internal(format!(
        "stock of product {} would go negative",
        product_id
      )));
    }
    product.stock_quantity -= quantity;
    self.stock_undo.push((product_id, quantity));
    Ok(())
  }

  async fn insert_order(&mut self, order: &NewOrder) -> Result<OrderSummary> {
    let staged = Order {
      id: Inner::next_id(&self.store.order_seq),
      order_number: order.order_number.clone(),
      customer_name: order.customer_name.clone(),
      customer_email: order.customer_email.clone(),
      total_cents: order.total_cents,
      created_at: Utc::now(),
      items: Vec::new(),
    };
    let summary = staged.summary();
    self.staged.push(staged);
    Ok(summary)
  }

  async fn insert_order_item(&mut self, order_id: i64, line: &ReservedLine) -> Result<OrderItem> {
    let order = self
      .staged
      .iter_mut()
      .find(|o| o.id == order_id)
      .ok_or_else(|| AppError::Internal(format!("order {} is not part of this transaction", order_id)))?;
    let item = OrderItem {
      id: Inner::next_id(&self.store.item_seq),
      order_id,
      product_id: line.product_id,
      product_name: line.product_name.clone(),
      quantity: line.quantity,
      price_at_purchase_cents: line.price_at_purchase_cents,
    };
    order.items.push(item.clone());
    Ok(item)
  }

  async fn commit(self: Box<Self>) -> Result<()> {
    let mut this = self;
    let staged = std::mem::take(&mut this.staged);
    this.store.orders.lock().extend(staged);
    this.stock_undo.clear();
    Ok(())
  }

  async fn rollback(self: Box<Self>) -> Result<()> {
    let mut this = self;
    this.undo_stock();
    this.staged.clear();
    Ok(())
  }
}
