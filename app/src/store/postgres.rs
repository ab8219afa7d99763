// storefront/app/src/store/postgres.rs

use super::{CatalogRepository, LockedProduct, NewOrder, OrderRepository, OrderTransaction, ReservedLine};
use crate::errors::{is_foreign_key_violation, AppError, Result};
use crate::models::{NewProduct, Order, OrderItem, OrderSummary, Product, ProductPatch};
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{debug, error, info, instrument};

const PRODUCT_COLUMNS: &str = "id, name, description, price_cents, stock_quantity, image_url, created_at";

/// PostgreSQL-backed catalog and order store.
#[derive(Clone)]
pub struct PgStore {
  pool: PgPool,
}

impl PgStore {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }

  pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
    let pool = PgPoolOptions::new()
      .max_connections(max_connections)
      .connect(database_url)
      .await?;
    info!(max_connections, "Connected to PostgreSQL.");
    Ok(Self::new(pool))
  }

  /// Applies the embedded migrations under `app/migrations`.
  pub async fn migrate(&self) -> Result<()> {
    sqlx::migrate!("./migrations").run(&self.pool).await?;
    info!("Database migrations applied.");
    Ok(())
  }

  pub fn pool(&self) -> &PgPool {
    &self.pool
  }
}

#[async_trait]
impl CatalogRepository for PgStore {
  #[instrument(name = "pg::list_products", skip(self))]
  async fn list_products(&self) -> Result<Vec<Product>> {
    let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY created_at DESC, id DESC");
    let products = sqlx::query_as::<_, Product>(&sql).fetch_all(&self.pool).await?;
    Ok(products)
  }

  #[instrument(name = "pg::get_product", skip(self))]
  async fn get_product(&self, id: i64) -> Result<Option<Product>> {
    let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1");
    let product = sqlx::query_as::<_, Product>(&sql)
      .bind(id)
      .fetch_optional(&self.pool)
      .await?;
    Ok(product)
  }

  #[instrument(name = "pg::create_product", skip(self, product), fields(name = %product.name))]
  async fn create_product(&self, product: &NewProduct) -> Result<Product> {
    let sql = format!(
      "INSERT INTO products (name, description, price_cents, stock_quantity, image_url) \
       VALUES ($1, $2, $3, $4, $5) RETURNING {PRODUCT_COLUMNS}"
    );
    let created = sqlx::query_as::<_, Product>(&sql)
      .bind(&product.name)
      .bind(&product.description)
      .bind(product.price_cents)
      .bind(product.stock_quantity)
      .bind(&product.image_url)
      .fetch_one(&self.pool)
      .await?;
    Ok(created)
  }

  #[instrument(name = "pg::update_product", skip(self, patch))]
  async fn update_product(&self, id: i64, patch: &ProductPatch) -> Result<Option<Product>> {
    // An empty string clears an optional text column; NULL keeps it.
    let sql = format!(
      "UPDATE products SET \
         name = COALESCE($2, name), \
         description = CASE WHEN $3::TEXT IS NULL THEN description ELSE NULLIF($3, '') END, \
         price_cents = COALESCE($4, price_cents), \
         stock_quantity = COALESCE($5, stock_quantity), \
         image_url = CASE WHEN $6::TEXT IS NULL THEN image_url ELSE NULLIF($6, '') END \
       WHERE id = $1 RETURNING {PRODUCT_COLUMNS}"
    );
    let updated = sqlx::query_as::<_, Product>(&sql)
      .bind(id)
      .bind(&patch.name)
      .bind(&patch.description)
      .bind(patch.price_cents)
      .bind(patch.stock_quantity)
      .bind(&patch.image_url)
      .fetch_optional(&self.pool)
      .await?;
    Ok(updated)
  }

  #[instrument(name = "pg::delete_product", skip(self))]
  async fn delete_product(&self, id: i64) -> Result<bool> {
    match sqlx::query("DELETE FROM products WHERE id = $1")
      .bind(id)
      .execute(&self.pool)
      .await
    {
      Ok(done) => Ok(done.rows_affected() > 0),
      Err(e) if is_foreign_key_violation(&e) => Err(AppError::Conflict(
        "product is referenced by existing orders".to_string(),
      )),
      Err(e) => {
        error!(error = %e, product_id = id, "Failed to delete product.");
        Err(AppError::Sqlx(e))
      }
    }
  }

  async fn count_products(&self) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM products")
      .fetch_one(&self.pool)
      .await?;
    Ok(count)
  }
}

#[async_trait]
impl OrderRepository for PgStore {
  #[instrument(name = "pg::list_orders", skip(self))]
  async fn list_orders(&self) -> Result<Vec<OrderSummary>> {
    let orders = sqlx::query_as::<_, OrderSummary>(
      "SELECT id, order_number, customer_name, customer_email, total_cents, created_at \
       FROM orders ORDER BY created_at DESC, id DESC",
    )
    .fetch_all(&self.pool)
    .await?;
    Ok(orders)
  }

  #[instrument(name = "pg::find_by_order_number", skip(self))]
  async fn find_by_order_number(&self, order_number: &str) -> Result<Option<Order>> {
    let order = sqlx::query_as::<_, Order>(
      "SELECT id, order_number, customer_name, customer_email, total_cents, created_at \
       FROM orders WHERE order_number = $1 ORDER BY id LIMIT 1",
    )
    .bind(order_number)
    .fetch_optional(&self.pool)
    .await?;

    let Some(mut order) = order else {
      return Ok(None);
    };

    order.items = sqlx::query_as::<_, OrderItem>(
      "SELECT oi.id, oi.order_id, oi.product_id, p.name AS product_name, oi.quantity, oi.price_at_purchase_cents \
       FROM order_items oi JOIN products p ON p.id = oi.product_id \
       WHERE oi.order_id = $1 ORDER BY oi.id",
    )
    .bind(order.id)
    .fetch_all(&self.pool)
    .await?;

    Ok(Some(order))
  }

  async fn begin(&self) -> Result<Box<dyn OrderTransaction>> {
    let tx = self.pool.begin().await?;
    Ok(Box::new(PgOrderTransaction { tx }))
  }
}

/// Wraps a sqlx transaction; sqlx rolls it back when dropped uncommitted.
pub struct PgOrderTransaction {
  tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl OrderTransaction for PgOrderTransaction {
  async fn lock_product(&mut self, product_id: i64) -> Result<Option<LockedProduct>> {
    let row = sqlx::query_as::<_, (i64, String, i64, i32)>(
      "SELECT id, name, price_cents, stock_quantity FROM products WHERE id = $1 FOR UPDATE",
    )
    .bind(product_id)
    .fetch_optional(&mut *self.tx)
    .await?;
    debug!(product_id, found = row.is_some(), "Product row locked.");

    Ok(row.map(|(id, name, price_cents, stock_quantity)| LockedProduct {
      id,
      name,
      price_cents,
      stock_quantity,
    }))
  }

  async fn decrement_stock(&mut self, product_id: i64, quantity: i32) -> Result<()> {
    let done = sqlx::query("UPDATE products SET stock_quantity = stock_quantity - $2 WHERE id = $1")
      .bind(product_id)
      .bind(quantity)
      .execute(&mut *self.tx)
      .await?;
    if done.rows_affected() != 1 {
      return Err(AppError::Internal(format!(
        "stock decrement touched {} rows for product {}",
        done.rows_affected(),
        product_id
      )));
    }
    Ok(())
  }

  async fn insert_order(&mut self, order: &NewOrder) -> Result<OrderSummary> {
    let inserted = sqlx::query_as::<_, OrderSummary>(
      "INSERT INTO orders (order_number, customer_name, customer_email, total_cents) \
       VALUES ($1, $2, $3, $4) \
       RETURNING id, order_number, customer_name, customer_email, total_cents, created_at",
    )
    .bind(&order.order_number)
    .bind(&order.customer_name)
    .bind(&order.customer_email)
    .bind(order.total_cents)
    .fetch_one(&mut *self.tx)
    .await?;
    Ok(inserted)
  }

  async fn insert_order_item(&mut self, order_id: i64, line: &ReservedLine) -> Result<OrderItem> {
    let id = sqlx::query_scalar::<_, i64>(
      "INSERT INTO order_items (order_id, product_id, quantity, price_at_purchase_cents) \
       VALUES ($1, $2, $3, $4) RETURNING id",
    )
    .bind(order_id)
    .bind(line.product_id)
    .bind(line.quantity)
    .bind(line.price_at_purchase_cents)
    .fetch_one(&mut *self.tx)
    .await?;

    Ok(OrderItem {
      id,
      order_id,
      product_id: line.product_id,
      product_name: line.product_name.clone(),
      quantity: line.quantity,
      price_at_purchase_cents: line.price_at_purchase_cents,
    })
  }

  async fn commit(self: Box<Self>) -> Result<()> {
    self.tx.commit().await?;
    Ok(())
  }

  async fn rollback(self: Box<Self>) -> Result<()> {
    self.tx.rollback().await?;
    Ok(())
  }
}
