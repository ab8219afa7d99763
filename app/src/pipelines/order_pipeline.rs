// storefront/app/src/pipelines/order_pipeline.rs

//! Order placement.
//!
//! Either the order, its line items and every stock decrement commit together
//! or nothing does. Product rows are locked in ascending id order before any
//! stock is checked, so two placements touching the same products cannot
//! deadlock, and a row's price and stock cannot change between the check and
//! the write.

use crate::errors::{AppError, Result};
use crate::models::{Order, OrderLineRequest, PlaceOrderRequest};
use crate::pipelines::contexts::PlaceOrderCtxData;
use crate::pipelines::order_number::generate_order_number;
use crate::store::{LockedProduct, NewOrder, OrderRepository, OrderTransaction, ReservedLine};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use storefront_core::{ContextData, Pipeline, PipelineControl, PipelineResult, Workflows};
use tracing::{debug, info, instrument};

pub const PLACE_ORDER_STEPS: &[(&str, bool)] = &[
  ("validate_order_request", false),
  ("begin_transaction", false),
  ("lock_products", false),
  ("reserve_stock", false),
  ("record_order", false),
  ("commit_order", false),
];

pub fn register_place_order_pipeline(workflows: &Workflows<AppError>) {
  let mut p = Pipeline::<PlaceOrderCtxData, AppError>::new(PLACE_ORDER_STEPS);

  p.on_root("validate_order_request", |ctx: ContextData<PlaceOrderCtxData>| {
    Box::pin(async move {
      let guard = ctx.lock();
      validate_order_request(&guard.request)?;
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });
  p.on_root("begin_transaction", begin_transaction_step);
  p.on_root("lock_products", lock_products_step);
  p.on_root("reserve_stock", reserve_stock_step);
  p.on_root("record_order", record_order_step);
  p.on_root("commit_order", commit_order_step);

  p.on_failure(|ctx: ContextData<PlaceOrderCtxData>, reason: String| {
    Box::pin(async move {
      let tx = ctx.lock().tx.take();
      if let Some(tx) = tx {
        debug!(%reason, "Order placement failed; rolling back.");
        tx.rollback().await?;
      }
      Ok::<(), anyhow::Error>(())
    })
  });

  workflows.register_pipeline(p);
  info!("Order placement pipeline registered.");
}

/// Runs the registered placement pipeline and returns the committed order.
#[instrument(name = "place_order", skip_all, fields(lines = request.items.len()))]
pub async fn place_order(
  workflows: &Workflows<AppError>,
  orders: Arc<dyn OrderRepository>,
  request: PlaceOrderRequest,
) -> Result<Order> {
  let ctx = ContextData::new(PlaceOrderCtxData::new(orders, request));
  match workflows.run(ctx.clone()).await? {
    PipelineResult::Completed => {
      let placed = ctx.lock().placed.take();
      placed.ok_or_else(|| AppError::Internal("order pipeline completed without an order".to_string()))
    }
    PipelineResult::Stopped => Err(AppError::PipelineHaltedByHandler),
  }
}

pub fn validate_order_request(request: &PlaceOrderRequest) -> Result<()> {
  if request.items.is_empty() {
    return Err(AppError::Validation("order must contain at least one item".to_string()));
  }
  if request.customer_name.trim().is_empty() {
    return Err(AppError::Validation("customer name must not be empty".to_string()));
  }
  let email = request.customer_email.trim();
  if email.is_empty() || !email.contains('@') {
    return Err(AppError::Validation("customer email is invalid".to_string()));
  }
  if let Some(line) = request.items.iter().find(|line| line.quantity <= 0) {
    return Err(AppError::Validation(format!(
      "quantity for product {} must be positive",
      line.product_id
    )));
  }
  Ok(())
}

fn take_tx(data: &mut PlaceOrderCtxData) -> Result<Box<dyn OrderTransaction>> {
  data
    .tx
    .take()
    .ok_or_else(|| AppError::Internal("no open order transaction".to_string()))
}

#[instrument(name = "place_order::begin_transaction", skip_all)]
async fn begin_transaction_step(ctx: ContextData<PlaceOrderCtxData>) -> Result<PipelineControl> {
  let orders = ctx.lock().orders.clone();
  let tx = orders.begin().await?;
  ctx.lock().tx = Some(tx);
  Ok(PipelineControl::Continue)
}

#[instrument(name = "place_order::lock_products", skip_all)]
async fn lock_products_step(ctx: ContextData<PlaceOrderCtxData>) -> Result<PipelineControl> {
  let (mut tx, product_ids) = {
    let mut guard = ctx.lock();
    let ids: BTreeSet<i64> = guard.request.items.iter().map(|line| line.product_id).collect();
    (take_tx(&mut guard)?, ids)
  };

  let result = lock_products(tx.as_mut(), &product_ids).await;

  let mut guard = ctx.lock();
  guard.tx = Some(tx);
  guard.locked = result?;
  Ok(PipelineControl::Continue)
}

/// Locks every product in ascending id order.
pub async fn lock_products(
  tx: &mut dyn OrderTransaction,
  product_ids: &BTreeSet<i64>,
) -> Result<BTreeMap<i64, LockedProduct>> {
  let mut locked = BTreeMap::new();
  for &product_id in product_ids {
    let product = tx
      .lock_product(product_id)
      .await?
      .ok_or_else(|| AppError::NotFound(format!("product {} not found", product_id)))?;
    debug!(product_id, stock = product.stock_quantity, price_cents = product.price_cents, "Locked product.");
    locked.insert(product_id, product);
  }
  Ok(locked)
}

#[instrument(name = "place_order::reserve_stock", skip_all)]
async fn reserve_stock_step(ctx: ContextData<PlaceOrderCtxData>) -> Result<PipelineControl> {
  let (mut tx, lines, mut locked) = {
    let mut guard = ctx.lock();
    let lines = guard.request.items.clone();
    let locked = std::mem::take(&mut guard.locked);
    (take_tx(&mut guard)?, lines, locked)
  };

  let result = reserve_stock(tx.as_mut(), &lines, &mut locked).await;

  let mut guard = ctx.lock();
  guard.tx = Some(tx);
  guard.locked = locked;
  let (reserved, total_cents) = result?;
  guard.reserved = reserved;
  guard.total_cents = total_cents;
  Ok(PipelineControl::Continue)
}

/// Checks and decrements stock line by line, in request order.
///
/// `locked` must hold every referenced product; its `stock_quantity` values
/// are reduced as lines are reserved, so a product listed twice is checked
/// against what the earlier line left.
pub async fn reserve_stock(
  tx: &mut dyn OrderTransaction,
  lines: &[OrderLineRequest],
  locked: &mut BTreeMap<i64, LockedProduct>,
) -> Result<(Vec<ReservedLine>, i64)> {
  let mut reserved = Vec::with_capacity(lines.len());
  let mut total_cents: i64 = 0;

  for line in lines {
    let product = locked
      .get_mut(&line.product_id)
      .ok_or_else(|| AppError::NotFound(format!("product {} not found", line.product_id)))?;

    if product.stock_quantity < line.quantity {
      info!(
        product_id = product.id,
        available = product.stock_quantity,
        requested = line.quantity,
        "Insufficient stock."
      );
      return Err(AppError::InsufficientStock {
        product_name: product.name.clone(),
      });
    }

    tx.decrement_stock(product.id, line.quantity).await?;
    product.stock_quantity -= line.quantity;

    total_cents = product
      .price_cents
      .checked_mul(i64::from(line.quantity))
      .and_then(|line_total| total_cents.checked_add(line_total))
      .ok_or_else(|| AppError::Validation("order total is too large".to_string()))?;

    reserved.push(ReservedLine {
      product_id: product.id,
      product_name: product.name.clone(),
      quantity: line.quantity,
      price_at_purchase_cents: product.price_cents,
    });
  }

  Ok((reserved, total_cents))
}

#[instrument(name = "place_order::record_order", skip_all)]
async fn record_order_step(ctx: ContextData<PlaceOrderCtxData>) -> Result<PipelineControl> {
  let (mut tx, header, reserved) = {
    let mut guard = ctx.lock();
    let header = NewOrder {
      order_number: generate_order_number(),
      customer_name: guard.request.customer_name.trim().to_string(),
      customer_email: guard.request.customer_email.trim().to_string(),
      total_cents: guard.total_cents,
    };
    let reserved = guard.reserved.clone();
    (take_tx(&mut guard)?, header, reserved)
  };

  let result = record_order(tx.as_mut(), &header, &reserved).await;

  let mut guard = ctx.lock();
  guard.tx = Some(tx);
  guard.placed = Some(result?);
  Ok(PipelineControl::Continue)
}

/// Inserts the order header and one item per reserved line.
pub async fn record_order(tx: &mut dyn OrderTransaction, header: &NewOrder, reserved: &[ReservedLine]) -> Result<Order> {
  let inserted = tx.insert_order(header).await?;
  let mut items = Vec::with_capacity(reserved.len());
  for line in reserved {
    items.push(tx.insert_order_item(inserted.id, line).await?);
  }

  Ok(Order {
    id: inserted.id,
    order_number: inserted.order_number,
    customer_name: inserted.customer_name,
    customer_email: inserted.customer_email,
    total_cents: inserted.total_cents,
    created_at: inserted.created_at,
    items,
  })
}

#[instrument(name = "place_order::commit_order", skip_all)]
async fn commit_order_step(ctx: ContextData<PlaceOrderCtxData>) -> Result<PipelineControl> {
  let (tx, order_number) = {
    let mut guard = ctx.lock();
    let order_number = guard.placed.as_ref().map(|o| o.order_number.clone());
    (take_tx(&mut guard)?, order_number)
  };
  tx.commit().await?;
  info!(order_number = ?order_number, "Order placed.");
  Ok(PipelineControl::Continue)
}
