// tests/common/mod.rs
#![allow(dead_code)]

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Arc;
use storefront::config::AppConfig;
use storefront::errors::AppError;
use storefront::models::{NewProduct, Order, OrderLineRequest, PlaceOrderRequest, Product};
use storefront::pipelines::order_pipeline::place_order;
use storefront::state::AppState;
use storefront::store::{CatalogRepository, MemoryStore};
use tracing::Level;

static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

pub fn memory_config() -> AppConfig {
  AppConfig::from_lookup(|name| match name {
    "STORE_BACKEND" => Some("memory".to_string()),
    _ => None,
  })
  .expect("memory config is valid")
}

pub fn memory_state(store: &MemoryStore) -> AppState {
  let shared = Arc::new(store.clone());
  AppState::new(shared.clone(), shared, Arc::new(memory_config()))
}

pub async fn add_product(store: &MemoryStore, name: &str, price_cents: i64, stock_quantity: i32) -> Product {
  store
    .create_product(&NewProduct {
      name: name.to_string(),
      description: None,
      price_cents,
      stock_quantity,
      image_url: None,
    })
    .await
    .expect("product created")
}


/// Line layouts submitted concurrently; several touch the same products in
/// opposite orders.
pub fn order_shapes(ids: &[i64]) -> Vec<Vec<(i64, i32)>> {
  let (a, b, c) = (ids[0], ids[1], ids[2]);
  vec![
    vec![(a, 1), (b, 2)],
    vec![(b, 1), (a, 2)],
    vec![(c, 1), (b, 1), (a, 1)],
    vec![(a, 3)],
    vec![(c, 2), (a, 1)],
    vec![(b, 1), (b, 1), (c, 1)],
  ]
}

pub struct ConcurrentRun {
  pub placed: Vec<Order>,
  pub rejected: usize,
}

/// Submits `rounds` copies of every shape at once and sorts the outcomes.
/// Panics on any failure other than insufficient stock.
pub async fn place_concurrently(state: &AppState, ids: &[i64], rounds: usize) -> ConcurrentRun {
  let mut handles = Vec::new();
  for round in 0..rounds {
    for (shape_idx, shape) in order_shapes(ids).into_iter().enumerate() {
      let workflows = state.workflows.clone();
      let orders = state.orders.clone();
      let request = PlaceOrderRequest {
        customer_name: format!("Customer {round}-{shape_idx}"),
        customer_email: format!("c{round}.{shape_idx}@example.com"),
        items: shape
          .into_iter()
          .map(|(product_id, quantity)| OrderLineRequest { product_id, quantity })
          .collect(),
      };
      handles.push(tokio::spawn(async move { place_order(&workflows, orders, request).await }));
    }
  }

  let mut run = ConcurrentRun {
    placed: Vec::new(),
    rejected: 0,
  };
  for outcome in futures_util::future::join_all(handles).await {
    match outcome.expect("order task panicked") {
      Ok(order) => run.placed.push(order),
      Err(AppError::InsufficientStock { .. }) => run.rejected += 1,
      Err(other) => panic!("unexpected placement failure: {other:?}"),
    }
  }
  run
}

/// Committed quantity per product.
pub fn committed_quantities(placed: &[Order]) -> HashMap<i64, i64> {
  let mut sums = HashMap::new();
  for order in placed {
    for item in &order.items {
      *sums.entry(item.product_id).or_insert(0) += i64::from(item.quantity);
    }
  }
  sums
}
