// storefront/app/src/pipelines/contexts.rs

//! Context data carried through the application's pipelines. Handlers receive
//! these wrapped in `storefront_core::ContextData`.

use crate::models::{Order, PlaceOrderRequest};
use crate::store::{LockedProduct, OrderRepository, OrderTransaction, ReservedLine};
use std::collections::BTreeMap;
use std::sync::Arc;

/// State of one order placement.
pub struct PlaceOrderCtxData {
  pub orders: Arc<dyn OrderRepository>,
  pub request: PlaceOrderRequest,
  /// Open while the placement runs; taken by `commit_order` or by the
  /// rollback failure handler.
  pub tx: Option<Box<dyn OrderTransaction>>,
  /// Snapshots of the locked rows, keyed by product id. `stock_quantity`
  /// tracks what remains after the lines reserved so far.
  pub locked: BTreeMap<i64, LockedProduct>,
  pub reserved: Vec<ReservedLine>,
  pub total_cents: i64,
  pub placed: Option<Order>,
}

impl PlaceOrderCtxData {
  pub fn new(orders: Arc<dyn OrderRepository>, request: PlaceOrderRequest) -> Self {
    Self {
      orders,
      request,
      tx: None,
      locked: BTreeMap::new(),
      reserved: Vec::new(),
      total_cents: 0,
      placed: None,
    }
  }
}
