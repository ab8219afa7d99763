// storefront/app/src/web/handlers/order_handlers.rs

use actix_web::{web, HttpResponse};
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::errors::AppError;
use crate::models::PlaceOrderRequest;
use crate::pipelines::order_pipeline::place_order;
use crate::state::AppState;

#[instrument(name = "handler::list_orders", skip(app_state))]
pub async fn list_orders_handler(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  let orders = app_state.orders.list_orders().await?;
  info!("Successfully fetched {} orders.", orders.len());

  Ok(HttpResponse::Ok().json(json!({
      "message": "Orders fetched successfully.",
      "orders": orders
  })))
}

#[instrument(name = "handler::place_order", skip(app_state, body))]
pub async fn place_order_handler(
  app_state: web::Data<AppState>,
  body: web::Json<PlaceOrderRequest>,
) -> Result<HttpResponse, AppError> {
  let order = place_order(&app_state.workflows, app_state.orders.clone(), body.into_inner()).await?;
  info!(order_number = %order.order_number, total_cents = order.total_cents, "Order placed.");

  Ok(HttpResponse::Created().json(json!({
      "message": "Order placed successfully.",
      "order": order
  })))
}

#[instrument(name = "handler::search_order", skip(app_state, path), fields(order_number = %path.as_str()))]
pub async fn search_order_handler(
  app_state: web::Data<AppState>,
  path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
  let order_number = path.into_inner();
  let order = app_state.orders.find_by_order_number(&order_number).await?;

  match order {
    Some(order) => Ok(HttpResponse::Ok().json(json!({
        "message": "Order fetched successfully.",
        "order": order
    }))),
    None => {
      warn!("Order {} not found.", order_number);
      Err(AppError::NotFound("order not found".to_string()))
    }
  }
}
