// storefront/app/src/pipelines/mod.rs

//! Defines and registers the pipelines used by the storefront.

use crate::errors::AppError;
use storefront_core::Workflows;

pub mod contexts;
pub mod order_number;
pub mod order_pipeline;

/// Registers every pipeline with the registry. Called once at startup.
pub fn register_all_pipelines(workflows: &Workflows<AppError>) {
  tracing::info!("Registering pipelines...");
  order_pipeline::register_place_order_pipeline(workflows);
  tracing::info!("All application pipelines registered.");
}
