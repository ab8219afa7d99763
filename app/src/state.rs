// storefront/app/src/state.rs
use crate::config::AppConfig;
use crate::errors::AppError;
use crate::pipelines::register_all_pipelines;
use crate::store::{CatalogRepository, OrderRepository};
use std::sync::Arc;
use storefront_core::Workflows;

#[derive(Clone)]
pub struct AppState {
  pub catalog: Arc<dyn CatalogRepository>,
  pub orders: Arc<dyn OrderRepository>,
  pub workflows: Arc<Workflows<AppError>>,
  pub config: Arc<AppConfig>,
}

impl AppState {
  /// Builds the shared state and registers every pipeline.
  pub fn new(catalog: Arc<dyn CatalogRepository>, orders: Arc<dyn OrderRepository>, config: Arc<AppConfig>) -> Self {
    let workflows = Arc::new(Workflows::<AppError>::new());
    register_all_pipelines(&workflows);
    Self {
      catalog,
      orders,
      workflows,
      config,
    }
  }
}
