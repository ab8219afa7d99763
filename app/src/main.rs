// storefront/app/src/main.rs

use actix_web::{web as actix_data, App, HttpServer};
use std::sync::Arc;
use storefront::config::{AppConfig, LogFormat, StoreBackend};
use storefront::errors::{AppError, Result as AppResult};
use storefront::seed::seed_catalog;
use storefront::state::AppState;
use storefront::store::{CatalogRepository, MemoryStore, OrderRepository, PgStore};
use storefront::web::configure_app_routes;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

fn init_tracing(format: LogFormat) {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  let builder = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_span_events(FmtSpan::CLOSE);
  match format {
    LogFormat::Pretty => builder.init(),
    LogFormat::Json => builder.json().init(),
  }
}

async fn build_state(config: Arc<AppConfig>) -> AppResult<AppState> {
  let (catalog, orders): (Arc<dyn CatalogRepository>, Arc<dyn OrderRepository>) = match config.store_backend {
    StoreBackend::Postgres => {
      let database_url = config
        .database_url
        .as_deref()
        .ok_or_else(|| AppError::Config("DATABASE_URL is not set".to_string()))?;
      let store = PgStore::connect(database_url, config.database_max_connections).await?;
      if config.run_migrations {
        store.migrate().await?;
      }
      let store = Arc::new(store);
      let catalog: Arc<dyn CatalogRepository> = store.clone();
      let orders: Arc<dyn OrderRepository> = store;
      (catalog, orders)
    }
    StoreBackend::Memory => {
      tracing::warn!("Using the in-memory store; data is lost on shutdown.");
      let store = Arc::new(MemoryStore::new());
      let catalog: Arc<dyn CatalogRepository> = store.clone();
      let orders: Arc<dyn OrderRepository> = store;
      (catalog, orders)
    }
  };

  if config.seed_db {
    seed_catalog(catalog.as_ref()).await?;
  }

  Ok(AppState::new(catalog, orders, config))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
  // Logging is not up yet, so configuration errors go to stderr.
  let app_config = match AppConfig::from_env() {
    Ok(cfg) => Arc::new(cfg),
    Err(e) => {
      eprintln!("Failed to load application configuration: {}", e);
      std::process::exit(1);
    }
  };
  init_tracing(app_config.log_format);
  tracing::info!(backend = ?app_config.store_backend, "Starting storefront server...");

  let app_state = match build_state(app_config.clone()).await {
    Ok(state) => state,
    Err(e) => {
      tracing::error!(error = %e, "Failed to initialise application state.");
      std::process::exit(1);
    }
  };

  let server_address = app_config.server_address();
  tracing::info!("Attempting to bind server to {}...", server_address);

  HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone()))
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(configure_app_routes)
  })
  .bind(&server_address)?
  .run()
  .await
}
