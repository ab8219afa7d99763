// storefront/app/src/services/catalog_service.rs

//! Product CRUD rules applied in front of the catalog repository.

use crate::errors::{AppError, Result};
use crate::models::product::non_blank;
use crate::models::{NewProduct, Product, ProductPatch};
use crate::store::CatalogRepository;
use tracing::{info, instrument};

fn validate_name(name: &str) -> Result<String> {
  let trimmed = name.trim();
  if trimmed.is_empty() {
    return Err(AppError::Validation("product name must not be empty".to_string()));
  }
  Ok(trimmed.to_string())
}

fn validate_price(price_cents: i64) -> Result<()> {
  if price_cents < 0 {
    return Err(AppError::Validation("price must not be negative".to_string()));
  }
  Ok(())
}

fn validate_stock(stock_quantity: i32) -> Result<()> {
  if stock_quantity < 0 {
    return Err(AppError::Validation("stock quantity must not be negative".to_string()));
  }
  Ok(())
}

/// Validates and normalises a new product: trimmed name, blank optional text
/// dropped.
pub fn prepare_new_product(input: NewProduct) -> Result<NewProduct> {
  let name = validate_name(&input.name)?;
  validate_price(input.price_cents)?;
  validate_stock(input.stock_quantity)?;
  Ok(NewProduct {
    name,
    description: input.description.as_deref().and_then(non_blank),
    price_cents: input.price_cents,
    stock_quantity: input.stock_quantity,
    image_url: input.image_url.as_deref().and_then(non_blank),
  })
}

/// Validates a partial update. Optional text fields that are present but blank
/// become empty strings, which the stores treat as "clear".
pub fn prepare_patch(input: ProductPatch) -> Result<ProductPatch> {
  if input.is_empty() {
    return Err(AppError::Validation("no fields to update".to_string()));
  }
  let name = input.name.as_deref().map(validate_name).transpose()?;
  if let Some(price_cents) = input.price_cents {
    validate_price(price_cents)?;
  }
  if let Some(stock_quantity) = input.stock_quantity {
    validate_stock(stock_quantity)?;
  }
  Ok(ProductPatch {
    name,
    description: input.description.map(|d| d.trim().to_string()),
    price_cents: input.price_cents,
    stock_quantity: input.stock_quantity,
    image_url: input.image_url.map(|u| u.trim().to_string()),
  })
}

#[instrument(name = "catalog_service::create_product", skip(catalog, input))]
pub async fn create_product(catalog: &dyn CatalogRepository, input: NewProduct) -> Result<Product> {
  let product = catalog.create_product(&prepare_new_product(input)?).await?;
  info!(product_id = product.id, "Product created.");
  Ok(product)
}

pub async fn get_product(catalog: &dyn CatalogRepository, id: i64) -> Result<Product> {
  catalog
    .get_product(id)
    .await?
    .ok_or_else(|| AppError::NotFound("product not found".to_string()))
}

#[instrument(name = "catalog_service::update_product", skip(catalog, input))]
pub async fn update_product(catalog: &dyn CatalogRepository, id: i64, input: ProductPatch) -> Result<Product> {
  let patch = prepare_patch(input)?;
  let product = catalog
    .update_product(id, &patch)
    .await?
    .ok_or_else(|| AppError::NotFound("product not found".to_string()))?;
  info!(product_id = id, "Product updated.");
  Ok(product)
}

#[instrument(name = "catalog_service::delete_product", skip(catalog))]
pub async fn delete_product(catalog: &dyn CatalogRepository, id: i64) -> Result<()> {
  if !catalog.delete_product(id).await? {
    return Err(AppError::NotFound("product not found".to_string()));
  }
  info!(product_id = id, "Product deleted.");
  Ok(())
}
