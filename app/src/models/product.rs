// storefront/app/src/models/product.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Product {
  pub id: i64,
  pub name: String,
  pub description: Option<String>,
  pub price_cents: i64,
  pub stock_quantity: i32,
  pub image_url: Option<String>,
  pub created_at: DateTime<Utc>,
}

/// Body of `POST /products`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
  pub name: String,
  #[serde(default)]
  pub description: Option<String>,
  pub price_cents: i64,
  pub stock_quantity: i32,
  #[serde(default)]
  pub image_url: Option<String>,
}

/// Body of `PUT /products/{id}`. Absent fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPatch {
  pub name: Option<String>,
  pub description: Option<String>,
  pub price_cents: Option<i64>,
  pub stock_quantity: Option<i32>,
  pub image_url: Option<String>,
}

impl ProductPatch {
  pub fn is_empty(&self) -> bool {
    self.name.is_none()
      && self.description.is_none()
      && self.price_cents.is_none()
      && self.stock_quantity.is_none()
      && self.image_url.is_none()
  }

  /// Applies the patch to an in-memory copy of a product.
  pub fn apply_to(&self, product: &mut Product) {
    if let Some(name) = &self.name {
      product.name = name.clone();
    }
    if let Some(description) = &self.description {
      product.description = non_blank(description);
    }
    if let Some(price_cents) = self.price_cents {
      product.price_cents = price_cents;
    }
    if let Some(stock_quantity) = self.stock_quantity {
      product.stock_quantity = stock_quantity;
    }
    if let Some(image_url) = &self.image_url {
      product.image_url = non_blank(image_url);
    }
  }
}

/// Blank optional text is stored as absent.
pub fn non_blank(value: &str) -> Option<String> {
  let trimmed = value.trim();
  (!trimmed.is_empty()).then(|| trimmed.to_string())
}
