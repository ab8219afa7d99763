// storefront/app/src/seed.rs

use crate::errors::Result;
use crate::models::NewProduct;
use crate::store::CatalogRepository;
use tracing::{info, instrument};

const SAMPLE_PRODUCTS: &[(&str, &str, i64, i32)] = &[
  ("Ceramic Mug", "Stoneware mug, 350 ml.", 1250, 40),
  ("Desk Lamp", "Adjustable LED desk lamp.", 4999, 15),
  ("Notebook", "A5 dotted notebook, 120 pages.", 899, 100),
  ("Water Bottle", "Insulated steel bottle, 750 ml.", 2450, 25),
  ("Canvas Tote", "Heavy cotton tote bag.", 1800, 0),
];

/// Inserts a small sample catalog when no products exist yet. Returns the
/// number of products inserted.
#[instrument(name = "seed_catalog", skip(catalog))]
pub async fn seed_catalog(catalog: &dyn CatalogRepository) -> Result<usize> {
  let existing = catalog.count_products().await?;
  if existing > 0 {
    info!(existing, "Catalog already populated; skipping seed.");
    return Ok(0);
  }

  for (name, description, price_cents, stock_quantity) in SAMPLE_PRODUCTS {
    catalog
      .create_product(&NewProduct {
        name: name.to_string(),
        description: Some(description.to_string()),
        price_cents: *price_cents,
        stock_quantity: *stock_quantity,
        image_url: None,
      })
      .await?;
  }
  info!(count = SAMPLE_PRODUCTS.len(), "Seeded sample catalog.");
  Ok(SAMPLE_PRODUCTS.len())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::store::MemoryStore;

  #[tokio::test]
  async fn seeds_only_an_empty_catalog() {
    let store = MemoryStore::new();
    assert_eq!(seed_catalog(&store).await.unwrap(), SAMPLE_PRODUCTS.len());
    assert_eq!(seed_catalog(&store).await.unwrap(), 0);
    assert_eq!(store.count_products().await.unwrap(), SAMPLE_PRODUCTS.len() as i64);
  }
}
