// storefront/app/src/models/mod.rs

//! Catalog and order entities, plus the request bodies that create them.

pub mod order;
pub mod order_item;
pub mod product;

pub use order::{Order, OrderLineRequest, OrderSummary, PlaceOrderRequest};
pub use order_item::OrderItem;
pub use product::{NewProduct, Product, ProductPatch};
