// storefront/app/src/services/mod.rs

pub mod catalog_service;
