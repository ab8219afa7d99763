// storefront/app/src/lib.rs

//! Storefront backend: product catalog CRUD, order queries and transactional
//! order placement over PostgreSQL or an in-memory store.

pub mod config;
pub mod errors;
pub mod models;
pub mod pipelines;
pub mod seed;
pub mod services;
pub mod state;
pub mod store;
pub mod web;
