pub mod config;
#[cfg(feature = "postgres-store")]
pub mod db; // the shared Postgres session
pub mod error;
pub mod models;
pub mod openapi;
pub mod repo;
pub mod routes;
pub mod seed;

// Re-export commonly used items for tests / external users
pub use routes::{config as configure_routes, not_found, AppState};
