//! Axum HTTP surface for [`migrate_engine::MigrationEngine`].

pub mod config;
pub mod routes;

pub use routes::{create_router, AppState};
