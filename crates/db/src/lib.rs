//! Storage layer of the service-content registry.
//!
//! Postgres-backed models and repositories plus the transactional
//! unit-of-work boundary. Repositories are narrow, typed data access
//! with no business logic; the publication and connection flows live in
//! `sercat-registry`.

pub mod config;
pub mod error;
pub mod models;
pub mod repositories;
pub mod unit_of_work;

pub use config::DatabaseConfig;
pub use error::StoreError;
pub use unit_of_work::{Actor, Database, Reader, SaveMode, Writer};

/// Verify database connectivity with a trivial round trip.
pub async fn health_check(pool: &sqlx::PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}
