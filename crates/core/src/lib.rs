//! Domain core of the service-content registry.
//!
//! Pure types and logic with no database dependencies: the publication
//! status machine with per-language availability, the declarative
//! translation engine, the connection-ordering synchronizer, and the
//! mass-operation request model. All evaluation runs against data passed
//! in by the caller; storage lives in `sercat-db`.

pub mod batch;
pub mod connections;
pub mod error;
pub mod language;
pub mod publication;
pub mod translate;
pub mod types;

pub use error::CoreError;
