//! Orchestration layer of the service-content registry.
//!
//! Combines the core status machine and synchronizer with the storage
//! crate's unit of work: version lifecycle operations, connection-list
//! edits, batch publish/archive, and the concrete translator definitions
//! for the registry's view shapes.
//!
//! Consumers initialize logging the usual way before driving these
//! services:
//!
//! ```rust,no_run
//! use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
//!
//! tracing_subscriber::registry()
//!     .with(
//!         tracing_subscriber::EnvFilter::try_from_default_env()
//!             .unwrap_or_else(|_| "sercat=debug".into()),
//!     )
//!     .with(tracing_subscriber::fmt::layer())
//!     .init();
//! ```

pub mod connections;
pub mod mass;
pub mod publishing;
pub mod translators;

pub use connections::ConnectionService;
pub use mass::{MassOperationReport, MassOperationService};
pub use publishing::PublicationService;
