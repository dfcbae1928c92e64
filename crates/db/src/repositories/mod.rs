//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&mut PgConnection` as the first argument, so every
//! statement runs on the calling scope's own connection or transaction
//! (see `unit_of_work`). Repositories hold no business logic.

pub mod connection_repo;
pub mod language_availability_repo;
pub mod root_repo;
pub mod version_repo;

pub use connection_repo::ConnectionRepo;
pub use language_availability_repo::LanguageAvailabilityRepo;
pub use root_repo::RootRepo;
pub use version_repo::VersionRepo;
