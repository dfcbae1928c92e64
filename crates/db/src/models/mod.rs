//! Row structs and DTOs for the registry tables.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A `Deserialize` create DTO for inserts
//! - An update DTO (all `Option` fields) where patches apply

pub mod connection;
pub mod content_root;
pub mod content_version;
pub mod language_availability;
