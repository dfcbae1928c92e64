//! Content version entity model and DTOs.

use serde::{Deserialize, Serialize};
use sercat_core::publication::PublicationStatus;
use sercat_core::types::{OrganizationId, RootId, Timestamp, VersionId};
use sqlx::FromRow;

/// A row from the `content_versions` table: one snapshot in a root's
/// version chain. Published rows are never content-mutated; editing one
/// clones a successor (copy-on-write). Only status, audit, and
/// availability metadata change after publication.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ContentVersion {
    pub id: VersionId,
    pub root_id: RootId,
    pub status: String,
    pub version_number: i32,
    /// Root of the general description this version was templated from.
    pub template_root_id: Option<RootId>,
    /// Organization that owns the template copy.
    pub template_organization_id: Option<OrganizationId>,
    /// The translated content fields, serialized per language.
    pub payload: serde_json::Value,
    pub created_at: Timestamp,
    pub created_by: Option<String>,
    pub modified_at: Timestamp,
    pub modified_by: Option<String>,
    pub deleted_at: Option<Timestamp>,
}

impl ContentVersion {
    /// Decode the stored status string.
    pub fn publication_status(&self) -> Result<PublicationStatus, String> {
        PublicationStatus::from_str_value(&self.status)
    }
}

/// DTO for inserting a new version snapshot.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateContentVersion {
    pub root_id: RootId,
    pub template_root_id: Option<RootId>,
    pub template_organization_id: Option<OrganizationId>,
    pub payload: serde_json::Value,
}

/// DTO for patching a working (non-published) version's content.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateContentVersion {
    pub payload: Option<serde_json::Value>,
}
