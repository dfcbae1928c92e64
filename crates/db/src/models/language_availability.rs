//! Language availability entity model and DTOs.

use serde::{Deserialize, Serialize};
use sercat_core::language::LanguageCode;
use sercat_core::publication::{LanguageAvailability, PublicationStatus};
use sercat_core::types::{Timestamp, VersionId};
use sqlx::FromRow;
use uuid::Uuid;

/// A row from the `language_availabilities` table: the publication state
/// of one language of one version. Unique on `(version_id, language)`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LanguageAvailabilityRow {
    pub id: Uuid,
    pub version_id: VersionId,
    pub language: String,
    pub status: String,
    pub can_be_published: bool,
    pub archived_at: Option<Timestamp>,
    pub archived_by: Option<String>,
}

impl LanguageAvailabilityRow {
    /// Project the row into the core availability record.
    pub fn to_availability(&self) -> Result<LanguageAvailability, String> {
        Ok(LanguageAvailability {
            language: LanguageCode::new(&self.language),
            status: PublicationStatus::from_str_value(&self.status)?,
            can_be_published: self.can_be_published,
            archived_at: self.archived_at,
            archived_by: self.archived_by.clone(),
        })
    }
}

/// DTO for upserting a language availability record.
#[derive(Debug, Clone, Deserialize)]
pub struct UpsertLanguageAvailability {
    pub version_id: VersionId,
    pub language: String,
    pub status: String,
    pub can_be_published: bool,
}
