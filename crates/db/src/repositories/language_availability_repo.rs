//! Repository for the `language_availabilities` table.

use sercat_core::publication::PublicationStatus;
use sercat_core::types::{Timestamp, VersionId};
use sqlx::PgConnection;
use uuid::Uuid;

use crate::models::language_availability::{LanguageAvailabilityRow, UpsertLanguageAvailability};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str =
    "id, version_id, language, status, can_be_published, archived_at, archived_by";

/// Provides per-(version, language) publication-state operations.
pub struct LanguageAvailabilityRepo;

impl LanguageAvailabilityRepo {
    /// Insert or update the record for one (version, language) pair.
    pub async fn upsert(
        conn: &mut PgConnection,
        input: &UpsertLanguageAvailability,
    ) -> Result<LanguageAvailabilityRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO language_availabilities
                (id, version_id, language, status, can_be_published)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (version_id, language) DO UPDATE SET
                status = EXCLUDED.status,
                can_be_published = EXCLUDED.can_be_published
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, LanguageAvailabilityRow>(&query)
            .bind(Uuid::new_v4())
            .bind(input.version_id)
            .bind(&input.language)
            .bind(&input.status)
            .bind(input.can_be_published)
            .fetch_one(conn)
            .await
    }

    /// List a version's language records, ordered by language code.
    pub async fn list_by_version(
        conn: &mut PgConnection,
        version_id: VersionId,
    ) -> Result<Vec<LanguageAvailabilityRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM language_availabilities
             WHERE version_id = $1
             ORDER BY language"
        );
        sqlx::query_as::<_, LanguageAvailabilityRow>(&query)
            .bind(version_id)
            .fetch_all(conn)
            .await
    }

    /// Move one language's status. Returns `false` if the pair does not
    /// exist.
    pub async fn set_status(
        conn: &mut PgConnection,
        version_id: VersionId,
        language: &str,
        status: PublicationStatus,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE language_availabilities SET status = $3
             WHERE version_id = $1 AND language = $2",
        )
        .bind(version_id)
        .bind(language)
        .bind(status.as_str())
        .execute(conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Record the externally computed readiness predicate for a language.
    pub async fn set_can_be_published(
        conn: &mut PgConnection,
        version_id: VersionId,
        language: &str,
        can_be_published: bool,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE language_availabilities SET can_be_published = $3
             WHERE version_id = $1 AND language = $2",
        )
        .bind(version_id)
        .bind(language)
        .bind(can_be_published)
        .execute(conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Stamp when (and by whom) a language left public visibility.
    /// Independent of any status transition.
    pub async fn stamp_archived(
        conn: &mut PgConnection,
        version_id: VersionId,
        language: &str,
        archived_at: Timestamp,
        archived_by: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE language_availabilities SET archived_at = $3, archived_by = $4
             WHERE version_id = $1 AND language = $2",
        )
        .bind(version_id)
        .bind(language)
        .bind(archived_at)
        .bind(archived_by)
        .execute(conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Copy all language records from one version to another (used by the
    /// copy-on-write clone so the new working snapshot starts from the
    /// source's per-language states).
    pub async fn copy_to_version(
        conn: &mut PgConnection,
        from_version: VersionId,
        to_version: VersionId,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO language_availabilities
                (id, version_id, language, status, can_be_published, archived_at, archived_by)
             SELECT gen_random_uuid(), $2, language, status, can_be_published,
                    archived_at, archived_by
             FROM language_availabilities
             WHERE version_id = $1",
        )
        .bind(from_version)
        .bind(to_version)
        .execute(conn)
        .await?;
        Ok(result.rows_affected())
    }
}
