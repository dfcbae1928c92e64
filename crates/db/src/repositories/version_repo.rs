//! Repository for the `content_versions` table.
//!
//! Versions are immutable-once-published snapshots chained under a root
//! identity. Status moves are guarded by the expected previous status so
//! a losing concurrent writer affects zero rows instead of silently
//! overwriting.

use sercat_core::publication::{
    PublicationStatus, STATUS_DELETED, STATUS_DRAFT, STATUS_MODIFIED, STATUS_PUBLISHED,
};
use sercat_core::types::{RootId, VersionId};
use sqlx::PgConnection;
use uuid::Uuid;

use crate::models::content_version::{ContentVersion, CreateContentVersion, UpdateContentVersion};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, root_id, status, version_number, template_root_id, \
    template_organization_id, payload, created_at, created_by, modified_at, \
    modified_by, deleted_at";

/// Provides CRUD and version-chain operations for content versions.
pub struct VersionRepo;

impl VersionRepo {
    // ── Standard CRUD ────────────────────────────────────────────────

    /// Insert a new draft snapshot, auto-assigning the next version number
    /// within the root's chain.
    pub async fn create(
        conn: &mut PgConnection,
        input: &CreateContentVersion,
        created_by: Option<&str>,
    ) -> Result<ContentVersion, sqlx::Error> {
        let query = format!(
            "INSERT INTO content_versions
                (id, root_id, status, version_number, template_root_id,
                 template_organization_id, payload, created_by, modified_by)
             VALUES (
                $1, $2, $3,
                (SELECT COALESCE(MAX(version_number), 0) + 1 FROM content_versions WHERE root_id = $2),
                $4, $5, $6, $7, $7
             )
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ContentVersion>(&query)
            .bind(Uuid::new_v4())
            .bind(input.root_id)
            .bind(STATUS_DRAFT)
            .bind(input.template_root_id)
            .bind(input.template_organization_id)
            .bind(&input.payload)
            .bind(created_by)
            .fetch_one(conn)
            .await
    }

    /// Find a version by id. Excludes soft-deleted rows.
    pub async fn find_by_id(
        conn: &mut PgConnection,
        id: VersionId,
    ) -> Result<Option<ContentVersion>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM content_versions WHERE id = $1 AND deleted_at IS NULL");
        sqlx::query_as::<_, ContentVersion>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Find a version by id regardless of deleted status (restore flow).
    pub async fn find_by_id_include_deleted(
        conn: &mut PgConnection,
        id: VersionId,
    ) -> Result<Option<ContentVersion>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM content_versions WHERE id = $1");
        sqlx::query_as::<_, ContentVersion>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// List the full version chain of a root, newest first. Excludes
    /// soft-deleted rows.
    pub async fn list_by_root(
        conn: &mut PgConnection,
        root_id: RootId,
    ) -> Result<Vec<ContentVersion>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM content_versions
             WHERE root_id = $1 AND deleted_at IS NULL
             ORDER BY version_number DESC"
        );
        sqlx::query_as::<_, ContentVersion>(&query)
            .bind(root_id)
            .fetch_all(conn)
            .await
    }

    /// Find the root's current working snapshot (`draft` or `modified`),
    /// if one exists. At most one per root is maintained by the
    /// publication flows.
    pub async fn find_working(
        conn: &mut PgConnection,
        root_id: RootId,
    ) -> Result<Option<ContentVersion>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM content_versions
             WHERE root_id = $1 AND status IN ($2, $3) AND deleted_at IS NULL
             ORDER BY version_number DESC
             LIMIT 1"
        );
        sqlx::query_as::<_, ContentVersion>(&query)
            .bind(root_id)
            .bind(STATUS_DRAFT)
            .bind(STATUS_MODIFIED)
            .fetch_optional(conn)
            .await
    }

    /// Find the root's currently published version, if any. At most one
    /// version per root holds `published` at a time.
    pub async fn find_published(
        conn: &mut PgConnection,
        root_id: RootId,
    ) -> Result<Option<ContentVersion>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM content_versions
             WHERE root_id = $1 AND status = $2 AND deleted_at IS NULL"
        );
        sqlx::query_as::<_, ContentVersion>(&query)
            .bind(root_id)
            .bind(STATUS_PUBLISHED)
            .fetch_optional(conn)
            .await
    }

    /// Patch a working version's content. Only non-`None` fields apply.
    /// Refuses published rows: their content is immutable.
    pub async fn update_content(
        conn: &mut PgConnection,
        id: VersionId,
        input: &UpdateContentVersion,
        modified_by: Option<&str>,
    ) -> Result<Option<ContentVersion>, sqlx::Error> {
        let query = format!(
            "UPDATE content_versions SET
                payload = COALESCE($2, payload),
                modified_at = NOW(),
                modified_by = COALESCE($3, modified_by)
             WHERE id = $1 AND status IN ($4, $5) AND deleted_at IS NULL
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ContentVersion>(&query)
            .bind(id)
            .bind(&input.payload)
            .bind(modified_by)
            .bind(STATUS_DRAFT)
            .bind(STATUS_MODIFIED)
            .fetch_optional(conn)
            .await
    }

    // ── Status machine ───────────────────────────────────────────────

    /// Move a version's status, guarded by the expected current status.
    ///
    /// Returns `false` when no row matched: either the version is gone
    /// or another writer moved it first; the caller maps that to a
    /// concurrency error.
    pub async fn update_status_guarded(
        conn: &mut PgConnection,
        id: VersionId,
        expected: PublicationStatus,
        next: PublicationStatus,
        modified_by: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE content_versions SET
                status = $3,
                modified_at = NOW(),
                modified_by = COALESCE($4, modified_by)
             WHERE id = $1 AND status = $2",
        )
        .bind(id)
        .bind(expected.as_str())
        .bind(next.as_str())
        .bind(modified_by)
        .execute(conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Copy-on-write: clone a snapshot into a new working version at the
    /// next version number, carrying the payload and template references.
    pub async fn clone_as_working(
        conn: &mut PgConnection,
        source_id: VersionId,
        created_by: Option<&str>,
    ) -> Result<Option<ContentVersion>, sqlx::Error> {
        let query = format!(
            "INSERT INTO content_versions
                (id, root_id, status, version_number, template_root_id,
                 template_organization_id, payload, created_by, modified_by)
             SELECT
                $2, src.root_id, $3,
                (SELECT COALESCE(MAX(version_number), 0) + 1
                 FROM content_versions v2 WHERE v2.root_id = src.root_id),
                src.template_root_id, src.template_organization_id, src.payload, $4, $4
             FROM content_versions src
             WHERE src.id = $1 AND src.deleted_at IS NULL
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ContentVersion>(&query)
            .bind(source_id)
            .bind(Uuid::new_v4())
            .bind(STATUS_MODIFIED)
            .bind(created_by)
            .fetch_optional(conn)
            .await
    }

    // ── Soft delete / restore / removal ──────────────────────────────

    /// Soft-delete a version: status becomes `deleted` and the row is
    /// hidden from the default lookups. The payload and the language
    /// records are retained for restore.
    pub async fn soft_delete(
        conn: &mut PgConnection,
        id: VersionId,
        modified_by: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE content_versions SET
                status = $2,
                deleted_at = NOW(),
                modified_at = NOW(),
                modified_by = COALESCE($3, modified_by)
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(STATUS_DELETED)
        .bind(modified_by)
        .execute(conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Restore a soft-deleted version into the given working status.
    pub async fn restore(
        conn: &mut PgConnection,
        id: VersionId,
        status: PublicationStatus,
        modified_by: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE content_versions SET
                status = $2,
                deleted_at = NULL,
                modified_at = NOW(),
                modified_by = COALESCE($3, modified_by)
             WHERE id = $1 AND deleted_at IS NOT NULL",
        )
        .bind(id)
        .bind(status.as_str())
        .bind(modified_by)
        .execute(conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Count distinct language records across a root's live versions,
    /// for batch pre-flight limits.
    pub async fn count_language_versions(
        conn: &mut PgConnection,
        root_id: RootId,
    ) -> Result<i64, sqlx::Error> {
        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(*)
             FROM language_availabilities la
             JOIN content_versions v ON v.id = la.version_id
             WHERE v.root_id = $1 AND v.deleted_at IS NULL",
        )
        .bind(root_id)
        .fetch_one(conn)
        .await?;
        Ok(row.0)
    }
}
