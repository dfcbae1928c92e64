//! Repository for the `content_roots` table.

use sercat_core::types::RootId;
use sqlx::PgConnection;
use uuid::Uuid;

use crate::models::content_root::{ContentRoot, CreateContentRoot};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, kind, created_at";

/// Provides create and lookup operations for content roots. Roots are
/// insert-only: there is no update or delete path by design of the
/// identity model.
pub struct RootRepo;

impl RootRepo {
    /// Register a new root identity.
    pub async fn create(
        conn: &mut PgConnection,
        input: &CreateContentRoot,
    ) -> Result<ContentRoot, sqlx::Error> {
        let query = format!(
            "INSERT INTO content_roots (id, kind)
             VALUES ($1, $2)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ContentRoot>(&query)
            .bind(Uuid::new_v4())
            .bind(&input.kind)
            .fetch_one(conn)
            .await
    }

    /// Find a root by its identity.
    pub async fn find_by_id(
        conn: &mut PgConnection,
        id: RootId,
    ) -> Result<Option<ContentRoot>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM content_roots WHERE id = $1");
        sqlx::query_as::<_, ContentRoot>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// List roots of one content kind.
    pub async fn list_by_kind(
        conn: &mut PgConnection,
        kind: &str,
    ) -> Result<Vec<ContentRoot>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM content_roots
             WHERE kind = $1
             ORDER BY created_at"
        );
        sqlx::query_as::<_, ContentRoot>(&query)
            .bind(kind)
            .fetch_all(conn)
            .await
    }
}
