//! Repository for the `service_channel_connections` table.

use sercat_core::connections::{ConnectionChangeSet, EditedSide};
use sercat_core::types::RootId;
use sqlx::PgConnection;

use crate::models::connection::{ConnectionRow, CreateConnection};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "service_root_id, channel_root_id, service_order_number, \
    channel_order_number, is_external_system_managed, created_at, modified_at";

/// Provides link operations for service↔channel connections.
pub struct ConnectionRepo;

impl ConnectionRepo {
    /// List a service's links, in the service's chosen order.
    pub async fn list_for_service(
        conn: &mut PgConnection,
        service_root_id: RootId,
    ) -> Result<Vec<ConnectionRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM service_channel_connections
             WHERE service_root_id = $1
             ORDER BY service_order_number NULLS LAST, channel_root_id"
        );
        sqlx::query_as::<_, ConnectionRow>(&query)
            .bind(service_root_id)
            .fetch_all(conn)
            .await
    }

    /// List a channel's links, in the channel's chosen order.
    pub async fn list_for_channel(
        conn: &mut PgConnection,
        channel_root_id: RootId,
    ) -> Result<Vec<ConnectionRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM service_channel_connections
             WHERE channel_root_id = $1
             ORDER BY channel_order_number NULLS LAST, service_root_id"
        );
        sqlx::query_as::<_, ConnectionRow>(&query)
            .bind(channel_root_id)
            .fetch_all(conn)
            .await
    }

    /// Insert a new link.
    pub async fn create(
        conn: &mut PgConnection,
        input: &CreateConnection,
    ) -> Result<ConnectionRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO service_channel_connections
                (service_root_id, channel_root_id, service_order_number,
                 channel_order_number, is_external_system_managed)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ConnectionRow>(&query)
            .bind(input.service_root_id)
            .bind(input.channel_root_id)
            .bind(input.service_order_number)
            .bind(input.channel_order_number)
            .bind(input.is_external_system_managed)
            .fetch_one(conn)
            .await
    }

    /// Overwrite one side's order number on an existing link, leaving the
    /// counterpart side untouched.
    pub async fn set_side_order(
        conn: &mut PgConnection,
        service_root_id: RootId,
        channel_root_id: RootId,
        side: EditedSide,
        order_number: i32,
    ) -> Result<bool, sqlx::Error> {
        let sql = match side {
            EditedSide::Service => {
                "UPDATE service_channel_connections
                 SET service_order_number = $3, modified_at = NOW()
                 WHERE service_root_id = $1 AND channel_root_id = $2"
            }
            EditedSide::Channel => {
                "UPDATE service_channel_connections
                 SET channel_order_number = $3, modified_at = NOW()
                 WHERE service_root_id = $1 AND channel_root_id = $2"
            }
        };
        let result = sqlx::query(sql)
            .bind(service_root_id)
            .bind(channel_root_id)
            .bind(order_number)
            .execute(conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a link by its endpoint pair. External-system-managed links
    /// are refused at the SQL level as a second line of defence behind the
    /// synchronizer.
    pub async fn delete(
        conn: &mut PgConnection,
        service_root_id: RootId,
        channel_root_id: RootId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM service_channel_connections
             WHERE service_root_id = $1 AND channel_root_id = $2
               AND is_external_system_managed = false",
        )
        .bind(service_root_id)
        .bind(channel_root_id)
        .execute(conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Apply a synchronizer changeset on the calling scope's transaction:
    /// deletes, then order rewrites, then inserts.
    pub async fn apply_changeset(
        conn: &mut PgConnection,
        set: &ConnectionChangeSet,
    ) -> Result<(), sqlx::Error> {
        for (service_root_id, channel_root_id) in &set.deletes {
            Self::delete(&mut *conn, *service_root_id, *channel_root_id).await?;
        }
        for update in &set.order_updates {
            Self::set_side_order(
                &mut *conn,
                update.service_root_id,
                update.channel_root_id,
                set.edited_side,
                update.order_number,
            )
            .await?;
        }
        for link in &set.inserts {
            Self::create(
                &mut *conn,
                &CreateConnection {
                    service_root_id: link.service_root_id,
                    channel_root_id: link.channel_root_id,
                    service_order_number: link.service_order_number,
                    channel_order_number: link.channel_order_number,
                    is_external_system_managed: link.is_external_system_managed,
                },
            )
            .await?;
        }
        Ok(())
    }
}
