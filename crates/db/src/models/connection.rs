//! Service↔channel connection entity model.

use serde::{Deserialize, Serialize};
use sercat_core::connections::LinkRecord;
use sercat_core::types::{RootId, Timestamp};
use sqlx::FromRow;

/// A row from the `service_channel_connections` table. One row per
/// (service root, channel root) pair; the two order numbers are owned by
/// their respective sides and rewritten independently.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ConnectionRow {
    pub service_root_id: RootId,
    pub channel_root_id: RootId,
    pub service_order_number: Option<i32>,
    pub channel_order_number: Option<i32>,
    pub is_external_system_managed: bool,
    pub created_at: Timestamp,
    pub modified_at: Timestamp,
}

impl ConnectionRow {
    /// Project the row into the core link record consumed by the
    /// ordering synchronizer.
    pub fn to_link(&self) -> LinkRecord {
        LinkRecord {
            service_root_id: self.service_root_id,
            channel_root_id: self.channel_root_id,
            service_order_number: self.service_order_number,
            channel_order_number: self.channel_order_number,
            is_external_system_managed: self.is_external_system_managed,
        }
    }
}

/// DTO for inserting a connection row.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateConnection {
    pub service_root_id: RootId,
    pub channel_root_id: RootId,
    pub service_order_number: Option<i32>,
    pub channel_order_number: Option<i32>,
    pub is_external_system_managed: bool,
}
