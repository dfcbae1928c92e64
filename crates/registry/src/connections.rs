//! Connection edits over the unit-of-work boundary.
//!
//! The UI submits one side's full ordered counterpart list; the core
//! synchronizer plans the merge and the changeset is applied atomically
//! inside a single writer scope. The unedited side's numbering is never
//! part of the changeset.

use sercat_core::connections::{synchronize, ConnectionChangeSet, EditedSide, LinkRecord};
use sercat_core::types::RootId;
use sercat_db::repositories::ConnectionRepo;
use sercat_db::{Actor, Database, SaveMode, StoreError};

/// Applies connection-list edits for either side of the relation.
#[derive(Clone)]
pub struct ConnectionService {
    db: Database,
}

impl ConnectionService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Replace a service's channel list with the submitted ordered set.
    pub async fn update_service_channels(
        &self,
        actor: Actor,
        service_root_id: RootId,
        submitted: &[RootId],
    ) -> Result<ConnectionChangeSet, StoreError> {
        self.apply(actor, EditedSide::Service, service_root_id, submitted)
            .await
    }

    /// Replace a channel's service list with the submitted ordered set.
    pub async fn update_channel_services(
        &self,
        actor: Actor,
        channel_root_id: RootId,
        submitted: &[RootId],
    ) -> Result<ConnectionChangeSet, StoreError> {
        self.apply(actor, EditedSide::Channel, channel_root_id, submitted)
            .await
    }

    async fn apply(
        &self,
        actor: Actor,
        side: EditedSide,
        editing_root: RootId,
        submitted: &[RootId],
    ) -> Result<ConnectionChangeSet, StoreError> {
        self.db
            .execute_writer(Some(actor), |mut w| async move {
                let rows = match side {
                    EditedSide::Service => {
                        ConnectionRepo::list_for_service(w.conn(), editing_root).await?
                    }
                    EditedSide::Channel => {
                        ConnectionRepo::list_for_channel(w.conn(), editing_root).await?
                    }
                };
                let existing: Vec<LinkRecord> = rows.iter().map(|r| r.to_link()).collect();

                let set = synchronize(side, editing_root, &existing, submitted);
                ConnectionRepo::apply_changeset(w.conn(), &set).await?;
                tracing::info!(
                    root = %editing_root,
                    inserts = set.inserts.len(),
                    updates = set.order_updates.len(),
                    deletes = set.deletes.len(),
                    "applied connection edit"
                );
                w.save(SaveMode::Standard).await?;
                Ok(set)
            })
            .await
    }

    /// A service's links in its chosen order, via a read-only scope.
    pub async fn channels_of_service(
        &self,
        service_root_id: RootId,
    ) -> Result<Vec<LinkRecord>, StoreError> {
        self.db
            .execute_reader(|mut r| async move {
                let rows = ConnectionRepo::list_for_service(r.conn(), service_root_id).await?;
                Ok(rows.iter().map(|row| row.to_link()).collect())
            })
            .await
    }

    /// A channel's links in its chosen order, via a read-only scope.
    pub async fn services_of_channel(
        &self,
        channel_root_id: RootId,
    ) -> Result<Vec<LinkRecord>, StoreError> {
        self.db
            .execute_reader(|mut r| async move {
                let rows = ConnectionRepo::list_for_channel(r.conn(), channel_root_id).await?;
                Ok(rows.iter().map(|row| row.to_link()).collect())
            })
            .await
    }
}
