//! Ordering synchronizer for service↔channel connections.
//!
//! A connection is one row per (service root, channel root) pair carrying
//! two independent order numbers: `service_order_number` is the link's
//! position in the owning service's channel list, `channel_order_number`
//! its position in the owning channel's service list. Each side's numbers
//! are rewritten only when that side is edited, so reordering a service's
//! channels never disturbs how any channel orders its own services.
//!
//! The synchronizer is a pure planner: it merges the submitted ordered
//! counterpart list into the existing link rows and emits a changeset the
//! storage layer applies inside the enclosing writer scope.

use serde::{Deserialize, Serialize};

use crate::types::RootId;

// ---------------------------------------------------------------------------
// Link records
// ---------------------------------------------------------------------------

/// A persisted connection row, as loaded from storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRecord {
    pub service_root_id: RootId,
    pub channel_root_id: RootId,
    /// Position in the service's channel list. `None` until the service
    /// side has been edited.
    pub service_order_number: Option<i32>,
    /// Position in the channel's service list. `None` until the channel
    /// side has been edited.
    pub channel_order_number: Option<i32>,
    /// Owned by an upstream system; must never be deleted by a registry
    /// edit that omits it.
    pub is_external_system_managed: bool,
}

impl LinkRecord {
    fn endpoints(&self) -> (RootId, RootId) {
        (self.service_root_id, self.channel_root_id)
    }
}

/// Which side of the many-to-many relation is being edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditedSide {
    /// A service's channel list was submitted.
    Service,
    /// A channel's service list was submitted.
    Channel,
}

// ---------------------------------------------------------------------------
// Changeset
// ---------------------------------------------------------------------------

/// An order-number rewrite for one existing link, on the edited side only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderUpdate {
    pub service_root_id: RootId,
    pub channel_root_id: RootId,
    pub order_number: i32,
}

/// The merged outcome of one side's edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionChangeSet {
    pub edited_side: EditedSide,
    /// Brand-new links; the edited side's order number is set, the
    /// counterpart side's stays `None` until that side is edited.
    pub inserts: Vec<LinkRecord>,
    /// Edited-side order rewrites for links that survive the edit.
    pub order_updates: Vec<OrderUpdate>,
    /// Endpoint pairs to delete. Never contains an external-system-managed
    /// link.
    pub deletes: Vec<(RootId, RootId)>,
}

impl ConnectionChangeSet {
    pub fn is_empty(&self) -> bool {
        self.inserts.is_empty() && self.order_updates.is_empty() && self.deletes.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Synchronization
// ---------------------------------------------------------------------------

/// Merge the submitted ordered counterpart list for `editing_root` into
/// the persisted links.
///
/// - Existing links present in the submitted list get the edited side's
///   order number rewritten to the submitted position (contiguous from 1);
///   the counterpart side's number is left untouched.
/// - Links absent from the submitted list are deleted, except
///   external-system-managed ones, which survive with both numbers intact.
/// - Submitted counterparts with no existing link become inserts with the
///   edited side numbered by position and the counterpart side unset.
///
/// `existing` may contain links not touching `editing_root`; they are
/// ignored, never rewritten.
pub fn synchronize(
    edited_side: EditedSide,
    editing_root: RootId,
    existing: &[LinkRecord],
    submitted: &[RootId],
) -> ConnectionChangeSet {
    let own: Vec<&LinkRecord> = existing
        .iter()
        .filter(|l| match edited_side {
            EditedSide::Service => l.service_root_id == editing_root,
            EditedSide::Channel => l.channel_root_id == editing_root,
        })
        .collect();

    // Dedupe the submission, keeping the first occurrence's position.
    let mut seen = Vec::with_capacity(submitted.len());
    for id in submitted {
        if !seen.contains(id) {
            seen.push(*id);
        }
    }

    let mut inserts = Vec::new();
    let mut order_updates = Vec::new();

    for (index, counterpart) in seen.iter().enumerate() {
        let order_number = (index + 1) as i32;
        let existing_link = own.iter().find(|l| match edited_side {
            EditedSide::Service => l.channel_root_id == *counterpart,
            EditedSide::Channel => l.service_root_id == *counterpart,
        });
        let (service_root_id, channel_root_id) = match edited_side {
            EditedSide::Service => (editing_root, *counterpart),
            EditedSide::Channel => (*counterpart, editing_root),
        };
        match existing_link {
            Some(_) => order_updates.push(OrderUpdate {
                service_root_id,
                channel_root_id,
                order_number,
            }),
            None => inserts.push(match edited_side {
                EditedSide::Service => LinkRecord {
                    service_root_id,
                    channel_root_id,
                    service_order_number: Some(order_number),
                    channel_order_number: None,
                    is_external_system_managed: false,
                },
                EditedSide::Channel => LinkRecord {
                    service_root_id,
                    channel_root_id,
                    service_order_number: None,
                    channel_order_number: Some(order_number),
                    is_external_system_managed: false,
                },
            }),
        }
    }

    let deletes = own
        .iter()
        .filter(|l| {
            let counterpart = match edited_side {
                EditedSide::Service => l.channel_root_id,
                EditedSide::Channel => l.service_root_id,
            };
            !seen.contains(&counterpart) && !l.is_external_system_managed
        })
        .map(|l| l.endpoints())
        .collect();

    ConnectionChangeSet {
        edited_side,
        inserts,
        order_updates,
        deletes,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
