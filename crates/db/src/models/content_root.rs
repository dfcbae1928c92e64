//! Content root entity model.

use serde::{Deserialize, Serialize};
use sercat_core::types::{RootId, Timestamp};
use sqlx::FromRow;

/// A row from the `content_roots` table: the stable identity shared by
/// every version of one logical content item. Insert-only; never mutated,
/// never reused.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ContentRoot {
    pub id: RootId,
    pub kind: String,
    pub created_at: Timestamp,
}

/// DTO for registering a new content root.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateContentRoot {
    pub kind: String,
}
