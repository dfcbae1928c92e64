//! Mass-operation request shape and pre-flight validation.
//!
//! Batch publish/archive requests group target root identities by content
//! kind, with optional scheduling timestamps and an owning organization.
//! The whole batch is validated before any write occurs; count-limit
//! failures are validation-class and abort the batch as a unit.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::CoreError;
use crate::types::{ContentKind, OrganizationId, RootId, Timestamp};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Maximum total number of target entities in one batch.
pub const MAX_BATCH_ENTITIES: usize = 150;

/// Maximum number of language versions one entity may carry for a batch
/// operation to accept it.
pub const MAX_LANGUAGE_VERSIONS_PER_ENTITY: usize = 30;

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// A batch publish/archive request, grouped by content kind.
///
/// Per-kind lists are capped at the whole-batch maximum; the aggregate
/// limit is enforced by [`validate_batch_size`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct MassOperationRequest {
    /// Owning organization for the batch, when the operation requires one
    /// (e.g. copy-as-template).
    pub organization_id: Option<OrganizationId>,
    /// When the targets should be published. `None` means immediately.
    pub publish_at: Option<Timestamp>,
    /// When the targets should be archived. `None` means no scheduled
    /// archival.
    pub archive_at: Option<Timestamp>,
    #[validate(length(max = 150))]
    pub services: Vec<RootId>,
    #[validate(length(max = 150))]
    pub channels: Vec<RootId>,
    #[validate(length(max = 150))]
    pub organizations: Vec<RootId>,
    #[validate(length(max = 150))]
    pub general_descriptions: Vec<RootId>,
    #[validate(length(max = 150))]
    pub service_collections: Vec<RootId>,
}

impl MassOperationRequest {
    /// Targets grouped by kind, in the order the kinds are processed.
    /// Empty kinds are skipped.
    pub fn targets(&self) -> Vec<(ContentKind, &[RootId])> {
        let groups: [(ContentKind, &[RootId]); 5] = [
            (ContentKind::Service, &self.services),
            (ContentKind::Channel, &self.channels),
            (ContentKind::Organization, &self.organizations),
            (ContentKind::GeneralDescription, &self.general_descriptions),
            (ContentKind::ServiceCollection, &self.service_collections),
        ];
        groups
            .into_iter()
            .filter(|(_, ids)| !ids.is_empty())
            .collect()
    }

    /// Total number of targets across all kinds.
    pub fn total_count(&self) -> usize {
        self.targets().iter().map(|(_, ids)| ids.len()).sum()
    }

    /// Whether the scheduled publish time has passed.
    pub fn publish_due(&self, now: Timestamp) -> bool {
        match self.publish_at {
            Some(at) => at <= now,
            None => true,
        }
    }

    /// Whether the scheduled archive time has passed.
    pub fn archive_due(&self, now: Timestamp) -> bool {
        match self.archive_at {
            Some(at) => at <= now,
            None => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Pre-flight validation
// ---------------------------------------------------------------------------

/// Validate the aggregate batch size before any write occurs.
pub fn validate_batch_size(request: &MassOperationRequest) -> Result<(), CoreError> {
    let total = request.total_count();
    if total == 0 {
        return Err(CoreError::validation("mass.empty-batch"));
    }
    if total > MAX_BATCH_ENTITIES {
        return Err(CoreError::CountLimit(format!(
            "batch targets {total} entities, maximum is {MAX_BATCH_ENTITIES}"
        )));
    }
    Ok(())
}

/// Validate per-entity language-version counts, supplied by the caller as
/// (root id, language-version count) pairs for every target in the batch.
pub fn validate_language_version_counts(
    counts: &[(RootId, usize)],
) -> Result<(), CoreError> {
    for (root_id, count) in counts {
        if *count > MAX_LANGUAGE_VERSIONS_PER_ENTITY {
            return Err(CoreError::CountLimit(format!(
                "entity {root_id} has {count} language versions, maximum is \
                 {MAX_LANGUAGE_VERSIONS_PER_ENTITY}"
            )));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn ids(n: usize) -> Vec<RootId> {
        (0..n).map(|_| Uuid::new_v4()).collect()
    }

    #[test]
    fn targets_skips_empty_kinds() {
        let request = MassOperationRequest {
            services: ids(2),
            channels: ids(1),
            ..Default::default()
        };
        let targets = request.targets();
        assert_eq!(targets.len(), 2);
        assert_eq!(targets[0].0, ContentKind::Service);
        assert_eq!(targets[1].0, ContentKind::Channel);
    }

    #[test]
    fn empty_batch_rejected() {
        let request = MassOperationRequest::default();
        let err = validate_batch_size(&request).expect_err("must fail");
        assert!(matches!(err, CoreError::Validation { ref key } if key == "mass.empty-batch"));
    }

    #[test]
    fn batch_at_limit_accepted() {
        let request = MassOperationRequest {
            services: ids(MAX_BATCH_ENTITIES),
            ..Default::default()
        };
        assert!(validate_batch_size(&request).is_ok());
    }

    #[test]
    fn oversized_batch_rejected_across_kinds() {
        let request = MassOperationRequest {
            services: ids(100),
            channels: ids(51),
            ..Default::default()
        };
        let err = validate_batch_size(&request).expect_err("must fail");
        assert!(matches!(err, CoreError::CountLimit(_)));
    }

    #[test]
    fn language_version_count_at_limit_accepted() {
        let counts = vec![(Uuid::new_v4(), MAX_LANGUAGE_VERSIONS_PER_ENTITY)];
        assert!(validate_language_version_counts(&counts).is_ok());
    }

    #[test]
    fn language_version_count_over_limit_rejected() {
        let counts = vec![(Uuid::new_v4(), MAX_LANGUAGE_VERSIONS_PER_ENTITY + 1)];
        let err = validate_language_version_counts(&counts).expect_err("must fail");
        assert!(matches!(err, CoreError::CountLimit(_)));
    }

    #[test]
    fn publish_due_without_schedule_is_immediate() {
        let request = MassOperationRequest::default();
        assert!(request.publish_due(chrono::Utc::now()));
    }

    #[test]
    fn publish_due_respects_future_schedule() {
        let request = MassOperationRequest {
            publish_at: Some(chrono::Utc::now() + chrono::Duration::hours(1)),
            ..Default::default()
        };
        assert!(!request.publish_due(chrono::Utc::now()));
    }

    #[test]
    fn archive_without_schedule_never_due() {
        let request = MassOperationRequest::default();
        assert!(!request.archive_due(chrono::Utc::now()));
    }
}
