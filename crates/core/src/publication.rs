//! Publication status machine and per-language availability.
//!
//! A content item is a chain of version snapshots sharing one root
//! identity. Each version carries a version-level [`PublicationStatus`]
//! plus one [`LanguageAvailability`] record per translation, and the two
//! move independently: Finnish can be `Published` while Swedish is still
//! `Draft` on the same version.
//!
//! This module is pure. It validates transitions and produces plans over
//! caller-supplied state; applying a plan to storage is the registry
//! crate's job, inside a single writer scope.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::language::LanguageCode;
use crate::types::{RootId, Timestamp, VersionId};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Valid publication status strings (stored in DB).
pub const STATUS_DRAFT: &str = "draft";
pub const STATUS_MODIFIED: &str = "modified";
pub const STATUS_PUBLISHED: &str = "published";
pub const STATUS_OLD_PUBLISHED: &str = "old_published";
pub const STATUS_DELETED: &str = "deleted";
pub const STATUS_REMOVED: &str = "removed";

/// All valid publication status strings.
pub const VALID_PUBLICATION_STATUSES: &[&str] = &[
    STATUS_DRAFT,
    STATUS_MODIFIED,
    STATUS_PUBLISHED,
    STATUS_OLD_PUBLISHED,
    STATUS_DELETED,
    STATUS_REMOVED,
];

// ---------------------------------------------------------------------------
// PublicationStatus
// ---------------------------------------------------------------------------

/// Lifecycle status of a version snapshot or of one of its languages.
///
/// At version level the full vocabulary applies. Per-language records use
/// the same vocabulary minus `Deleted` (a language is withdrawn via
/// `Removed`; soft delete happens at version level).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublicationStatus {
    Draft,
    Modified,
    Published,
    OldPublished,
    Deleted,
    Removed,
}

impl PublicationStatus {
    /// Convert from a database string value.
    pub fn from_str_value(s: &str) -> Result<Self, String> {
        match s {
            STATUS_DRAFT => Ok(Self::Draft),
            STATUS_MODIFIED => Ok(Self::Modified),
            STATUS_PUBLISHED => Ok(Self::Published),
            STATUS_OLD_PUBLISHED => Ok(Self::OldPublished),
            STATUS_DELETED => Ok(Self::Deleted),
            STATUS_REMOVED => Ok(Self::Removed),
            _ => Err(format!(
                "Invalid publication status '{s}'. Must be one of: {}",
                VALID_PUBLICATION_STATUSES.join(", ")
            )),
        }
    }

    /// Convert to the database string value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => STATUS_DRAFT,
            Self::Modified => STATUS_MODIFIED,
            Self::Published => STATUS_PUBLISHED,
            Self::OldPublished => STATUS_OLD_PUBLISHED,
            Self::Deleted => STATUS_DELETED,
            Self::Removed => STATUS_REMOVED,
        }
    }

    /// Whether this status is valid for a per-language availability record.
    pub fn is_language_status(&self) -> bool {
        !matches!(self, Self::Deleted)
    }
}

/// Whether `from -> to` is a defined version-level transition.
///
/// The table is deliberately closed: anything not listed here is a
/// programmer error at the call site, surfaced as a validation failure by
/// the planning functions.
pub fn allowed_transition(from: PublicationStatus, to: PublicationStatus) -> bool {
    use PublicationStatus::*;
    match (from, to) {
        // First save after creation.
        (Draft, Modified) => true,
        // Publish from a working snapshot.
        (Draft, Published) | (Modified, Published) => true,
        // Editing a published version produces a new working snapshot.
        (Published, Modified) => true,
        // A newer version got published over this one.
        (Published, OldPublished) => true,
        // Re-publishing a superseded version.
        (OldPublished, Published) | (OldPublished, Modified) => true,
        // Soft delete from any live state.
        (Draft, Deleted) | (Modified, Deleted) | (Published, Deleted) | (OldPublished, Deleted) => {
            true
        }
        // Restore reinstates a working state.
        (Deleted, Draft) | (Deleted, Modified) => true,
        // Hard removal is only permitted from the soft-deleted state.
        (Deleted, Removed) => true,
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// Language availability
// ---------------------------------------------------------------------------

/// Per-(version, language) publication record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageAvailability {
    pub language: LanguageCode,
    pub status: PublicationStatus,
    /// Readiness predicate computed by completeness validation outside
    /// this core; consumed here, never produced.
    pub can_be_published: bool,
    /// When this language stopped being the publicly visible one.
    pub archived_at: Option<Timestamp>,
    /// Who triggered the archival.
    pub archived_by: Option<String>,
}

impl LanguageAvailability {
    /// A fresh draft-language record.
    pub fn draft(language: LanguageCode) -> Self {
        Self {
            language,
            status: PublicationStatus::Draft,
            can_be_published: false,
            archived_at: None,
            archived_by: None,
        }
    }

    /// Stamp the archival audit fields. Independent of any status
    /// transition; captures when the language left public visibility.
    pub fn stamp_archived(&mut self, at: Timestamp, by: impl Into<String>) {
        self.archived_at = Some(at);
        self.archived_by = Some(by.into());
    }
}

// ---------------------------------------------------------------------------
// Version state and plans
// ---------------------------------------------------------------------------

/// In-memory view of one version snapshot consumed by the planners.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionState {
    pub version_id: VersionId,
    pub root_id: RootId,
    pub status: PublicationStatus,
    pub languages: Vec<LanguageAvailability>,
}

impl VersionState {
    /// Find a language record by code.
    pub fn language(&self, code: &LanguageCode) -> Option<&LanguageAvailability> {
        self.languages.iter().find(|l| &l.language == code)
    }

    fn language_mut(&mut self, code: &LanguageCode) -> Option<&mut LanguageAvailability> {
        self.languages.iter_mut().find(|l| &l.language == code)
    }
}

/// One planned per-language status change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageChange {
    pub language: LanguageCode,
    pub status: PublicationStatus,
}

/// Outcome of [`plan_publish`]: the per-language changes to apply on the
/// target version and the resulting version-level status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishPlan {
    pub version_id: VersionId,
    pub language_changes: Vec<LanguageChange>,
    pub version_status: PublicationStatus,
}

/// Version-level status derived from the per-language records.
///
/// `Published` iff every language outside `Removed` is `Published`;
/// otherwise `Modified` (mixed per-language statuses). `Removed`
/// languages are excluded from the quorum; assumption pending product
/// sign-off for edge combinations.
pub fn aggregate_status(languages: &[LanguageAvailability]) -> PublicationStatus {
    let mut any = false;
    for lang in languages {
        if lang.status == PublicationStatus::Removed {
            continue;
        }
        any = true;
        if lang.status != PublicationStatus::Published {
            return PublicationStatus::Modified;
        }
    }
    if any {
        PublicationStatus::Published
    } else {
        PublicationStatus::Modified
    }
}

/// Plan publishing the requested languages of a version.
///
/// Fails with a validation error when the version is not in a publishable
/// state, when a requested language is missing from the version, or when
/// zero requested languages are ready (`can_be_published`); never a
/// silent no-op. Languages not requested are left untouched.
pub fn plan_publish(
    state: &VersionState,
    requested: &[LanguageCode],
) -> Result<PublishPlan, CoreError> {
    if !allowed_transition(state.status, PublicationStatus::Published)
        && state.status != PublicationStatus::Published
    {
        return Err(CoreError::validation("publishing.invalid-source-status"));
    }
    if requested.is_empty() {
        return Err(CoreError::validation("publishing.no-language-requested"));
    }

    let mut ready = Vec::new();
    for code in requested {
        let lang = state
            .language(code)
            .ok_or_else(|| CoreError::validation("publishing.unknown-language"))?;
        if lang.status == PublicationStatus::Removed {
            return Err(CoreError::validation("publishing.language-removed"));
        }
        if lang.can_be_published {
            ready.push(code.clone());
        }
    }
    if ready.is_empty() {
        return Err(CoreError::validation("publishing.no-publishable-language"));
    }

    let mut projected = state.languages.clone();
    for lang in projected.iter_mut() {
        if ready.contains(&lang.language) {
            lang.status = PublicationStatus::Published;
        }
    }

    Ok(PublishPlan {
        version_id: state.version_id,
        language_changes: ready
            .into_iter()
            .map(|language| LanguageChange {
                language,
                status: PublicationStatus::Published,
            })
            .collect(),
        version_status: aggregate_status(&projected),
    })
}

/// Plan demoting the previously published version once a newer one takes
/// its place: every `Published` language record becomes `OldPublished`
/// and the version itself becomes `OldPublished`.
pub fn plan_supersede(state: &VersionState) -> Result<PublishPlan, CoreError> {
    if !allowed_transition(state.status, PublicationStatus::OldPublished) {
        return Err(CoreError::validation("publishing.supersede-not-published"));
    }
    let language_changes = state
        .languages
        .iter()
        .filter(|l| l.status == PublicationStatus::Published)
        .map(|l| LanguageChange {
            language: l.language.clone(),
            status: PublicationStatus::OldPublished,
        })
        .collect();
    Ok(PublishPlan {
        version_id: state.version_id,
        language_changes,
        version_status: PublicationStatus::OldPublished,
    })
}

/// Apply a plan's changes to an in-memory state. Storage application goes
/// through the repositories; this keeps in-memory projections consistent
/// for chained planning within one writer scope.
pub fn apply_plan(state: &mut VersionState, plan: &PublishPlan) {
    debug_assert_eq!(state.version_id, plan.version_id);
    for change in &plan.language_changes {
        if let Some(lang) = state.language_mut(&change.language) {
            lang.status = change.status;
        }
    }
    state.status = plan.version_status;
}

/// Status a soft-deleted version returns to on restore: `Draft` when no
/// language ever left draft, `Modified` otherwise. The per-language
/// statuses themselves were retained through the delete and are
/// reinstated verbatim.
pub fn restore_status(languages: &[LanguageAvailability]) -> PublicationStatus {
    let all_draft = languages
        .iter()
        .all(|l| l.status == PublicationStatus::Draft);
    if all_draft {
        PublicationStatus::Draft
    } else {
        PublicationStatus::Modified
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn lang(code: &str, status: PublicationStatus, ready: bool) -> LanguageAvailability {
        LanguageAvailability {
            language: LanguageCode::new(code),
            status,
            can_be_published: ready,
            archived_at: None,
            archived_by: None,
        }
    }

    fn state(status: PublicationStatus, languages: Vec<LanguageAvailability>) -> VersionState {
        VersionState {
            version_id: Uuid::new_v4(),
            root_id: Uuid::new_v4(),
            status,
            languages,
        }
    }

    // -- status codec ---------------------------------------------------------

    #[test]
    fn status_round_trip() {
        for status in &[
            PublicationStatus::Draft,
            PublicationStatus::Modified,
            PublicationStatus::Published,
            PublicationStatus::OldPublished,
            PublicationStatus::Deleted,
            PublicationStatus::Removed,
        ] {
            assert_eq!(
                PublicationStatus::from_str_value(status.as_str()).unwrap(),
                *status
            );
        }
    }

    #[test]
    fn status_from_str_invalid() {
        let result = PublicationStatus::from_str_value("archived");
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("Invalid publication status"));
    }

    #[test]
    fn deleted_is_not_a_language_status() {
        assert!(!PublicationStatus::Deleted.is_language_status());
        assert!(PublicationStatus::Removed.is_language_status());
        assert!(PublicationStatus::Published.is_language_status());
    }

    // -- transition table -----------------------------------------------------

    #[test]
    fn draft_advances_to_modified_and_published() {
        assert!(allowed_transition(
            PublicationStatus::Draft,
            PublicationStatus::Modified
        ));
        assert!(allowed_transition(
            PublicationStatus::Draft,
            PublicationStatus::Published
        ));
    }

    #[test]
    fn published_reverts_to_modified_for_editing() {
        assert!(allowed_transition(
            PublicationStatus::Published,
            PublicationStatus::Modified
        ));
    }

    #[test]
    fn removal_only_from_deleted() {
        assert!(allowed_transition(
            PublicationStatus::Deleted,
            PublicationStatus::Removed
        ));
        for from in &[
            PublicationStatus::Draft,
            PublicationStatus::Modified,
            PublicationStatus::Published,
            PublicationStatus::OldPublished,
        ] {
            assert!(!allowed_transition(*from, PublicationStatus::Removed));
        }
    }

    #[test]
    fn removed_is_terminal() {
        for to in &[
            PublicationStatus::Draft,
            PublicationStatus::Modified,
            PublicationStatus::Published,
            PublicationStatus::OldPublished,
            PublicationStatus::Deleted,
        ] {
            assert!(!allowed_transition(PublicationStatus::Removed, *to));
        }
    }

    #[test]
    fn soft_delete_from_any_live_state() {
        for from in &[
            PublicationStatus::Draft,
            PublicationStatus::Modified,
            PublicationStatus::Published,
            PublicationStatus::OldPublished,
        ] {
            assert!(allowed_transition(*from, PublicationStatus::Deleted));
        }
    }

    #[test]
    fn restore_targets_working_states_only() {
        assert!(allowed_transition(
            PublicationStatus::Deleted,
            PublicationStatus::Draft
        ));
        assert!(allowed_transition(
            PublicationStatus::Deleted,
            PublicationStatus::Modified
        ));
        assert!(!allowed_transition(
            PublicationStatus::Deleted,
            PublicationStatus::Published
        ));
    }

    // -- aggregation rule -----------------------------------------------------

    #[test]
    fn all_languages_published_aggregates_to_published() {
        let langs = vec![
            lang("fi", PublicationStatus::Published, true),
            lang("sv", PublicationStatus::Published, true),
        ];
        assert_eq!(aggregate_status(&langs), PublicationStatus::Published);
    }

    #[test]
    fn mixed_languages_aggregate_to_modified() {
        let langs = vec![
            lang("fi", PublicationStatus::Published, true),
            lang("sv", PublicationStatus::Draft, false),
        ];
        assert_eq!(aggregate_status(&langs), PublicationStatus::Modified);
    }

    #[test]
    fn removed_languages_excluded_from_quorum() {
        let langs = vec![
            lang("fi", PublicationStatus::Published, true),
            lang("sv", PublicationStatus::Removed, false),
        ];
        assert_eq!(aggregate_status(&langs), PublicationStatus::Published);
    }

    #[test]
    fn old_published_language_blocks_published_aggregate() {
        let langs = vec![
            lang("fi", PublicationStatus::Published, true),
            lang("sv", PublicationStatus::OldPublished, true),
        ];
        assert_eq!(aggregate_status(&langs), PublicationStatus::Modified);
    }

    // -- plan_publish ---------------------------------------------------------

    #[test]
    fn publish_with_zero_ready_languages_fails_validation() {
        let s = state(
            PublicationStatus::Draft,
            vec![
                lang("fi", PublicationStatus::Draft, false),
                lang("sv", PublicationStatus::Draft, false),
            ],
        );
        let before = s.clone();
        let err = plan_publish(&s, &[LanguageCode::new("fi"), LanguageCode::new("sv")])
            .expect_err("must fail");
        assert!(matches!(err, CoreError::Validation { ref key }
            if key == "publishing.no-publishable-language"));
        // Pure planner: the input state is untouched on failure.
        assert_eq!(s.status, before.status);
        assert_eq!(s.languages, before.languages);
    }

    #[test]
    fn publish_with_no_languages_requested_fails_validation() {
        let s = state(
            PublicationStatus::Draft,
            vec![lang("fi", PublicationStatus::Draft, true)],
        );
        assert!(plan_publish(&s, &[]).is_err());
    }

    #[test]
    fn publishing_one_language_leaves_the_other_untouched() {
        let s = state(
            PublicationStatus::Modified,
            vec![
                lang("fi", PublicationStatus::Modified, true),
                lang("sv", PublicationStatus::Draft, false),
            ],
        );
        let plan = plan_publish(&s, &[LanguageCode::new("fi")]).unwrap();

        assert_eq!(plan.language_changes.len(), 1);
        assert_eq!(plan.language_changes[0].language, LanguageCode::new("fi"));
        assert_eq!(
            plan.language_changes[0].status,
            PublicationStatus::Published
        );
        // Swedish is not part of the plan at all.
        assert!(!plan
            .language_changes
            .iter()
            .any(|c| c.language == LanguageCode::new("sv")));
        // Mixed statuses: version level stays Modified.
        assert_eq!(plan.version_status, PublicationStatus::Modified);
    }

    #[test]
    fn publishing_all_languages_promotes_version_status() {
        let s = state(
            PublicationStatus::Modified,
            vec![
                lang("fi", PublicationStatus::Modified, true),
                lang("sv", PublicationStatus::Modified, true),
            ],
        );
        let plan =
            plan_publish(&s, &[LanguageCode::new("fi"), LanguageCode::new("sv")]).unwrap();
        assert_eq!(plan.version_status, PublicationStatus::Published);
    }

    #[test]
    fn publish_unknown_language_fails_validation() {
        let s = state(
            PublicationStatus::Draft,
            vec![lang("fi", PublicationStatus::Draft, true)],
        );
        assert!(plan_publish(&s, &[LanguageCode::new("de")]).is_err());
    }

    #[test]
    fn publish_from_deleted_fails_validation() {
        let s = state(
            PublicationStatus::Deleted,
            vec![lang("fi", PublicationStatus::Draft, true)],
        );
        assert!(plan_publish(&s, &[LanguageCode::new("fi")]).is_err());
    }

    #[test]
    fn requested_but_unready_language_is_skipped_when_another_is_ready() {
        let s = state(
            PublicationStatus::Modified,
            vec![
                lang("fi", PublicationStatus::Modified, true),
                lang("sv", PublicationStatus::Modified, false),
            ],
        );
        let plan =
            plan_publish(&s, &[LanguageCode::new("fi"), LanguageCode::new("sv")]).unwrap();
        assert_eq!(plan.language_changes.len(), 1);
        assert_eq!(plan.language_changes[0].language, LanguageCode::new("fi"));
    }

    // -- plan_supersede -------------------------------------------------------

    #[test]
    fn supersede_demotes_published_languages() {
        let s = state(
            PublicationStatus::Published,
            vec![
                lang("fi", PublicationStatus::Published, true),
                lang("sv", PublicationStatus::Draft, false),
            ],
        );
        let plan = plan_supersede(&s).unwrap();
        assert_eq!(plan.version_status, PublicationStatus::OldPublished);
        assert_eq!(plan.language_changes.len(), 1);
        assert_eq!(
            plan.language_changes[0].status,
            PublicationStatus::OldPublished
        );
    }

    #[test]
    fn supersede_requires_published_version() {
        let s = state(
            PublicationStatus::Draft,
            vec![lang("fi", PublicationStatus::Draft, false)],
        );
        assert!(plan_supersede(&s).is_err());
    }

    // -- apply_plan / root stability ------------------------------------------

    #[test]
    fn apply_plan_keeps_root_identity_stable() {
        let mut s = state(
            PublicationStatus::Modified,
            vec![
                lang("fi", PublicationStatus::Modified, true),
                lang("sv", PublicationStatus::Draft, false),
            ],
        );
        let root_before = s.root_id;
        let version_before = s.version_id;

        let plan = plan_publish(&s, &[LanguageCode::new("fi")]).unwrap();
        apply_plan(&mut s, &plan);

        assert_eq!(s.root_id, root_before);
        assert_eq!(s.version_id, version_before);
        assert_eq!(
            s.language(&LanguageCode::new("fi")).unwrap().status,
            PublicationStatus::Published
        );
        assert_eq!(
            s.language(&LanguageCode::new("sv")).unwrap().status,
            PublicationStatus::Draft
        );
    }

    // -- restore --------------------------------------------------------------

    #[test]
    fn restore_to_draft_when_nothing_left_draft() {
        let langs = vec![lang("fi", PublicationStatus::Draft, false)];
        assert_eq!(restore_status(&langs), PublicationStatus::Draft);
    }

    #[test]
    fn restore_to_modified_after_any_progress() {
        let langs = vec![
            lang("fi", PublicationStatus::OldPublished, true),
            lang("sv", PublicationStatus::Draft, false),
        ];
        assert_eq!(restore_status(&langs), PublicationStatus::Modified);
    }

    // -- archival stamping ----------------------------------------------------

    #[test]
    fn archival_stamp_is_independent_of_status() {
        let mut record = lang("fi", PublicationStatus::Published, true);
        let at = chrono::Utc::now();
        record.stamp_archived(at, "scheduler");
        assert_eq!(record.archived_at, Some(at));
        assert_eq!(record.archived_by.as_deref(), Some("scheduler"));
        // Stamping does not move the status.
        assert_eq!(record.status, PublicationStatus::Published);
    }
}
