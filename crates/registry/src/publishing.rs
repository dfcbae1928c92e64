//! Version lifecycle operations.
//!
//! Each operation opens one writer scope, plans against the core status
//! machine, applies the plan through the repositories, and saves. A lost
//! race on a guarded status move surfaces as a concurrency error; the
//! scope's rollback-on-drop guarantees no partial outcome.

use sercat_core::error::CoreError;
use sercat_core::language::LanguageCode;
use sercat_core::publication::{
    plan_publish, plan_supersede, restore_status, LanguageAvailability, PublicationStatus,
    VersionState,
};
use sercat_core::types::{ContentKind, OrganizationId, RootId, VersionId};
use sercat_db::models::content_version::{ContentVersion, CreateContentVersion, UpdateContentVersion};
use sercat_db::models::content_root::CreateContentRoot;
use sercat_db::models::language_availability::UpsertLanguageAvailability;
use sercat_db::repositories::{LanguageAvailabilityRepo, RootRepo, VersionRepo};
use sercat_db::{Actor, Database, SaveMode, StoreError};
use sqlx::PgConnection;

/// Caller-driven version lifecycle over the unit-of-work boundary.
#[derive(Clone)]
pub struct PublicationService {
    db: Database,
}

impl PublicationService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    // ── Creation ─────────────────────────────────────────────────────

    /// Register a new root identity with its first draft version.
    pub async fn create_draft(
        &self,
        actor: Actor,
        kind: ContentKind,
        payload: serde_json::Value,
        languages: &[LanguageCode],
    ) -> Result<ContentVersion, StoreError> {
        self.db
            .execute_writer(Some(actor), |mut w| async move {
                let user = w.audit_user().map(str::to_string);
                let root = RootRepo::create(
                    w.conn(),
                    &CreateContentRoot {
                        kind: kind.as_str().to_string(),
                    },
                )
                .await?;
                let version = VersionRepo::create(
                    w.conn(),
                    &CreateContentVersion {
                        root_id: root.id,
                        template_root_id: None,
                        template_organization_id: None,
                        payload,
                    },
                    user.as_deref(),
                )
                .await?;
                for language in languages {
                    LanguageAvailabilityRepo::upsert(
                        w.conn(),
                        &UpsertLanguageAvailability {
                            version_id: version.id,
                            language: language.as_str().to_string(),
                            status: PublicationStatus::Draft.as_str().to_string(),
                            can_be_published: false,
                        },
                    )
                    .await?;
                }
                tracing::info!(root_id = %root.id, version_id = %version.id, "created draft");
                w.save(SaveMode::Standard).await?;
                Ok(version)
            })
            .await
    }

    /// Copy a version as a template under a new root owned by the given
    /// organization. The organization is mandatory.
    pub async fn copy_as_template(
        &self,
        actor: Actor,
        source_version_id: VersionId,
        organization_id: Option<OrganizationId>,
    ) -> Result<ContentVersion, StoreError> {
        let organization_id =
            organization_id.ok_or_else(|| StoreError::validation("copy.missing-organization"))?;
        self.db
            .execute_writer(Some(actor), |mut w| async move {
                let user = w.audit_user().map(str::to_string);
                let source = VersionRepo::find_by_id(w.conn(), source_version_id)
                    .await?
                    .ok_or(CoreError::NotFound {
                        entity: "content_version",
                        id: source_version_id,
                    })?;
                let source_root = RootRepo::find_by_id(w.conn(), source.root_id)
                    .await?
                    .ok_or(CoreError::NotFound {
                        entity: "content_root",
                        id: source.root_id,
                    })?;

                let root = RootRepo::create(
                    w.conn(),
                    &CreateContentRoot {
                        kind: source_root.kind.clone(),
                    },
                )
                .await?;
                let version = VersionRepo::create(
                    w.conn(),
                    &CreateContentVersion {
                        root_id: root.id,
                        template_root_id: Some(source.root_id),
                        template_organization_id: Some(organization_id),
                        payload: source.payload.clone(),
                    },
                    user.as_deref(),
                )
                .await?;
                // The copy starts over: every language is a fresh draft.
                let source_languages =
                    LanguageAvailabilityRepo::list_by_version(w.conn(), source.id).await?;
                for row in &source_languages {
                    LanguageAvailabilityRepo::upsert(
                        w.conn(),
                        &UpsertLanguageAvailability {
                            version_id: version.id,
                            language: row.language.clone(),
                            status: PublicationStatus::Draft.as_str().to_string(),
                            can_be_published: false,
                        },
                    )
                    .await?;
                }
                tracing::info!(
                    source = %source.id, root_id = %root.id, version_id = %version.id,
                    "copied version as template"
                );
                w.save(SaveMode::Standard).await?;
                Ok(version)
            })
            .await
    }

    // ── Editing ──────────────────────────────────────────────────────

    /// Save content changes onto a root's working snapshot.
    ///
    /// A `draft` advances to `modified`; a `modified` snapshot is patched
    /// in place. When the target version is `published` its content is
    /// immutable: a successor snapshot is cloned (copy-on-write) and the
    /// changes land there.
    pub async fn save_draft(
        &self,
        actor: Actor,
        version_id: VersionId,
        payload: serde_json::Value,
    ) -> Result<ContentVersion, StoreError> {
        self.db
            .execute_writer(Some(actor), |mut w| async move {
                let user = w.audit_user().map(str::to_string);
                let version = VersionRepo::find_by_id(w.conn(), version_id)
                    .await?
                    .ok_or(CoreError::NotFound {
                        entity: "content_version",
                        id: version_id,
                    })?;
                let status = decode_status(&version)?;

                let target = match status {
                    PublicationStatus::Draft | PublicationStatus::Modified => version,
                    PublicationStatus::Published => {
                        let clone =
                            VersionRepo::clone_as_working(w.conn(), version.id, user.as_deref())
                                .await?
                                .ok_or_else(|| {
                                    StoreError::concurrency("published version vanished mid-edit")
                                })?;
                        LanguageAvailabilityRepo::copy_to_version(w.conn(), version.id, clone.id)
                            .await?;
                        // The clone's languages are pending re-publication.
                        let rows =
                            LanguageAvailabilityRepo::list_by_version(w.conn(), clone.id).await?;
                        for row in &rows {
                            LanguageAvailabilityRepo::set_status(
                                w.conn(),
                                clone.id,
                                &row.language,
                                PublicationStatus::Modified,
                            )
                            .await?;
                        }
                        clone
                    }
                    _ => return Err(StoreError::validation("save.version-not-editable")),
                };

                let updated = VersionRepo::update_content(
                    w.conn(),
                    target.id,
                    &UpdateContentVersion {
                        payload: Some(payload),
                    },
                    user.as_deref(),
                )
                .await?
                .ok_or_else(|| StoreError::concurrency("working version moved during save"))?;

                // First content change moves a fresh draft along.
                if decode_status(&updated)? == PublicationStatus::Draft {
                    let moved = VersionRepo::update_status_guarded(
                        w.conn(),
                        updated.id,
                        PublicationStatus::Draft,
                        PublicationStatus::Modified,
                        user.as_deref(),
                    )
                    .await?;
                    if !moved {
                        return Err(StoreError::concurrency("draft moved during save"));
                    }
                }

                let result = VersionRepo::find_by_id(w.conn(), updated.id)
                    .await?
                    .ok_or_else(|| StoreError::concurrency("version vanished during save"))?;
                w.save(SaveMode::Standard).await?;
                Ok(result)
            })
            .await
    }

    /// Record the externally computed readiness predicate for a language.
    pub async fn set_language_readiness(
        &self,
        actor: Actor,
        version_id: VersionId,
        language: &LanguageCode,
        can_be_published: bool,
    ) -> Result<(), StoreError> {
        self.db
            .execute_writer(Some(actor), |mut w| async move {
                let changed = LanguageAvailabilityRepo::set_can_be_published(
                    w.conn(),
                    version_id,
                    language.as_str(),
                    can_be_published,
                )
                .await?;
                if !changed {
                    return Err(StoreError::validation("readiness.unknown-language"));
                }
                w.save(SaveMode::Standard).await?;
                Ok(())
            })
            .await
    }

    // ── Publication ──────────────────────────────────────────────────

    /// Publish the requested languages of a version.
    ///
    /// The previously published version of the same root (if any) is
    /// demoted to `old_published` in the same transaction, with its
    /// demoted languages stamped as archived. A competing writer losing
    /// the race observes a concurrency error, never a silent overwrite.
    pub async fn publish(
        &self,
        actor: Actor,
        version_id: VersionId,
        languages: &[LanguageCode],
    ) -> Result<ContentVersion, StoreError> {
        self.db
            .execute_writer(Some(actor), |mut w| async move {
                let user = w.audit_user().map(str::to_string);
                let version = VersionRepo::find_by_id(w.conn(), version_id)
                    .await?
                    .ok_or(CoreError::NotFound {
                        entity: "content_version",
                        id: version_id,
                    })?;
                let state = load_state(w.conn(), &version).await?;
                let plan = plan_publish(&state, languages)?;

                if let Some(previous) = VersionRepo::find_published(w.conn(), version.root_id).await? {
                    if previous.id != version.id {
                        demote_previous(w.conn(), &previous, user.as_deref()).await?;
                    }
                }

                for change in &plan.language_changes {
                    LanguageAvailabilityRepo::set_status(
                        w.conn(),
                        version.id,
                        change.language.as_str(),
                        change.status,
                    )
                    .await?;
                }
                let moved = VersionRepo::update_status_guarded(
                    w.conn(),
                    version.id,
                    state.status,
                    plan.version_status,
                    user.as_deref(),
                )
                .await?;
                if !moved {
                    return Err(StoreError::concurrency(
                        "version status moved during publish",
                    ));
                }

                let result = VersionRepo::find_by_id(w.conn(), version.id)
                    .await?
                    .ok_or_else(|| StoreError::concurrency("version vanished during publish"))?;
                tracing::info!(version_id = %version.id, status = %result.status, "published");
                w.save(SaveMode::Standard).await?;
                Ok(result)
            })
            .await
    }

    // ── Archival, restore, removal ───────────────────────────────────

    /// Soft-delete a version. Publicly visible languages get their
    /// archival audit stamp; payload and language records are retained
    /// for restore.
    pub async fn archive(&self, actor: Actor, version_id: VersionId) -> Result<(), StoreError> {
        self.db
            .execute_writer(Some(actor), |mut w| async move {
                let user = w.audit_user().map(str::to_string);
                let version = VersionRepo::find_by_id(w.conn(), version_id)
                    .await?
                    .ok_or(CoreError::NotFound {
                        entity: "content_version",
                        id: version_id,
                    })?;
                let now = chrono::Utc::now();
                let rows = LanguageAvailabilityRepo::list_by_version(w.conn(), version.id).await?;
                for row in &rows {
                    if row.status == PublicationStatus::Published.as_str() {
                        LanguageAvailabilityRepo::stamp_archived(
                            w.conn(),
                            version.id,
                            &row.language,
                            now,
                            user.as_deref().unwrap_or("system"),
                        )
                        .await?;
                    }
                }
                let deleted =
                    VersionRepo::soft_delete(w.conn(), version.id, user.as_deref()).await?;
                if !deleted {
                    return Err(StoreError::concurrency("version moved during archive"));
                }
                tracing::info!(version_id = %version.id, "archived");
                w.save(SaveMode::Standard).await?;
                Ok(())
            })
            .await
    }

    /// Restore a soft-deleted version, reinstating the per-language
    /// statuses held at delete time.
    pub async fn restore(&self, actor: Actor, version_id: VersionId) -> Result<(), StoreError> {
        self.db
            .execute_writer(Some(actor), |mut w| async move {
                let user = w.audit_user().map(str::to_string);
                let version = VersionRepo::find_by_id_include_deleted(w.conn(), version_id)
                    .await?
                    .ok_or(CoreError::NotFound {
                        entity: "content_version",
                        id: version_id,
                    })?;
                if decode_status(&version)? != PublicationStatus::Deleted {
                    return Err(StoreError::validation("restore.not-deleted"));
                }
                let rows = LanguageAvailabilityRepo::list_by_version(w.conn(), version.id).await?;
                let languages = decode_languages(&rows)?;
                let restored = VersionRepo::restore(
                    w.conn(),
                    version.id,
                    restore_status(&languages),
                    user.as_deref(),
                )
                .await?;
                if !restored {
                    return Err(StoreError::concurrency("version moved during restore"));
                }
                tracing::info!(version_id = %version.id, "restored");
                w.save(SaveMode::Standard).await?;
                Ok(())
            })
            .await
    }

    /// Permanently remove a version. Hard, terminal, irreversible; only
    /// permitted from the soft-deleted state.
    pub async fn remove(&self, actor: Actor, version_id: VersionId) -> Result<(), StoreError> {
        self.db
            .execute_writer(Some(actor), |mut w| async move {
                let user = w.audit_user().map(str::to_string);
                let version = VersionRepo::find_by_id_include_deleted(w.conn(), version_id)
                    .await?
                    .ok_or(CoreError::NotFound {
                        entity: "content_version",
                        id: version_id,
                    })?;
                if decode_status(&version)? != PublicationStatus::Deleted {
                    return Err(StoreError::validation("remove.not-deleted"));
                }
                let moved = VersionRepo::update_status_guarded(
                    w.conn(),
                    version.id,
                    PublicationStatus::Deleted,
                    PublicationStatus::Removed,
                    user.as_deref(),
                )
                .await?;
                if !moved {
                    return Err(StoreError::concurrency("version moved during removal"));
                }
                tracing::info!(version_id = %version.id, "removed");
                w.save(SaveMode::Standard).await?;
                Ok(())
            })
            .await
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// Load a version's state through a read-only scope.
    pub async fn version_state(&self, version_id: VersionId) -> Result<VersionState, StoreError> {
        self.db
            .execute_reader(|mut r| async move {
                let version = VersionRepo::find_by_id(r.conn(), version_id)
                    .await?
                    .ok_or(CoreError::NotFound {
                        entity: "content_version",
                        id: version_id,
                    })?;
                load_state(r.conn(), &version).await
            })
            .await
    }

    /// The root's working snapshot, via an isolated scope; used by
    /// scheduled checks that run outside any request context.
    pub async fn working_version_isolated(
        &self,
        root_id: RootId,
    ) -> Result<Option<ContentVersion>, StoreError> {
        self.db
            .execute_isolated_reader(|mut r| async move {
                Ok(VersionRepo::find_working(r.conn(), root_id).await?)
            })
            .await
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn decode_status(version: &ContentVersion) -> Result<PublicationStatus, StoreError> {
    version
        .publication_status()
        .map_err(|e| StoreError::Core(CoreError::Mapping(e)))
}

fn decode_languages(
    rows: &[sercat_db::models::language_availability::LanguageAvailabilityRow],
) -> Result<Vec<LanguageAvailability>, StoreError> {
    rows.iter()
        .map(|row| {
            row.to_availability()
                .map_err(|e| StoreError::Core(CoreError::Mapping(e)))
        })
        .collect()
}

/// Build the in-memory state the core planners consume.
async fn load_state(
    conn: &mut PgConnection,
    version: &ContentVersion,
) -> Result<VersionState, StoreError> {
    let rows = LanguageAvailabilityRepo::list_by_version(conn, version.id).await?;
    Ok(VersionState {
        version_id: version.id,
        root_id: version.root_id,
        status: decode_status(version)?,
        languages: decode_languages(&rows)?,
    })
}

/// Demote the previously published version and stamp its demoted
/// languages as archived, inside the caller's transaction.
async fn demote_previous(
    conn: &mut PgConnection,
    previous: &ContentVersion,
    user: Option<&str>,
) -> Result<(), StoreError> {
    let state = load_state(conn, previous).await?;
    let plan = plan_supersede(&state)?;
    let now = chrono::Utc::now();
    for change in &plan.language_changes {
        LanguageAvailabilityRepo::set_status(
            conn,
            previous.id,
            change.language.as_str(),
            change.status,
        )
        .await?;
        LanguageAvailabilityRepo::stamp_archived(
            conn,
            previous.id,
            change.language.as_str(),
            now,
            user.unwrap_or("system"),
        )
        .await?;
    }
    let moved = VersionRepo::update_status_guarded(
        conn,
        previous.id,
        state.status,
        plan.version_status,
        user,
    )
    .await?;
    if !moved {
        return Err(StoreError::concurrency(
            "previously published version moved during publish",
        ));
    }
    Ok(())
}
