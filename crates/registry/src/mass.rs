//! Batch publish/archive execution.
//!
//! The whole batch is validated before any write occurs: aggregate entity
//! count, then per-entity language-version counts through an isolated
//! reader (the scheduler path runs outside any request context). Each
//! content kind is then processed independently, each target in its own
//! writer scope, and the aggregate outcome is reported. Progress events
//! around the run are best-effort; losing one never affects the data.

use std::sync::Arc;

use sercat_core::batch::{
    validate_batch_size, validate_language_version_counts, MassOperationRequest,
};
use sercat_core::language::LanguageCode;
use sercat_core::types::{ContentKind, RootId};
use sercat_db::repositories::VersionRepo;
use sercat_db::{Actor, Database, StoreError};
use sercat_events::{JobPhase, ProgressBus, ProgressEvent};
use serde::Serialize;
use uuid::Uuid;
use validator::Validate;

use crate::publishing::PublicationService;

/// Aggregate outcome of one batch run.
#[derive(Debug, Clone, Serialize)]
pub struct MassOperationReport {
    pub job_id: Uuid,
    pub succeeded: Vec<RootId>,
    pub failed: Vec<FailedTarget>,
}

/// One target that could not be processed.
#[derive(Debug, Clone, Serialize)]
pub struct FailedTarget {
    pub kind: ContentKind,
    pub root_id: RootId,
    pub reason: String,
}

impl MassOperationReport {
    pub fn is_complete_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Executes mass publish and archive requests.
#[derive(Clone)]
pub struct MassOperationService {
    db: Database,
    publishing: PublicationService,
    bus: Arc<ProgressBus>,
}

impl MassOperationService {
    pub fn new(db: Database, bus: Arc<ProgressBus>) -> Self {
        let publishing = PublicationService::new(db.clone());
        Self {
            db,
            publishing,
            bus,
        }
    }

    /// Publish every target's working version in all its ready languages.
    ///
    /// Scheduled requests whose `publish_at` has not passed are refused
    /// up front; the scheduler re-submits them when due.
    pub async fn run_publish(
        &self,
        actor: Actor,
        request: &MassOperationRequest,
    ) -> Result<MassOperationReport, StoreError> {
        if !request.publish_due(chrono::Utc::now()) {
            return Err(StoreError::validation("mass.publish.not-due"));
        }
        self.preflight(request).await?;

        let job_id = Uuid::new_v4();
        self.bus.publish(ProgressEvent::new(
            job_id,
            JobPhase::Started,
            "mass.publish.started",
        ));

        let mut report = MassOperationReport {
            job_id,
            succeeded: Vec::new(),
            failed: Vec::new(),
        };
        for (kind, roots) in request.targets() {
            for root_id in roots {
                match self.publish_root(actor.clone(), *root_id).await {
                    Ok(()) => report.succeeded.push(*root_id),
                    Err(err) => report.failed.push(FailedTarget {
                        kind,
                        root_id: *root_id,
                        reason: err.to_string(),
                    }),
                }
            }
        }

        self.bus.publish(ProgressEvent::new(
            job_id,
            JobPhase::Finished,
            "mass.publish.finished",
        ));
        tracing::info!(
            %job_id,
            succeeded = report.succeeded.len(),
            failed = report.failed.len(),
            "mass publish finished"
        );
        Ok(report)
    }

    /// Archive every target's working or published version.
    pub async fn run_archive(
        &self,
        actor: Actor,
        request: &MassOperationRequest,
    ) -> Result<MassOperationReport, StoreError> {
        if !request.archive_due(chrono::Utc::now()) {
            return Err(StoreError::validation("mass.archive.not-due"));
        }
        self.preflight(request).await?;

        let job_id = Uuid::new_v4();
        self.bus.publish(ProgressEvent::new(
            job_id,
            JobPhase::Started,
            "mass.archive.started",
        ));

        let mut report = MassOperationReport {
            job_id,
            succeeded: Vec::new(),
            failed: Vec::new(),
        };
        for (kind, roots) in request.targets() {
            for root_id in roots {
                match self.archive_root(actor.clone(), *root_id).await {
                    Ok(()) => report.succeeded.push(*root_id),
                    Err(err) => report.failed.push(FailedTarget {
                        kind,
                        root_id: *root_id,
                        reason: err.to_string(),
                    }),
                }
            }
        }

        self.bus.publish(ProgressEvent::new(
            job_id,
            JobPhase::Finished,
            "mass.archive.finished",
        ));
        tracing::info!(
            %job_id,
            succeeded = report.succeeded.len(),
            failed = report.failed.len(),
            "mass archive finished"
        );
        Ok(report)
    }

    /// Whole-batch validation, before any write: count limits first, then
    /// per-entity language-version counts read through an isolated scope.
    async fn preflight(&self, request: &MassOperationRequest) -> Result<(), StoreError> {
        validate_batch_size(request)?;
        request
            .validate()
            .map_err(|_| StoreError::validation("mass.invalid-request"))?;

        let targets: Vec<RootId> = request
            .targets()
            .iter()
            .flat_map(|(_, ids)| ids.iter().copied())
            .collect();
        let counts = self
            .db
            .execute_isolated_reader(|mut r| async move {
                let mut counts = Vec::with_capacity(targets.len());
                for root_id in targets {
                    let count = VersionRepo::count_language_versions(r.conn(), root_id).await?;
                    counts.push((root_id, count as usize));
                }
                Ok(counts)
            })
            .await?;
        validate_language_version_counts(&counts)?;
        Ok(())
    }

    /// Publish one root's working version in all its ready languages.
    async fn publish_root(&self, actor: Actor, root_id: RootId) -> Result<(), StoreError> {
        let working = self
            .publishing
            .working_version_isolated(root_id)
            .await?
            .ok_or_else(|| StoreError::validation("mass.publish.no-working-version"))?;
        let state = self.publishing.version_state(working.id).await?;
        let ready: Vec<LanguageCode> = state
            .languages
            .iter()
            .filter(|l| l.can_be_published)
            .map(|l| l.language.clone())
            .collect();
        self.publishing.publish(actor, working.id, &ready).await?;
        Ok(())
    }

    /// Archive one root's working version, falling back to its published
    /// version when no working snapshot exists.
    async fn archive_root(&self, actor: Actor, root_id: RootId) -> Result<(), StoreError> {
        let target = match self.publishing.working_version_isolated(root_id).await? {
            Some(version) => version,
            None => self
                .published_version(root_id)
                .await?
                .ok_or_else(|| StoreError::validation("mass.archive.no-version"))?,
        };
        self.publishing.archive(actor, target.id).await
    }

    async fn published_version(
        &self,
        root_id: RootId,
    ) -> Result<Option<sercat_db::models::content_version::ContentVersion>, StoreError> {
        self.db
            .execute_isolated_reader(|mut r| async move {
                Ok(VersionRepo::find_published(r.conn(), root_id).await?)
            })
            .await
    }
}
