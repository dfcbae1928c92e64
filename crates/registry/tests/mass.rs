#![cfg(feature = "integration-tests")]

//! Integration tests for batch publish/archive execution.

use std::sync::Arc;

use sercat_core::batch::{MassOperationRequest, MAX_BATCH_ENTITIES};
use sercat_core::language::LanguageCode;
use sercat_core::types::ContentKind;
use sercat_db::{Actor, Database, StoreError};
use sercat_events::{JobPhase, ProgressBus};
use sercat_registry::{MassOperationService, PublicationService};
use sqlx::PgPool;
use uuid::Uuid;

fn actor() -> Actor {
    Actor::new("operator")
}

async fn ready_service_root(svc: &PublicationService) -> sercat_core::types::RootId {
    let fi = LanguageCode::new("fi");
    let version = svc
        .create_draft(
            actor(),
            ContentKind::Service,
            serde_json::json!({}),
            std::slice::from_ref(&fi),
        )
        .await
        .unwrap();
    svc.set_language_readiness(actor(), version.id, &fi, true)
        .await
        .unwrap();
    version.root_id
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn batch_publish_reports_aggregate_outcome(pool: PgPool) {
    let db = Database::new(pool);
    let publishing = PublicationService::new(db.clone());
    let bus = Arc::new(ProgressBus::default());
    let mut rx = bus.subscribe();

    let ok_root = ready_service_root(&publishing).await;
    let missing_root = Uuid::new_v4();

    let mass = MassOperationService::new(db, bus);
    let report = mass
        .run_publish(
            actor(),
            &MassOperationRequest {
                services: vec![ok_root, missing_root],
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(report.succeeded, vec![ok_root]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].root_id, missing_root);
    assert!(!report.is_complete_success());

    // Progress events bracket the run.
    let started = rx.recv().await.unwrap();
    assert_eq!(started.phase, JobPhase::Started);
    assert_eq!(started.job_id, report.job_id);
    let finished = rx.recv().await.unwrap();
    assert_eq!(finished.phase, JobPhase::Finished);

    // The successful target really got published.
    let published = publishing
        .working_version_isolated(ok_root)
        .await
        .unwrap();
    assert!(published.is_none(), "no working snapshot remains");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn oversized_batch_is_refused_before_any_write(pool: PgPool) {
    let db = Database::new(pool.clone());
    let publishing = PublicationService::new(db.clone());
    let ok_root = ready_service_root(&publishing).await;

    let mut services = vec![ok_root];
    services.extend((0..MAX_BATCH_ENTITIES).map(|_| Uuid::new_v4()));

    let mass = MassOperationService::new(db, Arc::new(ProgressBus::default()));
    let result = mass
        .run_publish(
            actor(),
            &MassOperationRequest {
                services,
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(
        result,
        Err(StoreError::Core(sercat_core::CoreError::CountLimit(_)))
    ));

    // Pre-flight refusal: the valid target was not touched.
    let state_root = publishing.working_version_isolated(ok_root).await.unwrap();
    let working = state_root.expect("working snapshot untouched");
    assert_eq!(working.status, "draft");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn scheduled_publish_is_refused_until_due(pool: PgPool) {
    let db = Database::new(pool);
    let mass = MassOperationService::new(db, Arc::new(ProgressBus::default()));

    let result = mass
        .run_publish(
            actor(),
            &MassOperationRequest {
                services: vec![Uuid::new_v4()],
                publish_at: Some(chrono::Utc::now() + chrono::Duration::hours(2)),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(
        result,
        Err(StoreError::Validation { ref key }) if key == "mass.publish.not-due"
    ));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn batch_archive_soft_deletes_targets(pool: PgPool) {
    let db = Database::new(pool);
    let publishing = PublicationService::new(db.clone());
    let root = ready_service_root(&publishing).await;

    let mass = MassOperationService::new(db, Arc::new(ProgressBus::default()));
    let report = mass
        .run_archive(
            actor(),
            &MassOperationRequest {
                services: vec![root],
                archive_at: Some(chrono::Utc::now() - chrono::Duration::minutes(1)),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert!(report.is_complete_success());
    let working = publishing.working_version_isolated(root).await.unwrap();
    assert!(working.is_none(), "archived snapshot is hidden");
}
