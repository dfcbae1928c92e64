#![cfg(feature = "integration-tests")]

//! Integration tests for the unit-of-work boundary.
//!
//! Exercises scope disposal against a real database to verify that:
//! - A writer that saves persists its mutations atomically
//! - A writer dropped without saving leaves zero persisted side effects
//! - A writer whose closure errors rolls back completely
//! - Standard saves require an acting identity
//! - Reader scopes reject writes at the database level

use sercat_db::models::content_root::CreateContentRoot;
use sercat_db::repositories::RootRepo;
use sercat_db::{Actor, Database, SaveMode, StoreError};
use sqlx::PgPool;

fn service_root() -> CreateContentRoot {
    CreateContentRoot {
        kind: "service".to_string(),
    }
}

async fn count_roots(pool: &PgPool) -> i64 {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM content_roots")
        .fetch_one(pool)
        .await
        .unwrap();
    row.0
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn health_check_succeeds(pool: PgPool) {
    sercat_db::health_check(&pool).await.unwrap();
    Database::new(pool).health_check().await.unwrap();
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn saved_writer_persists(pool: PgPool) {
    let db = Database::new(pool.clone());
    db.execute_writer(Some(Actor::new("editor")), |mut w| async move {
        RootRepo::create(w.conn(), &service_root()).await?;
        w.save(SaveMode::Standard).await?;
        Ok(())
    })
    .await
    .unwrap();

    assert_eq!(count_roots(&pool).await, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn writer_without_save_rolls_back(pool: PgPool) {
    let db = Database::new(pool.clone());
    db.execute_writer(Some(Actor::new("editor")), |mut w| async move {
        RootRepo::create(w.conn(), &service_root()).await?;
        // Scope dropped without save.
        Ok(())
    })
    .await
    .unwrap();

    assert_eq!(count_roots(&pool).await, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn failing_writer_leaves_no_side_effects(pool: PgPool) {
    let db = Database::new(pool.clone());
    let result: Result<(), StoreError> = db
        .execute_writer(Some(Actor::new("editor")), |mut w| async move {
            RootRepo::create(w.conn(), &service_root()).await?;
            RootRepo::create(w.conn(), &service_root()).await?;
            Err(StoreError::validation("test.forced-failure"))
        })
        .await;

    assert!(result.is_err());
    // A subsequent read in a new scope observes none of the staged rows.
    assert_eq!(count_roots(&pool).await, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn standard_save_requires_identity(pool: PgPool) {
    let db = Database::new(pool.clone());
    let result = db
        .execute_writer(None, |mut w| async move {
            RootRepo::create(w.conn(), &service_root()).await?;
            w.save(SaveMode::Standard).await?;
            Ok(())
        })
        .await;

    assert!(
        matches!(result, Err(StoreError::Validation { ref key }) if key == "save.missing-user")
    );
    assert_eq!(count_roots(&pool).await, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn system_save_needs_no_identity(pool: PgPool) {
    let db = Database::new(pool.clone());
    db.execute_writer(None, |mut w| async move {
        RootRepo::create(w.conn(), &service_root()).await?;
        w.save(SaveMode::System).await?;
        Ok(())
    })
    .await
    .unwrap();

    assert_eq!(count_roots(&pool).await, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn reader_scope_rejects_writes(pool: PgPool) {
    let db = Database::new(pool.clone());
    let result = db
        .execute_reader(|mut r| async move {
            // Programmer error: writing through a read-only scope.
            RootRepo::create(r.conn(), &service_root()).await?;
            Ok(())
        })
        .await;

    assert!(result.is_err());
    assert_eq!(count_roots(&pool).await, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn isolated_reader_carries_no_ambient_binding(pool: PgPool) {
    let db = Database::new(pool);
    let isolated = db
        .execute_isolated_reader(|r| async move { Ok(r.is_isolated()) })
        .await
        .unwrap();
    assert!(isolated);

    let bound = db
        .execute_reader(|r| async move { Ok(r.is_isolated()) })
        .await
        .unwrap();
    assert!(!bound);
}
