//! Transaction-scoped unit of work.
//!
//! Every external request or background tick opens exactly one scope:
//! a [`Reader`] for queries, a [`Writer`] for mutations. Repositories
//! route all statements through the scope's connection, so everything a
//! writer does becomes visible atomically at [`Writer::save`], and a
//! writer dropped without saving (early return, `?`, panic) rolls back
//! with zero persisted side effects.
//!
//! Reader scopes run inside a `READ ONLY` transaction; a write attempted
//! through one is a programmer error surfaced by the database, not a
//! recoverable condition.

use std::future::Future;

use sqlx::{PgConnection, PgPool, Postgres, Transaction};

use crate::error::StoreError;

// ---------------------------------------------------------------------------
// Actor and save modes
// ---------------------------------------------------------------------------

/// The identity a writer scope stamps into audit columns.
#[derive(Debug, Clone)]
pub struct Actor {
    pub user_name: String,
}

impl Actor {
    pub fn new(user_name: impl Into<String>) -> Self {
        Self {
            user_name: user_name.into(),
        }
    }
}

/// How a writer's pending changes are flushed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveMode {
    /// Normal user-driven save; an acting identity is required.
    Standard,
    /// System/anonymous save used by import and migration paths.
    System,
    /// Data-migration save that bypasses audit stamping entirely.
    NonTrackedMigration,
}

// ---------------------------------------------------------------------------
// Scopes
// ---------------------------------------------------------------------------

/// A read-only scope over its own `READ ONLY` transaction.
pub struct Reader {
    tx: Transaction<'static, Postgres>,
    isolated: bool,
}

impl Reader {
    /// The scope's connection, for repository calls.
    pub fn conn(&mut self) -> &mut PgConnection {
        &mut self.tx
    }

    /// Whether this scope was opened without binding to the ambient
    /// caller identity/session (background and cross-request paths).
    pub fn is_isolated(&self) -> bool {
        self.isolated
    }
}

/// A read-write scope over its own transaction.
///
/// The scope must be consumed by [`Writer::save`] for its mutations to
/// persist; dropping it rolls the transaction back.
pub struct Writer {
    tx: Transaction<'static, Postgres>,
    actor: Option<Actor>,
}

impl Writer {
    /// The scope's connection, for repository calls.
    pub fn conn(&mut self) -> &mut PgConnection {
        &mut self.tx
    }

    /// Name stamped into `created_by`/`modified_by` columns, when an
    /// actor is bound.
    pub fn audit_user(&self) -> Option<&str> {
        self.actor.as_ref().map(|a| a.user_name.as_str())
    }

    /// Flush all pending changes as one atomic transaction.
    ///
    /// `Standard` saves require an acting identity; `System` and
    /// `NonTrackedMigration` do not. Constraint and concurrency
    /// violations propagate as typed errors, never swallowed.
    pub async fn save(self, mode: SaveMode) -> Result<(), StoreError> {
        if mode == SaveMode::Standard && self.actor.is_none() {
            return Err(StoreError::validation("save.missing-user"));
        }
        tracing::debug!(?mode, "committing writer scope");
        self.tx.commit().await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Database handle
// ---------------------------------------------------------------------------

/// Entry point for opening unit-of-work scopes over a shared pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Cheap connectivity probe, independent of any scope.
    pub async fn health_check(&self) -> Result<(), StoreError> {
        crate::health_check(&self.pool).await?;
        Ok(())
    }

    /// Run `f` inside a fresh read-only scope bound to the ambient
    /// caller context. The scope is disposed on all exit paths.
    pub async fn execute_reader<T, F, Fut>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(Reader) -> Fut,
        Fut: Future<Output = Result<T, StoreError>>,
    {
        self.open_reader(false, f).await
    }

    /// Run `f` inside a read-only scope that deliberately does not bind
    /// to any ambient identity/session, for scheduled checks and other
    /// cross-request code paths.
    pub async fn execute_isolated_reader<T, F, Fut>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(Reader) -> Fut,
        Fut: Future<Output = Result<T, StoreError>>,
    {
        self.open_reader(true, f).await
    }

    async fn open_reader<T, F, Fut>(&self, isolated: bool, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(Reader) -> Fut,
        Fut: Future<Output = Result<T, StoreError>>,
    {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION READ ONLY")
            .execute(&mut *tx)
            .await?;
        tracing::debug!(isolated, "opened reader scope");
        // The transaction is dropped (rolled back) when the scope ends,
        // whatever the exit path.
        f(Reader { tx, isolated }).await
    }

    /// Run `f` inside a fresh read-write scope. `f` must call
    /// [`Writer::save`] for its mutations to persist; any other exit
    /// path rolls back.
    pub async fn execute_writer<T, F, Fut>(
        &self,
        actor: Option<Actor>,
        f: F,
    ) -> Result<T, StoreError>
    where
        F: FnOnce(Writer) -> Fut,
        Fut: Future<Output = Result<T, StoreError>>,
    {
        let tx = self.pool.begin().await?;
        tracing::debug!(actor = ?actor.as_ref().map(|a| a.user_name.as_str()), "opened writer scope");
        f(Writer { tx, actor }).await
    }
}
