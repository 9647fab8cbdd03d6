use std::time::Instant;

use fluxbase_core::{
    FluxbaseError, LogAction, LogStatus, Migration, MigrationStatus, NewExecutionLog, Result,
};
use sqlx::PgPool;

use super::store::MigrationStore;

/// Outcome of applying every pending migration in a namespace (spec §4.F
/// "apply_pending" — stops at the first failure rather than continuing
/// past a broken migration).
#[derive(Debug, Clone, Default)]
pub struct ApplyPendingOutcome {
    pub applied: Vec<String>,
    pub failed: Vec<String>,
    pub error: Option<String>,
}

/// Applies and rolls back migrations, wrapping each `up_sql`/`down_sql`
/// execution in its own transaction so a broken migration leaves the
/// schema exactly as it was before the attempt.
pub struct MigrationExecutor {
    pool: PgPool,
    store: MigrationStore,
}

impl MigrationExecutor {
    pub fn new(pool: PgPool, store: MigrationStore) -> Self {
        Self { pool, store }
    }

    /// No-op if already applied. Otherwise runs `up_sql` in a
    /// transaction; commit records a `success` log and flips status to
    /// `applied`, any error rolls the transaction back and records a
    /// `failed` log without changing status away from `pending`.
    pub async fn apply(&self, namespace: &str, name: &str, applied_by: Option<&str>) -> Result<Migration> {
        let migration = self.store.get(namespace, name).await?;
        if migration.status == MigrationStatus::Applied {
            return Ok(migration);
        }

        let start = Instant::now();
        let mut tx = self.pool.begin().await?;

        match sqlx::query(&migration.up_sql).execute(&mut *tx).await {
            Ok(_) => {
                tx.commit().await?;
                let elapsed_ms = start.elapsed().as_millis() as i64;

                self.store
                    .set_status(migration.id, MigrationStatus::Applied, applied_by)
                    .await?;
                self.store
                    .append_log(NewExecutionLog {
                        migration_id: migration.id,
                        action: LogAction::Apply,
                        status: LogStatus::Success,
                        duration_ms: Some(elapsed_ms),
                        error_message: None,
                        logs: None,
                        executed_by: applied_by.map(str::to_string),
                    })
                    .await?;

                self.store.get(namespace, name).await
            }
            Err(e) => {
                let _ = tx.rollback().await;
                let elapsed_ms = start.elapsed().as_millis() as i64;

                self.store
                    .set_status(migration.id, MigrationStatus::Failed, applied_by)
                    .await?;
                self.store
                    .append_log(NewExecutionLog {
                        migration_id: migration.id,
                        action: LogAction::Apply,
                        status: LogStatus::Failed,
                        duration_ms: Some(elapsed_ms),
                        error_message: Some(e.to_string()),
                        logs: None,
                        executed_by: applied_by.map(str::to_string),
                    })
                    .await?;

                Err(FluxbaseError::Database(format!(
                    "failed to apply migration {namespace}/{name}: {e}"
                )))
            }
        }
    }

    /// Requires non-empty `down_sql`; otherwise fails fast with
    /// `no_rollback_sql` rather than attempting a no-op rollback.
    pub async fn rollback(&self, namespace: &str, name: &str, rolled_back_by: Option<&str>) -> Result<Migration> {
        let migration = self.store.get(namespace, name).await?;
        let down_sql = migration.down_sql.clone().ok_or_else(|| FluxbaseError::NoRollbackSql {
            namespace: namespace.to_string(),
            name: name.to_string(),
        })?;

        let start = Instant::now();
        let mut tx = self.pool.begin().await?;

        match sqlx::query(&down_sql).execute(&mut *tx).await {
            Ok(_) => {
                tx.commit().await?;
                let elapsed_ms = start.elapsed().as_millis() as i64;

                self.store
                    .set_status(migration.id, MigrationStatus::RolledBack, rolled_back_by)
                    .await?;
                self.store
                    .append_log(NewExecutionLog {
                        migration_id: migration.id,
                        action: LogAction::Rollback,
                        status: LogStatus::Success,
                        duration_ms: Some(elapsed_ms),
                        error_message: None,
                        logs: None,
                        executed_by: rolled_back_by.map(str::to_string),
                    })
                    .await?;

                self.store.get(namespace, name).await
            }
            Err(e) => {
                let _ = tx.rollback().await;
                let elapsed_ms = start.elapsed().as_millis() as i64;

                self.store
                    .append_log(NewExecutionLog {
                        migration_id: migration.id,
                        action: LogAction::Rollback,
                        status: LogStatus::Failed,
                        duration_ms: Some(elapsed_ms),
                        error_message: Some(e.to_string()),
                        logs: None,
                        executed_by: rolled_back_by.map(str::to_string),
                    })
                    .await?;

                Err(FluxbaseError::Database(format!(
                    "failed to roll back migration {namespace}/{name}: {e}"
                )))
            }
        }
    }

    /// Loads `pending`/`failed` rows name-ascending and applies them one
    /// at a time, stopping at the first failure (spec §4.F).
    pub async fn apply_pending(&self, namespace: &str, applied_by: Option<&str>) -> Result<ApplyPendingOutcome> {
        let mut outcome = ApplyPendingOutcome::default();

        let mut pending = self.store.list(namespace, Some(MigrationStatus::Pending)).await?;
        let failed = self.store.list(namespace, Some(MigrationStatus::Failed)).await?;
        pending.extend(failed);
        pending.sort_by(|a, b| a.name.cmp(&b.name));

        for migration in pending {
            match self.apply(namespace, &migration.name, applied_by).await {
                Ok(_) => outcome.applied.push(migration.name),
                Err(e) => {
                    outcome.failed.push(migration.name);
                    outcome.error = Some(e.to_string());
                    break;
                }
            }
        }

        Ok(outcome)
    }

    /// Delegates to storage; rejects an already-applied migration.
    pub async fn delete_pending(&self, namespace: &str, name: &str) -> Result<()> {
        self.store.delete(namespace, name).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_pending_outcome_defaults_empty() {
        let outcome = ApplyPendingOutcome::default();
        assert!(outcome.applied.is_empty());
        assert!(outcome.failed.is_empty());
        assert!(outcome.error.is_none());
    }
}
