use chrono::Utc;
use fluxbase_core::{
    ExecutionLog, FluxbaseError, LogAction, LogStatus, Migration, MigrationEdit, MigrationStatus,
    NewExecutionLog, NewMigration, Result,
};
use sqlx::{PgPool, Row};
use uuid::Uuid;

/// Persists migration rows and their execution-log history (spec §4.F).
pub struct MigrationStore {
    pool: PgPool,
}

impl MigrationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn init(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS migrations (
                id UUID PRIMARY KEY,
                namespace TEXT NOT NULL,
                name TEXT NOT NULL,
                description TEXT,
                up_sql TEXT NOT NULL,
                down_sql TEXT,
                version BIGINT NOT NULL,
                status TEXT NOT NULL,
                created_by TEXT,
                applied_by TEXT,
                created_at TIMESTAMPTZ NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL,
                applied_at TIMESTAMPTZ,
                rolled_back_at TIMESTAMPTZ,
                UNIQUE (namespace, name)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS migration_execution_logs (
                id UUID PRIMARY KEY,
                migration_id UUID NOT NULL REFERENCES migrations(id) ON DELETE CASCADE,
                action TEXT NOT NULL,
                status TEXT NOT NULL,
                duration_ms BIGINT,
                error_message TEXT,
                logs TEXT,
                executed_at TIMESTAMPTZ NOT NULL,
                executed_by TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Assigns `id`, starts `version` at 1, sets `status=pending`.
    /// (namespace, name) collisions surface as `unique_violation`.
    pub async fn create(&self, new: NewMigration) -> Result<Migration> {
        let id = Uuid::new_v4();
        let now = Utc::now();

        let row = sqlx::query(
            r#"
            INSERT INTO migrations
                (id, namespace, name, description, up_sql, down_sql, version, status,
                 created_by, applied_by, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, 1, $7, $8, NULL, $9, $9)
            RETURNING id, namespace, name, description, up_sql, down_sql, version, status,
                      created_by, applied_by, created_at, updated_at, applied_at, rolled_back_at
            "#,
        )
        .bind(id)
        .bind(&new.namespace)
        .bind(&new.name)
        .bind(&new.description)
        .bind(&new.up_sql)
        .bind(&new.down_sql)
        .bind(MigrationStatus::Pending.as_str())
        .bind(&new.created_by)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                FluxbaseError::UniqueViolation {
                    namespace: new.namespace.clone(),
                    name: new.name.clone(),
                }
            } else {
                FluxbaseError::Sql(e)
            }
        })?;

        row_to_migration(row)
    }

    pub async fn get(&self, namespace: &str, name: &str) -> Result<Migration> {
        let row = sqlx::query(
            r#"
            SELECT id, namespace, name, description, up_sql, down_sql, version, status,
                   created_by, applied_by, created_at, updated_at, applied_at, rolled_back_at
            FROM migrations WHERE namespace = $1 AND name = $2
            "#,
        )
        .bind(namespace)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| FluxbaseError::NotFound(format!("migration {namespace}/{name}")))?;

        row_to_migration(row)
    }

    pub async fn list(&self, namespace: &str, status: Option<MigrationStatus>) -> Result<Vec<Migration>> {
        let rows = match status {
            Some(status) => {
                sqlx::query(
                    r#"
                    SELECT id, namespace, name, description, up_sql, down_sql, version, status,
                           created_by, applied_by, created_at, updated_at, applied_at, rolled_back_at
                    FROM migrations WHERE namespace = $1 AND status = $2 ORDER BY name ASC
                    "#,
                )
                .bind(namespace)
                .bind(status.as_str())
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(
                    r#"
                    SELECT id, namespace, name, description, up_sql, down_sql, version, status,
                           created_by, applied_by, created_at, updated_at, applied_at, rolled_back_at
                    FROM migrations WHERE namespace = $1 ORDER BY name ASC
                    "#,
                )
                .bind(namespace)
                .fetch_all(&self.pool)
                .await?
            }
        };

        rows.into_iter().map(row_to_migration).collect()
    }

    /// Only `description`/`up_sql`/`down_sql`/a reset to `pending` are
    /// editable; refuses a row with `status=applied` (spec §4.F).
    pub async fn update(&self, namespace: &str, name: &str, edit: MigrationEdit) -> Result<Migration> {
        let current = self.get(namespace, name).await?;
        if current.status == MigrationStatus::Applied {
            return Err(FluxbaseError::InvalidStatusTransition(
                "cannot edit an applied migration".to_string(),
            ));
        }

        let new_status = if edit.reset_to_pending {
            MigrationStatus::Pending
        } else {
            current.status
        };

        let row = sqlx::query(
            r#"
            UPDATE migrations
            SET description = COALESCE($3, description),
                up_sql = COALESCE($4, up_sql),
                down_sql = COALESCE($5, down_sql),
                status = $6,
                updated_at = $7
            WHERE namespace = $1 AND name = $2 AND status <> 'applied'
            RETURNING id, namespace, name, description, up_sql, down_sql, version, status,
                      created_by, applied_by, created_at, updated_at, applied_at, rolled_back_at
            "#,
        )
        .bind(namespace)
        .bind(name)
        .bind(&edit.description)
        .bind(&edit.up_sql)
        .bind(&edit.down_sql)
        .bind(new_status.as_str())
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| FluxbaseError::NotFound(format!("migration {namespace}/{name} (or already applied)")))?;

        row_to_migration(row)
    }

    /// Refuses if `status != pending`; cascades execution-log rows via
    /// the `ON DELETE CASCADE` foreign key.
    pub async fn delete(&self, namespace: &str, name: &str) -> Result<()> {
        let current = self.get(namespace, name).await?;
        if current.status != MigrationStatus::Pending {
            return Err(FluxbaseError::AlreadyApplied {
                namespace: namespace.to_string(),
                name: name.to_string(),
            });
        }

        sqlx::query("DELETE FROM migrations WHERE namespace = $1 AND name = $2")
            .bind(namespace)
            .bind(name)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Writes `applied_at`/`applied_by` on `applied`, `rolled_back_at` on
    /// `rolled_back`, nothing extra on `failed` (spec §4.F).
    pub async fn set_status(&self, id: Uuid, status: MigrationStatus, executed_by: Option<&str>) -> Result<()> {
        let now = Utc::now();

        match status {
            MigrationStatus::Applied => {
                sqlx::query(
                    "UPDATE migrations SET status = $2, applied_by = $3, applied_at = $4, updated_at = $4 WHERE id = $1",
                )
                .bind(id)
                .bind(status.as_str())
                .bind(executed_by)
                .bind(now)
                .execute(&self.pool)
                .await?;
            }
            MigrationStatus::RolledBack => {
                sqlx::query(
                    "UPDATE migrations SET status = $2, rolled_back_at = $3, updated_at = $3 WHERE id = $1",
                )
                .bind(id)
                .bind(status.as_str())
                .bind(now)
                .execute(&self.pool)
                .await?;
            }
            MigrationStatus::Pending | MigrationStatus::Failed => {
                sqlx::query("UPDATE migrations SET status = $2, updated_at = $3 WHERE id = $1")
                    .bind(id)
                    .bind(status.as_str())
                    .bind(now)
                    .execute(&self.pool)
                    .await?;
            }
        }

        Ok(())
    }

    pub async fn append_log(&self, log: NewExecutionLog) -> Result<ExecutionLog> {
        let id = Uuid::new_v4();
        let now = Utc::now();

        let row = sqlx::query(
            r#"
            INSERT INTO migration_execution_logs
                (id, migration_id, action, status, duration_ms, error_message, logs, executed_at, executed_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, migration_id, action, status, duration_ms, error_message, logs, executed_at, executed_by
            "#,
        )
        .bind(id)
        .bind(log.migration_id)
        .bind(log.action.as_str())
        .bind(log.status.as_str())
        .bind(log.duration_ms)
        .bind(&log.error_message)
        .bind(&log.logs)
        .bind(now)
        .bind(&log.executed_by)
        .fetch_one(&self.pool)
        .await?;

        row_to_log(row)
    }

    pub async fn get_logs(&self, migration_id: Uuid, limit: i64) -> Result<Vec<ExecutionLog>> {
        let rows = sqlx::query(
            r#"
            SELECT id, migration_id, action, status, duration_ms, error_message, logs, executed_at, executed_by
            FROM migration_execution_logs
            WHERE migration_id = $1
            ORDER BY executed_at DESC
            LIMIT $2
            "#,
        )
        .bind(migration_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_log).collect()
    }
}

fn is_unique_violation(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

fn row_to_migration(row: sqlx::postgres::PgRow) -> Result<Migration> {
    let status_str: String = row.get("status");
    let status = MigrationStatus::from_str(&status_str)
        .ok_or_else(|| FluxbaseError::InvalidStatusTransition(status_str.clone()))?;

    Ok(Migration {
        id: row.get("id"),
        namespace: row.get("namespace"),
        name: row.get("name"),
        description: row.get("description"),
        up_sql: row.get("up_sql"),
        down_sql: row.get("down_sql"),
        version: row.get("version"),
        status,
        created_by: row.get("created_by"),
        applied_by: row.get("applied_by"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        applied_at: row.get("applied_at"),
        rolled_back_at: row.get("rolled_back_at"),
    })
}

fn row_to_log(row: sqlx::postgres::PgRow) -> Result<ExecutionLog> {
    let action_str: String = row.get("action");
    let status_str: String = row.get("status");

    Ok(ExecutionLog {
        id: row.get("id"),
        migration_id: row.get("migration_id"),
        action: LogAction::from_str(&action_str)
            .ok_or_else(|| FluxbaseError::Internal(format!("unknown log action {action_str}")))?,
        status: LogStatus::from_str(&status_str)
            .ok_or_else(|| FluxbaseError::Internal(format!("unknown log status {status_str}")))?,
        duration_ms: row.get("duration_ms"),
        error_message: row.get("error_message"),
        logs: row.get("logs"),
        executed_at: row.get("executed_at"),
        executed_by: row.get("executed_by"),
    })
}
