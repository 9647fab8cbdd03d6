use std::sync::Arc;
use std::time::Duration;

use fluxbase_core::cluster::{LockRole, NodeId};
use fluxbase_core::{FluxbaseError, Result};
use sqlx::PgPool;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// How often the background loop re-polls the advisory lock once it has
/// failed to acquire leadership.
#[derive(Debug, Clone)]
pub struct ElectorConfig {
    pub poll_interval: Duration,
}

impl Default for ElectorConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
        }
    }
}

impl ElectorConfig {
    pub fn from_heartbeat_interval(secs: u64) -> Self {
        Self {
            poll_interval: Duration::from_secs(secs),
        }
    }
}

/// Holds a `pg_try_advisory_lock` for a single [`LockRole`] and exposes
/// current leadership to callers. Leadership is linearized behind a
/// mutex rather than an atomic so a reader never observes a stale
/// "leader" value the instant after the background loop has released
/// the lock (spec §4.H).
pub struct Elector {
    pool: PgPool,
    node_id: NodeId,
    role: LockRole,
    config: ElectorConfig,
    is_leader: Arc<Mutex<bool>>,
    cancel: CancellationToken,
}

/// Construct a new, not-yet-started elector for `role`.
pub fn new_elector(pool: PgPool, role: LockRole, config: ElectorConfig) -> Elector {
    Elector {
        pool,
        node_id: NodeId::new(),
        role,
        config,
        is_leader: Arc::new(Mutex::new(false)),
        cancel: CancellationToken::new(),
    }
}

impl Elector {
    pub fn node_id(&self) -> NodeId {
        self.node_id
    }

    pub async fn is_leader(&self) -> bool {
        *self.is_leader.lock().await
    }

    /// Signal the background loop to release the lock and exit. Does not
    /// block on completion — await the `JoinHandle` returned by
    /// [`Elector::start`] for that.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Spawn the background election loop: attempts `pg_try_advisory_lock`
    /// once per `poll_interval` until it succeeds, then holds the lock
    /// until cancelled, releasing it on the way out.
    pub fn start(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = tokio::time::sleep(self.config.poll_interval) => {
                        if !self.is_leader().await {
                            match self.try_acquire().await {
                                Ok(true) => {
                                    tracing::info!(role = %self.role, node_id = %self.node_id, "acquired leadership");
                                }
                                Ok(false) => {}
                                Err(e) => {
                                    tracing::warn!(role = %self.role, "failed to attempt lock acquisition: {e}");
                                }
                            }
                        }
                    }
                    _ = self.cancel.cancelled() => {
                        if self.is_leader().await {
                            if let Err(e) = self.release().await {
                                tracing::warn!(role = %self.role, "failed to release lock on shutdown: {e}");
                            }
                        }
                        tracing::info!(role = %self.role, "elector loop stopped");
                        break;
                    }
                }
            }
        })
    }

    async fn try_acquire(&self) -> Result<bool> {
        let acquired: (bool,) = sqlx::query_as("SELECT pg_try_advisory_lock($1)")
            .bind(self.role.lock_id())
            .fetch_one(&self.pool)
            .await
            .map_err(FluxbaseError::Sql)?;

        if acquired.0 {
            *self.is_leader.lock().await = true;
        }

        Ok(acquired.0)
    }

    async fn release(&self) -> Result<()> {
        sqlx::query("SELECT pg_advisory_unlock($1)")
            .bind(self.role.lock_id())
            .execute(&self.pool)
            .await
            .map_err(FluxbaseError::Sql)?;

        *self.is_leader.lock().await = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elector_config_from_heartbeat_interval() {
        let config = ElectorConfig::from_heartbeat_interval(10);
        assert_eq!(config.poll_interval, Duration::from_secs(10));
    }

    #[test]
    fn default_poll_interval_is_five_seconds() {
        assert_eq!(ElectorConfig::default().poll_interval, Duration::from_secs(5));
    }
}
