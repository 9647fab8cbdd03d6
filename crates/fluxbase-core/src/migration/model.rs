use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A migration's lifecycle state (spec §3).
///
/// `pending -> applied -> rolled_back` on the happy path, with `failed` as
/// a side branch that can itself return to `pending` via the edit path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationStatus {
    Pending,
    Applied,
    Failed,
    RolledBack,
}

impl MigrationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Applied => "applied",
            Self::Failed => "failed",
            Self::RolledBack => "rolled_back",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "applied" => Some(Self::Applied),
            "failed" => Some(Self::Failed),
            "rolled_back" => Some(Self::RolledBack),
            _ => None,
        }
    }
}

impl std::fmt::Display for MigrationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A persisted SQL change-set within a namespace (spec §3 "Migration").
///
/// `(namespace, name)` is unique. `status = applied` implies `applied_at`
/// is set; `status = rolled_back` implies `rolled_back_at` is set. An
/// applied migration can never be deleted or edited through the public
/// storage API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Migration {
    pub id: Uuid,
    pub namespace: String,
    pub name: String,
    pub description: Option<String>,
    pub up_sql: String,
    pub down_sql: Option<String>,
    pub version: i64,
    pub status: MigrationStatus,
    pub created_by: Option<String>,
    pub applied_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub applied_at: Option<DateTime<Utc>>,
    pub rolled_back_at: Option<DateTime<Utc>>,
}

/// Fields accepted by the storage layer's `update` operation — a strict
/// subset of [`Migration`] (spec §4.F: only `description`, `up_sql`,
/// `down_sql`, and a `status` reset to `pending` are editable).
#[derive(Debug, Clone, Default)]
pub struct MigrationEdit {
    pub description: Option<String>,
    pub up_sql: Option<String>,
    pub down_sql: Option<String>,
    pub reset_to_pending: bool,
}

/// Fields required to create a new migration; storage assigns `id`,
/// `version`, `status`, and timestamps.
#[derive(Debug, Clone)]
pub struct NewMigration {
    pub namespace: String,
    pub name: String,
    pub description: Option<String>,
    pub up_sql: String,
    pub down_sql: Option<String>,
    pub created_by: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_display_matches_wire_format() {
        assert_eq!(MigrationStatus::RolledBack.as_str(), "rolled_back");
        assert_eq!(format!("{}", MigrationStatus::Applied), "applied");
    }
}
