use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which direction an execution-log row records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogAction {
    Apply,
    Rollback,
}

impl LogAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Apply => "apply",
            Self::Rollback => "rollback",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "apply" => Some(Self::Apply),
            "rollback" => Some(Self::Rollback),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogStatus {
    Success,
    Failed,
}

impl LogStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "success" => Some(Self::Success),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// An append-only execution-log row, cascade-deleted with its migration
/// (spec §3 "Execution Log").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionLog {
    pub id: Uuid,
    pub migration_id: Uuid,
    pub action: LogAction,
    pub status: LogStatus,
    pub duration_ms: Option<i64>,
    pub error_message: Option<String>,
    pub logs: Option<String>,
    pub executed_at: DateTime<Utc>,
    pub executed_by: Option<String>,
}

/// Fields required to append a log row; `id`/`executed_at` default when
/// left unset.
#[derive(Debug, Clone)]
pub struct NewExecutionLog {
    pub migration_id: Uuid,
    pub action: LogAction,
    pub status: LogStatus,
    pub duration_ms: Option<i64>,
    pub error_message: Option<String>,
    pub logs: Option<String>,
    pub executed_by: Option<String>,
}
