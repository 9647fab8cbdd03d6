use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Core error type for Fluxbase operations.
#[derive(Error, Debug)]
pub enum FluxbaseError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Cluster error: {0}")]
    Cluster(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQL error: {0}")]
    Sql(#[from] sqlx::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Migration '{namespace}/{name}' already applied")]
    AlreadyApplied { namespace: String, name: String },

    #[error("Migration '{namespace}/{name}' has no rollback SQL")]
    NoRollbackSql { namespace: String, name: String },

    #[error("Migration '{namespace}/{name}' already exists")]
    UniqueViolation { namespace: String, name: String },

    #[error("Invalid status transition to '{0}'")]
    InvalidStatusTransition(String),

    #[error("Could not acquire lock '{0}'")]
    LockUnavailable(String),

    #[error("Rate limit exceeded: retry after {retry_after:?}")]
    RateLimitExceeded {
        retry_after: Duration,
        limit: u32,
        remaining: u32,
    },
}

impl From<serde_json::Error> for FluxbaseError {
    fn from(e: serde_json::Error) -> Self {
        FluxbaseError::Serialization(e.to_string())
    }
}

/// Result type alias using FluxbaseError.
pub type Result<T> = std::result::Result<T, FluxbaseError>;

/// The exhaustive set of execution-outcome error kinds (spec §7).
///
/// Unlike [`FluxbaseError`], this never propagates as a Rust `Err` out of
/// the execution engine — it is carried inline in [`crate::execution::
/// ExecutionResult`], which the engine always returns successfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionErrorKind {
    /// Validation failure at the engine entrypoint.
    InvalidRequest,
    /// Required secret/env missing (e.g. empty signing key).
    Config,
    /// Child process could not be started.
    Spawn,
    /// Deadline fired before a result marker was observed.
    Timeout,
    /// Child was killed by the OS memory cap.
    Oom,
    /// Child exited non-zero with no result marker.
    RuntimeFailure,
    /// Child emitted `{success:false, ...}`.
    User,
    /// Admission gate or per-key limiter refused.
    Busy,
}

/// A structured execution failure, carried inline in [`ExecutionResult`](crate::execution::ExecutionResult).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionError {
    pub kind: ExecutionErrorKind,
    pub message: String,
    pub details: Option<String>,
}

impl ExecutionError {
    pub fn new(kind: ExecutionErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn execution_error_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ExecutionErrorKind::RuntimeFailure).unwrap();
        assert_eq!(json, "\"runtime_failure\"");
    }

    #[test]
    fn execution_error_carries_optional_details() {
        let err = ExecutionError::new(ExecutionErrorKind::User, "boom");
        assert!(err.details.is_none());
        let err = err.with_details("at line 3");
        assert_eq!(err.details.as_deref(), Some("at line 3"));
    }
}
