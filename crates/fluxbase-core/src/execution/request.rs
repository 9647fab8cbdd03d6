use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ExecutionErrorKind, FluxbaseError, Result};

/// Function = request-scoped unit returning a value.
/// Job = background unit carrying retry metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionKind {
    Function,
    Job,
}

/// One invocation of a user function or job, bounded by timeout and memory
/// cap. Built by the caller, consumed once by [`crate::execution::
/// ExecutionResult`]-producing code, and discarded after the result is
/// returned (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRequest {
    pub id: Uuid,
    pub kind: ExecutionKind,
    pub name: String,
    pub namespace: String,

    pub user_id: Option<String>,
    pub user_email: Option<String>,
    pub user_role: Option<String>,

    pub payload: serde_json::Value,

    /// Informational only; jobs carry a retry count, functions never set it.
    pub retry_count: Option<u32>,

    pub timeout: Duration,
    pub memory_limit_mb: u32,

    /// Uppercase name -> plaintext value, delivered to the child verbatim.
    pub secrets: HashMap<String, String>,
}

impl ExecutionRequest {
    pub fn builder(kind: ExecutionKind, name: impl Into<String>) -> ExecutionRequestBuilder {
        ExecutionRequestBuilder::new(kind, name)
    }

    /// Validate shape per spec §4.E step 1. Called by the engine before
    /// any token is minted or process spawned.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(FluxbaseError::Validation(
                "execution name must not be empty".into(),
            ));
        }
        if self.timeout.is_zero() {
            return Err(FluxbaseError::Validation(
                "timeout must be positive".into(),
            ));
        }
        if self.memory_limit_mb == 0 {
            return Err(FluxbaseError::Validation(
                "memory_limit_mb must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Convenience: map a validation failure into the engine's structured
    /// `invalid_request` error kind.
    pub fn validate_as_execution_error(&self) -> std::result::Result<(), ExecutionErrorKind> {
        self.validate().map_err(|_| ExecutionErrorKind::InvalidRequest)
    }

    pub fn is_anonymous(&self) -> bool {
        self.user_id.as_deref().unwrap_or("").is_empty()
    }
}

/// Builder for [`ExecutionRequest`], defaulting `id` to a fresh uuid and
/// `namespace` to `"default"`.
pub struct ExecutionRequestBuilder {
    id: Uuid,
    kind: ExecutionKind,
    name: String,
    namespace: String,
    user_id: Option<String>,
    user_email: Option<String>,
    user_role: Option<String>,
    payload: serde_json::Value,
    retry_count: Option<u32>,
    timeout: Duration,
    memory_limit_mb: u32,
    secrets: HashMap<String, String>,
}

impl ExecutionRequestBuilder {
    pub fn new(kind: ExecutionKind, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            name: name.into(),
            namespace: "default".to_string(),
            user_id: None,
            user_email: None,
            user_role: None,
            payload: serde_json::Value::Null,
            retry_count: None,
            timeout: Duration::from_secs(30),
            memory_limit_mb: 128,
            secrets: HashMap::new(),
        }
    }

    pub fn id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn user(
        mut self,
        user_id: impl Into<String>,
        email: Option<String>,
        role: Option<String>,
    ) -> Self {
        self.user_id = Some(user_id.into());
        self.user_email = email;
        self.user_role = role;
        self
    }

    pub fn payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }

    pub fn retry_count(mut self, count: u32) -> Self {
        self.retry_count = Some(count);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn memory_limit_mb(mut self, mb: u32) -> Self {
        self.memory_limit_mb = mb;
        self
    }

    pub fn secret(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.secrets.insert(name.into().to_uppercase(), value.into());
        self
    }

    pub fn secrets(mut self, secrets: HashMap<String, String>) -> Self {
        self.secrets = secrets
            .into_iter()
            .map(|(k, v)| (k.to_uppercase(), v))
            .collect();
        self
    }

    pub fn build(self) -> ExecutionRequest {
        ExecutionRequest {
            id: self.id,
            kind: self.kind,
            name: self.name,
            namespace: self.namespace,
            user_id: self.user_id,
            user_email: self.user_email,
            user_role: self.user_role,
            payload: self.payload,
            retry_count: self.retry_count,
            timeout: self.timeout,
            memory_limit_mb: self.memory_limit_mb,
            secrets: self.secrets,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_name() {
        let req = ExecutionRequest::builder(ExecutionKind::Function, "  ").build();
        assert!(req.validate().is_err());
    }

    #[test]
    fn rejects_zero_timeout() {
        let req = ExecutionRequest::builder(ExecutionKind::Function, "echo")
            .timeout(Duration::from_secs(0))
            .build();
        assert!(req.validate().is_err());
    }

    #[test]
    fn rejects_zero_memory() {
        let req = ExecutionRequest::builder(ExecutionKind::Function, "echo")
            .memory_limit_mb(0)
            .build();
        assert!(req.validate().is_err());
    }

    #[test]
    fn secrets_are_uppercased() {
        let req = ExecutionRequest::builder(ExecutionKind::Function, "echo")
            .secret("api_key", "abc")
            .build();
        assert_eq!(req.secrets.get("API_KEY"), Some(&"abc".to_string()));
    }

    #[test]
    fn anonymous_without_user_id() {
        let req = ExecutionRequest::builder(ExecutionKind::Job, "cleanup").build();
        assert!(req.is_anonymous());
    }
}
