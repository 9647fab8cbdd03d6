use std::collections::HashSet;

use fluxbase_core::{ExecutionKind, ExecutionRequest};
use once_cell::sync::Lazy;

/// Names that never reach a child process, regardless of the parent
/// environment or any allow-list (spec §9 "Global blocklist for env
/// filtering" — module-level constant, populated once, read-only for the
/// life of the process).
static BLOCKLIST: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "FLUXBASE_ENCRYPTION_KEY",
        "FLUXBASE_JWT_SECRET",
        "DATABASE_URL",
        "DATABASE_PASSWORD",
        "ADMIN_PASSWORD",
        "POSTGRES_PASSWORD",
        "S3_SECRET_KEY",
        "S3_SECRET_ACCESS_KEY",
        "AWS_SECRET_ACCESS_KEY",
        "SMTP_PASSWORD",
        "SETUP_TOKEN",
    ]
    .into_iter()
    .collect()
});

/// Builds the environment set handed to a spawned interpreter (spec §4.B).
pub struct EnvBuilder {
    base_url: String,
}

impl EnvBuilder {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    /// `allowed_prefixes` lets a caller admit a narrow slice of the parent
    /// environment (e.g. `LANG`, `TZ`) through the per-kind allow-list
    /// pattern; the blocklist always wins over it.
    pub fn build(
        &self,
        req: &ExecutionRequest,
        user_token: &str,
        service_token: &str,
        allowed_prefixes: &[&str],
    ) -> Vec<(String, String)> {
        let mut env = Vec::new();

        env.push(("FLUXBASE_URL".to_string(), self.base_url.clone()));
        env.push(("HOME".to_string(), "/tmp".to_string()));
        if let Ok(path) = std::env::var("PATH") {
            env.push(("PATH".to_string(), path));
        }

        match req.kind {
            ExecutionKind::Function => {
                env.push(("FLUXBASE_EXECUTION_ID".to_string(), req.id.to_string()));
                env.push(("FLUXBASE_FUNCTION_NAME".to_string(), req.name.clone()));
                env.push(("FLUXBASE_USER_TOKEN".to_string(), user_token.to_string()));
                env.push(("FLUXBASE_SERVICE_TOKEN".to_string(), service_token.to_string()));
            }
            ExecutionKind::Job => {
                env.push(("FLUXBASE_JOB_ID".to_string(), req.id.to_string()));
                env.push(("FLUXBASE_JOB_NAME".to_string(), req.name.clone()));
                env.push(("FLUXBASE_JOB_TOKEN".to_string(), user_token.to_string()));
                env.push(("FLUXBASE_SERVICE_TOKEN".to_string(), service_token.to_string()));
            }
        }

        for (name, value) in &req.secrets {
            env.push((format!("SECRET_{}", name), value.clone()));
        }

        for (name, value) in std::env::vars() {
            if BLOCKLIST.contains(name.as_str()) {
                continue;
            }
            if allowed_prefixes.iter().any(|p| name.starts_with(p)) {
                env.push((name, value));
            }
        }

        env
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn req(kind: ExecutionKind) -> ExecutionRequest {
        ExecutionRequest::builder(kind, "echo")
            .timeout(Duration::from_secs(5))
            .secret("api_key", "abc")
            .build()
    }

    #[test]
    fn function_env_carries_execution_identifiers() {
        let builder = EnvBuilder::new("https://api.example.com");
        let env = builder.build(&req(ExecutionKind::Function), "ut", "st", &[]);
        let names: Vec<&str> = env.iter().map(|(k, _)| k.as_str()).collect();
        assert!(names.contains(&"FLUXBASE_EXECUTION_ID"));
        assert!(names.contains(&"FLUXBASE_FUNCTION_NAME"));
        assert!(!names.contains(&"FLUXBASE_JOB_ID"));
    }

    #[test]
    fn job_env_carries_job_identifiers() {
        let builder = EnvBuilder::new("https://api.example.com");
        let env = builder.build(&req(ExecutionKind::Job), "ut", "st", &[]);
        let names: Vec<&str> = env.iter().map(|(k, _)| k.as_str()).collect();
        assert!(names.contains(&"FLUXBASE_JOB_ID"));
        assert!(names.contains(&"FLUXBASE_JOB_NAME"));
    }

    #[test]
    fn secrets_are_prefixed_and_passed_through_verbatim() {
        let builder = EnvBuilder::new("https://api.example.com");
        let env = builder.build(&req(ExecutionKind::Function), "ut", "st", &[]);
        let secret = env.iter().find(|(k, _)| k == "SECRET_API_KEY");
        assert_eq!(secret.map(|(_, v)| v.as_str()), Some("abc"));
    }

    #[test]
    fn blocklisted_names_never_pass_through() {
        std::env::set_var("DATABASE_PASSWORD", "swordfish");
        let builder = EnvBuilder::new("https://api.example.com");
        let env = builder.build(&req(ExecutionKind::Function), "ut", "st", &["DATABASE_"]);
        assert!(!env.iter().any(|(k, _)| k == "DATABASE_PASSWORD"));
        std::env::remove_var("DATABASE_PASSWORD");
    }
}
