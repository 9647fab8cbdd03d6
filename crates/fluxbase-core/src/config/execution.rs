use serde::{Deserialize, Serialize};

/// Execution-engine tuning (spec §4.E, §5, §9).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Path to the external interpreter binary the engine spawns.
    #[serde(default = "default_interpreter")]
    pub interpreter_path: String,

    /// Directory under which per-execution scratch directories are created.
    #[serde(default = "default_scratch_dir")]
    pub scratch_dir: String,

    #[serde(default = "default_timeout_secs")]
    pub default_timeout_secs: u64,

    #[serde(default = "default_memory_limit_mb")]
    pub default_memory_limit_mb: u32,

    #[serde(default = "default_max_output_function")]
    pub max_output_bytes_function: usize,

    #[serde(default = "default_max_output_job")]
    pub max_output_bytes_job: usize,

    /// Soft-cancel grace: time between the cooperative cancel signal and
    /// sending a termination signal.
    #[serde(default = "default_grace_soft_ms")]
    pub grace_soft_ms: u64,

    /// Term grace: time between termination and a hard kill.
    #[serde(default = "default_grace_term_ms")]
    pub grace_term_ms: u64,

    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_executions: usize,

    #[serde(default = "default_max_concurrent_per_client")]
    pub max_concurrent_per_client: usize,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            interpreter_path: default_interpreter(),
            scratch_dir: default_scratch_dir(),
            default_timeout_secs: default_timeout_secs(),
            default_memory_limit_mb: default_memory_limit_mb(),
            max_output_bytes_function: default_max_output_function(),
            max_output_bytes_job: default_max_output_job(),
            grace_soft_ms: default_grace_soft_ms(),
            grace_term_ms: default_grace_term_ms(),
            max_concurrent_executions: default_max_concurrent(),
            max_concurrent_per_client: default_max_concurrent_per_client(),
        }
    }
}

fn default_interpreter() -> String {
    "node".to_string()
}

fn default_scratch_dir() -> String {
    "/tmp/fluxbase-exec".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_memory_limit_mb() -> u32 {
    128
}

fn default_max_output_function() -> usize {
    10 * 1024 * 1024
}

fn default_max_output_job() -> usize {
    50 * 1024 * 1024
}

fn default_grace_soft_ms() -> u64 {
    500
}

fn default_grace_term_ms() -> u64 {
    2_000
}

fn default_max_concurrent() -> usize {
    256
}

fn default_max_concurrent_per_client() -> usize {
    16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_sizes() {
        let config = ExecutionConfig::default();
        assert_eq!(config.max_output_bytes_function, 10 * 1024 * 1024);
        assert_eq!(config.max_output_bytes_job, 50 * 1024 * 1024);
    }

    #[test]
    fn parses_from_toml_fragment() {
        let toml = r#"
            interpreter_path = "deno"
            default_timeout_secs = 10
        "#;
        let config: ExecutionConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.interpreter_path, "deno");
        assert_eq!(config.default_timeout_secs, 10);
        assert_eq!(config.default_memory_limit_mb, 128);
    }
}
