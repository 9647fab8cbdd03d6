use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ExecutionError;

/// Outcome of [`ExecutionEngine::execute`](../../fluxbase_runtime/execution/struct.ExecutionEngine.html#method.execute).
/// The engine never panics or returns `Err` for a user-code or resource
/// failure — every such failure is reported here instead (spec §4.E, §7).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub success: bool,
    pub value: Option<serde_json::Value>,
    pub error: Option<ExecutionError>,

    pub stdout: String,
    pub stderr_classified: Vec<ClassifiedLine>,

    #[serde(with = "duration_millis")]
    pub duration: Duration,

    pub timed_out: bool,
    pub oom: bool,
    pub truncated_stdout: bool,
    pub truncated_stderr: bool,
}

impl ExecutionResult {
    pub fn success(value: serde_json::Value, duration: Duration) -> Self {
        Self {
            success: true,
            value: Some(value),
            error: None,
            stdout: String::new(),
            stderr_classified: Vec::new(),
            duration,
            timed_out: false,
            oom: false,
            truncated_stdout: false,
            truncated_stderr: false,
        }
    }

    pub fn failure(error: ExecutionError, duration: Duration) -> Self {
        Self {
            success: false,
            value: None,
            error: Some(error),
            stdout: String::new(),
            stderr_classified: Vec::new(),
            duration,
            timed_out: false,
            oom: false,
            truncated_stdout: false,
            truncated_stderr: false,
        }
    }
}

/// A single classified stderr line (spec §4.D).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineLevel {
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifiedLine {
    pub level: LineLevel,
    pub text: String,
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ExecutionError, ExecutionErrorKind};

    #[test]
    fn success_result_has_no_error() {
        let result = ExecutionResult::success(serde_json::json!({"x": 1}), Duration::from_millis(5));
        assert!(result.success);
        assert!(result.error.is_none());
    }

    #[test]
    fn failure_result_has_no_value() {
        let err = ExecutionError::new(ExecutionErrorKind::User, "boom");
        let result = ExecutionResult::failure(err, Duration::from_millis(5));
        assert!(!result.success);
        assert!(result.value.is_none());
    }

    #[test]
    fn duration_round_trips_as_millis() {
        let result = ExecutionResult::success(serde_json::Value::Null, Duration::from_millis(42));
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"duration\":42"));
    }
}
