use serde::{Deserialize, Serialize};

/// Ambient logging configuration — trimmed from a fuller
/// metrics/tracing/dashboard configuration block to the logging-bootstrap
/// subset this repo actually initializes (metric storage, alerting and
/// the admin dashboard are peripheral feature modules out of scope here).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_true")]
    pub logging_enabled: bool,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            logging_enabled: true,
            logging: LoggingConfig::default(),
        }
    }
}

fn default_true() -> bool {
    true
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to emit JSON-formatted log lines (the teacher's
    /// `tracing-subscriber` "json" feature) rather than human-readable.
    #[serde(default)]
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json_format: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_observability_config_logs_at_info() {
        let config = ObservabilityConfig::default();
        assert!(config.logging_enabled);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn parses_observability_config() {
        let toml = r#"
            logging_enabled = true

            [logging]
            level = "debug"
            json_format = true
        "#;

        let config: ObservabilityConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json_format);
    }
}
