//! Logging bootstrap (spec ambient stack — trimmed from the teacher's
//! fuller metrics/alerting/dashboard observability module to the
//! logging-bootstrap subset this crate actually owns).

use fluxbase_core::config::ObservabilityConfig;
use tracing_subscriber::EnvFilter;

/// Initialize the global `tracing` subscriber from configuration. Safe
/// to call once per process; a second call returns an error that callers
/// should ignore (e.g. when a test harness already installed one).
pub fn init_logging(config: &ObservabilityConfig) -> Result<(), tracing_subscriber::util::TryInitError> {
    if !config.logging_enabled {
        return Ok(());
    }

    let filter = EnvFilter::try_new(&config.logging.level).unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);

    if config.logging.json_format {
        subscriber.json().try_init()
    } else {
        subscriber.try_init()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_logging_is_a_noop() {
        let config = ObservabilityConfig {
            logging_enabled: false,
            ..Default::default()
        };
        assert!(init_logging(&config).is_ok());
    }
}
