use std::time::Duration;

use fluxbase_core::config::ExecutionConfig;

/// Cooperative-cancel → terminate → kill grace periods (spec §9 Open
/// Question: "exact grace interval... not prescribed, suggest 500ms/2s" —
/// decided and recorded in DESIGN.md).
#[derive(Debug, Clone, Copy)]
pub struct GraceConfig {
    pub soft: Duration,
    pub term: Duration,
}

impl Default for GraceConfig {
    fn default() -> Self {
        Self {
            soft: Duration::from_millis(500),
            term: Duration::from_secs(2),
        }
    }
}

impl From<&ExecutionConfig> for GraceConfig {
    fn from(config: &ExecutionConfig) -> Self {
        Self {
            soft: Duration::from_millis(config.grace_soft_ms),
            term: Duration::from_millis(config.grace_term_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_spec_suggestion() {
        let grace = GraceConfig::default();
        assert_eq!(grace.soft, Duration::from_millis(500));
        assert_eq!(grace.term, Duration::from_secs(2));
    }

    #[test]
    fn derives_from_execution_config() {
        let mut config = ExecutionConfig::default();
        config.grace_soft_ms = 250;
        config.grace_term_ms = 1_000;
        let grace = GraceConfig::from(&config);
        assert_eq!(grace.soft, Duration::from_millis(250));
        assert_eq!(grace.term, Duration::from_millis(1_000));
    }
}
