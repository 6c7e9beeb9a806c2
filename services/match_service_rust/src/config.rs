use entity_match_core::{CorrelationConfig, MatchConfig};

/// Service configuration, read once at startup
#[derive(Clone, Copy, Debug, Default)]
pub struct Config {
    pub matching: MatchConfig,
    pub correlation: CorrelationConfig,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            matching: MatchConfig::from_env(),
            correlation: CorrelationConfig::from_env(),
        }
    }
}
