//! Tunable parameters for entity matching and correlation detection.
//!
//! Defaults reproduce the production behaviour; every value can be
//! overridden from the environment:
//! - `MATCH_THRESHOLD` (default 0.65)
//! - `MATCH_SUBSTRING_MIN_LEN` (default 8)
//! - `MATCH_SUBSTRING_MIN_RATIO` (default 0.6)
//! - `CORRELATION_CACHE_CAPACITY` (default 100)
//! - `CORRELATION_WINDOW_MS` (default unset, entries never expire by age)

use std::env;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// Default blended-score threshold for two names to denote the same entity
pub const DEFAULT_MATCH_THRESHOLD: f64 = 0.65;

/// Shorter flattened name must be at least this long for the substring fallback
pub const DEFAULT_SUBSTRING_MIN_LEN: usize = 8;

/// Shorter/longer flattened length ratio required for the substring fallback
pub const DEFAULT_SUBSTRING_MIN_RATIO: f64 = 0.6;

/// Number of recently placed bets remembered by the correlation detector
pub const DEFAULT_CORRELATION_CAPACITY: usize = 100;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
    #[error("{key} = {value} is outside [{min}, {max}]")]
    OutOfRange {
        key: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
}

/// Entity matcher configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchConfig {
    /// Minimum blended score (0.0-1.0) accepted as a match
    pub threshold: f64,
    /// Empirically tuned; guards against short generic names like "miami"
    pub substring_min_len: usize,
    /// Empirically tuned; shorter/longer ratio for the substring fallback
    pub substring_min_ratio: f64,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_MATCH_THRESHOLD,
            substring_min_len: DEFAULT_SUBSTRING_MIN_LEN,
            substring_min_ratio: DEFAULT_SUBSTRING_MIN_RATIO,
        }
    }
}

impl MatchConfig {
    /// Same defaults with a different threshold
    pub fn with_threshold(threshold: f64) -> Self {
        Self {
            threshold,
            ..Self::default()
        }
    }

    /// Load from environment. A bad value falls back to its own default;
    /// the other overrides are kept.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            threshold: env_or("MATCH_THRESHOLD", defaults.threshold, check_unit_range),
            substring_min_len: env_or(
                "MATCH_SUBSTRING_MIN_LEN",
                defaults.substring_min_len,
                |_, _| Ok(()),
            ),
            substring_min_ratio: env_or(
                "MATCH_SUBSTRING_MIN_RATIO",
                defaults.substring_min_ratio,
                check_unit_range,
            ),
        }
    }

    /// Load from environment, reporting the first bad value
    pub fn try_from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let config = Self {
            threshold: read_env("MATCH_THRESHOLD")?.unwrap_or(defaults.threshold),
            substring_min_len: read_env("MATCH_SUBSTRING_MIN_LEN")?
                .unwrap_or(defaults.substring_min_len),
            substring_min_ratio: read_env("MATCH_SUBSTRING_MIN_RATIO")?
                .unwrap_or(defaults.substring_min_ratio),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_unit_range("MATCH_THRESHOLD", self.threshold)?;
        check_unit_range("MATCH_SUBSTRING_MIN_RATIO", self.substring_min_ratio)?;
        Ok(())
    }
}

/// Correlation detector configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorrelationConfig {
    /// Maximum number of recorded bets kept (oldest inserted evicted first)
    pub capacity: usize,
    /// Optional age limit for recorded bets; `None` keeps them until evicted
    pub window: Option<Duration>,
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CORRELATION_CAPACITY,
            window: None,
        }
    }
}

impl CorrelationConfig {
    /// Load from environment. A bad value falls back to its own default;
    /// the other overrides are kept.
    pub fn from_env() -> Self {
        let window = match read_env::<u64>("CORRELATION_WINDOW_MS") {
            Ok(ms) => ms.map(Duration::from_millis),
            Err(e) => {
                warn!("{}, correlation window disabled", e);
                None
            }
        };
        Self {
            capacity: env_or(
                "CORRELATION_CACHE_CAPACITY",
                DEFAULT_CORRELATION_CAPACITY,
                check_capacity,
            ),
            window,
        }
    }

    /// Load from environment, reporting the first bad value
    pub fn try_from_env() -> Result<Self, ConfigError> {
        let config = Self {
            capacity: read_env("CORRELATION_CACHE_CAPACITY")?
                .unwrap_or(DEFAULT_CORRELATION_CAPACITY),
            window: read_env::<u64>("CORRELATION_WINDOW_MS")?.map(Duration::from_millis),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_capacity("CORRELATION_CACHE_CAPACITY", self.capacity)
    }
}

/// Parsed and checked value of `key`, or `default` with a warning
fn env_or<T>(key: &'static str, default: T, check: fn(&'static str, T) -> Result<(), ConfigError>) -> T
where
    T: FromStr + Copy + std::fmt::Debug,
{
    let value = read_env::<T>(key).and_then(|value| match value {
        Some(v) => check(key, v).map(|_| v),
        None => Ok(default),
    });
    value.unwrap_or_else(|e| {
        warn!("{}, using default {:?}", e, default);
        default
    })
}

fn read_env<T: FromStr>(key: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { key, value: raw }),
        Err(_) => Ok(None),
    }
}

fn check_capacity(key: &'static str, capacity: usize) -> Result<(), ConfigError> {
    if capacity == 0 {
        return Err(ConfigError::OutOfRange {
            key,
            value: 0.0,
            min: 1.0,
            max: usize::MAX as f64,
        });
    }
    Ok(())
}

fn check_unit_range(key: &'static str, value: f64) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::OutOfRange {
            key,
            value,
            min: 0.0,
            max: 1.0,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    // Environment is process-wide; tests that touch it take turns
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const KEYS: [&str; 5] = [
        "MATCH_THRESHOLD",
        "MATCH_SUBSTRING_MIN_LEN",
        "MATCH_SUBSTRING_MIN_RATIO",
        "CORRELATION_CACHE_CAPACITY",
        "CORRELATION_WINDOW_MS",
    ];

    fn with_env<R>(vars: &[(&str, &str)], f: impl FnOnce() -> R) -> R {
        let _guard = ENV_LOCK.lock();
        for key in KEYS {
            env::remove_var(key);
        }
        for (key, value) in vars {
            env::set_var(key, value);
        }
        let result = f();
        for key in KEYS {
            env::remove_var(key);
        }
        result
    }

    #[test]
    fn test_from_env_keeps_good_overrides() {
        let config = with_env(
            &[("MATCH_THRESHOLD", "0.8"), ("MATCH_SUBSTRING_MIN_RATIO", "oops")],
            MatchConfig::from_env,
        );
        assert!((config.threshold - 0.8).abs() < f64::EPSILON);
        assert!((config.substring_min_ratio - DEFAULT_SUBSTRING_MIN_RATIO).abs() < f64::EPSILON);

        let config = with_env(
            &[("MATCH_THRESHOLD", "1.7"), ("MATCH_SUBSTRING_MIN_LEN", "10")],
            MatchConfig::from_env,
        );
        assert!((config.threshold - DEFAULT_MATCH_THRESHOLD).abs() < f64::EPSILON);
        assert_eq!(config.substring_min_len, 10);
    }

    #[test]
    fn test_correlation_from_env_per_key() {
        let config = with_env(
            &[("CORRELATION_CACHE_CAPACITY", "0"), ("CORRELATION_WINDOW_MS", "60000")],
            CorrelationConfig::from_env,
        );
        assert_eq!(config.capacity, DEFAULT_CORRELATION_CAPACITY);
        assert_eq!(config.window, Some(Duration::from_secs(60)));

        let config = with_env(
            &[("CORRELATION_CACHE_CAPACITY", "25"), ("CORRELATION_WINDOW_MS", "soon")],
            CorrelationConfig::from_env,
        );
        assert_eq!(config.capacity, 25);
        assert!(config.window.is_none());
    }

    #[test]
    fn test_try_from_env_reports_bad_value() {
        let result = with_env(&[("MATCH_SUBSTRING_MIN_RATIO", "oops")], MatchConfig::try_from_env);
        assert_eq!(
            result,
            Err(ConfigError::InvalidValue {
                key: "MATCH_SUBSTRING_MIN_RATIO",
                value: "oops".to_string(),
            })
        );
        assert_eq!(with_env(&[], MatchConfig::try_from_env), Ok(MatchConfig::default()));
    }

    #[test]
    fn test_defaults_match_production_constants() {
        let config = MatchConfig::default();
        assert!((config.threshold - 0.65).abs() < f64::EPSILON);
        assert_eq!(config.substring_min_len, 8);
        assert!((config.substring_min_ratio - 0.6).abs() < f64::EPSILON);

        let correlation = CorrelationConfig::default();
        assert_eq!(correlation.capacity, 100);
        assert!(correlation.window.is_none());
    }

    #[test]
    fn test_with_threshold_keeps_other_defaults() {
        let config = MatchConfig::with_threshold(0.8);
        assert!((config.threshold - 0.8).abs() < f64::EPSILON);
        assert_eq!(config.substring_min_len, DEFAULT_SUBSTRING_MIN_LEN);
    }

    #[test]
    fn test_threshold_out_of_range_rejected() {
        let config = MatchConfig::with_threshold(1.5);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OutOfRange { key: "MATCH_THRESHOLD", .. })
        ));
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let config = CorrelationConfig {
            capacity: 0,
            window: None,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_error_messages() {
        let err = ConfigError::InvalidValue {
            key: "MATCH_THRESHOLD",
            value: "high".to_string(),
        };
        assert_eq!(err.to_string(), "invalid value for MATCH_THRESHOLD: \"high\"");
    }
}
