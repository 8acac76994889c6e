//! Queue configuration.

use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

/// Default lease duration in seconds.
pub const DEFAULT_LEASE_DURATION_SECS: u64 = 300;
/// Default retry budget.
pub const DEFAULT_RETRY_BUDGET: u32 = 3;
/// Default sweep interval in seconds.
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 10;

/// Queue configuration.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Redis URL
    pub redis_url: String,
    /// Prefix shared by every key the queue writes
    pub key_prefix: String,
    /// How long a lease is honored before the sweeper reclaims it
    pub lease_duration: Duration,
    /// Lease grants allowed before an expired job is failed
    pub retry_budget: u32,
    /// Pause between sweeper passes
    pub sweep_interval: Duration,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://localhost:6379".to_string(),
            key_prefix: "videos".to_string(),
            lease_duration: Duration::from_secs(DEFAULT_LEASE_DURATION_SECS),
            retry_budget: DEFAULT_RETRY_BUDGET,
            sweep_interval: Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS),
        }
    }
}

impl QueueConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            redis_url: std::env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            key_prefix: std::env::var("QUEUE_KEY_PREFIX").unwrap_or_else(|_| "videos".to_string()),
            lease_duration: Duration::from_secs(env_or(
                "WIP_TIMEOUT",
                DEFAULT_LEASE_DURATION_SECS,
            )),
            retry_budget: env_or("WIP_RETRY", DEFAULT_RETRY_BUDGET),
            sweep_interval: nonzero_interval(Duration::from_secs(env_or(
                "WIP_INTERVAL",
                DEFAULT_SWEEP_INTERVAL_SECS,
            ))),
        }
    }

    /// Set the lease duration.
    pub fn with_lease_duration(mut self, lease_duration: Duration) -> Self {
        self.lease_duration = lease_duration;
        self
    }

    /// Set the retry budget.
    pub fn with_retry_budget(mut self, retry_budget: u32) -> Self {
        self.retry_budget = retry_budget;
        self
    }

    /// Set the sweep interval.
    ///
    /// Zero is replaced by the default, since the sweeper ticks on it.
    pub fn with_sweep_interval(mut self, sweep_interval: Duration) -> Self {
        self.sweep_interval = nonzero_interval(sweep_interval);
        self
    }

    /// Set the key prefix.
    pub fn with_key_prefix(mut self, key_prefix: impl Into<String>) -> Self {
        self.key_prefix = key_prefix.into();
        self
    }

    /// Lease duration in whole seconds, as stored in the lease index.
    pub fn lease_duration_secs(&self) -> i64 {
        i64::try_from(self.lease_duration.as_secs()).unwrap_or(i64::MAX)
    }
}

fn nonzero_interval(interval: Duration) -> Duration {
    if interval.is_zero() {
        warn!(
            "Sweep interval must be non-zero, using default {}s",
            DEFAULT_SWEEP_INTERVAL_SECS
        );
        return Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS);
    }
    interval
}

/// Read a numeric environment variable, falling back to `default`.
///
/// Unset variables fall back silently; set but unparseable ones log a warning.
pub fn env_or<T>(name: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display + Copy,
{
    parse_or(name, std::env::var(name).ok(), default)
}

fn parse_or<T>(name: &str, raw: Option<String>, default: T) -> T
where
    T: FromStr + std::fmt::Display + Copy,
{
    match raw {
        None => default,
        Some(raw) if raw.trim().is_empty() => default,
        Some(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                warn!("Invalid {} value: {}, using default {}", name, raw, default);
                default
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = QueueConfig::default();
        assert_eq!(config.key_prefix, "videos");
        assert_eq!(config.lease_duration, Duration::from_secs(300));
        assert_eq!(config.retry_budget, 3);
        assert_eq!(config.sweep_interval, Duration::from_secs(10));
        assert_eq!(config.lease_duration_secs(), 300);
    }

    #[test]
    fn test_parse_or_falls_back() {
        assert_eq!(parse_or("X", None, 7u32), 7);
        assert_eq!(parse_or("X", Some("".into()), 7u32), 7);
        assert_eq!(parse_or("X", Some("abc".into()), 7u32), 7);
        assert_eq!(parse_or("X", Some("-1".into()), 7u32), 7);
        assert_eq!(parse_or("X", Some(" 12 ".into()), 7u32), 12);
    }

    #[test]
    fn test_zero_sweep_interval_uses_default() {
        let config = QueueConfig::default().with_sweep_interval(Duration::ZERO);
        assert_eq!(config.sweep_interval, Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS));
        assert_eq!(nonzero_interval(Duration::from_secs(0)), Duration::from_secs(10));
        assert_eq!(nonzero_interval(Duration::from_secs(3)), Duration::from_secs(3));
    }

    #[test]
    fn test_huge_lease_duration_saturates() {
        let config = QueueConfig::default().with_lease_duration(Duration::from_secs(u64::MAX));
        assert_eq!(config.lease_duration_secs(), i64::MAX);
    }

    #[test]
    fn test_builders() {
        let config = QueueConfig::default()
            .with_lease_duration(Duration::from_secs(60))
            .with_retry_budget(5)
            .with_sweep_interval(Duration::from_secs(1))
            .with_key_prefix("test");
        assert_eq!(config.lease_duration_secs(), 60);
        assert_eq!(config.retry_budget, 5);
        assert_eq!(config.sweep_interval, Duration::from_secs(1));
        assert_eq!(config.key_prefix, "test");
    }
}
