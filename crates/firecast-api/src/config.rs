//! API configuration.

use std::str::FromStr;

/// Where the queue keeps its state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueueBackend {
    #[default]
    Redis,
    /// In-process store; state is lost on restart
    Memory,
}

impl FromStr for QueueBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "redis" => Ok(QueueBackend::Redis),
            "memory" => Ok(QueueBackend::Memory),
            other => Err(format!("unknown queue backend: {}", other)),
        }
    }
}

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Shared secret expected in the Authorization header
    pub secret: String,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Max request body size
    pub max_body_size: usize,
    /// Queue store backend
    pub queue_backend: QueueBackend,
    /// Run the lease sweeper in this process
    pub sweeper_enabled: bool,
    /// Serve Prometheus metrics at /metrics
    pub metrics_enabled: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            secret: String::new(),
            cors_origins: vec!["*".to_string()],
            max_body_size: 64 * 1024,
            queue_backend: QueueBackend::Redis,
            sweeper_enabled: true,
            metrics_enabled: true,
        }
    }
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("API_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(8080),
            secret: std::env::var("FIRECAST_SECRET").unwrap_or_default(),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or_else(|_| vec!["*".to_string()]),
            max_body_size: std::env::var("MAX_BODY_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(64 * 1024),
            queue_backend: std::env::var("QUEUE_BACKEND")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_default(),
            sweeper_enabled: env_flag("SWEEPER_ENABLED", true),
            metrics_enabled: env_flag("METRICS_ENABLED", true),
        }
    }

    /// Set the shared secret.
    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = secret.into();
        self
    }
}

fn env_flag(name: &str, default: bool) -> bool {
    std::env::var(name)
        .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = ApiConfig::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.max_body_size, 65536);
        assert_eq!(config.queue_backend, QueueBackend::Redis);
        assert!(config.sweeper_enabled);
    }

    #[test]
    fn test_queue_backend_parse() {
        assert_eq!("memory".parse::<QueueBackend>(), Ok(QueueBackend::Memory));
        assert_eq!(" Redis ".parse::<QueueBackend>(), Ok(QueueBackend::Redis));
        assert!("postgres".parse::<QueueBackend>().is_err());
    }
}
