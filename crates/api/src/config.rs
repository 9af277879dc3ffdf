//! Application configuration loaded from environment variables.

use std::time::Duration;

use delivery::ChannelConfig;

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST` — bind address (default: `"0.0.0.0"`)
/// - `PORT` — listen port (default: `3000`)
/// - `RUST_LOG` — tracing filter directive (default: `"info"`)
/// - `CHANNEL_MIN_DELAY_MS` — minimum simulated channel latency (default: `1000`)
/// - `CHANNEL_MAX_DELAY_MS` — maximum simulated channel latency (default: `4000`)
/// - `CHANNEL_SUCCESS_RATE` — simulated delivery success probability (default: `0.9`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub channel: ChannelConfig,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = ChannelConfig::default();
        let channel = ChannelConfig {
            min_delay: env_parse("CHANNEL_MIN_DELAY_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.min_delay),
            max_delay: env_parse("CHANNEL_MAX_DELAY_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.max_delay),
            success_rate: env_parse("CHANNEL_SUCCESS_RATE").unwrap_or(defaults.success_rate),
        };

        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env_parse("PORT").unwrap_or(3000),
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            channel,
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            channel: ChannelConfig::default(),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}
