use serde::Deserialize;

/// Root application configuration. Loaded from environment variables
/// with the prefix `JOURNEY_SESSION__`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub redis: RedisConfig,
    #[serde(default)]
    pub journey: JourneyConfig,
    #[serde(default)]
    pub store_backend: StoreBackend,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_http_port")]
    pub http_port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    #[serde(default = "default_redis_urls")]
    pub urls: Vec<String>,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    #[serde(default = "default_command_timeout_ms")]
    pub command_timeout_ms: u64,
}

/// Which backing cache the journey store talks to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Redis,
    /// In-process map. Only suitable for a single instance.
    Memory,
}

// ─── Journey Config ─────────────────────────────────────────────────────
#[derive(Debug, Clone, Deserialize)]
pub struct JourneyConfig {
    #[serde(default = "default_journey_data_token_duration_hours")]
    pub journey_data_token_duration_hours: u64,
    /// Upper bound on how long a response waits for its journey write.
    #[serde(default = "default_write_timeout_ms")]
    pub write_timeout_ms: u64,
    #[serde(default = "default_bootstrap_marker")]
    pub bootstrap_marker: String,
}

const SECS_PER_HOUR: u64 = 3600;

/// Redis expiries are signed 64-bit seconds.
const MAX_TTL_SECS: u64 = i64::MAX as u64;

fn default_journey_data_token_duration_hours() -> u64 { 8 }
fn default_write_timeout_ms() -> u64 { 3000 }
fn default_bootstrap_marker() -> String { "/create/".to_string() }

impl JourneyConfig {
    /// Expiry applied to every journey write. Saturates rather than wraps;
    /// [`AppConfig::validate`] rejects values that do not fit.
    pub fn ttl_secs(&self) -> u64 {
        self.journey_data_token_duration_hours.saturating_mul(SECS_PER_HOUR)
    }
}

impl Default for JourneyConfig {
    fn default() -> Self {
        Self {
            journey_data_token_duration_hours: default_journey_data_token_duration_hours(),
            write_timeout_ms: default_write_timeout_ms(),
            bootstrap_marker: default_bootstrap_marker(),
        }
    }
}

// Default functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_http_port() -> u16 {
    8080
}
fn default_metrics_port() -> u16 {
    9091
}
fn default_redis_urls() -> Vec<String> {
    vec!["redis://localhost:6379".to_string()]
}
fn default_connect_timeout_ms() -> u64 {
    5000
}
fn default_command_timeout_ms() -> u64 {
    2000
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            http_port: default_http_port(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            port: default_metrics_port(),
        }
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            urls: default_redis_urls(),
            connect_timeout_ms: default_connect_timeout_ms(),
            command_timeout_ms: default_command_timeout_ms(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            metrics: MetricsConfig::default(),
            redis: RedisConfig::default(),
            journey: JourneyConfig::default(),
            store_backend: StoreBackend::default(),
        }
    }
}

impl AppConfig {
    /// Reject settings the journey layer cannot honour.
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        let hours = self.journey.journey_data_token_duration_hours;
        match hours.checked_mul(SECS_PER_HOUR) {
            Some(0) => {
                return Err(config::ConfigError::Message(
                    "journey.journey_data_token_duration_hours must be positive".to_string(),
                ))
            }
            Some(secs) if secs <= MAX_TTL_SECS => {}
            _ => {
                return Err(config::ConfigError::Message(format!(
                    "journey.journey_data_token_duration_hours={hours} exceeds the cache expiry limit"
                )))
            }
        }
        if self.journey.write_timeout_ms == 0 {
            return Err(config::ConfigError::Message(
                "journey.write_timeout_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            .add_source(
                config::Environment::with_prefix("JOURNEY_SESSION")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("redis.urls"),
            );

        let config = builder.build()?;
        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_journey_ttl_is_eight_hours() {
        let config = AppConfig::default();
        assert_eq!(config.journey.ttl_secs(), 8 * 3600);
        assert_eq!(config.journey.bootstrap_marker, "/create/");
        assert_eq!(config.store_backend, StoreBackend::Redis);
    }

    #[test]
    fn test_defaults_are_valid() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_hours_rejected() {
        let mut config = AppConfig::default();
        config.journey.journey_data_token_duration_hours = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_huge_hours_rejected_without_overflow() {
        let mut config = AppConfig::default();
        config.journey.journey_data_token_duration_hours = u64::MAX;
        assert_eq!(config.journey.ttl_secs(), u64::MAX);
        assert!(config.validate().is_err());

        config.journey.journey_data_token_duration_hours = u64::MAX / 3600;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_write_timeout_rejected() {
        let mut config = AppConfig::default();
        config.journey.write_timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_ttl_follows_configured_hours() {
        let journey = JourneyConfig {
            journey_data_token_duration_hours: 68,
            ..JourneyConfig::default()
        };
        assert_eq!(journey.ttl_secs(), 68 * 3600);
    }
}
