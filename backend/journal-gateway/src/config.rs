/// Configuration management for the journal gateway
///
/// Every downstream endpoint and timing knob is environment-driven; nothing
/// is hardcoded.
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub downstream: DownstreamConfig,
    pub retry: RetrySettings,
    pub cache: CacheSettings,
    pub probe: ProbeSettings,
    pub events: EventsConfig,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub env: String,
    pub host: String,
    pub port: u16,
}

/// Base URLs of the downstream services
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownstreamConfig {
    pub journal_url: String,
    pub link_url: String,
    pub task_url: String,
    pub user_url: String,
}

impl DownstreamConfig {
    /// All downstream bases, named, for the liveness prober
    pub fn probe_targets(&self) -> Vec<(String, String)> {
        vec![
            ("journal-service".to_string(), self.journal_url.clone()),
            ("link-service".to_string(), self.link_url.clone()),
            ("task-service".to_string(), self.task_url.clone()),
            ("user-service".to_string(), self.user_url.clone()),
        ]
    }
}

/// Outbound retry policy settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySettings {
    pub count: u32,
    pub delay_ms: u64,
}

impl RetrySettings {
    pub fn to_policy(&self) -> resilience::RetryConfig {
        resilience::RetryConfig {
            max_retries: self.count,
            delay: Duration::from_millis(self.delay_ms),
        }
    }
}

/// Dashboard cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
    pub ttl_secs: u64,
}

/// Downstream liveness probe settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeSettings {
    pub interval_secs: u64,
}

/// Subject event bus settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventsConfig {
    pub redis_url: String,
    pub channel: String,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        Ok(Config {
            app: AppConfig {
                env: env_or("APP_ENV", "development"),
                host: env_or("GATEWAY_HOST", "0.0.0.0"),
                port: env_parse("GATEWAY_PORT", 8090),
            },
            downstream: DownstreamConfig {
                journal_url: env_or("JOURNAL_SERVICE_URL", "http://127.0.0.1:8092"),
                link_url: env_or("LINK_SERVICE_URL", "http://127.0.0.1:8091"),
                task_url: env_or("TASK_SERVICE_URL", "http://127.0.0.1:8093"),
                user_url: env_or("USER_SERVICE_URL", "http://127.0.0.1:8094"),
            },
            retry: RetrySettings {
                count: env_parse("RETRY_COUNT", 3),
                delay_ms: env_parse("RETRY_DELAY_MS", 500),
            },
            cache: CacheSettings {
                ttl_secs: env_parse("DASHBOARD_CACHE_TTL_SECS", 300),
            },
            probe: ProbeSettings {
                interval_secs: env_parse("PROBE_INTERVAL_SECS", 30),
            },
            events: EventsConfig {
                redis_url: env_or("REDIS_URL", "redis://127.0.0.1:6379"),
                channel: env_or("SUBJECT_EVENTS_CHANNEL", "subject-updates"),
            },
        })
    }
}
