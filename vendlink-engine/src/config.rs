use std::env::var;
use std::time::Duration;

use dotenvy::dotenv;
use vendlink_api::PlatformInfo;

/// Engine configuration with environment variable overrides
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Webstore secret key, issued by the platform
    /// Env: VENDLINK_SECRET_KEY (default: empty; the engine logs a setup hint)
    pub secret_key: String,

    /// Plugin API base URL
    /// Env: VENDLINK_BASE_URL
    pub base_url: String,

    /// Plugin-logs endpoint for triage events
    /// Env: VENDLINK_LOGS_URL
    pub logs_url: String,

    /// Cache lifetime for store metadata, in minutes
    /// Env: VENDLINK_CACHE_TTL_MINUTES (default: 30)
    pub cache_ttl_minutes: i64,

    /// Enables debug logging, which may show raw user info in the console
    /// Env: VENDLINK_DEBUG (default: false)
    pub debug: bool,

    /// Automatically report detected issues to the platform
    /// Env: VENDLINK_AUTO_REPORT (default: true)
    pub auto_report: bool,

    /// Per-request timeout in seconds
    /// Env: VENDLINK_REQUEST_TIMEOUT_SECS (default: 10)
    pub request_timeout: Duration,

    /// Command queue poll driver interval
    /// Env: VENDLINK_COMMAND_QUEUE_INTERVAL_SECS (default: 121)
    pub command_queue_interval: Duration,

    /// Executed-command flush driver interval
    /// Env: VENDLINK_DELETE_INTERVAL_SECS (default: 61)
    pub delete_interval: Duration,

    /// Join-event flush driver interval
    /// Env: VENDLINK_JOIN_INTERVAL_SECS (default: 61)
    pub join_interval: Duration,

    /// Store info refresh driver interval
    /// Env: VENDLINK_REFRESH_INTERVAL_SECS (default: 901, i.e. 15 min + 1 s)
    pub info_refresh_interval: Duration,

    /// Platform identity attached to triage events; filled in by the host
    /// adapter after loading
    pub platform: PlatformInfo,
}

impl EngineConfig {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        let _ = dotenv(); //for debugging mostly
        Self {
            secret_key: env_or_default_string("VENDLINK_SECRET_KEY", ""),
            base_url: env_or_default_string("VENDLINK_BASE_URL", "https://plugin.vendlink.io/api"),
            logs_url: env_or_default_string(
                "VENDLINK_LOGS_URL",
                "https://plugin-logs.vendlink.io/events",
            ),
            cache_ttl_minutes: env_or_default("VENDLINK_CACHE_TTL_MINUTES", 30),
            debug: env_or_default("VENDLINK_DEBUG", false),
            auto_report: env_or_default("VENDLINK_AUTO_REPORT", true),
            request_timeout: Duration::from_secs(env_or_default("VENDLINK_REQUEST_TIMEOUT_SECS", 10)),
            command_queue_interval: Duration::from_secs(env_or_default(
                "VENDLINK_COMMAND_QUEUE_INTERVAL_SECS",
                121,
            )),
            delete_interval: Duration::from_secs(env_or_default("VENDLINK_DELETE_INTERVAL_SECS", 61)),
            join_interval: Duration::from_secs(env_or_default("VENDLINK_JOIN_INTERVAL_SECS", 61)),
            info_refresh_interval: Duration::from_secs(env_or_default(
                "VENDLINK_REFRESH_INTERVAL_SECS",
                901,
            )),
            platform: PlatformInfo::default(),
        }
    }

    /// Create configuration with all default values
    pub fn default() -> Self {
        Self {
            secret_key: String::new(),
            base_url: "https://plugin.vendlink.io/api".to_string(),
            logs_url: "https://plugin-logs.vendlink.io/events".to_string(),
            cache_ttl_minutes: 30,
            debug: false,
            auto_report: true,
            request_timeout: Duration::from_secs(10),
            command_queue_interval: Duration::from_secs(121),
            delete_interval: Duration::from_secs(61),
            join_interval: Duration::from_secs(61),
            info_refresh_interval: Duration::from_secs(901),
            platform: PlatformInfo::default(),
        }
    }
}

/// Parse environment variable or return default value
fn env_or_default<T: std::str::FromStr>(key: &str, default: T) -> T {
    var(key)
        .ok()
        .and_then(|val| val.parse().ok())
        .unwrap_or(default)
}

/// Parse environment variable string or return default value
fn env_or_default_string(key: &str, default: &str) -> String {
    var(key).unwrap_or_else(|_| default.to_string())
}
