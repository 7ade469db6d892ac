//! Configuration for the registry gate

use folio_types::{Height, Principal};
use serde::{Deserialize, Serialize};

pub use folio_limiter::RateLimitConfig;

/// Main registry configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Principal allowed to suspend and resume the platform
    #[serde(default = "default_supervisor")]
    pub supervisor: Principal,

    /// Protected registration rate limit
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Pending operation configuration
    #[serde(default)]
    pub pending: PendingConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            supervisor: default_supervisor(),
            rate_limit: RateLimitConfig::default(),
            pending: PendingConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Pending operation configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingConfig {
    /// Heights until a pending operation expires
    #[serde(default = "default_pending_expiry")]
    pub expiry: Height,
}

impl Default for PendingConfig {
    fn default() -> Self {
        Self {
            expiry: default_pending_expiry(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level or filter directive
    #[serde(default = "default_log_level")]
    pub level: String,

    /// JSON format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// Default value helpers
fn default_supervisor() -> Principal {
    Principal::new("supervisor")
}

fn default_pending_expiry() -> Height {
    1440
}

fn default_log_level() -> String {
    "info".to_string()
}

impl RegistryConfig {
    /// Load configuration: defaults, then the optional file, then `FOLIO_*`
    /// environment variables (`FOLIO_RATE_LIMIT__WINDOW=50`).
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        builder = builder.add_source(config::Config::try_from(&RegistryConfig::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("FOLIO")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }

    /// Configuration with the given supervisor and defaults elsewhere.
    pub fn with_supervisor(supervisor: impl Into<String>) -> Self {
        Self {
            supervisor: Principal::new(supervisor),
            ..Default::default()
        }
    }
}
