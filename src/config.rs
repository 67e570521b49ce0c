//! Engine configuration
//!
//! Settings load from optional `config/default` and `config/local` files
//! with `AB__`-prefixed environment variables layered on top, or can be
//! constructed directly for embedding.

use serde::Deserialize;

use crate::domain::experiment::DEFAULT_EVENT;

/// Configuration for the experiment engine
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// How callers are expected to identify users
    #[serde(default)]
    pub identity: IdentityConfig,
    /// Event name used when conversions are recorded without one
    #[serde(default = "default_event")]
    pub default_event: String,
}

/// User identity settings
///
/// The engine itself never reads cookies; these values are published for
/// client-facing layers that mint and persist user IDs.
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityConfig {
    /// Cookie under which generated user IDs are stored
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    /// Path scope for the identity cookie
    #[serde(default = "default_cookie_path")]
    pub cookie_path: String,
    /// Identity cookie lifetime in seconds
    #[serde(default = "default_cookie_max_age_secs")]
    pub cookie_max_age_secs: u64,
}

fn default_event() -> String {
    DEFAULT_EVENT.to_string()
}

fn default_cookie_name() -> String {
    "ab-uid".to_string()
}

fn default_cookie_path() -> String {
    "/".to_string()
}

fn default_cookie_max_age_secs() -> u64 {
    // One year
    60 * 60 * 24 * 365
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            identity: IdentityConfig::default(),
            default_event: default_event(),
        }
    }
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            cookie_path: default_cookie_path(),
            cookie_max_age_secs: default_cookie_max_age_secs(),
        }
    }
}

impl EngineConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("AB")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
