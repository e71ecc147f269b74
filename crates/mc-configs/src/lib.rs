//! # mc-configs
//!
//! Layered settings for the moderation console binary:
//! built-in defaults, then an optional `config/mod-console.{toml,yaml,json}`
//! file, then `MC_*` environment variables (`MC_SERVER__PORT=9000`).
//! A `.env` file in the working directory is read first if present.

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File};
use serde::Deserialize;
use thiserror::Error;

const CONFIG_FILE: &str = "config/mod-console";
const ENV_PREFIX: &str = "MC";

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub source: SourceSettings,
    /// Default `env_logger` filter when `RUST_LOG` is unset
    pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

/// Where the ad collection comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Built-in mock collection, moderated in memory
    Fixture,
    /// Remote console API
    Http,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceSettings {
    pub kind: SourceKind,
    pub base_url: Option<String>,
    pub timeout_secs: u64,
}

fn with_defaults() -> Result<ConfigBuilder<DefaultState>, config::ConfigError> {
    Config::builder()
        .set_default("server.host", "127.0.0.1")?
        .set_default("server.port", 8080)?
        .set_default("source.kind", "fixture")?
        .set_default("source.timeout_secs", 10)?
        .set_default("log_level", "info")
}

/// `MC_` prefix, `__` between nested keys: `MC_SERVER__PORT`, `MC_LOG_LEVEL`.
fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

impl Settings {
    /// Loads settings from `.env`, the optional config file and the environment.
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = dotenvy::dotenv() {
            log::debug!("loaded environment from {}", path.display());
        }

        let cfg = with_defaults()?
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(environment())
            .build()?;

        Self::from_config(cfg)
    }

    /// Deserializes and checks an already assembled configuration.
    pub fn from_config(cfg: Config) -> Result<Self, SettingsError> {
        let settings: Settings = cfg.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), SettingsError> {
        if self.source.kind == SourceKind::Http
            && self.source.base_url.as_deref().map_or(true, |u| u.trim().is_empty())
        {
            return Err(SettingsError::Invalid(
                "source.base_url is required when source.kind = \"http\"".into(),
            ));
        }
        if self.source.timeout_secs == 0 {
            return Err(SettingsError::Invalid("source.timeout_secs must be positive".into()));
        }
        Ok(())
    }

    /// Build the socket address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
