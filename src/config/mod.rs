//! Configuration layer: typed settings with layered precedence (file → env → CLI).

mod cli;

pub use cli::{
    CliArgs, Command, CreateArgs, DeleteArgs, EntityArg, ListArgs, Overrides, SetActiveArgs,
    UpdateArgs,
};

use std::{num::NonZeroU32, str::FromStr};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "kaizen";
const ENV_PREFIX: &str = "KAIZEN";
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 4;

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub logging: LoggingSettings,
    /// `None` selects the local store.
    pub backend: Option<BackendSettings>,
    pub local: LocalSettings,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub enum BackendSettings {
    Rest(RestSettings),
    Postgres(PostgresSettings),
}

#[derive(Clone)]
pub struct RestSettings {
    pub url: Url,
    pub api_key: String,
    /// User token sent as the bearer credential instead of the API key.
    pub access_token: Option<String>,
}

impl std::fmt::Debug for RestSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestSettings")
            .field("url", &self.url.as_str())
            .field("api_key", &"<redacted>")
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct PostgresSettings {
    pub url: String,
    pub max_connections: NonZeroU32,
}

#[derive(Debug, Clone)]
pub struct LocalSettings {
    /// Preload the demo catalogue into the local store.
    pub seed_demo_content: bool,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;
    raw.apply_overrides(&cli.overrides);

    Settings::from_raw(raw)
}

/// Resolve configuration using the process arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    logging: RawLoggingSettings,
    backend: RawBackendSettings,
    local: RawLocalSettings,
    /// Set only by `--local-only`.
    #[serde(skip)]
    local_only: bool,
}

impl RawSettings {
    fn apply_overrides(&mut self, overrides: &Overrides) {
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(url) = overrides.backend_url.as_ref() {
            self.backend.url = Some(url.clone());
        }
        if let Some(key) = overrides.backend_api_key.as_ref() {
            self.backend.api_key = Some(key.clone());
        }
        if overrides.local_only {
            self.local_only = true;
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            logging,
            backend,
            local,
            local_only,
        } = raw;

        let logging = build_logging_settings(logging)?;
        let backend = if local_only {
            None
        } else {
            build_backend_settings(backend)?
        };
        let local = LocalSettings {
            seed_demo_content: local.seed_demo_content.unwrap_or(true),
        };

        Ok(Self {
            logging,
            backend,
            local,
        })
    }
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

/// A REST backend needs both a URL and an API key; anything less means local mode.
fn build_backend_settings(
    backend: RawBackendSettings,
) -> Result<Option<BackendSettings>, LoadError> {
    let Some(raw_url) = non_empty(backend.url) else {
        return Ok(None);
    };

    let url = Url::parse(&raw_url)
        .map_err(|err| LoadError::invalid("backend.url", format!("failed to parse: {err}")))?;

    match url.scheme() {
        "postgres" | "postgresql" => {
            let max_connections = backend
                .max_connections
                .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS);
            let max_connections = NonZeroU32::new(max_connections).ok_or_else(|| {
                LoadError::invalid("backend.max_connections", "must be greater than zero")
            })?;
            Ok(Some(BackendSettings::Postgres(PostgresSettings {
                url: raw_url,
                max_connections,
            })))
        }
        "http" | "https" => {
            let Some(api_key) = non_empty(backend.api_key) else {
                return Ok(None);
            };
            Ok(Some(BackendSettings::Rest(RestSettings {
                url,
                api_key,
                access_token: non_empty(backend.access_token),
            })))
        }
        scheme => Err(LoadError::invalid(
            "backend.url",
            format!("unsupported scheme `{scheme}`"),
        )),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawBackendSettings {
    url: Option<String>,
    api_key: Option<String>,
    access_token: Option<String>,
    max_connections: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLocalSettings {
    seed_demo_content: Option<bool>,
}

#[cfg(test)]
mod tests;
