//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{path::PathBuf, str::FromStr, time::Duration};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

mod cli;

pub use cli::*;

use crate::infra::remote::{DEFAULT_BASE_URL, DEFAULT_COMMENT_LIMIT, DEFAULT_POST_LIMIT};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "mosaico";
const DEFAULT_STORAGE_DIR: &str = ".mosaico";
const DEFAULT_FIXTURES_LOCATION: &str = "mock-api";
const DEFAULT_QUERY_STALE_AFTER_SECS: u64 = 30;
const DEFAULT_QUERY_CAPACITY: usize = 64;

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub storage: StorageSettings,
    pub fixtures: FixtureSettings,
    pub remote: RemoteSettings,
    pub query: QuerySettings,
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

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// One JSON document per key under `storage.directory`.
    File,
    /// Nothing survives the process.
    Memory,
}

#[derive(Debug, Clone)]
pub struct StorageSettings {
    pub backend: StorageBackend,
    pub directory: PathBuf,
}

#[derive(Debug, Clone)]
pub struct FixtureSettings {
    /// Directory path or http(s) URL containing the fixture documents.
    pub location: String,
}

#[derive(Debug, Clone)]
pub struct RemoteSettings {
    pub enabled: bool,
    pub base_url: Url,
    pub post_limit: usize,
    pub comment_limit: usize,
    pub timeout: Option<Duration>,
}

#[derive(Debug, Clone)]
pub struct QuerySettings {
    pub enabled: bool,
    pub stale_after_seconds: u64,
    pub capacity: usize,
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

    builder = builder.add_source(Environment::with_prefix("MOSAICO").separator("__"));

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
    storage: RawStorageSettings,
    fixtures: RawFixtureSettings,
    remote: RawRemoteSettings,
    query: RawQuerySettings,
}

impl RawSettings {
    fn apply_overrides(&mut self, overrides: &GlobalOverrides) {
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(backend) = overrides.storage_backend.as_ref() {
            self.storage.backend = Some(backend.clone());
        }
        if let Some(directory) = overrides.storage_directory.as_ref() {
            self.storage.directory = Some(directory.clone());
        }
        if let Some(location) = overrides.fixtures_location.as_ref() {
            self.fixtures.location = Some(location.clone());
        }
        if let Some(enabled) = overrides.remote_enabled {
            self.remote.enabled = Some(enabled);
        }
        if let Some(url) = overrides.remote_base_url.as_ref() {
            self.remote.base_url = Some(url.clone());
        }
        if let Some(seconds) = overrides.remote_timeout_seconds {
            self.remote.timeout_seconds = Some(seconds);
        }
        if let Some(enabled) = overrides.query_enabled {
            self.query.enabled = Some(enabled);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            logging,
            storage,
            fixtures,
            remote,
            query,
        } = raw;

        Ok(Self {
            logging: build_logging_settings(logging)?,
            storage: build_storage_settings(storage)?,
            fixtures: build_fixture_settings(fixtures)?,
            remote: build_remote_settings(remote)?,
            query: build_query_settings(query)?,
        })
    }
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::WARN,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_storage_settings(storage: RawStorageSettings) -> Result<StorageSettings, LoadError> {
    let backend = match storage.backend.as_deref().map(str::trim) {
        None | Some("file") => StorageBackend::File,
        Some("memory") => StorageBackend::Memory,
        Some(other) => {
            return Err(LoadError::invalid(
                "storage.backend",
                format!("unknown backend `{other}` (expected file or memory)"),
            ));
        }
    };

    let directory = storage
        .directory
        .unwrap_or_else(|| PathBuf::from(DEFAULT_STORAGE_DIR));
    if directory.as_os_str().is_empty() {
        return Err(LoadError::invalid(
            "storage.directory",
            "path must not be empty",
        ));
    }

    Ok(StorageSettings { backend, directory })
}

fn build_fixture_settings(fixtures: RawFixtureSettings) -> Result<FixtureSettings, LoadError> {
    let location = fixtures
        .location
        .map(|value| value.trim().to_string())
        .unwrap_or_else(|| DEFAULT_FIXTURES_LOCATION.to_string());
    if location.is_empty() {
        return Err(LoadError::invalid(
            "fixtures.location",
            "location must not be empty",
        ));
    }
    Ok(FixtureSettings { location })
}

fn build_remote_settings(remote: RawRemoteSettings) -> Result<RemoteSettings, LoadError> {
    let raw_url = remote
        .base_url
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
    let base_url = Url::parse(raw_url.trim())
        .map_err(|err| LoadError::invalid("remote.base_url", format!("invalid URL: {err}")))?;
    if !matches!(base_url.scheme(), "http" | "https") {
        return Err(LoadError::invalid(
            "remote.base_url",
            "scheme must be http or https",
        ));
    }

    let post_limit = remote.post_limit.unwrap_or(DEFAULT_POST_LIMIT);
    let comment_limit = remote.comment_limit.unwrap_or(DEFAULT_COMMENT_LIMIT);

    let timeout = match remote.timeout_seconds {
        Some(0) => {
            return Err(LoadError::invalid(
                "remote.timeout_seconds",
                "must be greater than zero",
            ));
        }
        Some(seconds) => Some(Duration::from_secs(seconds)),
        None => None,
    };

    Ok(RemoteSettings {
        enabled: remote.enabled.unwrap_or(true),
        base_url,
        post_limit,
        comment_limit,
        timeout,
    })
}

fn build_query_settings(query: RawQuerySettings) -> Result<QuerySettings, LoadError> {
    let capacity = query.capacity.unwrap_or(DEFAULT_QUERY_CAPACITY);
    if capacity == 0 {
        return Err(LoadError::invalid(
            "query.capacity",
            "must be greater than zero",
        ));
    }

    Ok(QuerySettings {
        enabled: query.enabled.unwrap_or(true),
        stale_after_seconds: query
            .stale_after_seconds
            .unwrap_or(DEFAULT_QUERY_STALE_AFTER_SECS),
        capacity,
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
struct RawStorageSettings {
    backend: Option<String>,
    directory: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawFixtureSettings {
    location: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawRemoteSettings {
    enabled: Option<bool>,
    base_url: Option<String>,
    post_limit: Option<usize>,
    comment_limit: Option<usize>,
    timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawQuerySettings {
    enabled: Option<bool>,
    stale_after_seconds: Option<u64>,
    capacity: Option<usize>,
}

#[cfg(test)]
mod tests;
