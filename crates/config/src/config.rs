//! Configuration loading from environment variables.

use core::fmt;
use core::time::Duration;
use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};

/// Default location of the serialized model artifact.
pub const DEFAULT_MODEL_PATH: &str = "model/aqi_model.bin.gz";

/// Default model name reported by the API and written with metrics.
pub const DEFAULT_MODEL_NAME: &str = "RandomForest_v1";

/// Default origin allowed by CORS.
pub const DEFAULT_CORS_ORIGIN: &str = "https://air-quality-prediction-phi.vercel.app";

/// Default OpenWeather API host.
pub const DEFAULT_OPENWEATHER_BASE_URL: &str = "http://api.openweathermap.org";

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
const DEFAULT_DB_PORT: u16 = 5432;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

/// How to reach the Postgres store.
#[derive(Clone, PartialEq, Eq)]
pub enum DatabaseConfig {
    /// A full connection URL from `DATABASE_URL`.
    Url(String),
    /// Individual connection settings from `DB_*` variables.
    Parts {
        host: String,
        port: u16,
        database: String,
        user: String,
        password: Option<String>,
    },
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Url(_) => f.debug_tuple("Url").field(&"<redacted>").finish(),
            Self::Parts {
                host,
                port,
                database,
                user,
                password,
            } => f
                .debug_struct("Parts")
                .field("host", host)
                .field("port", port)
                .field("database", database)
                .field("user", user)
                .field("password", &password.as_ref().map(|_| "<redacted>"))
                .finish(),
        }
    }
}

/// Application configuration loaded from environment variables.
#[derive(Clone)]
pub struct Config {
    /// Postgres connection settings
    pub database: DatabaseConfig,

    /// OpenWeather API key, required only by the HTTP service
    pub openweather_api_key: Option<String>,

    /// OpenWeather API host
    pub openweather_base_url: String,

    /// Path of the serialized model artifact
    pub model_path: PathBuf,

    /// Name of the active model
    pub model_name: String,

    /// Single origin allowed by CORS
    pub cors_origin: String,

    /// Address the HTTP service listens on
    pub bind_addr: SocketAddr,

    /// Timeout applied to every outbound provider request
    pub http_timeout: Duration,

    /// Whether `/predict/city` results are written to the store
    pub persist_predictions: bool,

    /// Whether negative readings are floored at zero before inference
    pub floor_negative_readings: bool,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database", &self.database)
            .field(
                "openweather_api_key",
                &self.openweather_api_key.as_ref().map(|_| "<redacted>"),
            )
            .field("openweather_base_url", &self.openweather_base_url)
            .field("model_path", &self.model_path)
            .field("model_name", &self.model_name)
            .field("cors_origin", &self.cors_origin)
            .field("bind_addr", &self.bind_addr)
            .field("http_timeout", &self.http_timeout)
            .field("persist_predictions", &self.persist_predictions)
            .field("floor_negative_readings", &self.floor_negative_readings)
            .finish()
    }
}

impl Config {
    /// Loads configuration from the process environment, reading `.env` first.
    ///
    /// Database settings come from `DATABASE_URL` when it is set. Otherwise
    /// `DB_HOST`, `DB_NAME` (or `DB_DATABASE`) and `DB_USER` are required,
    /// with optional `DB_PASSWORD` and `DB_PORT` (default 5432).
    ///
    /// Optional environment variables:
    /// - `OPENWEATHER_API_KEY`, `OPENWEATHER_BASE_URL`
    /// - `MODEL_PATH` (default: `model/aqi_model.bin.gz`), `MODEL_NAME`
    /// - `CORS_ORIGIN`, `BIND_ADDR` (default: `0.0.0.0:8000`)
    /// - `HTTP_TIMEOUT_SECS` (default: 10)
    /// - `PERSIST_PREDICTIONS`, `FLOOR_NEGATIVE_READINGS` (default: false)
    ///
    /// # Errors
    ///
    /// Returns an error if required variables are missing or a value does not parse.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    ///
    /// Blank values are treated as unset.
    ///
    /// # Errors
    ///
    /// Returns an error if required variables are missing or a value does not parse.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let database = load_database_config(&get)?;

        let bind_addr = get("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .context("BIND_ADDR must be a socket address such as 0.0.0.0:8000")?;

        let http_timeout_secs = match get("HTTP_TIMEOUT_SECS") {
            Some(value) => value
                .trim()
                .parse::<u64>()
                .context("HTTP_TIMEOUT_SECS must be a whole number of seconds")?,
            None => DEFAULT_HTTP_TIMEOUT_SECS,
        };

        let persist_predictions = flag_from_lookup(&get, "PERSIST_PREDICTIONS")?;
        let floor_negative_readings = flag_from_lookup(&get, "FLOOR_NEGATIVE_READINGS")?;

        let cors_origin = get("CORS_ORIGIN").unwrap_or_else(|| DEFAULT_CORS_ORIGIN.to_string());
        let cors_origin = cors_origin.trim().trim_end_matches('/').to_string();

        Ok(Self {
            database,
            openweather_api_key: get("OPENWEATHER_API_KEY"),
            openweather_base_url: get("OPENWEATHER_BASE_URL")
                .unwrap_or_else(|| DEFAULT_OPENWEATHER_BASE_URL.to_string()),
            model_path: get("MODEL_PATH").map_or_else(|| PathBuf::from(DEFAULT_MODEL_PATH), PathBuf::from),
            model_name: get("MODEL_NAME").unwrap_or_else(|| DEFAULT_MODEL_NAME.to_string()),
            cors_origin,
            bind_addr,
            http_timeout: Duration::from_secs(http_timeout_secs),
            persist_predictions,
            floor_negative_readings,
        })
    }

    /// Returns the OpenWeather API key.
    ///
    /// # Errors
    ///
    /// Returns an error if `OPENWEATHER_API_KEY` was not set.
    pub fn require_openweather_api_key(&self) -> Result<&str> {
        self.openweather_api_key
            .as_deref()
            .context("OPENWEATHER_API_KEY environment variable not set")
    }
}

fn load_database_config<F>(get: &F) -> Result<DatabaseConfig>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = get("DATABASE_URL") {
        return Ok(DatabaseConfig::Url(url));
    }

    let host = get("DB_HOST").context("DATABASE_URL or DB_HOST environment variable not set")?;
    let database = get("DB_NAME")
        .or_else(|| get("DB_DATABASE"))
        .context("DB_NAME environment variable not set")?;
    let user = get("DB_USER").context("DB_USER environment variable not set")?;
    let port = match get("DB_PORT") {
        Some(value) => value
            .trim()
            .parse::<u16>()
            .with_context(|| format!("DB_PORT is not a valid port: {value}"))?,
        None => DEFAULT_DB_PORT,
    };

    Ok(DatabaseConfig::Parts {
        host,
        port,
        database,
        user,
        password: get("DB_PASSWORD"),
    })
}

/// Reads one boolean environment variable with the same rules as [`Config`].
///
/// # Errors
///
/// Returns an error if the variable is set to something other than a boolean.
pub fn env_flag(key: &str) -> Result<bool> {
    flag_from_lookup(|key| std::env::var(key).ok(), key)
}

/// Reads one boolean from an arbitrary key lookup.
///
/// Unset or blank is `false`. Accepts `1`/`true`/`yes`/`on` and
/// `0`/`false`/`no`/`off`, case-insensitively.
///
/// # Errors
///
/// Returns an error for any other value.
pub fn flag_from_lookup<F>(lookup: F, key: &str) -> Result<bool>
where
    F: Fn(&str) -> Option<String>,
{
    parse_flag(key, lookup(key).filter(|value| !value.trim().is_empty()))
}

fn parse_flag(key: &str, value: Option<String>) -> Result<bool> {
    let Some(value) = value else {
        return Ok(false);
    };

    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("{key} must be a boolean (true/false), got {other:?}"),
    }
}
